//! Grantwatch API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod error;
mod handlers;
mod state;

use std::process::ExitCode;

use grantwatch_core::AppError;
use tracing::{error, info};

use crate::api_config::{ApiConfig, CONFIGURATION_EXIT_CODE};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::Configuration(message)) => {
            error!(error = %message, "invalid configuration");
            ExitCode::from(CONFIGURATION_EXIT_CODE)
        }
        Err(error) => {
            error!(error = %error, "grantwatch-api stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = ApiConfig::load()?;
    let address = config.socket_address()?;
    let app_state = api_services::build_app_state(&config)?;
    let app = api_router::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, "grantwatch-api listening");
    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")))
}
