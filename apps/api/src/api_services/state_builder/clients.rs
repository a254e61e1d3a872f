use std::sync::Arc;
use std::time::Duration;

use grantwatch_application::NotificationDispatcher;
use grantwatch_core::AppError;
use grantwatch_infrastructure::{ConsoleNotificationDispatcher, IntegrationNotificationDispatcher};

use crate::api_config::{ApiConfig, NotificationProviderConfig};

pub(super) fn build_http_client(timeout_seconds: u64) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))
}

pub(super) fn build_notification_dispatcher(
    config: &ApiConfig,
    http_client: reqwest::Client,
) -> Arc<dyn NotificationDispatcher> {
    match &config.notification_provider {
        NotificationProviderConfig::Integration {
            trigger_id,
            max_attempts,
            retry_backoff_ms,
        } => Arc::new(IntegrationNotificationDispatcher::new(
            http_client,
            config.project_id.clone(),
            config.region.clone(),
            trigger_id.clone(),
            *max_attempts,
            *retry_backoff_ms,
        )),
        NotificationProviderConfig::Console => Arc::new(ConsoleNotificationDispatcher::new()),
    }
}
