use axum::body::Bytes;
use axum::extract::State;
use grantwatch_application::{LifecycleOutcome, NotificationStatus};
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult, SUCCESS_MESSAGE};
use crate::state::AppState;

pub async fn grant_event_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<&'static str> {
    match state
        .grant_lifecycle_service
        .handle_push_envelope(&body)
        .await
    {
        Ok(outcome) => {
            log_outcome(&outcome);
            Ok(SUCCESS_MESSAGE)
        }
        Err(app_error) => {
            if matches!(app_error, grantwatch_core::AppError::MalformedEvent(_)) {
                warn!(error = %app_error, "rejected malformed grant event");
            } else {
                error!(
                    error = %app_error,
                    transient = app_error.is_transient(),
                    "grant event handling failed"
                );
            }
            Err(ApiError::new(app_error, state.failure_response_mode))
        }
    }
}

fn log_outcome(outcome: &LifecycleOutcome) {
    match outcome {
        LifecycleOutcome::Provisioned(report) => info!(
            sink = %report.sink(),
            complete = report.is_complete(),
            "grant event provisioned audit pipeline"
        ),
        LifecycleOutcome::Closed(closed) => info!(
            activities = closed.activity_count,
            teardown_complete = closed
                .teardown
                .as_ref()
                .is_some_and(|report| report.is_complete()),
            notified = matches!(closed.notification, NotificationStatus::Delivered),
            "grant event closed grant"
        ),
        LifecycleOutcome::Ignored { state } => {
            info!(state = %state, "grant event ignored");
        }
    }
}
