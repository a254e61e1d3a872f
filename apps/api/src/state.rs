use grantwatch_application::GrantLifecycleService;

use crate::api_config::FailureResponseMode;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub grant_lifecycle_service: GrantLifecycleService,
    pub failure_response_mode: FailureResponseMode,
}
