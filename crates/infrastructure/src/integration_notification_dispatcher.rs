use std::time::Duration;

use async_trait::async_trait;
use grantwatch_application::{NotificationDispatcher, SummaryNotification};
use grantwatch_core::{AppError, AppResult, BearerToken};
use serde_json::json;
use tracing::warn;

use crate::google_api::{api_url, status_error, transport_error};

/// Default trigger of the summary email integration.
pub const DEFAULT_TRIGGER_ID: &str = "api_trigger/pam-summary-email";

/// Notification dispatch through an application integration API trigger.
pub struct IntegrationNotificationDispatcher {
    http_client: reqwest::Client,
    project_id: String,
    region: String,
    trigger_id: String,
    base_url: String,
    max_attempts: u8,
    retry_backoff_ms: u64,
}

impl IntegrationNotificationDispatcher {
    /// Creates a dispatcher for the integration in `region` of `project_id`.
    ///
    /// With `max_attempts` above one, 5xx and 429 responses and transport
    /// failures are retried with linear backoff.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        project_id: impl Into<String>,
        region: impl Into<String>,
        trigger_id: impl Into<String>,
        max_attempts: u8,
        retry_backoff_ms: u64,
    ) -> Self {
        let region = region.into();
        Self {
            http_client,
            project_id: project_id.into(),
            base_url: format!("https://{region}-integrations.googleapis.com"),
            region,
            trigger_id: trigger_id.into(),
            max_attempts: max_attempts.max(1),
            retry_backoff_ms: retry_backoff_ms.max(50),
        }
    }

    /// Overrides the regional endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl NotificationDispatcher for IntegrationNotificationDispatcher {
    async fn dispatch(
        &self,
        notification: &SummaryNotification,
        token: &BearerToken,
    ) -> AppResult<()> {
        let url = api_url(
            &self.base_url,
            &format!(
                "v1/projects/{}/locations/{}/integrations/-:execute",
                self.project_id, self.region
            ),
        )?;
        let payload = json!({
            "trigger_id": self.trigger_id,
            "input_parameters": {
                "recipient": { "string_value": notification.recipient },
                "pam_user": { "string_value": notification.grantee },
                "email_content": { "string_value": notification.html_content },
            },
        });

        let operation = "notification dispatch";
        let mut attempt = 0_u8;
        let mut last_error: Option<AppError> = None;

        while attempt < self.max_attempts {
            attempt = attempt.saturating_add(1);
            let response = self
                .http_client
                .post(url.clone())
                .header(reqwest::header::AUTHORIZATION, token.authorization_header())
                .json(&payload)
                .send()
                .await;

            match response {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response)
                    if response.status().is_server_error()
                        || response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS =>
                {
                    last_error = Some(status_error(response, operation).await);
                }
                Ok(response) => return Err(status_error(response, operation).await),
                Err(error) => last_error = Some(transport_error(&error, operation)),
            }

            if attempt < self.max_attempts {
                if let Some(error) = &last_error {
                    warn!(attempt, error = %error, "retrying notification dispatch");
                }
                let delay = self.retry_backoff_ms.saturating_mul(u64::from(attempt));
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::Upstream(format!("{operation} exhausted retries"))
        }))
    }
}
