//! Console notification dispatcher for development. Logs summaries to tracing output.

use async_trait::async_trait;
use grantwatch_application::{NotificationDispatcher, SummaryNotification};
use grantwatch_core::{AppResult, BearerToken};
use tracing::info;

/// Development dispatcher that logs notifications to the console.
#[derive(Clone)]
pub struct ConsoleNotificationDispatcher;

impl ConsoleNotificationDispatcher {
    /// Creates a new console notification dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleNotificationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationDispatcher for ConsoleNotificationDispatcher {
    async fn dispatch(
        &self,
        notification: &SummaryNotification,
        _token: &BearerToken,
    ) -> AppResult<()> {
        info!(
            recipient = %notification.recipient,
            grantee = %notification.grantee,
            "--- SUMMARY (console) ---\nTo: {}\nGrantee: {}\n\n{}\n--- END SUMMARY ---",
            notification.recipient,
            notification.grantee,
            notification.html_content
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use grantwatch_application::{NotificationDispatcher, SummaryNotification};
    use grantwatch_core::BearerToken;

    use super::ConsoleNotificationDispatcher;

    #[tokio::test]
    async fn console_dispatch_always_succeeds() {
        let token = BearerToken::new("unused").unwrap_or_else(|_| unreachable!());
        let notification = SummaryNotification {
            recipient: "security@example.com".to_owned(),
            grantee: "alice@example.com".to_owned(),
            html_content: "<p>quiet</p>".to_owned(),
        };

        assert!(
            ConsoleNotificationDispatcher::new()
                .dispatch(&notification, &token)
                .await
                .is_ok()
        );
    }
}
