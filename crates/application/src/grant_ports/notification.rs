use async_trait::async_trait;
use grantwatch_core::{AppResult, BearerToken};

/// Rendered activity summary addressed to the review mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryNotification {
    /// Target mailbox.
    pub recipient: String,
    /// Grantee the summary is about.
    pub grantee: String,
    /// Summary rendered as HTML.
    pub html_content: String,
}

/// Port for notification delivery.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Delivers one notification.
    async fn dispatch(
        &self,
        notification: &SummaryNotification,
        token: &BearerToken,
    ) -> AppResult<()>;
}
