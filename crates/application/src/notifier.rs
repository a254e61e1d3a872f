use std::sync::Arc;

use grantwatch_core::{AppError, AppResult};
use pulldown_cmark::{Options, Parser, html};
use tracing::info;

use crate::grant_ports::{CredentialProvider, NotificationDispatcher, SummaryNotification};

/// Delivers activity summaries to the review mailbox.
#[derive(Clone)]
pub struct Notifier {
    credentials: Arc<dyn CredentialProvider>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    recipient: String,
}

impl Notifier {
    /// Creates a notifier addressing `recipient`.
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            dispatcher,
            recipient: recipient.into(),
        }
    }

    /// Renders `summary` and sends it as the summary for `grantee`.
    pub async fn notify(&self, grantee: &str, summary: &str) -> AppResult<()> {
        let token = self
            .credentials
            .ambient_token()
            .await
            .map_err(AppError::notification)?;

        let notification = SummaryNotification {
            recipient: self.recipient.clone(),
            grantee: grantee.to_owned(),
            html_content: render_summary_html(summary),
        };
        self.dispatcher
            .dispatch(&notification, &token)
            .await
            .map_err(AppError::notification)?;

        info!(
            recipient = %self.recipient,
            grantee = grantee,
            "activity summary notification sent"
        );
        Ok(())
    }
}

/// Renders markdown summary text as an HTML fragment.
#[must_use]
pub fn render_summary_html(summary: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut rendered = String::with_capacity(summary.len() * 3 / 2);
    html::push_html(&mut rendered, Parser::new_ext(summary, options));
    rendered
}
