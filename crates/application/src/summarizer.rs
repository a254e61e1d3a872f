use std::sync::Arc;

use grantwatch_core::{AppError, AppResult};
use grantwatch_domain::ActivityRecord;
use tracing::{info, warn};

use crate::grant_ports::{GenerationConfig, TextGenerator};

/// Turns collected activity into a markdown summary.
#[derive(Clone)]
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    config: GenerationConfig,
}

impl Summarizer {
    /// Creates a summarizer with fixed decoding parameters.
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, config: GenerationConfig) -> Self {
        Self { generator, config }
    }

    /// Generates a summary of `activities`.
    ///
    /// The prompt is the activity list serialized as JSON. Token counting is
    /// informational: its failure is logged and generation still runs.
    pub async fn summarize(&self, activities: &[ActivityRecord]) -> AppResult<String> {
        let prompt = serde_json::to_string(activities).map_err(|error| {
            AppError::summarization(AppError::Internal(format!(
                "failed to serialize activity prompt: {error}"
            )))
        })?;

        match self.generator.count_tokens(&prompt).await {
            Ok(count) => info!(
                activities = activities.len(),
                prompt_tokens = count.total_tokens,
                prompt_characters = count.total_billable_characters,
                "counted summary prompt"
            ),
            Err(error) => warn!(error = %error, "failed to count summary prompt tokens"),
        }

        let summary = self
            .generator
            .generate(&prompt, &self.config)
            .await
            .map_err(AppError::summarization)?;

        if summary.trim().is_empty() {
            return Err(AppError::summarization(AppError::Upstream(
                "text generation returned an empty summary".to_owned(),
            )));
        }

        info!(
            activities = activities.len(),
            summary_length = summary.len(),
            "activity summary generated"
        );

        Ok(summary)
    }
}
