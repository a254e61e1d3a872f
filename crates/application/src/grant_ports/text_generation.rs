use async_trait::async_trait;
use grantwatch_core::AppResult;

/// Decoding parameters for summary generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling threshold.
    pub top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: 8192,
            temperature: 1.0,
            top_p: 0.95,
        }
    }
}

/// Prompt size as reported by the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenCount {
    /// Prompt tokens.
    pub total_tokens: u64,
    /// Billable prompt characters.
    pub total_billable_characters: u64,
}

/// Port for the text-generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Counts prompt tokens.
    async fn count_tokens(&self, prompt: &str) -> AppResult<TokenCount>;

    /// Generates text for a prompt.
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> AppResult<String>;
}
