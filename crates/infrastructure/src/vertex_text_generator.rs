use async_trait::async_trait;
use grantwatch_application::{GenerationConfig, TextGenerator, TokenCount};
use grantwatch_core::{AppError, AppResult};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::google_api::{GoogleApiClient, api_url};

/// Default summarization model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-002";

/// Text generation with a publisher model on the regional prediction endpoint.
pub struct VertexTextGenerator {
    client: GoogleApiClient,
    project_id: String,
    location: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountTokensResponse {
    #[serde(default)]
    total_tokens: u64,
    #[serde(default)]
    total_billable_characters: u64,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl VertexTextGenerator {
    /// Creates a generator for `model` served in `location` of `project_id`.
    #[must_use]
    pub fn new(
        client: GoogleApiClient,
        project_id: impl Into<String>,
        location: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let location = location.into();
        Self {
            client,
            project_id: project_id.into(),
            base_url: format!("https://{location}-aiplatform.googleapis.com"),
            location,
            model: model.into(),
        }
    }

    /// Overrides the regional endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn model_url(&self, method: &str) -> AppResult<Url> {
        api_url(
            &self.base_url,
            &format!(
                "v1/projects/{}/locations/{}/publishers/google/models/{}:{method}",
                self.project_id, self.location, self.model
            ),
        )
    }
}

fn request<'a>(prompt: &'a str, config: Option<&GenerationConfig>) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: [Content {
            role: "user",
            parts: [Part { text: prompt }],
        }],
        generation_config: config.map(|config| WireGenerationConfig {
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        }),
    }
}

#[async_trait]
impl TextGenerator for VertexTextGenerator {
    async fn count_tokens(&self, prompt: &str) -> AppResult<TokenCount> {
        let response: CountTokensResponse = self
            .client
            .send_json(
                Method::POST,
                self.model_url("countTokens")?,
                &request(prompt, None),
                "token count",
            )
            .await?;

        Ok(TokenCount {
            total_tokens: response.total_tokens,
            total_billable_characters: response.total_billable_characters,
        })
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> AppResult<String> {
        let response: GenerateResponse = self
            .client
            .send_json(
                Method::POST,
                self.model_url("generateContent")?,
                &request(prompt, Some(config)),
                "content generation",
            )
            .await?;

        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            AppError::Upstream("content generation returned no candidates".to_owned())
        })?;
        let text: String = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        if text.is_empty() {
            return Err(AppError::Upstream(format!(
                "content generation returned no text (finish reason {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}
