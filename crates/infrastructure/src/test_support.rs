//! Shared helpers for adapter tests.

use async_trait::async_trait;
use grantwatch_application::CredentialProvider;
use grantwatch_core::{AppResult, BearerToken};

#[derive(Default)]
pub struct StaticCredentialProvider;

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn ambient_token(&self) -> AppResult<BearerToken> {
        BearerToken::new("static-token")
    }
}
