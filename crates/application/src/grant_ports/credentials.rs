use async_trait::async_trait;
use grantwatch_core::{AppResult, BearerToken};

/// Port for obtaining credentials of the ambient execution identity.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns a bearer token for outbound calls.
    async fn ambient_token(&self) -> AppResult<BearerToken>;
}
