//! Shared primitives for all Rust crates in grantwatch.

#![forbid(unsafe_code)]

/// Credential primitives shared across services.
pub mod credential;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use credential::BearerToken;

/// Result type used across grantwatch crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Internal(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
///
/// The first group is produced by outbound adapters and describes what went
/// wrong on the wire. The second group is produced by the lifecycle services
/// and names the stage that failed; stage variants that wrap an adapter
/// failure keep it as their error source.
#[derive(Debug, Error)]
pub enum AppError {
    /// Requested upstream resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Create operation conflicts with an existing upstream resource.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Upstream call exceeded its deadline.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Upstream call failed with a non-success status or transport error.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Inbound push envelope could not be decoded.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// Grant details could not be resolved.
    #[error("grant lookup failed: {0}")]
    GrantLookup(#[source] Box<AppError>),

    /// Grant record is not usable for the requested operation.
    #[error("invalid grant state: {0}")]
    InvalidGrantState(String),

    /// One audit pipeline provisioning step failed.
    #[error("provisioning step failed: {0}")]
    ProvisioningStep(#[source] Box<AppError>),

    /// Captured activity could not be queried.
    #[error("activity query failed: {0}")]
    ActivityQuery(#[source] Box<AppError>),

    /// Activity summary could not be generated.
    #[error("summarization failed: {0}")]
    Summarization(#[source] Box<AppError>),

    /// Summary notification could not be delivered.
    #[error("notification failed: {0}")]
    Notification(#[source] Box<AppError>),

    /// Process configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    /// Wraps an adapter error as a grant lookup failure.
    #[must_use]
    pub fn grant_lookup(error: AppError) -> Self {
        Self::GrantLookup(Box::new(error))
    }

    /// Wraps an adapter error as a provisioning step failure.
    #[must_use]
    pub fn provisioning_step(error: AppError) -> Self {
        Self::ProvisioningStep(Box::new(error))
    }

    /// Wraps an adapter error as an activity query failure.
    #[must_use]
    pub fn activity_query(error: AppError) -> Self {
        Self::ActivityQuery(Box::new(error))
    }

    /// Wraps an adapter error as a summarization failure.
    #[must_use]
    pub fn summarization(error: AppError) -> Self {
        Self::Summarization(Box::new(error))
    }

    /// Wraps an adapter error as a notification failure.
    #[must_use]
    pub fn notification(error: AppError) -> Self {
        Self::Notification(Box::new(error))
    }

    /// Returns whether the root cause is a timeout or upstream fault that a
    /// redelivery could plausibly clear.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Upstream(_) => true,
            Self::GrantLookup(source)
            | Self::ProvisioningStep(source)
            | Self::ActivityQuery(source)
            | Self::Summarization(source)
            | Self::Notification(source) => source.is_transient(),
            Self::NotFound(_)
            | Self::Conflict(_)
            | Self::Internal(_)
            | Self::MalformedEvent(_)
            | Self::InvalidGrantState(_)
            | Self::Configuration(_) => false,
        }
    }
}
