use std::fmt::{Debug, Formatter};

use crate::{AppResult, NonEmptyString};

/// OAuth bearer token obtained from the ambient execution identity.
///
/// The secret value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(NonEmptyString);

impl BearerToken {
    /// Creates a bearer token from a raw access token value.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        NonEmptyString::new(value).map(Self)
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn secret(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the `Authorization` header value for this token.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.0.as_str())
    }
}

impl Debug for BearerToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("BearerToken(<redacted>)")
    }
}
