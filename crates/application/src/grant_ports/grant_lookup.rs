use async_trait::async_trait;
use grantwatch_core::AppResult;
use grantwatch_domain::GrantReference;

/// Grant record as returned by the grant lookup service, before
/// normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GrantDetails {
    /// Grant resource name.
    pub name: String,
    /// Grantee principal.
    pub requester: String,
    /// Lifecycle state transport value.
    pub state: String,
    /// Granted roles in service order.
    pub role_bindings: Vec<String>,
    /// Full resource name of the scope the roles are bound on.
    pub scope: String,
    /// RFC3339 activation time, when the grant activated.
    pub start_time: Option<String>,
    /// RFC3339 removal time, when access was removed.
    pub end_time: Option<String>,
    /// Free-text justification.
    pub justification: String,
    /// Requested duration in seconds.
    pub requested_duration_seconds: Option<i64>,
}

/// Port for the privileged access grant lookup service.
#[async_trait]
pub trait GrantLookup: Send + Sync {
    /// Fetches grant details. Returns `AppError::NotFound` for unknown grants.
    async fn get_grant(&self, reference: &GrantReference) -> AppResult<GrantDetails>;
}
