use std::sync::Arc;

use chrono::{DateTime, Utc};
use grantwatch_core::{AppError, AppResult};
use grantwatch_domain::{Grant, GrantInput, GrantReference, GrantState, ResourceScope};
use tracing::debug;

use crate::grant_ports::{GrantDetails, GrantLookup};

/// Resolves grant references into normalized [`Grant`] records.
#[derive(Clone)]
pub struct GrantResolver {
    lookup: Arc<dyn GrantLookup>,
}

impl GrantResolver {
    /// Creates a grant resolver.
    #[must_use]
    pub fn new(lookup: Arc<dyn GrantLookup>) -> Self {
        Self { lookup }
    }

    /// Fetches and normalizes one grant.
    ///
    /// Calls the lookup service exactly once; failures are not retried here.
    pub async fn resolve(&self, reference: &GrantReference) -> AppResult<Grant> {
        let details = self
            .lookup
            .get_grant(reference)
            .await
            .map_err(AppError::grant_lookup)?;

        debug!(
            grant = %reference,
            state = %details.state,
            scope = %details.scope,
            "resolved grant details"
        );

        grant_from_details(details)
    }
}

fn grant_from_details(details: GrantDetails) -> AppResult<Grant> {
    let scope = ResourceScope::parse(&details.scope).map_err(AppError::grant_lookup)?;
    let start_time = parse_optional_timestamp(details.start_time.as_deref(), "start time")?;
    let end_time = parse_optional_timestamp(details.end_time.as_deref(), "end time")?;

    Grant::new(GrantInput {
        name: details.name,
        requester: details.requester,
        state: GrantState::from_transport(&details.state),
        role_bindings: details.role_bindings,
        scope,
        start_time,
        end_time,
        justification: details.justification,
        requested_duration_seconds: details.requested_duration_seconds,
    })
}

// Absent and empty timestamps both mean "not reached yet".
fn parse_optional_timestamp(value: Option<&str>, label: &str) -> AppResult<Option<DateTime<Utc>>> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| Some(timestamp.with_timezone(&Utc)))
        .map_err(|error| {
            AppError::grant_lookup(AppError::Internal(format!(
                "grant {label} '{value}' is not RFC3339: {error}"
            )))
        })
}
