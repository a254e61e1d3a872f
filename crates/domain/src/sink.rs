use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use grantwatch_core::{AppError, AppResult};

use crate::Grant;

/// Deterministic name of the audit pipeline provisioned for one grant.
///
/// Provisioning and teardown run in separate invocations, possibly on other
/// hosts, so the name must be derivable from the grant record alone:
/// `grant_<start as YYYYMMDD_HHMMSS>_<local id with '-' as '_'>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SinkDescriptor(String);

impl SinkDescriptor {
    /// Derives the descriptor from a grant activation time and local id.
    #[must_use]
    pub fn derive(start_time: DateTime<Utc>, grant_local_id: &str) -> Self {
        Self(format!(
            "grant_{}_{}",
            start_time.format("%Y%m%d_%H%M%S"),
            grant_local_id.replace('-', "_")
        ))
    }

    /// Derives the descriptor for a grant. Fails for grants that never
    /// activated.
    pub fn for_grant(grant: &Grant) -> AppResult<Self> {
        let start_time = grant.start_time().ok_or_else(|| {
            AppError::InvalidGrantState(format!(
                "grant '{}' has no start time to derive its sink name from",
                grant.name()
            ))
        })?;

        Ok(Self::derive(start_time, grant.local_id()))
    }

    /// Returns the sink name, also used as the dataset id.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the fully qualified dataset id `<project>.<name>`.
    #[must_use]
    pub fn dataset_id(&self, project_id: &str) -> String {
        format!("{project_id}.{}", self.0)
    }

    /// Returns the routing destination URI for the dataset.
    #[must_use]
    pub fn destination(&self, project_id: &str) -> String {
        format!(
            "bigquery.googleapis.com/projects/{project_id}/datasets/{}",
            self.0
        )
    }
}

impl Display for SinkDescriptor {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}
