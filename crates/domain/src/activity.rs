use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One audit log entry attributed to the grantee within the grant scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Project the entry was written in.
    pub project_id: String,
    /// Display name of that project.
    pub project_name: String,
    /// API service that handled the call.
    pub service_name: String,
    /// API method that was invoked.
    pub method_name: String,
    /// Resource the call targeted, when the entry names one.
    #[serde(default)]
    pub resource_name: Option<String>,
    /// Entry timestamp.
    pub timestamp: DateTime<Utc>,
}
