use async_trait::async_trait;
use grantwatch_application::{GrantDetails, GrantLookup};
use grantwatch_core::AppResult;
use grantwatch_domain::GrantReference;
use serde::Deserialize;

use crate::google_api::{GoogleApiClient, api_url};

/// Default privileged access manager endpoint.
pub const DEFAULT_PAM_BASE_URL: &str = "https://privilegedaccessmanager.googleapis.com";

/// Grant lookup backed by the privileged access manager REST API.
pub struct PamGrantLookup {
    client: GoogleApiClient,
    base_url: String,
}

impl PamGrantLookup {
    /// Creates a grant lookup against the public endpoint.
    #[must_use]
    pub fn new(client: GoogleApiClient) -> Self {
        Self {
            client,
            base_url: DEFAULT_PAM_BASE_URL.to_owned(),
        }
    }

    /// Overrides the API endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PamGrant {
    name: String,
    requester: String,
    state: String,
    requested_duration: Option<String>,
    justification: PamJustification,
    privileged_access: PamPrivilegedAccess,
    audit_trail: PamAuditTrail,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PamJustification {
    unstructured_justification: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PamPrivilegedAccess {
    gcp_iam_access: PamIamAccess,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PamIamAccess {
    resource: String,
    role_bindings: Vec<PamRoleBinding>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PamRoleBinding {
    role: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PamAuditTrail {
    access_grant_time: Option<String>,
    access_remove_time: Option<String>,
}

impl From<PamGrant> for GrantDetails {
    fn from(grant: PamGrant) -> Self {
        Self {
            name: grant.name,
            requester: grant.requester,
            state: grant.state,
            role_bindings: grant
                .privileged_access
                .gcp_iam_access
                .role_bindings
                .into_iter()
                .map(|binding| binding.role)
                .collect(),
            scope: grant.privileged_access.gcp_iam_access.resource,
            start_time: grant.audit_trail.access_grant_time,
            end_time: grant.audit_trail.access_remove_time,
            justification: grant.justification.unstructured_justification,
            requested_duration_seconds: grant
                .requested_duration
                .as_deref()
                .and_then(parse_duration_seconds),
        }
    }
}

// Protobuf JSON durations look like `3600s` or `1.5s`.
fn parse_duration_seconds(value: &str) -> Option<i64> {
    let seconds = value.strip_suffix('s')?;
    let whole = seconds.split_once('.').map_or(seconds, |(whole, _)| whole);
    whole.parse().ok()
}

#[async_trait]
impl GrantLookup for PamGrantLookup {
    async fn get_grant(&self, reference: &GrantReference) -> AppResult<GrantDetails> {
        let url = api_url(&self.base_url, &format!("v1/{}", reference.as_str()))?;
        let grant: PamGrant = self.client.get_json(url, "grant lookup").await?;
        Ok(grant.into())
    }
}
