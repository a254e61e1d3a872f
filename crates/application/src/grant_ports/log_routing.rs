use async_trait::async_trait;
use grantwatch_core::AppResult;
use grantwatch_domain::ResourceScope;

/// Capture destination (analytics dataset) to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationSpec {
    /// Project owning the dataset.
    pub project_id: String,
    /// Dataset name.
    pub dataset_name: String,
    /// Dataset location.
    pub location: String,
    /// Human readable description.
    pub description: String,
}

/// Routing rule (log sink) to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRuleSpec {
    /// Hierarchy node the rule is created under.
    pub parent: ResourceScope,
    /// Rule name.
    pub name: String,
    /// Logging filter expression.
    pub filter: String,
    /// Destination URI.
    pub destination: String,
    /// Whether entries from descendant resources are routed too.
    pub include_children: bool,
}

/// Routing rule as stored by the log-routing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRule {
    /// Rule name.
    pub name: String,
    /// Identity the service writes to the destination as, e.g.
    /// `serviceAccount:service-1@gcp-sa-logging.iam.gserviceaccount.com`.
    pub writer_identity: Option<String>,
}

/// Dataset access entry to add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAccessGrant {
    /// Project owning the dataset.
    pub project_id: String,
    /// Dataset name.
    pub dataset_name: String,
    /// Role to grant.
    pub role: String,
    /// Email of the member receiving the role.
    pub member_email: String,
}

/// Port for log-routing administration.
///
/// Creates return `AppError::Conflict` when the resource already exists and
/// deletes return `AppError::NotFound` when it is already gone.
#[async_trait]
pub trait LogRoutingAdmin: Send + Sync {
    /// Creates a capture destination.
    async fn create_destination(&self, spec: &DestinationSpec) -> AppResult<()>;

    /// Creates a routing rule with a unique writer identity.
    async fn create_routing_rule(&self, spec: &RoutingRuleSpec) -> AppResult<RoutingRule>;

    /// Fetches an existing routing rule.
    async fn get_routing_rule(&self, parent: &ResourceScope, name: &str)
    -> AppResult<RoutingRule>;

    /// Adds a dataset access entry.
    async fn grant_write_access(&self, grant: &WriteAccessGrant) -> AppResult<()>;

    /// Deletes a routing rule.
    async fn delete_routing_rule(&self, parent: &ResourceScope, name: &str) -> AppResult<()>;
}
