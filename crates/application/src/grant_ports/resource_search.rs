use async_trait::async_trait;
use grantwatch_core::AppResult;
use grantwatch_domain::ResourceScope;

/// Asset type enumerated when collecting activity.
pub const PROJECT_ASSET_TYPE: &str = "cloudresourcemanager.googleapis.com/Project";

/// Resource found within a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedResource {
    /// Resource identifier (project id for projects).
    pub id: String,
    /// Display name.
    pub display_name: String,
}

/// One page of a scope search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourcePage {
    /// Resources in service order.
    pub resources: Vec<ScopedResource>,
    /// Token for the next page, absent on the last page.
    pub next_page_token: Option<String>,
}

/// Port for the resource-scope search service.
#[async_trait]
pub trait ResourceSearch: Send + Sync {
    /// Returns one page of active resources of `asset_type` within `scope`.
    async fn search_active_resources(
        &self,
        scope: &ResourceScope,
        asset_type: &str,
        page_token: Option<&str>,
    ) -> AppResult<ResourcePage>;
}
