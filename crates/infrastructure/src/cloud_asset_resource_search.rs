use async_trait::async_trait;
use grantwatch_application::{ResourcePage, ResourceSearch, ScopedResource};
use grantwatch_core::AppResult;
use grantwatch_domain::ResourceScope;
use serde::Deserialize;

use crate::google_api::{GoogleApiClient, api_url};

/// Default cloud asset inventory endpoint.
pub const DEFAULT_CLOUD_ASSET_BASE_URL: &str = "https://cloudasset.googleapis.com";

const ACTIVE_RESOURCES_QUERY: &str = "state:ACTIVE";

/// Scope search backed by the cloud asset inventory.
pub struct CloudAssetResourceSearch {
    client: GoogleApiClient,
    base_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    name: String,
    #[serde(default)]
    display_name: String,
}

impl CloudAssetResourceSearch {
    /// Creates a resource search against the public endpoint.
    #[must_use]
    pub fn new(client: GoogleApiClient) -> Self {
        Self {
            client,
            base_url: DEFAULT_CLOUD_ASSET_BASE_URL.to_owned(),
        }
    }

    /// Overrides the API endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ResourceSearch for CloudAssetResourceSearch {
    async fn search_active_resources(
        &self,
        scope: &ResourceScope,
        asset_type: &str,
        page_token: Option<&str>,
    ) -> AppResult<ResourcePage> {
        let mut url = api_url(&self.base_url, &format!("v1/{scope}:searchAllResources"))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("assetTypes", asset_type)
                .append_pair("query", ACTIVE_RESOURCES_QUERY);
            if let Some(page_token) = page_token {
                query.append_pair("pageToken", page_token);
            }
        }

        let response: SearchResponse = self.client.get_json(url, "resource search").await?;
        Ok(ResourcePage {
            resources: response
                .results
                .into_iter()
                .map(|result| ScopedResource {
                    // `//cloudresourcemanager.googleapis.com/projects/<id>`
                    id: result
                        .name
                        .rsplit('/')
                        .next()
                        .unwrap_or_default()
                        .to_owned(),
                    display_name: result.display_name,
                })
                .filter(|resource| !resource.id.is_empty())
                .collect(),
            next_page_token: response
                .next_page_token
                .filter(|token| !token.is_empty()),
        })
    }
}
