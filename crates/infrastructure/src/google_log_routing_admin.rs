use async_trait::async_trait;
use grantwatch_application::{
    DestinationSpec, LogRoutingAdmin, RoutingRule, RoutingRuleSpec, WriteAccessGrant,
};
use grantwatch_core::{AppError, AppResult};
use grantwatch_domain::ResourceScope;
use reqwest::Method;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

use crate::google_api::{GoogleApiClient, api_url};

/// Default cloud logging endpoint.
pub const DEFAULT_LOGGING_BASE_URL: &str = "https://logging.googleapis.com";
/// Default bigquery endpoint.
pub const DEFAULT_BIGQUERY_BASE_URL: &str = "https://bigquery.googleapis.com";

/// Log sinks in cloud logging writing into bigquery datasets.
pub struct GoogleLogRoutingAdmin {
    client: GoogleApiClient,
    logging_base_url: String,
    bigquery_base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SinkRequest<'a> {
    name: &'a str,
    destination: &'a str,
    filter: &'a str,
    include_children: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SinkResponse {
    name: String,
    #[serde(default)]
    writer_identity: Option<String>,
}

impl From<SinkResponse> for RoutingRule {
    fn from(sink: SinkResponse) -> Self {
        Self {
            name: sink.name,
            writer_identity: sink.writer_identity.filter(|identity| !identity.is_empty()),
        }
    }
}

#[derive(Deserialize)]
struct DatasetAccess {
    #[serde(default)]
    access: Vec<Value>,
}

impl GoogleLogRoutingAdmin {
    /// Creates a routing admin against the public endpoints.
    #[must_use]
    pub fn new(client: GoogleApiClient) -> Self {
        Self {
            client,
            logging_base_url: DEFAULT_LOGGING_BASE_URL.to_owned(),
            bigquery_base_url: DEFAULT_BIGQUERY_BASE_URL.to_owned(),
        }
    }

    /// Overrides both API endpoints.
    #[must_use]
    pub fn with_base_urls(
        mut self,
        logging_base_url: impl Into<String>,
        bigquery_base_url: impl Into<String>,
    ) -> Self {
        self.logging_base_url = logging_base_url.into();
        self.bigquery_base_url = bigquery_base_url.into();
        self
    }

    fn sinks_url(&self, parent: &ResourceScope) -> AppResult<Url> {
        api_url(&self.logging_base_url, &format!("v2/{parent}/sinks"))
    }

    fn sink_url(&self, parent: &ResourceScope, name: &str) -> AppResult<Url> {
        api_url(&self.logging_base_url, &format!("v2/{parent}/sinks/{name}"))
    }

    fn dataset_url(&self, project_id: &str, dataset_name: &str) -> AppResult<Url> {
        api_url(
            &self.bigquery_base_url,
            &format!("bigquery/v2/projects/{project_id}/datasets/{dataset_name}"),
        )
    }
}

// Dataset ACLs report `roles/bigquery.dataEditor` through its legacy alias.
fn role_matches(existing: &str, wanted: &str) -> bool {
    existing == wanted || (wanted == "roles/bigquery.dataEditor" && existing == "WRITER")
}

#[async_trait]
impl LogRoutingAdmin for GoogleLogRoutingAdmin {
    async fn create_destination(&self, spec: &DestinationSpec) -> AppResult<()> {
        let url = api_url(
            &self.bigquery_base_url,
            &format!("bigquery/v2/projects/{}/datasets", spec.project_id),
        )?;
        let body = json!({
            "datasetReference": {
                "projectId": spec.project_id,
                "datasetId": spec.dataset_name,
            },
            "location": spec.location,
            "description": spec.description,
        });

        self.client
            .send_json::<_, IgnoredAny>(Method::POST, url, &body, "dataset insert")
            .await
            .map(|_| ())
    }

    async fn create_routing_rule(&self, spec: &RoutingRuleSpec) -> AppResult<RoutingRule> {
        let mut url = self.sinks_url(&spec.parent)?;
        url.query_pairs_mut()
            .append_pair("uniqueWriterIdentity", "true");
        let body = SinkRequest {
            name: &spec.name,
            destination: &spec.destination,
            filter: &spec.filter,
            include_children: spec.include_children,
        };

        self.client
            .send_json::<_, SinkResponse>(Method::POST, url, &body, "sink create")
            .await
            .map(RoutingRule::from)
    }

    async fn get_routing_rule(
        &self,
        parent: &ResourceScope,
        name: &str,
    ) -> AppResult<RoutingRule> {
        let url = self.sink_url(parent, name)?;
        self.client
            .get_json::<SinkResponse>(url, "sink get")
            .await
            .map(RoutingRule::from)
    }

    async fn grant_write_access(&self, grant: &WriteAccessGrant) -> AppResult<()> {
        let url = self.dataset_url(&grant.project_id, &grant.dataset_name)?;
        let dataset: DatasetAccess = self.client.get_json(url.clone(), "dataset get").await?;

        let already_granted = dataset.access.iter().any(|entry| {
            entry.get("userByEmail").and_then(Value::as_str) == Some(grant.member_email.as_str())
                && entry
                    .get("role")
                    .and_then(Value::as_str)
                    .is_some_and(|role| role_matches(role, &grant.role))
        });
        if already_granted {
            return Err(AppError::Conflict(format!(
                "'{}' already holds '{}' on dataset '{}'",
                grant.member_email, grant.role, grant.dataset_name
            )));
        }

        let mut access = dataset.access;
        access.push(json!({
            "role": grant.role,
            "userByEmail": grant.member_email,
        }));

        self.client
            .send_json::<_, IgnoredAny>(
                Method::PATCH,
                url,
                &json!({ "access": access }),
                "dataset access update",
            )
            .await
            .map(|_| ())
    }

    async fn delete_routing_rule(&self, parent: &ResourceScope, name: &str) -> AppResult<()> {
        let url = self.sink_url(parent, name)?;
        self.client.delete(url, "sink delete").await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use grantwatch_application::{
        DestinationSpec, LogRoutingAdmin, RoutingRuleSpec, WriteAccessGrant,
    };
    use grantwatch_core::AppError;
    use grantwatch_domain::ResourceScope;
    use httpmock::Method::{DELETE, GET, PATCH, POST};
    use httpmock::MockServer;
    use serde_json::json;

    use super::GoogleLogRoutingAdmin;
    use crate::google_api::GoogleApiClient;
    use crate::test_support::StaticCredentialProvider;

    fn admin(server: &MockServer) -> GoogleLogRoutingAdmin {
        GoogleLogRoutingAdmin::new(GoogleApiClient::new(
            reqwest::Client::new(),
            Arc::new(StaticCredentialProvider),
        ))
        .with_base_urls(server.base_url(), server.base_url())
    }

    fn scope(value: &str) -> ResourceScope {
        ResourceScope::parse(value).unwrap_or_else(|_| unreachable!())
    }

    fn access_grant() -> WriteAccessGrant {
        WriteAccessGrant {
            project_id: "proj".to_owned(),
            dataset_name: "grant_20240101_000000_g1".to_owned(),
            role: "roles/bigquery.dataEditor".to_owned(),
            member_email: "sink@gcp-sa-logging.iam.gserviceaccount.com".to_owned(),
        }
    }

    #[tokio::test]
    async fn dataset_is_created_in_region_with_description() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/bigquery/v2/projects/proj/datasets")
                .json_body(json!({
                    "datasetReference": {
                        "projectId": "proj",
                        "datasetId": "grant_20240101_000000_g1"
                    },
                    "location": "europe-west1",
                    "description": "PAM grant activity dataset for alice"
                }));
            then.status(200).json_body(json!({"id": "proj:grant_20240101_000000_g1"}));
        });

        let result = admin(&server)
            .create_destination(&DestinationSpec {
                project_id: "proj".to_owned(),
                dataset_name: "grant_20240101_000000_g1".to_owned(),
                location: "europe-west1".to_owned(),
                description: "PAM grant activity dataset for alice".to_owned(),
            })
            .await;

        assert!(result.is_ok());
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn existing_dataset_is_a_conflict() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(409).json_body(json!({"error": {"status": "ALREADY_EXISTS"}}));
        });

        let result = admin(&server)
            .create_destination(&DestinationSpec {
                project_id: "proj".to_owned(),
                dataset_name: "grant_20240101_000000_g1".to_owned(),
                location: "us-central1".to_owned(),
                description: String::new(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn sink_is_created_with_unique_writer_identity() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v2/folders/f1/sinks")
                .query_param("uniqueWriterIdentity", "true")
                .json_body(json!({
                    "name": "grant_20240101_000000_g1",
                    "destination": "bigquery.googleapis.com/projects/proj/datasets/grant_20240101_000000_g1",
                    "filter": "protoPayload.authenticationInfo.principalEmail=\"alice@example.com\"",
                    "includeChildren": true
                }));
            then.status(200).json_body(json!({
                "name": "grant_20240101_000000_g1",
                "writerIdentity": "serviceAccount:sink@gcp-sa-logging.iam.gserviceaccount.com"
            }));
        });

        let rule = admin(&server)
            .create_routing_rule(&RoutingRuleSpec {
                parent: scope("folders/f1"),
                name: "grant_20240101_000000_g1".to_owned(),
                filter: "protoPayload.authenticationInfo.principalEmail=\"alice@example.com\""
                    .to_owned(),
                destination:
                    "bigquery.googleapis.com/projects/proj/datasets/grant_20240101_000000_g1"
                        .to_owned(),
                include_children: true,
            })
            .await
            .unwrap_or_else(|_| unreachable!());

        mock.assert_calls(1);
        assert_eq!(
            rule.writer_identity.as_deref(),
            Some("serviceAccount:sink@gcp-sa-logging.iam.gserviceaccount.com")
        );
    }

    #[tokio::test]
    async fn write_access_is_appended_to_dataset_acl() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/bigquery/v2/projects/proj/datasets/grant_20240101_000000_g1");
            then.status(200).json_body(json!({
                "access": [{"role": "OWNER", "specialGroup": "projectOwners"}]
            }));
        });
        let patch = server.mock(|when, then| {
            when.method(PATCH)
                .path("/bigquery/v2/projects/proj/datasets/grant_20240101_000000_g1")
                .json_body(json!({
                    "access": [
                        {"role": "OWNER", "specialGroup": "projectOwners"},
                        {
                            "role": "roles/bigquery.dataEditor",
                            "userByEmail": "sink@gcp-sa-logging.iam.gserviceaccount.com"
                        }
                    ]
                }));
            then.status(200).json_body(json!({}));
        });

        let result = admin(&server).grant_write_access(&access_grant()).await;
        assert!(result.is_ok());
        patch.assert_calls(1);
    }

    #[tokio::test]
    async fn existing_write_access_is_a_conflict() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(200).json_body(json!({
                "access": [{
                    "role": "WRITER",
                    "userByEmail": "sink@gcp-sa-logging.iam.gserviceaccount.com"
                }]
            }));
        });
        let patch = server.mock(|when, then| {
            when.method(PATCH);
            then.status(200).json_body(json!({}));
        });

        let result = admin(&server).grant_write_access(&access_grant()).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        patch.assert_calls(0);
    }

    #[tokio::test]
    async fn missing_sink_delete_is_not_found() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/v2/projects/p1/sinks/grant_20240101_000000_g1");
            then.status(404).json_body(json!({"error": {"status": "NOT_FOUND"}}));
        });

        let result = admin(&server)
            .delete_routing_rule(&scope("projects/p1"), "grant_20240101_000000_g1")
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        mock.assert_calls(1);
    }
}
