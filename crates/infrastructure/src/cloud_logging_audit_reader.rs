use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grantwatch_application::{AuditLogEntry, AuditLogPage, AuditLogQuery, AuditLogReader};
use grantwatch_core::AppResult;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::google_api::{GoogleApiClient, api_url};
use crate::google_log_routing_admin::DEFAULT_LOGGING_BASE_URL;

const PAGE_SIZE: u32 = 1000;

/// Audit log reader backed by cloud logging `entries.list`.
pub struct CloudLoggingAuditReader {
    client: GoogleApiClient,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListEntriesRequest<'a> {
    resource_names: [String; 1],
    filter: &'a str,
    order_by: &'a str,
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEntriesResponse {
    #[serde(default)]
    entries: Vec<LogEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogEntry {
    timestamp: DateTime<Utc>,
    #[serde(default)]
    proto_payload: AuditPayload,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AuditPayload {
    service_name: String,
    method_name: String,
    resource_name: Option<String>,
}

impl CloudLoggingAuditReader {
    /// Creates a reader against the public endpoint.
    #[must_use]
    pub fn new(client: GoogleApiClient) -> Self {
        Self {
            client,
            base_url: DEFAULT_LOGGING_BASE_URL.to_owned(),
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
impl AuditLogReader for CloudLoggingAuditReader {
    async fn list_entries(&self, query: &AuditLogQuery) -> AppResult<AuditLogPage> {
        let url = api_url(&self.base_url, "v2/entries:list")?;
        let body = ListEntriesRequest {
            resource_names: [format!("projects/{}", query.project_id)],
            filter: &query.filter,
            order_by: &query.order_by,
            page_size: PAGE_SIZE,
            page_token: query.page_token.as_deref(),
        };

        let response: ListEntriesResponse = self
            .client
            .send_json(Method::POST, url, &body, "audit log query")
            .await?;

        Ok(AuditLogPage {
            entries: response
                .entries
                .into_iter()
                .map(|entry| AuditLogEntry {
                    service_name: entry.proto_payload.service_name,
                    method_name: entry.proto_payload.method_name,
                    resource_name: entry.proto_payload.resource_name,
                    timestamp: entry.timestamp,
                })
                .collect(),
            next_page_token: response
                .next_page_token
                .filter(|token| !token.is_empty()),
        })
    }
}
