//! In-memory port fakes shared by the service test suites.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grantwatch_core::{AppError, AppResult, BearerToken};
use grantwatch_domain::{Grant, GrantInput, GrantReference, GrantState, ResourceScope};
use tokio::sync::Mutex;

use crate::grant_ports::{
    AuditLogEntry, AuditLogPage, AuditLogQuery, AuditLogReader, CredentialProvider,
    DestinationSpec, GenerationConfig, GrantDetails, GrantLookup, LogRoutingAdmin,
    NotificationDispatcher, ResourcePage, ResourceSearch, RoutingRule, RoutingRuleSpec,
    ScopedResource, SummaryNotification, TextGenerator, TokenCount, WriteAccessGrant,
};

/// Formatted tracing output captured for the current thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<std::sync::Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_target(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines_containing(&self, message: &str) -> Vec<String> {
        let bytes = self
            .0
            .lock()
            .map(|bytes| bytes.clone())
            .unwrap_or_default();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| line.contains(message))
            .map(str::to_owned)
            .collect()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut bytes) = self.0.lock() {
            bytes.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Ordered record of port calls across all fakes sharing it.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub async fn record(&self, operation: impl Into<String>) {
        self.0.lock().await.push(operation.into());
    }

    pub async fn entries(&self) -> Vec<String> {
        self.0.lock().await.clone()
    }
}

pub fn timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|value| value.with_timezone(&Utc))
        .unwrap_or_else(|_| unreachable!())
}

pub fn sample_details(state: &str, end_time: Option<&str>) -> GrantDetails {
    GrantDetails {
        name: "projects/p1/locations/global/entitlements/e1/grants/g1".to_owned(),
        requester: "alice@example.com".to_owned(),
        state: state.to_owned(),
        role_bindings: vec!["roles/compute.admin".to_owned()],
        scope: "//cloudresourcemanager.googleapis.com/projects/p1".to_owned(),
        start_time: Some("2024-01-01T00:00:00Z".to_owned()),
        end_time: end_time.map(str::to_owned),
        justification: "incident 42".to_owned(),
        requested_duration_seconds: Some(3600),
    }
}

pub fn sample_grant(state: GrantState, scope: &str, end_time: Option<&str>) -> Grant {
    Grant::new(GrantInput {
        name: "projects/p1/locations/global/entitlements/e1/grants/g1".to_owned(),
        requester: "alice@example.com".to_owned(),
        state,
        role_bindings: vec!["roles/compute.admin".to_owned()],
        scope: ResourceScope::parse(scope).unwrap_or_else(|_| unreachable!()),
        start_time: Some(timestamp("2024-01-01T00:00:00Z")),
        end_time: end_time.map(timestamp),
        justification: "incident 42".to_owned(),
        requested_duration_seconds: Some(3600),
    })
    .unwrap_or_else(|_| unreachable!())
}

pub struct FakeGrantLookup {
    details: Option<GrantDetails>,
    calls: Mutex<usize>,
}

impl FakeGrantLookup {
    pub fn returning(details: GrantDetails) -> Self {
        Self {
            details: Some(details),
            calls: Mutex::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            details: None,
            calls: Mutex::new(0),
        }
    }

    pub async fn calls(&self) -> usize {
        *self.calls.lock().await
    }
}

#[async_trait]
impl GrantLookup for FakeGrantLookup {
    async fn get_grant(&self, reference: &GrantReference) -> AppResult<GrantDetails> {
        *self.calls.lock().await += 1;
        self.details
            .clone()
            .ok_or_else(|| AppError::NotFound(format!("grant '{reference}' does not exist")))
    }
}

#[derive(Default)]
pub struct FakeLogRoutingAdmin {
    pub journal: Journal,
    pub fail_destination: bool,
    pub fail_routing_rule: bool,
    pub fail_delete: bool,
    destinations: Mutex<HashSet<String>>,
    rules: Mutex<HashMap<(String, String), RoutingRuleSpec>>,
    access: Mutex<Vec<WriteAccessGrant>>,
    created_destinations: Mutex<Vec<DestinationSpec>>,
}

impl FakeLogRoutingAdmin {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    pub async fn created_destinations(&self) -> Vec<DestinationSpec> {
        self.created_destinations.lock().await.clone()
    }

    pub async fn rules(&self) -> Vec<RoutingRuleSpec> {
        self.rules.lock().await.values().cloned().collect()
    }

    pub async fn access_entries(&self) -> Vec<WriteAccessGrant> {
        self.access.lock().await.clone()
    }

    fn writer_identity(name: &str) -> String {
        format!("serviceAccount:{name}@gcp-sa-logging.iam.gserviceaccount.com")
    }
}

#[async_trait]
impl LogRoutingAdmin for FakeLogRoutingAdmin {
    async fn create_destination(&self, spec: &DestinationSpec) -> AppResult<()> {
        self.journal.record("create_destination").await;
        if self.fail_destination {
            return Err(AppError::Upstream("dataset insert returned 500".to_owned()));
        }

        let dataset_id = format!("{}.{}", spec.project_id, spec.dataset_name);
        if !self.destinations.lock().await.insert(dataset_id.clone()) {
            return Err(AppError::Conflict(format!("dataset '{dataset_id}' exists")));
        }

        self.created_destinations.lock().await.push(spec.clone());
        Ok(())
    }

    async fn create_routing_rule(&self, spec: &RoutingRuleSpec) -> AppResult<RoutingRule> {
        self.journal.record("create_routing_rule").await;
        if self.fail_routing_rule {
            return Err(AppError::Timeout("sink create timed out".to_owned()));
        }

        let key = (spec.parent.to_string(), spec.name.clone());
        let mut rules = self.rules.lock().await;
        if rules.contains_key(&key) {
            return Err(AppError::Conflict(format!("sink '{}' exists", spec.name)));
        }

        rules.insert(key, spec.clone());
        Ok(RoutingRule {
            name: spec.name.clone(),
            writer_identity: Some(Self::writer_identity(&spec.name)),
        })
    }

    async fn get_routing_rule(
        &self,
        parent: &ResourceScope,
        name: &str,
    ) -> AppResult<RoutingRule> {
        self.journal.record("get_routing_rule").await;
        let rules = self.rules.lock().await;
        rules
            .get(&(parent.to_string(), name.to_owned()))
            .map(|spec| RoutingRule {
                name: spec.name.clone(),
                writer_identity: Some(Self::writer_identity(&spec.name)),
            })
            .ok_or_else(|| AppError::NotFound(format!("sink '{name}' does not exist")))
    }

    async fn grant_write_access(&self, grant: &WriteAccessGrant) -> AppResult<()> {
        self.journal.record("grant_write_access").await;
        let mut access = self.access.lock().await;
        if access.contains(grant) {
            return Err(AppError::Conflict(format!(
                "'{}' already has '{}'",
                grant.member_email, grant.role
            )));
        }

        access.push(grant.clone());
        Ok(())
    }

    async fn delete_routing_rule(&self, parent: &ResourceScope, name: &str) -> AppResult<()> {
        self.journal.record("delete_routing_rule").await;
        if self.fail_delete {
            return Err(AppError::Upstream("sink delete returned 503".to_owned()));
        }

        self.rules
            .lock()
            .await
            .remove(&(parent.to_string(), name.to_owned()))
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("sink '{name}' does not exist")))
    }
}

#[derive(Default)]
pub struct FakeResourceSearch {
    pub journal: Journal,
    pub repeat_page_token: bool,
    pages: Vec<Vec<ScopedResource>>,
}

impl FakeResourceSearch {
    pub fn with_pages(journal: Journal, pages: Vec<Vec<(&str, &str)>>) -> Self {
        Self {
            journal,
            repeat_page_token: false,
            pages: pages
                .into_iter()
                .map(|page| {
                    page.into_iter()
                        .map(|(id, display_name)| ScopedResource {
                            id: id.to_owned(),
                            display_name: display_name.to_owned(),
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ResourceSearch for FakeResourceSearch {
    async fn search_active_resources(
        &self,
        scope: &ResourceScope,
        _asset_type: &str,
        page_token: Option<&str>,
    ) -> AppResult<ResourcePage> {
        self.journal
            .record(format!("search_active_resources:{scope}"))
            .await;

        let index = page_token
            .and_then(|token| token.strip_prefix("page-"))
            .and_then(|index| index.parse::<usize>().ok())
            .unwrap_or(0);
        let resources = self.pages.get(index).cloned().unwrap_or_default();
        let next_page_token = if self.repeat_page_token {
            Some("page-0".to_owned())
        } else {
            (index + 1 < self.pages.len()).then(|| format!("page-{}", index + 1))
        };

        Ok(ResourcePage {
            resources,
            next_page_token,
        })
    }
}

#[derive(Default)]
pub struct FakeAuditLogReader {
    pub journal: Journal,
    pub failing_project: Option<String>,
    pub repeat_page_token: bool,
    pages: HashMap<String, Vec<Vec<AuditLogEntry>>>,
    queries: Mutex<Vec<AuditLogQuery>>,
}

impl FakeAuditLogReader {
    pub fn with_entries(journal: Journal, pages: Vec<(&str, Vec<Vec<AuditLogEntry>>)>) -> Self {
        Self {
            journal,
            pages: pages
                .into_iter()
                .map(|(project_id, pages)| (project_id.to_owned(), pages))
                .collect(),
            ..Self::default()
        }
    }

    pub async fn queries(&self) -> Vec<AuditLogQuery> {
        self.queries.lock().await.clone()
    }
}

pub fn entry(method_name: &str, timestamp_value: &str) -> AuditLogEntry {
    AuditLogEntry {
        service_name: "compute.googleapis.com".to_owned(),
        method_name: method_name.to_owned(),
        resource_name: Some(format!("instances/{method_name}")),
        timestamp: timestamp(timestamp_value),
    }
}

#[async_trait]
impl AuditLogReader for FakeAuditLogReader {
    async fn list_entries(&self, query: &AuditLogQuery) -> AppResult<AuditLogPage> {
        self.journal
            .record(format!("list_entries:{}", query.project_id))
            .await;
        self.queries.lock().await.push(query.clone());

        if self.failing_project.as_deref() == Some(query.project_id.as_str()) {
            return Err(AppError::Upstream(format!(
                "entries.list for '{}' returned 500",
                query.project_id
            )));
        }

        let pages = self.pages.get(&query.project_id).cloned().unwrap_or_default();
        let index = query
            .page_token
            .as_deref()
            .and_then(|token| token.parse::<usize>().ok())
            .unwrap_or(0);

        Ok(AuditLogPage {
            entries: pages.get(index).cloned().unwrap_or_default(),
            next_page_token: if self.repeat_page_token {
                Some("0".to_owned())
            } else {
                (index + 1 < pages.len()).then(|| (index + 1).to_string())
            },
        })
    }
}

pub struct FakeTextGenerator {
    pub journal: Journal,
    pub response: Option<String>,
    pub fail_token_count: bool,
    prompts: Mutex<Vec<(String, GenerationConfig)>>,
}

impl FakeTextGenerator {
    pub fn replying(journal: Journal, response: &str) -> Self {
        Self {
            journal,
            response: Some(response.to_owned()),
            fail_token_count: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(journal: Journal) -> Self {
        Self {
            journal,
            response: None,
            fail_token_count: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub async fn prompts(&self) -> Vec<(String, GenerationConfig)> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl TextGenerator for FakeTextGenerator {
    async fn count_tokens(&self, prompt: &str) -> AppResult<TokenCount> {
        if self.fail_token_count {
            return Err(AppError::Upstream("countTokens returned 429".to_owned()));
        }

        Ok(TokenCount {
            total_tokens: (prompt.len() / 4) as u64,
            total_billable_characters: prompt.len() as u64,
        })
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> AppResult<String> {
        self.journal.record("generate").await;
        self.prompts
            .lock()
            .await
            .push((prompt.to_owned(), *config));
        self.response
            .clone()
            .ok_or_else(|| AppError::Upstream("generateContent returned 500".to_owned()))
    }
}

#[derive(Default)]
pub struct FakeCredentialProvider {
    pub fail: bool,
}

#[async_trait]
impl CredentialProvider for FakeCredentialProvider {
    async fn ambient_token(&self) -> AppResult<BearerToken> {
        if self.fail {
            return Err(AppError::Timeout("metadata server timed out".to_owned()));
        }

        BearerToken::new("test-token")
    }
}

#[derive(Default)]
pub struct FakeNotificationDispatcher {
    pub journal: Journal,
    pub fail: bool,
    sent: Mutex<Vec<(SummaryNotification, String)>>,
}

impl FakeNotificationDispatcher {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    pub async fn sent(&self) -> Vec<(SummaryNotification, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationDispatcher for FakeNotificationDispatcher {
    async fn dispatch(
        &self,
        notification: &SummaryNotification,
        token: &BearerToken,
    ) -> AppResult<()> {
        self.journal.record("dispatch").await;
        if self.fail {
            return Err(AppError::Upstream("integration returned 502".to_owned()));
        }

        self.sent
            .lock()
            .await
            .push((notification.clone(), token.secret().to_owned()));
        Ok(())
    }
}
