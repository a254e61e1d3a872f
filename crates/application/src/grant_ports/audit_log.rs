use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grantwatch_core::AppResult;

/// Most recent entries first.
pub const AUDIT_LOG_ORDER_DESCENDING: &str = "timestamp desc";

/// Audit log query for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// Project whose logs are read.
    pub project_id: String,
    /// Logging filter expression.
    pub filter: String,
    /// Ordering expression.
    pub order_by: String,
    /// Page token from the previous page.
    pub page_token: Option<String>,
}

/// Fields of one audit log entry used for activity summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    /// API service that handled the call.
    pub service_name: String,
    /// API method that was invoked.
    pub method_name: String,
    /// Resource the call targeted.
    pub resource_name: Option<String>,
    /// Entry timestamp.
    pub timestamp: DateTime<Utc>,
}

/// One page of audit log entries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuditLogPage {
    /// Entries in requested order.
    pub entries: Vec<AuditLogEntry>,
    /// Token for the next page, absent on the last page.
    pub next_page_token: Option<String>,
}

/// Port for the audit-log query service.
#[async_trait]
pub trait AuditLogReader: Send + Sync {
    /// Returns one page of entries matching the query.
    async fn list_entries(&self, query: &AuditLogQuery) -> AppResult<AuditLogPage>;
}
