mod audit_log;
mod credentials;
mod grant_lookup;
mod log_routing;
mod notification;
mod resource_search;
mod text_generation;

pub use audit_log::{
    AUDIT_LOG_ORDER_DESCENDING, AuditLogEntry, AuditLogPage, AuditLogQuery, AuditLogReader,
};
pub use credentials::CredentialProvider;
pub use grant_lookup::{GrantDetails, GrantLookup};
pub use log_routing::{
    DestinationSpec, LogRoutingAdmin, RoutingRule, RoutingRuleSpec, WriteAccessGrant,
};
pub use notification::{NotificationDispatcher, SummaryNotification};
pub use resource_search::{PROJECT_ASSET_TYPE, ResourcePage, ResourceSearch, ScopedResource};
pub use text_generation::{GenerationConfig, TextGenerator, TokenCount};
