//! Application services and ports.

#![forbid(unsafe_code)]

mod activity_collector;
mod audit_pipeline_service;
mod event_decoder;
mod grant_lifecycle_service;
mod grant_ports;
mod grant_resolver;
mod notifier;
mod summarizer;

#[cfg(test)]
mod test_fakes;

pub use activity_collector::{ActivityCollector, ActivityWindowPolicy};
pub use audit_pipeline_service::{
    AuditPipelineService, AuditPipelineSettings, DESTINATION_WRITER_ROLE, ProvisioningReport,
    ProvisioningStep, StepOutcome, StepStatus,
};
pub use event_decoder::decode_push_envelope;
pub use grant_lifecycle_service::{
    ClosedGrantOutcome, GrantLifecycleService, LifecycleOutcome, NotificationStatus,
};
pub use grant_ports::{
    AUDIT_LOG_ORDER_DESCENDING, AuditLogEntry, AuditLogPage, AuditLogQuery, AuditLogReader,
    CredentialProvider, DestinationSpec, GenerationConfig, GrantDetails, GrantLookup,
    LogRoutingAdmin, NotificationDispatcher, PROJECT_ASSET_TYPE, ResourcePage, ResourceSearch,
    RoutingRule, RoutingRuleSpec, ScopedResource, SummaryNotification, TextGenerator, TokenCount,
    WriteAccessGrant,
};
pub use grant_resolver::GrantResolver;
pub use notifier::{Notifier, render_summary_html};
pub use summarizer::Summarizer;
