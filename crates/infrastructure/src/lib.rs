//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod cloud_asset_resource_search;
mod cloud_logging_audit_reader;
mod console_notification_dispatcher;
mod google_api;
mod google_log_routing_admin;
mod integration_notification_dispatcher;
mod metadata_credential_provider;
mod pam_grant_lookup;
mod vertex_text_generator;

#[cfg(test)]
mod test_support;

pub use cloud_asset_resource_search::{CloudAssetResourceSearch, DEFAULT_CLOUD_ASSET_BASE_URL};
pub use cloud_logging_audit_reader::CloudLoggingAuditReader;
pub use console_notification_dispatcher::ConsoleNotificationDispatcher;
pub use google_api::GoogleApiClient;
pub use google_log_routing_admin::{
    DEFAULT_BIGQUERY_BASE_URL, DEFAULT_LOGGING_BASE_URL, GoogleLogRoutingAdmin,
};
pub use integration_notification_dispatcher::{
    DEFAULT_TRIGGER_ID, IntegrationNotificationDispatcher,
};
pub use metadata_credential_provider::{DEFAULT_METADATA_BASE_URL, MetadataCredentialProvider};
pub use pam_grant_lookup::{DEFAULT_PAM_BASE_URL, PamGrantLookup};
pub use vertex_text_generator::{DEFAULT_MODEL, VertexTextGenerator};
