use std::sync::Arc;

use grantwatch_application::{
    ActivityCollector, AuditPipelineService, AuditPipelineSettings, CredentialProvider,
    GrantLifecycleService, GrantResolver, Notifier, Summarizer,
};
use grantwatch_core::AppError;
use grantwatch_infrastructure::{
    CloudAssetResourceSearch, CloudLoggingAuditReader, GoogleApiClient, GoogleLogRoutingAdmin,
    MetadataCredentialProvider, PamGrantLookup, VertexTextGenerator,
};
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

mod clients;

pub fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let upstream_http = clients::build_http_client(config.upstream_timeout_seconds)?;
    let summary_http = clients::build_http_client(config.summary.timeout_seconds)?;

    let credentials: Arc<dyn CredentialProvider> =
        Arc::new(MetadataCredentialProvider::new(upstream_http.clone()));
    let upstream_api = GoogleApiClient::new(upstream_http.clone(), credentials.clone());
    let summary_api = GoogleApiClient::new(summary_http, credentials.clone());

    let resolver = GrantResolver::new(Arc::new(PamGrantLookup::new(upstream_api.clone())));
    let provisioner = AuditPipelineService::new(
        Arc::new(GoogleLogRoutingAdmin::new(upstream_api.clone())),
        AuditPipelineSettings {
            project_id: config.project_id.clone(),
            region: config.region.clone(),
        },
    );
    let collector = ActivityCollector::new(
        Arc::new(CloudAssetResourceSearch::new(upstream_api.clone())),
        Arc::new(CloudLoggingAuditReader::new(upstream_api)),
        config.activity_window_policy,
    );
    let summarizer = Summarizer::new(
        Arc::new(VertexTextGenerator::new(
            summary_api,
            config.project_id.clone(),
            config.summary.location.clone(),
            config.summary.model.clone(),
        )),
        config.summary.generation,
    );
    let notifier = Notifier::new(
        credentials,
        clients::build_notification_dispatcher(config, upstream_http),
        config.summary_recipient.clone(),
    );

    info!(
        project_id = %config.project_id,
        region = %config.region,
        model = %config.summary.model,
        window_policy = ?config.activity_window_policy,
        failure_response_mode = ?config.failure_response_mode,
        "grant lifecycle services configured"
    );

    Ok(AppState {
        grant_lifecycle_service: GrantLifecycleService::new(
            resolver,
            provisioner,
            collector,
            summarizer,
            notifier,
        ),
        failure_response_mode: config.failure_response_mode,
    })
}
