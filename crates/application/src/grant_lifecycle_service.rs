use grantwatch_core::AppResult;
use grantwatch_domain::{Grant, GrantReference, GrantState};
use tracing::{info, warn};

use crate::activity_collector::ActivityCollector;
use crate::audit_pipeline_service::{AuditPipelineService, ProvisioningReport};
use crate::event_decoder::decode_push_envelope;
use crate::grant_resolver::GrantResolver;
use crate::notifier::Notifier;
use crate::summarizer::Summarizer;

mod outcome;

pub use outcome::{ClosedGrantOutcome, LifecycleOutcome, NotificationStatus};

/// Drives one grant audit event through the grant lifecycle.
///
/// Each call is a single-shot reduction over the grant state reported by the
/// lookup service. No state is kept between calls; redelivered events rely on
/// idempotent provisioning and teardown.
#[derive(Clone)]
pub struct GrantLifecycleService {
    resolver: GrantResolver,
    provisioner: AuditPipelineService,
    collector: ActivityCollector,
    summarizer: Summarizer,
    notifier: Notifier,
}

impl GrantLifecycleService {
    /// Creates a grant lifecycle service.
    #[must_use]
    pub fn new(
        resolver: GrantResolver,
        provisioner: AuditPipelineService,
        collector: ActivityCollector,
        summarizer: Summarizer,
        notifier: Notifier,
    ) -> Self {
        Self {
            resolver,
            provisioner,
            collector,
            summarizer,
            notifier,
        }
    }

    /// Decodes a raw push envelope and handles the referenced grant.
    ///
    /// Decode failures return [`grantwatch_core::AppError::MalformedEvent`]
    /// before any collaborator is called.
    pub async fn handle_push_envelope(&self, body: &[u8]) -> AppResult<LifecycleOutcome> {
        let reference = decode_push_envelope(body)?;
        self.handle_grant_reference(&reference).await
    }

    /// Resolves the grant and runs the action for its current state.
    pub async fn handle_grant_reference(
        &self,
        reference: &GrantReference,
    ) -> AppResult<LifecycleOutcome> {
        let grant = self.resolver.resolve(reference).await?;

        info!(
            grant = grant.name(),
            requester = grant.requester(),
            state = %grant.state(),
            scope = %grant.scope(),
            role = grant.primary_role().unwrap_or_default(),
            justification = grant.justification(),
            requested_duration_seconds = grant.requested_duration_seconds(),
            "handling grant event"
        );

        match grant.state().clone() {
            GrantState::Active => {
                let report = self.provisioner.setup(&grant).await?;
                log_incomplete(&grant, &report);
                Ok(LifecycleOutcome::Provisioned(report))
            }
            GrantState::Ended | GrantState::Revoked => self
                .close(grant)
                .await
                .map(LifecycleOutcome::Closed),
            GrantState::Other(state) => {
                info!(grant = grant.name(), state = %state, "grant state needs no action");
                Ok(LifecycleOutcome::Ignored { state })
            }
        }
    }

    async fn close(&self, grant: Grant) -> AppResult<ClosedGrantOutcome> {
        // Teardown never blocks the summary path.
        let teardown = match self.provisioner.teardown(&grant).await {
            Ok(report) => {
                log_incomplete(&grant, &report);
                Some(report)
            }
            Err(error) => {
                warn!(grant = grant.name(), error = %error, "audit pipeline teardown failed");
                None
            }
        };

        let grant = self.collector.collect(grant).await?;
        let summary = self.summarizer.summarize(grant.activities()).await?;

        let notification = match self.notifier.notify(grant.requester(), &summary).await {
            Ok(()) => NotificationStatus::Delivered,
            Err(error) => {
                warn!(
                    grant = grant.name(),
                    requester = grant.requester(),
                    error = %error,
                    "activity summary notification was not delivered"
                );
                NotificationStatus::Failed(error)
            }
        };

        Ok(ClosedGrantOutcome {
            teardown,
            activity_count: grant.activities().len(),
            notification,
        })
    }
}

fn log_incomplete(grant: &Grant, report: &ProvisioningReport) {
    for outcome in report.failures() {
        warn!(
            grant = grant.name(),
            sink = %report.sink(),
            step = %outcome.step,
            status = ?outcome.status,
            "audit pipeline left incomplete"
        );
    }
}
