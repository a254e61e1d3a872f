use std::sync::Arc;

use grantwatch_core::{AppError, AppResult};
use grantwatch_domain::{Grant, SinkDescriptor, principal_filter};
use tracing::{info, warn};

use crate::grant_ports::{DestinationSpec, LogRoutingAdmin, RoutingRuleSpec, WriteAccessGrant};

mod report;

pub use report::{ProvisioningReport, ProvisioningStep, StepOutcome, StepStatus};

/// Role granted to a sink's writer identity on its dataset.
pub const DESTINATION_WRITER_ROLE: &str = "roles/bigquery.dataEditor";

/// Where per-grant capture datasets live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditPipelineSettings {
    /// Project owning the datasets.
    pub project_id: String,
    /// Dataset location.
    pub region: String,
}

/// Provisions and tears down the per-grant audit log pipeline.
///
/// Both directions are best-effort per step: a failing step is recorded in
/// the returned [`ProvisioningReport`] and the remaining steps still run.
/// Upstream state is keyed by the grant's [`SinkDescriptor`], so repeated
/// calls for the same grant converge instead of duplicating resources.
#[derive(Clone)]
pub struct AuditPipelineService {
    routing: Arc<dyn LogRoutingAdmin>,
    settings: AuditPipelineSettings,
}

impl AuditPipelineService {
    /// Creates an audit pipeline service.
    #[must_use]
    pub fn new(routing: Arc<dyn LogRoutingAdmin>, settings: AuditPipelineSettings) -> Self {
        Self { routing, settings }
    }

    /// Creates the dataset, the sink filtered on the grantee, and the
    /// dataset access entry for the sink writer.
    ///
    /// Fails only when the grant has no start time to name the pipeline by.
    pub async fn setup(&self, grant: &Grant) -> AppResult<ProvisioningReport> {
        let sink = SinkDescriptor::for_grant(grant)?;
        let mut report = ProvisioningReport::new(sink.clone());

        let destination = DestinationSpec {
            project_id: self.settings.project_id.clone(),
            dataset_name: sink.name().to_owned(),
            location: self.settings.region.clone(),
            description: format!(
                "PAM grant activity dataset for {} when given the grant {}",
                grant.requester(),
                grant.name()
            ),
        };
        let status = create_status(self.routing.create_destination(&destination).await);
        log_step(grant, &sink, ProvisioningStep::CreateDestination, &status);
        report.push(ProvisioningStep::CreateDestination, status);

        let rule_spec = RoutingRuleSpec {
            parent: grant.scope().clone(),
            name: sink.name().to_owned(),
            filter: principal_filter(grant.requester()),
            destination: sink.destination(&self.settings.project_id),
            include_children: grant.scope().includes_children(),
        };
        let (status, writer_identity) = match self.routing.create_routing_rule(&rule_spec).await {
            Ok(rule) => (StepStatus::Applied, rule.writer_identity),
            Err(AppError::Conflict(_)) => match self
                .routing
                .get_routing_rule(&rule_spec.parent, &rule_spec.name)
                .await
            {
                Ok(rule) => (StepStatus::AlreadySatisfied, rule.writer_identity),
                Err(error) => (
                    StepStatus::Failed(AppError::provisioning_step(error)),
                    None,
                ),
            },
            Err(error) => (
                StepStatus::Failed(AppError::provisioning_step(error)),
                None,
            ),
        };
        log_step(grant, &sink, ProvisioningStep::CreateRoutingRule, &status);
        report.push(ProvisioningStep::CreateRoutingRule, status);

        // The writer identity is assigned by sink creation, so this step
        // cannot run without it.
        let status = match writer_identity.as_deref().map(member_email) {
            Some(member_email) => {
                let access = WriteAccessGrant {
                    project_id: self.settings.project_id.clone(),
                    dataset_name: sink.name().to_owned(),
                    role: DESTINATION_WRITER_ROLE.to_owned(),
                    member_email: member_email.to_owned(),
                };
                create_status(self.routing.grant_write_access(&access).await)
            }
            None => StepStatus::Skipped("routing rule has no writer identity".to_owned()),
        };
        log_step(grant, &sink, ProvisioningStep::GrantWriteAccess, &status);
        report.push(ProvisioningStep::GrantWriteAccess, status);

        info!(
            grant = grant.name(),
            requester = grant.requester(),
            scope = %grant.scope(),
            role = grant.primary_role().unwrap_or_default(),
            sink = %sink,
            complete = report.is_complete(),
            "audit pipeline setup finished"
        );

        Ok(report)
    }

    /// Deletes the grant's sink. A sink that is already gone counts as
    /// deleted. The dataset is kept as the audit trail.
    pub async fn teardown(&self, grant: &Grant) -> AppResult<ProvisioningReport> {
        let sink = SinkDescriptor::for_grant(grant)?;
        let mut report = ProvisioningReport::new(sink.clone());

        let status = match self
            .routing
            .delete_routing_rule(grant.scope(), sink.name())
            .await
        {
            Ok(()) => StepStatus::Applied,
            Err(AppError::NotFound(_)) => StepStatus::AlreadySatisfied,
            Err(error) => StepStatus::Failed(AppError::provisioning_step(error)),
        };
        log_step(grant, &sink, ProvisioningStep::DeleteRoutingRule, &status);
        report.push(ProvisioningStep::DeleteRoutingRule, status);

        info!(
            grant = grant.name(),
            requester = grant.requester(),
            scope = %grant.scope(),
            sink = %sink,
            complete = report.is_complete(),
            "audit pipeline teardown finished"
        );

        Ok(report)
    }
}

fn create_status(result: AppResult<()>) -> StepStatus {
    match result {
        Ok(()) => StepStatus::Applied,
        Err(AppError::Conflict(_)) => StepStatus::AlreadySatisfied,
        Err(error) => StepStatus::Failed(AppError::provisioning_step(error)),
    }
}

// `serviceAccount:x@y` -> `x@y`
fn member_email(writer_identity: &str) -> &str {
    writer_identity
        .split_once(':')
        .map_or(writer_identity, |(_, email)| email)
}

fn log_step(grant: &Grant, sink: &SinkDescriptor, step: ProvisioningStep, status: &StepStatus) {
    let grant_name = grant.name();
    let requester = grant.requester();
    let scope = grant.scope();
    match status {
        StepStatus::Applied => info!(
            grant = grant_name,
            requester,
            scope = %scope,
            sink = %sink,
            step = %step,
            "audit pipeline step applied"
        ),
        StepStatus::AlreadySatisfied => info!(
            grant = grant_name,
            requester,
            scope = %scope,
            sink = %sink,
            step = %step,
            "audit pipeline step already satisfied"
        ),
        StepStatus::Skipped(reason) => warn!(
            grant = grant_name,
            requester,
            scope = %scope,
            sink = %sink,
            step = %step,
            reason = %reason,
            "audit pipeline step skipped"
        ),
        StepStatus::Failed(error) => warn!(
            grant = grant_name,
            requester,
            scope = %scope,
            sink = %sink,
            step = %step,
            error = %error,
            "audit pipeline step failed"
        ),
    }
}
