use std::fmt::{Display, Formatter};

use grantwatch_core::AppError;
use grantwatch_domain::SinkDescriptor;

/// One step of audit pipeline provisioning or teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvisioningStep {
    /// Create the capture dataset.
    CreateDestination,
    /// Create the log sink routing the grantee's entries to the dataset.
    CreateRoutingRule,
    /// Let the sink's writer identity write into the dataset.
    GrantWriteAccess,
    /// Delete the log sink.
    DeleteRoutingRule,
}

impl ProvisioningStep {
    /// Returns a stable step name for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateDestination => "create_destination",
            Self::CreateRoutingRule => "create_routing_rule",
            Self::GrantWriteAccess => "grant_write_access",
            Self::DeleteRoutingRule => "delete_routing_rule",
        }
    }
}

impl Display for ProvisioningStep {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Result of one provisioning step.
#[derive(Debug)]
pub enum StepStatus {
    /// The step changed upstream state.
    Applied,
    /// Upstream state already matched: created earlier, or already deleted.
    AlreadySatisfied,
    /// The step was not attempted.
    Skipped(String),
    /// The step failed.
    Failed(AppError),
}

impl StepStatus {
    /// Returns whether the desired upstream state holds after the step.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Applied | Self::AlreadySatisfied)
    }
}

/// Step and its status.
#[derive(Debug)]
pub struct StepOutcome {
    /// Step that ran.
    pub step: ProvisioningStep,
    /// What happened.
    pub status: StepStatus,
}

/// Ordered step outcomes for one grant's audit pipeline.
#[derive(Debug)]
pub struct ProvisioningReport {
    sink: SinkDescriptor,
    outcomes: Vec<StepOutcome>,
}

impl ProvisioningReport {
    pub(super) fn new(sink: SinkDescriptor) -> Self {
        Self {
            sink,
            outcomes: Vec::new(),
        }
    }

    pub(super) fn push(&mut self, step: ProvisioningStep, status: StepStatus) {
        self.outcomes.push(StepOutcome { step, status });
    }

    /// Returns the pipeline the report describes.
    #[must_use]
    pub fn sink(&self) -> &SinkDescriptor {
        &self.sink
    }

    /// Returns the status recorded for `step`.
    #[must_use]
    pub fn status_of(&self, step: ProvisioningStep) -> Option<&StepStatus> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.step == step)
            .map(|outcome| &outcome.status)
    }

    /// Returns whether every step left upstream state as desired.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcomes
            .iter()
            .all(|outcome| outcome.status.is_satisfied())
    }

    /// Returns the steps that failed or were skipped.
    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.status.is_satisfied())
    }
}
