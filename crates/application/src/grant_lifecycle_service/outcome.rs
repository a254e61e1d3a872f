use grantwatch_core::AppError;

use crate::audit_pipeline_service::ProvisioningReport;

/// What handling one grant event did.
#[derive(Debug)]
pub enum LifecycleOutcome {
    /// The grant is active and its audit pipeline was set up.
    Provisioned(ProvisioningReport),
    /// The grant terminated and its activity was summarized.
    Closed(ClosedGrantOutcome),
    /// The grant state needs no action.
    Ignored {
        /// Reported state.
        state: String,
    },
}

/// Result of handling a terminated grant.
#[derive(Debug)]
pub struct ClosedGrantOutcome {
    /// Teardown report, absent when teardown could not start.
    pub teardown: Option<ProvisioningReport>,
    /// Number of collected activity records.
    pub activity_count: usize,
    /// Summary delivery result.
    pub notification: NotificationStatus,
}

/// Summary delivery result.
#[derive(Debug)]
pub enum NotificationStatus {
    /// The notification was accepted by the dispatch service.
    Delivered,
    /// Delivery failed; the summary is lost.
    Failed(AppError),
}
