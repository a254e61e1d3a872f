use std::collections::HashSet;
use std::sync::Arc;

use grantwatch_core::{AppError, AppResult};
use grantwatch_domain::{ActivityRecord, ActivityWindow, Grant};
use tracing::{debug, info, warn};

use crate::grant_ports::{
    AUDIT_LOG_ORDER_DESCENDING, AuditLogEntry, AuditLogQuery, AuditLogReader, PROJECT_ASSET_TYPE,
    ResourceSearch, ScopedResource,
};

/// Handling of grants collected before they recorded an end time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityWindowPolicy {
    /// Fail collection with an invalid grant state error.
    #[default]
    Reject,
    /// Query from the start time without an upper bound.
    OpenEnded,
}

impl ActivityWindowPolicy {
    /// Parses a configuration value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "open_ended" => Ok(Self::OpenEnded),
            other => Err(AppError::Configuration(format!(
                "unsupported activity window policy '{other}'"
            ))),
        }
    }
}

/// Collects the grantee's audit log entries across the grant scope.
#[derive(Clone)]
pub struct ActivityCollector {
    search: Arc<dyn ResourceSearch>,
    audit_log: Arc<dyn AuditLogReader>,
    window_policy: ActivityWindowPolicy,
}

impl ActivityCollector {
    /// Creates an activity collector.
    #[must_use]
    pub fn new(
        search: Arc<dyn ResourceSearch>,
        audit_log: Arc<dyn AuditLogReader>,
        window_policy: ActivityWindowPolicy,
    ) -> Self {
        Self {
            search,
            audit_log,
            window_policy,
        }
    }

    /// Returns the grant with its activity attached.
    ///
    /// Resources are visited in search order and each resource's entries are
    /// appended most recent first. Entries stamped outside the grant window
    /// are dropped. A failed query for any resource fails the whole
    /// collection, as does a page token the service hands out twice.
    pub async fn collect(&self, grant: Grant) -> AppResult<Grant> {
        let window = self.window_for(&grant)?;
        let filter = window.filter_for(grant.requester());

        let resources = self.active_resources(&grant).await?;
        let mut activities = Vec::new();
        for resource in &resources {
            let entries = self.entries_for(resource, &filter, &window).await?;
            debug!(
                grant = grant.name(),
                project = %resource.id,
                entries = entries.len(),
                "collected resource activity"
            );
            activities.extend(entries.into_iter().map(|entry| ActivityRecord {
                project_id: resource.id.clone(),
                project_name: resource.display_name.clone(),
                service_name: entry.service_name,
                method_name: entry.method_name,
                resource_name: entry.resource_name,
                timestamp: entry.timestamp,
            }));
        }

        info!(
            grant = grant.name(),
            requester = grant.requester(),
            scope = %grant.scope(),
            resources = resources.len(),
            activities = activities.len(),
            "grant activity collected"
        );

        grant.with_activities(activities)
    }

    fn window_for(&self, grant: &Grant) -> AppResult<ActivityWindow> {
        let start = grant.start_time().ok_or_else(|| {
            AppError::InvalidGrantState(format!(
                "grant '{}' has no start time to collect activity from",
                grant.name()
            ))
        })?;

        match (grant.end_time(), self.window_policy) {
            (Some(end), _) => Ok(ActivityWindow::closed(start, end)),
            (None, ActivityWindowPolicy::OpenEnded) => Ok(ActivityWindow::open_ended(start)),
            (None, ActivityWindowPolicy::Reject) => Err(AppError::InvalidGrantState(format!(
                "grant '{}' has no end time to bound its activity window",
                grant.name()
            ))),
        }
    }

    async fn active_resources(&self, grant: &Grant) -> AppResult<Vec<ScopedResource>> {
        let mut resources = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        loop {
            let page = self
                .search
                .search_active_resources(grant.scope(), PROJECT_ASSET_TYPE, page_token.as_deref())
                .await
                .map_err(AppError::activity_query)?;
            resources.extend(page.resources);

            page_token = next_page_token(
                &mut seen_tokens,
                page.next_page_token,
                &format!("resource search in {}", grant.scope()),
            )?;
            if page_token.is_none() {
                break;
            }
        }

        Ok(resources)
    }

    async fn entries_for(
        &self,
        resource: &ScopedResource,
        filter: &str,
        window: &ActivityWindow,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let mut query = AuditLogQuery {
            project_id: resource.id.clone(),
            filter: filter.to_owned(),
            order_by: AUDIT_LOG_ORDER_DESCENDING.to_owned(),
            page_token: None,
        };

        let mut entries = Vec::new();
        let mut seen_tokens = HashSet::new();
        loop {
            let page = self
                .audit_log
                .list_entries(&query)
                .await
                .map_err(AppError::activity_query)?;
            entries.extend(page.entries);

            query.page_token = next_page_token(
                &mut seen_tokens,
                page.next_page_token,
                &format!("audit log listing for {}", resource.id),
            )?;
            if query.page_token.is_none() {
                break;
            }
        }

        let fetched = entries.len();
        entries.retain(|entry| window.contains(entry.timestamp));
        if entries.len() < fetched {
            warn!(
                project = %resource.id,
                dropped = fetched - entries.len(),
                "dropped audit entries outside the grant window"
            );
        }

        // Upstream ordering is requested, but the per-resource order is
        // enforced here. The sort is stable, so equal timestamps keep their
        // upstream order.
        entries.sort_by(|left, right| right.timestamp.cmp(&left.timestamp));
        Ok(entries)
    }
}

// A repeated token would page forever.
fn next_page_token(
    seen: &mut HashSet<String>,
    token: Option<String>,
    listing: &str,
) -> AppResult<Option<String>> {
    match token {
        Some(token) if !token.is_empty() => {
            if !seen.insert(token.clone()) {
                return Err(AppError::activity_query(AppError::Upstream(format!(
                    "{listing} repeated page token '{token}'"
                ))));
            }
            Ok(Some(token))
        }
        _ => Ok(None),
    }
}
