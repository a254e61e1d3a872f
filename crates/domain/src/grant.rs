use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use grantwatch_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{ActivityRecord, ResourceScope};

/// Opaque resource name of a privileged access grant, as carried by the
/// inbound audit event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantReference(NonEmptyString);

impl GrantReference {
    /// Creates a validated grant reference.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        NonEmptyString::new(value.trim())
            .map(Self)
            .map_err(|_| AppError::MalformedEvent("grant reference must not be empty".to_owned()))
    }

    /// Returns the reference string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for GrantReference {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Lifecycle state reported by the grant lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GrantState {
    /// Access is currently granted.
    Active,
    /// Access expired at the end of the requested duration.
    Ended,
    /// Access was withdrawn before it expired.
    Revoked,
    /// Any other state, such as pending approval or scheduled.
    Other(String),
}

impl GrantState {
    /// Parses a transport value. Unknown values map to [`GrantState::Other`].
    #[must_use]
    pub fn from_transport(value: &str) -> Self {
        match value {
            "ACTIVE" => Self::Active,
            "ENDED" => Self::Ended,
            "REVOKED" => Self::Revoked,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the transport value for this state.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "ACTIVE",
            Self::Ended => "ENDED",
            Self::Revoked => "REVOKED",
            Self::Other(value) => value.as_str(),
        }
    }

    /// Returns whether the grant has terminated and its activity can be
    /// summarized.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended | Self::Revoked)
    }
}

impl Display for GrantState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Normalized grant details used to build a [`Grant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantInput {
    /// Grant resource name.
    pub name: String,
    /// Grantee principal.
    pub requester: String,
    /// Lifecycle state.
    pub state: GrantState,
    /// Granted roles in lookup order.
    pub role_bindings: Vec<String>,
    /// Scope the roles are bound on.
    pub scope: ResourceScope,
    /// Time access was granted, absent until the grant activates.
    pub start_time: Option<DateTime<Utc>>,
    /// Time access was removed, absent while active.
    pub end_time: Option<DateTime<Utc>>,
    /// Free-text justification supplied by the requester.
    pub justification: String,
    /// Requested grant duration in seconds, when known.
    pub requested_duration_seconds: Option<i64>,
}

/// A time-bounded privileged access authorization.
///
/// Built fresh per inbound event and never persisted. Activity is attached at
/// most once, by [`Grant::with_activities`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    name: NonEmptyString,
    requester: NonEmptyString,
    state: GrantState,
    role_bindings: Vec<String>,
    scope: ResourceScope,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    justification: String,
    requested_duration_seconds: Option<i64>,
    activities: Option<Vec<ActivityRecord>>,
}

impl Grant {
    /// Creates a validated grant.
    pub fn new(input: GrantInput) -> AppResult<Self> {
        let name = NonEmptyString::new(input.name)
            .map_err(|_| AppError::InvalidGrantState("grant name must not be empty".to_owned()))?;
        let requester = NonEmptyString::new(input.requester).map_err(|_| {
            AppError::InvalidGrantState(format!(
                "grant '{}' has no requester",
                name.as_str()
            ))
        })?;

        if let (Some(start_time), Some(end_time)) = (input.start_time, input.end_time)
            && end_time < start_time
        {
            return Err(AppError::InvalidGrantState(format!(
                "grant '{}' ends at {end_time} before it starts at {start_time}",
                name.as_str()
            )));
        }

        Ok(Self {
            name,
            requester,
            state: input.state,
            role_bindings: input.role_bindings,
            scope: input.scope,
            start_time: input.start_time,
            end_time: input.end_time,
            justification: input.justification,
            requested_duration_seconds: input.requested_duration_seconds,
            activities: None,
        })
    }

    /// Returns the grant resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the last path segment of the grant name.
    #[must_use]
    pub fn local_id(&self) -> &str {
        self.name
            .as_str()
            .rsplit('/')
            .next()
            .unwrap_or(self.name.as_str())
    }

    /// Returns the grantee principal.
    #[must_use]
    pub fn requester(&self) -> &str {
        self.requester.as_str()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> &GrantState {
        &self.state
    }

    /// Returns every granted role in lookup order.
    #[must_use]
    pub fn role_bindings(&self) -> &[String] {
        &self.role_bindings
    }

    /// Returns the first granted role.
    ///
    /// Only the first binding is considered downstream; grants with several
    /// bindings are a known limitation.
    #[must_use]
    pub fn primary_role(&self) -> Option<&str> {
        self.role_bindings.first().map(String::as_str)
    }

    /// Returns the scope the roles are bound on.
    #[must_use]
    pub fn scope(&self) -> &ResourceScope {
        &self.scope
    }

    /// Returns the activation time.
    #[must_use]
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Returns the removal time.
    #[must_use]
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Returns the requester justification.
    #[must_use]
    pub fn justification(&self) -> &str {
        self.justification.as_str()
    }

    /// Returns the requested duration in seconds.
    #[must_use]
    pub fn requested_duration_seconds(&self) -> Option<i64> {
        self.requested_duration_seconds
    }

    /// Returns collected activity, empty until collection ran.
    #[must_use]
    pub fn activities(&self) -> &[ActivityRecord] {
        self.activities.as_deref().unwrap_or_default()
    }

    /// Returns whether activity has been attached to this grant.
    #[must_use]
    pub fn has_collected_activities(&self) -> bool {
        self.activities.is_some()
    }

    /// Attaches collected activity. Fails if activity was already attached.
    pub fn with_activities(mut self, activities: Vec<ActivityRecord>) -> AppResult<Self> {
        if self.activities.is_some() {
            return Err(AppError::InvalidGrantState(format!(
                "activity for grant '{}' was already collected",
                self.name.as_str()
            )));
        }

        self.activities = Some(activities);
        Ok(self)
    }
}
