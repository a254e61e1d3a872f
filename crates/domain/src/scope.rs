use std::fmt::{Display, Formatter};
use std::str::FromStr;

use grantwatch_core::AppError;
use serde::{Deserialize, Serialize};

const RESOURCE_MANAGER_PREFIX: &str = "//cloudresourcemanager.googleapis.com/";

/// Resource hierarchy level a grant applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// Organization node.
    Organization,
    /// Folder node.
    Folder,
    /// Project leaf.
    Project,
}

impl ScopeKind {
    /// Returns the collection segment used in relative resource names.
    #[must_use]
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Organization => "organizations",
            Self::Folder => "folders",
            Self::Project => "projects",
        }
    }

    fn from_collection(value: &str) -> Option<Self> {
        match value {
            "organizations" => Some(Self::Organization),
            "folders" => Some(Self::Folder),
            "projects" => Some(Self::Project),
            _ => None,
        }
    }
}

/// Node in the resource hierarchy bounding a grant and its audit capture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceScope {
    kind: ScopeKind,
    id: String,
}

impl ResourceScope {
    /// Parses a relative (`projects/p1`) or full
    /// (`//cloudresourcemanager.googleapis.com/projects/p1`) resource name.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        let relative = value
            .trim()
            .strip_prefix(RESOURCE_MANAGER_PREFIX)
            .unwrap_or(value.trim());

        let (collection, id) = relative.split_once('/').ok_or_else(|| {
            AppError::InvalidGrantState(format!("resource scope '{value}' has no identifier"))
        })?;

        let kind = ScopeKind::from_collection(collection).ok_or_else(|| {
            AppError::InvalidGrantState(format!(
                "resource scope '{value}' is not an organization, folder, or project"
            ))
        })?;

        if id.is_empty() || id.contains('/') {
            return Err(AppError::InvalidGrantState(format!(
                "resource scope '{value}' has an invalid identifier"
            )));
        }

        Ok(Self {
            kind,
            id: id.to_owned(),
        })
    }

    /// Returns the hierarchy level.
    #[must_use]
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Returns the bare identifier (`p1` for `projects/p1`).
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns whether routing rules at this scope must cascade to
    /// descendant resources. Projects are leaves and never cascade.
    #[must_use]
    pub fn includes_children(&self) -> bool {
        self.kind != ScopeKind::Project
    }
}

impl Display for ResourceScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}/{}", self.kind.collection(), self.id)
    }
}

impl FromStr for ResourceScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}
