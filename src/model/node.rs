//! Node identity and release scope.

use serde::{Deserialize, Serialize};

/// Opaque, globally unique identifier of a persisted node (its `@id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the identifier, e.g. the UUID of
    /// `https://kg.ebrains.eu/api/instances/<uuid>`.
    pub fn uuid(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Release scope a node is read under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStatus {
    /// Latest revision, released or not.
    InProgress,
    /// Only the released revision.
    #[default]
    Released,
    /// Whatever is visible, released or not.
    Any,
}

impl ReleaseStatus {
    /// Whether a node with the given release state is visible under this scope.
    pub fn admits(self, released: bool) -> bool {
        match self {
            ReleaseStatus::Released => released,
            ReleaseStatus::InProgress | ReleaseStatus::Any => true,
        }
    }
}

impl std::fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseStatus::InProgress => write!(f, "in progress"),
            ReleaseStatus::Released => write!(f, "released"),
            ReleaseStatus::Any => write!(f, "any"),
        }
    }
}
