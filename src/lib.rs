//! # openminds-kg: typed object graph over the EBRAINS Knowledge Graph
//!
//! Maps JSON-LD nodes served by a knowledge-graph REST service onto local
//! openMINDS objects, and back.
//!
//! ## Design Principles
//!
//! 1. **Lazy by default**: linked nodes arrive as [`Proxy`] / [`DeferredQuery`]
//!    values and are only fetched when a caller asks for it.
//! 2. **One instance per identifier**: every materialized node goes through the
//!    session's [`IdentityCache`].
//! 3. **Explicit state**: the [`Registry`], the cache and the validation policy
//!    live in a [`Session`] value. Nothing is registered globally.
//! 4. **Trait seam for I/O**: [`Transport`] is the only contract with the
//!    remote service. [`MemoryTransport`] is the reference implementation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use openminds_kg::{MemoryTransport, Session, schemas};
//! use openminds_kg::schemas::Person;
//!
//! # fn example() -> openminds_kg::Result<()> {
//! let mut session = Session::new(MemoryTransport::new(), schemas::registry());
//!
//! let ada = Person::new("Ada");
//! ada.set_family_name("Lovelace");
//! session.save(ada.entity(), true)?;
//!
//! let id = ada.id().expect("saved");
//! let again = session.get(Person::SCHEMA, &id)?;
//! assert!(again.ptr_eq(ada.entity()));
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod registry;
pub mod cache;
pub mod lazy;
mod resolve;
pub mod session;
pub mod transport;
pub mod config;
pub mod schemas;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Descriptor, Document, EmbeddedValue, Entity, EntityRef, Multiplicity, NodeId,
    PropertyMap, PropertyType, ReleaseStatus, ReverseDescriptor, ScalarKind, Schema,
    SchemaKind, ValidationIssue, Value,
};

// ============================================================================
// Re-exports: Graph layer
// ============================================================================

pub use cache::IdentityCache;
pub use config::{ExistenceCheck, LoggedIssue, SessionConfig, ValidationMode, ValidationPolicy};
pub use lazy::{Condition, DeferredQuery, Filter, Proxy, QueryResult};
pub use registry::Registry;
pub use session::Session;
pub use transport::{CallStats, FixedRetry, MemoryTransport, NoRetry, RetryPolicy, Retrying, Transport};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {type_name}: {}", join_issues(.issues))]
    Validation {
        type_name: String,
        issues: Vec<ValidationIssue>,
    },

    #[error("existence query for {type_name} matched {matches} nodes")]
    AmbiguousIdentity { type_name: String, matches: usize },

    #[error("{type_name} already exists as {id}")]
    ResourceExists { type_name: String, id: NodeId },

    #[error("existing node {id} differs on: {}", .mismatched.join(", "))]
    IdentityConflict { id: NodeId, mismatched: Vec<String> },

    #[error("Resolution failed: {0}")]
    ResolutionFailure(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("{type_name} has no property '{property}'")]
    UnknownProperty { type_name: String, property: String },

    #[error("{type_name}.{property} links to a node that has not been saved")]
    UnsavedReference { type_name: String, property: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a transport-level failure.
    pub fn transport(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Transport(err.into())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
