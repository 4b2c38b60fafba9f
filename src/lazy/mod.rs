//! Lazy graph values: deferred single-node references and deferred lookups.
//!
//! Neither type touches the network until `resolve` is called with a
//! [`Session`](crate::Session). Both feed the session's identity cache.

pub mod proxy;
pub mod query;

pub use proxy::Proxy;
pub use query::{Condition, DeferredQuery, Filter, QueryResult};
