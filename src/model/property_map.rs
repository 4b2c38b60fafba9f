//! PropertyMap: the property store on entities and embedded values.

use std::collections::BTreeMap;
use super::Value;

/// Property name (the descriptor's `name`, not its wire path) to value.
///
/// Ordered so that serialization and debug output are deterministic.
pub type PropertyMap = BTreeMap<String, Value>;
