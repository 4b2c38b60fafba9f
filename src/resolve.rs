//! Resolution walker: replaces proxies and deferred queries in an entity's
//! properties with live entities, recursively, up to a depth limit.
//!
//! Depth 0 resolves nothing. Depth 1 resolves the entity's own links,
//! depth 2 also the links of those, and so on. Cycles terminate because
//! every node goes through the identity cache: a node reached twice is the
//! same instance, and the walker skips instances it already walked with
//! at least as much remaining depth.

use std::collections::HashMap;

use crate::model::{EntityRef, Value};
use crate::session::Session;
use crate::transport::Transport;
use crate::Result;

pub(crate) fn resolve<T: Transport>(
    session: &mut Session<T>,
    entity: &EntityRef,
    depth: u32,
) -> Result<()> {
    Walker::default().walk(session, entity, depth)
}

#[derive(Default)]
struct Walker {
    /// Entity address to the largest depth it has been walked with.
    walked: HashMap<usize, u32>,
}

impl Walker {
    fn walk<T: Transport>(
        &mut self,
        session: &mut Session<T>,
        entity: &EntityRef,
        depth: u32,
    ) -> Result<()> {
        if depth == 0 {
            return Ok(());
        }
        if self.walked.get(&entity.addr()).is_some_and(|&done| done >= depth) {
            return Ok(());
        }
        self.walked.insert(entity.addr(), depth);
        tracing::debug!(type_name = entity.schema().name, depth, "resolving links");

        // Snapshot first: resolution may reach this same entity again.
        let snapshot: Vec<(String, Value)> = {
            let guard = entity.read();
            guard.properties().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };

        for (name, value) in snapshot {
            let resolved = self.resolve_value(session, value, depth)?;
            entity.write().properties_mut().insert(name, resolved);
        }
        Ok(())
    }

    fn resolve_value<T: Transport>(
        &mut self,
        session: &mut Session<T>,
        value: Value,
        depth: u32,
    ) -> Result<Value> {
        Ok(match value {
            Value::Proxy(proxy) => {
                let target = proxy.resolve(session)?;
                self.walk(session, &target, depth - 1)?;
                Value::Entity(target)
            }
            Value::Query(query) => {
                let found = query.resolve(session)?;
                for target in found.as_slice() {
                    self.walk(session, target, depth - 1)?;
                }
                found.into_value()
            }
            Value::Entity(target) => {
                self.walk(session, &target, depth - 1)?;
                Value::Entity(target)
            }
            Value::List(items) => Value::List(
                items
                    .into_iter()
                    .map(|item| self.resolve_value(session, item, depth))
                    .collect::<Result<Vec<_>>>()?,
            ),
            // Inline values share their owner's depth.
            Value::Embedded(mut embedded) => {
                let names: Vec<String> = embedded.properties().keys().cloned().collect();
                for name in names {
                    if let Some(inner) = embedded.properties_mut().remove(&name) {
                        let resolved = self.resolve_value(session, inner, depth)?;
                        embedded.properties_mut().insert(name, resolved);
                    }
                }
                Value::Embedded(embedded)
            }
            scalar => scalar,
        })
    }
}
