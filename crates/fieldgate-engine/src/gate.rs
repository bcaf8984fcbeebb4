//! Gate predicates and the build-time gate registry.
//!
//! A gate is an optional boolean precondition bound to a handler key
//! and one path (read or write). When a field's handler has a gate for
//! the active path, the gate runs before the handler's own allow step;
//! a `false` result skips the field entirely, without invoking the
//! handler at all.
//!
//! Gates receive `(owner, field name, current value)` — the erased
//! owner object, since one gate may be consulted for fields on several
//! entity types. The predicate shape and boolean return are enforced by
//! the type system at registration.
//!
//! [`GateRegistry`] exists only while the registry is being built: the
//! builder copies the resolved predicates into field descriptors and
//! drops the table.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use fieldgate_core::HandlerResult;

/// A gate predicate over `(owner, field name, current value)`.
///
/// An `Err` from a gate is a runtime failure and propagates out of the
/// intercepted call, like a handler error.
pub type GatePredicate = Arc<dyn Fn(&dyn Any, &str, &Value) -> HandlerResult<bool> + Send + Sync>;

/// Wraps a plain closure into a [`GatePredicate`].
pub fn gate<F>(f: F) -> GatePredicate
where
    F: Fn(&dyn Any, &str, &Value) -> HandlerResult<bool> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Build-time table mapping handler keys to their gate predicates.
///
/// At most one predicate per handler key per path; registering a second
/// one is a fatal configuration error rather than silent last-wins.
#[derive(Default)]
pub(crate) struct GateRegistry {
    read: HashMap<String, GatePredicate>,
    write: HashMap<String, GatePredicate>,
}

impl GateRegistry {
    pub(crate) fn register_read(
        &mut self,
        handler: impl Into<String>,
        predicate: GatePredicate,
    ) -> ConfigResult<()> {
        let handler = handler.into();
        if self.read.insert(handler.clone(), predicate).is_some() {
            return Err(ConfigError::DuplicateGate {
                handler,
                path: "read",
            });
        }
        Ok(())
    }

    pub(crate) fn register_write(
        &mut self,
        handler: impl Into<String>,
        predicate: GatePredicate,
    ) -> ConfigResult<()> {
        let handler = handler.into();
        if self.write.insert(handler.clone(), predicate).is_some() {
            return Err(ConfigError::DuplicateGate {
                handler,
                path: "write",
            });
        }
        Ok(())
    }

    pub(crate) fn read_gate(&self, handler: &str) -> Option<GatePredicate> {
        self.read.get(handler).cloned()
    }

    pub(crate) fn write_gate(&self, handler: &str) -> Option<GatePredicate> {
        self.write.get(handler).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_is_fatal() {
        let mut registry = GateRegistry::default();
        registry
            .register_read("MaskHandler", gate(|_, _, _| Ok(true)))
            .unwrap();

        let err = registry
            .register_read("MaskHandler", gate(|_, _, _| Ok(false)))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateGate { path: "read", .. }
        ));

        // A write gate for the same handler is a different slot.
        registry
            .register_write("MaskHandler", gate(|_, _, _| Ok(true)))
            .unwrap();
    }

    #[test]
    fn lookup_by_handler_key() {
        let mut registry = GateRegistry::default();
        registry
            .register_read("MaskHandler", gate(|_, _, _| Ok(false)))
            .unwrap();

        assert!(registry.read_gate("MaskHandler").is_some());
        assert!(registry.read_gate("OtherHandler").is_none());
        assert!(registry.write_gate("MaskHandler").is_none());
    }
}
