//! The pluggable field-transform strategy contract.
//!
//! A [`FieldHandler`] is the only interface a transform plugin has to
//! implement. Each handler is bound to zero or more fields across zero
//! or more entity types, and applies a two-step protocol on both paths:
//!
//! 1. `allow_modify_result` / `allow_modify_param` — a pure boolean
//!    decision on whether the transform should run for this field.
//! 2. `modify_result` / `modify_param` — computes the replacement value,
//!    invoked only if step 1 (and any bound gate predicate) allowed it.
//!
//! Handlers are identified by *type* in configuration, not by instance:
//! the registry materializes at most one instance per handler key and
//! shares it across all field bindings. See [`handler_key`].
//!
//! # Thread Safety
//!
//! One handler instance is invoked concurrently from every thread the
//! host runtime uses. Handlers must be stateless or provide their own
//! synchronization; the engine does not serialize handler calls.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::error::HandlerResult;

/// A shared, type-erased handler instance.
pub type BoxedFieldHandler = Arc<dyn FieldHandler>;

/// Returns the registry key identifying handler type `H`.
///
/// Field bindings and gate predicates declared programmatically are
/// keyed by this value, so one handler type always resolves to one
/// shared instance.
pub fn handler_key<H: FieldHandler + 'static>() -> &'static str {
    std::any::type_name::<H>()
}

/// Strategy for transforming one field value on the read and write paths.
///
/// Field values are passed as dynamic [`Value`]s; the accessor layer
/// converts them from and to the concrete field type. `owner` is the
/// object the field belongs to, usable via downcasting when a handler
/// needs sibling state. `params` is the opaque parameter list declared
/// on the field binding, fixed at build time.
///
/// Any error returned from any of the four operations aborts the
/// transform of that field and propagates out of the intercepted call.
pub trait FieldHandler: Send + Sync {
    /// Decides whether [`modify_result`](Self::modify_result) may run.
    ///
    /// Invoked for every read-path candidate field on every object
    /// (after the read gate, if one is bound). Must not have required
    /// side effects. Defaults to `true`.
    fn allow_modify_result(
        &self,
        field: &str,
        value: &Value,
        owner: &dyn Any,
        params: &[String],
    ) -> HandlerResult<bool> {
        let _ = (field, value, owner, params);
        Ok(true)
    }

    /// Computes the replacement value for a field on the read path.
    ///
    /// The return value is written back through the field's write
    /// accessor. Side effects beyond computing the value are
    /// discouraged but not forbidden.
    fn modify_result(
        &self,
        field: &str,
        value: Value,
        owner: &dyn Any,
        params: &[String],
    ) -> HandlerResult<Value>;

    /// Decides whether [`modify_param`](Self::modify_param) may run.
    ///
    /// Symmetric to [`allow_modify_result`](Self::allow_modify_result),
    /// for the write path. Defaults to `true`.
    fn allow_modify_param(
        &self,
        field: &str,
        value: &Value,
        owner: &dyn Any,
        params: &[String],
    ) -> HandlerResult<bool> {
        let _ = (field, value, owner, params);
        Ok(true)
    }

    /// Computes the replacement value for a field on the write path.
    ///
    /// The result is written back into the parameter object before it
    /// reaches statement execution.
    fn modify_param(
        &self,
        field: &str,
        value: Value,
        owner: &dyn Any,
        params: &[String],
    ) -> HandlerResult<Value>;
}
