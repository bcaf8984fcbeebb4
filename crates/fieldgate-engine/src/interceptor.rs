//! The interception engine.
//!
//! [`FieldInterceptor`] is the ready state of the engine: it holds the
//! immutable metadata registry and is invoked by the host at the two
//! interception points. Per call it:
//!
//! 1. Flattens the result or parameter structure into candidate
//!    objects, deduplicated by identity — the same instance appearing
//!    twice is transformed at most once per call.
//! 2. Looks each candidate's concrete type up in the registry; a miss
//!    means "not opted in" and is skipped silently.
//! 3. For each bound field, runs the gated two-step protocol:
//!    gate predicate (if bound) → handler allow step → handler modify
//!    step → write-back through the field's accessor.
//!
//! All work is synchronous; concurrency comes from the host invoking
//! the engine on its own threads. The registry is read-only, so no
//! locking happens beyond the per-object handle locks.

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{Level, debug, span, trace};

use crate::metadata::{EntityMetadata, FieldDescriptor, MetadataRegistry};
use fieldgate_core::{
    HookTarget, HostPlugin, InterceptError, InterceptResult, ObjectHandle, QueryResult, Statement,
};

/// Which gated protocol a call runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AccessPath {
    Result,
    Param,
}

/// The ready interception engine.
///
/// Constructed only by a successful
/// [`EngineBuilder::build`](crate::EngineBuilder::build); there is no
/// partially initialized interceptor. Cloning shares the registry.
#[derive(Clone)]
pub struct FieldInterceptor {
    registry: Arc<MetadataRegistry>,
}

impl FieldInterceptor {
    /// Starts a builder for a new engine.
    pub fn builder() -> crate::EngineBuilder {
        crate::EngineBuilder::new()
    }

    pub(crate) fn new(registry: Arc<MetadataRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the metadata registry backing this engine.
    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// Read-path interception: transforms an already-materialized
    /// query result in place.
    ///
    /// Runs after the host's own row-to-object mapping; the result
    /// shape is returned to the host untouched, only field values
    /// change.
    pub fn after_query(&self, result: &QueryResult) -> InterceptResult<()> {
        let span = span!(Level::DEBUG, "after_query", objects = result.len());
        let _enter = span.enter();

        let mut handles = Vec::new();
        result.collect_objects(&mut handles);
        for handle in dedup_by_identity(handles) {
            self.apply(&handle, AccessPath::Result)?;
        }
        Ok(())
    }

    /// Write-path interception: transforms a statement's parameter
    /// objects in place before execution.
    ///
    /// Read-only statement kinds bypass transformation entirely.
    pub fn before_statement(&self, statement: &Statement) -> InterceptResult<()> {
        if !statement.kind().is_write() {
            trace!(
                statement = statement.id(),
                kind = ?statement.kind(),
                "not a write statement, forwarding untouched"
            );
            return Ok(());
        }

        let span = span!(Level::DEBUG, "before_statement", statement = statement.id());
        let _enter = span.enter();

        let mut handles = Vec::new();
        statement.param().collect_objects(&mut handles);
        for handle in dedup_by_identity(handles) {
            self.apply(&handle, AccessPath::Param)?;
        }
        Ok(())
    }

    /// Applies every bound field transform of one object.
    fn apply(&self, handle: &ObjectHandle, path: AccessPath) -> InterceptResult<()> {
        let Some(meta) = self.registry.get(handle.type_id()) else {
            trace!(object = handle.type_name(), "type not opted in, skipping");
            return Ok(());
        };

        debug!(
            entity = meta.type_name(),
            fields = meta.field_count(),
            ?path,
            "transforming object"
        );

        let mut guard = handle.write();
        for descriptor in meta.fields() {
            transform_field(meta, descriptor, &mut *guard, path)?;
        }
        Ok(())
    }
}

/// Runs the gated two-step protocol for one field of one object.
fn transform_field(
    meta: &EntityMetadata,
    descriptor: &FieldDescriptor,
    owner: &mut (dyn Any + Send + Sync),
    path: AccessPath,
) -> InterceptResult<()> {
    let field = descriptor.name();
    let current = (descriptor.read)(&*owner).map_err(|source| InterceptError::Access {
        entity: meta.type_name(),
        field: field.to_string(),
        source,
    })?;

    // Step 0: the optional gate predicate for this path.
    let gate = match path {
        AccessPath::Result => descriptor.read_gate.as_ref(),
        AccessPath::Param => descriptor.write_gate.as_ref(),
    };
    if let Some(gate) = gate {
        let open = gate(&*owner, field, &current).map_err(|source| InterceptError::Gate {
            entity: meta.type_name(),
            field: field.to_string(),
            source,
        })?;
        if !open {
            trace!(
                entity = meta.type_name(),
                field,
                "gate closed, skipping field"
            );
            return Ok(());
        }
    }

    // Step 1: the handler's own allow decision.
    let allowed = match path {
        AccessPath::Result => {
            descriptor
                .handler
                .allow_modify_result(field, &current, &*owner, descriptor.params())
        }
        AccessPath::Param => {
            descriptor
                .handler
                .allow_modify_param(field, &current, &*owner, descriptor.params())
        }
    }
    .map_err(|source| InterceptError::Handler {
        entity: meta.type_name(),
        field: field.to_string(),
        source,
    })?;
    if !allowed {
        trace!(
            entity = meta.type_name(),
            field,
            "handler declined, skipping field"
        );
        return Ok(());
    }

    // Step 2: compute the replacement and write it back.
    let replacement = match path {
        AccessPath::Result => {
            descriptor
                .handler
                .modify_result(field, current, &*owner, descriptor.params())
        }
        AccessPath::Param => {
            descriptor
                .handler
                .modify_param(field, current, &*owner, descriptor.params())
        }
    }
    .map_err(|source| InterceptError::Handler {
        entity: meta.type_name(),
        field: field.to_string(),
        source,
    })?;

    (descriptor.write)(owner, replacement).map_err(|source| InterceptError::Access {
        entity: meta.type_name(),
        field: field.to_string(),
        source,
    })
}

/// Deduplicates candidate handles by object identity, preserving first
/// appearance order.
fn dedup_by_identity(handles: Vec<ObjectHandle>) -> Vec<ObjectHandle> {
    let mut seen = HashSet::with_capacity(handles.len());
    let mut unique = Vec::with_capacity(handles.len());
    for handle in handles {
        if seen.insert(handle.id()) {
            unique.push(handle);
        }
    }
    unique
}

impl HostPlugin for FieldInterceptor {
    fn attaches_to(&self, target: HookTarget) -> bool {
        matches!(
            target,
            HookTarget::ResultMaterializer | HookTarget::StatementExecutor
        )
    }

    fn after_query(&self, result: &QueryResult) -> InterceptResult<()> {
        Self::after_query(self, result)
    }

    fn before_statement(&self, statement: &Statement) -> InterceptResult<()> {
        Self::before_statement(self, statement)
    }
}

impl std::fmt::Debug for FieldInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldInterceptor")
            .field("entities", &self.registry.entity_count())
            .field("fields", &self.registry.field_count())
            .finish()
    }
}
