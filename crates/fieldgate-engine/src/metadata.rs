//! The immutable metadata registry driving all runtime decisions.
//!
//! Built exactly once by the [`EngineBuilder`](crate::EngineBuilder)
//! during startup, then read-only and safe for concurrent lookup: no
//! entries are added, removed or mutated afterwards, which is why the
//! interceptor needs no locking of its own.
//!
//! An entity type absent from the registry means "not opted in";
//! intercepted objects of that type pass through unmodified.

use std::any::TypeId;
use std::collections::HashMap;

use crate::accessor::{ReadAccessor, WriteAccessor};
use crate::gate::GatePredicate;
use fieldgate_core::BoxedFieldHandler;

/// The per-field binding of accessors, handler, gates and parameters.
///
/// Immutable after construction. The handler reference is shared with
/// every other field bound to the same handler key.
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) read: ReadAccessor,
    pub(crate) write: WriteAccessor,
    pub(crate) read_gate: Option<GatePredicate>,
    pub(crate) write_gate: Option<GatePredicate>,
    pub(crate) handler: BoxedFieldHandler,
    pub(crate) params: Vec<String>,
}

impl FieldDescriptor {
    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the opaque handler parameters fixed at build time.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Returns whether a read gate is bound.
    pub fn has_read_gate(&self) -> bool {
        self.read_gate.is_some()
    }

    /// Returns whether a write gate is bound.
    pub fn has_write_gate(&self) -> bool {
        self.write_gate.is_some()
    }
}

impl std::fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("read_gate", &self.has_read_gate())
            .field("write_gate", &self.has_write_gate())
            .finish()
    }
}

/// Field descriptors for one entity type, keyed by field name.
pub struct EntityMetadata {
    pub(crate) type_name: &'static str,
    pub(crate) fields: HashMap<String, FieldDescriptor>,
}

impl EntityMetadata {
    /// Returns the entity's concrete type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the number of bound fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns the descriptor for a field, if bound.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Iterates over bound fields.
    ///
    /// Order is unspecified but stable within one process run.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }
}

impl std::fmt::Debug for EntityMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMetadata")
            .field("type_name", &self.type_name)
            .field("field_count", &self.fields.len())
            .finish()
    }
}

/// The build-once index from entity type to its field metadata.
pub struct MetadataRegistry {
    pub(crate) entities: HashMap<TypeId, EntityMetadata>,
}

impl MetadataRegistry {
    /// Looks up the metadata for a concrete runtime type.
    ///
    /// `None` means the type never opted in.
    pub fn get(&self, type_id: TypeId) -> Option<&EntityMetadata> {
        self.entities.get(&type_id)
    }

    /// Returns the number of registered entity types.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns the total number of bound fields across all entities.
    pub fn field_count(&self) -> usize {
        self.entities.values().map(|e| e.fields.len()).sum()
    }
}

impl std::fmt::Debug for MetadataRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataRegistry")
            .field("entity_count", &self.entities.len())
            .field("field_count", &self.field_count())
            .finish()
    }
}
