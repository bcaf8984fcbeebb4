//! Host boundary shapes for the two intercepted call sites.
//!
//! The engine is invoked at exactly two extension points of the host
//! data-access framework:
//!
//! - after result materialization, with the already-built
//!   [`QueryResult`];
//! - before statement execution, with the [`Statement`] about to run.
//!
//! These types are purely structural: the host owns row mapping and SQL
//! generation, the engine only walks the object shapes. Both shapes are
//! preserved by interception — a list stays a list, a named map stays a
//! named map — because the engine mutates fields through the contained
//! [`ObjectHandle`]s instead of rebuilding containers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::object::ObjectHandle;

// =============================================================================
// Query Results (read path)
// =============================================================================

/// A materialized query result: a single object or a list of objects.
#[derive(Debug, Clone)]
pub enum QueryResult {
    /// A single result object.
    Row(ObjectHandle),
    /// A list of result objects. The same handle may appear more than
    /// once; the engine deduplicates by identity before transforming.
    Rows(Vec<ObjectHandle>),
}

impl QueryResult {
    /// Returns the number of objects in the result, counting duplicates.
    pub fn len(&self) -> usize {
        match self {
            Self::Row(_) => 1,
            Self::Rows(rows) => rows.len(),
        }
    }

    /// Returns whether the result holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends every contained handle to `out`, in result order.
    pub fn collect_objects(&self, out: &mut Vec<ObjectHandle>) {
        match self {
            Self::Row(handle) => out.push(handle.clone()),
            Self::Rows(rows) => out.extend(rows.iter().cloned()),
        }
    }
}

// =============================================================================
// Statements (write path)
// =============================================================================

/// The kind of statement the host is about to execute.
///
/// Only [`Insert`](Self::Insert) and [`Update`](Self::Update) carry
/// parameters the engine transforms; the other kinds bypass the write
/// path entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    /// A read-only query.
    Select,
    /// An insert statement.
    Insert,
    /// An update statement.
    Update,
    /// A delete statement.
    Delete,
}

impl StatementKind {
    /// Returns whether statements of this kind are transformed on the
    /// write path.
    pub fn is_write(self) -> bool {
        matches!(self, Self::Insert | Self::Update)
    }
}

/// The bound parameter structure of a statement.
///
/// Hosts bind parameters in several shapes: a single object, a list of
/// objects, or a keyed mapping of named parameters where each value may
/// itself be an object or a list. The engine flattens all of these into
/// one candidate set but never replaces the structure itself.
#[derive(Debug, Clone, Default)]
pub enum StatementParam {
    /// No bound parameter.
    #[default]
    None,
    /// A single parameter object.
    Object(ObjectHandle),
    /// A list of parameter objects.
    List(Vec<ObjectHandle>),
    /// Named parameters. Values are objects or lists; nested maps are
    /// tolerated and flattened the same way.
    Named(BTreeMap<String, StatementParam>),
}

impl StatementParam {
    /// Appends every contained handle to `out`, walking nested shapes.
    pub fn collect_objects(&self, out: &mut Vec<ObjectHandle>) {
        match self {
            Self::None => {}
            Self::Object(handle) => out.push(handle.clone()),
            Self::List(handles) => out.extend(handles.iter().cloned()),
            Self::Named(entries) => {
                for value in entries.values() {
                    value.collect_objects(out);
                }
            }
        }
    }
}

/// A statement about to be executed by the host.
#[derive(Debug, Clone)]
pub struct Statement {
    /// Host-side statement identifier (e.g. the mapped statement id).
    id: String,
    /// The statement kind.
    kind: StatementKind,
    /// The bound parameter structure.
    param: StatementParam,
}

impl Statement {
    /// Creates a new statement descriptor.
    pub fn new(id: impl Into<String>, kind: StatementKind, param: StatementParam) -> Self {
        Self {
            id: id.into(),
            kind,
            param,
        }
    }

    /// Returns the host-side statement identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the statement kind.
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Returns the bound parameter structure.
    pub fn param(&self) -> &StatementParam {
        &self.param
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_kind_write_filter() {
        assert!(StatementKind::Insert.is_write());
        assert!(StatementKind::Update.is_write());
        assert!(!StatementKind::Select.is_write());
        assert!(!StatementKind::Delete.is_write());
    }

    #[test]
    fn named_param_collects_objects_and_lists() {
        let scalar = ObjectHandle::new(1u32);
        let a = ObjectHandle::new(2u32);
        let b = ObjectHandle::new(3u32);

        let mut entries = BTreeMap::new();
        entries.insert("item".to_string(), StatementParam::Object(scalar));
        entries.insert(
            "items".to_string(),
            StatementParam::List(vec![a, b]),
        );

        let mut out = Vec::new();
        StatementParam::Named(entries).collect_objects(&mut out);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn query_result_shapes() {
        let handle = ObjectHandle::new(5u32);
        assert_eq!(QueryResult::Row(handle.clone()).len(), 1);

        let rows = QueryResult::Rows(vec![handle.clone(), handle]);
        let mut out = Vec::new();
        rows.collect_objects(&mut out);
        // Duplicates are preserved here; identity dedup happens in the engine.
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id(), out[1].id());
    }
}
