//! Unified error types for the fieldgate core.
//!
//! This module provides the error types shared by handlers, accessors,
//! and the interception engine. Build-time configuration errors are
//! defined in `fieldgate-engine`, since only the builder can raise them.

use thiserror::Error;

// =============================================================================
// Handler Errors
// =============================================================================

/// Errors raised by [`FieldHandler`](crate::FieldHandler) implementations
/// and by gate predicates.
///
/// A handler error aborts the transform of the field that raised it and
/// propagates out of the intercepted call. It is never retried or
/// suppressed by the engine.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// The handler could not process the field value.
    #[error("handler failed on field '{field}': {reason}")]
    Failed {
        /// The field whose transform failed.
        field: String,
        /// Reason for failure.
        reason: String,
    },

    /// The field value had a shape the handler cannot work with.
    #[error("unexpected value for field '{field}': {reason}")]
    UnexpectedValue {
        /// The field carrying the value.
        field: String,
        /// What the handler expected instead.
        reason: String,
    },

    /// Value serialization or deserialization failed inside the handler.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl HandlerError {
    /// Creates a failure error for the given field.
    pub fn failed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unexpected-value error for the given field.
    pub fn unexpected(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnexpectedValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Accessor Errors
// =============================================================================

/// Errors raised by erased field accessors.
///
/// Accessors are built from typed closures at registration time and
/// erased over `dyn Any`. Either side of that erasure can fail at
/// runtime: the handle may hold a foreign type, or the dynamic value
/// may not convert back into the concrete field type.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The accessor was applied to an object of the wrong concrete type.
    #[error("accessor built for {expected} applied to a different type")]
    TypeMismatch {
        /// The entity type the accessor was built for.
        expected: &'static str,
    },

    /// The dynamic value could not be converted to the field's type.
    #[error("value conversion failed: {0}")]
    Convert(#[from] serde_json::Error),
}

// =============================================================================
// Interception Errors
// =============================================================================

/// Errors surfaced by an intercepted read or write call.
///
/// Each variant carries the entity and field that were being processed
/// when the failure occurred. Fields written back before the failing
/// field remain written; there is no rollback of in-memory mutations.
#[derive(Debug, Error)]
pub enum InterceptError {
    /// A field accessor failed.
    #[error("field access failed on {entity}.{field}: {source}")]
    Access {
        /// The entity type being processed.
        entity: &'static str,
        /// The field being accessed.
        field: String,
        /// The underlying accessor error.
        #[source]
        source: AccessError,
    },

    /// A gate predicate failed (as opposed to returning `false`).
    #[error("gate predicate failed on {entity}.{field}: {source}")]
    Gate {
        /// The entity type being processed.
        entity: &'static str,
        /// The gated field.
        field: String,
        /// The error raised by the predicate.
        #[source]
        source: HandlerError,
    },

    /// A handler operation failed.
    #[error("handler failed on {entity}.{field}: {source}")]
    Handler {
        /// The entity type being processed.
        entity: &'static str,
        /// The field bound to the handler.
        field: String,
        /// The error raised by the handler.
        #[source]
        source: HandlerError,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for handler and gate operations.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Result type for accessor invocations.
pub type AccessResult<T> = Result<T, AccessError>;

/// Result type for intercepted calls.
pub type InterceptResult<T> = Result<T, InterceptError>;
