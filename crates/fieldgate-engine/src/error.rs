//! Engine configuration error types.
//!
//! Every error here is detected while building the metadata registry
//! and is fatal: the builder returns the error and no interceptor is
//! produced. Partial or silently-degraded interception of persistence
//! data is worse than a hard startup failure.

use thiserror::Error;

/// Errors that can occur while building the metadata registry.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A bound field is missing its read or write accessor.
    #[error("field '{entity}.{field}' has no {which} accessor")]
    MissingAccessor {
        /// The entity declaring the field.
        entity: String,
        /// The offending field.
        field: String,
        /// Which accessor is missing ("read" or "write").
        which: &'static str,
    },

    /// The same field was bound more than once for one entity.
    #[error("field '{entity}.{field}' is bound more than once")]
    DuplicateField {
        /// The entity declaring the field.
        entity: String,
        /// The duplicated field name.
        field: String,
    },

    /// The same entity type was registered more than once.
    #[error("entity '{entity}' is registered more than once")]
    DuplicateEntity {
        /// The duplicated entity type.
        entity: String,
    },

    /// Two gate predicates were registered for one handler and path.
    #[error("duplicate {path} gate for handler '{handler}'")]
    DuplicateGate {
        /// The handler key the gates were declared for.
        handler: String,
        /// The gated path ("read" or "write").
        path: &'static str,
    },

    /// A field binding requires a handler instance no one supplied.
    #[error("no instance available for handler '{handler}'")]
    HandlerUnavailable {
        /// The handler key with no usable instance or factory.
        handler: String,
    },

    /// A configured binding names an entity type never registered.
    #[error("configuration references unknown entity '{entity}'")]
    UnknownEntity {
        /// The unmatched entity name.
        entity: String,
    },

    /// A configured binding names a field with no exposed accessors.
    #[error("configuration references unexposed field '{entity}.{field}'")]
    UnexposedField {
        /// The entity declaring the field.
        entity: String,
        /// The unexposed field name.
        field: String,
    },

    /// A configured binding names a handler never registered.
    #[error("configuration references unknown handler '{handler}'")]
    UnknownHandler {
        /// The unmatched handler name.
        handler: String,
    },

    /// Loading the configuration document failed.
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),
}

/// Result type for registry construction.
pub type ConfigResult<T> = Result<T, ConfigError>;
