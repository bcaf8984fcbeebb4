//! # Fieldgate Engine
//!
//! Registry construction and runtime dispatch for field interception.
//!
//! This layer provides:
//! - Typed accessor erasure over [`serde_json::Value`](fieldgate_core::Value)
//! - Per-handler gate predicates for cheap short-circuiting
//! - A consuming builder that assembles the immutable metadata registry
//! - Configuration-document bindings loaded with figment
//! - The [`FieldInterceptor`] that hooks query results and statements
//!
//! The engine is built on top of core types but owns everything that
//! happens between registration and a transformed field value.

pub mod accessor;
pub mod builder;
pub mod config;
pub mod error;
pub mod gate;
pub mod interceptor;
pub mod metadata;

pub use accessor::{ReadAccessor, WriteAccessor, accessor_pair, read_accessor, write_accessor};
pub use builder::{EngineBuilder, EntityDef, FieldDef};
pub use config::{ConfigLoader, EntityConfig, FieldConfig, FieldgateConfig};
pub use error::{ConfigError, ConfigResult};
pub use gate::{GatePredicate, gate};
pub use interceptor::FieldInterceptor;
pub use metadata::{EntityMetadata, FieldDescriptor, MetadataRegistry};
