//! # Fieldgate Core
//!
//! Foundational types for the fieldgate field-interception engine.
//!
//! This crate defines everything a handler author or host integrator
//! needs without pulling in the registry builder:
//!
//! - **Handler contract**: the pluggable transform strategy
//!   ([`FieldHandler`]) and its two-step allow/modify protocol
//! - **Object handles**: type-erased, identity-aware references to
//!   application objects ([`ObjectHandle`], [`ObjectId`])
//! - **Host boundary**: the two intercepted call shapes
//!   ([`QueryResult`], [`Statement`]) and the plugin trait hosts invoke
//!   ([`HostPlugin`])
//! - **Errors**: handler, accessor and interception error types
//!
//! The registry builder, configuration layer and the engine itself live
//! in `fieldgate-engine`.
//!
//! ## Data Flow
//!
//! ```text
//! ┌──────────┐  after_query()      ┌────────────┐  gate → allow → modify
//! │   Host   │────────────────────▶│   Engine   │───────────────────────▶ handlers
//! │ runtime  │  before_statement() │ (registry  │
//! └──────────┘────────────────────▶│  lookup)   │
//!                                  └────────────┘
//! ```

pub mod error;
pub mod handler;
pub mod object;
pub mod plugin;
pub mod statement;

pub use error::{
    AccessError, AccessResult, HandlerError, HandlerResult, InterceptError, InterceptResult,
};
pub use handler::{BoxedFieldHandler, FieldHandler, handler_key};
pub use object::{ObjectHandle, ObjectId};
pub use plugin::{HookTarget, HostPlugin};
pub use statement::{QueryResult, Statement, StatementKind, StatementParam};

/// The dynamic field-value representation passed through handlers.
///
/// Accessors convert concrete field types to and from this value via
/// serde, which is what lets one handler serve fields of many types.
pub use serde_json::Value;
