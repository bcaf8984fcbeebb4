//! The host plugin boundary.
//!
//! Hosts integrate the engine by holding it as an `Arc<dyn HostPlugin>`
//! and invoking it at their own extension points. The engine declares
//! interest only in the result-materializer and statement-executor
//! targets; call sites for any other target pass through unwrapped.

use crate::error::InterceptResult;
use crate::statement::{QueryResult, Statement};

/// The host call targets a plugin can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookTarget {
    /// The component that maps rows into result objects.
    ResultMaterializer,
    /// The component that executes write statements.
    StatementExecutor,
    /// The component that binds SQL parameters.
    ParameterBinder,
    /// The connection-management layer.
    ConnectionPool,
}

/// A plugin invocable at the host's interception points.
///
/// Implementations are thread-neutral: the host calls them on its own
/// request-handling threads, concurrently, with no external locking.
pub trait HostPlugin: Send + Sync {
    /// Returns whether this plugin wants to wrap the given target.
    fn attaches_to(&self, target: HookTarget) -> bool;

    /// Called after the host has fully materialized a query result.
    ///
    /// The result is mutated in place; its shape is never changed.
    fn after_query(&self, result: &QueryResult) -> InterceptResult<()>;

    /// Called before the host executes a statement.
    ///
    /// Parameter objects are mutated in place; the parameter structure
    /// itself is never replaced. Read-only statement kinds must be
    /// forwarded untouched.
    fn before_statement(&self, statement: &Statement) -> InterceptResult<()>;
}
