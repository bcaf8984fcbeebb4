//! # Fieldgate
//!
//! Metadata-driven field interception for data-access layers.
//!
//! ## Overview
//!
//! Fieldgate lets an application declare, per entity field, a handler
//! that may veto or rewrite the field's value as objects cross the
//! data-access boundary. Results flowing out of queries take the read
//! path; parameters flowing into insert/update statements take the
//! write path. Everything is resolved once, at startup, into an
//! immutable registry; per-operation dispatch is lookups and calls.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌───────────────────────────┐
//! │     Host     │────▶│ FieldInterceptor │────▶│ gate ─▶ allow ─▶ modify   │──▶ write-back
//! │ (DAL hooks)  │     │  (registry)      │     │   (per bound field)       │
//! └──────────────┘     └──────────────────┘     └───────────────────────────┘
//! ```
//!
//! - **Core**: handler contract, object handles, statement model
//! - **Engine**: accessors, gates, builder, configuration, dispatch
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fieldgate::prelude::*;
//!
//! struct Account { balance_note: String }
//!
//! #[derive(Default)]
//! struct MaskHandler;
//!
//! impl FieldHandler for MaskHandler {
//!     fn modify_result(&self, _f: &str, _v: Value, _o: &dyn Any, params: &[String])
//!         -> HandlerResult<Value>
//!     {
//!         Ok(Value::String(params.first().cloned().unwrap_or_default()))
//!     }
//!     fn modify_param(&self, _f: &str, v: Value, _o: &dyn Any, _p: &[String])
//!         -> HandlerResult<Value>
//!     {
//!         Ok(v)
//!     }
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let engine = EngineBuilder::new()
//!         .entity(
//!             EntityDef::<Account>::new().field(
//!                 FieldDef::bind::<MaskHandler>("balance_note")
//!                     .params(["***"])
//!                     .access(
//!                         |a: &Account| a.balance_note.clone(),
//!                         |a: &mut Account, v: String| a.balance_note = v,
//!                     ),
//!             ),
//!         )
//!         .build()?;
//!
//!     let row = ObjectHandle::new(Account { balance_note: "1000".into() });
//!     engine.after_query(&QueryResult::Row(row.clone()))?;
//!     Ok(())
//! }
//! ```

pub use fieldgate_core as core;
pub use fieldgate_engine as engine;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use fieldgate::prelude::*;
/// ```
pub mod prelude {
    // Handler contract
    pub use fieldgate_core::{
        BoxedFieldHandler, FieldHandler, HandlerError, HandlerResult, Value, handler_key,
    };

    // Object identity and host-side model
    pub use fieldgate_core::{
        HookTarget, HostPlugin, InterceptError, InterceptResult, ObjectHandle, ObjectId,
        QueryResult, Statement, StatementKind, StatementParam,
    };

    // Engine - registration and dispatch
    pub use fieldgate_engine::{
        ConfigError, ConfigLoader, ConfigResult, EngineBuilder, EntityDef, FieldDef,
        FieldInterceptor, FieldgateConfig, gate,
    };

    // Commonly needed in handler signatures
    pub use std::any::Any;
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use crate::prelude::*;
    use fieldgate_engine::{EngineBuilder, EntityDef, FieldDef};

    struct Account {
        balance_note: String,
        owner_name: String,
    }

    /// Records every protocol step with its arguments.
    struct RecordingHandler {
        log: Arc<Mutex<Vec<String>>>,
        allow: bool,
    }

    impl FieldHandler for RecordingHandler {
        fn allow_modify_result(
            &self,
            field: &str,
            value: &Value,
            _owner: &dyn Any,
            params: &[String],
        ) -> HandlerResult<bool> {
            self.log
                .lock()
                .unwrap()
                .push(format!("allow_result {field} {value} {params:?}"));
            Ok(self.allow)
        }

        fn modify_result(
            &self,
            field: &str,
            value: Value,
            _owner: &dyn Any,
            params: &[String],
        ) -> HandlerResult<Value> {
            self.log
                .lock()
                .unwrap()
                .push(format!("modify_result {field} {value} {params:?}"));
            Ok(Value::String(params.first().cloned().unwrap_or_default()))
        }

        fn allow_modify_param(
            &self,
            field: &str,
            value: &Value,
            _owner: &dyn Any,
            params: &[String],
        ) -> HandlerResult<bool> {
            self.log
                .lock()
                .unwrap()
                .push(format!("allow_param {field} {value} {params:?}"));
            Ok(self.allow)
        }

        fn modify_param(
            &self,
            field: &str,
            value: Value,
            _owner: &dyn Any,
            params: &[String],
        ) -> HandlerResult<Value> {
            self.log
                .lock()
                .unwrap()
                .push(format!("modify_param {field} {value} {params:?}"));
            Ok(Value::String(params.first().cloned().unwrap_or_default()))
        }
    }

    fn recording_engine(
        allow: bool,
        gated: bool,
    ) -> (FieldInterceptor, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = EngineBuilder::new()
            .handler_instance(RecordingHandler {
                log: Arc::clone(&log),
                allow,
            })
            .entity(
                EntityDef::<Account>::new().field(
                    FieldDef::injected::<RecordingHandler>("balance_note")
                        .params(["***"])
                        .access(
                            |a: &Account| a.balance_note.clone(),
                            |a: &mut Account, v: String| a.balance_note = v,
                        ),
                ),
            );
        if gated {
            builder = builder
                .read_gate::<RecordingHandler, _>(|_, _, value| {
                    Ok(value.as_str().is_some_and(|s| !s.is_empty()))
                })
                .write_gate::<RecordingHandler, _>(|_, _, value| {
                    Ok(value.as_str().is_some_and(|s| !s.is_empty()))
                });
        }
        (builder.build().unwrap(), log)
    }

    fn account(note: &str) -> ObjectHandle {
        ObjectHandle::new(Account {
            balance_note: note.to_string(),
            owner_name: "alice".to_string(),
        })
    }

    fn note_of(handle: &ObjectHandle) -> String {
        handle.with(|a: &Account| a.balance_note.clone()).unwrap()
    }

    #[test]
    fn closed_gate_skips_both_handler_steps() {
        let (engine, log) = recording_engine(true, true);
        let handle = account("");

        let meta = engine
            .registry()
            .get(std::any::TypeId::of::<Account>())
            .unwrap();
        let descriptor = meta.field("balance_note").unwrap();
        assert!(descriptor.has_read_gate());
        assert!(descriptor.has_write_gate());

        engine.after_query(&QueryResult::Row(handle.clone())).unwrap();

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(note_of(&handle), "");
    }

    #[test]
    fn vetoed_allow_leaves_value_unchanged() {
        let (engine, log) = recording_engine(false, true);
        let handle = account("1000");

        engine.after_query(&QueryResult::Row(handle.clone())).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["allow_result balance_note \"1000\" [\"***\"]".to_string()]
        );
        assert_eq!(note_of(&handle), "1000");
    }

    #[test]
    fn open_gate_and_allow_rewrite_the_field() {
        let (engine, log) = recording_engine(true, true);
        let handle = account("1000");

        engine.after_query(&QueryResult::Row(handle.clone())).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "allow_result balance_note \"1000\" [\"***\"]".to_string(),
                "modify_result balance_note \"1000\" [\"***\"]".to_string(),
            ]
        );
        assert_eq!(note_of(&handle), "***");
        assert_eq!(
            handle.with(|a: &Account| a.owner_name.clone()).unwrap(),
            "alice"
        );
    }

    #[test]
    fn ungated_binding_runs_the_allow_step_directly() {
        let (engine, log) = recording_engine(true, false);
        let handle = account("");

        engine.after_query(&QueryResult::Row(handle.clone())).unwrap();

        // No gate bound, so even the empty value reaches the handler.
        assert_eq!(log.lock().unwrap().len(), 2);
        assert_eq!(note_of(&handle), "***");
    }

    #[test]
    fn update_statement_transforms_named_list_and_scalar() {
        let (engine, _log) = recording_engine(true, true);
        let scalar = account("100");
        let listed = vec![account("200"), account("300")];

        let mut entries = BTreeMap::new();
        entries.insert("item".to_string(), StatementParam::Object(scalar.clone()));
        entries.insert(
            "items".to_string(),
            StatementParam::List(listed.clone()),
        );
        let statement = Statement::new(
            "account.update",
            StatementKind::Update,
            StatementParam::Named(entries),
        );

        engine.before_statement(&statement).unwrap();

        assert_eq!(note_of(&scalar), "***");
        for handle in &listed {
            assert_eq!(note_of(handle), "***");
        }
    }

    #[test]
    fn delete_statement_is_forwarded_untouched() {
        let (engine, log) = recording_engine(true, false);
        let handle = account("1000");

        let statement = Statement::new(
            "account.delete",
            StatementKind::Delete,
            StatementParam::Object(handle.clone()),
        );
        engine.before_statement(&statement).unwrap();

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(note_of(&handle), "1000");
    }

    /// Fails every modify step with a handler error.
    #[derive(Default)]
    struct FailingHandler;

    impl FieldHandler for FailingHandler {
        fn modify_result(
            &self,
            field: &str,
            _value: Value,
            _owner: &dyn Any,
            _params: &[String],
        ) -> HandlerResult<Value> {
            Err(HandlerError::failed(field, "key service unreachable"))
        }

        fn modify_param(
            &self,
            field: &str,
            _value: Value,
            _owner: &dyn Any,
            _params: &[String],
        ) -> HandlerResult<Value> {
            Err(HandlerError::failed(field, "key service unreachable"))
        }
    }

    fn failing_engine(gated: bool) -> FieldInterceptor {
        let mut builder = EngineBuilder::new().entity(
            EntityDef::<Account>::new().field(
                FieldDef::bind::<FailingHandler>("balance_note").access(
                    |a: &Account| a.balance_note.clone(),
                    |a: &mut Account, v: String| a.balance_note = v,
                ),
            ),
        );
        if gated {
            builder = builder.read_gate::<FailingHandler, _>(|_, field, _| {
                Err(HandlerError::failed(field, "gate lookup failed"))
            });
        }
        builder.build().unwrap()
    }

    #[test]
    fn handler_error_propagates_with_context() {
        let engine = failing_engine(false);
        let handle = account("1000");

        let err = engine
            .after_query(&QueryResult::Row(handle.clone()))
            .unwrap_err();
        match err {
            InterceptError::Handler { entity, field, .. } => {
                assert!(entity.ends_with("Account"));
                assert_eq!(field, "balance_note");
            }
            other => panic!("expected handler error, got {other}"),
        }
        // The failing field is never written back.
        assert_eq!(note_of(&handle), "1000");

        let statement = Statement::new(
            "account.update",
            StatementKind::Update,
            StatementParam::Object(handle.clone()),
        );
        let err = engine.before_statement(&statement).unwrap_err();
        assert!(matches!(err, InterceptError::Handler { .. }));
        assert_eq!(note_of(&handle), "1000");
    }

    #[test]
    fn gate_error_surfaces_as_gate_failure() {
        let engine = failing_engine(true);
        let handle = account("1000");

        let err = engine
            .after_query(&QueryResult::Row(handle.clone()))
            .unwrap_err();
        match err {
            InterceptError::Gate { entity, field, .. } => {
                assert!(entity.ends_with("Account"));
                assert_eq!(field, "balance_note");
            }
            other => panic!("expected gate error, got {other}"),
        }
        assert_eq!(note_of(&handle), "1000");
    }

    #[test]
    fn shared_instance_across_rows_is_applied_per_object() {
        let (engine, log) = recording_engine(true, false);
        let first = account("1");
        let second = account("2");

        engine
            .after_query(&QueryResult::Rows(vec![first.clone(), second.clone()]))
            .unwrap();

        // Two distinct objects, one shared handler instance, four steps.
        assert_eq!(log.lock().unwrap().len(), 4);
        assert_eq!(note_of(&first), "***");
        assert_eq!(note_of(&second), "***");
    }
}
