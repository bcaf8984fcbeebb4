//! Field Masking Demo
//!
//! A small end-to-end demonstration of the fieldgate engine:
//!
//! - `MaskHandler` replaces sensitive field values on the read path and
//!   restores a placeholder on the write path
//! - a read gate skips masking for values that are already masked
//! - one field is bound programmatically, another through an inline
//!   configuration document
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --package masking-demo
//! ```

use std::any::Any;
use std::collections::BTreeMap;

use anyhow::Result;
use fieldgate::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Entities
// ============================================================================

/// An account row as materialized by the data-access layer.
#[derive(Debug)]
struct Account {
    id: u64,
    owner: String,
    balance_note: String,
    card_number: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Replaces a field value with its first parameter.
#[derive(Default)]
struct MaskHandler;

impl FieldHandler for MaskHandler {
    fn modify_result(
        &self,
        _field: &str,
        _value: Value,
        _owner: &dyn Any,
        params: &[String],
    ) -> HandlerResult<Value> {
        Ok(Value::String(params.first().cloned().unwrap_or_default()))
    }

    fn modify_param(
        &self,
        _field: &str,
        _value: Value,
        _owner: &dyn Any,
        params: &[String],
    ) -> HandlerResult<Value> {
        Ok(Value::String(params.first().cloned().unwrap_or_default()))
    }
}

/// Keeps only the last four digits of a card number.
struct LastFourHandler;

impl FieldHandler for LastFourHandler {
    fn modify_result(
        &self,
        field: &str,
        value: Value,
        _owner: &dyn Any,
        _params: &[String],
    ) -> HandlerResult<Value> {
        let number = value
            .as_str()
            .ok_or_else(|| HandlerError::unexpected(field, "card number is not a string"))?;
        let tail = number
            .get(number.len().saturating_sub(4)..)
            .unwrap_or(number);
        Ok(Value::String(format!("**** {tail}")))
    }

    fn modify_param(
        &self,
        _field: &str,
        value: Value,
        _owner: &dyn Any,
        _params: &[String],
    ) -> HandlerResult<Value> {
        Ok(value)
    }
}

// ============================================================================
// Engine Setup
// ============================================================================

const BINDINGS: &str = r#"
    [[entities]]
    type = "Account"

      [[entities.fields]]
      name = "card_number"
      handler = "last-four"
"#;

fn build_engine() -> Result<FieldInterceptor> {
    let config = ConfigLoader::new().string(BINDINGS).with_env().load()?;

    let engine = EngineBuilder::new()
        // Values already starting with the mask are left alone.
        .read_gate::<MaskHandler, _>(|_, _, value| {
            Ok(!value.as_str().is_some_and(|s| s.starts_with("***")))
        })
        .handler_factory("last-four", || std::sync::Arc::new(LastFourHandler))
        .entity(
            EntityDef::<Account>::new()
                .alias("Account")
                .field(
                    FieldDef::bind::<MaskHandler>("balance_note")
                        .params(["***"])
                        .access(
                            |a: &Account| a.balance_note.clone(),
                            |a: &mut Account, v: String| a.balance_note = v,
                        ),
                )
                .expose(
                    "card_number",
                    |a: &Account| a.card_number.clone(),
                    |a: &mut Account, v: String| a.card_number = v,
                ),
        )
        .with_config(config)
        .build()?;

    Ok(engine)
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let engine = build_engine()?;
    info!(
        entities = engine.registry().entity_count(),
        fields = engine.registry().field_count(),
        "engine ready"
    );

    // A query materializes two accounts; one appears twice in the rows.
    let alice = ObjectHandle::new(Account {
        id: 1,
        owner: "alice".to_string(),
        balance_note: "balance is 1000".to_string(),
        card_number: "4111111111111111".to_string(),
    });
    let bob = ObjectHandle::new(Account {
        id: 2,
        owner: "bob".to_string(),
        balance_note: "***".to_string(),
        card_number: "5500005555555559".to_string(),
    });

    let result = QueryResult::Rows(vec![alice.clone(), bob.clone(), alice.clone()]);
    engine.after_query(&result)?;

    for handle in [&alice, &bob] {
        if handle
            .with(|a: &Account| {
                info!(
                    id = a.id,
                    owner = %a.owner,
                    note = %a.balance_note,
                    card = %a.card_number,
                    "after query"
                );
            })
            .is_none()
        {
            anyhow::bail!("account handle lost its type");
        }
    }

    // An update flows the same objects back through the write path.
    let mut params = BTreeMap::new();
    params.insert("accounts".to_string(), StatementParam::List(vec![alice, bob]));
    let statement = Statement::new(
        "account.updateBatch",
        StatementKind::Update,
        StatementParam::Named(params),
    );
    engine.before_statement(&statement)?;
    info!(statement = statement.id(), "update parameters transformed");

    Ok(())
}
