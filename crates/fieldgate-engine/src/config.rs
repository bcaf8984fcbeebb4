//! Configuration-document support.
//!
//! Field bindings can be declared in a structured document instead of
//! (or in addition to) builder calls, parsed once at startup into the
//! same descriptor model:
//!
//! ```toml
//! [[entities]]
//! type = "Account"                 # alias or type path of a registered entity
//!
//!   [[entities.fields]]
//!   name = "balance_note"          # must be exposed on the entity
//!   handler = "mask"               # named handler instance or factory
//!   params = ["***"]
//! ```
//!
//! The document only carries *bindings*; accessors and handler
//! implementations always come from code, via
//! [`EntityDef::expose`](crate::EntityDef::expose) and
//! [`EngineBuilder::handler_factory`](crate::EngineBuilder::handler_factory)
//! or [`handler_named`](crate::EngineBuilder::handler_named).
//!
//! # Loading
//!
//! [`ConfigLoader`] layers sources figment-style, later sources
//! overriding earlier ones:
//!
//! 1. Built-in defaults (an empty binding set)
//! 2. TOML file(s) or inline strings
//! 3. Environment variables (`FIELDGATE_` prefix, `__` separator)

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;

// =============================================================================
// Schema
// =============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FieldgateConfig {
    /// Entity binding declarations.
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

/// Bindings for one entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    /// The entity's alias or full type path, as registered.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Field bindings for this entity.
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// A single field binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    /// The exposed field name.
    pub name: String,

    /// The named handler to bind.
    pub handler: String,

    /// Opaque parameters passed to the handler on every invocation.
    #[serde(default)]
    pub params: Vec<String>,
}

// =============================================================================
// Loader
// =============================================================================

/// Figment-based loader for [`FieldgateConfig`].
///
/// # Example
///
/// ```rust,ignore
/// let config = ConfigLoader::new()
///     .file("fieldgate.toml")
///     .with_env()
///     .load()?;
/// ```
pub struct ConfigLoader {
    figment: Figment,
}

impl ConfigLoader {
    /// Creates a loader seeded with built-in defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(FieldgateConfig::default())),
        }
    }

    /// Merges a TOML file. Missing files merge as empty.
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.figment = self.figment.merge(Toml::file(path.as_ref()));
        self
    }

    /// Merges an inline TOML document.
    pub fn string(mut self, toml: &str) -> Self {
        self.figment = self.figment.merge(Toml::string(toml));
        self
    }

    /// Merges `FIELDGATE_`-prefixed environment variables, with `__`
    /// separating nesting levels.
    pub fn with_env(mut self) -> Self {
        self.figment = self.figment.merge(Env::prefixed("FIELDGATE_").split("__"));
        self
    }

    /// Extracts the merged configuration.
    pub fn load(self) -> ConfigResult<FieldgateConfig> {
        Ok(self.figment.extract()?)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{EngineBuilder, EntityDef};
    use crate::error::ConfigError;
    use fieldgate_core::{
        FieldHandler, HandlerResult, ObjectHandle, QueryResult, Value,
    };
    use std::any::Any;
    use std::sync::Arc;

    const DOC: &str = r#"
        [[entities]]
        type = "Account"

          [[entities.fields]]
          name = "balance_note"
          handler = "mask"
          params = ["***"]
    "#;

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

    struct Account {
        balance_note: String,
    }

    fn exposed_account() -> EntityDef<Account> {
        EntityDef::<Account>::new().alias("Account").expose(
            "balance_note",
            |a: &Account| a.balance_note.clone(),
            |a: &mut Account, v: String| a.balance_note = v,
        )
    }

    #[test]
    fn parses_binding_document() {
        let config = ConfigLoader::new().string(DOC).load().unwrap();
        assert_eq!(config.entities.len(), 1);
        assert_eq!(config.entities[0].type_name, "Account");
        assert_eq!(config.entities[0].fields[0].handler, "mask");
        assert_eq!(config.entities[0].fields[0].params, vec!["***"]);
    }

    #[test]
    fn config_bound_field_is_transformed() {
        let config = ConfigLoader::new().string(DOC).load().unwrap();
        let engine = EngineBuilder::new()
            .handler_factory("mask", || Arc::new(MaskHandler))
            .entity(exposed_account())
            .with_config(config)
            .build()
            .unwrap();

        let handle = ObjectHandle::new(Account {
            balance_note: "1000".to_string(),
        });
        engine.after_query(&QueryResult::Row(handle.clone())).unwrap();
        assert_eq!(
            handle.with(|a: &Account| a.balance_note.clone()).unwrap(),
            "***"
        );
    }

    #[test]
    fn unknown_entity_fails_build() {
        let config = ConfigLoader::new().string(DOC).load().unwrap();
        let err = EngineBuilder::new()
            .handler_factory("mask", || Arc::new(MaskHandler))
            .with_config(config)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEntity { .. }));
    }

    #[test]
    fn unexposed_field_fails_build() {
        let config = ConfigLoader::new().string(DOC).load().unwrap();
        let err = EngineBuilder::new()
            .handler_factory("mask", || Arc::new(MaskHandler))
            .entity(EntityDef::<Account>::new().alias("Account"))
            .with_config(config)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnexposedField { .. }));
    }

    #[test]
    fn unknown_handler_fails_build() {
        let config = ConfigLoader::new().string(DOC).load().unwrap();
        let err = EngineBuilder::new()
            .entity(exposed_account())
            .with_config(config)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownHandler { .. }));
    }
}
