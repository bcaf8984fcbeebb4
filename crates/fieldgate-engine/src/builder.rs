//! Startup registration and registry construction.
//!
//! This module is the explicit, type-checked replacement for annotation
//! scanning: callers declare entities, fields, handlers and gates on an
//! [`EngineBuilder`] at process startup, and [`EngineBuilder::build`]
//! turns the declarations into the immutable
//! [`MetadataRegistry`](crate::MetadataRegistry) behind a ready
//! [`FieldInterceptor`].
//!
//! Construction is all-or-nothing: any configuration error aborts the
//! whole build and no interceptor is produced. There is no partially
//! ready engine.
//!
//! # Example
//!
//! ```rust,ignore
//! let interceptor = EngineBuilder::new()
//!     .read_gate::<MaskHandler, _>(|owner, field, value| Ok(!value.is_null()))
//!     .entity(
//!         EntityDef::<Account>::new()
//!             .field(
//!                 FieldDef::bind::<MaskHandler>("balance_note")
//!                     .params(["***"])
//!                     .access(
//!                         |a: &Account| a.balance_note.clone(),
//!                         |a: &mut Account, v: String| a.balance_note = v,
//!                     ),
//!             ),
//!     )
//!     .build()?;
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::accessor::{ReadAccessor, WriteAccessor, accessor_pair, read_accessor, write_accessor};
use crate::config::FieldgateConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::gate::{GatePredicate, GateRegistry, gate};
use crate::interceptor::FieldInterceptor;
use crate::metadata::{EntityMetadata, FieldDescriptor, MetadataRegistry};
use fieldgate_core::{BoxedFieldHandler, FieldHandler, HandlerResult, handler_key};

/// Constructs a handler instance on demand.
type HandlerFactory = Arc<dyn Fn() -> BoxedFieldHandler + Send + Sync>;

/// How a field binding refers to its handler.
enum HandlerRef {
    /// A handler type declared programmatically. `make` is present for
    /// default-constructible handlers and absent for injection-only
    /// bindings.
    Typed {
        key: &'static str,
        make: Option<HandlerFactory>,
    },
    /// A handler name declared in a configuration document, resolved
    /// against registered named instances and factories.
    Named(String),
}

impl HandlerRef {
    fn key(&self) -> &str {
        match self {
            Self::Typed { key, .. } => key,
            Self::Named(name) => name,
        }
    }
}

// =============================================================================
// Field Definitions
// =============================================================================

/// A field binding under construction.
///
/// The type parameter ties the accessors to the declaring entity type;
/// it is erased once the definition is added to an [`EntityDef`].
pub struct FieldDef<T> {
    name: String,
    handler: HandlerRef,
    params: Vec<String>,
    read: Option<ReadAccessor>,
    write: Option<WriteAccessor>,
    _entity: PhantomData<fn(T)>,
}

impl<T: Any> FieldDef<T> {
    /// Binds a field to a default-constructible handler type.
    ///
    /// The registry materializes at most one `H` per process and shares
    /// it across every field bound to `H`.
    pub fn bind<H: FieldHandler + Default + 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: HandlerRef::Typed {
                key: handler_key::<H>(),
                make: Some(Arc::new(|| Arc::new(H::default()) as BoxedFieldHandler)),
            },
            params: Vec::new(),
            read: None,
            write: None,
            _entity: PhantomData,
        }
    }

    /// Binds a field to a handler type that must be injected.
    ///
    /// Use this for handlers with external dependencies (key services,
    /// crypto providers). The build fails with
    /// [`ConfigError::HandlerUnavailable`] unless a matching instance
    /// was supplied via
    /// [`EngineBuilder::handler_instance`].
    pub fn injected<H: FieldHandler + 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: HandlerRef::Typed {
                key: handler_key::<H>(),
                make: None,
            },
            params: Vec::new(),
            read: None,
            write: None,
            _entity: PhantomData,
        }
    }

    /// Sets the opaque parameters passed to the handler on every
    /// invocation.
    pub fn params(mut self, params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Registers the getter/setter pair for this field.
    pub fn access<V, G, S>(mut self, get: G, set: S) -> Self
    where
        V: Serialize + DeserializeOwned,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let (read, write) = accessor_pair(get, set);
        self.read = Some(read);
        self.write = Some(write);
        self
    }

    /// Registers only the getter. The build fails unless a setter is
    /// registered too.
    pub fn read_with<V, G>(mut self, get: G) -> Self
    where
        V: Serialize,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.read = Some(read_accessor(get));
        self
    }

    /// Registers only the setter. The build fails unless a getter is
    /// registered too.
    pub fn write_with<V, S>(mut self, set: S) -> Self
    where
        V: DeserializeOwned,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.write = Some(write_accessor(set));
        self
    }

    fn erase(self) -> ErasedField {
        ErasedField {
            name: self.name,
            handler: self.handler,
            params: self.params,
            read: self.read,
            write: self.write,
        }
    }
}

struct ErasedField {
    name: String,
    handler: HandlerRef,
    params: Vec<String>,
    read: Option<ReadAccessor>,
    write: Option<WriteAccessor>,
}

// =============================================================================
// Entity Definitions
// =============================================================================

/// An accessor pair exposed for configuration-driven binding.
struct Exposure {
    name: String,
    read: ReadAccessor,
    write: WriteAccessor,
}

/// An entity type opting into interception.
///
/// Fields are declared either directly ([`field`](Self::field)) or
/// exposed by name ([`expose`](Self::expose)) for binding through a
/// configuration document.
pub struct EntityDef<T> {
    alias: Option<String>,
    fields: Vec<ErasedField>,
    exposures: Vec<Exposure>,
    _entity: PhantomData<fn(T)>,
}

impl<T: Any> EntityDef<T> {
    /// Starts a definition for entity type `T`.
    pub fn new() -> Self {
        Self {
            alias: None,
            fields: Vec::new(),
            exposures: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// Sets a stable name for configuration documents to refer to this
    /// entity, instead of the compiler-generated type path.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    /// Adds a bound field.
    pub fn field(mut self, field: FieldDef<T>) -> Self {
        self.fields.push(field.erase());
        self
    }

    /// Exposes a field's accessors without binding a handler.
    ///
    /// Exposed fields participate only when a configuration document
    /// binds them to a handler by name.
    pub fn expose<V, G, S>(mut self, name: impl Into<String>, get: G, set: S) -> Self
    where
        V: Serialize + DeserializeOwned,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let (read, write) = accessor_pair(get, set);
        self.exposures.push(Exposure {
            name: name.into(),
            read,
            write,
        });
        self
    }

    fn erase(self) -> ErasedEntity {
        ErasedEntity {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            alias: self.alias,
            fields: self.fields,
            exposures: self.exposures,
        }
    }
}

impl<T: Any> Default for EntityDef<T> {
    fn default() -> Self {
        Self::new()
    }
}

struct ErasedEntity {
    type_id: TypeId,
    type_name: &'static str,
    alias: Option<String>,
    fields: Vec<ErasedField>,
    exposures: Vec<Exposure>,
}

impl ErasedEntity {
    /// Whether a configured entity name refers to this entity.
    fn matches_name(&self, name: &str) -> bool {
        self.alias.as_deref() == Some(name) || self.type_name == name
    }
}

// =============================================================================
// Engine Builder
// =============================================================================

/// Gate registration captured until the build runs.
struct GateReg {
    handler: String,
    write_path: bool,
    predicate: GatePredicate,
}

/// Collects startup declarations and builds the interceptor.
///
/// The builder is the engine's only mutable state, and it is consumed
/// by [`build`](Self::build); after a successful build everything the
/// engine touches is immutable.
#[derive(Default)]
pub struct EngineBuilder {
    entities: Vec<ErasedEntity>,
    instances: HashMap<String, BoxedFieldHandler>,
    factories: HashMap<String, HandlerFactory>,
    gates: Vec<GateReg>,
    configs: Vec<FieldgateConfig>,
}

impl EngineBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity definition.
    pub fn entity<T: Any>(mut self, def: EntityDef<T>) -> Self {
        self.entities.push(def.erase());
        self
    }

    /// Supplies a pre-built handler instance for its own type key.
    ///
    /// Pre-built instances take precedence over default construction
    /// and are required for bindings made with [`FieldDef::injected`].
    pub fn handler_instance<H: FieldHandler + 'static>(mut self, handler: H) -> Self {
        self.instances
            .insert(handler_key::<H>().to_string(), Arc::new(handler));
        self
    }

    /// Supplies a pre-built handler instance under a configuration name.
    pub fn handler_named<H: FieldHandler + 'static>(
        mut self,
        name: impl Into<String>,
        handler: H,
    ) -> Self {
        self.instances.insert(name.into(), Arc::new(handler));
        self
    }

    /// Registers a factory for a configuration-named handler.
    ///
    /// The factory runs at most once; the constructed instance is
    /// shared by every field bound to the name.
    pub fn handler_factory<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> BoxedFieldHandler + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Binds a read-path gate predicate to handler type `H`.
    ///
    /// At most one read gate per handler; a second registration fails
    /// the build with [`ConfigError::DuplicateGate`].
    pub fn read_gate<H, F>(mut self, predicate: F) -> Self
    where
        H: FieldHandler + 'static,
        F: Fn(&dyn Any, &str, &Value) -> HandlerResult<bool> + Send + Sync + 'static,
    {
        self.gates.push(GateReg {
            handler: handler_key::<H>().to_string(),
            write_path: false,
            predicate: gate(predicate),
        });
        self
    }

    /// Binds a write-path gate predicate to handler type `H`.
    pub fn write_gate<H, F>(mut self, predicate: F) -> Self
    where
        H: FieldHandler + 'static,
        F: Fn(&dyn Any, &str, &Value) -> HandlerResult<bool> + Send + Sync + 'static,
    {
        self.gates.push(GateReg {
            handler: handler_key::<H>().to_string(),
            write_path: true,
            predicate: gate(predicate),
        });
        self
    }

    /// Binds a read-path gate predicate to a configuration-named handler.
    pub fn read_gate_named<F>(mut self, handler: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&dyn Any, &str, &Value) -> HandlerResult<bool> + Send + Sync + 'static,
    {
        self.gates.push(GateReg {
            handler: handler.into(),
            write_path: false,
            predicate: gate(predicate),
        });
        self
    }

    /// Binds a write-path gate predicate to a configuration-named handler.
    pub fn write_gate_named<F>(mut self, handler: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&dyn Any, &str, &Value) -> HandlerResult<bool> + Send + Sync + 'static,
    {
        self.gates.push(GateReg {
            handler: handler.into(),
            write_path: true,
            predicate: gate(predicate),
        });
        self
    }

    /// Merges a configuration document's field bindings into the build.
    ///
    /// Configured entities must already be registered (by alias or type
    /// name) and configured fields must be exposed on them.
    pub fn with_config(mut self, config: FieldgateConfig) -> Self {
        self.configs.push(config);
        self
    }

    /// Builds the metadata registry and returns the ready interceptor.
    ///
    /// Fails on the first configuration error; nothing is
    /// constructed on failure.
    pub fn build(self) -> ConfigResult<FieldInterceptor> {
        let started = Instant::now();

        let mut gates = GateRegistry::default();
        for reg in self.gates {
            if reg.write_path {
                gates.register_write(reg.handler, reg.predicate)?;
            } else {
                gates.register_read(reg.handler, reg.predicate)?;
            }
        }

        let mut entities = self.entities;
        for config in &self.configs {
            for entity_cfg in &config.entities {
                let entity = entities
                    .iter_mut()
                    .find(|e| e.matches_name(&entity_cfg.type_name))
                    .ok_or_else(|| ConfigError::UnknownEntity {
                        entity: entity_cfg.type_name.clone(),
                    })?;
                for field_cfg in &entity_cfg.fields {
                    let exposure = entity
                        .exposures
                        .iter()
                        .find(|x| x.name == field_cfg.name)
                        .ok_or_else(|| ConfigError::UnexposedField {
                            entity: entity_cfg.type_name.clone(),
                            field: field_cfg.name.clone(),
                        })?;
                    let field = ErasedField {
                        name: field_cfg.name.clone(),
                        handler: HandlerRef::Named(field_cfg.handler.clone()),
                        params: field_cfg.params.clone(),
                        read: Some(exposure.read.clone()),
                        write: Some(exposure.write.clone()),
                    };
                    entity.fields.push(field);
                }
            }
        }

        let mut cache = self.instances;
        let factories = self.factories;
        let mut registry_map: HashMap<TypeId, EntityMetadata> = HashMap::new();

        for entity in entities {
            if registry_map.contains_key(&entity.type_id) {
                return Err(ConfigError::DuplicateEntity {
                    entity: entity.type_name.to_string(),
                });
            }

            let mut fields: HashMap<String, FieldDescriptor> = HashMap::new();
            for field in entity.fields {
                let read = field.read.ok_or_else(|| ConfigError::MissingAccessor {
                    entity: entity.type_name.to_string(),
                    field: field.name.clone(),
                    which: "read",
                })?;
                let write = field.write.ok_or_else(|| ConfigError::MissingAccessor {
                    entity: entity.type_name.to_string(),
                    field: field.name.clone(),
                    which: "write",
                })?;
                let handler = resolve_handler(&mut cache, &factories, &field.handler)?;
                let key = field.handler.key();

                let descriptor = FieldDescriptor {
                    name: field.name.clone(),
                    read,
                    write,
                    read_gate: gates.read_gate(key),
                    write_gate: gates.write_gate(key),
                    handler,
                    params: field.params,
                };
                match fields.entry(field.name) {
                    Entry::Occupied(entry) => {
                        return Err(ConfigError::DuplicateField {
                            entity: entity.type_name.to_string(),
                            field: entry.key().clone(),
                        });
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(descriptor);
                    }
                }
            }

            if fields.is_empty() {
                warn!(
                    entity = entity.type_name,
                    "entity registered but no fields bound, omitting from registry"
                );
                continue;
            }

            debug!(
                entity = entity.type_name,
                fields = fields.len(),
                "bound entity fields"
            );
            registry_map.insert(
                entity.type_id,
                EntityMetadata {
                    type_name: entity.type_name,
                    fields,
                },
            );
        }

        let registry = MetadataRegistry {
            entities: registry_map,
        };
        info!(
            entities = registry.entity_count(),
            fields = registry.field_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built field metadata registry"
        );

        Ok(FieldInterceptor::new(Arc::new(registry)))
    }
}

/// Resolves a handler reference to a shared instance, constructing and
/// caching at most one instance per key.
fn resolve_handler(
    cache: &mut HashMap<String, BoxedFieldHandler>,
    factories: &HashMap<String, HandlerFactory>,
    handler: &HandlerRef,
) -> ConfigResult<BoxedFieldHandler> {
    match handler {
        HandlerRef::Typed { key, make } => {
            if let Some(instance) = cache.get(*key) {
                return Ok(instance.clone());
            }
            let make = make.as_ref().ok_or_else(|| ConfigError::HandlerUnavailable {
                handler: (*key).to_string(),
            })?;
            let instance = make();
            cache.insert((*key).to_string(), instance.clone());
            Ok(instance)
        }
        HandlerRef::Named(name) => {
            if let Some(instance) = cache.get(name) {
                return Ok(instance.clone());
            }
            let factory = factories
                .get(name)
                .ok_or_else(|| ConfigError::UnknownHandler {
                    handler: name.clone(),
                })?;
            let instance = factory();
            cache.insert(name.clone(), instance.clone());
            Ok(instance)
        }
    }
}
