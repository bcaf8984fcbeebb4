//! Erased field accessors.
//!
//! The engine reads and writes fields on objects it only knows as
//! `dyn Any`. Accessors bridge that gap: callers register typed
//! getter/setter closures at startup, and this module erases them into
//! [`ReadAccessor`] / [`WriteAccessor`] functions over dynamic
//! [`Value`]s. Field types convert through serde, so any
//! `Serialize + DeserializeOwned` field works without the engine
//! knowing it.
//!
//! A descriptor must carry both accessors; the builder rejects fields
//! where either is missing.

use std::any::Any;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use fieldgate_core::{AccessError, AccessResult};

/// Reads a field from an erased object as a dynamic value.
pub type ReadAccessor = Arc<dyn Fn(&dyn Any) -> AccessResult<Value> + Send + Sync>;

/// Writes a dynamic value back into a field of an erased object.
pub type WriteAccessor = Arc<dyn Fn(&mut dyn Any, Value) -> AccessResult<()> + Send + Sync>;

/// Erases a typed getter into a [`ReadAccessor`].
pub fn read_accessor<T, V, G>(get: G) -> ReadAccessor
where
    T: Any,
    V: Serialize,
    G: Fn(&T) -> V + Send + Sync + 'static,
{
    Arc::new(move |owner: &dyn Any| {
        let typed = owner
            .downcast_ref::<T>()
            .ok_or_else(|| AccessError::TypeMismatch {
                expected: std::any::type_name::<T>(),
            })?;
        Ok(serde_json::to_value(get(typed))?)
    })
}

/// Erases a typed setter into a [`WriteAccessor`].
pub fn write_accessor<T, V, S>(set: S) -> WriteAccessor
where
    T: Any,
    V: DeserializeOwned,
    S: Fn(&mut T, V) + Send + Sync + 'static,
{
    Arc::new(move |owner: &mut dyn Any, value: Value| {
        let typed = owner
            .downcast_mut::<T>()
            .ok_or_else(|| AccessError::TypeMismatch {
                expected: std::any::type_name::<T>(),
            })?;
        set(typed, serde_json::from_value(value)?);
        Ok(())
    })
}

/// Erases a getter/setter pair in one call.
pub fn accessor_pair<T, V, G, S>(get: G, set: S) -> (ReadAccessor, WriteAccessor)
where
    T: Any,
    V: Serialize + DeserializeOwned,
    G: Fn(&T) -> V + Send + Sync + 'static,
    S: Fn(&mut T, V) + Send + Sync + 'static,
{
    (read_accessor(get), write_accessor(set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Account {
        note: String,
    }

    #[test]
    fn round_trips_through_value() {
        let (read, write) = accessor_pair(
            |a: &Account| a.note.clone(),
            |a: &mut Account, v: String| a.note = v,
        );

        let mut account = Account {
            note: "1000".to_string(),
        };

        let value = read(&account).unwrap();
        assert_eq!(value, json!("1000"));

        write(&mut account, json!("***")).unwrap();
        assert_eq!(account.note, "***");
    }

    #[test]
    fn wrong_owner_type_is_rejected() {
        let read = read_accessor(|a: &Account| a.note.clone());
        let other = 42u32;

        let err = read(&other).unwrap_err();
        assert!(matches!(err, AccessError::TypeMismatch { .. }));
    }

    #[test]
    fn unconvertible_value_is_rejected() {
        let write = write_accessor(|a: &mut Account, v: String| a.note = v);
        let mut account = Account {
            note: String::new(),
        };

        let err = write(&mut account, json!({"not": "a string"})).unwrap_err();
        assert!(matches!(err, AccessError::Convert(_)));
    }
}
