//! Type-erased, identity-aware object handles.
//!
//! Objects flowing through the read and write paths are arbitrary
//! application types; the engine never knows them at compile time.
//! [`ObjectHandle`] erases them behind `dyn Any` while capturing the
//! concrete [`TypeId`] (for registry lookup) and type name (for
//! diagnostics) at construction.
//!
//! The same handle may appear more than once in a result set or
//! parameter structure. [`ObjectHandle::id`] exposes the shared
//! allocation's address as an [`ObjectId`] so the engine can deduplicate
//! by identity and transform each instance at most once per call.

use std::any::{Any, TypeId};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Identity of a shared object, derived from its allocation address.
///
/// Two handles compare equal here exactly when they point at the same
/// underlying object. The value is only meaningful while the object is
/// alive; it is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

/// A shared, type-erased handle to an application object.
///
/// Cloning an `ObjectHandle` is cheap and yields another handle to the
/// same object — this is how "the same instance appears twice in a
/// result list" is expressed. Field values are read and written through
/// the internal lock, which is what allows the engine to mutate
/// parameter objects in place before statement execution.
#[derive(Clone)]
pub struct ObjectHandle {
    inner: Arc<RwLock<dyn Any + Send + Sync>>,
    type_id: TypeId,
    type_name: &'static str,
}

impl ObjectHandle {
    /// Wraps a value in a new shared handle.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Returns the identity of the underlying object.
    pub fn id(&self) -> ObjectId {
        ObjectId(Arc::as_ptr(&self.inner).cast::<()>() as usize)
    }

    /// Returns the `TypeId` of the wrapped concrete type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the name of the wrapped concrete type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns whether the handle wraps a value of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Acquires a read guard over the erased object.
    pub fn read(&self) -> RwLockReadGuard<'_, dyn Any + Send + Sync> {
        self.inner.read()
    }

    /// Acquires a write guard over the erased object.
    pub fn write(&self) -> RwLockWriteGuard<'_, dyn Any + Send + Sync> {
        self.inner.write()
    }

    /// Runs `f` against the object downcast to `T`.
    ///
    /// Returns `None` if the handle wraps a different type.
    pub fn with<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.read();
        guard.downcast_ref::<T>().map(f)
    }

    /// Runs `f` against the object mutably downcast to `T`.
    ///
    /// Returns `None` if the handle wraps a different type.
    pub fn with_mut<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.write();
        guard.downcast_mut::<T>().map(f)
    }
}

impl std::fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectHandle")
            .field("type_name", &self.type_name)
            .field("id", &self.id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Sample {
        note: String,
    }

    #[test]
    fn clones_share_identity() {
        let a = ObjectHandle::new(Sample {
            note: "x".to_string(),
        });
        let b = a.clone();
        let c = ObjectHandle::new(Sample {
            note: "x".to_string(),
        });

        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn mutation_is_visible_through_clones() {
        let a = ObjectHandle::new(Sample {
            note: "old".to_string(),
        });
        let b = a.clone();

        b.with_mut(|s: &mut Sample| s.note = "new".to_string())
            .unwrap();

        assert_eq!(a.with(|s: &Sample| s.note.clone()).unwrap(), "new");
    }

    #[test]
    fn downcast_to_foreign_type_is_none() {
        let a = ObjectHandle::new(Sample {
            note: String::new(),
        });

        assert!(a.is::<Sample>());
        assert!(!a.is::<String>());
        assert!(a.with(|_: &String| ()).is_none());
    }
}
