//! Binding keys.
//!
//! A [`Key`] identifies a binding by the bound type and an optional qualifier name.
//! Two keys for the same type with different qualifiers are different bindings.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Identifies a binding of type `T`, optionally qualified by a static name.
///
/// # Examples
///
/// ```rust
/// use lifecycle_scopes::Key;
///
/// let plain = Key::<String>::of();
/// let named = Key::<String>::named("greeting");
///
/// assert_ne!(plain, named);
/// assert_eq!(named.to_string(), "Key[type=alloc::string::String, name=greeting]");
/// ```
pub struct Key<T: ?Sized + 'static> {
    name: Option<&'static str>,
    _marker: PhantomData<fn() -> *const T>,
}

impl<T: ?Sized + 'static> Key<T> {
    /// Key for the unqualified binding of `T`.
    pub const fn of() -> Self {
        Self {
            name: None,
            _marker: PhantomData,
        }
    }

    /// Key for the binding of `T` qualified by `name`.
    pub const fn named(name: &'static str) -> Self {
        Self {
            name: Some(name),
            _marker: PhantomData,
        }
    }

    pub fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }
}

// Manual impls: deriving would put bounds on `T` that a key does not need.

impl<T: ?Sized + 'static> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized + 'static> Copy for Key<T> {}

impl<T: ?Sized + 'static> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T: ?Sized + 'static> Eq for Key<T> {}

impl<T: ?Sized + 'static> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id().hash(state);
        self.name.hash(state);
    }
}

impl<T: ?Sized + 'static> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("type_name", &self.type_name())
            .field("name", &self.name)
            .finish()
    }
}

impl<T: ?Sized + 'static> fmt::Display for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "Key[type={}, name={}]", self.type_name(), name),
            None => write!(f, "Key[type={}]", self.type_name()),
        }
    }
}
