//! Instance providers.
//!
//! A [`Provider`] hands out instances of a bound type. Unscoped providers build a fresh
//! instance on every call; scopes wrap them to control reuse (see [`crate::scopes`]).

use std::fmt;
use std::sync::Arc;

use crate::ProvisionError;

/// Produces instances of `T` on demand.
pub trait Provider<T: ?Sized>: Send + Sync {
    /// Provide an instance.
    ///
    /// # Errors
    ///
    /// - The underlying construction failed
    /// - A scoped provider detected a circular dependency
    fn get(&self) -> Result<Arc<T>, ProvisionError>;
}

impl<T: ?Sized, P: Provider<T> + ?Sized> Provider<T> for Arc<P> {
    fn get(&self) -> Result<Arc<T>, ProvisionError> {
        (**self).get()
    }
}

/// Provider backed by an infallible closure. Created by [`from_fn`].
pub struct FnProvider<F> {
    f: F,
}

impl<T, F> Provider<T> for FnProvider<F>
where
    F: Fn() -> T + Send + Sync,
{
    fn get(&self) -> Result<Arc<T>, ProvisionError> {
        Ok(Arc::new((self.f)()))
    }
}

impl<F> fmt::Debug for FnProvider<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnProvider")
    }
}

/// Provider backed by a fallible closure. Created by [`try_from_fn`].
pub struct TryFnProvider<F> {
    f: F,
}

impl<T, F> Provider<T> for TryFnProvider<F>
where
    F: Fn() -> anyhow::Result<T> + Send + Sync,
{
    fn get(&self) -> Result<Arc<T>, ProvisionError> {
        (self.f)()
            .map(Arc::new)
            .map_err(|err| ProvisionError::Construction {
                type_name: std::any::type_name::<T>(),
                source: err.into(),
            })
    }
}

impl<F> fmt::Debug for TryFnProvider<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TryFnProvider")
    }
}

/// Create an unscoped provider that calls `f` for every instance.
///
/// # Examples
///
/// ```rust
/// use lifecycle_scopes::{provider, Provider};
/// use std::sync::Arc;
///
/// let numbers = provider::from_fn(|| 7u32);
/// let a: Arc<u32> = numbers.get().unwrap();
/// let b: Arc<u32> = numbers.get().unwrap();
///
/// assert_eq!(*a, 7);
/// assert!(!Arc::ptr_eq(&a, &b));
/// ```
pub fn from_fn<T, F>(f: F) -> FnProvider<F>
where
    F: Fn() -> T + Send + Sync,
{
    FnProvider { f }
}

/// Create an unscoped provider from a fallible closure.
///
/// A closure error surfaces as [`ProvisionError::Construction`] with the original error
/// as its source.
pub fn try_from_fn<T, F>(f: F) -> TryFnProvider<F>
where
    F: Fn() -> anyhow::Result<T> + Send + Sync,
{
    TryFnProvider { f }
}
