//! Scoping policies built into the container.
//!
//! A [`Scope`] decorates an unscoped provider to control how many instances it hands out.
//! Two scopes ship with the crate:
//!
//! - [`SINGLETON`] - one instance per scoped provider, created on first use and reused forever
//! - [`NO_SCOPE`] - no reuse, every call reaches the unscoped provider
//!
//! # Singleton construction
//!
//! The singleton provider builds its instance outside of its internal lock, so construction
//! may freely resolve other bindings. Concurrent first callers block until the constructing
//! thread finishes and then share its instance. A failed construction is not cached and
//! the next call retries. Resolving the same singleton again from inside its own
//! construction yields [`ProvisionError::CircularDependency`].

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use crate::{Key, Provider, ProvisionError};

/// A policy governing how instances of a binding are reused.
pub trait Scope: fmt::Display + Send + Sync {
    /// Decorate `unscoped` with this scope's reuse policy for the binding `key`.
    fn scope<T: Send + Sync + 'static>(
        &self,
        key: Key<T>,
        unscoped: Arc<dyn Provider<T>>,
    ) -> Arc<dyn Provider<T>>;
}

/// One instance per scoped provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingletonScope;

/// The container's singleton scope.
pub const SINGLETON: SingletonScope = SingletonScope;

impl Scope for SingletonScope {
    fn scope<T: Send + Sync + 'static>(
        &self,
        key: Key<T>,
        unscoped: Arc<dyn Provider<T>>,
    ) -> Arc<dyn Provider<T>> {
        Arc::new(SingletonProvider::new(key, unscoped))
    }
}

impl fmt::Display for SingletonScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Scopes.SINGLETON")
    }
}

/// No reuse: the unscoped provider is returned as is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoScope;

/// The container's pass-through scope.
pub const NO_SCOPE: NoScope = NoScope;

impl Scope for NoScope {
    fn scope<T: Send + Sync + 'static>(
        &self,
        _key: Key<T>,
        unscoped: Arc<dyn Provider<T>>,
    ) -> Arc<dyn Provider<T>> {
        unscoped
    }
}

impl fmt::Display for NoScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Scopes.NO_SCOPE")
    }
}

// -------------------------------------------------------------------------------------------------
// Singleton provider
// -------------------------------------------------------------------------------------------------

struct SingletonState<T> {
    instance: Option<Arc<T>>,
    constructing: Option<ThreadId>,
}

/// Caches the first instance produced by the unscoped provider.
pub struct SingletonProvider<T: Send + Sync + 'static> {
    key: Key<T>,
    unscoped: Arc<dyn Provider<T>>,
    state: Mutex<SingletonState<T>>,
    ready: Condvar,
}

impl<T: Send + Sync + 'static> SingletonProvider<T> {
    fn new(key: Key<T>, unscoped: Arc<dyn Provider<T>>) -> Self {
        Self {
            key,
            unscoped,
            state: Mutex::new(SingletonState {
                instance: None,
                constructing: None,
            }),
            ready: Condvar::new(),
        }
    }

    pub fn key(&self) -> Key<T> {
        self.key
    }

    /// Whether the instance has been constructed already.
    pub fn is_initialized(&self) -> bool {
        self.lock_state().instance.is_some()
    }

    // The state is only ever mutated in single assignments, so a poisoned lock
    // still holds consistent data.
    fn lock_state(&self) -> MutexGuard<'_, SingletonState<T>> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn construct(&self) -> Result<Arc<T>, ProvisionError> {
        // Clears the construction slot even if the unscoped provider panics.
        let _slot = ConstructionSlot { provider: self };

        tracing::debug!("Constructing singleton for {}", self.key);
        let instance = self.unscoped.get()?;
        self.lock_state().instance = Some(instance.clone());
        Ok(instance)
    }
}

impl<T: Send + Sync + 'static> Provider<T> for SingletonProvider<T> {
    fn get(&self) -> Result<Arc<T>, ProvisionError> {
        let current = thread::current().id();
        let mut state = self.lock_state();

        loop {
            if let Some(instance) = &state.instance {
                return Ok(instance.clone());
            }

            let constructing = state.constructing;
            match constructing {
                Some(owner) if owner == current => {
                    return Err(ProvisionError::CircularDependency {
                        type_name: self.key.type_name(),
                    });
                }
                Some(_) => {
                    state = self.ready.wait(state).unwrap_or_else(|p| p.into_inner());
                }
                None => break,
            }
        }

        state.constructing = Some(current);
        drop(state);

        self.construct()
    }
}

impl<T: Send + Sync + 'static> fmt::Display for SingletonProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.key, SINGLETON)
    }
}

struct ConstructionSlot<'a, T: Send + Sync + 'static> {
    provider: &'a SingletonProvider<T>,
}

impl<T: Send + Sync + 'static> Drop for ConstructionSlot<'_, T> {
    fn drop(&mut self) {
        self.provider.lock_state().constructing = None;
        self.provider.ready.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_provider(calls: &Arc<AtomicUsize>) -> Arc<dyn Provider<Vec<u8>>> {
        let calls = calls.clone();
        Arc::new(provider::from_fn(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            vec![1u8, 2, 3]
        }))
    }

    #[test]
    fn test_singleton_returns_same_instance() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scoped = SINGLETON.scope(Key::of(), counting_provider(&calls));

        let first = scoped.get().unwrap();
        let second = scoped.get().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_singleton_is_lazy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scoped = SingletonProvider::new(Key::of(), counting_provider(&calls));

        assert!(!scoped.is_initialized());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        scoped.get().unwrap();
        assert!(scoped.is_initialized());
    }

    #[test]
    fn test_each_scope_call_has_its_own_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let unscoped = counting_provider(&calls);

        let a = SINGLETON.scope(Key::of(), unscoped.clone());
        let b = SINGLETON.scope(Key::of(), unscoped);

        assert!(!Arc::ptr_eq(&a.get().unwrap(), &b.get().unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_construction_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        let unscoped: Arc<dyn Provider<String>> = Arc::new(provider::try_from_fn(move || {
            if attempts_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("database not reachable");
            }
            Ok("connected".to_string())
        }));

        let scoped = SINGLETON.scope(Key::of(), unscoped);

        assert!(matches!(
            scoped.get(),
            Err(ProvisionError::Construction { .. })
        ));
        assert_eq!(&*scoped.get().unwrap(), "connected");
        assert_eq!(&*scoped.get().unwrap(), "connected");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_no_scope_passes_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let unscoped = counting_provider(&calls);
        let scoped = NO_SCOPE.scope(Key::of(), unscoped.clone());

        assert!(Arc::ptr_eq(&unscoped, &scoped));
        assert!(!Arc::ptr_eq(&scoped.get().unwrap(), &scoped.get().unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(SINGLETON.to_string(), "Scopes.SINGLETON");
        assert_eq!(NO_SCOPE.to_string(), "Scopes.NO_SCOPE");

        let calls = Arc::new(AtomicUsize::new(0));
        let scoped = SingletonProvider::new(Key::named("bytes"), counting_provider(&calls));
        assert_eq!(
            scoped.to_string(),
            format!(
                "Key[type={}, name=bytes][Scopes.SINGLETON]",
                std::any::type_name::<Vec<u8>>()
            )
        );
    }
}
