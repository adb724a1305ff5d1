use std::fmt;
use std::sync::Arc;

use crate::scopes::{Scope, SINGLETON};
use crate::{Key, Provider};

/// Scope for bindings declared as lazy singletons.
///
/// Kept for bindings that still ask for it by name. It forwards to [`SINGLETON`], which
/// already constructs on first use, so the two scopes behave identically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LazySingletonScope;

pub const LAZY_SINGLETON: LazySingletonScope = LazySingletonScope;

impl Scope for LazySingletonScope {
    fn scope<T: Send + Sync + 'static>(
        &self,
        key: Key<T>,
        unscoped: Arc<dyn Provider<T>>,
    ) -> Arc<dyn Provider<T>> {
        SINGLETON.scope(key, unscoped)
    }
}

impl fmt::Display for LazySingletonScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LazySingleton")
    }
}
