//! # Lifecycle Scopes
//!
//! Scoping and lifecycle-listener adapters for a dependency-injection container.
//!
//! This crate provides two adapters that plug into a container's extension points:
//!
//! - [`LazySingletonScope`] - a scope that forwards to the built-in [`scopes::SINGLETON`]
//! - [`SafeLifecycleListener`] - a listener decorator that logs every notification and
//!   contains failures on the shutdown path
//!
//! ## Quick Start
//!
//! ```rust
//! use lifecycle_scopes::{provider, scopes::Scope, Key, Provider, LAZY_SINGLETON};
//! use std::sync::Arc;
//!
//! let unscoped = Arc::new(provider::from_fn(|| "config".to_string()));
//! let scoped = LAZY_SINGLETON.scope(Key::<String>::of(), unscoped);
//!
//! let a = scoped.get().unwrap();
//! let b = scoped.get().unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! ```
//!
//! ## Features
//!
//! - **Singleton scoping**: one instance per scoped provider, built once even under contention
//! - **Safe shutdown**: a failing listener cannot block the shutdown of the others
//! - **Logging**: every notification is logged through `tracing`
//!
//! ## Main Types
//!
//! - [`Key`] - identifies a binding
//! - [`Provider`] - produces instances; see [`provider::from_fn`] and [`provider::try_from_fn`]
//! - [`scopes::Scope`] - scoping policy, with [`scopes::SINGLETON`] and [`scopes::NO_SCOPE`]
//! - [`LifecycleListener`] - lifecycle callbacks
//! - [`LifecycleManager`] - registers listeners and drives notifications

mod key;
mod lazy_singleton;
mod lifecycle_listener;
mod lifecycle_manager;
pub mod provider;
mod provision_error;
mod safe_listener;
pub mod scopes;

// Re-export the main public API
pub use key::Key;
pub use lazy_singleton::{LazySingletonScope, LAZY_SINGLETON};
pub use lifecycle_listener::LifecycleListener;
pub use lifecycle_manager::{LifecycleManager, LifecycleState};
pub use provider::Provider;
pub use provision_error::{BoxError, ProvisionError};
pub use safe_listener::SafeLifecycleListener;
