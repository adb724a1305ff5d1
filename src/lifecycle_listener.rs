//! The lifecycle listener contract.
//!
//! The container's [`LifecycleManager`](crate::LifecycleManager) notifies listeners at each
//! lifecycle transition:
//!
//! ```text
//! Starting ──on_started──▶ Started ──on_stopped──▶ on_finished
//!     │
//!     └──on_start_failed──▶ on_finished
//! ```
//!
//! Returning `Err` from a callback reports a failure to the caller. Whether that failure
//! is propagated or contained is decided by [`SafeLifecycleListener`](crate::SafeLifecycleListener).

use std::fmt;

use crate::SafeLifecycleListener;

/// Callbacks invoked at container lifecycle transitions.
///
/// The `Display` output identifies the listener in log lines.
///
/// # Examples
///
/// ```rust
/// use lifecycle_scopes::LifecycleListener;
/// use std::fmt;
///
/// struct FlushOnExit;
///
/// impl fmt::Display for FlushOnExit {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         f.write_str("FlushOnExit")
///     }
/// }
///
/// impl LifecycleListener for FlushOnExit {
///     fn on_started(&self) -> anyhow::Result<()> {
///         Ok(())
///     }
///
///     fn on_stopped(&self) -> anyhow::Result<()> {
///         anyhow::bail!("disk full")
///     }
///
///     fn on_start_failed(&self, _cause: &anyhow::Error) -> anyhow::Result<()> {
///         Ok(())
///     }
///
///     fn on_finished(&self) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
///
/// assert!(FlushOnExit.on_stopped().is_err());
/// ```
pub trait LifecycleListener: fmt::Display + Send + Sync {
    /// The container finished starting.
    fn on_started(&self) -> anyhow::Result<()>;

    /// The container is shutting down after a successful start.
    fn on_stopped(&self) -> anyhow::Result<()>;

    /// The container failed to start because of `cause`.
    fn on_start_failed(&self, cause: &anyhow::Error) -> anyhow::Result<()>;

    /// Terminal notification, delivered after `on_stopped` or `on_start_failed`.
    fn on_finished(&self) -> anyhow::Result<()>;

    /// Lets `SafeLifecycleListener::wrap` recognise an already wrapped listener.
    #[doc(hidden)]
    fn as_safe(&self) -> Option<&SafeLifecycleListener> {
        None
    }
}
