//! Fault-tolerant decorator for lifecycle listeners.
//!
//! [`SafeLifecycleListener`] logs every notification at INFO and keeps a misbehaving listener
//! from disrupting shutdown:
//!
//! | Callback          | Delegate error            | Afterwards                 |
//! |-------------------|---------------------------|----------------------------|
//! | `on_started`      | returned to the caller    | -                          |
//! | `on_stopped`      | logged and swallowed      | `on_finished` is delivered |
//! | `on_start_failed` | logged and swallowed      | `on_finished` is delivered |
//! | `on_finished`     | logged and swallowed      | -                          |
//!
//! Start failures stay visible so the container can roll back. Shutdown-path failures are
//! contained so the remaining listeners still get notified.
//!
//! Panics are not contained. If the delegate panics in `on_stopped` or `on_start_failed`,
//! `on_finished` is still delivered before the panic resumes.
//!
//! The decorator does not track lifecycle state. Callbacks are forwarded in whatever order
//! they arrive, including repeated `on_finished` calls.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::LifecycleListener;

/// Wraps a [`LifecycleListener`] with logging and shutdown-path error containment.
///
/// Two wrappers are equal when they wrap the same listener instance (the same `Arc`
/// allocation).
///
/// # Examples
///
/// ```rust
/// use lifecycle_scopes::{LifecycleListener, SafeLifecycleListener};
/// use std::fmt;
/// use std::sync::Arc;
///
/// struct Flaky;
///
/// impl fmt::Display for Flaky {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         f.write_str("Flaky")
///     }
/// }
///
/// impl LifecycleListener for Flaky {
///     fn on_started(&self) -> anyhow::Result<()> {
///         anyhow::bail!("cannot start")
///     }
///     fn on_stopped(&self) -> anyhow::Result<()> {
///         anyhow::bail!("cannot stop")
///     }
///     fn on_start_failed(&self, _cause: &anyhow::Error) -> anyhow::Result<()> {
///         Ok(())
///     }
///     fn on_finished(&self) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
///
/// let safe = SafeLifecycleListener::wrap(Arc::new(Flaky));
///
/// assert!(safe.on_started().is_err());
/// assert!(safe.on_stopped().is_ok());
/// assert_eq!(safe.to_string(), "Safe[Flaky]");
/// ```
#[derive(Clone)]
pub struct SafeLifecycleListener {
    delegate: Arc<dyn LifecycleListener>,
}

impl SafeLifecycleListener {
    /// Wrap `listener`. Wrapping an existing `SafeLifecycleListener` returns a copy of it
    /// rather than nesting a second layer.
    pub fn wrap(listener: Arc<dyn LifecycleListener>) -> Self {
        match listener.as_safe() {
            Some(safe) => safe.clone(),
            None => Self { delegate: listener },
        }
    }

    pub fn delegate(&self) -> &Arc<dyn LifecycleListener> {
        &self.delegate
    }

    fn delegate_addr(&self) -> *const () {
        Arc::as_ptr(&self.delegate) as *const ()
    }

    /// Deliver `on_stopped`, then `on_finished`. Delegate errors are logged, never returned.
    pub fn stopped(&self) {
        tracing::info!("Stopping LifecycleListener '{}'", self.delegate);
        self.contain("on_stopped", || self.delegate.on_stopped());
    }

    /// Deliver `on_start_failed`, then `on_finished`. Delegate errors are logged, never returned.
    pub fn start_failed(&self, cause: &anyhow::Error) {
        tracing::info!(cause = %cause, "Failed LifecycleListener '{}'", self.delegate);
        self.contain("on_start_failed", || self.delegate.on_start_failed(cause));
    }

    /// Runs a shutdown-path callback, logs its error, then delivers `on_finished`.
    fn contain(&self, callback: &str, notify: impl FnOnce() -> anyhow::Result<()>) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(notify));

        if let Ok(Err(err)) = &outcome {
            tracing::info!(
                error = ?err,
                "{} failed for listener '{}'",
                callback,
                self.delegate
            );
        }

        self.finish();

        if let Err(payload) = outcome {
            panic::resume_unwind(payload);
        }
    }

    fn finish(&self) {
        tracing::info!("Finished LifecycleListener '{}'", self.delegate);

        if let Err(err) = self.delegate.on_finished() {
            tracing::info!(
                error = ?err,
                "on_finished failed for listener '{}'",
                self.delegate
            );
        }
    }
}

impl LifecycleListener for SafeLifecycleListener {
    fn on_started(&self) -> anyhow::Result<()> {
        tracing::info!("Starting LifecycleListener '{}'", self.delegate);
        self.delegate.on_started()
    }

    fn on_stopped(&self) -> anyhow::Result<()> {
        self.stopped();
        Ok(())
    }

    fn on_start_failed(&self, cause: &anyhow::Error) -> anyhow::Result<()> {
        self.start_failed(cause);
        Ok(())
    }

    fn on_finished(&self) -> anyhow::Result<()> {
        self.finish();
        Ok(())
    }

    fn as_safe(&self) -> Option<&SafeLifecycleListener> {
        Some(self)
    }
}

impl PartialEq for SafeLifecycleListener {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.delegate_addr(), other.delegate_addr())
    }
}

impl Eq for SafeLifecycleListener {}

impl Hash for SafeLifecycleListener {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.delegate_addr(), state);
    }
}

impl fmt::Display for SafeLifecycleListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Safe[{}]", self.delegate)
    }
}

impl fmt::Debug for SafeLifecycleListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeLifecycleListener")
            .field("delegate", &format_args!("{}", self.delegate))
            .finish()
    }
}
