//! Listener registration and lifecycle notification.
//!
//! The [`LifecycleManager`] owns the container's listeners. Every listener is registered
//! wrapped in a [`SafeLifecycleListener`], so shutdown notifications reach all listeners
//! even when some of them fail.
//!
//! Notification order:
//!
//! - `notify_started` - registration order, the first error is returned
//! - `notify_start_failed` / `notify_shutdown` - reverse registration order, errors contained
//!
//! ```text
//! Starting ──notify_started──▶ Started ──notify_shutdown──▶ Done
//!     │                           │                          ▲
//!     └──────────────notify_start_failed─────────────────────┘
//! ```
//!
//! Each transition happens at most once. Listener callbacks run without the state lock
//! held, so a listener may register further listeners while being notified.
//!
//! Deliveries are serialised by a notification gate. A late listener's `on_started` and each
//! `notify_*` loop run while holding it, so a listener never hears `on_stopped` before its
//! own `on_started` has returned. The gate is re-entrant for the thread holding it.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use crate::{LifecycleListener, SafeLifecycleListener};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// The container is being built.
    Starting,
    /// The container started successfully.
    Started,
    /// The container shut down or failed to start.
    Done,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Starting => write!(f, "Starting"),
            LifecycleState::Started => write!(f, "Started"),
            LifecycleState::Done => write!(f, "Done"),
        }
    }
}

struct ManagerState {
    state: LifecycleState,
    listeners: Vec<SafeLifecycleListener>,
    failure_reason: Option<Arc<anyhow::Error>>,
}

/// Tracks the container lifecycle and notifies registered listeners.
///
/// # Examples
///
/// ```rust
/// use lifecycle_scopes::{LifecycleListener, LifecycleManager, LifecycleState};
/// use std::fmt;
/// use std::sync::Arc;
///
/// struct Quiet;
///
/// impl fmt::Display for Quiet {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         f.write_str("Quiet")
///     }
/// }
///
/// impl LifecycleListener for Quiet {
///     fn on_started(&self) -> anyhow::Result<()> { Ok(()) }
///     fn on_stopped(&self) -> anyhow::Result<()> { anyhow::bail!("ignored") }
///     fn on_start_failed(&self, _cause: &anyhow::Error) -> anyhow::Result<()> { Ok(()) }
///     fn on_finished(&self) -> anyhow::Result<()> { Ok(()) }
/// }
///
/// let manager = LifecycleManager::new();
/// manager.add_listener(Arc::new(Quiet)).unwrap();
///
/// manager.notify_started().unwrap();
/// manager.notify_shutdown();
///
/// assert_eq!(manager.state(), LifecycleState::Done);
/// ```
pub struct LifecycleManager {
    inner: Mutex<ManagerState>,
    gate: NotificationGate,
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ManagerState {
                state: LifecycleState::Starting,
                listeners: Vec::new(),
                failure_reason: None,
            }),
            gate: NotificationGate::default(),
        }
    }

    // Every mutation is a single assignment or push, so poisoned data is still consistent.
    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state
    }

    /// The cause passed to `notify_start_failed`, if start failed.
    pub fn failure_reason(&self) -> Option<Arc<anyhow::Error>> {
        self.lock().failure_reason.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Register `listener`, wrapped in a [`SafeLifecycleListener`].
    ///
    /// Passing a listener that is already a `SafeLifecycleListener` registers its delegate,
    /// so wrappers never nest and deduplication sees through them.
    ///
    /// Returns `Ok(false)` without registering if this listener instance is already
    /// registered, or once the container is `Done` (it would never be notified). A listener
    /// added after the container started is notified with `on_started` right away, before
    /// any concurrent `notify_shutdown` reaches it.
    ///
    /// # Errors
    ///
    /// - The late listener's `on_started` failed (the listener stays registered)
    pub fn add_listener(&self, listener: Arc<dyn LifecycleListener>) -> anyhow::Result<bool> {
        let safe = SafeLifecycleListener::wrap(listener);
        let _pass = self.gate.enter();

        let state = {
            let mut inner = self.lock();
            if inner.state == LifecycleState::Done {
                tracing::debug!(
                    "Not adding LifecycleListener '{}' in state {}",
                    safe.delegate(),
                    inner.state
                );
                return Ok(false);
            }
            if inner.listeners.contains(&safe) {
                tracing::debug!("LifecycleListener '{}' already registered", safe.delegate());
                return Ok(false);
            }
            inner.listeners.push(safe.clone());
            inner.state
        };

        tracing::info!("Adding LifecycleListener '{}'", safe.delegate());

        if state == LifecycleState::Started {
            safe.on_started()?;
        }

        Ok(true)
    }

    /// Transition `Starting -> Started` and notify listeners in registration order.
    ///
    /// Does nothing in any other state.
    ///
    /// # Errors
    ///
    /// - The first listener error from `on_started`, unchanged; later listeners are not notified
    pub fn notify_started(&self) -> anyhow::Result<()> {
        let _pass = self.gate.enter();
        let Some(listeners) =
            self.transition(&[LifecycleState::Starting], LifecycleState::Started, None)
        else {
            return Ok(());
        };

        for listener in &listeners {
            listener.on_started()?;
        }

        Ok(())
    }

    /// Transition to `Done`, record `cause`, and notify listeners in reverse order.
    ///
    /// Accepted from `Starting`, and from `Started` when a listener's `on_started` failed after
    /// the transition. Does nothing once `Done`.
    pub fn notify_start_failed(&self, cause: anyhow::Error) {
        let cause = Arc::new(cause);
        let _pass = self.gate.enter();
        let Some(listeners) = self.transition(
            &[LifecycleState::Starting, LifecycleState::Started],
            LifecycleState::Done,
            Some(cause.clone()),
        ) else {
            return;
        };

        for listener in listeners.iter().rev() {
            listener.start_failed(&cause);
        }
    }

    /// Transition `Started -> Done` and notify listeners in reverse order.
    ///
    /// Does nothing in any other state.
    pub fn notify_shutdown(&self) {
        let _pass = self.gate.enter();
        let Some(listeners) =
            self.transition(&[LifecycleState::Started], LifecycleState::Done, None)
        else {
            return;
        };

        for listener in listeners.iter().rev() {
            listener.stopped();
        }
    }

    /// Move to `to` if the current state is one of `from`, returning a snapshot of the
    /// listeners to notify.
    fn transition(
        &self,
        from: &[LifecycleState],
        to: LifecycleState,
        failure_reason: Option<Arc<anyhow::Error>>,
    ) -> Option<Vec<SafeLifecycleListener>> {
        let mut inner = self.lock();
        let current = inner.state;
        if !from.contains(&current) {
            tracing::debug!("Ignoring transition to {} in state {}", to, current);
            return None;
        }

        inner.state = to;
        if failure_reason.is_some() {
            inner.failure_reason = failure_reason;
        }
        tracing::info!("Lifecycle transition {} -> {}", current, to);
        Some(inner.listeners.clone())
    }
}

/// Re-entrant mutual exclusion for listener deliveries.
#[derive(Default)]
struct NotificationGate {
    /// The holding thread and its nesting depth.
    owner: Mutex<Option<(ThreadId, usize)>>,
    released: Condvar,
}

impl NotificationGate {
    fn lock_owner(&self) -> MutexGuard<'_, Option<(ThreadId, usize)>> {
        self.owner.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn enter(&self) -> GatePass<'_> {
        let current = thread::current().id();
        let mut owner = self.lock_owner();
        loop {
            match *owner {
                None => {
                    *owner = Some((current, 1));
                    break;
                }
                Some((holder, depth)) if holder == current => {
                    *owner = Some((holder, depth + 1));
                    break;
                }
                Some(_) => {
                    owner = self.released.wait(owner).unwrap_or_else(|p| p.into_inner());
                }
            }
        }
        GatePass { gate: self }
    }
}

/// Leaves the gate on drop, including while unwinding from a listener panic.
struct GatePass<'a> {
    gate: &'a NotificationGate,
}

impl Drop for GatePass<'_> {
    fn drop(&mut self) {
        let mut owner = self.gate.lock_owner();
        match *owner {
            Some((holder, depth)) if depth > 1 => *owner = Some((holder, depth - 1)),
            _ => {
                *owner = None;
                self.gate.released.notify_all();
            }
        }
    }
}

impl fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("LifecycleManager")
            .field("state", &inner.state)
            .field("listeners", &inner.listeners)
            .finish()
    }
}
