//! Lifecycle listener example for lifecycle-scopes.
//!
//! Demonstrates:
//! - Registering listeners with a `LifecycleManager` (each wrapped in `SafeLifecycleListener`)
//! - A listener failing during shutdown without affecting the others
//! - A start failure reaching the caller and triggering `notify_start_failed`
//!
//! Run with: `cargo run --example lifecycle`
//! Set `RUST_LOG=debug` for more detail.

use lifecycle_scopes::{LifecycleListener, LifecycleManager};
use std::fmt;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Listener that prints its callbacks and optionally fails on one of them.
struct Service {
    name: &'static str,
    fail_on_start: bool,
    fail_on_stop: bool,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl LifecycleListener for Service {
    fn on_started(&self) -> anyhow::Result<()> {
        if self.fail_on_start {
            anyhow::bail!("{} could not bind its port", self.name);
        }
        println!("   [{}] started", self.name);
        Ok(())
    }

    fn on_stopped(&self) -> anyhow::Result<()> {
        if self.fail_on_stop {
            anyhow::bail!("{} lost its connection while flushing", self.name);
        }
        println!("   [{}] stopped", self.name);
        Ok(())
    }

    fn on_start_failed(&self, cause: &anyhow::Error) -> anyhow::Result<()> {
        println!("   [{}] start failed: {}", self.name, cause);
        Ok(())
    }

    fn on_finished(&self) -> anyhow::Result<()> {
        println!("   [{}] finished", self.name);
        Ok(())
    }
}

fn service(name: &'static str) -> Service {
    Service {
        name,
        fail_on_start: false,
        fail_on_stop: false,
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("=== lifecycle-scopes: Lifecycle Listeners ===\n");

    // -------------------------------------------------------------------------
    // 1. Clean start and shutdown, with one listener failing on stop
    // -------------------------------------------------------------------------
    println!("1. Start and shut down...");

    let manager = LifecycleManager::new();
    manager.add_listener(Arc::new(service("database")))?;
    manager.add_listener(Arc::new(Service {
        fail_on_stop: true,
        ..service("cache")
    }))?;
    manager.add_listener(Arc::new(service("http")))?;

    manager.notify_started()?;
    manager.notify_shutdown();

    println!("   State: {}\n", manager.state());

    // -------------------------------------------------------------------------
    // 2. A listener refuses to start
    // -------------------------------------------------------------------------
    println!("2. Start failure...");

    let manager = LifecycleManager::new();
    manager.add_listener(Arc::new(service("database")))?;
    manager.add_listener(Arc::new(Service {
        fail_on_start: true,
        ..service("http")
    }))?;

    if let Err(err) = manager.notify_started() {
        println!("   Start failed: {}", err);
        manager.notify_start_failed(err);
    }

    println!("   State: {}", manager.state());
    if let Some(reason) = manager.failure_reason() {
        println!("   Failure reason: {}", reason);
    }

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
