//! Singleton scoping example for lifecycle-scopes.
//!
//! Demonstrates:
//! - Scoping an unscoped provider with `LAZY_SINGLETON`
//! - Instances built on first use and shared afterwards
//! - Sharing a singleton across threads
//! - Failed construction being retried
//!
//! Run with: `cargo run --example lazy_singleton`

use lifecycle_scopes::scopes::Scope;
use lifecycle_scopes::{provider, Key, Provider, LAZY_SINGLETON};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct ConnectionPool {
    size: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    println!("=== lifecycle-scopes: Lazy Singleton ===\n");

    // -------------------------------------------------------------------------
    // 1. Scope a provider
    // -------------------------------------------------------------------------
    println!("1. Scoping a provider...");

    let built = Arc::new(AtomicUsize::new(0));
    let built_clone = built.clone();
    let unscoped = Arc::new(provider::from_fn(move || {
        built_clone.fetch_add(1, Ordering::SeqCst);
        ConnectionPool { size: 16 }
    }));
    let pool = LAZY_SINGLETON.scope(Key::<ConnectionPool>::named("primary"), unscoped);

    println!("   Instances built so far: {}", built.load(Ordering::SeqCst));

    // -------------------------------------------------------------------------
    // 2. Resolve from several threads
    // -------------------------------------------------------------------------
    println!("\n2. Resolving from 4 threads...");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = pool.clone();
            thread::spawn(move || pool.get())
        })
        .collect();

    let first = pool.get()?;
    for handle in handles {
        let resolved = handle
            .join()
            .map_err(|_| anyhow::anyhow!("resolver thread panicked"))??;
        assert!(Arc::ptr_eq(&first, &resolved));
    }

    println!("   Pool size: {}", first.size);
    println!("   Instances built: {}", built.load(Ordering::SeqCst));

    // -------------------------------------------------------------------------
    // 3. Retry after a failed construction
    // -------------------------------------------------------------------------
    println!("\n3. Retrying a failed construction...");

    let reachable = Arc::new(AtomicBool::new(false));
    let reachable_clone = reachable.clone();
    let flaky = LAZY_SINGLETON.scope(
        Key::<String>::named("remote-config"),
        Arc::new(provider::try_from_fn(move || {
            if !reachable_clone.load(Ordering::SeqCst) {
                anyhow::bail!("config server unreachable");
            }
            Ok("feature_x=on".to_string())
        })),
    );

    match flaky.get() {
        Ok(_) => println!("   Unexpected success"),
        Err(err) => println!("   First attempt: {}", err),
    }

    reachable.store(true, Ordering::SeqCst);
    println!("   Second attempt: {}", flaky.get()?);

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
