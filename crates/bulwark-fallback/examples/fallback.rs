//! Fallback chain example for graceful degradation
//!
//! A product lookup walks primary, replica, local cache and a static
//! default until one of them answers.
//! Run with: cargo run -p bulwark-fallback --example fallback

use bulwark_fallback::{FallbackChain, FallbackError, FallbackLevel};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct LookupError(&'static str);

#[tokio::main]
async fn main() {
    println!("=== Fallback Chain Example ===\n");

    let primary_up = Arc::new(AtomicBool::new(true));
    let replica_up = Arc::new(AtomicBool::new(true));
    let cache: Arc<HashMap<u32, String>> =
        Arc::new(HashMap::from([(7, "Widget (cached)".to_string())]));

    let (p, r, c) = (
        Arc::clone(&primary_up),
        Arc::clone(&replica_up),
        Arc::clone(&cache),
    );
    let chain: FallbackChain<u32, String, LookupError> = FallbackChain::builder()
        .name("product-lookup")
        .handler(FallbackLevel::Primary, move |id: u32| {
            let up = p.load(Ordering::SeqCst);
            async move {
                if up {
                    Ok(format!("Widget #{} (primary)", id))
                } else {
                    Err(LookupError("primary unreachable"))
                }
            }
        })
        .handler(FallbackLevel::Replica, move |id: u32| {
            let up = r.load(Ordering::SeqCst);
            async move {
                if up {
                    Ok(format!("Widget #{} (replica)", id))
                } else {
                    Err(LookupError("replica lagging"))
                }
            }
        })
        .handler(FallbackLevel::LocalCache, move |id: u32| {
            let hit = c.get(&id).cloned();
            async move { hit.ok_or(LookupError("cache miss")) }
        })
        .on_level_failed(|level| println!("  [FALLBACK] {} failed", level))
        .on_served(|level, degraded| {
            println!("  [FALLBACK] served by {} (degraded: {})", level, degraded)
        })
        .build();

    println!("--- Everything healthy ---");
    show(&chain, 7).await;

    println!("--- Primary down ---");
    primary_up.store(false, Ordering::SeqCst);
    show(&chain, 7).await;

    println!("--- Primary and replica down, cache hit ---");
    replica_up.store(false, Ordering::SeqCst);
    show(&chain, 7).await;

    println!("--- Cache miss, nothing left ---");
    show(&chain, 8).await;

    println!("--- Static default registered at runtime ---");
    chain.register_handler(FallbackLevel::Default, |_| async {
        Ok("Unknown product".to_string())
    });
    show(&chain, 8).await;
}

async fn show(chain: &FallbackChain<u32, String, LookupError>, id: u32) {
    match chain.execute(id).await {
        Ok(outcome) => println!("Result: {} [{}]\n", outcome.value, outcome.level),
        Err(err @ FallbackError::Exhausted { .. }) => {
            println!("Result: {}", err);
            for failure in err.failures() {
                println!("  {}: {:?}", failure.level, failure.error);
            }
            println!();
        }
    }
}
