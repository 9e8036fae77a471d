use bulwark_fallback::{FallbackChain, FallbackLevel};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn handlers_registered_after_construction_are_used() {
    let chain: FallbackChain<u32, u32, &'static str> = FallbackChain::new("quotes");
    let worker = chain.clone();

    chain.register_handler(FallbackLevel::Primary, |_| async { Err("down") });
    assert!(chain.execute(1).await.is_err());

    worker.register_handler(FallbackLevel::LocalCache, |n| async move { Ok(n * 10) });
    let outcome = chain.execute(4).await.unwrap();
    assert_eq!(outcome.value, 40);
    assert_eq!(outcome.level, FallbackLevel::LocalCache);

    assert!(chain.remove_handler(FallbackLevel::LocalCache));
    assert!(!chain.remove_handler(FallbackLevel::LocalCache));
    assert_eq!(chain.levels(), vec![FallbackLevel::Primary]);
}

#[tokio::test]
async fn registering_twice_replaces_the_handler() {
    let chain: FallbackChain<(), &'static str, ()> = FallbackChain::new("banner");
    chain.register_handler(FallbackLevel::Default, |_| async { Ok("old") });
    chain.register_handler(FallbackLevel::Default, |_| async { Ok("new") });

    assert_eq!(chain.levels(), vec![FallbackLevel::Default]);
    assert_eq!(chain.execute(()).await.unwrap().value, "new");
}

#[tokio::test]
async fn execute_from_skips_primary() {
    let primary_calls = Arc::new(AtomicUsize::new(0));
    let p = Arc::clone(&primary_calls);

    let chain: FallbackChain<(), u8, ()> = FallbackChain::builder()
        .handler(FallbackLevel::Primary, move |_| {
            p.fetch_add(1, Ordering::SeqCst);
            async { Ok(1) }
        })
        .value(FallbackLevel::Replica, 2)
        .build();

    let outcome = chain.execute_from(FallbackLevel::Replica, ()).await.unwrap();
    assert_eq!(outcome.value, 2);
    assert!(outcome.degraded);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn listeners_observe_failures_and_service() {
    let failed = Arc::new(Mutex::new(Vec::new()));
    let served = Arc::new(Mutex::new(None));
    let exhausted = Arc::new(AtomicUsize::new(0));
    let (f, s, e) = (Arc::clone(&failed), Arc::clone(&served), Arc::clone(&exhausted));

    let chain: FallbackChain<bool, &'static str, &'static str> = FallbackChain::builder()
        .name("search")
        .handler(FallbackLevel::Primary, |_| async { Err("overloaded") })
        .handler(FallbackLevel::Replica, |ok: bool| async move {
            if ok {
                Ok("replica")
            } else {
                Err("lagging")
            }
        })
        .on_level_failed(move |level| f.lock().unwrap().push(level))
        .on_served(move |level, degraded| *s.lock().unwrap() = Some((level, degraded)))
        .on_exhausted(move |attempts| {
            e.store(attempts, Ordering::SeqCst);
        })
        .build();

    chain.execute(true).await.unwrap();
    assert_eq!(*failed.lock().unwrap(), vec![FallbackLevel::Primary]);
    assert_eq!(*served.lock().unwrap(), Some((FallbackLevel::Replica, true)));

    failed.lock().unwrap().clear();
    chain.execute(false).await.unwrap_err();
    assert_eq!(
        *failed.lock().unwrap(),
        vec![FallbackLevel::Primary, FallbackLevel::Replica]
    );
    assert_eq!(exhausted.load(Ordering::SeqCst), 2);
}
