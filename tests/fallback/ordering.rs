use bulwark_core::ResilienceError;
use bulwark_fallback::{FallbackChain, FallbackLevel};
use std::sync::{Arc, Mutex};

type Chain = FallbackChain<String, String, String>;

fn failing(reason: &'static str) -> impl Fn(String) -> futures::future::Ready<Result<String, String>> {
    move |_| futures::future::ready(Err(reason.to_string()))
}

#[tokio::test]
async fn primary_success_is_not_degraded() {
    let chain: Chain = FallbackChain::builder()
        .name("profile")
        .handler(FallbackLevel::Primary, |user: String| async move {
            Ok(format!("fresh:{user}"))
        })
        .value(FallbackLevel::Default, "anonymous".to_string())
        .build();

    let outcome = chain.execute("ada".to_string()).await.unwrap();
    assert_eq!(outcome.value, "fresh:ada");
    assert_eq!(outcome.level, FallbackLevel::Primary);
    assert!(!outcome.degraded);
}

#[tokio::test]
async fn levels_run_in_fixed_order_regardless_of_registration() {
    let order = Arc::new(Mutex::new(Vec::new()));

    let record = |level: FallbackLevel, order: Arc<Mutex<Vec<FallbackLevel>>>| {
        move |_: String| {
            order.lock().unwrap().push(level);
            futures::future::ready(Err::<String, String>("down".to_string()))
        }
    };

    let chain: Chain = FallbackChain::builder()
        .name("inventory")
        .handler(FallbackLevel::BackupService, record(FallbackLevel::BackupService, Arc::clone(&order)))
        .handler(FallbackLevel::LocalCache, record(FallbackLevel::LocalCache, Arc::clone(&order)))
        .handler(FallbackLevel::Primary, record(FallbackLevel::Primary, Arc::clone(&order)))
        .handler(FallbackLevel::Replica, record(FallbackLevel::Replica, Arc::clone(&order)))
        .build();

    let err = chain.execute("sku-1".to_string()).await.unwrap_err();

    let expected = vec![
        FallbackLevel::Primary,
        FallbackLevel::Replica,
        FallbackLevel::LocalCache,
        FallbackLevel::BackupService,
    ];
    assert_eq!(*order.lock().unwrap(), expected);
    assert_eq!(err.attempted(), expected);
}

#[tokio::test]
async fn first_success_stops_the_chain() {
    let later_calls = Arc::new(Mutex::new(0));
    let l = Arc::clone(&later_calls);

    let chain: Chain = FallbackChain::builder()
        .handler(FallbackLevel::Primary, failing("timeout"))
        .handler(FallbackLevel::DistributedCache, |key: String| async move {
            Ok(format!("cached:{key}"))
        })
        .handler(FallbackLevel::BackupService, move |_| {
            *l.lock().unwrap() += 1;
            futures::future::ready(Ok("backup".to_string()))
        })
        .build();

    let outcome = chain.execute("k".to_string()).await.unwrap();
    assert_eq!(outcome.value, "cached:k");
    assert_eq!(outcome.level, FallbackLevel::DistributedCache);
    assert!(outcome.degraded);
    assert_eq!(*later_calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn exhaustion_keeps_every_error() {
    let chain: Chain = FallbackChain::builder()
        .name("pricing")
        .handler(FallbackLevel::Primary, failing("503"))
        .handler(FallbackLevel::LocalCache, failing("miss"))
        .build();

    let err = chain.execute("p".to_string()).await.unwrap_err();
    let errors: Vec<_> = err.failures().iter().map(|f| f.error.as_str()).collect();
    assert_eq!(errors, vec!["503", "miss"]);
    assert_eq!(
        err.to_string(),
        "all fallback levels exhausted for 'pricing' (attempted: primary, local_cache)"
    );

    let unified: ResilienceError<String> = err.into();
    match unified {
        ResilienceError::FallbackExhausted { name, attempted } => {
            assert_eq!(name, "pricing");
            assert_eq!(attempted, vec!["primary", "local_cache"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_chain_is_exhausted_without_attempts() {
    let chain = Chain::new("empty");

    let err = chain.execute("x".to_string()).await.unwrap_err();
    assert!(err.failures().is_empty());
    assert!(err.to_string().contains("no handlers bound"));
}

#[tokio::test]
async fn each_level_receives_the_original_request() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s1 = Arc::clone(&seen);
    let s2 = Arc::clone(&seen);

    let chain: Chain = FallbackChain::builder()
        .handler(FallbackLevel::Primary, move |req: String| {
            s1.lock().unwrap().push(req);
            futures::future::ready(Err("down".to_string()))
        })
        .handler(FallbackLevel::Replica, move |req: String| {
            s2.lock().unwrap().push(req.clone());
            futures::future::ready(Ok(req))
        })
        .build();

    chain.execute("order-7".to_string()).await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["order-7", "order-7"]);
}
