use bulwark_bulkhead::{Bulkhead, BulkheadError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tower::{Layer, Service, ServiceBuilder, ServiceExt};

#[tokio::test]
async fn services_from_one_layer_share_permits() {
    let bulkhead = Bulkhead::builder()
        .name("search-backend")
        .max_concurrent_calls(1)
        .build();
    let layer = bulkhead.layer();

    let (release, gate) = oneshot::channel::<()>();
    let gate = Arc::new(tokio::sync::Mutex::new(Some(gate)));

    let slow = layer.layer(tower::service_fn(move |_: ()| {
        let gate = Arc::clone(&gate);
        async move {
            if let Some(rx) = gate.lock().await.take() {
                let _ = rx.await;
            }
            Ok::<_, String>("slow")
        }
    }));

    let inner_calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&inner_calls);
    let mut fast = ServiceBuilder::new()
        .layer(layer.clone())
        .service(tower::service_fn(move |_: ()| {
            c.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, String>("fast") }
        }));

    let pending = tokio::spawn(slow.oneshot(()));
    while bulkhead.active_calls() == 0 {
        tokio::task::yield_now().await;
    }

    let err = fast.ready().await.unwrap().call(()).await.unwrap_err();
    assert!(matches!(err, BulkheadError::Full(_)));
    assert_eq!(inner_calls.load(Ordering::SeqCst), 0);

    release.send(()).unwrap();
    assert_eq!(pending.await.unwrap().unwrap(), "slow");

    assert_eq!(fast.ready().await.unwrap().call(()).await.unwrap(), "fast");
    assert_eq!(bulkhead.stats().rejected_calls, 1);
}

#[tokio::test(start_paused = true)]
async fn layer_keeps_slow_responses() {
    let bulkhead = Bulkhead::builder().timeout(Duration::from_millis(10)).build();

    let service = bulkhead.layer().layer(tower::service_fn(|n: u32| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, String>(n + 1)
    }));

    assert_eq!(service.oneshot(41).await.unwrap(), 42);
}

#[tokio::test]
async fn inner_error_is_wrapped() {
    let service = Bulkhead::builder()
        .build()
        .layer()
        .layer(tower::service_fn(|_: ()| async { Err::<(), _>("refused".to_string()) }));

    match service.oneshot(()).await {
        Err(BulkheadError::Operation(msg)) => assert_eq!(msg, "refused"),
        other => panic!("unexpected: {:?}", other),
    }
}
