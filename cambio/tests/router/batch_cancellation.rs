use std::time::Duration;

use cambio::{CambioError, cancel_pair};
use cambio_mock::MockBehavior;

use crate::helpers::{e, entity_ids, mock, quick_builder, serve_statements, statement_batch};

#[tokio::test(start_paused = true)]
async fn cancel_returns_error_instead_of_partial_data() {
    let (a, ctrl) = mock("a");
    let ids = entity_ids(6);
    for id in &ids[..3] {
        serve_statements(&ctrl, id, "USD").await;
    }
    for id in &ids[3..] {
        ctrl.set_behavior(e(id), MockBehavior::Hang).await;
    }
    let cambio = quick_builder()
        .with_provider(a)
        .concurrency(2)
        .build()
        .unwrap();

    let (handle, signal) = cancel_pair();
    let specs = statement_batch(&ids);
    let batch = cambio.resolve_all_with_cancel(&specs, &signal);
    let trigger = async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        handle.cancel();
    };
    let (result, ()) = tokio::join!(batch, trigger);

    assert!(matches!(result, Err(CambioError::Cancelled { .. })));
}

#[tokio::test(start_paused = true)]
async fn already_cancelled_batch_sends_nothing() {
    let (a, ctrl) = mock("a");
    let ids = entity_ids(4);
    let cambio = quick_builder().with_provider(a).build().unwrap();

    let (handle, signal) = cancel_pair();
    handle.cancel();
    let result = cambio
        .resolve_all_with_cancel(&statement_batch(&ids), &signal)
        .await;

    assert!(matches!(result, Err(CambioError::Cancelled { .. })));
    assert_eq!(ctrl.total_attempts().await, 0);
}

#[tokio::test(start_paused = true)]
async fn batch_deadline_returns_request_timeout() {
    let (a, ctrl) = mock("a");
    ctrl.set_default(MockBehavior::Hang).await;
    let cambio = quick_builder()
        .with_provider(a)
        .request_timeout(Duration::from_secs(10))
        .build()
        .unwrap();

    let result = cambio.resolve_all(&statement_batch(&entity_ids(3))).await;

    assert!(matches!(
        result,
        Err(CambioError::RequestTimeout { ref capability }) if capability == "income_statement"
    ));
}
