use std::time::Duration;

use cambio::Cambio;
use cambio_mock::{MockBehavior, fixtures};
use tokio::time::Instant;

use crate::helpers::{entity_ids, mock, quick_builder, statement_batch};

#[tokio::test(start_paused = true)]
async fn worker_pool_bounds_in_flight_fetches() {
    let (a, ctrl) = mock("a");
    ctrl.set_default(MockBehavior::Return(fixtures::income_statements(
        "ANY",
        "USD",
        2022..=2023,
    )))
    .await;
    ctrl.set_latency(Duration::from_secs(1), Duration::from_secs(1))
        .await;
    let cambio = quick_builder()
        .with_provider(a)
        .concurrency(3)
        .build()
        .unwrap();

    let report = cambio
        .resolve_all(&statement_batch(&entity_ids(20)))
        .await
        .unwrap();

    assert_eq!(report.dataset.entity_count(), 20);
    assert_eq!(ctrl.max_in_flight(), 3);
}

#[tokio::test(start_paused = true)]
async fn launches_are_staggered() {
    let (a, ctrl) = mock("a");
    ctrl.set_default(MockBehavior::Return(fixtures::income_statements(
        "ANY",
        "USD",
        2022..=2023,
    )))
    .await;
    let cambio = Cambio::builder()
        .with_provider(a)
        .stagger(Duration::from_millis(100))
        .build()
        .unwrap();

    let started = Instant::now();
    let report = cambio
        .resolve_all(&statement_batch(&entity_ids(5)))
        .await
        .unwrap();

    assert_eq!(report.dataset.entity_count(), 5);
    assert!(started.elapsed() >= Duration::from_millis(400));
}
