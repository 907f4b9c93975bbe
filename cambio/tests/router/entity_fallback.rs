use std::sync::Arc;

use cambio::{Dataset, ErrorKind, FetchOutcome};
use cambio_mock::{MockBehavior, MockProvider};

use crate::helpers::{SAP, e, mock, quick_builder, serve_statements, statements};

#[tokio::test(start_paused = true)]
async fn empty_payload_falls_back_to_next_provider() {
    let (a, _a_ctrl) = mock("a");
    let (b, b_ctrl) = mock("b");
    serve_statements(&b_ctrl, SAP, "EUR").await;

    let cambio = quick_builder()
        .with_provider(a)
        .with_provider(b)
        .build()
        .unwrap();
    let result = cambio.resolve_entity(&statements(SAP)).await;

    assert!(result.outcome.is_usable());
    assert!(matches!(result.outcome, FetchOutcome::Success { provider: "b", .. }));
    assert_eq!(result.provenance.provider, Some("b"));
    assert_eq!(result.provenance.skipped, vec![("a", ErrorKind::NoData)]);
    assert_eq!(result.provenance.total_attempts, 2);
    assert_eq!(result.provenance.retries(), 0);
}

#[tokio::test(start_paused = true)]
async fn first_usable_provider_stops_the_chain() {
    let (a, a_ctrl) = mock("a");
    let (b, b_ctrl) = mock("b");
    serve_statements(&a_ctrl, SAP, "EUR").await;
    serve_statements(&b_ctrl, SAP, "EUR").await;

    let cambio = quick_builder()
        .with_provider(a)
        .with_provider(b)
        .build()
        .unwrap();
    let result = cambio.resolve_entity(&statements(SAP)).await;

    assert_eq!(result.provenance.provider, Some("a"));
    assert_eq!(b_ctrl.attempts(&e(SAP)).await, 0);
}

#[tokio::test(start_paused = true)]
async fn shared_terminal_kind_is_kept() {
    let (a, a_ctrl) = mock("a");
    let (b, b_ctrl) = mock("b");
    a_ctrl
        .set_default(MockBehavior::Fail(ErrorKind::InvalidCredential))
        .await;
    b_ctrl
        .set_default(MockBehavior::Fail(ErrorKind::InvalidCredential))
        .await;

    let cambio = quick_builder()
        .with_provider(a)
        .with_provider(b)
        .build()
        .unwrap();
    let result = cambio.resolve_entity(&statements(SAP)).await;

    assert_eq!(
        result.outcome.failure_kind(),
        Some(ErrorKind::InvalidCredential)
    );
    assert_eq!(result.provenance.provider, None);
    assert_eq!(result.provenance.total_attempts, 2);
}

#[tokio::test(start_paused = true)]
async fn mixed_failures_collapse_to_no_data() {
    let (a, a_ctrl) = mock("a");
    let (b, _b_ctrl) = mock("b");
    a_ctrl
        .set_default(MockBehavior::Fail(ErrorKind::SubscriptionRequired))
        .await;

    let cambio = quick_builder()
        .with_provider(a)
        .with_provider(b)
        .build()
        .unwrap();
    let result = cambio.resolve_entity(&statements(SAP)).await;

    assert_eq!(result.outcome.failure_kind(), Some(ErrorKind::NoData));
    assert_eq!(
        result.provenance.skipped,
        vec![
            ("a", ErrorKind::SubscriptionRequired),
            ("b", ErrorKind::NoData)
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn unsupported_provider_is_skipped_without_attempt() {
    let (prices_only, prices_ctrl) = MockProvider::supporting("prices", &[Dataset::Prices]);
    let (full, full_ctrl) = mock("full");
    serve_statements(&prices_ctrl, SAP, "EUR").await;
    serve_statements(&full_ctrl, SAP, "EUR").await;

    let cambio = quick_builder()
        .with_provider(prices_only)
        .with_provider(full)
        .build()
        .unwrap();
    let result = cambio.resolve_entity(&statements(SAP)).await;

    assert_eq!(result.provenance.provider, Some("full"));
    assert!(result.provenance.skipped.is_empty());
    assert_eq!(prices_ctrl.total_attempts().await, 0);
}

#[tokio::test(start_paused = true)]
async fn entity_preference_changes_the_order() {
    let (a, a_ctrl) = mock("a");
    let (b, b_ctrl) = mock("b");
    serve_statements(&a_ctrl, SAP, "EUR").await;
    serve_statements(&b_ctrl, SAP, "EUR").await;

    let cambio = quick_builder()
        .with_provider(a)
        .with_provider(Arc::clone(&b))
        .prefer_entity(&e(SAP), &[b])
        .build()
        .unwrap();
    let result = cambio.resolve_entity(&statements(SAP)).await;

    assert_eq!(result.provenance.provider, Some("b"));
    assert_eq!(a_ctrl.attempts(&e(SAP)).await, 0);
}
