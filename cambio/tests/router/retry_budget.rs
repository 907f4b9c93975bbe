use std::time::Duration;

use cambio::{ErrorKind, RetryPolicy};
use cambio_mock::{MockBehavior, fixtures};
use tokio::time::Instant;

use crate::helpers::{SAP, e, mock, quick_builder, statements};

#[tokio::test(start_paused = true)]
async fn rate_limit_uses_full_budget_with_backoff() {
    let (a, ctrl) = mock("a");
    ctrl.set_default(MockBehavior::Fail(ErrorKind::RateLimited))
        .await;
    let cambio = quick_builder()
        .with_provider(a)
        .backoff_on_rate_limit(true)
        .build()
        .unwrap();

    let started = Instant::now();
    let result = cambio.resolve_entity(&statements(SAP)).await;

    assert_eq!(result.outcome.failure_kind(), Some(ErrorKind::RateLimited));
    assert_eq!(result.provenance.attempts, 12);
    assert_eq!(ctrl.attempts(&e(SAP)).await, 12);
    // 11 fixed waits of 5 s between 12 attempts.
    assert!(started.elapsed() >= Duration::from_secs(55));
}

#[tokio::test(start_paused = true)]
async fn rate_limit_without_backoff_moves_on_after_one_attempt() {
    let (a, a_ctrl) = mock("a");
    let (b, b_ctrl) = mock("b");
    a_ctrl
        .set_default(MockBehavior::Fail(ErrorKind::RateLimited))
        .await;
    b_ctrl
        .set_default(MockBehavior::Return(fixtures::income_statements(
            SAP,
            "EUR",
            2021..=2023,
        )))
        .await;
    let cambio = quick_builder()
        .with_provider(a)
        .with_provider(b)
        .build()
        .unwrap();

    let result = cambio.resolve_entity(&statements(SAP)).await;

    assert_eq!(a_ctrl.attempts(&e(SAP)).await, 1);
    assert_eq!(result.provenance.provider, Some("b"));
    assert_eq!(
        result.provenance.skipped,
        vec![("a", ErrorKind::RateLimited)]
    );
}

#[tokio::test(start_paused = true)]
async fn terminal_kinds_short_circuit() {
    for kind in [
        ErrorKind::InvalidCredential,
        ErrorKind::SubscriptionRequired,
        ErrorKind::RegionRestricted,
        ErrorKind::NotAvailable,
    ] {
        let (a, ctrl) = mock("a");
        ctrl.set_default(MockBehavior::Fail(kind)).await;
        let cambio = quick_builder()
            .with_provider(a)
            .backoff_on_rate_limit(true)
            .build()
            .unwrap();

        let result = cambio.resolve_entity(&statements(SAP)).await;

        assert_eq!(result.outcome.failure_kind(), Some(kind));
        assert_eq!(ctrl.attempts(&e(SAP)).await, 1, "{kind} must not be retried");
    }
}

#[tokio::test(start_paused = true)]
async fn transient_blips_are_retried_under_a_custom_policy() {
    let (a, ctrl) = mock("a");
    ctrl.set_behavior(
        e(SAP),
        MockBehavior::Sequence(vec![
            MockBehavior::Fail(ErrorKind::TransientNetwork),
            MockBehavior::Fail(ErrorKind::TransientNetwork),
            MockBehavior::Return(fixtures::income_statements(SAP, "EUR", 2021..=2023)),
        ]),
    )
    .await;
    let cambio = quick_builder()
        .with_provider(a)
        .retry_policy(
            RetryPolicy::default()
                .with_max_attempts(3)
                .with_delay(Duration::from_secs(1)),
        )
        .build()
        .unwrap();

    let result = cambio.resolve_entity(&statements(SAP)).await;

    assert!(result.outcome.is_usable());
    assert_eq!(result.provenance.attempts, 3);
    assert_eq!(result.provenance.retries(), 2);
}
