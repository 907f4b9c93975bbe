use std::time::Duration;

use cambio::{BatchReport, ErrorKind};
use cambio_mock::{MockBehavior, fixtures};
use proptest::prelude::*;

use crate::helpers::{e, entity_ids, mock, quick_builder, statement_batch};

async fn run(fail_mask: &[bool], concurrency: usize, jitter: bool) -> BatchReport {
    let (a, ctrl) = mock("a");
    let ids = entity_ids(fail_mask.len());
    for (id, fails) in ids.iter().zip(fail_mask) {
        let behavior = if *fails {
            MockBehavior::Fail(ErrorKind::NotAvailable)
        } else {
            MockBehavior::Return(fixtures::income_statements(id, "USD", 2020..=2023))
        };
        ctrl.set_behavior(e(id), behavior).await;
    }
    if jitter {
        ctrl.set_latency(Duration::ZERO, Duration::from_millis(4))
            .await;
    }
    let cambio = quick_builder()
        .with_provider(a)
        .concurrency(concurrency)
        .build()
        .unwrap();
    cambio.resolve_all(&statement_batch(&ids)).await.unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn completion_order_does_not_change_the_dataset(
        fail_mask in proptest::collection::vec(any::<bool>(), 1..12),
        concurrency in 1usize..6,
    ) {
        let (sequential, shuffled) = tokio_test::block_on(async {
            let sequential = run(&fail_mask, 1, false).await;
            let shuffled = run(&fail_mask, concurrency, true).await;
            (sequential, shuffled)
        });
        prop_assert_eq!(&sequential.dataset, &shuffled.dataset);
        prop_assert_eq!(&sequential.failures, &shuffled.failures);

        let failed = fail_mask.iter().filter(|f| **f).count();
        prop_assert_eq!(shuffled.dataset.entity_count(), fail_mask.len() - failed);
        prop_assert_eq!(shuffled.failures.entity_count(), failed);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_runtime_matches_sequential_run() {
    let mask: Vec<bool> = (0..24).map(|i| i % 5 == 3).collect();
    let sequential = run(&mask, 1, false).await;
    for _ in 0..3 {
        let parallel = run(&mask, 8, true).await;
        assert_eq!(parallel.dataset, sequential.dataset);
        assert_eq!(parallel.failures, sequential.failures);
    }
}
