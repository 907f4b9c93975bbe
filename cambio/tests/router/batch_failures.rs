use cambio::{Currency, ErrorKind, Interval, Table};
use cambio_mock::{MockBehavior, fixtures};

use crate::helpers::{
    d, e, entity_ids, init_tracing, mock, quick_builder, statement_batch, statements,
};

#[tokio::test(start_paused = true)]
async fn credential_failures_are_reported_once() {
    init_tracing();
    let (a, ctrl) = mock("a");
    ctrl.set_default(MockBehavior::Return(fixtures::income_statements(
        "ANY",
        "USD",
        2021..=2023,
    )))
    .await;
    let ids = entity_ids(100);
    let rejected = ["E007", "E023", "E042", "E068", "E099"];
    for id in rejected {
        ctrl.set_behavior(e(id), MockBehavior::Fail(ErrorKind::InvalidCredential))
            .await;
    }

    let cambio = quick_builder()
        .with_provider(a)
        .concurrency(16)
        .build()
        .unwrap();
    let report = cambio.resolve_all(&statement_batch(&ids)).await.unwrap();

    assert_eq!(report.dataset.entity_count(), 95);
    assert_eq!(report.failures.entries().len(), 1);
    let entry = report.failures.entry(ErrorKind::InvalidCredential).unwrap();
    let listed: Vec<&str> = entry.entities.iter().map(|x| x.as_str()).collect();
    assert_eq!(listed, rejected);

    // Entity axis is the request order minus the failures.
    let expected: Vec<String> = ids
        .iter()
        .filter(|id| !rejected.contains(&id.as_str()))
        .cloned()
        .collect();
    let got: Vec<String> = report
        .dataset
        .entities()
        .map(|x| x.as_str().to_string())
        .collect();
    assert_eq!(got, expected);
    for id in &ids {
        let entity = e(id);
        assert_ne!(
            report.dataset.contains(&entity),
            report.failures.contains(&entity)
        );
    }
    assert_eq!(report.provenance.len(), 100);
}

#[tokio::test(start_paused = true)]
async fn overlapping_periods_are_deduplicated() {
    let (a, ctrl) = mock("a");
    ctrl.set_behavior(
        e("AAA"),
        MockBehavior::Return(fixtures::income_statements("AAA", "USD", 2021..=2023)),
    )
    .await;
    // BBB files its 2022 statement one day earlier than AAA.
    let mut bbb = fixtures::income_statements("BBB", "USD", 2022..=2023).into_rows();
    for row in &mut bbb {
        if row.date == d(2022, 12, 31) {
            row.date = d(2022, 12, 30);
        }
    }
    ctrl.set_behavior(
        e("BBB"),
        MockBehavior::Return(Table::from_rows(bbb).with_currency(Currency::new("USD").unwrap())),
    )
    .await;

    let cambio = quick_builder().with_provider(a).build().unwrap();
    let report = cambio
        .resolve_all(&[statements("AAA"), statements("BBB")])
        .await
        .unwrap();

    let ds = &report.dataset;
    assert_eq!(ds.interval(), Interval::Yearly);
    assert_eq!(ds.periods().len(), 3);
    assert_eq!(ds.labels(), vec!["2021", "2022", "2023"]);
    assert_eq!(ds.series(&e("BBB"), "revenue").unwrap()[0], None);
    assert!(ds.series(&e("BBB"), "revenue").unwrap()[1].is_some());
    assert!(ds.series(&e("AAA"), "revenue").unwrap()[0].is_some());
    assert!(report.failures.is_empty());
}

#[tokio::test(start_paused = true)]
async fn every_failure_kind_gets_one_entry() {
    let (a, ctrl) = mock("a");
    ctrl.set_behavior(e("X1"), MockBehavior::Fail(ErrorKind::RegionRestricted))
        .await;
    ctrl.set_behavior(e("X2"), MockBehavior::Fail(ErrorKind::SubscriptionRequired))
        .await;
    ctrl.set_behavior(e("X3"), MockBehavior::Fail(ErrorKind::RegionRestricted))
        .await;
    // X4 has no rule and answers with an empty payload.

    let cambio = quick_builder().with_provider(a).build().unwrap();
    let ids: Vec<String> = ["X1", "X2", "X3", "X4"].map(String::from).to_vec();
    let report = cambio.resolve_all(&statement_batch(&ids)).await.unwrap();

    assert!(report.dataset.is_empty());
    assert_eq!(report.failures.entity_count(), 4);
    let kinds: Vec<ErrorKind> = report.failures.entries().iter().map(|x| x.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ErrorKind::RegionRestricted,
            ErrorKind::SubscriptionRequired,
            ErrorKind::NoData
        ]
    );
    assert_eq!(
        report
            .failures
            .entry(ErrorKind::RegionRestricted)
            .unwrap()
            .entities,
        vec![e("X1"), e("X3")]
    );
}
