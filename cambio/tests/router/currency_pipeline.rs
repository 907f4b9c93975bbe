use cambio::{Currency, Dataset, Interval, Table};
use cambio_mock::{MockBehavior, MockProvider, fixtures};

use crate::helpers::{AAPL, SAP, TM, d, e, mock, quick_builder, serve_statements, statements};

fn usd() -> Currency {
    Currency::new("USD").unwrap()
}

#[tokio::test(start_paused = true)]
async fn statements_are_converted_with_fetched_fx() {
    let (a, ctrl) = mock("a");
    serve_statements(&ctrl, SAP, "EUR").await;
    serve_statements(&ctrl, AAPL, "USD").await;
    serve_statements(&ctrl, TM, "JPY").await;
    ctrl.set_behavior(
        e("EURUSD"),
        MockBehavior::Return(fixtures::fx_closes(d(2021, 1, 1), 3 * 366, 1.1)),
    )
    .await;
    // JPYUSD has no rule and resolves to an empty payload.
    let cambio = quick_builder().with_provider(a).build().unwrap();

    let report = cambio
        .resolve_all(&[statements(SAP), statements(AAPL), statements(TM)])
        .await
        .unwrap();
    let before = report.dataset;
    let (after, fx) = cambio
        .normalize_currency(&before, &usd(), &["eps"])
        .await
        .unwrap();

    assert_eq!(fx.converted, vec![e(SAP)]);
    assert_eq!(fx.unchanged, vec![e(AAPL)]);
    assert_eq!(fx.unresolved, vec![e(TM)]);
    assert!(!fx.is_complete());

    let sap = e(SAP);
    let revenue_before = before.series(&sap, "revenue").unwrap();
    let revenue_after = after.series(&sap, "revenue").unwrap();
    for (b, a) in revenue_before.iter().zip(revenue_after) {
        assert_eq!(b.map(|x| x * 1.1), *a);
    }
    assert_eq!(before.series(&sap, "eps"), after.series(&sap, "eps"));
    assert_eq!(after.currency(&sap).map(Currency::as_str), Some("USD"));

    // Untouched entities keep their values and currency.
    assert_eq!(before.series(&e(AAPL), "revenue"), after.series(&e(AAPL), "revenue"));
    assert_eq!(after.currency(&e(TM)).map(Currency::as_str), Some("JPY"));
    assert_eq!(ctrl.attempts(&e("JPYUSD")).await, 1);
}

#[tokio::test(start_paused = true)]
async fn hidden_lookback_period_uses_its_own_rate() {
    let (a, ctrl) = mock("a");
    serve_statements(&ctrl, SAP, "EUR").await;
    // 1.0 through 2021, 1.1 afterwards.
    let mut rows = fixtures::fx_closes(d(2021, 1, 1), 365, 1.0).into_rows();
    rows.extend(fixtures::fx_closes(d(2022, 1, 1), 730, 1.1).into_rows());
    ctrl.set_behavior(e("EURUSD"), MockBehavior::Return(Table::from_rows(rows)))
        .await;
    let cambio = quick_builder().with_provider(a).build().unwrap();

    let report = cambio
        .download()
        .symbols(&[SAP])
        .unwrap()
        .dataset(Dataset::IncomeStatement)
        .interval(Interval::Yearly)
        .window(Some(d(2022, 1, 1)), None)
        .lookback(true)
        .run()
        .await
        .unwrap();
    let (after, fx) = cambio
        .normalize_currency(&report.dataset, &usd(), &[])
        .await
        .unwrap();
    assert_eq!(fx.converted, vec![e(SAP)]);

    let source = fixtures::income_statements(SAP, "EUR", 2021..=2023);
    let revenue = |year| {
        source
            .rows()
            .iter()
            .find(|r| r.date == d(year, 12, 31))
            .and_then(|r| r.get("revenue"))
            .unwrap()
    };
    let deltas = after.period_over_period(&e(SAP), "revenue").unwrap();
    assert_eq!(deltas[0], Some(revenue(2022) * 1.1 - revenue(2021) * 1.0));
}

#[tokio::test(start_paused = true)]
async fn same_currency_dataset_needs_no_fx_requests() {
    let (a, ctrl) = mock("a");
    serve_statements(&ctrl, AAPL, "USD").await;
    let cambio = quick_builder().with_provider(a).build().unwrap();

    let report = cambio.resolve_all(&[statements(AAPL)]).await.unwrap();
    let attempts_before = ctrl.total_attempts().await;
    let (after, fx) = cambio
        .normalize_currency(&report.dataset, &usd(), &[])
        .await
        .unwrap();

    assert_eq!(after, report.dataset);
    assert!(fx.is_complete());
    assert_eq!(ctrl.total_attempts().await, attempts_before);
}

#[tokio::test(start_paused = true)]
async fn missing_price_provider_leaves_entities_unresolved() {
    let (statements_only, ctrl) =
        MockProvider::supporting("fundamentals", &[Dataset::IncomeStatement]);
    serve_statements(&ctrl, SAP, "EUR").await;
    let cambio = quick_builder()
        .with_provider(statements_only)
        .build()
        .unwrap();

    let report = cambio
        .download()
        .symbols(&[SAP])
        .unwrap()
        .dataset(Dataset::IncomeStatement)
        .interval(Interval::Yearly)
        .run()
        .await
        .unwrap();
    let (after, fx) = cambio
        .normalize_currency(&report.dataset, &usd(), &[])
        .await
        .unwrap();

    assert_eq!(fx.unresolved, vec![e(SAP)]);
    assert_eq!(after, report.dataset);
}
