use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cambio::{CambioError, Dataset, Interval};
use cambio_core::{RawResponse, Transport, TransportFailure};
use cambio_http::{Endpoint, RestProvider};
use cambio_mock::MockProvider;
use chrono::NaiveDate;
use url::Url;

use crate::helpers::{AAPL, SAP, TM, d, e, mock, quick_builder, serve_statements};

#[tokio::test(start_paused = true)]
async fn download_resolves_in_request_order() {
    let (a, ctrl) = mock("a");
    for (id, cur) in [(TM, "JPY"), (AAPL, "USD"), (SAP, "EUR")] {
        serve_statements(&ctrl, id, cur).await;
    }
    let cambio = quick_builder().with_provider(a).build().unwrap();

    let report = cambio
        .download()
        .symbols(&[TM, AAPL, SAP])
        .unwrap()
        .dataset(Dataset::IncomeStatement)
        .interval(Interval::Yearly)
        .window(Some(d(2022, 1, 1)), None)
        .lookback(true)
        .run()
        .await
        .unwrap();

    let order: Vec<&str> = report.dataset.entities().map(|x| x.as_str()).collect();
    assert_eq!(order, vec![TM, AAPL, SAP]);
    assert_eq!(report.dataset.labels(), vec!["2022", "2023"]);
    // The hidden 2021 period feeds the first delta.
    let deltas = report
        .dataset
        .period_over_period(&e(SAP), "revenue")
        .unwrap();
    assert_eq!(deltas.len(), 2);
    assert!(deltas.iter().all(Option::is_some));
    assert_eq!(
        report.dataset.currency(&e(TM)).map(|c| c.as_str()),
        Some("JPY")
    );
}

/// Serves yearly statements and, like a real API, drops rows before `from`.
#[derive(Default)]
struct WindowedStatements {
    urls: Mutex<Vec<String>>,
}

#[async_trait]
impl Transport for WindowedStatements {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportFailure> {
        self.urls.lock().unwrap().push(url.to_string());
        let from = url
            .query_pairs()
            .find(|(k, _)| k == "from")
            .and_then(|(_, v)| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok());
        let rows: Vec<String> = [(2023, 130.0), (2022, 120.0), (2021, 109.0), (2020, 100.0)]
            .into_iter()
            .filter(|(year, _)| from.is_none_or(|f| d(*year, 12, 31) >= f))
            .map(|(year, revenue)| {
                format!(r#"{{"date":"{year}-12-31","reportedCurrency":"EUR","revenue":{revenue}}}"#)
            })
            .collect();
        Ok(RawResponse {
            status: 200,
            body: format!("[{}]", rows.join(",")),
        })
    }
}

#[tokio::test(start_paused = true)]
async fn lookback_period_is_requested_from_the_provider() {
    let transport = Arc::new(WindowedStatements::default());
    let rest = RestProvider::builder("rest")
        .base_url("https://api.test/v3/")
        .api_key("k")
        .endpoint(
            Dataset::IncomeStatement,
            Endpoint::new("income-statement/{entity}").query("from", "{start}"),
        )
        .transport(transport.clone())
        .build()
        .unwrap();
    let cambio = quick_builder().with_provider(Arc::new(rest)).build().unwrap();

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

    let urls = transport.urls.lock().unwrap().clone();
    assert_eq!(urls, vec!["https://api.test/v3/income-statement/SAP?from=2021-01-01&apikey=k"]);
    assert_eq!(report.dataset.labels(), vec!["2022", "2023"]);
    assert_eq!(
        report.dataset.period_over_period(&e(SAP), "revenue").unwrap(),
        vec![Some(11.0), Some(10.0)]
    );
}

#[test]
fn duplicate_entities_are_rejected_by_the_builder() {
    let (a, _) = mock("a");
    let cambio = quick_builder().with_provider(a).build().unwrap();
    let err = cambio.download().symbols(&[SAP, "sap"]).err().unwrap();
    assert!(matches!(err, CambioError::InvalidArg(_)));

    let err = cambio
        .download()
        .add_entity(e(SAP))
        .unwrap()
        .add_entity(e(SAP))
        .err()
        .unwrap();
    assert!(err.to_string().contains("duplicate entity 'SAP'"));
}

#[tokio::test]
async fn configuration_errors_are_raised_before_fetching() {
    let (a, ctrl) = mock("a");
    let cambio = quick_builder().with_provider(a).build().unwrap();

    let empty = cambio.download().run().await;
    assert!(matches!(empty, Err(CambioError::InvalidArg(_))));

    let inverted = cambio
        .download()
        .symbols(&[SAP])
        .unwrap()
        .window(Some(d(2024, 1, 1)), Some(d(2023, 1, 1)))
        .run()
        .await;
    assert!(matches!(inverted, Err(CambioError::InvalidArg(_))));
    assert_eq!(ctrl.total_attempts().await, 0);
}

#[tokio::test]
async fn dataset_without_any_provider_is_unsupported() {
    let (prices_only, ctrl) = MockProvider::supporting("prices", &[Dataset::Prices]);
    let cambio = quick_builder().with_provider(prices_only).build().unwrap();

    let result = cambio
        .download()
        .symbols(&[SAP])
        .unwrap()
        .dataset(Dataset::CashFlow)
        .run()
        .await;

    assert!(matches!(
        result,
        Err(CambioError::Unsupported { ref capability }) if capability == "cash_flow"
    ));
    assert_eq!(ctrl.total_attempts().await, 0);
}
