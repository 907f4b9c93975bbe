#![allow(dead_code)]

use std::sync::Arc;

use cambio::{Dataset, Provider};
use cambio_http::{Endpoint, RestProvider};
use cambio_mock::{MockBehavior, MockProvider, fixtures};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// REST provider serving income statements, or a scripted mock when
/// `CAMBIO_EXAMPLES_USE_MOCK` is set (CI has no API keys).
pub async fn statements_provider(
    name: &'static str,
    base_url: &str,
    key_var: &str,
) -> Result<Arc<dyn Provider>, cambio::CambioError> {
    if std::env::var("CAMBIO_EXAMPLES_USE_MOCK").is_ok() {
        println!("--- (Using mock provider '{name}') ---");
        let (p, ctrl) = MockProvider::new_with_controller(name);
        for (id, cur) in [("AAPL", "USD"), ("SAP", "EUR"), ("TM", "JPY")] {
            ctrl.set_behavior(
                cambio::Entity::new(id)?,
                MockBehavior::Return(fixtures::income_statements(id, cur, 2019..=2023)),
            )
            .await;
        }
        return Ok(p);
    }
    let p = RestProvider::builder(name)
        .base_url(base_url)
        .api_key_from_env(key_var)
        .endpoint(
            Dataset::IncomeStatement,
            Endpoint::new("income-statement/{entity}")
                .query("period", "{period}")
                .query("from", "{start}")
                .query("to", "{end}"),
        )
        .build()?;
    Ok(Arc::new(p))
}
