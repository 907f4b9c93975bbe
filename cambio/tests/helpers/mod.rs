// Shared fixtures for the orchestrator integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use cambio::{Cambio, CambioBuilder, Dataset, Entity, Interval, Provider, RequestSpec};
use cambio_mock::{MockBehavior, MockController, MockProvider, fixtures};
use chrono::NaiveDate;

pub const AAPL: &str = "AAPL";
pub const SAP: &str = "SAP";
pub const TM: &str = "TM";

pub fn e(s: &str) -> Entity {
    Entity::new(s).expect("valid static test entity")
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid test date")
}

/// Yearly income-statement request for `entity`.
pub fn statements(entity: &str) -> RequestSpec {
    RequestSpec::builder(e(entity))
        .dataset(Dataset::IncomeStatement)
        .interval(Interval::Yearly)
        .build()
        .expect("valid test request")
}

pub fn statement_batch(entities: &[String]) -> Vec<RequestSpec> {
    entities.iter().map(|s| statements(s)).collect()
}

/// `n` distinct entity identifiers: `E000`, `E001`, ...
pub fn entity_ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("E{i:03}")).collect()
}

pub fn mock(name: &'static str) -> (Arc<dyn Provider>, MockController) {
    MockProvider::new_with_controller(name)
}

/// Builder without launch stagger, so paused-clock tests stay short.
pub fn quick_builder() -> CambioBuilder {
    Cambio::builder().stagger(Duration::ZERO)
}

pub async fn serve_statements(ctrl: &MockController, entity: &str, currency: &str) {
    ctrl.set_behavior(
        e(entity),
        MockBehavior::Return(fixtures::income_statements(entity, currency, 2021..=2023)),
    )
    .await;
}

/// Route `tracing` output through the test harness; honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
