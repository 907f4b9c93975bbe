use std::time::Duration;

use cambio::{Cambio, Dataset, ErrorKind, Interval};
use cambio_mock::{MockBehavior, MockProvider, fixtures};

mod common;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    common::init_tracing();

    // 1. A primary provider that throttles some entities and a backup that has everything.
    let (primary, primary_ctrl) = MockProvider::new_with_controller("primary");
    let (backup, backup_ctrl) = MockProvider::new_with_controller("backup");
    let ids = ["AAPL", "MSFT", "SAP", "TM", "NESN"];
    for (i, id) in ids.iter().enumerate() {
        let table = fixtures::income_statements(id, "USD", 2019..=2023);
        backup_ctrl
            .set_behavior(cambio::Entity::new(id)?, MockBehavior::Return(table.clone()))
            .await;
        let behavior = if i % 2 == 0 {
            MockBehavior::Return(table)
        } else {
            MockBehavior::Fail(ErrorKind::RateLimited)
        };
        primary_ctrl
            .set_behavior(cambio::Entity::new(id)?, behavior)
            .await;
    }
    primary_ctrl
        .set_latency(Duration::from_millis(5), Duration::from_millis(40))
        .await;

    // 2. Without backoff a rate-limited entity moves straight to the backup.
    let cambio = Cambio::builder()
        .with_provider(primary)
        .with_provider(backup)
        .concurrency(3)
        .stagger(Duration::from_millis(10))
        .build()?;

    let report = cambio
        .download()
        .symbols(&ids)?
        .dataset(Dataset::IncomeStatement)
        .interval(Interval::Yearly)
        .run()
        .await?;

    println!("periods: {:?}", report.dataset.labels());
    for (entity, prov) in &report.provenance {
        println!(
            " - {entity}: served by {:?} after {} attempt(s), skipped {:?}",
            prov.provider, prov.total_attempts, prov.skipped
        );
    }
    for line in report.failures.summary_lines() {
        println!("failed: {line}");
    }
    Ok(())
}
