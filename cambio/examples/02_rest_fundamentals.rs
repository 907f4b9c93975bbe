use std::time::Duration;

use cambio::{Cambio, Currency, Dataset, Interval, ProviderBuilder};

mod common;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    common::init_tracing();

    // 1. Two REST providers; a rejected key takes a provider out of rotation for an hour.
    let primary = common::statements_provider(
        "primary",
        "https://financialmodelingprep.com/api/v3/",
        "PRIMARY_API_KEY",
    )
    .await?;
    let secondary = common::statements_provider(
        "secondary",
        "https://api.example.com/v1/",
        "SECONDARY_API_KEY",
    )
    .await?;
    let primary = ProviderBuilder::new(primary)
        .with_blacklist(Duration::from_secs(3600))
        .build();

    // 2. Wait out rate limits instead of failing over.
    let cambio = Cambio::builder()
        .with_provider(primary)
        .with_provider(secondary)
        .backoff_on_rate_limit(true)
        .request_timeout(Duration::from_secs(900))
        .build()?;

    let report = cambio
        .download()
        .symbols(&["AAPL", "SAP", "TM"])?
        .dataset(Dataset::IncomeStatement)
        .interval(Interval::Yearly)
        .lookback(true)
        .run()
        .await?;

    // 3. Bring everything into USD; per-share figures are left alone.
    let usd = Currency::new("USD")?;
    let (in_usd, fx) = cambio
        .normalize_currency(&report.dataset, &usd, &["eps", "epsdiluted"])
        .await?;

    for entity in in_usd.entities() {
        let revenue = in_usd.series(entity, "revenue").unwrap_or_default();
        println!("{entity} revenue ({:?}): {revenue:?}", in_usd.currency(entity));
    }
    println!("converted: {:?}, unresolved: {:?}", fx.converted, fx.unresolved);
    for line in report.failures.summary_lines() {
        println!("failed: {line}");
    }
    Ok(())
}
