use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;

use cambio_core::{
    Dataset, Entity, ErrorKind, FetchContext, FetchOutcome, Provider, RequestSpec, RetryOutcome,
    Table, fetch_with_retry,
};

/// Instruction for how the mock answers one entity.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return the table.
    Return(Table),
    /// Succeed with an empty payload.
    Empty,
    /// Fail with the given kind.
    Fail(ErrorKind),
    /// Never answer (simulate a stalled connection).
    Hang,
    /// One behavior per attempt; the last one repeats once the script runs out.
    Sequence(Vec<MockBehavior>),
}

impl MockBehavior {
    fn for_attempt(&self, attempt: u32) -> &Self {
        match self {
            Self::Sequence(steps) => {
                let idx = usize::try_from(attempt.saturating_sub(1)).unwrap_or(usize::MAX);
                steps
                    .get(idx)
                    .or_else(|| steps.last())
                    .map_or(&Self::Empty, |step| step.for_attempt(attempt))
            }
            other => other,
        }
    }
}

#[derive(Default)]
struct InternalState {
    rules: HashMap<Entity, MockBehavior>,
    fallback: Option<MockBehavior>,
    attempts: HashMap<Entity, u32>,
    latency: Option<(Duration, Duration)>,
}

#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

struct InFlight<'a>(&'a Gauge);

impl<'a> InFlight<'a> {
    fn enter(gauge: &'a Gauge) -> Self {
        let now = gauge.current.fetch_add(1, Ordering::SeqCst) + 1;
        gauge.peak.fetch_max(now, Ordering::SeqCst);
        Self(gauge)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Controller handle used by tests to drive a [`MockProvider`] from the outside.
#[derive(Clone)]
pub struct MockController {
    state: Arc<Mutex<InternalState>>,
    gauge: Arc<Gauge>,
}

impl MockController {
    /// Set the behavior for one entity.
    pub async fn set_behavior(&self, entity: Entity, behavior: MockBehavior) {
        let mut guard = self.state.lock().await;
        guard.rules.insert(entity, behavior);
    }

    /// Behavior for entities without a specific rule (default: empty payload).
    pub async fn set_default(&self, behavior: MockBehavior) {
        let mut guard = self.state.lock().await;
        guard.fallback = Some(behavior);
    }

    /// Sleep a random duration in `[min, max]` before answering each attempt.
    pub async fn set_latency(&self, min: Duration, max: Duration) {
        let mut guard = self.state.lock().await;
        guard.latency = Some((min, max.max(min)));
    }

    /// Attempts made for `entity`.
    pub async fn attempts(&self, entity: &Entity) -> u32 {
        let guard = self.state.lock().await;
        guard.attempts.get(entity).copied().unwrap_or(0)
    }

    /// Attempts made across all entities.
    pub async fn total_attempts(&self) -> u32 {
        let guard = self.state.lock().await;
        guard.attempts.values().sum()
    }

    /// Peak number of attempts in flight at the same time.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.gauge.peak.load(Ordering::SeqCst)
    }

    /// Clear all behaviors, latency and counters.
    pub async fn clear_all(&self) {
        let mut guard = self.state.lock().await;
        *guard = InternalState::default();
        self.gauge.peak.store(0, Ordering::SeqCst);
    }
}

/// A provider that defers all behavior to a [`MockController`].
pub struct MockProvider {
    name: &'static str,
    datasets: Option<Vec<Dataset>>,
    state: Arc<Mutex<InternalState>>,
    gauge: Arc<Gauge>,
}

impl MockProvider {
    /// Create a mock serving every dataset, and its controller.
    #[must_use]
    pub fn new_with_controller(name: &'static str) -> (Arc<dyn Provider>, MockController) {
        Self::build(name, None)
    }

    /// Create a mock serving only `datasets`, and its controller.
    #[must_use]
    pub fn supporting(
        name: &'static str,
        datasets: &[Dataset],
    ) -> (Arc<dyn Provider>, MockController) {
        Self::build(name, Some(datasets.to_vec()))
    }

    fn build(
        name: &'static str,
        datasets: Option<Vec<Dataset>>,
    ) -> (Arc<dyn Provider>, MockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let gauge = Arc::new(Gauge::default());
        let controller = MockController {
            state: Arc::clone(&state),
            gauge: Arc::clone(&gauge),
        };
        let me = Arc::new(Self {
            name,
            datasets,
            state,
            gauge,
        });
        (me as Arc<dyn Provider>, controller)
    }

    async fn attempt(&self, spec: &RequestSpec, attempt: u32) -> FetchOutcome {
        let entity = spec.entity();
        let _in_flight = InFlight::enter(&self.gauge);
        // Snapshot the rule without holding the lock across await points
        let (behavior, latency) = {
            let mut guard = self.state.lock().await;
            *guard.attempts.entry(entity.clone()).or_default() += 1;
            let behavior = guard
                .rules
                .get(entity)
                .or(guard.fallback.as_ref())
                .cloned()
                .unwrap_or(MockBehavior::Empty);
            (behavior, guard.latency)
        };
        if let Some((min, max)) = latency {
            let wait = if max > min {
                rand::rng().random_range(min..=max)
            } else {
                min
            };
            tokio::time::sleep(wait).await;
        }
        match behavior.for_attempt(attempt) {
            MockBehavior::Return(table) => FetchOutcome::Success {
                table: within_window(table, spec),
                provider: self.name,
            },
            MockBehavior::Empty | MockBehavior::Sequence(_) => FetchOutcome::Success {
                table: Table::new(),
                provider: self.name,
            },
            MockBehavior::Fail(kind) => FetchOutcome::Failure(*kind),
            MockBehavior::Hang => std::future::pending().await,
        }
    }
}

/// Rows of `table` inside the request's fetch window, like a provider honoring
/// `from`/`to` parameters.
fn within_window(table: &Table, spec: &RequestSpec) -> Table {
    let (from, to) = (spec.fetch_start(), spec.end());
    if from.is_none() && to.is_none() {
        return table.clone();
    }
    let rows = table
        .rows()
        .iter()
        .filter(|r| from.is_none_or(|f| r.date >= f) && to.is_none_or(|t| r.date <= t))
        .cloned()
        .collect();
    let kept = Table::from_rows(rows);
    match table.currency() {
        Some(c) => kept.with_currency(c.clone()),
        None => kept,
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    fn supports(&self, dataset: Dataset) -> bool {
        self.datasets
            .as_ref()
            .is_none_or(|list| list.contains(&dataset))
    }

    async fn fetch(&self, spec: &RequestSpec, ctx: &FetchContext) -> RetryOutcome {
        fetch_with_retry(self.name, &ctx.retry, &ctx.cancel, |n| self.attempt(spec, n))
        .await
    }
}
