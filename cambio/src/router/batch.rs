use std::collections::HashSet;
use std::sync::Arc;

use cambio_core::{
    AggregateDataset, AggregateOptions, CambioError, CancelSignal, Entity, EntityResult, ErrorKind,
    FailureReport, FetchContext, FetchOutcome, Provenance, Provider, RequestSpec, aggregate,
};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;

use crate::Cambio;
use crate::router::entity::resolve_entity;

/// Result of a multi-entity request.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// Aligned dataset of every entity that resolved.
    pub dataset: AggregateDataset,
    /// Entities that did not resolve, grouped by failure kind.
    pub failures: FailureReport,
    /// Provenance of every requested entity, in request order.
    pub provenance: Vec<(Entity, Provenance)>,
}

impl BatchReport {
    /// Provenance recorded for `entity`.
    #[must_use]
    pub fn provenance_of(&self, entity: &Entity) -> Option<&Provenance> {
        self.provenance
            .iter()
            .find(|(e, _)| e == entity)
            .map(|(_, p)| p)
    }
}

struct Job {
    index: usize,
    spec: RequestSpec,
    providers: Vec<Arc<dyn Provider>>,
}

/// Check a batch before any network activity and return its shared shape.
fn validate_batch(specs: &[RequestSpec]) -> Result<&RequestSpec, CambioError> {
    let Some(first) = specs.first() else {
        return Err(CambioError::InvalidArg(
            "no entities specified for the batch".into(),
        ));
    };
    let mut seen = HashSet::new();
    for spec in specs {
        if !seen.insert(spec.entity()) {
            return Err(CambioError::InvalidArg(format!(
                "duplicate entity '{}' in batch",
                spec.entity()
            )));
        }
        if !spec.same_shape(first) {
            return Err(CambioError::InvalidArg(format!(
                "request for '{}' differs from the batch shape (dataset, interval, window)",
                spec.entity()
            )));
        }
    }
    Ok(first)
}

impl Cambio {
    /// Resolve every request concurrently and assemble one aligned dataset.
    ///
    /// Behavior:
    /// - Every request must share dataset, interval and window; entities must be unique.
    ///   Violations are rejected with `InvalidArg` before any request is sent.
    /// - Up to `concurrency` entities are resolved at once, with a fixed stagger
    ///   between launches. Each entity runs its own fallback chain.
    /// - A failing entity never aborts the batch; it is listed once under its kind in
    ///   [`BatchReport::failures`] and left out of the dataset.
    /// - Entity order in the dataset follows `specs`, not completion order.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an invalid batch, `Unsupported` when no provider
    /// serves the dataset, and `RequestTimeout` when the configured deadline elapses.
    pub async fn resolve_all(&self, specs: &[RequestSpec]) -> Result<BatchReport, CambioError> {
        self.resolve_all_with_cancel(specs, &CancelSignal::never())
            .await
    }

    /// Like [`resolve_all`](Self::resolve_all), observing `cancel`.
    ///
    /// When `cancel` fires, workers stop taking new entities, in-flight fetches end
    /// with `Cancelled` and the call returns `CambioError::Cancelled` rather than a
    /// partial dataset.
    ///
    /// # Errors
    /// As [`resolve_all`](Self::resolve_all), plus `Cancelled`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "cambio::router::resolve_all",
            skip(self, specs, cancel),
            fields(entities = specs.len()),
        )
    )]
    pub async fn resolve_all_with_cancel(
        &self,
        specs: &[RequestSpec],
        cancel: &CancelSignal,
    ) -> Result<BatchReport, CambioError> {
        let template = validate_batch(specs)?;
        let dataset = template.dataset();
        if !self.providers.iter().any(|p| p.supports(dataset)) {
            return Err(CambioError::unsupported(dataset.as_str()));
        }

        let run = self.run_batch(specs, cancel);
        let results = match self.cfg.request_timeout {
            Some(deadline) => tokio::time::timeout(deadline, run)
                .await
                .map_err(|_| CambioError::request_timeout(dataset.as_str()))?,
            None => run.await,
        };
        if cancel.is_cancelled() {
            return Err(CambioError::cancelled(format!("batch:{}", dataset.as_str())));
        }

        let mut failures = FailureReport::new();
        let mut provenance = Vec::with_capacity(results.len());
        for r in &results {
            if let FetchOutcome::Failure(kind) = r.outcome {
                failures.record(kind, r.entity.clone());
            }
            provenance.push((r.entity.clone(), r.provenance.clone()));
        }

        #[cfg(feature = "tracing")]
        for entry in failures.entries() {
            tracing::warn!(
                kind = %entry.kind,
                count = entry.entities.len(),
                entities = ?entry.entities.iter().map(Entity::as_str).collect::<Vec<_>>(),
                "{}",
                entry.summary()
            );
        }

        let dataset = aggregate(results, &AggregateOptions::from_spec(template));
        Ok(BatchReport {
            dataset,
            failures,
            provenance,
        })
    }

    /// Fan the specs out over a bounded worker pool and collect results by index.
    async fn run_batch(&self, specs: &[RequestSpec], cancel: &CancelSignal) -> Vec<EntityResult> {
        let workers = self.cfg.batch.concurrency.clamp(1, specs.len());
        let stagger = self.cfg.batch.stagger;
        let ctx = self.context(cancel);

        let jobs: Vec<Job> = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| Job {
                index,
                spec: spec.clone(),
                providers: self.ordered(spec.entity()),
            })
            .collect();

        let (job_tx, job_rx) = mpsc::channel::<Job>(1);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<(usize, EntityResult)>();

        // Dropping the set aborts every task, so a deadline leaves nothing running.
        let mut tasks = JoinSet::new();

        let dispatch_cancel = cancel.clone();
        tasks.spawn(async move {
            for (n, job) in jobs.into_iter().enumerate() {
                if n > 0 && !stagger.is_zero() {
                    tokio::select! {
                        biased;
                        () = dispatch_cancel.cancelled() => return,
                        () = tokio::time::sleep(stagger) => {}
                    }
                }
                if dispatch_cancel.is_cancelled() || job_tx.send(job).await.is_err() {
                    return;
                }
            }
        });

        for _ in 0..workers {
            let rx = Arc::clone(&job_rx);
            let tx = result_tx.clone();
            let ctx: FetchContext = ctx.clone();
            tasks.spawn(async move {
                loop {
                    let next = { rx.lock().await.recv().await };
                    let Some(job) = next else { break };
                    let result = resolve_entity(&job.spec, &job.providers, &ctx).await;
                    if tx.send((job.index, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        let mut slots: Vec<Option<EntityResult>> = vec![None; specs.len()];
        while let Some((index, result)) = result_rx.recv().await {
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(result);
            }
        }
        while let Some(joined) = tasks.join_next().await {
            #[cfg(feature = "tracing")]
            if let Err(e) = &joined {
                tracing::warn!(error = %e, "batch worker ended abnormally");
            }
            let _ = joined;
        }

        // Entities never picked up (cancellation) or lost to a crashed worker.
        let fallback = if cancel.is_cancelled() {
            ErrorKind::Cancelled
        } else {
            ErrorKind::NotAvailable
        };
        slots
            .into_iter()
            .zip(specs)
            .map(|(slot, spec)| {
                slot.unwrap_or_else(|| EntityResult::failure(spec.entity().clone(), fallback))
            })
            .collect()
    }
}
