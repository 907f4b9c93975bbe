use std::sync::Arc;

use cambio_core::{
    CancelSignal, Entity, EntityResult, ErrorKind, FetchContext, FetchOutcome, Provenance,
    Provider, RequestSpec, RetryOutcome,
};

use crate::Cambio;

/// Walk `providers` in order until one returns a non-empty table.
///
/// - Providers that do not support the requested dataset are skipped without an attempt.
/// - A failure, or a successful but empty payload, moves on to the next provider and
///   is recorded in the provenance as a skip (`NoData` for empty payloads).
/// - When the chain is exhausted the entity fails with the kind every provider agreed
///   on (for example `InvalidCredential` everywhere), or `NoData` when the kinds are
///   mixed or only empty payloads were seen.
/// - Cancellation ends the chain immediately with `Cancelled`.
pub async fn resolve_entity(
    spec: &RequestSpec,
    providers: &[Arc<dyn Provider>],
    ctx: &FetchContext,
) -> EntityResult {
    let entity = spec.entity().clone();
    let mut provenance = Provenance::default();
    let mut kinds: Vec<ErrorKind> = Vec::new();

    for p in providers {
        if !p.supports(spec.dataset()) {
            continue;
        }
        if ctx.cancel.is_cancelled() {
            return finish(entity, ErrorKind::Cancelled, provenance);
        }
        let RetryOutcome { outcome, attempts } = p.fetch(spec, ctx).await;
        provenance.attempts = attempts;
        provenance.total_attempts += attempts;
        match outcome {
            FetchOutcome::Success { table, provider } if !table.is_empty() => {
                provenance.provider = Some(provider);
                return EntityResult {
                    entity,
                    outcome: FetchOutcome::Success { table, provider },
                    provenance,
                };
            }
            FetchOutcome::Success { .. } => {
                #[cfg(feature = "tracing")]
                tracing::debug!(provider = p.name(), entity = %entity, "empty payload; trying next provider");
                provenance.push_skip(p.name(), ErrorKind::NoData);
                kinds.push(ErrorKind::NoData);
            }
            FetchOutcome::Failure(ErrorKind::Cancelled) => {
                return finish(entity, ErrorKind::Cancelled, provenance);
            }
            FetchOutcome::Failure(kind) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(provider = p.name(), entity = %entity, kind = %kind, attempts, "provider failed; trying next provider");
                provenance.push_skip(p.name(), kind);
                kinds.push(kind);
            }
        }
    }

    finish(entity, collapse(&kinds), provenance)
}

fn finish(entity: Entity, kind: ErrorKind, provenance: Provenance) -> EntityResult {
    EntityResult {
        entity,
        outcome: FetchOutcome::Failure(kind),
        provenance,
    }
}

/// Shared kind when every provider failed the same way, else `NoData`.
fn collapse(kinds: &[ErrorKind]) -> ErrorKind {
    match kinds.split_first() {
        Some((first, rest)) if *first != ErrorKind::NoData && rest.iter().all(|k| k == first) => {
            *first
        }
        _ => ErrorKind::NoData,
    }
}

impl Cambio {
    /// Resolve one entity through its fallback chain.
    ///
    /// Provider order is the registration order, overridden by any
    /// [`prefer_entity`](crate::CambioBuilder::prefer_entity) list for this entity.
    /// Failures are returned as data in the [`EntityResult`].
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "cambio::router::resolve_entity",
            skip(self, spec),
            fields(entity = %spec.entity(), dataset = spec.dataset().as_str()),
        )
    )]
    pub async fn resolve_entity(&self, spec: &RequestSpec) -> EntityResult {
        self.resolve_entity_with_cancel(spec, &CancelSignal::never())
            .await
    }

    /// Like [`resolve_entity`](Self::resolve_entity), observing `cancel`.
    pub async fn resolve_entity_with_cancel(
        &self,
        spec: &RequestSpec,
        cancel: &CancelSignal,
    ) -> EntityResult {
        let providers = self.ordered(spec.entity());
        resolve_entity(spec, &providers, &self.context(cancel)).await
    }
}
