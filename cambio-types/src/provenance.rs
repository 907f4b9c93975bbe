//! Provenance of a resolved entity: which provider answered and at what cost.

use crate::error::ErrorKind;

/// Record of which provider produced an entity's data and how many attempts it took.
///
/// Behavior:
/// - Built by the per-entity fallback chain while walking providers in priority order.
/// - `skipped` lists every provider passed over before the answer (or before giving up),
///   with the kind that caused the skip. An empty payload is recorded as `NoData`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    /// Provider that supplied the data, `None` when the entity failed.
    pub provider: Option<&'static str>,
    /// Attempts consumed on the answering provider (or the last provider tried).
    pub attempts: u32,
    /// Attempts consumed across the whole chain.
    pub total_attempts: u32,
    /// Providers passed over, in the order they were tried.
    pub skipped: Vec<(&'static str, ErrorKind)>,
}

impl Provenance {
    /// Retries consumed on the answering provider (attempts beyond the first).
    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }

    /// Record a provider that was passed over.
    pub fn push_skip(&mut self, provider: &'static str, kind: ErrorKind) {
        self.skipped.push((provider, kind));
    }
}
