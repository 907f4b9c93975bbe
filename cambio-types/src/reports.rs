//! Report envelopes produced by the orchestrator and the currency normalizer.

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::symbols::{Currency, Entity};

/// Entities that failed for one shared reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    /// Shared failure reason.
    pub kind: ErrorKind,
    /// Affected entities, in request order.
    pub entities: Vec<Entity>,
}

impl FailureEntry {
    /// Render a one-line summary, e.g. `invalid_credential (5 entities): the API credential was rejected`.
    #[must_use]
    pub fn summary(&self) -> String {
        let n = self.entities.len();
        let noun = if n == 1 { "entity" } else { "entities" };
        format!("{} ({n} {noun}): {}", self.kind, self.kind.describe())
    }
}

/// Entities excluded from a dataset, grouped by failure kind.
///
/// Exactly one entry exists per kind, so a shared root cause (one rejected
/// credential across a whole batch) is reported once instead of per entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    entries: Vec<FailureEntry>,
}

impl FailureReport {
    /// Create an empty report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record `entity` under `kind`, creating the kind's entry on first use.
    pub fn record(&mut self, kind: ErrorKind, entity: Entity) {
        match self.entries.iter_mut().find(|e| e.kind == kind) {
            Some(entry) => entry.entities.push(entity),
            None => self.entries.push(FailureEntry {
                kind,
                entities: vec![entity],
            }),
        }
    }

    /// One entry per failure kind, in order of first occurrence.
    #[must_use]
    pub fn entries(&self) -> &[FailureEntry] {
        &self.entries
    }

    /// Entry for a specific kind, if any entity failed with it.
    #[must_use]
    pub fn entry(&self, kind: ErrorKind) -> Option<&FailureEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    /// True when no entity failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of failed entities across all kinds.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entries.iter().map(|e| e.entities.len()).sum()
    }

    /// Failure kind recorded for `entity`, if it failed.
    #[must_use]
    pub fn kind_of(&self, entity: &Entity) -> Option<ErrorKind> {
        self.entries
            .iter()
            .find(|e| e.entities.contains(entity))
            .map(|e| e.kind)
    }

    /// Whether `entity` is listed as failed.
    #[must_use]
    pub fn contains(&self, entity: &Entity) -> bool {
        self.kind_of(entity).is_some()
    }

    /// Iterate over every failed entity.
    pub fn failed_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entries.iter().flat_map(|e| e.entities.iter())
    }

    /// One summary line per failure kind.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        self.entries.iter().map(FailureEntry::summary).collect()
    }
}

/// Outcome of a currency normalization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyReport {
    /// Currency every converted entity now reports in.
    pub target: Currency,
    /// Entities whose values were rescaled.
    pub converted: Vec<Entity>,
    /// Entities already reporting in the target currency, left untouched.
    pub unchanged: Vec<Entity>,
    /// Entities whose currency or FX series could not be resolved, returned unconverted.
    pub unresolved: Vec<Entity>,
}

impl CurrencyReport {
    /// Create an empty report for `target`.
    #[must_use]
    pub const fn new(target: Currency) -> Self {
        Self {
            target,
            converted: Vec::new(),
            unchanged: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    /// True when every entity ended up in the target currency.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}
