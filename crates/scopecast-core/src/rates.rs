use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::{EstimateError, Result};
use crate::money::MAX_HOURLY_RATE;
use crate::roles::RoleKey;
use crate::types::EstimateDocument;

// ---------------------------------------------------------------------------
// RateEntry
// ---------------------------------------------------------------------------

/// State of one role's hourly rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum RateEntry {
    /// No override; tasks use their own generated rate.
    Unset,
    /// Explicitly emptied by the user; priced at zero.
    Cleared,
    Value(f64),
}

impl RateEntry {
    /// Parse raw form input. Empty input clears the rate.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(RateEntry::Cleared);
        }
        if !rate_re().is_match(trimmed) {
            return Err(EstimateError::InvalidRateInput(raw.to_string()));
        }
        let value: f64 = trimmed
            .parse()
            .map_err(|_| EstimateError::InvalidRateInput(raw.to_string()))?;
        if !value.is_finite() || value > MAX_HOURLY_RATE {
            return Err(EstimateError::InvalidRateInput(raw.to_string()));
        }
        Ok(RateEntry::Value(value))
    }

    /// Effective override: `None` means "fall back to the task's rate".
    pub fn rate(self) -> Option<f64> {
        match self {
            RateEntry::Unset => None,
            RateEntry::Cleared => Some(0.0),
            RateEntry::Value(v) => Some(v),
        }
    }
}

static RATE_RE: OnceLock<Regex> = OnceLock::new();

// Accepts "55", "55.", "55.5" and ".5"; rejects signs, exponents and
// thousands separators.
fn rate_re() -> &'static Regex {
    RATE_RE.get_or_init(|| Regex::new(r"^(\d+\.?\d*|\.\d+)$").unwrap())
}

// ---------------------------------------------------------------------------
// RateStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSlot {
    /// Label as first seen, for display.
    pub label: String,
    pub entry: RateEntry,
}

/// User-editable hourly rates keyed by normalized role.
///
/// Owned by the current estimate; rebuilt from scratch whenever a new
/// document is loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateStore {
    slots: BTreeMap<RoleKey, RateSlot>,
}

impl RateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the document's role-rate list, then backfill any role that
    /// only appears on tasks with the first such task's rate.
    pub fn from_document(doc: &EstimateDocument) -> Self {
        let mut store = Self::new();
        for rr in &doc.role_rates {
            store
                .slots
                .entry(RoleKey::normalize(&rr.role))
                .or_insert_with(|| RateSlot {
                    label: rr.role.clone(),
                    entry: RateEntry::Value(rr.hourly_rate),
                });
        }
        for task in doc.tasks() {
            store
                .slots
                .entry(RoleKey::normalize(&task.role))
                .or_insert_with(|| RateSlot {
                    label: task.role.clone(),
                    entry: RateEntry::Value(task.hourly_rate),
                });
        }
        store
    }

    /// The override for `role_label`: the user's value, `Some(0.0)` when
    /// cleared, or `None` to use each task's own rate.
    pub fn get(&self, role_label: &str) -> Option<f64> {
        self.get_key(&RoleKey::normalize(role_label))
    }

    pub fn get_key(&self, key: &RoleKey) -> Option<f64> {
        self.slots.get(key).and_then(|s| s.entry.rate())
    }

    pub fn entry(&self, role_label: &str) -> RateEntry {
        self.slots
            .get(&RoleKey::normalize(role_label))
            .map(|s| s.entry)
            .unwrap_or(RateEntry::Unset)
    }

    /// Apply raw form input. Invalid input leaves the store unchanged and
    /// returns [`EstimateError::InvalidRateInput`].
    pub fn set(&mut self, role_label: &str, raw: &str) -> Result<RateEntry> {
        let entry = RateEntry::parse(raw)?;
        self.put(role_label, entry);
        Ok(entry)
    }

    /// Drop the override so tasks fall back to their own rate.
    pub fn revert(&mut self, role_label: &str) {
        self.put(role_label, RateEntry::Unset);
    }

    fn put(&mut self, role_label: &str, entry: RateEntry) {
        self.slots
            .entry(RoleKey::normalize(role_label))
            .and_modify(|s| s.entry = entry)
            .or_insert_with(|| RateSlot {
                label: role_label.trim().to_string(),
                entry,
            });
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RoleKey, &RateSlot)> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::{sample_document, task};

    #[test]
    fn parse_accepts_decimal_forms() {
        assert_eq!(RateEntry::parse("55").unwrap(), RateEntry::Value(55.0));
        assert_eq!(RateEntry::parse("55.").unwrap(), RateEntry::Value(55.0));
        assert_eq!(RateEntry::parse("55.25").unwrap(), RateEntry::Value(55.25));
        assert_eq!(RateEntry::parse(".5").unwrap(), RateEntry::Value(0.5));
        assert_eq!(RateEntry::parse("0").unwrap(), RateEntry::Value(0.0));
        assert_eq!(RateEntry::parse("").unwrap(), RateEntry::Cleared);
        assert_eq!(RateEntry::parse("  ").unwrap(), RateEntry::Cleared);
    }

    #[test]
    fn parse_rejects_everything_else() {
        for raw in ["-5", "abc", "1e3", "1,000", ".", "5..0", "+5", "NaN", "inf"] {
            assert!(RateEntry::parse(raw).is_err(), "expected rejection: {raw:?}");
        }
    }

    #[test]
    fn seeded_from_role_rates_then_tasks() {
        let mut doc = sample_document();
        doc.phases[3].tasks.push(task("Load test", 4.0, "QA Engineer", 42.0));
        let store = RateStore::from_document(&doc);
        assert_eq!(store.get("Back-end Developer"), Some(55.0));
        // QA Engineer is not in roleRates; backfilled from its first task
        assert_eq!(store.get("QA Engineer"), Some(40.0));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn lookup_is_format_insensitive() {
        let store = RateStore::from_document(&sample_document());
        assert_eq!(store.get("  back-end DEVELOPER"), Some(55.0));
    }

    #[test]
    fn invalid_set_is_a_no_op() {
        let mut store = RateStore::from_document(&sample_document());
        let before = store.clone();
        assert!(store.set("Back-end Developer", "seventy").is_err());
        assert!(store.set("Brand new role", "-1").is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn oversized_rate_is_rejected_and_store_stays_priceable() {
        let mut store = RateStore::from_document(&sample_document());
        let before = store.clone();
        let err = store
            .set("Back-end Developer", "100000000000000000000")
            .unwrap_err();
        assert!(matches!(err, EstimateError::InvalidRateInput(_)));
        assert!(RateEntry::parse("1000000.01").is_err());
        assert_eq!(RateEntry::parse("1000000").unwrap(), RateEntry::Value(1_000_000.0));
        assert_eq!(store, before);

        let totals = crate::aggregate::recompute(&sample_document(), &store);
        assert_eq!(totals.total_cost.to_string(), "5550.00");
    }

    #[test]
    fn clear_and_revert_are_distinct() {
        let mut store = RateStore::from_document(&sample_document());
        store.set("Back-end Developer", "").unwrap();
        assert_eq!(store.entry("Back-end Developer"), RateEntry::Cleared);
        assert_eq!(store.get("Back-end Developer"), Some(0.0));

        store.revert("Back-end Developer");
        assert_eq!(store.entry("Back-end Developer"), RateEntry::Unset);
        assert_eq!(store.get("Back-end Developer"), None);
    }

    #[test]
    fn unknown_role_is_unset() {
        let store = RateStore::new();
        assert_eq!(store.entry("Nobody"), RateEntry::Unset);
        assert_eq!(store.get("Nobody"), None);
    }

    #[test]
    fn set_keeps_original_label() {
        let mut store = RateStore::from_document(&sample_document());
        store.set("back-end developer", "70").unwrap();
        let (_, slot) = store
            .iter()
            .find(|(k, _)| k.as_str() == "back-enddeveloper")
            .unwrap();
        assert_eq!(slot.label, "Back-end Developer");
        assert_eq!(slot.entry, RateEntry::Value(70.0));
    }
}
