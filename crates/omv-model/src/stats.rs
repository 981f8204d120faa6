use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::EntityKind;

/// Counters for one `(kind, source)` bucket.
///
/// `found + missing + not_checked == total` holds at every point; the two
/// record methods are the only way the counters move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatBucket {
    pub total: usize,
    pub found: usize,
    pub missing: usize,
    pub not_checked: usize,
}

impl StatBucket {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            found: 0,
            missing: 0,
            not_checked: total,
        }
    }

    /// Move one entity from not-checked to found.
    pub fn record_found(&mut self) {
        debug_assert!(self.not_checked > 0);
        self.not_checked -= 1;
        self.found += 1;
    }

    /// Move one entity from not-checked to missing.
    pub fn record_missing(&mut self) {
        debug_assert!(self.not_checked > 0);
        self.not_checked -= 1;
        self.missing += 1;
    }

    pub fn is_consistent(&self) -> bool {
        self.found + self.missing + self.not_checked == self.total
    }

    /// Percentage of entities found, rounded half away from zero.
    /// Reports 0 for an empty bucket.
    pub fn found_percentage(&self) -> u32 {
        percentage(self.found, self.total)
    }

    /// Percentage of entities missing, rounded half away from zero.
    pub fn missing_percentage(&self) -> u32 {
        percentage(self.missing, self.total)
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

/// Per-kind counters for one verification pass against one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    buckets: BTreeMap<EntityKind, StatBucket>,
}

impl Statistics {
    /// Initialize a single-kind statistics object.
    pub fn for_kind(kind: EntityKind, total: usize) -> Self {
        let mut buckets = BTreeMap::new();
        buckets.insert(kind, StatBucket::new(total));
        Self { buckets }
    }

    pub fn bucket(&self, kind: EntityKind) -> StatBucket {
        self.buckets.get(&kind).copied().unwrap_or_default()
    }

    pub fn bucket_mut(&mut self, kind: EntityKind) -> &mut StatBucket {
        self.buckets.entry(kind).or_default()
    }

    pub fn kinds(&self) -> impl Iterator<Item = (EntityKind, StatBucket)> + '_ {
        self.buckets.iter().map(|(&kind, &bucket)| (kind, bucket))
    }

    /// Derived totals summing across kinds; never stored.
    pub fn summary(&self) -> StatBucket {
        let mut summary = StatBucket::default();
        for bucket in self.buckets.values() {
            summary.total += bucket.total;
            summary.found += bucket.found;
            summary.missing += bucket.missing;
            summary.not_checked += bucket.not_checked;
        }
        summary
    }

    pub fn is_consistent(&self) -> bool {
        self.buckets.values().all(StatBucket::is_consistent)
    }

    /// True when every entity of every kind has been resolved.
    pub fn is_complete(&self) -> bool {
        self.summary().not_checked == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_invariant_holds_through_updates() {
        let mut bucket = StatBucket::new(3);
        assert!(bucket.is_consistent());
        bucket.record_found();
        assert!(bucket.is_consistent());
        bucket.record_missing();
        assert!(bucket.is_consistent());
        bucket.record_found();
        assert!(bucket.is_consistent());
        assert_eq!(bucket.not_checked, 0);
    }

    #[test]
    fn percentages_round_half_away_from_zero() {
        let mut bucket = StatBucket::new(3);
        bucket.record_found();
        bucket.record_found();
        bucket.record_missing();
        // 2/3 = 66.67 rounds up, 1/3 = 33.33 rounds down
        assert_eq!(bucket.found_percentage(), 67);
        assert_eq!(bucket.missing_percentage(), 33);
    }

    #[test]
    fn empty_bucket_reports_zero_percent() {
        let bucket = StatBucket::new(0);
        assert_eq!(bucket.found_percentage(), 0);
        assert_eq!(bucket.missing_percentage(), 0);
    }

    #[test]
    fn summary_sums_across_kinds() {
        let mut stats = Statistics::default();
        *stats.bucket_mut(EntityKind::Concept) = StatBucket::new(2);
        *stats.bucket_mut(EntityKind::AttributeType) = StatBucket::new(1);
        stats.bucket_mut(EntityKind::Concept).record_found();

        let summary = stats.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.found, 1);
        assert_eq!(summary.not_checked, 2);
        assert!(!stats.is_complete());
    }
}
