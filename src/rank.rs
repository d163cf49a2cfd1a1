//! Top-N selection over aggregated faults
//!
//! Ordering is total: metric descending, then fault description ascending, so
//! equal totals always come out in the same order.

use crate::aggregate::AggregatedFault;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Number of entries kept per ranking unless configured otherwise
pub const DEFAULT_TOP_N: usize = 10;

/// Metric a ranking is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Duration,
    Occurrence,
}

impl Metric {
    /// Column heading for this metric
    pub fn column_name(self) -> &'static str {
        match self {
            Metric::Duration => "Total Duration",
            Metric::Occurrence => "Total Occurrences",
        }
    }

    /// Metric value of a fault as a float (counts are exact below 2^53)
    pub fn value(self, fault: &AggregatedFault) -> f64 {
        match self {
            Metric::Duration => fault.total_duration,
            Metric::Occurrence => fault.total_occurrences as f64,
        }
    }

    /// Ranking order: metric descending, description ascending
    pub fn compare(self, a: &AggregatedFault, b: &AggregatedFault) -> Ordering {
        let primary = match self {
            Metric::Duration => b.total_duration.total_cmp(&a.total_duration),
            Metric::Occurrence => b.total_occurrences.cmp(&a.total_occurrences),
        };
        primary
            .then_with(|| a.fault_description.cmp(&b.fault_description))
            .then_with(|| a.machine.cmp(&b.machine))
    }
}

/// Sorted, truncated selection of faults
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedList {
    pub metric: Metric,
    pub limit: usize,
    pub entries: Vec<AggregatedFault>,
}

impl RankedList {
    pub fn empty(metric: Metric, limit: usize) -> Self {
        Self {
            metric,
            limit,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AggregatedFault> {
        self.entries.iter()
    }

    /// Check the ranking invariants, describing the first violation found
    pub fn verify(&self, machine: &str) -> std::result::Result<(), String> {
        if self.entries.len() > self.limit {
            return Err(format!(
                "{:?} ranking holds {} entries, limit is {}",
                self.metric,
                self.entries.len(),
                self.limit
            ));
        }

        let mut seen = BTreeSet::new();
        for fault in &self.entries {
            if fault.machine != machine {
                return Err(format!(
                    "fault '{}' belongs to machine '{}'",
                    fault.fault_description, fault.machine
                ));
            }
            if !seen.insert(fault.fault_description.as_str()) {
                return Err(format!(
                    "duplicate fault '{}' in {:?} ranking",
                    fault.fault_description, self.metric
                ));
            }
        }

        if let Some(pair) = self
            .entries
            .windows(2)
            .find(|pair| self.metric.compare(&pair[0], &pair[1]) == Ordering::Greater)
        {
            return Err(format!(
                "{:?} ranking out of order at '{}'",
                self.metric, pair[1].fault_description
            ));
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a RankedList {
    type Item = &'a AggregatedFault;
    type IntoIter = std::slice::Iter<'a, AggregatedFault>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Select the top `limit` faults by `metric`
///
/// Fewer than `limit` faults are returned as-is (sorted, no padding); an
/// empty input yields an empty list.
pub fn rank(faults: &[AggregatedFault], metric: Metric, limit: usize) -> RankedList {
    let mut entries = faults.to_vec();
    entries.sort_by(|a, b| metric.compare(a, b));
    entries.truncate(limit);

    RankedList {
        metric,
        limit,
        entries,
    }
}
