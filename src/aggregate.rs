//! Per-machine fault aggregation
//!
//! Groups records by `(machine, fault_description)` and sums duration and
//! occurrences. Grouping uses ordered maps throughout so that iteration order
//! never depends on hashing, and float sums are taken in a canonical order so
//! the totals do not depend on input row order either.

use crate::record::{FaultKey, FaultRecord};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Totals for one fault on one machine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedFault {
    pub machine: String,
    pub fault_description: String,
    /// Distinct message codes seen for this fault, sorted
    pub fault_codes: Vec<String>,
    pub total_duration: f64,
    pub total_occurrences: u64,
}

impl AggregatedFault {
    /// Display label: `"<description> (<codes>)"`, or the bare description
    /// when no code was recorded
    pub fn label(&self) -> String {
        if self.fault_codes.is_empty() {
            self.fault_description.clone()
        } else {
            format!("{} ({})", self.fault_description, self.fault_codes.join("/"))
        }
    }
}

#[derive(Debug, Default)]
struct FaultAccumulator {
    durations: Vec<f64>,
    occurrences: u64,
    codes: BTreeSet<String>,
}

/// Result of an aggregation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Machine name to its faults, sorted by description
    machines: BTreeMap<String, Vec<AggregatedFault>>,
    /// Records rejected because they had no machine
    skipped: usize,
}

impl Aggregation {
    /// All machines in name order
    pub fn machines(&self) -> &BTreeMap<String, Vec<AggregatedFault>> {
        &self.machines
    }

    /// Faults of one machine (empty if the machine is unknown)
    pub fn faults(&self, machine: &str) -> &[AggregatedFault] {
        self.machines.get(machine).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of records that could not be aggregated
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Incremental aggregator over fault records
#[derive(Debug, Default)]
pub struct FaultAggregator {
    groups: BTreeMap<FaultKey, FaultAccumulator>,
    /// Machines that must appear in the output even without faults
    known_machines: BTreeSet<String>,
    skipped: usize,
}

impl FaultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record; returns false when the record was skipped
    pub fn record(&mut self, record: &FaultRecord) -> bool {
        if record.machine.trim().is_empty() {
            self.skipped += 1;
            tracing::warn!(
                fault = %record.fault_description,
                "skipping record without machine name"
            );
            return false;
        }

        let entry = self.groups.entry(record.key()).or_default();
        entry.durations.push(record.total_duration);
        entry.occurrences = entry.occurrences.saturating_add(record.total_occurrences);
        if !record.fault_code.is_empty() {
            entry.codes.insert(record.fault_code.clone());
        }
        true
    }

    /// Make sure `machine` is listed even if none of its records survive
    pub fn register_machine(&mut self, machine: &str) {
        let machine = machine.trim();
        if !machine.is_empty() {
            self.known_machines.insert(machine.to_string());
        }
    }

    /// Close the pass and produce per-machine totals
    pub fn finish(self) -> Aggregation {
        let mut machines: BTreeMap<String, Vec<AggregatedFault>> = self
            .known_machines
            .into_iter()
            .map(|machine| (machine, Vec::new()))
            .collect();

        // BTreeMap order keeps each machine's faults sorted by description
        for (key, mut acc) in self.groups {
            let fault = AggregatedFault {
                total_duration: order_independent_sum(&mut acc.durations),
                total_occurrences: acc.occurrences,
                fault_codes: acc.codes.into_iter().collect(),
                fault_description: key.fault_description,
                machine: key.machine.clone(),
            };
            machines.entry(key.machine).or_default().push(fault);
        }

        tracing::debug!(
            machines = machines.len(),
            skipped = self.skipped,
            "aggregation finished"
        );

        Aggregation {
            machines,
            skipped: self.skipped,
        }
    }
}

/// Aggregate a batch of records in a single pass
pub fn aggregate<'a, I>(records: I) -> Aggregation
where
    I: IntoIterator<Item = &'a FaultRecord>,
{
    let mut aggregator = FaultAggregator::new();
    for record in records {
        aggregator.record(record);
    }
    aggregator.finish()
}

/// Sum floats in ascending order so the result is independent of the order
/// the values arrived in
pub(crate) fn order_independent_sum(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    values.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(machine: &str, station: &str, code: &str, desc: &str, dur: f64, occ: u64) -> FaultRecord {
        FaultRecord::new(machine, station, code, desc, dur, occ).unwrap()
    }

    #[test]
    fn test_aggregate_sums_matching_keys() {
        let records = vec![
            rec("M1", "S1", "C1", "Overheat", 120.0, 3),
            rec("M1", "S1", "C1", "Overheat", 30.0, 1),
            rec("M1", "S2", "C2", "Jam", 50.0, 5),
        ];

        let agg = aggregate(&records);
        let faults = agg.faults("M1");
        assert_eq!(faults.len(), 2);

        let overheat = faults
            .iter()
            .find(|f| f.fault_description == "Overheat")
            .unwrap();
        assert_eq!(overheat.total_duration, 150.0);
        assert_eq!(overheat.total_occurrences, 4);

        let jam = faults.iter().find(|f| f.fault_description == "Jam").unwrap();
        assert_eq!(jam.total_duration, 50.0);
        assert_eq!(jam.total_occurrences, 5);
    }

    #[test]
    fn test_aggregate_keeps_machines_apart() {
        let records = vec![
            rec("M1", "S1", "C1", "Jam", 10.0, 1),
            rec("M2", "S1", "C1", "Jam", 20.0, 2),
        ];

        let agg = aggregate(&records);
        assert_eq!(agg.machines().len(), 2);
        assert_eq!(agg.faults("M1")[0].total_duration, 10.0);
        assert_eq!(agg.faults("M2")[0].total_duration, 20.0);
    }

    #[test]
    fn test_aggregate_ignores_station_for_grouping() {
        let records = vec![
            rec("M1", "Idle", "C1", "Jam", 10.0, 1),
            rec("M1", "Running", "C1", "Jam", 5.0, 1),
        ];

        let agg = aggregate(&records);
        assert_eq!(agg.faults("M1").len(), 1);
        assert_eq!(agg.faults("M1")[0].total_duration, 15.0);
    }

    #[test]
    fn test_aggregate_collects_distinct_codes() {
        let records = vec![
            rec("M1", "S1", "E20", "Jam", 1.0, 1),
            rec("M1", "S1", "E10", "Jam", 1.0, 1),
            rec("M1", "S1", "E20", "Jam", 1.0, 1),
            rec("M1", "S1", "", "Jam", 1.0, 1),
        ];

        let agg = aggregate(&records);
        let jam = &agg.faults("M1")[0];
        assert_eq!(jam.fault_codes, vec!["E10".to_string(), "E20".to_string()]);
        assert_eq!(jam.label(), "Jam (E10/E20)");
    }

    #[test]
    fn test_label_without_code() {
        let records = vec![rec("M1", "S1", "", "Jam", 1.0, 1)];
        let agg = aggregate(&records);
        assert_eq!(agg.faults("M1")[0].label(), "Jam");
    }

    #[test]
    fn test_aggregate_faults_sorted_by_description() {
        let records = vec![
            rec("M1", "S1", "C", "Zeta", 1.0, 1),
            rec("M1", "S1", "C", "Alpha", 1.0, 1),
            rec("M1", "S1", "C", "Mid", 1.0, 1),
        ];

        let agg = aggregate(&records);
        let names: Vec<_> = agg
            .faults("M1")
            .iter()
            .map(|f| f.fault_description.as_str())
            .collect();
        assert_eq!(names, vec!["Alpha", "Mid", "Zeta"]);
    }

    #[test]
    fn test_record_skips_blank_machine() {
        let mut record = rec("M1", "S1", "C1", "Jam", 1.0, 1);
        record.machine = "   ".to_string();

        let mut aggregator = FaultAggregator::new();
        assert!(!aggregator.record(&record));
        let agg = aggregator.finish();
        assert_eq!(agg.skipped(), 1);
        assert!(agg.machines().is_empty());
    }

    #[test]
    fn test_register_machine_without_faults() {
        let mut aggregator = FaultAggregator::new();
        aggregator.register_machine("Ghost");
        aggregator.record(&rec("M1", "S1", "C1", "Jam", 1.0, 1));
        let agg = aggregator.finish();

        assert_eq!(agg.machines().len(), 2);
        assert!(agg.faults("Ghost").is_empty());
    }

    #[test]
    fn test_aggregate_empty_input() {
        let agg = aggregate(&Vec::<FaultRecord>::new());
        assert!(agg.machines().is_empty());
        assert_eq!(agg.skipped(), 0);
    }

    #[test]
    fn test_order_independent_sum_matches_across_orders() {
        let mut a = vec![0.1, 1e16, -1e16 + 2.0, 0.2, 3.0];
        let mut b = vec![3.0, 0.2, -1e16 + 2.0, 1e16, 0.1];
        assert_eq!(order_independent_sum(&mut a), order_independent_sum(&mut b));
    }
}
