//! Cross-machine station summaries
//!
//! Stations are identified by the record's `station_state`. Records without a
//! station land in an explicit unknown bucket so per-station totals always add
//! up to the grand total.

use crate::aggregate::order_independent_sum;
use crate::record::FaultRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Bucket name for records with an empty station
pub const DEFAULT_UNKNOWN_STATION: &str = "Unknown";

/// Total duration of one station
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationTotal {
    pub station: String,
    pub total_duration: f64,
}

/// Station-level views across all machines
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StationSummary {
    /// Station to its distinct fault descriptions, both sorted ascending
    pub unique_faults_by_station: BTreeMap<String, Vec<String>>,
    /// Stations by total duration descending, then name ascending
    pub total_duration_by_station: Vec<StationTotal>,
}

impl StationSummary {
    /// Sum of all station totals
    pub fn grand_total(&self) -> f64 {
        let mut totals: Vec<f64> = self
            .total_duration_by_station
            .iter()
            .map(|t| t.total_duration)
            .collect();
        order_independent_sum(&mut totals)
    }

    pub fn is_empty(&self) -> bool {
        self.unique_faults_by_station.is_empty() && self.total_duration_by_station.is_empty()
    }
}

#[derive(Debug, Default)]
struct StationAccumulator {
    faults: BTreeSet<String>,
    durations: Vec<f64>,
}

/// Incremental builder for [`StationSummary`]
#[derive(Debug)]
pub struct StationSummaryBuilder {
    unknown_station: String,
    stations: BTreeMap<String, StationAccumulator>,
}

impl Default for StationSummaryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_UNKNOWN_STATION)
    }
}

impl StationSummaryBuilder {
    pub fn new(unknown_station: impl Into<String>) -> Self {
        Self {
            unknown_station: unknown_station.into(),
            stations: BTreeMap::new(),
        }
    }

    /// Add one record; records without a machine are not valid and are ignored
    pub fn record(&mut self, record: &FaultRecord) {
        if record.machine.trim().is_empty() {
            return;
        }

        let station = match record.station_state.trim() {
            "" => self.unknown_station.as_str(),
            name => name,
        };

        let entry = self.stations.entry(station.to_string()).or_default();
        entry.faults.insert(record.fault_description.clone());
        entry.durations.push(record.total_duration);
    }

    pub fn finish(self) -> StationSummary {
        let mut unique_faults_by_station = BTreeMap::new();
        let mut total_duration_by_station = Vec::with_capacity(self.stations.len());

        for (station, mut acc) in self.stations {
            total_duration_by_station.push(StationTotal {
                station: station.clone(),
                total_duration: order_independent_sum(&mut acc.durations),
            });
            unique_faults_by_station.insert(station, acc.faults.into_iter().collect());
        }

        total_duration_by_station.sort_by(|a: &StationTotal, b: &StationTotal| {
            b.total_duration
                .total_cmp(&a.total_duration)
                .then_with(|| a.station.cmp(&b.station))
        });

        StationSummary {
            unique_faults_by_station,
            total_duration_by_station,
        }
    }
}

/// Build station summaries with the default unknown-station label
pub fn build_station_summary<'a, I>(records: I) -> StationSummary
where
    I: IntoIterator<Item = &'a FaultRecord>,
{
    let mut builder = StationSummaryBuilder::default();
    for record in records {
        builder.record(record);
    }
    builder.finish()
}
