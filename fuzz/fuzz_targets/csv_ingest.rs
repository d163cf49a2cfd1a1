#![no_main]

use faultrank::config::{ColumnNames, ReportConfig};
use faultrank::ingest::read_records;
use faultrank::pipeline::run;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must either be rejected or produce a complete report
    if let Ok(outcome) = read_records(data, &ColumnNames::default()) {
        let _ = run(outcome, &ReportConfig::default());
    }
});
