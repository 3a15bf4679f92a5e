use std::collections::BTreeMap;

use log::debug;

use super::records::AttendanceRecord;
use crate::config::AnalysisConfig;

/// Records grouped by interval key, in ascending key order.
#[derive(Debug, Default)]
pub struct Buckets<'a> {
    pub intervals: BTreeMap<String, Vec<&'a AttendanceRecord>>,
    /// Rows without a usable timestamp or participant id.
    pub dropped: usize,
    /// Rows outside the configured date window.
    pub filtered: usize,
}

impl Buckets<'_> {
    pub fn bucketed(&self) -> usize {
        self.intervals.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

pub fn bucket_records<'a>(
    records: &'a [AttendanceRecord],
    config: &AnalysisConfig,
) -> Buckets<'a> {
    let mut buckets = Buckets::default();

    for record in records {
        let Some(date) = record.date() else {
            debug!(
                "Dropping record without a usable timestamp: {:?}",
                record.timestamp
            );
            buckets.dropped += 1;
            continue;
        };

        if record.participant_id.is_none() {
            debug!("Dropping record dated {date} without a participant id");
            buckets.dropped += 1;
            continue;
        }

        if !config.contains(date) {
            buckets.filtered += 1;
            continue;
        }

        buckets
            .intervals
            .entry(config.group_by.interval_key(date))
            .or_default()
            .push(record);
    }

    buckets
}
