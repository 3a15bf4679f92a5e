use std::collections::{BTreeMap, BTreeSet};

use super::records::AttendanceRecord;
use crate::report::CohortInterval;

/// Compares each interval with the one immediately before it.
///
/// Keys are walked in ascending order. Interval `i` is only ever compared
/// with interval `i - 1`, and every emitted interval owns its own copy of
/// the previous participant set. The first interval has no baseline, so its
/// rate and growth are `None`.
pub fn build_cohorts(buckets: &BTreeMap<String, Vec<&AttendanceRecord>>) -> Vec<CohortInterval> {
    let mut intervals = Vec::with_capacity(buckets.len());
    let mut previous: Option<BTreeSet<String>> = None;

    for (interval_key, records) in buckets {
        let participants = participant_set(records);

        let (previous_participants, growth) = match previous.take() {
            Some(previous) => {
                let growth = signed_len(participants.len()) - signed_len(previous.len());
                (previous, Some(growth))
            }
            None => (BTreeSet::new(), None),
        };

        let retained_participants: BTreeSet<String> = participants
            .intersection(&previous_participants)
            .cloned()
            .collect();

        let retention_rate = ratio(retained_participants.len(), previous_participants.len());

        previous = Some(participants.clone());

        intervals.push(CohortInterval {
            interval_key: interval_key.clone(),
            participants,
            previous_participants,
            retained_participants,
            retention_rate,
            growth,
        });
    }

    intervals
}

fn participant_set(records: &[&AttendanceRecord]) -> BTreeSet<String> {
    records
        .iter()
        .filter_map(|record| record.participant_id.clone())
        .collect()
}

/// Division that refuses a zero denominator instead of producing NaN.
pub fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let value = numerator as f64 / denominator as f64;
    Some(value)
}

fn signed_len(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}
