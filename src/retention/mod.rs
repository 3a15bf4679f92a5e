mod bucketing;
mod cohort;
mod records;
mod summary;

use chrono::Utc;
use indexmap::IndexMap;
use log::{info, warn};

pub use records::{AttendanceRecord, RecordPayload};

use crate::config::AnalysisConfig;
use crate::report::{ParticipantProfile, RetentionReport};
use bucketing::Buckets;

/// Runs the full pipeline over one snapshot of records: bucketing, cohort
/// comparison and summary. Nothing is carried over between calls.
pub fn analyze(
    source: &str,
    records: &[AttendanceRecord],
    config: &AnalysisConfig,
) -> RetentionReport {
    let buckets = bucketing::bucket_records(records, config);

    info!(
        "Bucketed {} of {} records into {} {} intervals ({} dropped, {} outside window)",
        buckets.bucketed(),
        records.len(),
        buckets.intervals.len(),
        config.group_by,
        buckets.dropped,
        buckets.filtered
    );

    if buckets.is_empty() {
        warn!("No usable records found in {source}");
    }

    let intervals = cohort::build_cohorts(&buckets.intervals);
    let summary = summary::summarize(&intervals);

    if summary.is_none() && !intervals.is_empty() {
        warn!("Only one interval available, retention cannot be compared");
    }

    RetentionReport {
        source: source.to_string(),
        config: config.clone(),
        generated_at: Utc::now(),
        total_records: records.len(),
        bucketed_records: buckets.bucketed(),
        dropped_records: buckets.dropped,
        filtered_records: buckets.filtered,
        participants: build_roster(&buckets),
        intervals,
        summary,
    }
}

/// Participants in order of first appearance. The first non-empty email and
/// display name seen for a participant win.
fn build_roster(buckets: &Buckets<'_>) -> IndexMap<String, ParticipantProfile> {
    buckets
        .intervals
        .values()
        .flatten()
        .fold(IndexMap::new(), |mut roster, record| {
            let Some(id) = &record.participant_id else {
                return roster;
            };

            let profile: &mut ParticipantProfile = roster.entry(id.clone()).or_default();
            if profile.email.is_none() {
                profile.email = non_empty(record.email.as_deref());
            }
            if profile.display_name.is_none() {
                profile.display_name = non_empty(record.display_name.as_deref());
            }

            roster
        })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
