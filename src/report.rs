use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct RetentionReport {
    pub source: String,
    pub config: AnalysisConfig,
    pub generated_at: DateTime<Utc>,
    pub total_records: usize,
    pub bucketed_records: usize,
    pub dropped_records: usize,
    pub filtered_records: usize,
    pub intervals: Vec<CohortInterval>,
    /// `None` when fewer than two intervals exist.
    pub summary: Option<RetentionSummary>,
    pub participants: IndexMap<String, ParticipantProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortInterval {
    pub interval_key: String,
    pub participants: BTreeSet<String>,
    pub previous_participants: BTreeSet<String>,
    pub retained_participants: BTreeSet<String>,
    /// `None` when there is no previous interval to compare against.
    pub retention_rate: Option<f64>,
    pub growth: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionSummary {
    pub intervals_compared: usize,
    pub average_retention_rate: Option<f64>,
    pub highest_retention: Option<IntervalRate>,
    pub lowest_retention: Option<IntervalRate>,
    pub highest_growth: Option<IntervalGrowth>,
    pub total_participants: usize,
    pub unique_participants: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalRate {
    pub interval_key: String,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalGrowth {
    pub interval_key: String,
    pub growth: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantProfile {
    pub email: Option<String>,
    pub display_name: Option<String>,
}
