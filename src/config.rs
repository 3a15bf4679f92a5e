use std::fmt;

use chrono::{Datelike, Days, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{CohortLensError, Result};

/// Granularity at which records are bucketed before cohorts are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Day,
    Week,
    #[default]
    Month,
    Quarter,
}

impl GroupBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
        }
    }

    /// Formats the key of the bucket containing `date`.
    ///
    /// Keys are fixed-width and start with the year, so sorting them as
    /// strings sorts them chronologically. Weeks are keyed by their Monday.
    pub fn interval_key(self, date: NaiveDate) -> String {
        match self {
            Self::Day => date.format("%Y-%m-%d").to_string(),
            Self::Week => {
                let offset = u64::from(date.weekday().num_days_from_monday());
                date.checked_sub_days(Days::new(offset))
                    .unwrap_or(date)
                    .format("%Y-%m-%d")
                    .to_string()
            }
            Self::Month => date.format("%Y-%m").to_string(),
            Self::Quarter => format!("{:04}-Q{}", date.year(), date.month0() / 3 + 1),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter state shared by every stage of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub group_by: GroupBy,
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl AnalysisConfig {
    pub fn new(
        group_by: GroupBy,
        since: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> Result<Self> {
        if let (Some(since), Some(until)) = (since, until) {
            if since > until {
                return Err(CohortLensError::ConfigError(format!(
                    "window start {since} is after window end {until}"
                )));
            }
        }

        Ok(Self {
            group_by,
            since,
            until,
        })
    }

    /// Both window bounds are inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.since.map_or(true, |since| date >= since)
            && self.until.map_or(true, |until| date <= until)
    }

    pub fn describe_window(&self) -> String {
        match (self.since, self.until) {
            (Some(since), Some(until)) => format!("{since} to {until}"),
            (Some(since), None) => format!("since {since}"),
            (None, Some(until)) => format!("until {until}"),
            (None, None) => "all time".to_string(),
        }
    }
}
