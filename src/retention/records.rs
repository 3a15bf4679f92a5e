use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One attendance or engagement row as delivered by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(default, alias = "date", alias = "intervalKey")]
    pub timestamp: Option<String>,
    #[serde(
        default,
        alias = "userId",
        deserialize_with = "deserialize_participant_id"
    )]
    pub participant_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl AttendanceRecord {
    #[cfg(test)]
    pub fn new(timestamp: &str, participant_id: &str) -> Self {
        Self {
            timestamp: Some(timestamp.to_string()),
            participant_id: Some(participant_id.to_string()),
            ..Self::default()
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

/// Payloads arrive either as a bare array or wrapped in a `data` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RecordPayload {
    Rows(Vec<AttendanceRecord>),
    Envelope { data: Vec<AttendanceRecord> },
}

impl RecordPayload {
    pub fn into_records(self) -> Vec<AttendanceRecord> {
        match self {
            Self::Rows(rows) | Self::Envelope { data: rows } => rows,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawParticipantId {
    Text(String),
    Number(serde_json::Number),
}

fn deserialize_participant_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawParticipantId>::deserialize(deserializer)?;

    Ok(raw
        .map(|id| match id {
            RawParticipantId::Text(text) => text.trim().to_string(),
            RawParticipantId::Number(number) => number.to_string(),
        })
        .filter(|id| !id.is_empty()))
}

/// Accepts plain dates, RFC 3339 timestamps (normalised to UTC), naive
/// date-times without an offset, and pre-aggregated interval keys
/// (`YYYY-MM`, `YYYY-Qn`) which resolve to the first day of their period.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    if let Some(date) = parse_period_key(raw) {
        return Some(date);
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.with_timezone(&Utc).date_naive());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|datetime| datetime.date())
}

fn parse_period_key(raw: &str) -> Option<NaiveDate> {
    let (year, period) = raw.split_once('-')?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year.parse().ok()?;

    let month = match period.strip_prefix('Q') {
        Some(quarter) if quarter.len() == 1 => match quarter.parse::<u32>().ok()? {
            quarter @ 1..=4 => (quarter - 1) * 3 + 1,
            _ => return None,
        },
        Some(_) => return None,
        None if period.len() == 2 && period.bytes().all(|b| b.is_ascii_digit()) => {
            period.parse().ok()?
        }
        None => return None,
    };

    NaiveDate::from_ymd_opt(year, month, 1)
}
