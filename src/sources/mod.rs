pub mod file;
pub mod http;

use std::future::Future;

use log::{info, warn};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::report::RetentionReport;
use crate::retention::{self, AttendanceRecord};

pub use file::FileSource;
pub use http::HttpSource;

/// Somewhere attendance records can be loaded from.
pub trait RecordSource {
    fn describe(&self) -> String;

    fn load(&self, config: &AnalysisConfig)
        -> impl Future<Output = Result<Vec<AttendanceRecord>>> + Send;
}

pub async fn collect_report<S: RecordSource>(
    source: &S,
    config: &AnalysisConfig,
) -> Result<RetentionReport> {
    let origin = source.describe();
    info!("Loading attendance records from {origin}");

    let records = source.load(config).await?;

    if records.is_empty() {
        warn!("{origin} returned no records");
    }

    Ok(retention::analyze(&origin, &records, config))
}
