use std::path::PathBuf;

use log::info;
use tokio::io::AsyncReadExt;

use super::RecordSource;
use crate::config::AnalysisConfig;
use crate::error::{CohortLensError, Result};
use crate::retention::{AttendanceRecord, RecordPayload};

/// Reads a JSON payload from disk, or from stdin when the path is `-`.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn is_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }

    async fn read_payload(&self) -> Result<String> {
        if self.is_stdin() {
            let mut contents = String::new();
            tokio::io::stdin().read_to_string(&mut contents).await?;
            return Ok(contents);
        }

        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}

impl RecordSource for FileSource {
    fn describe(&self) -> String {
        if self.is_stdin() {
            "stdin".to_string()
        } else {
            self.path.display().to_string()
        }
    }

    async fn load(&self, _config: &AnalysisConfig) -> Result<Vec<AttendanceRecord>> {
        let contents = self.read_payload().await?;

        let records = serde_json::from_str::<RecordPayload>(&contents)
            .map_err(|source| CohortLensError::DecodeError {
                origin: self.describe(),
                source,
            })?
            .into_records();

        info!("Read {} records from {}", records.len(), self.describe());

        Ok(records)
    }
}
