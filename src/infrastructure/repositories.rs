//! Persistence of canonical records

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::domain::VulnerabilityRecord;

/// Trait for persisting canonical records
pub trait RecordRepository: Send + Sync {
    /// Persist a record under the given name, returning where it landed
    fn save(&self, record: &VulnerabilityRecord, name: &str) -> io::Result<PathBuf>;
}

/// Repository writing records as pretty-printed JSON files
pub struct FileRecordRepository {
    output_dir: PathBuf,
}

impl FileRecordRepository {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl RecordRepository for FileRecordRepository {
    fn save(&self, record: &VulnerabilityRecord, name: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}.json", name));
        let body = serde_json::to_string_pretty(record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&path, body)?;
        tracing::debug!(path = %path.display(), "record written");
        Ok(path)
    }
}
