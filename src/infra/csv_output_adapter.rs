use tracing::info;

use crate::app::ports::GrantOutputPort;
use crate::error::Result;
use crate::infra::atomic_file::write_atomically;
use crate::pipeline::export::{encode_csv, Column, GRANT_COLUMNS};
use crate::types::Grant;
use std::path::Path;

/// Writes one CSV row per grant under a fixed header
pub struct CsvOutputAdapter {
    file_path: String,
    columns: &'static [Column],
}

impl CsvOutputAdapter {
    pub fn new(file_path: &str) -> Self {
        Self::with_columns(file_path, GRANT_COLUMNS)
    }

    pub fn with_columns(file_path: &str, columns: &'static [Column]) -> Self {
        Self {
            file_path: file_path.to_string(),
            columns,
        }
    }
}

impl GrantOutputPort for CsvOutputAdapter {
    fn write_grants(&self, grants: &[Grant]) -> Result<()> {
        let bytes = encode_csv(grants, self.columns)?;
        write_atomically(Path::new(&self.file_path), &bytes)?;
        info!("Wrote {} grant rows to {}", grants.len(), self.file_path);
        Ok(())
    }

    fn destination(&self) -> &str {
        &self.file_path
    }
}
