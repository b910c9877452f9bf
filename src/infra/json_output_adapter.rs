use tracing::info;

use crate::app::ports::GrantOutputPort;
use crate::error::Result;
use crate::infra::atomic_file::write_atomically;
use crate::pipeline::export::encode_json;
use crate::types::Grant;
use std::path::Path;

/// Writes the grant collection as a pretty-printed JSON array
pub struct JsonOutputAdapter {
    file_path: String,
}

impl JsonOutputAdapter {
    pub fn new(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
        }
    }
}

impl GrantOutputPort for JsonOutputAdapter {
    fn write_grants(&self, grants: &[Grant]) -> Result<()> {
        let bytes = encode_json(grants)?;
        write_atomically(Path::new(&self.file_path), &bytes)?;
        info!("Wrote {} grants to {}", grants.len(), self.file_path);
        Ok(())
    }

    fn destination(&self) -> &str {
        &self.file_path
    }
}
