use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

use crate::constants::GRANT_PROPOSAL_TYPE;
use crate::error::{ExportError, Result};
use crate::types::Proposal;

/// Read the full proposal collection from a JSON array file.
///
/// Records stay untyped here: only grants are decoded into [`Proposal`], so a
/// poll or ban proposal with a different shape never blocks the export.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_proposals(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path.as_ref())?;
    let proposals = parse_proposals(&content)?;
    info!("Loaded {} proposals", proposals.len());
    Ok(proposals)
}

pub fn parse_proposals(json: &str) -> Result<Vec<Value>> {
    Ok(serde_json::from_str(json)?)
}

/// Whether a raw record's `type` is exactly `"grant"`
pub fn is_grant_record(record: &Value) -> bool {
    record.get("type").and_then(Value::as_str) == Some(GRANT_PROPOSAL_TYPE)
}

/// Keep only grant proposals, in their original order, and decode them
pub fn filter_grants(records: Vec<Value>) -> Result<Vec<Proposal>> {
    records
        .into_iter()
        .filter(is_grant_record)
        .map(|record| serde_json::from_value(record).map_err(ExportError::from))
        .collect()
}
