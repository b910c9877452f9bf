use serde_json::Value;

use crate::error::{ExportError, Result};
use crate::types::Grant;

/// A CSV column: the grant field it reads and its header label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub field: &'static str,
    pub title: &'static str,
}

const fn column(field: &'static str, title: &'static str) -> Column {
    Column { field, title }
}

/// Fixed column layout of `grants.csv`
pub const GRANT_COLUMNS: &[Column] = &[
    column("id", "Proposal ID"),
    column("snapshot_id", "Snapshot ID"),
    column("user", "Author"),
    column("title", "Title"),
    column("status", "Status"),
    column("start_at", "Started"),
    column("finish_at", "Ended"),
    column("required_to_pass", "Threshold"),
    column("scores_total", "Total VP"),
    column("grant_category", "Category"),
    column("grant_tier", "Tier"),
    column("grant_size", "Amount USD"),
    column("grant_beneficiary", "Beneficiary"),
    column("vesting_address", "Vesting Contract"),
    column("token", "Token"),
    column("released", "Released Amount"),
    column("releasable", "Releasable Amount"),
];

pub fn header_row(columns: &[Column]) -> Vec<&'static str> {
    columns.iter().map(|c| c.title).collect()
}

/// Stringify one field for CSV; absent and null fields become empty cells
pub fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

pub fn grant_row(grant: &Grant, columns: &[Column]) -> Result<Vec<String>> {
    record_row(&serde_json::to_value(grant)?, columns)
}

/// One CSV row from a serialized grant record, which must be a JSON object
pub fn record_row(record: &Value, columns: &[Column]) -> Result<Vec<String>> {
    let object = record.as_object().ok_or_else(|| {
        ExportError::Export(format!("grant record is not a JSON object: {record}"))
    })?;
    Ok(columns
        .iter()
        .map(|c| render_cell(object.get(c.field)))
        .collect())
}

/// Pretty-printed JSON array of grants
pub fn encode_json(grants: &[Grant]) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(grants)?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn encode_csv(grants: &[Grant], columns: &[Column]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header_row(columns))?;
    for grant in grants {
        writer.write_record(grant_row(grant, columns)?)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}
