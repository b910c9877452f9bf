use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Unknown token {address} reported by vesting contract {vesting}")]
    UnknownToken { address: String, vesting: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Failed to decode contract response: {0}")]
    Decode(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Enrichment failed for proposal {proposal_id}: {source}")]
    Enrichment {
        proposal_id: String,
        #[source]
        source: Box<ExportError>,
    },
}

impl ExportError {
    pub fn enrichment(proposal_id: impl Into<String>, source: ExportError) -> Self {
        ExportError::Enrichment {
            proposal_id: proposal_id.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
