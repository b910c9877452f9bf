use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_BLOCK_TAG, DEFAULT_CONCURRENCY, DEFAULT_CONFIG_FILE, DEFAULT_CSV_OUTPUT,
    DEFAULT_JSON_OUTPUT, DEFAULT_RPC_TIMEOUT_SECS, RPC_URL_ENV,
};
use crate::error::{ExportError, Result};
use crate::pipeline::enrich::{EnrichOptions, FailurePolicy};
use crate::tokens::{TokenInfo, TokenTable};

/// Contents of the optional `grants.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub rpc: RpcSection,
    pub enrich: EnrichSection,
    pub output: OutputSection,
    pub tokens: Vec<TokenEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RpcSection {
    pub url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub requests_per_min: Option<u64>,
    pub block: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichSection {
    pub concurrency: Option<usize>,
    pub on_error: Option<FailurePolicy>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub json: Option<String>,
    pub csv: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenEntry {
    pub address: String,
    pub symbol: String,
    pub decimals: u32,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ExportError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Values given on the command line; these win over every other source
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub json_out: Option<String>,
    pub csv_out: Option<String>,
    pub rpc_url: Option<String>,
    pub block: Option<String>,
    pub concurrency: Option<usize>,
    pub requests_per_min: Option<u64>,
    pub on_error: Option<FailurePolicy>,
    pub skip_vesting: bool,
}

#[derive(Debug, Clone)]
pub struct RpcSettings {
    pub url: String,
    pub block: String,
    pub timeout: Duration,
    pub requests_per_min: Option<u64>,
}

/// Fully resolved settings for one export run
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub input: PathBuf,
    pub json_output: String,
    pub csv_output: String,
    /// `None` when vesting contracts are not queried
    pub rpc: Option<RpcSettings>,
    pub tokens: TokenTable,
    pub enrich: EnrichOptions,
}

impl ExportConfig {
    /// Resolve defaults < config file < environment < command line
    pub fn load(overrides: Overrides) -> Result<Self> {
        let file = match &overrides.config {
            Some(path) => FileConfig::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                FileConfig::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => FileConfig::default(),
        };
        let env_rpc_url = std::env::var(RPC_URL_ENV).ok();
        Self::resolve(file, env_rpc_url, overrides)
    }

    pub fn resolve(file: FileConfig, env_rpc_url: Option<String>, cli: Overrides) -> Result<Self> {
        let mut tokens = TokenTable::with_defaults();
        for entry in &file.tokens {
            tokens
                .insert(&entry.address, TokenInfo::new(entry.symbol.clone(), entry.decimals))
                .map_err(|e| ExportError::Config(format!("bad [[tokens]] entry: {}", e)))?;
        }

        let concurrency = cli
            .concurrency
            .or(file.enrich.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(ExportError::Config("concurrency must be at least 1".to_string()));
        }
        let on_error = cli.on_error.or(file.enrich.on_error).unwrap_or_default();

        let rpc = if cli.skip_vesting {
            None
        } else {
            let url = cli
                .rpc_url
                .or(env_rpc_url)
                .or(file.rpc.url)
                .filter(|url| !url.trim().is_empty())
                .ok_or_else(|| {
                    ExportError::Config(format!(
                        "no RPC URL configured: set {}, pass --rpc-url, or add [rpc].url (use --skip-vesting to export without vesting state)",
                        RPC_URL_ENV
                    ))
                })?;
            let requests_per_min = cli.requests_per_min.or(file.rpc.requests_per_min);
            if requests_per_min == Some(0) {
                return Err(ExportError::Config("requests_per_min must be at least 1".to_string()));
            }
            Some(RpcSettings {
                url,
                block: cli
                    .block
                    .or(file.rpc.block)
                    .unwrap_or_else(|| DEFAULT_BLOCK_TAG.to_string()),
                timeout: Duration::from_secs(
                    file.rpc.timeout_seconds.unwrap_or(DEFAULT_RPC_TIMEOUT_SECS),
                ),
                requests_per_min,
            })
        };

        Ok(Self {
            input: cli.input,
            json_output: cli
                .json_out
                .or(file.output.json)
                .unwrap_or_else(|| DEFAULT_JSON_OUTPUT.to_string()),
            csv_output: cli
                .csv_out
                .or(file.output.csv)
                .unwrap_or_else(|| DEFAULT_CSV_OUTPUT.to_string()),
            rpc,
            tokens,
            enrich: EnrichOptions {
                concurrency,
                on_error,
            },
        })
    }
}
