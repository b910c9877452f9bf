use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use grant_exporter::app::export_use_case::ExportGrantsUseCase;
use grant_exporter::app::ports::{GrantOutputPort, VestingContractPort};
use grant_exporter::config::{ExportConfig, Overrides};
use grant_exporter::infra::csv_output_adapter::CsvOutputAdapter;
use grant_exporter::infra::json_output_adapter::JsonOutputAdapter;
use grant_exporter::infra::rpc_client::{JsonRpcClient, RpcVestingContract};
use grant_exporter::infra::vesting_abi::VestingAbi;
use grant_exporter::observability::{self, metrics};
use grant_exporter::pipeline::enrich::{FailurePolicy, GrantEnricher};
use grant_exporter::pipeline::rate_limiter::{Limits, RateLimiter};

/// Exit status when the export finished but some grants lack vesting state
const EXIT_PARTIAL: i32 = 2;

#[derive(Parser)]
#[command(name = "export-grants")]
#[command(about = "Export grant proposals with on-chain vesting state to JSON and CSV")]
#[command(version = "0.1.0")]
struct Cli {
    /// Proposals file (JSON array) to read
    #[arg(long)]
    input: PathBuf,
    /// Configuration file (defaults to ./grants.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Where to write the JSON export
    #[arg(long)]
    json_out: Option<String>,
    /// Where to write the CSV export
    #[arg(long)]
    csv_out: Option<String>,
    /// Ethereum JSON-RPC endpoint (overrides INFURA_URL)
    #[arg(long)]
    rpc_url: Option<String>,
    /// Block to read vesting state at: "latest" or a block number
    #[arg(long)]
    block: Option<String>,
    /// Number of grants enriched concurrently
    #[arg(long)]
    concurrency: Option<usize>,
    /// Upper bound on RPC calls per minute
    #[arg(long)]
    requests_per_min: Option<u64>,
    /// What to do when a vesting contract cannot be read
    #[arg(long, value_enum)]
    on_error: Option<FailurePolicy>,
    /// Export grants without querying vesting contracts
    #[arg(long)]
    skip_vesting: bool,
    /// Directory for the rotating JSON log file
    #[arg(long, default_value = "logs")]
    log_dir: String,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            input: self.input.clone(),
            config: self.config.clone(),
            json_out: self.json_out.clone(),
            csv_out: self.csv_out.clone(),
            rpc_url: self.rpc_url.clone(),
            block: self.block.clone(),
            concurrency: self.concurrency,
            requests_per_min: self.requests_per_min,
            on_error: self.on_error,
            skip_vesting: self.skip_vesting,
        }
    }
}

fn build_contract(config: &ExportConfig) -> anyhow::Result<Option<Arc<dyn VestingContractPort>>> {
    let Some(rpc) = &config.rpc else {
        info!("Vesting contract lookups disabled");
        return Ok(None);
    };
    let limiter = RateLimiter::new(Limits {
        requests_per_min: rpc.requests_per_min,
    });
    let client = JsonRpcClient::new(&rpc.url, &rpc.block, rpc.timeout, limiter)
        .context("failed to build RPC client")?;
    let abi = VestingAbi::bundled().context("bundled vesting ABI is invalid")?;
    info!("Reading vesting contracts at block {}", rpc.block);
    let contract: Arc<dyn VestingContractPort> = Arc::new(RpcVestingContract::new(client, abi));
    Ok(Some(contract))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let log_guard = observability::init_logging(&cli.log_dir);
    if let Err(e) = metrics::init() {
        warn!("Metrics disabled: {}", e);
    }

    let config = ExportConfig::load(cli.overrides()).context("invalid configuration")?;
    let enricher = GrantEnricher::new(
        config.tokens.clone(),
        build_contract(&config)?,
        config.enrich.clone(),
    );
    let outputs: Vec<Box<dyn GrantOutputPort>> = vec![
        Box::new(JsonOutputAdapter::new(&config.json_output)),
        Box::new(CsvOutputAdapter::new(&config.csv_output)),
    ];
    let use_case = ExportGrantsUseCase::new(enricher, outputs);

    let result = use_case.run(&config.input).await;
    metrics::push_all_metrics().await;
    let summary =
        result.with_context(|| format!("grant export from {} failed", config.input.display()))?;

    println!("{} grants found.", summary.grants_exported);
    println!(
        "   {} of {} proposals were grants, {} with vesting state",
        summary.grants_exported, summary.proposals_read, summary.with_vesting_state
    );
    for destination in &summary.destinations {
        println!("   Output file: {}", destination);
    }

    if !summary.is_complete() {
        println!("\n⚠️  {} grants exported without vesting state:", summary.failures.len());
        for failure in &summary.failures {
            error!("Proposal {} incomplete: {}", failure.proposal_id, failure.error);
            println!("   - {}: {}", failure.proposal_id, failure.error);
        }
        drop(log_guard);
        std::process::exit(EXIT_PARTIAL);
    }
    Ok(())
}
