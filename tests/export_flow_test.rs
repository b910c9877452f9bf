use alloy_primitives::{Address, U256};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Number, Value};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

use grant_exporter::app::export_use_case::ExportGrantsUseCase;
use grant_exporter::app::ports::{GrantOutputPort, VestingContractPort};
use grant_exporter::error::ExportError;
use grant_exporter::infra::csv_output_adapter::CsvOutputAdapter;
use grant_exporter::infra::json_output_adapter::JsonOutputAdapter;
use grant_exporter::pipeline::enrich::{EnrichOptions, FailurePolicy, GrantEnricher};
use grant_exporter::tokens::TokenTable;

const DAI: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";
const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
const UNKNOWN_TOKEN: &str = "0x000000000000000000000000000000000000dead";

/// In-memory vesting contracts keyed by contract address
#[derive(Default)]
struct FakeVesting {
    contracts: HashMap<Address, (Address, U256, U256)>,
    calls: AtomicUsize,
}

impl FakeVesting {
    fn with(mut self, vesting: &str, token: &str, released: &str, releasable: &str) -> Self {
        self.contracts.insert(
            Address::from_str(vesting).unwrap(),
            (
                Address::from_str(token).unwrap(),
                U256::from_str(released).unwrap(),
                U256::from_str(releasable).unwrap(),
            ),
        );
        self
    }

    fn state(&self, vesting: Address) -> grant_exporter::error::Result<(Address, U256, U256)> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.contracts.get(&vesting).copied().ok_or(ExportError::Rpc {
            code: -32000,
            message: "execution reverted".to_string(),
        })
    }
}

#[async_trait]
impl VestingContractPort for FakeVesting {
    async fn token(&self, vesting: Address) -> grant_exporter::error::Result<Address> {
        Ok(self.state(vesting)?.0)
    }

    async fn released(&self, vesting: Address) -> grant_exporter::error::Result<U256> {
        Ok(self.state(vesting)?.1)
    }

    async fn releasable_amount(&self, vesting: Address) -> grant_exporter::error::Result<U256> {
        Ok(self.state(vesting)?.2)
    }
}

fn grant(id: &str, vesting: Option<&str>) -> Value {
    json!({
        "id": id,
        "snapshot_id": format!("Qm{}", id),
        "user": "0xauthor",
        "title": format!("Grant {}", id),
        "type": "grant",
        "status": "enacted",
        "start_at": "2022-01-01T00:00:00.000Z",
        "finish_at": "2022-01-15T00:00:00.000Z",
        "required_to_pass": 2000000,
        "scores_total": 3000000,
        "vesting_address": vesting,
        "configuration": {
            "category": "Platform",
            "tier": "Tier 3: up to $5,000 USD, 3 months vesting",
            "size": 5000,
            "beneficiary": "0xbeneficiary"
        }
    })
}

/// Exact JSON number, compared by its text
fn amount(text: &str) -> Value {
    Value::Number(Number::from_str(text).unwrap())
}

struct Harness {
    use_case: ExportGrantsUseCase,
    json_path: String,
    csv_path: String,
    _dir: tempfile::TempDir,
}

fn harness(contract: Option<Arc<dyn VestingContractPort>>, options: EnrichOptions) -> Harness {
    let dir = tempdir().unwrap();
    let json_path = dir.path().join("grants.json").to_str().unwrap().to_string();
    let csv_path = dir.path().join("grants.csv").to_str().unwrap().to_string();
    let outputs: Vec<Box<dyn GrantOutputPort>> = vec![
        Box::new(JsonOutputAdapter::new(&json_path)),
        Box::new(CsvOutputAdapter::new(&csv_path)),
    ];
    let enricher = GrantEnricher::new(TokenTable::with_defaults(), contract, options);
    Harness {
        use_case: ExportGrantsUseCase::new(enricher, outputs),
        json_path,
        csv_path,
        _dir: dir,
    }
}

fn read_json(path: &str) -> Vec<Value> {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn read_csv(path: &str) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn grant_without_vesting_gets_grant_fields_only() -> Result<()> {
    let contract = Arc::new(FakeVesting::default());
    let h = harness(Some(contract.clone()), EnrichOptions::default());

    let summary = h.use_case.export(vec![grant("g1", None)]).await?;
    assert_eq!(summary.grants_exported, 1);
    assert_eq!(summary.with_vesting_state, 0);
    assert!(summary.is_complete());
    assert_eq!(contract.calls.load(Ordering::SeqCst), 0);

    let records = read_json(&h.json_path);
    let record = &records[0];
    assert_eq!(record["grant_category"], json!("Platform"));
    assert_eq!(record["grant_tier"], json!("Tier 3"));
    assert_eq!(record["grant_size"], json!(5000));
    assert_eq!(record["grant_beneficiary"], json!("0xbeneficiary"));
    assert!(record.get("token").is_none());
    assert!(record.get("released").is_none());
    assert!(record.get("releasable").is_none());

    let rows = read_csv(&h.csv_path);
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[1][9..13], &["Platform", "Tier 3", "5000", "0xbeneficiary"]);
    assert_eq!(&rows[1][13..], &["", "", "", ""]);
    Ok(())
}

#[tokio::test]
async fn vesting_state_is_converted_with_token_decimals() -> Result<()> {
    let vesting = "0x00000000000000000000000000000000000c0ffe";
    let contract = Arc::new(FakeVesting::default().with(
        vesting,
        DAI,
        "5000000000000000000",
        "2500000000000000000",
    ));
    let h = harness(Some(contract.clone()), EnrichOptions::default());

    let summary = h.use_case.export(vec![grant("g1", Some(vesting))]).await?;
    assert_eq!(summary.with_vesting_state, 1);
    assert_eq!(contract.calls.load(Ordering::SeqCst), 3);

    let record = &read_json(&h.json_path)[0];
    assert_eq!(record["token"], json!("DAI"));
    assert_eq!(record["released"], amount("5"));
    assert_eq!(record["releasable"], amount("2.5"));
    let raw = std::fs::read_to_string(&h.json_path)?;
    assert!(raw.contains("\"releasable\": 2.5"), "amounts are JSON numbers: {raw}");

    let rows = read_csv(&h.csv_path);
    assert_eq!(&rows[1][13..], &[vesting, "DAI", "5", "2.5"]);
    Ok(())
}

#[tokio::test]
async fn six_decimal_tokens_convert_exactly() -> Result<()> {
    let vesting = "0x0000000000000000000000000000000000000b0b";
    let contract = Arc::new(FakeVesting::default().with(vesting, USDC, "12345678901", "1"));
    let h = harness(Some(contract), EnrichOptions::default());

    h.use_case.export(vec![grant("g1", Some(vesting))]).await?;
    let record = &read_json(&h.json_path)[0];
    assert_eq!(record["token"], json!("USDC"));
    assert_eq!(record["released"], amount("12345.678901"));
    assert_eq!(record["releasable"], amount("0.000001"));
    Ok(())
}

#[tokio::test]
async fn unknown_token_aborts_and_writes_nothing() {
    let vesting = "0x0000000000000000000000000000000000000bad";
    let contract = Arc::new(FakeVesting::default().with(vesting, UNKNOWN_TOKEN, "1", "1"));
    let h = harness(Some(contract.clone()), EnrichOptions::default());

    let err = h
        .use_case
        .export(vec![grant("g1", None), grant("g2", Some(vesting))])
        .await
        .unwrap_err();
    match err {
        ExportError::Enrichment {
            proposal_id,
            source,
        } => {
            assert_eq!(proposal_id, "g2");
            assert!(matches!(*source, ExportError::UnknownToken { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    // the token lookup fails before released/releasable are read
    assert_eq!(contract.calls.load(Ordering::SeqCst), 1);
    assert!(!Path::new(&h.json_path).exists());
    assert!(!Path::new(&h.csv_path).exists());
}

#[tokio::test]
async fn skip_policy_exports_failed_grants_without_vesting_state() -> Result<()> {
    let good = "0x0000000000000000000000000000000000000001";
    let reverting = "0x0000000000000000000000000000000000000002";
    let contract = Arc::new(FakeVesting::default().with(
        good,
        DAI,
        "1000000000000000000",
        "0",
    ));
    let h = harness(
        Some(contract),
        EnrichOptions {
            concurrency: 1,
            on_error: FailurePolicy::Skip,
        },
    );

    let summary = h
        .use_case
        .export(vec![
            grant("g1", Some(reverting)),
            grant("g2", Some(good)),
        ])
        .await?;

    assert_eq!(summary.grants_exported, 2);
    assert_eq!(summary.with_vesting_state, 1);
    assert!(!summary.is_complete());
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].proposal_id, "g1");
    assert!(matches!(summary.failures[0].error, ExportError::Rpc { .. }));

    let records = read_json(&h.json_path);
    assert_eq!(records[0]["id"], json!("g1"));
    assert_eq!(records[0]["grant_tier"], json!("Tier 3"));
    assert!(records[0].get("token").is_none());
    assert_eq!(records[1]["token"], json!("DAI"));
    assert_eq!(records[1]["released"], amount("1"));
    assert_eq!(records[1]["releasable"], amount("0"));
    Ok(())
}

#[tokio::test]
async fn concurrent_enrichment_preserves_input_order() -> Result<()> {
    let mut contract = FakeVesting::default();
    let mut input = Vec::new();
    for i in 1..=12u32 {
        let vesting = format!("0x{:040x}", i);
        contract = contract.with(&vesting, DAI, &format!("{}000000000000000000", i), "0");
        input.push(grant(&format!("g{:02}", i), Some(&vesting)));
    }
    let h = harness(
        Some(Arc::new(contract)),
        EnrichOptions {
            concurrency: 4,
            on_error: FailurePolicy::Abort,
        },
    );

    let summary = h.use_case.export(input).await?;
    assert_eq!(summary.with_vesting_state, 12);

    let records = read_json(&h.json_path);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record["id"], json!(format!("g{:02}", i + 1)));
        assert_eq!(record["released"], amount(&(i + 1).to_string()));
    }
    Ok(())
}

#[tokio::test]
async fn fixture_file_exports_only_grants() -> Result<()> {
    let contract = Arc::new(FakeVesting::default().with(
        "0x00000000000000000000000000000000000c0ffe",
        DAI,
        "22500000000000000000000",
        "7500000000000000000000",
    ));
    let h = harness(Some(contract), EnrichOptions::default());

    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/resources/proposals.json");
    let summary = h.use_case.run(&fixture).await?;
    assert_eq!(summary.proposals_read, 3);
    assert_eq!(summary.grants_exported, 2);
    assert_eq!(summary.destinations, vec![h.json_path.clone(), h.csv_path.clone()]);

    let records = read_json(&h.json_path);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["grant_tier"], json!("Tier 1"));
    // untyped input fields are carried through
    assert_eq!(records[0]["snapshot_space"], json!("snapshot.dcl.eth"));
    assert_eq!(records[0]["enacted"], json!(true));
    assert_eq!(records[1]["token"], json!("DAI"));
    assert_eq!(records[1]["released"], amount("22500"));
    assert_eq!(records[1]["releasable"], amount("7500"));

    let rows = read_csv(&h.csv_path);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], "Proposal ID");
    assert_eq!(rows[0][16], "Releasable Amount");
    assert_eq!(rows[1][8], "3120455.75");
    assert_eq!(rows[2][11], "45000");
    assert_eq!(rows[2][14], "DAI");
    Ok(())
}

#[tokio::test]
async fn irregular_polls_next_to_grants_are_ignored() -> Result<()> {
    let h = harness(None, EnrichOptions::default());

    let summary = h
        .use_case
        .export(vec![
            json!({ "id": "poll-1", "type": "poll", "configuration": { "choices": ["yes", "no"] } }),
            json!({ "id": "poll-2", "type": "poll", "user": "0xabc", "title": "t",
                    "status": "passed", "scores_total": "12.5" }),
            grant("g1", None),
        ])
        .await?;
    assert_eq!(summary.proposals_read, 3);
    assert_eq!(summary.grants_exported, 1);
    assert_eq!(read_json(&h.json_path)[0]["id"], json!("g1"));
    Ok(())
}
