use alloy_primitives::keccak256;
use serde::Deserialize;

use crate::error::{ExportError, Result};

const VESTING_ABI_JSON: &str = include_str!("../../abi/vesting.json");

#[derive(Debug, Deserialize)]
struct AbiItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<AbiParam>,
}

#[derive(Debug, Deserialize)]
struct AbiParam {
    #[serde(rename = "type")]
    kind: String,
}

/// 4-byte selectors of the vesting contract methods the exporter calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VestingAbi {
    pub token: [u8; 4],
    pub released: [u8; 4],
    pub releasable_amount: [u8; 4],
}

impl VestingAbi {
    /// Selectors from the bundled `abi/vesting.json`
    pub fn bundled() -> Result<Self> {
        Self::from_json(VESTING_ABI_JSON)
    }

    pub fn from_json(abi: &str) -> Result<Self> {
        let items: Vec<AbiItem> = serde_json::from_str(abi)?;
        Ok(Self {
            token: find_selector(&items, "token")?,
            released: find_selector(&items, "released")?,
            releasable_amount: find_selector(&items, "releasableAmount")?,
        })
    }
}

fn find_selector(items: &[AbiItem], name: &str) -> Result<[u8; 4]> {
    let item = items
        .iter()
        .find(|item| item.kind == "function" && item.name == name)
        .ok_or_else(|| ExportError::Config(format!("vesting ABI has no function '{}'", name)))?;
    let params: Vec<&str> = item.inputs.iter().map(|p| p.kind.as_str()).collect();
    Ok(selector(&format!("{}({})", item.name, params.join(","))))
}

pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}
