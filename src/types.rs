use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::Result;

/// Governance proposal as published by the governance dApp.
///
/// Only the fields the exporter reads or re-emits are typed; everything else
/// lands in `extra` and is written back untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Proposal {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    pub user: String,
    pub title: String,
    #[serde(rename = "type")]
    pub proposal_type: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_to_pass: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores_total: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vesting_address: Option<String>,
    #[serde(default)]
    pub configuration: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Proposal {
    /// The vesting contract address, treating `null` and `""` as absent
    pub fn vesting_address(&self) -> Option<&str> {
        self.vesting_address
            .as_deref()
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
    }

    pub fn grant_configuration(&self) -> Result<GrantConfiguration> {
        if self.configuration.is_null() {
            return Ok(GrantConfiguration::default());
        }
        Ok(GrantConfiguration::deserialize(&self.configuration)?)
    }
}

/// Grant-specific part of a proposal's `configuration` object
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GrantConfiguration {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub size: Option<Number>,
    #[serde(default)]
    pub beneficiary: Option<String>,
}

impl GrantConfiguration {
    /// Tier label without its description, e.g. `"Tier 3"` for
    /// `"Tier 3: up to $5,000 USD in MANA, one time payment"`.
    pub fn tier_label(&self) -> Option<String> {
        self.tier
            .as_deref()
            .map(|tier| tier.split(':').next().unwrap_or(tier).to_string())
    }
}

/// A grant proposal with its derived grant fields and vesting state
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Grant {
    #[serde(flatten)]
    pub proposal: Proposal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_size: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_beneficiary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released: Option<TokenAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub releasable: Option<TokenAmount>,
}

impl Grant {
    /// Copies a proposal into a grant, with every grant field unset
    pub fn from_proposal(proposal: Proposal) -> Self {
        Self {
            proposal,
            grant_category: None,
            grant_tier: None,
            grant_size: None,
            grant_beneficiary: None,
            token: None,
            released: None,
            releasable: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.proposal.id
    }

    pub fn has_vesting_state(&self) -> bool {
        self.token.is_some()
    }
}

/// Exact human-readable token amount (raw on-chain integer / 10^decimals)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAmount(BigDecimal);

impl TokenAmount {
    pub fn new(value: BigDecimal) -> Self {
        Self(value.normalized())
    }

    pub fn as_decimal(&self) -> &BigDecimal {
        &self.0
    }
}

impl fmt::Display for TokenAmount {
    /// Always plain notation: `2.5`, `1000`, `0.000001`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_plain_string())
    }
}

impl Serialize for TokenAmount {
    /// Written as an exact JSON number, never rounded through `f64`
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let number = Number::from_str(&self.to_string()).map_err(serde::ser::Error::custom)?;
        number.serialize(serializer)
    }
}
