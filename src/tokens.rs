//! Token metadata used to turn raw on-chain integers into readable amounts.

use alloy_primitives::{Address, U256};
use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::BigDecimal;
use std::collections::HashMap;
use std::str::FromStr;

use crate::constants::DEFAULT_TOKENS;
use crate::error::{ExportError, Result};
use crate::types::TokenAmount;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u32,
}

impl TokenInfo {
    pub fn new(symbol: impl Into<String>, decimals: u32) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
        }
    }

    /// Converts a raw integer amount into `raw / 10^decimals` without rounding
    pub fn to_amount(&self, raw: U256) -> TokenAmount {
        to_decimal(raw, self.decimals)
    }
}

/// Immutable address -> token lookup, built once at startup
#[derive(Debug, Clone)]
pub struct TokenTable {
    tokens: HashMap<Address, TokenInfo>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self {
            tokens: HashMap::new(),
        }
    }

    /// The tokens grants are paid in (MANA, DAI, USDC, USDT)
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for (address, symbol, decimals) in DEFAULT_TOKENS {
            // constant table, addresses are well formed
            if let Ok(address) = Address::from_str(address) {
                table.tokens.insert(address, TokenInfo::new(*symbol, *decimals));
            }
        }
        table
    }

    /// Adds or replaces an entry
    pub fn insert(&mut self, address: &str, info: TokenInfo) -> Result<()> {
        let address = parse_address(address)?;
        self.tokens.insert(address, info);
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Option<&TokenInfo> {
        self.tokens.get(address)
    }

    /// Case-insensitive lookup by hex address string
    pub fn lookup(&self, address: &str) -> Result<Option<&TokenInfo>> {
        let address = parse_address(address)?;
        Ok(self.tokens.get(&address))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Default for TokenTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

pub fn parse_address(address: &str) -> Result<Address> {
    Address::from_str(address.trim()).map_err(|e| ExportError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Lowercase `0x`-prefixed hex form
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

pub fn to_decimal(raw: U256, decimals: u32) -> TokenAmount {
    let digits = BigInt::from_bytes_be(Sign::Plus, &raw.to_be_bytes::<32>());
    TokenAmount::new(BigDecimal::new(digits, i64::from(decimals)))
}
