/// Value of a proposal's `type` field that marks it as a funding grant
pub const GRANT_PROPOSAL_TYPE: &str = "grant";

// Environment variables
pub const RPC_URL_ENV: &str = "INFURA_URL";
pub const PUSHGATEWAY_URL_ENV: &str = "GRANTS_PUSHGATEWAY_URL";

// Output defaults
pub const DEFAULT_JSON_OUTPUT: &str = "grants.json";
pub const DEFAULT_CSV_OUTPUT: &str = "grants.csv";
pub const DEFAULT_CONFIG_FILE: &str = "grants.toml";

// RPC defaults
pub const DEFAULT_BLOCK_TAG: &str = "latest";
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Tokens grants are paid in: (lowercase contract address, symbol, decimals)
pub const DEFAULT_TOKENS: &[(&str, &str, u32)] = &[
    ("0x0f5d2fb29fb7d3cfee444a200298f468908cc942", "MANA", 18),
    ("0x6b175474e89094c44da98b954eedeac495271d0f", "DAI", 18),
    ("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", "USDC", 6),
    ("0xdac17f958d2ee523a2206206994597c13d831ec7", "USDT", 6),
];
