use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::error::Result;
use crate::types::Grant;

/// Read-only view of a token vesting contract
#[async_trait]
pub trait VestingContractPort: Send + Sync {
    /// Address of the ERC-20 token being vested
    async fn token(&self, vesting: Address) -> Result<Address>;
    /// Raw amount already released to the beneficiary
    async fn released(&self, vesting: Address) -> Result<U256>;
    /// Raw amount that could be released right now
    async fn releasable_amount(&self, vesting: Address) -> Result<U256>;
}

// Export-side ports
pub trait GrantOutputPort: Send + Sync {
    fn write_grants(&self, grants: &[Grant]) -> Result<()>;
    fn destination(&self) -> &str;
}
