use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::pin::pin;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::app::ports::VestingContractPort;
use crate::error::{ExportError, Result};
use crate::observability::metrics;
use crate::tokens::{format_address, parse_address, TokenTable};
use crate::types::{Grant, Proposal, TokenAmount};

/// What to do when a single grant cannot be enriched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run at the first failure; nothing is written
    #[default]
    Abort,
    /// Export the grant without vesting state, report the failure
    Skip,
}

#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Grants enriched at the same time; 1 keeps everything sequential
    pub concurrency: usize,
    pub on_error: FailurePolicy,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            on_error: FailurePolicy::Abort,
        }
    }
}

/// On-chain state read from a grant's vesting contract
#[derive(Debug, Clone, PartialEq)]
pub struct VestingState {
    pub token: String,
    pub released: TokenAmount,
    pub releasable: TokenAmount,
}

#[derive(Debug)]
pub struct GrantFailure {
    pub proposal_id: String,
    pub error: ExportError,
}

/// Enriched grants in input order, plus the failures tolerated under `Skip`
#[derive(Debug, Default)]
pub struct EnrichReport {
    pub grants: Vec<Grant>,
    pub failures: Vec<GrantFailure>,
}

impl EnrichReport {
    pub fn with_vesting_state(&self) -> usize {
        self.grants.iter().filter(|g| g.has_vesting_state()).count()
    }
}

/// Copy the grant fields out of a proposal's configuration
pub fn derive_grant(proposal: Proposal) -> Result<Grant> {
    let config = proposal.grant_configuration()?;
    let mut grant = Grant::from_proposal(proposal);
    grant.grant_tier = config.tier_label();
    grant.grant_category = config.category;
    grant.grant_size = config.size;
    grant.grant_beneficiary = config.beneficiary;
    Ok(grant)
}

pub struct GrantEnricher {
    tokens: TokenTable,
    contract: Option<Arc<dyn VestingContractPort>>,
    options: EnrichOptions,
}

impl GrantEnricher {
    /// `contract: None` exports grants without touching the chain
    pub fn new(
        tokens: TokenTable,
        contract: Option<Arc<dyn VestingContractPort>>,
        options: EnrichOptions,
    ) -> Self {
        Self {
            tokens,
            contract,
            options,
        }
    }

    /// Enrich every grant proposal, preserving input order
    pub async fn enrich_all(&self, proposals: Vec<Proposal>) -> Result<EnrichReport> {
        let concurrency = self.options.concurrency.max(1);
        info!(
            "Enriching {} grants (concurrency {}, on error: {:?})",
            proposals.len(),
            concurrency,
            self.options.on_error
        );

        let mut outcomes = pin!(stream::iter(proposals)
            .map(|proposal| self.enrich_one(proposal))
            .buffered(concurrency));

        let mut report = EnrichReport::default();
        while let Some((grant, failure)) = outcomes.next().await {
            if let Some(err) = failure {
                metrics::export::grant_failed();
                let proposal_id = grant.id().to_string();
                match self.options.on_error {
                    FailurePolicy::Abort => return Err(ExportError::enrichment(proposal_id, err)),
                    FailurePolicy::Skip => {
                        error!("Skipping vesting state for proposal {}: {}", proposal_id, err);
                        report.failures.push(GrantFailure {
                            proposal_id,
                            error: err,
                        });
                    }
                }
            }
            report.grants.push(grant);
        }
        Ok(report)
    }

    /// Always yields a grant; the error, if any, says what could not be filled in
    #[instrument(skip(self, proposal), fields(proposal_id = %proposal.id))]
    async fn enrich_one(&self, proposal: Proposal) -> (Grant, Option<ExportError>) {
        let fallback = Grant::from_proposal(proposal.clone());
        let mut grant = match derive_grant(proposal) {
            Ok(grant) => grant,
            Err(err) => return (fallback, Some(err)),
        };

        let vesting = match grant.proposal.vesting_address() {
            Some(address) => address.to_string(),
            None => return (grant, None),
        };
        let Some(contract) = &self.contract else {
            debug!("Vesting lookups disabled, leaving {} unread", vesting);
            return (grant, None);
        };

        match self.fetch_vesting_state(contract.as_ref(), &vesting).await {
            Ok(state) => {
                metrics::export::grant_enriched();
                grant.token = Some(state.token);
                grant.released = Some(state.released);
                grant.releasable = Some(state.releasable);
                (grant, None)
            }
            Err(err) => (grant, Some(err)),
        }
    }

    /// Reads token, released and releasable amount, one call at a time
    pub async fn fetch_vesting_state(
        &self,
        contract: &dyn VestingContractPort,
        vesting: &str,
    ) -> Result<VestingState> {
        let vesting = parse_address(vesting)?;

        let token = contract.token(vesting).await?;
        let info = self
            .tokens
            .get(&token)
            .ok_or_else(|| ExportError::UnknownToken {
                address: format_address(&token),
                vesting: format_address(&vesting),
            })?;

        let released = contract.released(vesting).await?;
        let releasable = contract.releasable_amount(vesting).await?;
        debug!(
            "Vesting {} holds {}: released={} releasable={}",
            format_address(&vesting),
            info.symbol,
            released,
            releasable
        );

        Ok(VestingState {
            token: info.symbol.clone(),
            released: info.to_amount(released),
            releasable: info.to_amount(releasable),
        })
    }
}
