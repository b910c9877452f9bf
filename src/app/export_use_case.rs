use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

use crate::app::ports::GrantOutputPort;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::enrich::{GrantEnricher, GrantFailure};
use crate::pipeline::loader::{filter_grants, load_proposals};

/// Use case for exporting grant proposals: filter, enrich, write
pub struct ExportGrantsUseCase {
    enricher: GrantEnricher,
    outputs: Vec<Box<dyn GrantOutputPort>>,
}

/// Outcome of one export run
#[derive(Debug)]
pub struct ExportSummary {
    pub proposals_read: usize,
    pub grants_exported: usize,
    pub with_vesting_state: usize,
    pub failures: Vec<GrantFailure>,
    pub destinations: Vec<String>,
}

impl ExportSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl ExportGrantsUseCase {
    pub fn new(enricher: GrantEnricher, outputs: Vec<Box<dyn GrantOutputPort>>) -> Self {
        Self { enricher, outputs }
    }

    /// Export the grants found in a proposals file
    pub async fn run(&self, input: impl AsRef<Path>) -> Result<ExportSummary> {
        let proposals = load_proposals(input)?;
        self.export(proposals).await
    }

    /// Export the grants among an already loaded proposal collection.
    /// Nothing is written unless enrichment completes under the configured policy.
    pub async fn export(&self, proposals: Vec<Value>) -> Result<ExportSummary> {
        metrics::export::run_started();
        let proposals_read = proposals.len();

        let grants = filter_grants(proposals)?;
        info!("{} of {} proposals are grants", grants.len(), proposals_read);
        metrics::export::grants_loaded(grants.len());

        let report = self.enricher.enrich_all(grants).await?;
        let with_vesting_state = report.with_vesting_state();
        if !report.failures.is_empty() {
            warn!(
                "{} grants exported without vesting state due to errors",
                report.failures.len()
            );
        }

        let mut destinations = Vec::with_capacity(self.outputs.len());
        for output in &self.outputs {
            output.write_grants(&report.grants)?;
            destinations.push(output.destination().to_string());
        }
        metrics::export::grants_exported(report.grants.len());

        Ok(ExportSummary {
            proposals_read,
            grants_exported: report.grants.len(),
            with_vesting_state,
            failures: report.failures,
            destinations,
        })
    }
}
