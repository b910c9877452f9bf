//! Run metrics for the grant exporter.
//!
//! Metrics are recorded through the `metrics` facade. `init` installs a
//! Prometheus recorder; when a push gateway is configured the rendered
//! registry is pushed once at the end of the run with `push_all_metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::fmt;
use tracing::{info, warn};

use crate::constants::PUSHGATEWAY_URL_ENV;

/// Enum representing all metric names used by the exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    RpcCallsSuccess,
    RpcCallsError,
    RpcCallDuration,
    GrantsLoaded,
    GrantsEnriched,
    GrantsEnrichmentFailed,
    GrantsExported,
    ExportRuns,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RpcCallsSuccess => "grants_rpc_calls_success_total",
            MetricName::RpcCallsError => "grants_rpc_calls_error_total",
            MetricName::RpcCallDuration => "grants_rpc_call_duration_seconds",
            MetricName::GrantsLoaded => "grants_loaded_total",
            MetricName::GrantsEnriched => "grants_enriched_total",
            MetricName::GrantsEnrichmentFailed => "grants_enrichment_failed_total",
            MetricName::GrantsExported => "grants_exported_total",
            MetricName::ExportRuns => "grants_export_runs_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct MetricsState {
    handle: PrometheusHandle,
    pushgateway_url: Option<String>,
}

static METRICS_STATE: OnceCell<MetricsState> = OnceCell::new();

/// Install the Prometheus recorder. Safe to call more than once.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_STATE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;

    let pushgateway_url = std::env::var(PUSHGATEWAY_URL_ENV)
        .ok()
        .filter(|url| !url.trim().is_empty());
    if pushgateway_url.is_some() {
        info!("Metrics initialized with push gateway support");
    } else {
        info!("Metrics initialized (no push gateway configured)");
    }

    METRICS_STATE
        .set(MetricsState {
            handle,
            pushgateway_url,
        })
        .ok();
    Ok(())
}

/// Push every recorded metric to the configured gateway, if any
pub async fn push_all_metrics() {
    let Some(state) = METRICS_STATE.get() else {
        return;
    };
    let Some(base) = state.pushgateway_url.as_deref() else {
        return;
    };
    let url = format!("{}/metrics/job/grant_exporter", base.trim_end_matches('/'));
    let body = state.handle.render();

    let result = reqwest::Client::new()
        .post(&url)
        .header("Content-Type", "text/plain; version=0.0.4")
        .body(body)
        .send()
        .await;
    match result {
        Ok(r) if r.status().is_success() => info!("Pushed metrics to {}", url),
        Ok(r) => warn!("Pushgateway responded with status {}", r.status().as_u16()),
        Err(e) => warn!("Failed to push metrics to {}: {}", url, e),
    }
}

pub mod rpc {
    use super::MetricName;

    pub fn call_success() {
        ::metrics::counter!(MetricName::RpcCallsSuccess.as_str()).increment(1);
    }

    pub fn call_error() {
        ::metrics::counter!(MetricName::RpcCallsError.as_str()).increment(1);
    }

    pub fn call_duration(secs: f64) {
        ::metrics::histogram!(MetricName::RpcCallDuration.as_str()).record(secs);
    }
}

pub mod export {
    use super::MetricName;

    pub fn run_started() {
        ::metrics::counter!(MetricName::ExportRuns.as_str()).increment(1);
    }

    pub fn grants_loaded(count: usize) {
        ::metrics::counter!(MetricName::GrantsLoaded.as_str()).increment(count as u64);
    }

    pub fn grant_enriched() {
        ::metrics::counter!(MetricName::GrantsEnriched.as_str()).increment(1);
    }

    pub fn grant_failed() {
        ::metrics::counter!(MetricName::GrantsEnrichmentFailed.as_str()).increment(1);
    }

    pub fn grants_exported(count: usize) {
        ::metrics::counter!(MetricName::GrantsExported.as_str()).increment(count as u64);
    }
}
