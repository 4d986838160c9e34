//! Stage metrics for the ETL run, recorded through the `metrics` facade.
//!
//! Nothing is exported unless [`init_metrics`] installs the Prometheus
//! recorder; without it every call below is a no-op.

use std::fmt;
use std::net::SocketAddr;
use tracing::{info, warn};

/// Every metric name used by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    RunsTotal,
    RunFailuresTotal,
    RunDuration,

    ExtractRowsTotal,
    ExtractDuration,

    TransformDimensionRows,
    TransformFactRows,
    TransformDroppedTotal,
    TransformDuration,

    LoadRowsTotal,
    LoadDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RunsTotal => "retail_dw_runs_total",
            MetricName::RunFailuresTotal => "retail_dw_run_failures_total",
            MetricName::RunDuration => "retail_dw_run_duration_seconds",
            MetricName::ExtractRowsTotal => "retail_dw_extract_rows_total",
            MetricName::ExtractDuration => "retail_dw_extract_duration_seconds",
            MetricName::TransformDimensionRows => "retail_dw_transform_dimension_rows",
            MetricName::TransformFactRows => "retail_dw_transform_fact_rows",
            MetricName::TransformDroppedTotal => "retail_dw_transform_dropped_total",
            MetricName::TransformDuration => "retail_dw_transform_duration_seconds",
            MetricName::LoadRowsTotal => "retail_dw_rows_loaded_total",
            MetricName::LoadDuration => "retail_dw_load_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Installs the Prometheus exporter when `RETAIL_DW_METRICS_ADDR` is set.
pub fn init_metrics() {
    let Ok(addr_str) = std::env::var("RETAIL_DW_METRICS_ADDR") else {
        return;
    };
    let addr: SocketAddr = match addr_str.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics addr '{}': {}", addr_str, e);
            return;
        }
    };
    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
        Err(e) => warn!("Prometheus exporter install failed: {}", e),
    }
}

pub mod run {
    use super::MetricName;

    pub fn started() {
        ::metrics::counter!(MetricName::RunsTotal.as_str()).increment(1);
    }

    pub fn failed(stage: &'static str) {
        ::metrics::counter!(MetricName::RunFailuresTotal.as_str(), "stage" => stage).increment(1);
    }

    pub fn duration(secs: f64) {
        ::metrics::histogram!(MetricName::RunDuration.as_str()).record(secs);
    }
}

pub mod extract {
    use super::MetricName;

    pub fn rows(count: usize) {
        ::metrics::counter!(MetricName::ExtractRowsTotal.as_str()).increment(count as u64);
    }

    pub fn duration(secs: f64) {
        ::metrics::histogram!(MetricName::ExtractDuration.as_str()).record(secs);
    }
}

pub mod transform {
    use super::MetricName;

    pub fn dimension_rows(table: &'static str, count: usize) {
        ::metrics::gauge!(MetricName::TransformDimensionRows.as_str(), "table" => table).set(count as f64);
    }

    pub fn fact_rows(count: usize) {
        ::metrics::gauge!(MetricName::TransformFactRows.as_str()).set(count as f64);
    }

    pub fn dropped(count: usize) {
        ::metrics::counter!(MetricName::TransformDroppedTotal.as_str()).increment(count as u64);
    }

    pub fn duration(secs: f64) {
        ::metrics::histogram!(MetricName::TransformDuration.as_str()).record(secs);
    }
}

pub mod load {
    use super::MetricName;

    pub fn rows(table: &'static str, count: usize) {
        ::metrics::counter!(MetricName::LoadRowsTotal.as_str(), "table" => table).increment(count as u64);
    }

    pub fn duration(secs: f64) {
        ::metrics::histogram!(MetricName::LoadDuration.as_str()).record(secs);
    }
}
