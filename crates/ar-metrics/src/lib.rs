use std::env;
use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

pub const RECOMMEND_REQUESTS_TOTAL: &str = "ar_recommend_requests_total";
pub const RECOMMEND_FAILURES_TOTAL: &str = "ar_recommend_failures_total";
pub const RECOMMEND_LATENCY_SECONDS: &str = "ar_recommend_latency_seconds";

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// `1`/`true` enable, anything else disables; unset means `default`.
pub fn metrics_enabled(enabled_env: &str, default: bool) -> bool {
    env::var(enabled_env)
        .map(|raw| {
            let raw = raw.trim();
            raw == "1" || raw.eq_ignore_ascii_case("true")
        })
        .unwrap_or(default)
}

/// Starts the Prometheus exporter on `0.0.0.0:<port>`, the port coming
/// from `port_env` or `default_port`. Must run inside a tokio runtime.
/// Later calls return the handle installed by the first one.
pub fn init_metrics(port_env: &str, default_port: u16) -> Option<&'static PrometheusHandle> {
    if let Some(existing) = PROMETHEUS_HANDLE.get() {
        return Some(existing);
    }

    let port = env::var(port_env)
        .ok()
        .and_then(|raw| raw.trim().parse::<u16>().ok())
        .unwrap_or(default_port);

    match PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install_recorder()
    {
        Ok(handle) => {
            let _ = PROMETHEUS_HANDLE.set(handle);
            describe_metrics();
            info!(metrics_port = port, "started prometheus exporter");
            PROMETHEUS_HANDLE.get()
        }
        Err(err) => {
            warn!(error = %err, metrics_port = port, "failed to start prometheus exporter");
            PROMETHEUS_HANDLE.get()
        }
    }
}

fn describe_metrics() {
    describe_counter!(RECOMMEND_REQUESTS_TOTAL, "Recommendation requests received");
    describe_counter!(
        RECOMMEND_FAILURES_TOTAL,
        "Recommendation requests that ended in an error"
    );
    describe_histogram!(
        RECOMMEND_LATENCY_SECONDS,
        metrics::Unit::Seconds,
        "End-to-end recommendation latency"
    );
}

/// Records one recommendation call. `failure` is the error code for failed
/// calls. A no-op until a recorder is installed.
pub fn record_recommendation(method: &'static str, elapsed: Duration, failure: Option<&'static str>) {
    counter!(RECOMMEND_REQUESTS_TOTAL, "method" => method).increment(1);
    if let Some(code) = failure {
        counter!(RECOMMEND_FAILURES_TOTAL, "method" => method, "code" => code).increment(1);
    }
    histogram!(RECOMMEND_LATENCY_SECONDS, "method" => method).record(elapsed.as_secs_f64());
}
