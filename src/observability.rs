use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();

/// Install the global metrics recorder.
///
/// Idempotent. The Prometheus HTTP exporter only starts when
/// ETL_METRICS_ADDR (or PROMETHEUS_ADDR) is set; scheduler-driven batch runs
/// that push snapshots to a Pushgateway instead can leave it unset.
pub fn init_metrics() {
    INIT.call_once(|| {
        let addr_str = match std::env::var("ETL_METRICS_ADDR")
            .ok()
            .or_else(|| std::env::var("PROMETHEUS_ADDR").ok())
        {
            Some(v) if !v.trim().is_empty() => v,
            _ => return,
        };

        let addr = match addr_str.parse::<std::net::SocketAddr>() {
            Ok(addr) => addr,
            Err(_) => {
                warn!("Invalid metrics addr '{}', exporter disabled", addr_str);
                return;
            }
        };

        match metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
        {
            Ok(()) => info!("Prometheus HTTP exporter started at http://{}/metrics", addr),
            Err(e) => warn!("Failed to install metrics recorder: {}", e),
        }
    });
}
