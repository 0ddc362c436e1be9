//! Global metrics registry backing the `/metrics` endpoint and
//! [`PrometheusLayer`](crate::layer::PrometheusLayer).

use std::sync::OnceLock;

use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Registry, TextEncoder,
};

/// Configuration for the request-tracking layer.
#[derive(Clone, Debug, Default)]
pub struct MetricsConfig {
    /// Path prefixes excluded from HTTP request metrics (e.g. `/metrics` itself).
    pub exclude_paths: Vec<String>,
}

impl MetricsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, path: impl Into<String>) -> Self {
        self.exclude_paths.push(path.into());
        self
    }
}

struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    in_flight: IntGauge,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

fn metrics() -> &'static Metrics {
    METRICS.get_or_init(|| {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            prometheus::Opts::new("http_requests_total", "Total HTTP requests processed"),
            &["method", "path", "status"],
        )
        .expect("valid metric");
        let request_duration = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request latency in seconds",
            ),
            &["method", "path"],
        )
        .expect("valid metric");
        let in_flight = IntGauge::new("http_requests_in_flight", "Requests currently being served")
            .expect("valid metric");

        registry
            .register(Box::new(requests_total.clone()))
            .expect("register requests_total");
        registry
            .register(Box::new(request_duration.clone()))
            .expect("register request_duration");
        registry
            .register(Box::new(in_flight.clone()))
            .expect("register in_flight");

        Metrics {
            registry,
            requests_total,
            request_duration,
            in_flight,
        }
    })
}

/// The shared registry, exposed so application code can register its own
/// collectors (e.g. cache hit/miss counters) alongside the HTTP ones.
pub fn registry() -> &'static Registry {
    &metrics().registry
}

pub fn inc_in_flight() {
    metrics().in_flight.inc();
}

pub fn dec_in_flight() {
    metrics().in_flight.dec();
}

pub fn record_request(method: &str, path: &str, status: u16, duration_seconds: f64) {
    let m = metrics();
    m.requests_total
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    m.request_duration
        .with_label_values(&[method, path])
        .observe(duration_seconds);
}

/// Render every registered collector (HTTP metrics plus whatever application
/// code added via [`registry()`]) in Prometheus text exposition format.
pub fn encode_metrics() -> String {
    let families = metrics().registry.gather();
    let mut buf = Vec::new();
    TextEncoder::new()
        .encode(&families, &mut buf)
        .expect("encode metrics");
    String::from_utf8(buf).expect("metrics are valid utf8")
}
