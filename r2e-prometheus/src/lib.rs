//! Prometheus metrics plugin for R2E.
//!
//! Installs a [`tower::Layer`] that records request counts, latency
//! histograms, and in-flight gauges, plus a `/metrics` route exposing them in
//! Prometheus text format.
//!
//! ```ignore
//! use r2e_prometheus::Prometheus;
//!
//! AppBuilder::new()
//!     .build_state::<Services, _, _>()
//!     .await
//!     .with(Prometheus::new().exclude("/metrics").exclude("/health"))
//!     .serve("0.0.0.0:3000")
//!     .await;
//! ```

mod handler;
mod layer;
mod metrics;

pub use handler::metrics_handler;
pub use layer::PrometheusLayer;
pub use metrics::{dec_in_flight, encode_metrics, inc_in_flight, record_request, registry, MetricsConfig};

use r2e_core::builder::AppBuilder;
use r2e_core::plugin::Plugin;

/// Installs [`PrometheusLayer`] and a `GET /metrics` route.
pub struct Prometheus {
    config: MetricsConfig,
}

impl Prometheus {
    pub fn new() -> Self {
        Self {
            config: MetricsConfig::new().exclude("/metrics"),
        }
    }

    /// Exclude an additional path prefix from request tracking.
    pub fn exclude(mut self, path: impl Into<String>) -> Self {
        self.config = self.config.exclude(path);
        self
    }
}

impl Default for Prometheus {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for Prometheus {
    fn install<T: Clone + Send + Sync + 'static>(
        self,
        app: AppBuilder<T>,
    ) -> AppBuilder<T> {
        let layer = PrometheusLayer::new(self.config);
        app.with_layer_fn(move |router| router.layer(layer.clone()))
            .register_routes(
                r2e_core::http::Router::new()
                    .route("/metrics", r2e_core::http::routing::get(metrics_handler)),
            )
    }
}
