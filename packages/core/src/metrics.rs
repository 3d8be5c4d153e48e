//! Prometheus metrics registry for the bridge.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and hand it to
//! the dispatcher and the router.
//!
//! Exposed at `GET /metrics` in Prometheus text exposition format
//! (`text/plain; version=0.0.4`).

use prometheus::{Counter, Opts, Registry};

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Alerts received across all webhook batches.
    pub alerts_received_total: Counter,
    /// Notifications successfully sent to Gotify.
    pub notifications_sent_total: Counter,
    /// Notifications successfully deleted from Gotify on resolution.
    pub notifications_deleted_total: Counter,
    /// Resolved alerts dropped because resolved messages are disabled.
    pub alerts_suppressed_total: Counter,
    /// Batches rejected because an alert could not be translated.
    pub translation_errors_total: Counter,
    /// Gotify calls that failed (transport error or non-2xx).
    pub backend_errors_total: Counter,
    /// The registry that owns all of the above metrics.
    pub registry: Registry,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<Counter, prometheus::Error> {
    let counter = Counter::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

impl AppMetrics {
    /// Create and register all metrics. Returns an error if any metric
    /// name is invalid or duplicated.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        Ok(Self {
            alerts_received_total: counter(
                &registry,
                "alertify_alerts_received_total",
                "Alerts received from Alertmanager",
            )?,
            notifications_sent_total: counter(
                &registry,
                "alertify_notifications_sent_total",
                "Notifications accepted by Gotify",
            )?,
            notifications_deleted_total: counter(
                &registry,
                "alertify_notifications_deleted_total",
                "Notifications deleted from Gotify on resolution",
            )?,
            alerts_suppressed_total: counter(
                &registry,
                "alertify_alerts_suppressed_total",
                "Resolved alerts ignored by policy",
            )?,
            translation_errors_total: counter(
                &registry,
                "alertify_translation_errors_total",
                "Webhook batches rejected for a malformed alert",
            )?,
            backend_errors_total: counter(
                &registry,
                "alertify_backend_errors_total",
                "Failed Gotify calls",
            )?,
            registry,
        })
    }

    /// Render all metrics as Prometheus text format (for the `/metrics` endpoint).
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}
