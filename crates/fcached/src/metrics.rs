//! Prometheus counters for the file cache endpoints
//!
//! Exposed on `GET /metrics` in the Prometheus text format.

use prometheus_client::{
    encoding::text::encode,
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

type Labels = Vec<(String, String)>;

#[derive(Clone, Default)]
pub struct Metrics {
    pub puts: Counter,
    pub puts_deduplicated: Counter,
    pub gets: Counter,
    /// Failed requests by operation and error kind
    pub errors: Family<Labels, Counter>,
    pub bytes_stored: Counter,
}

impl Metrics {
    pub fn register(registry: &mut Registry) -> Self {
        let metrics = Self::default();
        registry.register(
            "fcache_puts",
            "Files stored, including deduplicated puts",
            metrics.puts.clone(),
        );
        registry.register(
            "fcache_puts_deduplicated",
            "Puts whose content was already stored",
            metrics.puts_deduplicated.clone(),
        );
        registry.register("fcache_gets", "Files fetched", metrics.gets.clone());
        registry.register(
            "fcache_errors",
            "Failed put and get requests",
            metrics.errors.clone(),
        );
        registry.register(
            "fcache_bytes_stored",
            "Bytes of new file content written to the backend",
            metrics.bytes_stored.clone(),
        );
        metrics
    }

    pub fn record_error(&self, op: &str, kind: &str) {
        self.errors
            .get_or_create(&vec![
                ("op".to_string(), op.to_string()),
                ("kind".to_string(), kind.to_string()),
            ])
            .inc();
    }
}

/// Render `registry` in the Prometheus text format.
pub fn render(registry: &Registry) -> Result<String, std::fmt::Error> {
    let mut body = String::new();
    encode(&mut body, registry)?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_appear_in_text_output() {
        let mut registry = Registry::default();
        let metrics = Metrics::register(&mut registry);
        metrics.puts.inc();
        metrics.bytes_stored.inc_by(1329);
        metrics.record_error("get", "not-found");

        let body = render(&registry).unwrap();
        assert!(body.contains("fcache_puts_total 1"), "{body}");
        assert!(body.contains("fcache_bytes_stored_total 1329"), "{body}");
        assert!(body.contains("fcache_errors_total{op=\"get\",kind=\"not-found\"} 1"), "{body}");
    }
}
