use super::codes::ErrorCode;
use crate::metrics::MetricsRegistry;
use once_cell::sync::OnceCell;
use prometheus::{IntCounterVec, Opts};

/// Process-wide handle so `Error::into_response` (which owns no state of its
/// own) can still record every error it serves. Set once at startup via
/// [`ErrorMetrics::install`]; per §9 "Global state", initialization is
/// explicit rather than implicit/lazy — `install` is called once from
/// `main.rs` right after the metrics registry exists, not on first use.
static GLOBAL: OnceCell<ErrorMetrics> = OnceCell::new();

/// Counts errors by taxonomy kind and code for the `/metrics` endpoint.
pub struct ErrorMetrics {
    by_code: IntCounterVec,
}

impl ErrorMetrics {
    pub fn new(registry: &MetricsRegistry) -> anyhow::Result<Self> {
        let by_code = IntCounterVec::new(
            Opts::new("errors_total", "Total errors by taxonomy kind and code"),
            &["kind", "code"],
        )?;
        registry.register(by_code.clone())?;
        Ok(Self { by_code })
    }

    pub fn record(&self, code: ErrorCode) {
        self.by_code
            .with_label_values(&[code.taxonomy_kind(), &code.to_string()])
            .inc();
    }

    /// Installs `self` as the process-wide instance `record_global` reports
    /// to. A second call is a no-op — there is exactly one registry per
    /// process, so exactly one installation is expected.
    pub fn install(self) {
        let _ = GLOBAL.set(self);
    }

    /// Records against the globally installed instance, if any. Before
    /// `install` runs (or in a binary that never calls it, e.g. a unit test)
    /// this is a silent no-op rather than a panic — error responses must
    /// never fail because metrics plumbing isn't wired up yet.
    pub fn record_global(code: ErrorCode) {
        if let Some(metrics) = GLOBAL.get() {
            metrics.record(code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_under_taxonomy_and_code_labels() {
        let registry = MetricsRegistry::new(crate::config::MetricsConfig {
            enabled: true,
            port: 9090,
            path: "/metrics".to_string(),
            namespace: "taylordash".to_string(),
        });
        let metrics = ErrorMetrics::new(&registry).unwrap();
        metrics.record(ErrorCode::NotFound);
        metrics.record(ErrorCode::NotFound);
        metrics.record(ErrorCode::ValidationFailed);

        let families = registry.gather();
        let family = families
            .iter()
            .find(|f| f.get_name() == "errors_total")
            .unwrap();
        let total: f64 = family.get_metric().iter().map(|m| m.get_counter().get_value()).sum();
        assert_eq!(total, 3.0);
    }
}
