use super::MetricsRegistry;
use prometheus::{Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts};

const HTTP_LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// The exact series list required by §4.4, grouped by the subsystem that
/// owns them. Constructed once at startup and shared across every crate via
/// `Arc<PlatformMetrics>`.
#[derive(Clone)]
pub struct PlatformMetrics {
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub database_connections_active: Gauge,
    pub database_query_duration_seconds: HistogramVec,
    pub mqtt_ingest_total: IntCounterVec,
    pub mqtt_dlq_total: IntCounterVec,
    pub mqtt_event_latency_seconds: Histogram,
    pub auth_attempts_total: IntCounterVec,
    pub active_sessions: Gauge,
    pub plugin_security_violations_total: IntCounterVec,
    pub plugin_security_score: GaugeVec,
    pub logging_sink_dropped_total: prometheus::IntCounter,
}

impl PlatformMetrics {
    pub fn new(registry: &MetricsRegistry) -> prometheus::Result<Self> {
        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests"),
            &["method", "endpoint", "status"],
        )?;
        registry.register(http_requests_total.clone())?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request duration")
                .buckets(HTTP_LATENCY_BUCKETS.to_vec()),
            &["method", "endpoint"],
        )?;
        registry.register(http_request_duration_seconds.clone())?;

        let database_connections_active = Gauge::new(
            "database_connections_active",
            "Active database connections",
        )?;
        registry.register(database_connections_active.clone())?;

        let database_query_duration_seconds = HistogramVec::new(
            HistogramOpts::new("database_query_duration_seconds", "Database query duration"),
            &["operation", "table"],
        )?;
        registry.register(database_query_duration_seconds.clone())?;

        let mqtt_ingest_total = IntCounterVec::new(
            Opts::new("mqtt_ingest_total", "Total bus messages ingested"),
            &["topic", "kind"],
        )?;
        registry.register(mqtt_ingest_total.clone())?;

        let mqtt_dlq_total = IntCounterVec::new(
            Opts::new("mqtt_dlq_total", "Total bus messages sent to the dead letter queue"),
            &["topic", "reason"],
        )?;
        registry.register(mqtt_dlq_total.clone())?;

        let mqtt_event_latency_seconds = Histogram::with_opts(HistogramOpts::new(
            "mqtt_event_latency_seconds",
            "End-to-end bus message ingest latency",
        ))?;
        registry.register(mqtt_event_latency_seconds.clone())?;

        let auth_attempts_total = IntCounterVec::new(
            Opts::new("auth_attempts_total", "Total authentication attempts"),
            &["result", "method"],
        )?;
        registry.register(auth_attempts_total.clone())?;

        let active_sessions = Gauge::new("active_sessions", "Currently active sessions")?;
        registry.register(active_sessions.clone())?;

        let plugin_security_violations_total = IntCounterVec::new(
            Opts::new("plugin_security_violations_total", "Total plugin security violations"),
            &["plugin_id", "violation_type", "severity"],
        )?;
        registry.register(plugin_security_violations_total.clone())?;

        let plugin_security_score = GaugeVec::new(
            Opts::new("plugin_security_score", "Current plugin security score"),
            &["plugin_id"],
        )?;
        registry.register(plugin_security_score.clone())?;

        let logging_sink_dropped_total = prometheus::IntCounter::new(
            "logging_sink_dropped_total",
            "Application log mirror records dropped due to channel overflow",
        )?;
        registry.register(logging_sink_dropped_total.clone())?;

        Ok(Self {
            http_requests_total,
            http_request_duration_seconds,
            database_connections_active,
            database_query_duration_seconds,
            mqtt_ingest_total,
            mqtt_dlq_total,
            mqtt_event_latency_seconds,
            auth_attempts_total,
            active_sessions,
            plugin_security_violations_total,
            plugin_security_score,
            logging_sink_dropped_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsConfig;

    #[test]
    fn registers_every_required_series_without_conflict() {
        let registry = MetricsRegistry::new(MetricsConfig {
            enabled: true,
            port: 9090,
            path: "/metrics".to_string(),
            namespace: "taylordash".to_string(),
        });
        let metrics = PlatformMetrics::new(&registry).unwrap();

        metrics.http_requests_total.with_label_values(&["GET", "/api/v1/health/live", "200"]).inc();
        metrics.active_sessions.set(3.0);

        let text = registry.metrics_text();
        assert!(text.contains("http_requests_total"));
        assert!(text.contains("active_sessions"));
    }
}
