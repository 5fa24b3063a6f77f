//! Periodic plugin health checks (§4.7.4).

use crate::lifecycle::PluginLifecycle;
use crate::repository::PluginRepository;
use std::time::{Duration, Instant};
use taylordash_core::BusAdapter;
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

pub struct PluginHealthCheckService {
    repository: PluginRepository,
    lifecycle: PluginLifecycle,
    bus: BusAdapter,
    http_client: reqwest::Client,
    interval: Duration,
}

impl PluginHealthCheckService {
    pub fn new(repository: PluginRepository, lifecycle: PluginLifecycle, bus: BusAdapter, interval: Duration) -> Self {
        Self {
            repository,
            lifecycle,
            bus,
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            interval,
        }
    }

    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        let mut ticker = interval(self.interval);
        info!(interval_secs = self.interval.as_secs(), "plugin health check service started");

        loop {
            ticker.tick().await;
            if let Err(err) = self.run_once().await {
                warn!(error = %err, "plugin health check cycle failed");
            }
        }
    }

    async fn run_once(&self) -> taylordash_core::Result<()> {
        let plugins = self.repository.installed_plugins_with_health_endpoint().await?;

        for plugin in plugins {
            let endpoint = plugin
                .manifest
                .get("health_endpoint")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());

            let Some(endpoint) = endpoint else { continue };

            let started = Instant::now();
            let outcome = self.http_client.get(&endpoint).send().await;
            let response_time_ms = started.elapsed().as_millis() as i64;

            let (healthy, detail) = match outcome {
                Ok(response) if response.status().is_success() => (true, None),
                Ok(response) => (false, Some(format!("health endpoint returned {}", response.status()))),
                Err(err) => (false, Some(err.to_string())),
            };

            self.repository
                .insert_health_check(&plugin.id, healthy, Some(response_time_ms), detail.as_deref())
                .await?;

            if !healthy {
                let consecutive = self.repository.consecutive_health_failures(&plugin.id).await?;
                if consecutive >= 3 {
                    if let Err(err) = self.lifecycle.disable(&plugin.id).await {
                        warn!(plugin_id = %plugin.id, error = %err, "failed to auto-disable unhealthy plugin");
                    } else {
                        warn!(plugin_id = %plugin.id, consecutive, "plugin auto-disabled after consecutive health failures");
                        self.emit_health_failed(&plugin.id).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn emit_health_failed(&self, plugin_id: &str) {
        let payload = serde_json::json!({
            "trace_id": Uuid::new_v4(),
            "event_type": "health_failed",
            "timestamp": chrono::Utc::now(),
            "source": "taylordash-plugins",
            "version": "1.0.0",
            "data": { "plugin_id": plugin_id },
        });
        if let Ok(bytes) = serde_json::to_vec(&payload) {
            let _ = self.bus.publish("plugins/events/health_failed", bytes, 1).await;
        }
    }
}
