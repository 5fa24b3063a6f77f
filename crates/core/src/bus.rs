//! Bus Adapter (C2): a pub/sub bridge to the platform's message broker.
//!
//! Topic patterns are expressed in MQTT convention (`/`-separated segments,
//! `+` for a single-level wildcard, `#` for a multi-level wildcard) per
//! §4.2/§6; the underlying broker client speaks NATS subject syntax
//! (`.`-separated, `*` single-level, `>` multi-level), so every pattern is
//! translated at the subscribe boundary.

use crate::error::{Error, Result};
use async_nats::{Client, Message};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Outcome a subscription handler reports back to the adapter.
pub enum HandlerOutcome {
    Ack,
    Nack(String),
}

pub type Handler = Arc<
    dyn Fn(String, Vec<u8>) -> futures::future::BoxFuture<'static, HandlerOutcome> + Send + Sync,
>;

/// Converts an MQTT-style topic pattern to a NATS subject.
///
/// `+` maps to NATS's single-level wildcard `*`; `#` maps to NATS's
/// multi-level wildcard `>` and must be the final segment, matching MQTT
/// semantics.
pub fn mqtt_pattern_to_nats_subject(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| match segment {
            "+" => "*",
            "#" => ">",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[derive(Clone)]
pub struct BusAdapter {
    client: Client,
    worker_pool: Arc<Semaphore>,
}

impl BusAdapter {
    /// Connects to the broker. `async-nats` handles reconnection internally
    /// with exponential backoff capped at `max_reconnect_backoff`; this
    /// adapter does not duplicate that logic.
    pub async fn connect(
        broker_url: &str,
        client_id: &str,
        credentials: Option<&str>,
        max_reconnect_backoff: Duration,
        worker_pool_size: usize,
    ) -> Result<Self> {
        let mut options = async_nats::ConnectOptions::new()
            .name(client_id)
            .reconnect_delay_callback(move |attempts| {
                std::cmp::min(
                    Duration::from_millis(100 * (1 << attempts.min(10)) as u64),
                    max_reconnect_backoff,
                )
            });

        if let Some(token) = credentials {
            options = options.token(token.to_string());
        }

        let client = options
            .connect(broker_url)
            .await
            .map_err(|e| Error::upstream_failure(format!("failed to connect to bus: {e}")))?;

        info!(broker_url, client_id, "bus adapter connected");

        Ok(Self {
            client,
            worker_pool: Arc::new(Semaphore::new(worker_pool_size.max(1))),
        })
    }

    /// Subscribes to `topic_pattern` (MQTT syntax) and dispatches each
    /// delivered message to `handler` on the bounded worker pool.
    /// Invocations run concurrently — the adapter never serializes them;
    /// idempotency is the event pipeline's responsibility (§4.6).
    pub async fn subscribe(&self, topic_pattern: &str, handler: Handler) -> Result<()> {
        let subject = mqtt_pattern_to_nats_subject(topic_pattern);
        let mut subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .map_err(|e| Error::upstream_failure(format!("failed to subscribe to {subject}: {e}")))?;

        let client = self.client.clone();
        let permits = self.worker_pool.clone();
        let pattern = topic_pattern.to_string();

        tokio::spawn(async move {
            while let Some(message) = subscriber.next().await {
                let permit = permits.clone().acquire_owned().await;
                let handler = handler.clone();
                let client = client.clone();
                let pattern = pattern.clone();

                tokio::spawn(async move {
                    let _permit = permit;
                    Self::dispatch(client, message, pattern, handler).await;
                });
            }
        });

        Ok(())
    }

    async fn dispatch(_client: Client, message: Message, pattern: String, handler: Handler) {
        let topic = message.subject.to_string();
        let payload = message.payload.to_vec();

        let outcome = tokio::time::timeout(
            Duration::from_secs(60),
            handler(topic.clone(), payload),
        )
        .await;

        match outcome {
            Ok(HandlerOutcome::Ack) => {}
            Ok(HandlerOutcome::Nack(reason)) => {
                warn!(topic, pattern, reason, "bus handler nacked message");
            }
            Err(_) => {
                error!(topic, pattern, "bus handler exceeded 60s soft cap, treating as nack");
            }
        }
    }

    /// Publishes `payload` to `topic` (MQTT syntax). `qos >= 1` blocks until
    /// the broker acknowledges the publish via a flush.
    pub async fn publish(&self, topic: &str, payload: Vec<u8>, qos: u8) -> Result<()> {
        let subject = mqtt_pattern_to_nats_subject(topic);
        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| Error::upstream_failure(format!("failed to publish to {subject}: {e}")))?;

        if qos >= 1 {
            self.client
                .flush()
                .await
                .map_err(|e| Error::upstream_failure(format!("publish flush failed: {e}")))?;
        }

        Ok(())
    }

    /// `true` when the underlying NATS client reports itself connected.
    /// Used by the Health Aggregator (C9) bus sub-check.
    pub fn is_connected(&self) -> bool {
        matches!(self.client.connection_state(), async_nats::connection::State::Connected)
    }

    /// Cancels outstanding subscriptions and drains in-flight handler
    /// invocations, bounded by a 30s grace, then disconnects.
    pub async fn close(self) -> Result<()> {
        match tokio::time::timeout(Duration::from_secs(30), self.client.drain()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(Error::upstream_failure(format!("bus drain failed: {e}"))),
            Err(_) => {
                warn!("bus drain exceeded 30s grace period, disconnecting anyway");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_single_level_wildcard() {
        assert_eq!(mqtt_pattern_to_nats_subject("events/+/created"), "events.*.created");
    }

    #[test]
    fn translates_multi_level_wildcard() {
        assert_eq!(mqtt_pattern_to_nats_subject("events/#"), "events.>");
    }

    #[test]
    fn leaves_plain_topics_unchanged_besides_separator() {
        assert_eq!(mqtt_pattern_to_nats_subject("projects/created"), "projects.created");
    }
}
