use super::SessionStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{error, info};

/// Hourly task that marks expired sessions inactive (§4.5 "Cleanup").
pub struct SessionCleanupService {
    store: Arc<SessionStore>,
    interval: Duration,
    last_run: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl SessionCleanupService {
    pub fn new(store: Arc<SessionStore>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            last_run: Arc::new(Mutex::new(None)),
        }
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        let mut ticker = interval(self.interval);
        info!(interval_secs = self.interval.as_secs(), "session cleanup service started");

        loop {
            ticker.tick().await;
            match self.store.mark_expired_inactive().await {
                Ok(count) => {
                    *self.last_run.lock().unwrap() = Some(Utc::now());
                    if count > 0 {
                        info!(cleaned_up = count, "session cleanup cycle completed");
                    }
                }
                Err(err) => {
                    error!(error = %err, "session cleanup cycle failed");
                }
            }
        }
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        *self.last_run.lock().unwrap()
    }
}
