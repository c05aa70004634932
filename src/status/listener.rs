//! Background subscriber that keeps the status cache fresh
//!
//! Every data message received on the update channel overwrites the cache
//! verbatim. Control events (the subscribe confirmation) are skipped. When
//! the subscription breaks the listener resubscribes with exponential
//! backoff, unless resubscribing is disabled, in which case the task ends
//! and the cache keeps its last value.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::StatusCache;
use crate::store::{StatusStore, StoreError, StoreEvent};

/// Resubscribe behaviour after the subscription is lost
#[derive(Debug, Clone)]
pub struct ResubscribePolicy {
    pub enabled: bool,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for ResubscribePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl ResubscribePolicy {
    /// Give up on the first lost subscription
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Delay before resubscribe attempt number `attempt` (0-based)
    ///
    /// Doubles per attempt up to `max_backoff`, plus up to 20% jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self
            .initial_backoff
            .saturating_mul(1u32 << attempt.min(16))
            .min(self.max_backoff);

        let jitter_ms = base.as_millis() as u64 / 5;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

pub struct StatusListener {
    store: Arc<dyn StatusStore>,
    cache: Arc<StatusCache>,
    channel: String,
    policy: ResubscribePolicy,
}

impl StatusListener {
    pub fn new(
        store: Arc<dyn StatusStore>,
        cache: Arc<StatusCache>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            store,
            cache,
            channel: channel.into(),
            policy: ResubscribePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ResubscribePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run the listener on the tokio runtime until `cancel` fires
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    pub async fn run(&self, cancel: CancellationToken) {
        let mut attempt: u32 = 0;

        loop {
            let reason = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Status listener on {} stopped", self.channel);
                    return;
                }
                reason = self.listen(&mut attempt) => reason,
            };

            if !self.policy.enabled {
                tracing::error!(
                    "Lost subscription to {}: {}; status updates stop, cache keeps {:?}",
                    self.channel,
                    reason,
                    self.cache.read()
                );
                return;
            }

            let delay = self.policy.delay(attempt);
            attempt = attempt.saturating_add(1);
            tracing::warn!(
                "Lost subscription to {}: {}; resubscribing in {:?} (attempt {})",
                self.channel,
                reason,
                delay,
                attempt
            );

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Status listener on {} stopped", self.channel);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Subscribe once and apply events until the subscription breaks
    ///
    /// Only a data message resets the backoff counter; a subscription that
    /// is confirmed and then dropped keeps backing off.
    async fn listen(&self, attempt: &mut u32) -> StoreError {
        let mut subscription = match self.store.subscribe(&self.channel).await {
            Ok(subscription) => subscription,
            Err(e) => return e,
        };
        tracing::info!("Subscribed to channel: {}", self.channel);

        loop {
            match subscription.next_event().await {
                Ok(Some(event)) => {
                    if self.apply(event) {
                        *attempt = 0;
                    }
                }
                Ok(None) => return StoreError::Closed,
                Err(StoreError::Protocol(msg)) => {
                    tracing::warn!("Skipping malformed message on {}: {}", self.channel, msg);
                }
                Err(e) => return e,
            }
        }
    }

    /// Apply one subscription event to the cache
    ///
    /// Returns true if the cache was written.
    pub fn apply(&self, event: StoreEvent) -> bool {
        match event {
            StoreEvent::Subscribed { channel } => {
                tracing::debug!("Subscription to {} confirmed", channel);
                false
            }
            StoreEvent::Message { payload, .. } => {
                self.cache.write(&payload);
                tracing::info!("Received profile service status update: {}", payload);
                true
            }
        }
    }
}
