//! Redis status store
//!
//! Point reads go through a multiplexed tokio connection, subscriptions
//! through a dedicated async `PubSub` connection. Each round trip to the
//! server is bounded by the configured timeout.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::time::timeout;
use tracing::debug;

use super::{StatusStore, StoreError, StoreEvent, Subscription};

pub struct RedisStore {
    client: redis::Client,
    timeout: Duration,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("addr", &self.client.get_connection_info().addr)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RedisStore {
    /// Create a store for the server at `host:port`
    ///
    /// No connection is made here; it is opened lazily by `get` and
    /// `subscribe`.
    pub fn new(host: &str, port: u16, timeout: Duration) -> Result<Self, StoreError> {
        let url = format!("redis://{}:{}/", host, port);
        let client = redis::Client::open(url.as_str())?;
        Ok(Self { client, timeout })
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl StatusStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self
            .bounded(self.client.get_multiplexed_async_connection())
            .await?;
        let value: Option<String> = self
            .bounded(redis::cmd("GET").arg(key).query_async(&mut conn))
            .await?;

        debug!(key = key, found = value.is_some(), "Redis GET");
        Ok(value)
    }

    async fn subscribe(&self, channel: &str) -> Result<Box<dyn Subscription>, StoreError> {
        let mut pubsub = self.bounded(self.client.get_async_pubsub()).await?;
        self.bounded(pubsub.subscribe(channel)).await?;

        debug!(channel = channel, "Redis SUBSCRIBE");
        Ok(Box::new(RedisSubscription {
            channel: channel.to_string(),
            confirmation_pending: true,
            messages: Box::pin(pubsub.into_on_message()),
        }))
    }
}

/// Redis channel subscription
///
/// The client library consumes Redis' own subscribe confirmation, so a
/// `Subscribed` event is replayed once before the first message.
struct RedisSubscription {
    channel: String,
    confirmation_pending: bool,
    messages: Pin<Box<dyn Stream<Item = redis::Msg> + Send>>,
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn next_event(&mut self) -> Result<Option<StoreEvent>, StoreError> {
        if std::mem::take(&mut self.confirmation_pending) {
            return Ok(Some(StoreEvent::Subscribed {
                channel: self.channel.clone(),
            }));
        }

        loop {
            let msg = match self.messages.next().await {
                Some(msg) => msg,
                None => return Ok(None),
            };
            if let Some(event) = decode_message(&msg) {
                return Ok(Some(event));
            }
        }
    }
}

/// Turn a published message into a data event
///
/// Payloads that are not valid UTF-8 are logged and dropped.
fn decode_message(msg: &redis::Msg) -> Option<StoreEvent> {
    match msg.get_payload::<String>() {
        Ok(payload) => Some(StoreEvent::Message {
            channel: msg.get_channel_name().to_string(),
            payload,
        }),
        Err(e) => {
            tracing::warn!(
                "Skipping undecodable message on {}: {}",
                msg.get_channel_name(),
                e
            );
            None
        }
    }
}
