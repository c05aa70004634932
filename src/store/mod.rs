//! Status store client
//!
//! A thin seam over the external key-value / pub-sub service that owns the
//! upstream availability flag. Two operations are consumed: a point read of
//! the status key and a subscription to the status update channel.
//!
//! - `redis`: the production adapter
//! - `memory`: an in-process store for tests and local runs

pub mod errors;
pub mod memory;
pub mod redis;

use async_trait::async_trait;

pub use errors::StoreError;
pub use memory::MemoryStore;
pub use self::redis::RedisStore;

/// One item delivered by a subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Control event confirming the channel subscription; carries no data
    Subscribed { channel: String },

    /// Data event carrying a published payload
    Message { channel: String, payload: String },
}

/// Point-read and subscribe access to the status store
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Read the current value stored under `key`
    ///
    /// Returns `Ok(None)` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Subscribe to `channel`
    ///
    /// The returned subscription yields events until the connection is lost
    /// or dropped.
    async fn subscribe(&self, channel: &str) -> Result<Box<dyn Subscription>, StoreError>;
}

/// An open channel subscription
#[async_trait]
pub trait Subscription: Send {
    /// Wait for the next event
    ///
    /// `Ok(None)` means the stream ended and will not produce anything else.
    async fn next_event(&mut self) -> Result<Option<StoreEvent>, StoreError>;
}
