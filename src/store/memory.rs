//! In-process status store
//!
//! Behaves like a single Redis node for the two operations the service
//! uses: keys can be set and read, messages published to a channel reach
//! every live subscriber of that channel. Failures and disconnects can be
//! injected.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{StatusStore, StoreError, StoreEvent, Subscription};

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,

    /// live subscribers
    /// - key: channel
    /// - value: event senders, one per subscription
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<StoreEvent>>>>,

    fail_gets: AtomicBool,
    fail_subscribes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: &str) {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
    }

    /// Publish `payload` on `channel`, returning how many subscribers got it
    pub fn publish(&self, channel: &str, payload: &str) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        let Some(senders) = subscribers.get_mut(channel) else {
            return 0;
        };

        senders.retain(|tx| {
            tx.send(StoreEvent::Message {
                channel: channel.to_string(),
                payload: payload.to_string(),
            })
            .is_ok()
        });
        senders.len()
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        match subscribers.get_mut(channel) {
            Some(senders) => {
                senders.retain(|tx| !tx.is_closed());
                senders.len()
            }
            None => 0,
        }
    }

    /// Drop every open subscription; their streams end
    pub fn disconnect_all(&self) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.clear();
    }

    /// Make subsequent `get` calls fail with a connection error
    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `subscribe` calls fail with a connection error
    pub fn fail_subscribes(&self, fail: bool) {
        self.fail_subscribes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl StatusStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("connection refused".into()));
        }
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    async fn subscribe(&self, channel: &str) -> Result<Box<dyn Subscription>, StoreError> {
        if self.fail_subscribes.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("connection refused".into()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        // receiver is alive, send cannot fail
        let _ = tx.send(StoreEvent::Subscribed {
            channel: channel.to_string(),
        });

        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.entry(channel.to_string()).or_default().push(tx);

        Ok(Box::new(MemorySubscription { rx }))
    }
}

struct MemorySubscription {
    rx: mpsc::UnboundedReceiver<StoreEvent>,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn next_event(&mut self) -> Result<Option<StoreEvent>, StoreError> {
        Ok(self.rx.recv().await)
    }
}
