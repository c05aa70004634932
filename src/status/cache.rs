//! Status cache shared between the listener and the HTTP handlers

use std::sync::RwLock;

use super::{DEFAULT_STATUS, ServiceStatus};

/// Last known status string
///
/// Readers and writers never observe a partially written value. No history
/// is kept: every write replaces the previous value.
#[derive(Debug)]
pub struct StatusCache {
    value: RwLock<String>,
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusCache {
    /// Create a cache holding the safe default
    pub fn new() -> Self {
        Self::with_value(DEFAULT_STATUS)
    }

    pub fn with_value(value: &str) -> Self {
        Self {
            value: RwLock::new(value.to_string()),
        }
    }

    pub fn read(&self) -> String {
        self.value.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn write(&self, value: &str) {
        let mut current = self.value.write().unwrap_or_else(|e| e.into_inner());
        *current = value.to_string();
    }

    pub fn status(&self) -> ServiceStatus {
        let current = self.value.read().unwrap_or_else(|e| e.into_inner());
        ServiceStatus::from(current.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_default_is_down() {
        let cache = StatusCache::new();
        assert_eq!(cache.read(), "down");
        assert_eq!(cache.status(), ServiceStatus::Down);
    }

    #[test]
    fn test_last_write_wins() {
        let cache = StatusCache::new();
        cache.write("up");
        assert_eq!(cache.read(), "up");
        cache.write("down");
        assert_eq!(cache.read(), "down");
        cache.write("degraded");
        assert_eq!(cache.status(), ServiceStatus::Unknown("degraded".to_string()));
    }

    #[test]
    fn test_concurrent_reads_see_whole_values() {
        let cache = Arc::new(StatusCache::new());
        let writer = {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for i in 0..1000 {
                    cache.write(if i % 2 == 0 { "up" } else { "down" });
                }
            })
        };

        for _ in 0..1000 {
            let value = cache.read();
            assert!(value == "up" || value == "down", "torn read: {:?}", value);
        }
        writer.join().unwrap();
    }
}
