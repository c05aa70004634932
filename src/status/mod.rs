//! Mirrored upstream status
//!
//! The availability flag of the profile service is mirrored into a single
//! in-memory cell. It is seeded once at startup by [`bootstrap`] and kept
//! fresh by a [`StatusListener`] subscribed to the update channel.

pub mod bootstrap;
pub mod cache;
pub mod listener;

use std::fmt;

pub use bootstrap::{BootstrapOutcome, bootstrap};
pub use cache::StatusCache;
pub use listener::{ResubscribePolicy, StatusListener};

/// Value the cache holds before anything was learned from the store
pub const DEFAULT_STATUS: &str = "down";

/// Classified status token
///
/// Only the exact token `up` means available. Transport payloads are never
/// rejected; unrecognized ones are kept verbatim as `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    Up,
    Down,
    Unknown(String),
}

impl ServiceStatus {
    pub fn is_up(&self) -> bool {
        matches!(self, ServiceStatus::Up)
    }
}

impl From<&str> for ServiceStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "up" => ServiceStatus::Up,
            "down" => ServiceStatus::Down,
            other => ServiceStatus::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Up => "up".fmt(f),
            ServiceStatus::Down => "down".fmt(f),
            ServiceStatus::Unknown(raw) => raw.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_exact_up_is_up() {
        assert!(ServiceStatus::from("up").is_up());
        for raw in ["down", "degraded", "", "UP", "up ", " up"] {
            assert!(!ServiceStatus::from(raw).is_up(), "{:?} must not be up", raw);
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(ServiceStatus::from("down"), ServiceStatus::Down);
        assert_eq!(
            ServiceStatus::from("degraded"),
            ServiceStatus::Unknown("degraded".to_string())
        );
    }

    #[test]
    fn test_display_keeps_raw_token() {
        assert_eq!(ServiceStatus::from("maintenance").to_string(), "maintenance");
        assert_eq!(ServiceStatus::Up.to_string(), "up");
    }
}
