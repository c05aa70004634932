//! HTTP API response models

use serde::{Deserialize, Serialize};

/// Body returned when the profile service is up
pub const AVAILABLE_MESSAGE: &str = "hello from post service";

/// Body returned for every other status
pub const UNAVAILABLE_MESSAGE: &str = "not available";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
