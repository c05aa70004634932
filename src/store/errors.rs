//! Status store transport errors
//!
//! Every failure the store adapters can hit while talking to the backing
//! key-value service. None of these ever reach an HTTP caller: the
//! bootstrapper and the listener log them and keep the cache as it is.

use std::fmt;
use std::fmt::Display;
use std::time::Duration;

/// Status store failure
#[derive(Debug)]
pub enum StoreError {
    /// The operation did not finish within the configured bound
    Timeout(Duration),

    /// Connecting to the store failed or the connection dropped
    ///
    /// Wraps the underlying client error.
    Connection(crate::Error),

    /// The store answered with something we cannot interpret
    ///
    /// Occurs when:
    /// - A GET reply is not a string or nil
    /// - A published payload cannot be decoded as UTF-8
    Protocol(String),

    /// The subscription was closed by the other side
    Closed,
}

impl std::error::Error for StoreError {}

impl Display for StoreError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::Timeout(after) => write!(fmt, "store operation timed out after {:?}", after),
            StoreError::Connection(e) => write!(fmt, "store connection failed: {}", e),
            StoreError::Protocol(msg) => write!(fmt, "unexpected store reply: {}", msg),
            StoreError::Closed => "subscription closed".fmt(fmt),
        }
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        match e.kind() {
            redis::ErrorKind::TypeError => StoreError::Protocol(e.to_string()),
            _ => StoreError::Connection(Box::new(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(StoreError::Closed.to_string(), "subscription closed");
        assert_eq!(
            StoreError::Timeout(Duration::from_secs(2)).to_string(),
            "store operation timed out after 2s"
        );
        assert_eq!(
            StoreError::Protocol("not a string".to_string()).to_string(),
            "unexpected store reply: not a string"
        );
    }

    #[test]
    fn test_from_redis_type_error() {
        let e = redis::RedisError::from((redis::ErrorKind::TypeError, "bad reply"));
        assert!(matches!(StoreError::from(e), StoreError::Protocol(_)));
    }

    #[test]
    fn test_from_redis_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let e = redis::RedisError::from(io);
        assert!(matches!(StoreError::from(e), StoreError::Connection(_)));
    }
}
