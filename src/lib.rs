pub mod config;
pub mod http;
pub mod server;
pub mod status;
pub mod store;
mod utils;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
