use std::fs;
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::status::ResubscribePolicy;

/// Post service: serves requests while the profile service is up
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Status store (Redis) host [default: localhost]
    #[arg(long, env = "REDIS_HOST")]
    pub redis_host: Option<String>,

    /// Status store (Redis) port [default: 6379]
    #[arg(long, env = "REDIS_PORT")]
    pub redis_port: Option<u16>,

    /// HTTP listen address [default: 0.0.0.0:8000]
    #[arg(short, long, env = "LISTEN_ADDR")]
    pub listen: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long, env = "POST_SERVICE_CONFIG")]
    pub config: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub listener: ListenerConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    // bound for connect, GET and SUBSCRIBE round trips
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // key read once at startup
    #[serde(default = "default_status_key")]
    pub status_key: String,

    // channel carrying status updates
    #[serde(default = "default_status_channel")]
    pub status_channel: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            status_key: default_status_key(),
            status_channel: default_status_channel(),
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_timeout_secs() -> u64 {
    2
}

fn default_status_key() -> String {
    "profile_service_status".to_string()
}

fn default_status_channel() -> String {
    "profile_service_status_updates".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListenerConfig {
    // resubscribe after the subscription is lost; when false the listener
    // stops and the cache keeps its last value
    #[serde(default = "default_resubscribe")]
    pub resubscribe: bool,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            resubscribe: default_resubscribe(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl ListenerConfig {
    pub fn policy(&self) -> ResubscribePolicy {
        ResubscribePolicy {
            enabled: self.resubscribe,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

fn default_resubscribe() -> bool {
    true
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

pub fn load(path: &str) -> anyhow::Result<Config> {
    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

impl Config {
    /// Build the effective configuration
    ///
    /// Starts from the file named by `--config` (or built-in defaults) and
    /// applies flags and environment variables on top.
    pub fn from_args(args: &Args) -> anyhow::Result<Config> {
        let mut config = match &args.config {
            Some(path) => load(path)?,
            None => Config::default(),
        };

        if let Some(host) = &args.redis_host {
            config.store.host = host.clone();
        }
        if let Some(port) = args.redis_port {
            config.store.port = port;
        }
        if let Some(listen) = &args.listen {
            config.http.listen_addr = listen.clone();
        }
        Ok(config)
    }
}
