use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::config::{Args, Config};
use crate::http::server;
use crate::server::signal::cancel_on_signal;
use crate::status::{StatusCache, StatusListener, bootstrap};
use crate::store::{RedisStore, StatusStore};
use crate::utils;

const LISTENER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run_server() {
    let args = Args::parse();

    if let Err(e) = utils::init_tracing() {
        eprintln!("Failed to initialize logging: {}", e);
        return;
    }

    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    tracing::debug!("config: {:?}", config);

    let store = RedisStore::new(&config.store.host, config.store.port, config.store.timeout());
    let store = match store {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Invalid status store address: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Using status store at {}:{}",
        config.store.host,
        config.store.port
    );

    let shutdown = CancellationToken::new();
    cancel_on_signal(shutdown.clone());

    if let Err(e) = run(config, Arc::new(store), shutdown).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Bind the configured address and run the service until `shutdown` fires
pub async fn run(
    config: Config,
    store: Arc<dyn StatusStore>,
    shutdown: CancellationToken,
) -> crate::Result<()> {
    let listener = TcpListener::bind(&config.http.listen_addr).await?;
    serve_with(config, store, listener, shutdown).await
}

/// Run the service on an already bound listener
///
/// The cache is seeded from the store before the first request is accepted.
/// The status listener runs alongside the HTTP server and is stopped and
/// awaited once the server returns.
pub async fn serve_with(
    config: Config,
    store: Arc<dyn StatusStore>,
    listener: TcpListener,
    shutdown: CancellationToken,
) -> crate::Result<()> {
    let cache = Arc::new(StatusCache::new());

    bootstrap(
        store.as_ref(),
        &cache,
        &config.store.status_key,
        config.store.timeout(),
    )
    .await;

    let channel = config.store.status_channel.clone();
    let status_listener = StatusListener::new(store, cache.clone(), channel)
        .with_policy(config.listener.policy())
        .spawn(shutdown.child_token());
    tracing::info!(
        "Started status listener on channel {}",
        config.store.status_channel
    );

    let served = server::serve(listener, cache, shutdown.clone()).await;

    // the server may also return on a bind or accept error
    shutdown.cancel();
    match timeout(LISTENER_STOP_TIMEOUT, status_listener).await {
        Ok(Ok(())) => tracing::info!("Status listener stopped"),
        Ok(Err(e)) => tracing::error!("Status listener task failed: {}", e),
        Err(_) => tracing::error!(
            "Status listener did not stop within {:?}",
            LISTENER_STOP_TIMEOUT
        ),
    }

    served
}
