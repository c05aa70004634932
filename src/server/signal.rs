use tokio_util::sync::CancellationToken;

/// Cancel `shutdown` on the first SIGINT (Ctrl+C) or SIGTERM
pub fn cancel_on_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut sigterm =
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        tracing::error!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };
            if sigterm.recv().await.is_some() {
                tracing::info!("Received SIGTERM signal");
                shutdown.cancel();
            }
        });
    }

    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            tracing::info!("Received SIGINT signal (Ctrl+C)");
            shutdown.cancel();
        }
    });
}
