//! HTTP server setup and management

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{AppState, root};
use crate::status::StatusCache;

pub fn router(status_cache: Arc<StatusCache>) -> Router {
    Router::new()
        .route("/", get(root))
        .with_state(AppState::new(status_cache))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Bind `addr` and serve until `shutdown` is cancelled
pub async fn start(
    addr: &str,
    status_cache: Arc<StatusCache>,
    shutdown: CancellationToken,
) -> crate::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, status_cache, shutdown).await
}

/// Serve on an already bound listener until `shutdown` is cancelled
///
/// In-flight requests are allowed to finish.
pub async fn serve(
    listener: TcpListener,
    status_cache: Arc<StatusCache>,
    shutdown: CancellationToken,
) -> crate::Result<()> {
    tracing::info!("HTTP server listening on http://{}/", listener.local_addr()?);

    axum::serve(listener, router(status_cache))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::models::MessageResponse;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tower::ServiceExt;

    async fn get_root(cache: Arc<StatusCache>) -> (StatusCode, MessageResponse) {
        let response = router(cache)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_default_cache_is_unavailable() {
        let (status, body) = get_root(Arc::new(StatusCache::new())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.message, "not available");
    }

    #[tokio::test]
    async fn test_up_is_available() {
        let (status, body) = get_root(Arc::new(StatusCache::with_value("up"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.message, "hello from post service");
    }

    #[tokio::test]
    async fn test_anything_but_exact_up_is_unavailable() {
        for value in ["down", "degraded", "", "Up", "up\n"] {
            let (status, body) = get_root(Arc::new(StatusCache::with_value(value))).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "value {:?}", value);
            assert_eq!(body.message, "not available");
        }
    }

    #[tokio::test]
    async fn test_response_follows_cache_writes() {
        let cache = Arc::new(StatusCache::new());
        let app = router(cache.clone());

        cache.write("up");
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        cache.write("down");
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = router(Arc::new(StatusCache::with_value("up")))
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_start_rejects_bad_address() {
        let result = start(
            "not-an-address",
            Arc::new(StatusCache::new()),
            CancellationToken::new(),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_serve_over_tcp_and_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let server = tokio::spawn(serve(
            listener,
            Arc::new(StatusCache::with_value("up")),
            shutdown.clone(),
        ));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();
        assert!(raw.starts_with("HTTP/1.1 200"), "unexpected response: {}", raw);
        assert!(raw.contains(r#"{"message":"hello from post service"}"#));

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(2), server)
            .await
            .expect("server should stop")
            .unwrap()
            .unwrap();
    }
}
