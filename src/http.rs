//! HTTP serving surface for the telemetry stream
//!
//! Pipes the framed chunk sequence into an HTTP response body with the
//! Server-Sent-Events content type. Framing is owned by the format stage;
//! this layer forwards the bytes verbatim, so the response is a conformant
//! `text/event-stream` for browser and dashboard clients.
//!
//! # Example
//!
//! ```ignore
//! use pulssi::http::StreamServer;
//!
//! let telemetry = TelemetryStream::attach(&circuit);
//! let handle = StreamServer::start(9090, telemetry.stream()?);
//!
//! // Later, to shutdown
//! handle.abort();
//! ```

use crate::error::FormatError;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

type ChunkStream = BoxStream<'static, Result<Bytes, FormatError>>;

/// Wrap a framed chunk stream in an SSE response
///
/// The chunks already carry their `data: ...\n\n` envelope, so the body is
/// the stream verbatim. A format error terminates the response, which is
/// how processing failures reach the client side.
pub fn sse_response(
    chunks: impl Stream<Item = Result<Bytes, FormatError>> + Send + 'static,
) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(chunks),
    )
        .into_response()
}

#[derive(Clone)]
struct AppState {
    // The chunk stream is single-consumer; the first request claims it.
    chunks: Arc<Mutex<Option<ChunkStream>>>,
}

/// HTTP server exposing one circuit's telemetry stream
pub struct StreamServer;

impl StreamServer {
    /// Start the server on the given port
    ///
    /// Routes:
    /// - `GET /circuit.stream` - the SSE stream; answers `409 Conflict`
    ///   once the single-consumer stream has been claimed
    /// - `GET /health` - liveness probe
    ///
    /// Returns a JoinHandle that can be used to abort the server.
    pub fn start(
        port: u16,
        chunks: impl Stream<Item = Result<Bytes, FormatError>> + Send + 'static,
    ) -> JoinHandle<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let state = AppState {
            chunks: Arc::new(Mutex::new(Some(chunks.boxed()))),
        };

        tokio::spawn(async move {
            let app = Router::new()
                .route("/circuit.stream", get(stream_handler))
                .route("/health", get(health_handler))
                .with_state(state);

            info!(port = port, "Telemetry stream server starting");

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    error!(error = %e, port = port, "Failed to bind stream server");
                    return;
                }
            };

            if let Err(e) = axum::serve(listener, app).await {
                error!(error = %e, "Stream server error");
            }
        })
    }
}

/// Handler for /circuit.stream
async fn stream_handler(State(state): State<AppState>) -> Response {
    match state.chunks.lock().take() {
        Some(chunks) => sse_response(chunks),
        None => (StatusCode::CONFLICT, "stream already claimed").into_response(),
    }
}

/// Handler for /health
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::stream;

    fn one_chunk() -> ChunkStream {
        stream::iter(vec![Ok(Bytes::from_static(b"data: {}\n\n"))]).boxed()
    }

    #[test]
    fn test_sse_response_headers() {
        let response = sse_response(one_chunk());
        assert_eq!(response.status(), StatusCode::OK);

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(content_type, "text/event-stream");

        let cache = response
            .headers()
            .get(header::CACHE_CONTROL)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(cache, "no-cache");
    }

    #[tokio::test]
    async fn test_stream_claimed_once() {
        let state = AppState {
            chunks: Arc::new(Mutex::new(Some(one_chunk()))),
        };

        let first = stream_handler(State(state.clone())).await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = stream_handler(State(state)).await;
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
