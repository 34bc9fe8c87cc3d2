//! HTTP routes
//!
//! | Path | Description |
//! |------|-------------|
//! | `/` | Static viewer page |
//! | `/video` | `multipart/x-mixed-replace` stream, one session per request |

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::sync::Semaphore;

use crate::relay::{FrameStore, Shutdown};
use crate::stream::{SessionConfig, StreamSession};

/// Viewer page: the stream scaled to fill the window
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
    <head>
        <style>
            body { margin: 0; padding: 0; }
            img { width: 100vw; height: 100vh; object-fit: contain; }
        </style>
    </head>
    <body>
        <img src="/video">
    </body>
</html>
"#;

const NO_CACHE: &str = "no-cache, no-store";

/// State shared by all request handlers
#[derive(Clone)]
pub(crate) struct AppState {
    pub store: Arc<FrameStore>,
    pub session_config: SessionConfig,
    pub shutdown: Shutdown,
    pub next_session_id: Arc<AtomicU64>,
    pub session_limit: Option<Arc<Semaphore>>,
}

/// Build the router
pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/video", get(video))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Starts a stream session bound to this response
///
/// The body never ends on its own; it is dropped when the client disconnects
/// and finishes cleanly on shutdown.
async fn video(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    let permit = match state.session_limit {
        Some(ref sem) => match Arc::clone(sem).try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                tracing::warn!(peer = %peer, "Stream session rejected: limit reached");
                return (StatusCode::SERVICE_UNAVAILABLE, "Too many viewers").into_response();
            }
        },
        None => None,
    };

    let session_id = state.next_session_id.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(session_id = session_id, peer = %peer, "New viewer");

    let mut session = StreamSession::new(
        session_id,
        Arc::clone(&state.store),
        state.session_config.clone(),
        state.shutdown.listener(),
    );
    if let Some(permit) = permit {
        session = session.with_permit(permit);
    }

    let content_type = state.session_config.multipart.content_type();
    let body = Body::from_stream(session.into_stream());

    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, NO_CACHE.to_string()),
        ],
        body,
    )
        .into_response()
}
