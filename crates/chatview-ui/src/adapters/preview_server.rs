//! Local HTTP server that hosts sandbox frames
//!
//! Binds to an ephemeral loopback port. Routes:
//! - `GET /frames/:id`: the host page, or the stopped page once revoked
//! - `GET /frames/:id/alive`: `204` while live, `410` after unmount

use super::frames::{FrameRegistry, ServedFrameHost, STOPPED_PAGE};
use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chatview_core::FrameId;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use tracing::{error, info};

/// Build the frame routes over `registry`
pub fn build_router(registry: Arc<FrameRegistry>) -> Router {
    Router::new()
        .route("/frames/:id", get(frame_page))
        .route("/frames/:id/alive", get(frame_alive))
        .with_state(registry)
}

async fn frame_page(State(registry): State<Arc<FrameRegistry>>, Path(id): Path<u64>) -> Response {
    let no_store = [(header::CACHE_CONTROL, "no-store")];
    match registry.page(FrameId(id)) {
        Some(page) => (no_store, Html(page)).into_response(),
        None => (StatusCode::GONE, no_store, Html(STOPPED_PAGE)).into_response(),
    }
}

async fn frame_alive(State(registry): State<Arc<FrameRegistry>>, Path(id): Path<u64>) -> StatusCode {
    if registry.is_live(FrameId(id)) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::GONE
    }
}

/// The running server. Dropping it shuts the server down.
pub struct PreviewServer {
    registry: Arc<FrameRegistry>,
    base_url: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Drives the server task; dropped after the shutdown signal
    _runtime: Runtime,
}

impl PreviewServer {
    /// Bind to `127.0.0.1` on a free port and serve on `runtime`
    pub fn start(runtime: Runtime) -> anyhow::Result<Self> {
        let registry = Arc::new(FrameRegistry::new());
        let listener = runtime
            .block_on(tokio::net::TcpListener::bind(("127.0.0.1", 0)))
            .context("Failed to bind preview server")?;
        let addr = listener.local_addr()?;

        let router = build_router(registry.clone());
        let (tx, rx) = oneshot::channel();
        runtime.spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async {
                let _ = rx.await;
            });
            if let Err(e) = server.await {
                error!("Preview server error: {}", e);
            }
        });

        info!(%addr, "preview server listening");
        Ok(Self {
            registry,
            base_url: format!("http://{}", addr),
            shutdown_tx: Some(tx),
            _runtime: runtime,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A frame host whose pages this server serves
    pub fn frame_host(&self) -> ServedFrameHost {
        ServedFrameHost::new(self.registry.clone(), self.base_url.clone())
    }

    pub fn registry(&self) -> &Arc<FrameRegistry> {
        &self.registry
    }
}

impl Drop for PreviewServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chatview_core::{FrameHost, SandboxDocument};
    use pretty_assertions::assert_eq;
    use tower::util::ServiceExt;

    fn request(uri: String) -> Request<Body> {
        Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_serves_live_frame_then_gone_after_stop() {
        let registry = Arc::new(FrameRegistry::new());
        let router = build_router(registry.clone());
        let mut host = ServedFrameHost::new(registry.clone(), "http://127.0.0.1:1");
        let frame = host.mount(&SandboxDocument::from_html("<b>live</b>", 400.0, 800.0));

        let response = router.clone().oneshot(request(format!("/frames/{}", frame.0))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        assert!(body_text(response).await.contains("&lt;b&gt;live&lt;/b&gt;"));

        let alive = router.clone().oneshot(request(format!("/frames/{}/alive", frame.0))).await.unwrap();
        assert_eq!(alive.status(), StatusCode::NO_CONTENT);

        host.unmount(frame);

        let alive = router.clone().oneshot(request(format!("/frames/{}/alive", frame.0))).await.unwrap();
        assert_eq!(alive.status(), StatusCode::GONE);

        let response = router.oneshot(request(format!("/frames/{}", frame.0))).await.unwrap();
        assert_eq!(response.status(), StatusCode::GONE);
        assert!(body_text(response).await.contains("Preview stopped"));
    }

    #[tokio::test]
    async fn test_unknown_frame_is_gone() {
        let router = build_router(Arc::new(FrameRegistry::new()));
        let response = router.oneshot(request("/frames/42/alive".to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::GONE);
    }

    #[test]
    fn test_start_binds_loopback() {
        let server = PreviewServer::start(Runtime::new().unwrap()).unwrap();
        assert!(server.base_url().starts_with("http://127.0.0.1:"));

        let mut host = server.frame_host();
        let frame = host.mount(&SandboxDocument::from_html("<p>x</p>", 400.0, 800.0));
        assert_eq!(
            host.take_pending_opens(),
            vec![format!("{}/frames/{}", server.base_url(), frame.0)]
        );
    }
}
