//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with every console endpoint
//! - Wire up middleware (request id, tracing, panics, limits, timeout)
//! - Serve over plain TCP or rustls until shutdown is signalled

use std::any::Any;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    middleware::map_response_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    BoxError, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::gateway::{Gateway, ResultEnvelope, UpstreamError};
use crate::http::handlers::{self, INBOUND_ROUTES};
use crate::http::X_REQUEST_ID;
use crate::observability::metrics;
use crate::routing::ActionRouter;

/// Headroom the inbound timeout keeps above the upstream deadline, so the
/// gateway reports upstream timeouts itself as network errors.
const TIMEOUT_HEADROOM_SECS: u64 = 5;

/// How long in-flight TLS connections may drain after shutdown.
const TLS_DRAIN_SECS: u64 = 10;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ActionRouter>,
    pub gateway: Gateway,
    pub default_host: Arc<str>,
}

impl AppState {
    pub fn new(config: &ConsoleConfig, gateway: Gateway) -> Self {
        Self {
            router: Arc::new(ActionRouter::from_config(&config.upstream)),
            gateway,
            default_host: Arc::from(config.upstream.default_host.as_str()),
        }
    }
}

/// HTTP server for the console.
pub struct ConsoleServer {
    router: Router,
}

impl ConsoleServer {
    /// Create a server that talks to the real management API.
    pub fn new(config: &ConsoleConfig) -> Result<Self, UpstreamError> {
        let gateway = Gateway::from_config(&config.upstream)?;
        Ok(Self::with_gateway(config, gateway))
    }

    /// Create a server around an existing gateway.
    pub fn with_gateway(config: &ConsoleConfig, gateway: Gateway) -> Self {
        let state = AppState::new(config, gateway);
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ConsoleConfig, state: AppState) -> Router {
        let mut app = Router::new()
            .route("/status", get(handlers::status))
            .route("/api/action", post(handlers::generic_action));

        for route in INBOUND_ROUTES {
            app = app.route(
                route.path,
                post(move |State(state): State<AppState>, headers: HeaderMap, body: Bytes| {
                    handlers::handle_inbound(route, state, headers, body)
                }),
            );
        }

        let request_id = HeaderName::from_static(X_REQUEST_ID);
        let timeout = Duration::from_secs(config.upstream.timeout_secs + TIMEOUT_HEADROOM_SECS);

        app.with_state(state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(map_response_with_state(config.security.max_body_size, oversized_body_envelope))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
                .layer(TimeoutLayer::new(timeout)),
        )
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> io::Result<()> {
        let handle = axum_server::Handle::new();
        let watcher = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            watcher.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
        });

        tracing::info!(address = %addr, "HTTPS server starting");
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Give the body limit's bare 413 the same JSON envelope as other rejections.
async fn oversized_body_envelope<B>(State(limit): State<usize>, response: Response<B>) -> Response
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let (mut parts, body) = response.into_parts();
    if parts.status != StatusCode::PAYLOAD_TOO_LARGE {
        return Response::from_parts(parts, Body::new(body));
    }
    drop(body);

    let err = ConsoleError::BodyTooLarge { limit };
    tracing::warn!(limit, "Rejected oversized request body");
    metrics::record_rejected(err.kind());

    let (envelope, json) = ResultEnvelope::from(err).into_response().into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    if let Some(content_type) = envelope.headers.get(header::CONTENT_TYPE) {
        parts.headers.insert(header::CONTENT_TYPE, content_type.clone());
    }
    Response::from_parts(parts, json)
}

/// Turn a handler panic into the generic internal-error envelope.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    tracing::error!(panic = %detail, "Handler panicked");
    ResultEnvelope::from(ConsoleError::Internal(detail)).into_response()
}
