//! HTTP server setup and request handling.
//!
//! # Responsibilities
//! - Create the Axum router with the chain handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind the mutually-authenticated TLS listener
//! - Run each request through the inspection pipeline
//! - Resolve the next hop and relay the request
//!
//! Per-connection state machine:
//! `Accepted → Authenticated → Inspected → {Forwarded | Dropped} → Closed`.
//! Accept and authenticate happen in the TLS layer below this module; a
//! caller without a valid client certificate never reaches the handler.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RouterConfig;
use crate::dpi::Dpi;
use crate::observability::metrics;
use crate::routing::{chain, Forwarder};

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub dpi: Arc<Dpi>,
    pub forwarder: Arc<Forwarder>,
    /// Body bytes buffered for inspection; larger bodies degrade to an
    /// empty inspection slot.
    pub max_body_bytes: usize,
}

/// HTTPS server for the service-function router.
pub struct HttpServer {
    app: Router,
    config: RouterConfig,
}

impl HttpServer {
    /// Create a new server with the given configuration and subsystems.
    pub fn new(config: RouterConfig, dpi: Arc<Dpi>, forwarder: Arc<Forwarder>) -> Self {
        let state = AppState {
            dpi,
            forwarder,
            max_body_bytes: config.listener.max_body_bytes,
        };
        let app = build_router(&config, state);
        Self { app, config }
    }

    /// Run the server on the mutually-authenticated TLS listener.
    pub async fn run(self, tls: RustlsConfig) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.listener.bind_address.parse().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("bind address: {e}"))
        })?;

        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        tokio::spawn(shutdown_signal(handle.clone()));

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.app.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(config: &RouterConfig, state: AppState) -> Router {
    Router::new()
        .route("/{*path}", any(chain_handler))
        .route("/", any(chain_handler))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
}

/// Main chain handler: inspect, resolve the next hop, relay.
async fn chain_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let (mut parts, body) = request.into_parts();

    // Buffer the body once; inspection reads these bytes and forwarding
    // sends the identical bytes, so the request stays fully readable. A
    // body over the buffering limit is a valid payload this hop cannot
    // inspect-and-restore, so it is rejected rather than relayed stripped.
    let body_bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) if is_length_limit(&e) => {
            tracing::warn!(limit = state.max_body_bytes, "request body exceeds the inspection limit");
            metrics::record_request(&method, StatusCode::PAYLOAD_TOO_LARGE.as_u16(), "reject", start);
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
        Err(e) => {
            tracing::warn!(error = %e, "request body unreadable, inspecting empty body");
            Bytes::new()
        }
    };

    let decision = state.dpi.investigate(&parts, &body_bytes);
    if !decision.forward {
        metrics::record_request(&method, StatusCode::FORBIDDEN.as_u16(), "drop", start);
        return StatusCode::FORBIDDEN.into_response();
    }

    // Route resolution: consume one hop from the chain header. A request
    // without a usable chain header cannot be routed and is rejected
    // explicitly as a protocol error.
    let hop = match chain::resolve_next_hop(&mut parts.headers) {
        Ok(hop) => hop,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting unroutable request");
            metrics::record_request(&method, StatusCode::BAD_REQUEST.as_u16(), "reject", start);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    tracing::debug!(next_hop = %hop.url, tls = hop.is_tls(), "forwarding request");

    match state.forwarder.forward(&hop, &parts, body_bytes).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), "forward", start);
            response
        }
        Err(e) => {
            tracing::error!(next_hop = %hop.url, error = %e, "upstream relay failed");
            metrics::record_request(&method, StatusCode::BAD_GATEWAY.as_u16(), "error", start);
            (StatusCode::BAD_GATEWAY, "upstream request failed").into_response()
        }
    }
}

/// True when a body-buffering error is the length limit, not an I/O
/// failure. The limit error may sit anywhere in the source chain.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Wait for shutdown signal (Ctrl+C), then drain connections.
async fn shutdown_signal(handle: axum_server::Handle) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
    handle.graceful_shutdown(Some(Duration::from_secs(30)));
}
