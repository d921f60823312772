//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all proxy handler
//! - Wire up middleware (timeout, request ID, tracing)
//! - Buffer the inbound body exactly once
//! - Run the authorization gate, classify, and forward
//! - Record per-request metrics
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → authorization gate (401 / 403 early exits)
//!     → classifier (one of three strategies)
//!     → forwarder (outbound call)
//!     → relayed response or mapped error
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::{authorize_request, Authorizer, RemoteAuthorizer};
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::request::{RequestIdLayer, X_REQUEST_ID};
use crate::observability::metrics;
use crate::proxy::{classify, Forwarder, Strategy};

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub authorizer: Arc<dyn Authorizer>,
    pub forwarder: Forwarder,
    pub max_body_bytes: usize,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server that authorizes against the configured remote
    /// validation endpoint.
    pub fn new(config: ProxyConfig) -> Self {
        let authorizer = Arc::new(RemoteAuthorizer::new(
            config.authorizer.endpoint.clone(),
            Duration::from_secs(config.authorizer.timeout_secs),
        ));
        Self::with_authorizer(config, authorizer)
    }

    /// Create a server with an explicit authorizer. This is the seam
    /// tests use to stub out the exchange.
    pub fn with_authorizer(config: ProxyConfig, authorizer: Arc<dyn Authorizer>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let forwarder = Forwarder::new(client, Duration::from_secs(config.timeouts.upstream_secs));

        let state = AppState {
            authorizer,
            forwarder,
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
///
/// Buffers the body, runs the gate, classifies and forwards. The gate
/// always runs before any outbound call; no strategy touches the
/// transport stream after the single buffering read.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let method_str = method.to_string();
    let path = parts.uri.path().trim_start_matches('/').to_string();
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        content_type = content_type.as_deref().unwrap_or("-"),
        "Proxying request"
    );

    // Single read of the inbound body; everything downstream works on
    // these bytes.
    let body_bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read request body");
            metrics::record_request(&method_str, 400, "none", start_time);
            return ProxyError::MalformedBody("Failed to read request body".into()).into_response();
        }
    };

    let target = match authorize_request(state.authorizer.as_ref(), &parts.headers).await {
        Ok(target) => target,
        Err(e) => {
            let status = e.status();
            tracing::debug!(request_id = %request_id, status = %status, "Request rejected at gate");
            metrics::record_request(&method_str, status.as_u16(), "none", start_time);
            return e.into_response();
        }
    };

    let strategy = classify(&method, content_type.as_deref());
    let result = match strategy {
        Strategy::RawPassthrough => {
            state
                .forwarder
                .raw_passthrough(&target, method, &path, body_bytes)
                .await
        }
        Strategy::FormEncodedQuery => state.forwarder.form_query(&target, body_bytes).await,
        Strategy::DirectQueryBody => state.forwarder.direct_query(&target, body_bytes).await,
    };

    match result {
        Ok(response) => {
            let status = response.status();
            tracing::debug!(
                request_id = %request_id,
                status = %status,
                strategy = strategy.as_str(),
                "Backend responded"
            );
            metrics::record_request(&method_str, status.as_u16(), strategy.as_str(), start_time);
            response
        }
        Err(e) => {
            let status = e.status();
            tracing::debug!(
                request_id = %request_id,
                status = %status,
                strategy = strategy.as_str(),
                error = %e,
                "Forwarding failed"
            );
            metrics::record_request(&method_str, status.as_u16(), strategy.as_str(), start_time);
            e.into_response()
        }
    }
}
