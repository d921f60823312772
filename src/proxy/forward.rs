//! Outbound request construction and dispatch.
//!
//! # Responsibilities
//! - Build the outbound request for each forwarding strategy
//! - Send it through the shared hyper client, bounded by the upstream
//!   timeout
//! - Relay the backend response or map the failure to a ProxyError
//!
//! # Design Decisions
//! - One shared client for all in-flight requests; per-request state is
//!   confined to the request itself
//! - An empty buffered body still produces an explicit empty outbound
//!   body, so a zero-length POST forwards cleanly
//! - Query strategies always target the backend root; only raw
//!   passthrough appends the inbound path

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Method, Request};
use axum::response::Response;
use hyper_util::client::legacy::{connect::HttpConnector, Client};

use crate::auth::BackendTarget;
use crate::error::ProxyError;
use crate::http::response::relay_response;
use crate::proxy::classifier::{FORM_URLENCODED, SPARQL_QUERY, SPARQL_RESULTS_JSON};
use crate::proxy::sparql;

const OCTET_STREAM: &str = "application/octet-stream";

/// Sends requests to resolved backends.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    upstream_timeout: Duration,
}

impl Forwarder {
    /// Create a forwarder over the shared outbound client.
    pub fn new(client: Client<HttpConnector, Body>, upstream_timeout: Duration) -> Self {
        Self {
            client,
            upstream_timeout,
        }
    }

    /// Relay method, path and body verbatim to `{base_url}/{path}`.
    pub async fn raw_passthrough(
        &self,
        target: &BackendTarget,
        method: Method,
        path: &str,
        body: Bytes,
    ) -> Result<Response, ProxyError> {
        let url = format!("{}/{}", target.base_url(), path);
        let outbound_body = if body.is_empty() {
            Body::empty()
        } else {
            Body::from(body)
        };

        let request = Request::builder()
            .method(method)
            .uri(url.as_str())
            .body(outbound_body)
            .map_err(|_| passthrough_failure())?;

        let response = self
            .send(request)
            .await
            .map_err(|detail| {
                tracing::warn!(url = %url, error = %detail, "Backend unreachable");
                passthrough_failure()
            })?;

        let (parts, incoming) = response.into_parts();
        Ok(relay_response(parts, Body::new(incoming), OCTET_STREAM))
    }

    /// Extract a `query=` form field, validate it, and re-submit it as a
    /// form-encoded POST to the backend root.
    pub async fn form_query(
        &self,
        target: &BackendTarget,
        body: Bytes,
    ) -> Result<Response, ProxyError> {
        let text = String::from_utf8_lossy(&body);
        let query = match sparql::extract_form_query(&text)? {
            Some(query) if !query.trim().is_empty() => query,
            _ => {
                return Err(ProxyError::MalformedBody("SPARQL query is required".into()));
            }
        };

        let form = sparql::encode_form_query(&query);
        self.query_request(target, FORM_URLENCODED, Body::from(form))
            .await
    }

    /// Forward the body verbatim as a SPARQL query document to the
    /// backend root. An empty body is forwarded as-is.
    pub async fn direct_query(
        &self,
        target: &BackendTarget,
        body: Bytes,
    ) -> Result<Response, ProxyError> {
        self.query_request(target, SPARQL_QUERY, Body::from(body))
            .await
    }

    async fn query_request(
        &self,
        target: &BackendTarget,
        content_type: &'static str,
        body: Body,
    ) -> Result<Response, ProxyError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(target.base_url())
            .header(header::CONTENT_TYPE, HeaderValue::from_static(content_type))
            .header(
                header::ACCEPT,
                HeaderValue::from_static(SPARQL_RESULTS_JSON),
            )
            .body(body)
            .map_err(|e| query_failure(&e.to_string()))?;

        let response = self.send(request).await.map_err(|detail| {
            tracing::warn!(url = %target.base_url(), error = %detail, "SPARQL endpoint unreachable");
            query_failure(&detail)
        })?;

        let (parts, incoming) = response.into_parts();
        Ok(relay_response(
            parts,
            Body::new(incoming),
            SPARQL_RESULTS_JSON,
        ))
    }

    /// Issue the outbound call, bounded by the upstream timeout.
    async fn send(
        &self,
        request: Request<Body>,
    ) -> Result<hyper::Response<hyper::body::Incoming>, String> {
        match tokio::time::timeout(self.upstream_timeout, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "request timed out after {}s",
                self.upstream_timeout.as_secs()
            )),
        }
    }
}

/// 502 body for raw passthrough; deliberately detail-free.
fn passthrough_failure() -> ProxyError {
    ProxyError::TransportFailure("Failed to contact backend service".into())
}

/// 502 body for the query strategies, carrying the failure detail.
fn query_failure(detail: &str) -> ProxyError {
    ProxyError::TransportFailure(format!("Failed to contact SPARQL endpoint: {detail}"))
}
