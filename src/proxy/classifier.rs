//! Forwarding strategy selection.
//!
//! # Design Decisions
//! - Pure and total: every (method, content type) pair maps to exactly
//!   one strategy, unmatched POST content types fall back to passthrough
//! - Substring match so media-type parameters (`; charset=utf-8`) do
//!   not defeat classification

use axum::http::Method;

/// Media type of a form-encoded query submission.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Media type of a raw SPARQL query document.
pub const SPARQL_QUERY: &str = "application/sparql-query";

/// Media type requested for (and assumed of) query results.
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// How an inbound request is forwarded to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Method, path and body relayed verbatim.
    RawPassthrough,
    /// A `query=` form field is extracted and re-submitted.
    FormEncodedQuery,
    /// The whole body is the query document.
    DirectQueryBody,
}

impl Strategy {
    /// Label used in metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::RawPassthrough => "raw_passthrough",
            Strategy::FormEncodedQuery => "form_query",
            Strategy::DirectQueryBody => "direct_query",
        }
    }
}

/// Select a forwarding strategy from method and declared content type.
pub fn classify(method: &Method, content_type: Option<&str>) -> Strategy {
    if method != Method::POST {
        return Strategy::RawPassthrough;
    }
    match content_type {
        Some(ct) if ct.contains(FORM_URLENCODED) => Strategy::FormEncodedQuery,
        Some(ct) if ct.contains(SPARQL_QUERY) => Strategy::DirectQueryBody,
        _ => Strategy::RawPassthrough,
    }
}
