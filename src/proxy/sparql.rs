//! `query=` form field codec.
//!
//! The SPARQL protocol's form binding submits the query as a single
//! URL-encoded `query` field. Decoding follows form semantics: `+` is a
//! space, percent escapes are UTF-8.

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

use crate::error::ProxyError;

/// Extract the query text from a form-encoded body.
///
/// The body must begin with the literal `query=`; everything after the
/// prefix is decoded as one value. A missing prefix yields `Ok(None)`
/// (validated by the caller), undecodable data is a malformed body.
pub fn extract_form_query(body: &str) -> Result<Option<String>, ProxyError> {
    let Some(encoded) = body.strip_prefix("query=") else {
        return Ok(None);
    };
    let spaced: Cow<'_, str> = if encoded.contains('+') {
        Cow::Owned(encoded.replace('+', " "))
    } else {
        Cow::Borrowed(encoded)
    };
    match percent_decode_str(&spaced).decode_utf8() {
        Ok(query) => Ok(Some(query.into_owned())),
        Err(e) => {
            tracing::debug!(error = %e, "Query parameter is not valid UTF-8");
            Err(ProxyError::MalformedBody(
                "Failed to decode query parameter".into(),
            ))
        }
    }
}

/// Re-encode query text as a `query=` form body for the backend.
pub fn encode_form_query(query: &str) -> String {
    format!("query={}", utf8_percent_encode(query, NON_ALPHANUMERIC))
}
