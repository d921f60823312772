//! Authorization exchange seam.
//!
//! The proxy never verifies credentials itself. It hands the raw bearer
//! token to an [`Authorizer`] and receives either a [`DataAddress`]
//! describing the backend it may talk to, or a failure.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Namespace prefix for well-known data address properties.
pub const EDC_NAMESPACE: &str = "https://w3id.org/edc/v0.0.1/ns/";

/// Property key holding the resolved backend base URL.
pub const BASE_URL_PROPERTY: &str = "https://w3id.org/edc/v0.0.1/ns/baseUrl";

/// Resolved backend descriptor returned by a successful exchange.
///
/// Conceptually a bag of capability properties; the proxy only ever reads
/// the namespaced base URL out of it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DataAddress {
    properties: HashMap<String, serde_json::Value>,
}

impl DataAddress {
    /// Build an address from string properties.
    pub fn from_properties<I, K, V>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), serde_json::Value::String(v.into())))
                .collect(),
        }
    }

    /// Read a string-valued property. Non-string values read as absent.
    pub fn string_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)?.as_str()
    }

    /// The namespaced base URL property, if present.
    pub fn base_url(&self) -> Option<&str> {
        self.string_property(BASE_URL_PROPERTY)
    }
}

/// Why an authorization exchange did not yield a data address.
#[derive(Debug, Error)]
pub enum AuthFailure {
    /// The authorization service evaluated the credential and said no.
    #[error("credential rejected: {0}")]
    Rejected(String),

    /// The authorization service could not be consulted at all.
    #[error("authorization service unavailable: {0}")]
    Unavailable(String),
}

/// Credential-for-address exchange.
///
/// The context map is reserved for future scoping data and is empty for
/// every call this proxy makes today.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(
        &self,
        credential: &str,
        context: &HashMap<String, String>,
    ) -> Result<DataAddress, AuthFailure>;
}
