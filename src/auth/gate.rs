//! Credential extraction and exchange.

use std::collections::HashMap;

use axum::http::{header, HeaderMap};
use url::Url;

use crate::auth::authorizer::{Authorizer, DataAddress};
use crate::error::ProxyError;

/// A backend the caller has been authorized to reach.
///
/// Exists only behind a successful exchange, so the base URL is never
/// optional past this point.
#[derive(Debug, Clone)]
pub struct BackendTarget {
    base_url: String,
    address: DataAddress,
}

impl BackendTarget {
    /// Base URL of the resolved backend.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full capability data returned by the authorization service.
    pub fn address(&self) -> &DataAddress {
        &self.address
    }
}

/// Run the authorization gate for one request.
///
/// Extracts the `Authorization` header and exchanges it for a backend
/// target. A missing header fails without consulting the authorizer at
/// all; every collaborator-side failure collapses to `DeniedCredential`.
pub async fn authorize_request(
    authorizer: &dyn Authorizer,
    headers: &HeaderMap,
) -> Result<BackendTarget, ProxyError> {
    let credential = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ProxyError::MissingCredential)?;

    let address = match authorizer.authorize(credential, &HashMap::new()).await {
        Ok(address) => address,
        Err(failure) => {
            tracing::debug!(error = %failure, "Authorization exchange failed");
            return Err(ProxyError::DeniedCredential);
        }
    };

    let base_url = match address.base_url() {
        Some(url) => url.to_string(),
        None => {
            tracing::warn!("Authorized data address carries no base URL");
            return Err(ProxyError::DeniedCredential);
        }
    };

    // The authorizer is trusted for policy, not for well-formedness.
    if Url::parse(&base_url).is_err() {
        tracing::warn!(base_url = %base_url, "Authorized base URL is not a valid URL");
        return Err(ProxyError::DeniedCredential);
    }

    Ok(BackendTarget { base_url, address })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authorizer::{AuthFailure, BASE_URL_PROPERTY};
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StaticAuthorizer {
        result: Result<DataAddress, ()>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Authorizer for StaticAuthorizer {
        async fn authorize(
            &self,
            _credential: &str,
            _context: &HashMap<String, String>,
        ) -> Result<DataAddress, AuthFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .map_err(|_| AuthFailure::Rejected("denied".into()))
        }
    }

    fn headers_with_token(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(token).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_missing_header_skips_authorizer() {
        let authorizer = StaticAuthorizer {
            result: Ok(DataAddress::default()),
            calls: AtomicU32::new(0),
        };
        let result = authorize_request(&authorizer, &HeaderMap::new()).await;
        assert!(matches!(result, Err(ProxyError::MissingCredential)));
        assert_eq!(authorizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_denied_credential() {
        let authorizer = StaticAuthorizer {
            result: Err(()),
            calls: AtomicU32::new(0),
        };
        let result = authorize_request(&authorizer, &headers_with_token("token-1")).await;
        assert!(matches!(result, Err(ProxyError::DeniedCredential)));
        assert_eq!(authorizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_resolves_base_url() {
        let authorizer = StaticAuthorizer {
            result: Ok(DataAddress::from_properties([(
                BASE_URL_PROPERTY,
                "http://localhost:3030/ds",
            )])),
            calls: AtomicU32::new(0),
        };
        let target = authorize_request(&authorizer, &headers_with_token("token-1"))
            .await
            .unwrap();
        assert_eq!(target.base_url(), "http://localhost:3030/ds");
    }

    #[tokio::test]
    async fn test_address_without_base_url_is_denied() {
        let authorizer = StaticAuthorizer {
            result: Ok(DataAddress::default()),
            calls: AtomicU32::new(0),
        };
        let result = authorize_request(&authorizer, &headers_with_token("token-1")).await;
        assert!(matches!(result, Err(ProxyError::DeniedCredential)));
    }

    #[tokio::test]
    async fn test_unparseable_base_url_is_denied() {
        let authorizer = StaticAuthorizer {
            result: Ok(DataAddress::from_properties([(
                BASE_URL_PROPERTY,
                "not a url",
            )])),
            calls: AtomicU32::new(0),
        };
        let result = authorize_request(&authorizer, &headers_with_token("token-1")).await;
        assert!(matches!(result, Err(ProxyError::DeniedCredential)));
    }
}
