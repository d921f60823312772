//! HTTP-backed authorizer.
//!
//! Production deployments resolve tokens against an out-of-process
//! validation endpoint: the credential goes out in the `Authorization`
//! header, the response body is the data address as flat JSON.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;

use crate::auth::authorizer::{AuthFailure, Authorizer, DataAddress};

/// Authorizer that consults a remote token-validation endpoint.
pub struct RemoteAuthorizer {
    endpoint: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl RemoteAuthorizer {
    /// Create an authorizer for the given validation endpoint.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl Authorizer for RemoteAuthorizer {
    async fn authorize(
        &self,
        credential: &str,
        context: &HashMap<String, String>,
    ) -> Result<DataAddress, AuthFailure> {
        let mut request = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, credential)
            .timeout(self.timeout);

        for (key, value) in context {
            request = request.query(&[(key, value)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthFailure::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthFailure::Rejected(format!(
                "validation endpoint returned {status}"
            )));
        }

        response
            .json::<DataAddress>()
            .await
            .map_err(|e| AuthFailure::Unavailable(format!("invalid validation response: {e}")))
    }
}
