// Copyright jwt-verifier contributors
// SPDX-License-Identifier: Apache-2.0

//! Remote signing-key provisioning.
//!
//! An identity provider publishes its signing keys as a JSON object mapping
//! key id to base64-encoded key material. [`HttpKeyProvider`] fetches that
//! document with bounded exponential-backoff retry: transport failures and
//! server-side statuses are retried, anything else fails fast. A fetch
//! either yields a usable, non-empty key map or an error — never a partial
//! result.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use tracing::debug;
use url::Url;

use crate::backoff::{BackoffConfig, retry_with_backoff};
use crate::errors::{ConfigError, KeyFetchError};

/// Capability for retrieving a signing-key map from somewhere remote.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Fetch the full `kid -> base64 DER key` map.
    async fn fetch_keys(&self) -> Result<HashMap<String, String>, KeyFetchError>;
}

/// Fetches signing keys from an identity API endpoint over HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpKeyProvider {
    client: ReqwestClient,
    endpoint: Url,
    backoff: BackoffConfig,
}

impl HttpKeyProvider {
    /// Create a provider for the given endpoint. The URL is validated here;
    /// nothing is fetched until [`KeyProvider::fetch_keys`] is called.
    pub fn new(endpoint: &str, backoff: BackoffConfig) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(endpoint)?;

        let client = ReqwestClient::builder()
            .user_agent("jwt-verifier")
            .build()
            .expect("failed to create reqwest client");

        Ok(HttpKeyProvider {
            client,
            endpoint,
            backoff,
        })
    }

    /// One GET attempt. The response body is consumed on every path, so the
    /// connection is returned to the pool regardless of outcome.
    async fn fetch_once(&self) -> Result<HashMap<String, String>, KeyFetchError> {
        let response = self.client.get(self.endpoint.clone()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(KeyFetchError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| KeyFetchError::BodyRead { source: e })?;

        let keys: HashMap<String, String> =
            serde_json::from_slice(&body).map_err(|e| KeyFetchError::BadKeyDocument { source: e })?;

        if keys.is_empty() {
            return Err(KeyFetchError::NoKeysFound);
        }

        Ok(keys)
    }
}

/// Transport failures and server-indicated transient conditions are worth
/// retrying; a well-formed but unusable answer is not.
fn is_retryable(err: &KeyFetchError) -> bool {
    match err {
        KeyFetchError::Transport(_) => true,
        KeyFetchError::BadStatus { status, .. } => *status >= 500 || *status == 429,
        KeyFetchError::NoKeysFound
        | KeyFetchError::BodyRead { .. }
        | KeyFetchError::BadKeyDocument { .. } => false,
    }
}

#[async_trait]
impl KeyProvider for HttpKeyProvider {
    async fn fetch_keys(&self) -> Result<HashMap<String, String>, KeyFetchError> {
        let keys = retry_with_backoff(&self.backoff, "fetch_signing_keys", is_retryable, || {
            self.fetch_once()
        })
        .await?;

        debug!(count = keys.len(), endpoint = %self.endpoint, "fetched signing keys");
        Ok(keys)
    }
}
