// Copyright jwt-verifier contributors
// SPDX-License-Identifier: Apache-2.0

//! Builder for verifier construction.
//!
//! Three interchangeable key-provisioning strategies feed the same
//! verifier: symmetric secrets, a static map of base64/DER public keys, or
//! a remote identity endpoint fetched once (with retry) at build time. The
//! orchestrator never learns which strategy produced its key set.

use std::collections::HashMap;

use crate::backoff::BackoffConfig;
use crate::errors::{ConfigError, VerifierError};
use crate::keys::SigningKeySet;
use crate::provider::{HttpKeyProvider, KeyProvider};
use crate::verifier::{JwtVerifier, MissingExpPolicy, VerifierOptions};

enum KeySource {
    Unset,
    Secrets(HashMap<String, Vec<u8>>),
    PublicKeys(HashMap<String, String>),
    Remote(String),
}

/// Fluent configuration for a [`JwtVerifier`].
pub struct JwtVerifierBuilder {
    source: KeySource,
    backoff: BackoffConfig,
    options: VerifierOptions,
}

impl Default for JwtVerifierBuilder {
    fn default() -> Self {
        JwtVerifierBuilder {
            source: KeySource::Unset,
            backoff: BackoffConfig::default(),
            options: VerifierOptions::default(),
        }
    }
}

impl JwtVerifierBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a static map of `kid -> symmetric secret`.
    pub fn secret_keys(mut self, secrets: HashMap<String, Vec<u8>>) -> Self {
        self.source = KeySource::Secrets(secrets);
        self
    }

    /// Use a static map of `kid -> base64-encoded DER public key`.
    pub fn public_keys(mut self, keys: HashMap<String, String>) -> Self {
        self.source = KeySource::PublicKeys(keys);
        self
    }

    /// Fetch the key map from an identity API endpoint at build time.
    pub fn remote_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.source = KeySource::Remote(endpoint.into());
        self
    }

    /// Retry parameters for the remote fetch.
    pub fn backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace all policy options at once.
    pub fn options(mut self, options: VerifierOptions) -> Self {
        self.options = options;
        self
    }

    pub fn require_user_id(mut self, required: bool) -> Self {
        self.options.require_user_id = required;
        self
    }

    pub fn missing_exp_policy(mut self, policy: MissingExpPolicy) -> Self {
        self.options.missing_exp = policy;
        self
    }

    pub fn username_claim(mut self, claim: impl Into<String>) -> Self {
        self.options.username_claim = claim.into();
        self
    }

    pub fn user_id_claim(mut self, claim: impl Into<String>) -> Self {
        self.options.user_id_claim = claim.into();
        self
    }

    pub fn groups_claim(mut self, claim: impl Into<String>) -> Self {
        self.options.groups_claim = claim.into();
        self
    }

    /// Build from a static key strategy. Fails if no keys were configured
    /// or if a remote endpoint was chosen (remote keys must be fetched).
    pub fn build(self) -> Result<JwtVerifier, VerifierError> {
        let keys = match self.source {
            KeySource::Secrets(secrets) => SigningKeySet::from_secrets(&secrets)?,
            KeySource::PublicKeys(keys) => SigningKeySet::from_base64_der(&keys)?,
            KeySource::Remote(_) => return Err(ConfigError::RemoteKeysNotFetched.into()),
            KeySource::Unset => return Err(ConfigError::KeysRequired.into()),
        };

        Ok(JwtVerifier::with_options(keys, self.options))
    }

    /// Build by fetching the key map from the configured remote endpoint.
    /// Blocks (asynchronously) on the first successful fetch, or surfaces
    /// the provider's error once the retry budget is exhausted.
    pub async fn build_remote(self) -> Result<JwtVerifier, VerifierError> {
        match self.source {
            KeySource::Remote(endpoint) => {
                let provider = HttpKeyProvider::new(&endpoint, self.backoff)?;
                let fetched = provider.fetch_keys().await?;
                let keys = SigningKeySet::from_base64_der(&fetched)?;
                Ok(JwtVerifier::with_options(keys, self.options))
            }
            source => {
                // Static strategies do not need the fetch step.
                JwtVerifierBuilder {
                    source,
                    backoff: self.backoff,
                    options: self.options,
                }
                .build()
            }
        }
    }

    /// Build from a caller-supplied provider, for custom transports.
    pub async fn build_with_provider(
        self,
        provider: &dyn KeyProvider,
    ) -> Result<JwtVerifier, VerifierError> {
        let fetched = provider.fetch_keys().await?;
        let keys = SigningKeySet::from_base64_der(&fetched)?;
        Ok(JwtVerifier::with_options(keys, self.options))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    use super::*;
    use crate::errors::KeyFetchError;

    #[test]
    fn test_build_requires_a_key_strategy() {
        assert!(matches!(
            JwtVerifierBuilder::new().build().unwrap_err(),
            VerifierError::Config(ConfigError::KeysRequired)
        ));
    }

    #[test]
    fn test_build_rejects_unfetched_remote_source() {
        let err = JwtVerifierBuilder::new()
            .remote_endpoint("http://localhost/keys")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            VerifierError::Config(ConfigError::RemoteKeysNotFetched)
        ));
    }

    #[test]
    fn test_build_with_secrets_and_options() {
        let mut secrets = HashMap::new();
        secrets.insert("key-1".to_string(), b"secret".to_vec());

        let verifier = JwtVerifierBuilder::new()
            .secret_keys(secrets)
            .require_user_id(false)
            .groups_claim("roles")
            .build()
            .unwrap();

        assert!(!verifier.options().require_user_id);
        assert_eq!(verifier.options().groups_claim, "roles");
        assert_eq!(verifier.options().username_claim, "username");
    }

    struct FixedProvider(HashMap<String, String>);

    #[async_trait]
    impl KeyProvider for FixedProvider {
        async fn fetch_keys(&self) -> Result<HashMap<String, String>, KeyFetchError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_build_with_custom_provider() {
        let mut keys = HashMap::new();
        keys.insert("key-1".to_string(), STANDARD.encode([0x30, 0x0d, 0x06, 0x09]));

        let verifier = JwtVerifierBuilder::new()
            .build_with_provider(&FixedProvider(keys))
            .await
            .unwrap();
        assert!(verifier.options().require_user_id);
    }

    #[tokio::test]
    async fn test_provider_keys_still_validated_at_build() {
        let mut keys = HashMap::new();
        keys.insert("key-1".to_string(), "***".to_string());

        let err = JwtVerifierBuilder::new()
            .build_with_provider(&FixedProvider(keys))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerifierError::Config(ConfigError::KeyDecodeFailed { .. })
        ));
    }
}
