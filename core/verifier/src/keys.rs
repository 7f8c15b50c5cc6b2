// Copyright jwt-verifier contributors
// SPDX-License-Identifier: Apache-2.0

//! Verification key material and kid-based resolution.
//!
//! A key set is built eagerly at construction: every configured entry is
//! base64-decoded and sanity-checked up front, so malformed key material
//! fails construction rather than a later verification call. After
//! construction the set is read-only and safe for concurrent lookups.
//!
//! Every key carries its [`KeyFamily`]. The family implied by the token
//! header's algorithm must match the resolved key's family before any
//! cryptographic work happens, which closes the classic algorithm-confusion
//! hole (an attacker declaring `HS256` against an RSA public key).

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken_aws_lc::{Algorithm, DecodingKey, crypto};

use crate::errors::{ConfigError, DecodeError, VerificationError};

/// The cryptographic family a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Hmac,
    Rsa,
    Ec,
    Ed,
}

impl KeyFamily {
    /// The family an algorithm name may be used with.
    pub fn for_algorithm(alg: Algorithm) -> KeyFamily {
        match alg {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => KeyFamily::Hmac,
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => KeyFamily::Rsa,
            Algorithm::ES256 | Algorithm::ES384 => KeyFamily::Ec,
            Algorithm::EdDSA => KeyFamily::Ed,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KeyFamily::Hmac => "symmetric",
            KeyFamily::Rsa => "RSA",
            KeyFamily::Ec => "ECDSA",
            KeyFamily::Ed => "EdDSA",
        }
    }
}

fn algorithm_name(alg: Algorithm) -> &'static str {
    match alg {
        Algorithm::HS256 => "HS256",
        Algorithm::HS384 => "HS384",
        Algorithm::HS512 => "HS512",
        Algorithm::RS256 => "RS256",
        Algorithm::RS384 => "RS384",
        Algorithm::RS512 => "RS512",
        Algorithm::PS256 => "PS256",
        Algorithm::PS384 => "PS384",
        Algorithm::PS512 => "PS512",
        Algorithm::ES256 => "ES256",
        Algorithm::ES384 => "ES384",
        Algorithm::EdDSA => "EdDSA",
    }
}

/// A single verification key: decoded material tagged with its family.
#[derive(Clone)]
pub struct VerificationKey {
    family: KeyFamily,
    key: DecodingKey,
}

impl VerificationKey {
    /// A symmetric secret for HS* verification.
    pub fn from_secret(secret: &[u8]) -> Self {
        VerificationKey {
            family: KeyFamily::Hmac,
            key: DecodingKey::from_secret(secret),
        }
    }

    /// An RSA public key from PKCS#1 DER bytes.
    pub fn rsa_from_der(der: &[u8]) -> Self {
        VerificationKey {
            family: KeyFamily::Rsa,
            key: DecodingKey::from_rsa_der(der),
        }
    }

    /// An ECDSA public key from DER bytes.
    pub fn ec_from_der(der: &[u8]) -> Self {
        VerificationKey {
            family: KeyFamily::Ec,
            key: DecodingKey::from_ec_der(der),
        }
    }

    /// An Ed25519 public key from DER bytes.
    pub fn ed_from_der(der: &[u8]) -> Self {
        VerificationKey {
            family: KeyFamily::Ed,
            key: DecodingKey::from_ed_der(der),
        }
    }

    pub fn family(&self) -> KeyFamily {
        self.family
    }

    /// Validate `signature_b64` over `signing_input` under `alg`.
    ///
    /// Rejects an algorithm/key family mismatch before touching the
    /// signature bytes. A signature that fails to decode or to validate is
    /// reported the same way; the caller learns nothing beyond "invalid".
    pub fn verify(
        &self,
        alg: Algorithm,
        signing_input: &str,
        signature_b64: &str,
    ) -> Result<(), VerificationError> {
        let required = KeyFamily::for_algorithm(alg);
        if required != self.family {
            return Err(VerificationError::KeyTypeMismatch {
                alg: algorithm_name(alg),
                family: self.family.name(),
            });
        }

        match crypto::verify(signature_b64, signing_input.as_bytes(), &self.key, alg) {
            Ok(true) => Ok(()),
            Ok(false) | Err(_) => Err(VerificationError::SignatureInvalid),
        }
    }
}

impl std::fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material is deliberately not printed.
        f.debug_struct("VerificationKey")
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

/// Capability seam for kid-to-key resolution. The orchestrator depends on
/// this trait, never on a concrete key-set construction strategy.
pub trait ResolveKey: Send + Sync {
    /// Exact-match lookup. Unknown or absent kid fails closed; there is no
    /// default or fallback key.
    fn resolve(&self, kid: Option<&str>) -> Result<&VerificationKey, DecodeError>;
}

/// An immutable mapping from key id to verification key material.
#[derive(Debug, Clone)]
pub struct SigningKeySet {
    keys: HashMap<String, VerificationKey>,
}

impl SigningKeySet {
    /// Build a key set from symmetric secrets.
    pub fn from_secrets<S: AsRef<[u8]>>(
        secrets: &HashMap<String, S>,
    ) -> Result<Self, ConfigError> {
        if secrets.is_empty() {
            return Err(ConfigError::KeysRequired);
        }

        let keys = secrets
            .iter()
            .map(|(kid, secret)| (kid.clone(), VerificationKey::from_secret(secret.as_ref())))
            .collect();

        Ok(SigningKeySet { keys })
    }

    /// Build a key set from base64-encoded, DER-formatted RSA public keys,
    /// the format identity providers publish for their signing keys.
    ///
    /// Every entry is decoded eagerly; one malformed entry fails the whole
    /// construction.
    pub fn from_base64_der(encoded: &HashMap<String, String>) -> Result<Self, ConfigError> {
        if encoded.is_empty() {
            return Err(ConfigError::KeysRequired);
        }

        let mut keys = HashMap::with_capacity(encoded.len());
        for (kid, value) in encoded {
            let der = STANDARD
                .decode(value)
                .map_err(|e| ConfigError::KeyDecodeFailed {
                    kid: kid.clone(),
                    reason: e.to_string(),
                })?;

            // DER-encoded key structures are ASN.1 SEQUENCEs.
            if der.first() != Some(&0x30) {
                return Err(ConfigError::KeyDecodeFailed {
                    kid: kid.clone(),
                    reason: "key material is not DER encoded".to_string(),
                });
            }

            keys.insert(kid.clone(), VerificationKey::rsa_from_der(&der));
        }

        Ok(SigningKeySet { keys })
    }

    /// Build a key set from already-constructed keys, for callers mixing
    /// key families.
    pub fn from_keys(keys: HashMap<String, VerificationKey>) -> Result<Self, ConfigError> {
        if keys.is_empty() {
            return Err(ConfigError::KeysRequired);
        }
        Ok(SigningKeySet { keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl ResolveKey for SigningKeySet {
    fn resolve(&self, kid: Option<&str>) -> Result<&VerificationKey, DecodeError> {
        kid.and_then(|kid| self.keys.get(kid))
            .ok_or(DecodeError::KeyNotFound)
    }
}
