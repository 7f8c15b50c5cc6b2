// Copyright jwt-verifier contributors
// SPDX-License-Identifier: Apache-2.0

//! The verification pipeline.
//!
//! [`JwtVerifier::verify`] runs a strictly ordered, fail-fast sequence:
//! argument check, structural decode, key resolution by kid, signature
//! verification, expiry enforcement, identity-claim extraction. A failure
//! at any stage halts the pipeline; an identity result is only ever built
//! after the signature and expiry checks have both passed.
//!
//! A verifier is immutable after construction and safe to share across
//! tasks; `verify` takes `&self` and holds no per-call state.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken_aws_lc::Algorithm;
use serde::Deserialize;

use crate::errors::{ConfigError, DecodeError, ExpiredError, VerificationError, VerifierError};
use crate::keys::{ResolveKey, SigningKeySet};
use crate::token;

/// User details extracted from a fully verified token. Immutable; `groups`
/// is always present, an absent claim maps to an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: Option<String>,
    pub email: String,
    pub groups: Vec<String>,
}

/// What to do when a token carries no `exp` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingExpPolicy {
    /// Report the distinct "expiry cannot be verified" kind (default).
    Unverifiable,
    /// Treat a missing claim like an expired token.
    Expired,
}

/// Policy knobs for the verification pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VerifierOptions {
    /// Whether a user-id claim is mandatory in addition to the username.
    pub require_user_id: bool,

    pub missing_exp: MissingExpPolicy,

    /// Claim holding the username / email address.
    pub username_claim: String,

    /// Claim holding the user id.
    pub user_id_claim: String,

    /// Claim holding group memberships.
    pub groups_claim: String,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        VerifierOptions {
            require_user_id: true,
            missing_exp: MissingExpPolicy::Unverifiable,
            username_claim: "username".to_string(),
            user_id_claim: "sub".to_string(),
            groups_claim: "cognito:groups".to_string(),
        }
    }
}

/// Decodes and verifies access tokens against a resolved key set.
#[derive(Debug, Clone)]
pub struct JwtVerifier<R = SigningKeySet> {
    keys: R,
    options: VerifierOptions,
}

impl<R: ResolveKey> JwtVerifier<R> {
    pub fn new(keys: R) -> Self {
        Self::with_options(keys, VerifierOptions::default())
    }

    pub fn with_options(keys: R, options: VerifierOptions) -> Self {
        JwtVerifier { keys, options }
    }

    pub fn options(&self) -> &VerifierOptions {
        &self.options
    }

    /// Decode and verify `token`, returning the user details it asserts.
    pub fn verify(&self, token: &str) -> Result<UserIdentity, VerifierError> {
        self.verify_at(token, epoch_seconds_now())
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<UserIdentity, VerifierError> {
        if token.is_empty() {
            return Err(ConfigError::ArgumentInvalid.into());
        }

        let decoded = token::decode(token)?;

        let key = self.keys.resolve(decoded.header.kid.as_deref())?;

        let alg: Algorithm = decoded.header.alg.parse().map_err(|_| {
            VerificationError::AlgorithmUnsupported {
                alg: decoded.header.alg.clone(),
            }
        })?;

        key.verify(alg, decoded.signing_input(), decoded.signature())?;

        // Strict less-than: a token expiring exactly now is still valid.
        match decoded.claims.seconds("exp")? {
            Some(exp) if exp < now => return Err(ExpiredError::TokenExpired.into()),
            Some(_) => {}
            None => {
                return Err(match self.options.missing_exp {
                    MissingExpPolicy::Unverifiable => ExpiredError::ExpiryUnverifiable,
                    MissingExpPolicy::Expired => ExpiredError::TokenExpired,
                }
                .into());
            }
        }

        let email = decoded
            .claims
            .string(&self.options.username_claim)?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DecodeError::MissingClaim {
                claim: self.options.username_claim.clone(),
            })?;

        let id = decoded
            .claims
            .string(&self.options.user_id_claim)?
            .filter(|s| !s.is_empty());
        if self.options.require_user_id && id.is_none() {
            return Err(DecodeError::MissingClaim {
                claim: self.options.user_id_claim.clone(),
            }
            .into());
        }

        let groups = decoded.claims.string_list(&self.options.groups_claim)?;

        Ok(UserIdentity { id, email, groups })
    }
}

fn epoch_seconds_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs() as i64
}
