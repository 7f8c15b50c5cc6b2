// Copyright jwt-verifier contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for token verification.
//!
//! Each pipeline stage fails with its own closed kind so callers can match
//! on machine-checkable variants instead of message substrings. Verification
//! failures are terminal; only the remote key fetch path ever retries.

use thiserror::Error;

/// Invalid construction-time input.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("public signing keys are required")]
    KeysRequired,

    #[error("failed to decode signing key '{kid}': {reason}")]
    KeyDecodeFailed { kid: String, reason: String },

    #[error("token argument is null or empty")]
    ArgumentInvalid,

    #[error("invalid key endpoint URL: {0}")]
    EndpointInvalid(#[from] url::ParseError),

    #[error("a remote key endpoint is configured; keys must be fetched with build_remote()")]
    RemoteKeysNotFetched,
}

/// Malformed token structure or unusable token contents.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("JWT format not valid")]
    TokenInvalid,

    #[error("JWT must have exactly 3 dot-separated segments, found {segments}")]
    FormatInvalid { segments: usize },

    #[error("JWT segment is not valid base64url: {0}")]
    Base64Invalid(#[from] base64::DecodeError),

    #[error("JWT segment is not a JSON object: {reason}")]
    PayloadMalformed { reason: String },

    #[error("no signing key found matching 'kid'")]
    KeyNotFound,

    #[error("JWT payload '{claim}' claim not found")]
    MissingClaim { claim: String },

    #[error("JWT payload '{claim}' claim is not of type {expected}")]
    ClaimTypeMismatch {
        claim: String,
        expected: &'static str,
    },
}

/// Cryptographic verification failure.
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("JWT algorithm '{alg}' is not supported")]
    AlgorithmUnsupported { alg: String },

    #[error("JWT algorithm {alg} cannot be used with the configured {family} key")]
    KeyTypeMismatch {
        alg: &'static str,
        family: &'static str,
    },

    #[error("JWT signature verification failed")]
    SignatureInvalid,
}

/// Token past expiry, or expiry not checkable.
#[derive(Error, Debug)]
pub enum ExpiredError {
    #[error("JWT token has expired")]
    TokenExpired,

    #[error("JWT payload has no 'exp' claim; expiry cannot be verified")]
    ExpiryUnverifiable,
}

/// Remote signing-key retrieval failure, surfaced after the retry budget
/// is exhausted. A fetch never yields a partially usable key set.
#[derive(Error, Debug)]
pub enum KeyFetchError {
    #[error("key endpoint returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("no signing keys found in the key endpoint response")]
    NoKeysFound,

    #[error("key endpoint request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to read key endpoint response: {source}")]
    BodyRead { source: reqwest::Error },

    #[error("failed to parse key endpoint response: {source}")]
    BadKeyDocument { source: serde_json::Error },
}

/// Top-level error returned by the verification pipeline.
#[derive(Error, Debug)]
pub enum VerifierError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("verification error: {0}")]
    Verification(#[from] VerificationError),

    #[error("expiry error: {0}")]
    Expired(#[from] ExpiredError),

    #[error("key fetch error: {0}")]
    KeyFetch(#[from] KeyFetchError),
}
