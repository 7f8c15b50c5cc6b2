// Copyright jwt-verifier contributors
// SPDX-License-Identifier: Apache-2.0

//! Local verification of identity-provider access tokens (JWTs): structural
//! decoding, kid-based key resolution, signature validation, expiry
//! enforcement, and identity-claim extraction, backed by an optional remote
//! key-provisioning subsystem with bounded exponential-backoff retry.

pub mod backoff;
pub mod builder;
pub mod claims;
pub mod errors;
pub mod keys;
pub mod provider;
pub mod token;
pub mod verifier;

pub use backoff::BackoffConfig;
pub use builder::JwtVerifierBuilder;
pub use errors::VerifierError;
pub use verifier::{JwtVerifier, MissingExpPolicy, UserIdentity, VerifierOptions};
