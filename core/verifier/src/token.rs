// Copyright jwt-verifier contributors
// SPDX-License-Identifier: Apache-2.0

//! Token decoding: segment split, base64url decode, header/claims parse.
//!
//! Decoding is a pure function of the input string. Nothing here touches
//! key material or the signature bytes; the still-encoded signature and
//! the signing input are carried along for the verification stage.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use crate::claims::Claims;
use crate::errors::DecodeError;

/// The decoded first segment of a token.
#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    /// Algorithm name declared by the token. Attacker-controlled; the
    /// verification stage decides whether it may be honored.
    pub alg: String,

    #[serde(default)]
    pub typ: Option<String>,

    #[serde(default)]
    pub cty: Option<String>,

    /// Key identifier selecting the verification key.
    #[serde(default)]
    pub kid: Option<String>,
}

/// A structurally valid token, decoded but not yet verified.
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub header: Header,
    pub claims: Claims,
    signing_input: String,
    signature: String,
}

impl DecodedToken {
    /// The `header.payload` byte string the signature covers.
    pub fn signing_input(&self) -> &str {
        &self.signing_input
    }

    /// The third segment, still base64url-encoded.
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

/// Decode a raw token into its header and claim set.
pub fn decode(token: &str) -> Result<DecodedToken, DecodeError> {
    if token.is_empty() {
        return Err(DecodeError::TokenInvalid);
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::FormatInvalid {
            segments: segments.len(),
        });
    }

    let header_bytes = URL_SAFE_NO_PAD.decode(segments[0])?;
    let payload_bytes = URL_SAFE_NO_PAD.decode(segments[1])?;

    let header: Header =
        serde_json::from_slice(&header_bytes).map_err(|e| DecodeError::PayloadMalformed {
            reason: e.to_string(),
        })?;
    let claims = Claims::from_slice(&payload_bytes)?;

    Ok(DecodedToken {
        header,
        claims,
        signing_input: format!("{}.{}", segments[0], segments[1]),
        signature: segments[2].to_string(),
    })
}
