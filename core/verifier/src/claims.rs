// Copyright jwt-verifier contributors
// SPDX-License-Identifier: Apache-2.0

//! Typed, fail-safe access over a decoded claim tree.
//!
//! The payload segment of a token is parsed into a generic JSON map once,
//! and every extraction is an explicit conversion with its own error,
//! instead of a blanket cast that loses the claim name on failure.

use serde_json::{Map, Value};

use crate::errors::DecodeError;

/// The decoded payload segment of a token. Immutable once parsed and does
/// not outlive the verification call that created it.
#[derive(Debug, Clone)]
pub struct Claims {
    tree: Map<String, Value>,
}

impl Claims {
    /// Parse raw decoded bytes as a JSON object.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| DecodeError::PayloadMalformed {
                reason: e.to_string(),
            })?;

        match value {
            Value::Object(tree) => Ok(Claims { tree }),
            other => Err(DecodeError::PayloadMalformed {
                reason: format!("expected a JSON object, found {}", json_type_name(&other)),
            }),
        }
    }

    /// Raw access to a claim value, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.tree.get(name)
    }

    /// Extract a string claim. Absent or JSON null yields `None`; any other
    /// non-string value is a type mismatch.
    pub fn string(&self, name: &str) -> Result<Option<String>, DecodeError> {
        match self.tree.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(DecodeError::ClaimTypeMismatch {
                claim: name.to_string(),
                expected: "string",
            }),
        }
    }

    /// Extract a numeric claim holding seconds since the UNIX epoch.
    pub fn seconds(&self, name: &str) -> Result<Option<i64>, DecodeError> {
        match self.tree.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => {
                n.as_i64()
                    .map(Some)
                    .ok_or_else(|| DecodeError::ClaimTypeMismatch {
                        claim: name.to_string(),
                        expected: "integer seconds",
                    })
            }
            Some(_) => Err(DecodeError::ClaimTypeMismatch {
                claim: name.to_string(),
                expected: "integer seconds",
            }),
        }
    }

    /// Extract a list-of-strings claim.
    ///
    /// Absent or JSON null yields an empty list. A single string value is
    /// treated as a one-element list, matching what identity providers emit
    /// for single-group memberships. Null entries inside an array are
    /// skipped; any other non-string entry is a type mismatch.
    pub fn string_list(&self, name: &str) -> Result<Vec<String>, DecodeError> {
        match self.tree.get(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) if !s.is_empty() => Ok(vec![s.clone()]),
            Some(Value::String(_)) => Ok(Vec::new()),
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => out.push(s.clone()),
                        Value::Null => {}
                        _ => {
                            return Err(DecodeError::ClaimTypeMismatch {
                                claim: name.to_string(),
                                expected: "array of strings",
                            });
                        }
                    }
                }
                Ok(out)
            }
            Some(_) => Err(DecodeError::ClaimTypeMismatch {
                claim: name.to_string(),
                expected: "array of strings",
            }),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
