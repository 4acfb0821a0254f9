//! Deterministic table aliases.
//!
//! An alias is a pure function of what a table group reads: its kind, its
//! relation key, its canonical parameters and, for rate denominators, the
//! alias of the group it normalizes. Equal inputs always give equal
//! aliases, so grouping is idempotent and compiled statements are stable.

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::error::CompileResult;
use crate::params::Params;

/// Hex characters of the digest kept in the alias.
const ALIAS_DIGEST_LEN: usize = 16;

/// Everything that distinguishes one table group from another.
#[derive(Debug, Clone, Serialize)]
pub struct AliasKey<'a> {
    pub kind: &'a str,
    pub relation: &'a str,
    pub params: &'a Params,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<&'a str>,
}

impl<'a> AliasKey<'a> {
    pub fn new(kind: &'a str, relation: &'a str, params: &'a Params) -> Self {
        Self {
            kind,
            relation,
            params,
            anchor: None,
        }
    }

    pub fn anchored(mut self, anchor: &'a str) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// `t` followed by the first hex digits of the key's SHA-256.
    pub fn alias(&self) -> CompileResult<String> {
        let digest = compute_hash(self)?;
        Ok(format!("t{}", &digest[..ALIAS_DIGEST_LEN]))
    }
}

/// SHA-256 of the JSON serialization of `value`, as lowercase hex.
fn compute_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
