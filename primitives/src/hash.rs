// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Prefix every digest carries so that a checksum string is self-describing.
pub const PREFIX: &str = "sha256:";

/// Length in bytes of a raw SHA-256 digest.
pub const HASH_LEN: usize = 32;

/// A `sha256:`-prefixed digest, rendered as lowercase hex.
///
/// This is the only hash type the workspace produces; every `checksum`
/// field on a `Share`, a bundle member, or a README footer is one of these
/// rendered to a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Hash `data` and wrap the result.
    pub fn of(data: &[u8]) -> Self {
        Self(hash(data))
    }

    /// Parse a previously rendered `sha256:...` string without recomputing it.
    pub fn parse(s: &str) -> Option<Self> {
        let hex_part = s.strip_prefix(PREFIX)?;
        if hex_part.len() == HASH_LEN * 2 && hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash `data` and return it as `sha256:` followed by 64 lowercase hex digits.
pub fn hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    format!("{PREFIX}{}", hex::encode(digest))
}

/// Compare two previously rendered hash strings in constant time.
///
/// Both inputs must already be `sha256:`-prefixed hex strings; this never
/// truncates or normalises them, it only avoids leaking a timing signal
/// proportional to the position of the first differing byte.
pub fn hash_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
