// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! The passphrase that gates the encrypted manifest, and its two textual
//! materialisations (v1 and v2 shares, see [`crate::share::ShareVersion`]).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{Error, Result};
use crate::share::ShareVersion;

/// Default passphrase length in bytes; produces a 43-character base64url
/// text form and, under v2, 33-byte shares that pack exactly into 24 BIP39
/// words plus a 25th metadata word.
pub const DEFAULT_LEN: usize = 32;

/// Minimum passphrase length this crate will generate.
pub const MIN_LEN: usize = 16;

/// A freshly generated passphrase: the raw bytes and their base64url text.
pub struct Passphrase {
    pub raw: Vec<u8>,
    pub text: String,
}

/// Generate an `n_bytes`-long passphrase from the OS CSPRNG.
pub fn generate(n_bytes: usize) -> Result<Passphrase> {
    if n_bytes < MIN_LEN {
        return Err(Error::InvalidParams(format!(
            "passphrase must be at least {MIN_LEN} bytes, got {n_bytes}"
        )));
    }
    let raw = primitives::random_bytes(n_bytes);
    let text = URL_SAFE_NO_PAD.encode(&raw);
    Ok(Passphrase { raw, text })
}

/// Render the reconstructed passphrase `bytes` the way the AGE encryptor
/// expects it: the base64url text form under v2, or the raw bytes
/// reinterpreted as UTF-8 under v1 (the legacy scheme split the text
/// form's own bytes, so recovering it is a pass-through).
pub fn recover_passphrase(bytes: &[u8], version: ShareVersion) -> Result<String> {
    match version {
        ShareVersion::V2 => Ok(URL_SAFE_NO_PAD.encode(bytes)),
        ShareVersion::V1 => String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::InvalidShare(format!("v1 passphrase bytes were not UTF-8: {e}"))),
    }
}
