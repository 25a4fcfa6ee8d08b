// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! Passphrase-authenticated symmetric encryption of the manifest archive.
//!
//! Wraps the AGE v1 container format (scrypt recipient) behind a small
//! stream-in/stream-out interface. The work factor is whatever the `age`
//! crate's passphrase encryptor chooses by default; this crate does not
//! second-guess it.

use std::io::{Read, Write};

use age::secrecy::Secret;
use thiserror::Error as DeriveError;

#[derive(DeriveError, Debug)]
pub enum Error {
    #[error("decryption failed: wrong passphrase or corrupted archive")]
    AuthenticationFailed,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed AGE container: {0}")]
    Format(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Encrypt everything read from `src` under `passphrase`, writing the AGE
/// container to `dst`.
pub fn encrypt<R: Read, W: Write>(dst: &mut W, src: &mut R, passphrase: &str) -> Result<()> {
    let encryptor = age::Encryptor::with_user_passphrase(Secret::new(passphrase.to_owned()));
    let mut writer = encryptor
        .wrap_output(dst)
        .map_err(|e| Error::Format(e.to_string()))?;
    std::io::copy(src, &mut writer)?;
    writer.finish()?;
    Ok(())
}

/// Decrypt an AGE container read from `src` under `passphrase`, writing the
/// recovered plaintext to `dst`.
///
/// The entire plaintext is reconstructed in memory before anything is
/// written to `dst`, so a tampered container or wrong passphrase never
/// leaves a partial file behind.
pub fn decrypt<R: Read, W: Write>(dst: &mut W, src: &mut R, passphrase: &str) -> Result<()> {
    let plaintext = decrypt_to_vec(src, passphrase)?;
    dst.write_all(&plaintext)?;
    Ok(())
}

/// Decrypt an in-memory AGE container and return the plaintext buffer.
pub fn decrypt_bytes(ciphertext: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    decrypt_to_vec(&mut &ciphertext[..], passphrase)
}

fn decrypt_to_vec<R: Read>(src: &mut R, passphrase: &str) -> Result<Vec<u8>> {
    let decryptor = match age::Decryptor::new(src).map_err(|e| Error::Format(e.to_string()))? {
        age::Decryptor::Passphrase(d) => d,
        age::Decryptor::Recipients(_) => {
            return Err(Error::Format(
                "container uses recipient keys, expected a passphrase recipient".into(),
            ))
        }
    };

    let mut reader = decryptor
        .decrypt(&Secret::new(passphrase.to_owned()), None)
        .map_err(|_| Error::AuthenticationFailed)?;

    let mut plaintext = Vec::new();
    reader
        .read_to_end(&mut plaintext)
        .map_err(|_| Error::AuthenticationFailed)?;
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_plaintext() {
        let plaintext = b"hunter2 and some notes about the vault".to_vec();
        let mut ciphertext = Vec::new();
        encrypt(&mut ciphertext, &mut &plaintext[..], "correct horse battery staple").unwrap();

        let mut recovered = Vec::new();
        decrypt(&mut recovered, &mut &ciphertext[..], "correct horse battery staple").unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn wrong_passphrase_is_rejected() {
        let plaintext = b"top secret".to_vec();
        let mut ciphertext = Vec::new();
        encrypt(&mut ciphertext, &mut &plaintext[..], "right passphrase").unwrap();

        let err = decrypt_bytes(&ciphertext, "wrong passphrase").unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed));
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let plaintext = b"top secret archive bytes".to_vec();
        let mut ciphertext = Vec::new();
        encrypt(&mut ciphertext, &mut &plaintext[..], "passphrase").unwrap();

        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xFF;

        let err = decrypt_bytes(&ciphertext, "passphrase").unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed));
    }

    #[test]
    fn decrypt_bytes_is_a_buffering_convenience() {
        let plaintext = b"abc".to_vec();
        let mut ciphertext = Vec::new();
        encrypt(&mut ciphertext, &mut &plaintext[..], "pw").unwrap();
        assert_eq!(decrypt_bytes(&ciphertext, "pw").unwrap(), plaintext);
    }
}
