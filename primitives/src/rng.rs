// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

use rand_core::{OsRng, RngCore};

/// Fill and return `len` bytes from the operating system's CSPRNG.
///
/// Every random quantity in the workspace - passphrase bytes, Shamir
/// polynomial coefficients, AGE nonces, CSP nonces - is drawn from this one
/// function so there is exactly one place that talks to the OS RNG.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    OsRng.fill_bytes(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_bytes_has_requested_length() {
        assert_eq!(random_bytes(32).len(), 32);
        assert_eq!(random_bytes(0).len(), 0);
    }

    #[test]
    fn random_bytes_is_not_constant() {
        let a = random_bytes(32);
        let b = random_bytes(32);
        assert_ne!(a, b);
    }
}
