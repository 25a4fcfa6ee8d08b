// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! The `Share` value: one holder's piece of a split passphrase.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// Which passphrase materialisation a share was split under.
///
/// v1 shares split the UTF-8 bytes of the passphrase's base64 text; v2
/// shares split the raw passphrase bytes directly. The two differ only at
/// the [`crate::passphrase::recover_passphrase`] boundary - `combine` does
/// not care which version it is reconstructing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShareVersion {
    V1,
    V2,
}

impl ShareVersion {
    pub fn as_u8(self) -> u8 {
        match self {
            ShareVersion::V1 => 1,
            ShareVersion::V2 => 2,
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(ShareVersion::V1),
            2 => Some(ShareVersion::V2),
            _ => None,
        }
    }
}

impl std::fmt::Display for ShareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// One holder's share of a split passphrase.
///
/// Created once at seal time and never mutated afterwards; each `Share` is
/// serialised into exactly one [`crate::bundle::Bundle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    pub version: ShareVersion,
    pub index: u8,
    pub total: u8,
    pub threshold: u8,
    pub holder: String,
    pub created: DateTime<Utc>,
    pub data: Vec<u8>,
    pub checksum: String,
}

impl Share {
    /// Build a share, computing its checksum and validating the data-model
    /// invariants: `1 <= index <= total` and `2 <= threshold <= total`.
    pub fn new(
        version: ShareVersion,
        index: u8,
        total: u8,
        threshold: u8,
        holder: String,
        created: DateTime<Utc>,
        data: Vec<u8>,
    ) -> Result<Self> {
        if index < 1 || index > total {
            return Err(Error::InvalidShare(format!(
                "index {index} is out of range 1..={total}"
            )));
        }
        if threshold < 2 || threshold > total {
            return Err(Error::InvalidShare(format!(
                "threshold {threshold} must be between 2 and total {total}"
            )));
        }
        let checksum = primitives::hash(&data);
        Ok(Self {
            version,
            index,
            total,
            threshold,
            holder,
            created,
            data,
            checksum,
        })
    }

    /// Recompute the checksum of `data` and compare it to `checksum` in
    /// constant time.
    pub fn verify_checksum(&self) -> bool {
        let expected = primitives::hash(&self.data);
        primitives::hash_eq(&expected, &self.checksum)
    }

    /// The share index clamped into the 4-bit field used by the BIP39
    /// 25th word: a real index in `1..=15`, or the sentinel `0` once the
    /// index exceeds what four bits can carry.
    pub fn clamped_index(&self) -> u8 {
        if self.index <= 15 {
            self.index
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share(index: u8, total: u8, threshold: u8) -> Result<Share> {
        Share::new(
            ShareVersion::V2,
            index,
            total,
            threshold,
            "Alice".into(),
            Utc::now(),
            vec![1, 2, 3, 4],
        )
    }

    #[test]
    fn checksum_is_computed_and_verifies() {
        let s = share(1, 5, 3).unwrap();
        assert_eq!(s.checksum, primitives::hash(&s.data));
        assert!(s.verify_checksum());
    }

    #[test]
    fn tampering_with_data_breaks_verification() {
        let mut s = share(1, 5, 3).unwrap();
        test_support::corrupt(&mut s.data);
        assert!(!s.verify_checksum());
    }

    #[test]
    fn rejects_index_out_of_range() {
        assert!(share(0, 5, 3).is_err());
        assert!(share(6, 5, 3).is_err());
    }

    #[test]
    fn rejects_bad_threshold() {
        assert!(share(1, 5, 1).is_err());
        assert!(share(1, 5, 6).is_err());
    }

    #[test]
    fn clamped_index_sentinels_above_fifteen() {
        let low = share(7, 100, 3).unwrap();
        assert_eq!(low.clamped_index(), 7);
        let high = share(100, 150, 3).unwrap();
        assert_eq!(high.clamped_index(), 0);
    }
}
