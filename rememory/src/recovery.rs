// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! Drives the recover path: parse shares (possibly whole READMEs), combine,
//! decrypt the manifest, extract.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::encodings::{compact, long};
use crate::error::{Context, Error, Result};
use crate::passphrase;
use crate::share::{Share, ShareVersion};

/// Parse a share from whatever form a holder handed over: a bare long
/// block, a full README containing one, or a compact string.
pub fn parse_any(text: &str) -> Result<Share> {
    if text.contains("BEGIN REMEMORY SHARE") {
        long::parse(text)
    } else {
        compact::parse(text.trim())
    }
}

/// Validate a set of parsed shares against each other: no duplicate
/// indices, consistent `(version, total, threshold)`, and at least
/// `threshold` of them.
fn validate_set(shares: &[Share]) -> Result<()> {
    let first = shares
        .first()
        .ok_or_else(|| Error::InsufficientShares { needed: 1, have: 0 })?;

    let mut seen_indices = std::collections::HashSet::new();
    for share in shares {
        if !share.verify_checksum() {
            return Err(Error::InvalidShare(format!(
                "share at index {} failed its checksum",
                share.index
            )));
        }
        if !seen_indices.insert(share.index) {
            return Err(Error::InvalidShare(format!(
                "duplicate share index {}",
                share.index
            )));
        }
        if share.version != first.version || share.total != first.total || share.threshold != first.threshold
        {
            return Err(Error::InvalidShare(
                "shares disagree on version, total, or threshold".into(),
            ));
        }
    }

    if shares.len() < first.threshold as usize {
        return Err(Error::InsufficientShares {
            needed: first.threshold as usize,
            have: shares.len(),
        });
    }

    Ok(())
}

/// Combine a validated set of shares and recover the passphrase text.
pub fn recover_passphrase_text(shares: &[Share]) -> Result<String> {
    validate_set(shares)?;
    let version = shares[0].version;
    let buffers: Vec<Vec<u8>> = shares.iter().map(|s| s.data.clone()).collect();
    let raw = sharing::combine(&buffers)?;
    passphrase::recover_passphrase(&raw, version)
}

/// Where a holder's copy of the encrypted manifest comes from: a loose
/// `MANIFEST.age` buffer, or a recovery asset (`recover.html`) with the
/// manifest embedded in it instead.
pub enum ManifestSource<'a> {
    Ciphertext(&'a [u8]),
    RecoveryAsset(&'a [u8]),
}

impl<'a> ManifestSource<'a> {
    fn into_ciphertext(self) -> Result<Vec<u8>> {
        match self {
            ManifestSource::Ciphertext(bytes) => Ok(bytes.to_vec()),
            ManifestSource::RecoveryAsset(html) => crate::verifier::extract_embedded_manifest(html)
                .ok_or(Error::ManifestMissing),
        }
    }
}

/// Decrypt the manifest under the shares' recovered passphrase and
/// extract it under `destination_root`, in a fresh timestamped
/// subdirectory. Returns the path extraction landed in and any archive
/// warnings (skipped symlinks, etc).
pub fn recover_to_directory(
    shares: &[Share],
    manifest: ManifestSource<'_>,
    destination_root: &Path,
) -> Result<(PathBuf, Vec<String>)> {
    let passphrase_text = recover_passphrase_text(shares)?;
    let manifest_ciphertext = manifest.into_ciphertext()?;

    let plaintext = crypto::decrypt_bytes(&manifest_ciphertext, &passphrase_text)
        .map_err(Error::from)
        .context("decrypting recovered manifest")?;

    let dest = destination_root.join(format!("rememory-recovered-{}", Utc::now().format("%Y%m%dT%H%M%SZ")));
    std::fs::create_dir_all(&dest).map_err(Error::from).context("creating recovery destination directory")?;

    let (root, warnings) = archive::extract(
        Cursor::new(plaintext),
        &dest,
        archive::Limits::default(),
        archive::PathPolicy::CleanedDescendant,
    )
    .map_err(Error::from)
    .context("extracting recovered manifest")?;

    Ok((root, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn share_with(version: ShareVersion, index: u8, total: u8, threshold: u8, data: Vec<u8>) -> Share {
        Share::new(
            version,
            index,
            total,
            threshold,
            format!("Holder{index}"),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            data,
        )
        .unwrap()
    }

    fn split_into_shares(secret: &[u8], n: u8, k: u8) -> Vec<Share> {
        sharing::split(secret, n, k)
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(i, data)| share_with(ShareVersion::V2, (i + 1) as u8, n, k, data))
            .collect()
    }

    #[test]
    fn any_threshold_subset_recovers_the_passphrase() {
        let raw = b"this_is_a_test_passphrase_v2_gld".to_vec();
        let shares = split_into_shares(&raw, 5, 3);
        let subset = vec![shares[0].clone(), shares[2].clone(), shares[4].clone()];
        let text = recover_passphrase_text(&subset).unwrap();
        assert_eq!(text, "dGhpc19pc19hX3Rlc3RfcGFzc3BocmFzZV92Ml9nbGQ");
    }

    #[test]
    fn fewer_than_threshold_is_rejected_before_combining() {
        let raw = b"this_is_a_test_passphrase_v2_gld".to_vec();
        let shares = split_into_shares(&raw, 5, 3);
        let subset = vec![shares[0].clone(), shares[1].clone()];
        let err = recover_passphrase_text(&subset).unwrap_err();
        assert!(matches!(err, Error::InsufficientShares { .. }));
    }

    #[test]
    fn duplicate_indices_are_rejected() {
        let raw = b"this_is_a_test_passphrase_v2_gld".to_vec();
        let shares = split_into_shares(&raw, 5, 3);
        let subset = vec![shares[0].clone(), shares[0].clone(), shares[2].clone()];
        assert!(recover_passphrase_text(&subset).is_err());
    }

    #[test]
    fn inconsistent_threshold_across_shares_is_rejected() {
        let raw = b"this_is_a_test_passphrase_v2_gld".to_vec();
        let mut shares = split_into_shares(&raw, 5, 3);
        shares[1] = share_with(ShareVersion::V2, 2, 5, 4, shares[1].data.clone());
        let subset = vec![shares[0].clone(), shares[1].clone(), shares[2].clone()];
        assert!(recover_passphrase_text(&subset).is_err());
    }

    #[test]
    fn parse_any_recognises_a_bare_long_block() {
        let share = share_with(ShareVersion::V2, 1, 5, 3, vec![1, 2, 3]);
        let text = long::encode(&share);
        let parsed = parse_any(&text).unwrap();
        assert_eq!(parsed, share);
    }

    #[test]
    fn recovers_to_a_directory_from_a_loose_ciphertext() {
        let (_tmp, manifest_dir) = test_support::fresh::manifest_tree();
        let (archive_bytes, _warnings) = archive::build(&manifest_dir).unwrap();
        let generated = crate::passphrase::generate(crate::passphrase::DEFAULT_LEN).unwrap();
        let mut ciphertext = Vec::new();
        crypto::encrypt(&mut ciphertext, &mut Cursor::new(&archive_bytes), &generated.text).unwrap();

        let shares: Vec<Share> = sharing::split(&generated.raw, 5, 3)
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(i, data)| share_with(ShareVersion::V2, (i + 1) as u8, 5, 3, data))
            .collect();
        let subset = vec![shares[0].clone(), shares[1].clone(), shares[4].clone()];

        let destination = tempfile::tempdir().unwrap();
        let (root, _warnings) =
            recover_to_directory(&subset, ManifestSource::Ciphertext(&ciphertext), destination.path()).unwrap();

        assert_eq!(std::fs::read_to_string(root.join("secrets.txt")).unwrap(), "hunter2");
    }

    #[test]
    fn recovers_to_a_directory_from_an_embedded_recovery_asset() {
        let (_tmp, manifest_dir) = test_support::fresh::manifest_tree();
        let (archive_bytes, _warnings) = archive::build(&manifest_dir).unwrap();
        let generated = crate::passphrase::generate(crate::passphrase::DEFAULT_LEN).unwrap();
        let mut ciphertext = Vec::new();
        crypto::encrypt(&mut ciphertext, &mut Cursor::new(&archive_bytes), &generated.text).unwrap();

        let shares: Vec<Share> = sharing::split(&generated.raw, 5, 3)
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(i, data)| share_with(ShareVersion::V2, (i + 1) as u8, 5, 3, data))
            .collect();
        let subset = vec![shares[0].clone(), shares[2].clone(), shares[3].clone()];

        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;
        let html = format!(
            "<html><script>var p = {{\"holder\":\"Alice\",\"manifest_base64\":\"{}\"}};</script></html>",
            STANDARD.encode(&ciphertext)
        );

        let destination = tempfile::tempdir().unwrap();
        let (root, _warnings) = recover_to_directory(
            &subset,
            ManifestSource::RecoveryAsset(html.as_bytes()),
            destination.path(),
        )
        .unwrap();

        assert_eq!(std::fs::read_to_string(root.join("notes.md")).unwrap(), "hi");
    }
}
