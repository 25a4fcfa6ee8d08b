// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! Walks a produced bundle end-to-end and proves it was produced by the
//! sealer: every checksum the footer claims must match the bytes actually
//! present.

use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::bundle::{classify_member, BundleMember};
use crate::encodings::long;
use crate::error::{Context, Error, Result};
use crate::readme;

const MANIFEST_KEY: &str = "\"manifest_base64\":\"";

/// The classified, decoded contents of one bundle, ready for checksum
/// comparison.
struct Members {
    readme_text: String,
    manifest_bytes: Vec<u8>,
    recover_html_bytes: Vec<u8>,
}

fn collect_members<R: Read + std::io::Seek>(reader: R) -> Result<Members> {
    let mut zip = zip::ZipArchive::new(reader)?;

    let mut readme_text: Option<String> = None;
    let mut readme_pdf_present = false;
    let mut manifest_bytes: Option<Vec<u8>> = None;
    let mut recover_html_bytes: Option<Vec<u8>> = None;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf)?;

        match classify_member(&name) {
            Some(BundleMember::ReadmeText) => {
                readme_text = Some(String::from_utf8(buf).map_err(|e| {
                    Error::IntegrityMismatch(format!("README text member is not UTF-8: {e}"))
                })?);
            }
            Some(BundleMember::ReadmePdf) => readme_pdf_present = true,
            Some(BundleMember::Manifest) => manifest_bytes = Some(buf),
            Some(BundleMember::RecoverHtml) => recover_html_bytes = Some(buf),
            None => {}
        }
    }

    let readme_text = readme_text
        .ok_or_else(|| Error::IntegrityMismatch("bundle has no README text member".into()))?;
    if !readme_pdf_present {
        return Err(Error::IntegrityMismatch("bundle has no README PDF member".into()));
    }
    let recover_html_bytes = recover_html_bytes
        .ok_or_else(|| Error::IntegrityMismatch("bundle has no recover.html member".into()))?;

    let embedded = extract_embedded_manifest(&recover_html_bytes);
    let manifest_bytes = match (manifest_bytes, embedded) {
        (Some(_), Some(_)) => {
            return Err(Error::IntegrityMismatch(
                "both MANIFEST.age and an embedded manifest are present; exactly one is required".into(),
            ));
        }
        (Some(bytes), None) => bytes,
        (None, Some(bytes)) => bytes,
        (None, None) => return Err(Error::ManifestMissing),
    };

    Ok(Members {
        readme_text,
        manifest_bytes,
        recover_html_bytes,
    })
}

/// Pull the base64-encoded manifest out of a rendered recovery asset, if
/// one is embedded in it. Used both by verification (to compare its
/// checksum against the footer) and by [`crate::recovery`] when a holder
/// only has a recovery asset, not a loose `MANIFEST.age`.
pub fn extract_embedded_manifest(html: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(html).ok()?;
    let start = text.find(MANIFEST_KEY)? + MANIFEST_KEY.len();
    let end = text[start..].find('"')? + start;
    STANDARD.decode(&text[start..end]).ok()
}

/// Verify `bundle_bytes` end-to-end. On success, returns nothing; any
/// mismatch is reported as an [`Error`] naming the failing member.
pub fn verify<R: Read + std::io::Seek>(reader: R, holder_context: &str) -> Result<()> {
    let members = collect_members(reader).context(format!("verifying bundle for {holder_context}"))?;

    let footer = readme::parse_footer(&members.readme_text)
        .context(format!("verifying bundle for {holder_context}"))?;

    let declared_manifest = footer
        .get("checksum-manifest")
        .ok_or_else(|| Error::IntegrityMismatch("footer is missing checksum-manifest".into()))?;
    let actual_manifest = primitives::hash(&members.manifest_bytes);
    if !primitives::hash_eq(&actual_manifest, declared_manifest) {
        return Err(Error::IntegrityMismatch(format!(
            "verifying bundle for {holder_context}: MANIFEST.age checksum does not match the footer"
        )));
    }

    let declared_recover_html = footer.get("checksum-recover-html").ok_or_else(|| {
        Error::IntegrityMismatch("footer is missing checksum-recover-html".into())
    })?;
    let actual_recover_html = primitives::hash(&members.recover_html_bytes);
    if !primitives::hash_eq(&actual_recover_html, declared_recover_html) {
        return Err(Error::IntegrityMismatch(format!(
            "verifying bundle for {holder_context}: recover.html checksum does not match the footer"
        )));
    }

    let share = long::parse(&members.readme_text)
        .context(format!("verifying bundle for {holder_context}"))?;
    if !share.verify_checksum() {
        return Err(Error::IntegrityMismatch(format!(
            "verifying bundle for {holder_context}: embedded share checksum does not match its data"
        )));
    }

    Ok(())
}
