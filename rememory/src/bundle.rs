// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! Assembles one holder's deliverable: a ZIP containing a README (text and
//! PDF), the encrypted manifest (unless embedded), and the personalised
//! recovery web asset.

use std::io::{Cursor, Write};

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Serialize;

use crate::encodings::compact;
use crate::error::{Context, Error, Result};
use crate::readme::{self, FooterFields, RenderInput, Translate};
use crate::share::Share;

/// Manifests above this size are never embedded in the recovery asset,
/// regardless of the caller's preference.
pub const MAX_EMBEDDED_MANIFEST_BYTES: usize = 5 * 1024 * 1024;

/// The four kinds of ZIP member a bundle can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleMember {
    ReadmeText,
    ReadmePdf,
    Manifest,
    RecoverHtml,
}

/// Reference to another holder, as carried in the recovery asset's
/// personalisation payload so the web UI can label decoded shares by name.
#[derive(Debug, Clone, Serialize)]
pub struct OtherHolderRef {
    pub index: u8,
    pub name: String,
}

/// The JSON object embedded in (or passed alongside) the recovery asset,
/// describing this holder and their peers to the web front-end.
#[derive(Debug, Clone, Serialize)]
pub struct Personalization {
    pub holder: String,
    pub share_compact: String,
    pub other_holders: Vec<OtherHolderRef>,
    pub threshold: u8,
    pub total: u8,
    pub ui_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_base64: Option<String>,
}

/// Everything needed to build one holder's bundle.
pub struct BuildInput<'a> {
    pub project_name: &'a str,
    pub readme_filename: &'a str,
    /// Renders the README *body* (the PDF the real pipeline hands to an
    /// external renderer; here it's injected so the crate stays free of a
    /// PDF dependency, per the scope boundary around that collaborator).
    pub render_pdf: &'a dyn Fn(&str) -> Vec<u8>,
    pub recover_html_template: &'a str,
    pub manifest_ciphertext: &'a [u8],
    pub manifest_checksum: &'a str,
    pub embed_manifest: bool,
    pub sealed_at: DateTime<Utc>,
    pub release_url: &'a str,
    pub holder_label: &'a str,
    pub other_holders: Vec<OtherHolderRef>,
    pub anonymous: bool,
    pub share: &'a Share,
    pub render: RenderInput<'a>,
}

/// The finished ZIP bytes plus the checksums a caller may want to record
/// (e.g. into the project's [`crate::project::SealRecord`]).
pub struct BuildOutput {
    pub zip_bytes: Vec<u8>,
    pub recover_html_checksum: String,
    pub readme_checksum: String,
}

/// Generate a fresh CSP nonce from 16 cryptographic random bytes.
pub fn csp_nonce() -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD.encode(primitives::random_bytes(16))
}

fn render_recover_html(
    template: &str,
    personalization: &Personalization,
    nonce: &str,
) -> Result<String> {
    let json: String = serde_json::to_string(personalization)
        .map_err(Error::from)
        .context("serialising recovery asset personalization")?;
    Ok(template
        .replace("{{REMEMORY_PERSONALIZATION_JSON}}", &json)
        .replace("{{REMEMORY_CSP_NONCE}}", nonce))
}

/// Build one holder's bundle ZIP, in the order that keeps every checksum
/// the footer reports correct: the README body, then the recovery asset
/// (whose checksum the footer needs), then the footer is appended to the
/// README, then everything is written to the ZIP.
pub fn build_for_holder(input: BuildInput<'_>) -> Result<BuildOutput> {
    let embed = input.embed_manifest && input.manifest_ciphertext.len() <= MAX_EMBEDDED_MANIFEST_BYTES;

    let manifest_base64 = if embed {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;
        Some(STANDARD.encode(input.manifest_ciphertext))
    } else {
        None
    };

    let body = readme::render_body(&input.render, &crate::readme::EnglishCatalog as &dyn Translate)
        .context("rendering README body")?;
    let readme_pdf_bytes = (input.render_pdf)(&body);

    let personalization = Personalization {
        holder: input.holder_label.to_string(),
        share_compact: compact::encode(input.share),
        other_holders: input.other_holders,
        threshold: input.share.threshold,
        total: input.share.total,
        ui_language: input.render.lang.code().to_string(),
        manifest_base64,
    };
    let nonce = csp_nonce();
    let recover_html = render_recover_html(input.recover_html_template, &personalization, &nonce)?;
    let recover_html_checksum = primitives::hash(recover_html.as_bytes());

    let footer = FooterFields {
        rememory_version: env!("CARGO_PKG_VERSION"),
        created: input.sealed_at,
        project: input.project_name,
        threshold: input.share.threshold,
        total: input.share.total,
        github_release: input.release_url,
        checksum_manifest: input.manifest_checksum,
        checksum_recover_html: &recover_html_checksum,
    };
    let readme_text = readme::append_footer(&body, &footer);
    let readme_checksum = primitives::hash(readme_text.as_bytes());

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip_datetime(input.sealed_at))
            .unix_permissions(0o644);

        zip.start_file(input.readme_filename, options)?;
        zip.write_all(readme_text.as_bytes())?;

        let pdf_name = input.readme_filename.replace(".txt", ".pdf");
        zip.start_file(&pdf_name, options)?;
        zip.write_all(&readme_pdf_bytes)?;

        if !embed {
            zip.start_file("MANIFEST.age", options)?;
            zip.write_all(input.manifest_ciphertext)?;
        }

        zip.start_file("recover.html", options)?;
        zip.write_all(recover_html.as_bytes())?;

        zip.finish()?;
    }

    Ok(BuildOutput {
        zip_bytes: cursor.into_inner(),
        recover_html_checksum,
        readme_checksum,
    })
}

fn zip_datetime(dt: DateTime<Utc>) -> zip::DateTime {
    zip::DateTime::from_date_and_time(
        dt.year().clamp(1980, 2107) as u16,
        dt.month() as u8,
        dt.day() as u8,
        dt.hour() as u8,
        dt.minute() as u8,
        dt.second() as u8,
    )
    .unwrap_or_default()
}

/// Classify a ZIP entry name the way the verifier needs to.
pub fn classify_member(name: &str) -> Option<BundleMember> {
    if name == "MANIFEST.age" {
        Some(BundleMember::Manifest)
    } else if name == "recover.html" {
        Some(BundleMember::RecoverHtml)
    } else if name.ends_with(".pdf") {
        Some(BundleMember::ReadmePdf)
    } else if name.ends_with(".txt") {
        Some(BundleMember::ReadmeText)
    } else {
        None
    }
}
