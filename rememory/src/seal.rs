// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! Drives the seal path: tar+gzip the manifest directory, encrypt it under
//! a fresh passphrase, split the passphrase, and build one bundle per
//! holder.

use std::io::Cursor;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::bundle::{build_for_holder, BuildInput, BuildOutput, OtherHolderRef};
use crate::encodings::filename;
use crate::error::{Context, Result};
use crate::passphrase;
use crate::project::Project;
use crate::readme::RenderInput;
use crate::share::{Share, ShareVersion};

/// One holder's sealed deliverable.
pub struct SealedHolder {
    pub holder_label: String,
    pub filename: String,
    pub zip_bytes: Vec<u8>,
    pub readme_checksum: String,
}

/// Everything produced by a successful seal.
pub struct SealOutput {
    pub sealed_at: DateTime<Utc>,
    pub manifest_checksum: String,
    pub passphrase_verification: String,
    pub archive_warnings: Vec<String>,
    pub holders: Vec<SealedHolder>,
}

/// Inputs a seal needs beyond the project file itself: where the manifest
/// directory lives, the recovery web asset template, the PDF renderer
/// (external collaborator), the release URL for the CLI fallback section,
/// and whether to embed the encrypted manifest in the recovery asset.
pub struct SealInput<'a> {
    pub project: &'a Project,
    pub manifest_dir: &'a Path,
    pub recover_html_template: &'a str,
    pub render_pdf: &'a dyn Fn(&str) -> Vec<u8>,
    pub release_url: &'a str,
    pub embed_manifest: bool,
}

/// Run the full seal pipeline for `input.project`.
pub fn seal(input: SealInput<'_>) -> Result<SealOutput> {
    let project = input.project;
    let total = project.total();
    if total > u8::MAX as usize {
        return Err(crate::error::Error::InvalidParams(format!(
            "{total} holders exceeds the maximum of {}",
            u8::MAX
        )));
    }
    let total = total as u8;

    let (archive_bytes, archive_warnings) =
        archive::build(input.manifest_dir).context("building manifest archive")?;
    for warning in &archive_warnings {
        log::warn!("seal({}): {warning}", project.name);
    }

    let generated = passphrase::generate(passphrase::DEFAULT_LEN)?;
    let passphrase_verification = primitives::hash(&generated.raw);

    let mut ciphertext = Vec::new();
    crypto::encrypt(&mut ciphertext, &mut Cursor::new(&archive_bytes), &generated.text)
        .context("encrypting manifest archive")?;
    let manifest_checksum = primitives::hash(&ciphertext);

    let share_data = sharing::split(&generated.raw, total, project.threshold)?;
    let sealed_at = Utc::now();

    let shares: Vec<Share> = share_data
        .into_iter()
        .enumerate()
        .map(|(i, data)| {
            let index = (i + 1) as u8;
            let holder = project.holders.get(i);
            let holder_name = if project.anonymous {
                String::new()
            } else {
                holder.map(|h| h.name.clone()).unwrap_or_default()
            };
            Share::new(ShareVersion::V2, index, total, project.threshold, holder_name, sealed_at, data)
        })
        .collect::<Result<_>>()?;

    let mut holders = Vec::with_capacity(shares.len());
    for (i, share) in shares.iter().enumerate() {
        let index = (i + 1) as u8;
        let holder_label = project.holder_label(index as usize);
        let lang = project
            .holders
            .get(i)
            .map(|h| h.language_or(project.default_language()))
            .unwrap_or_else(|| project.default_language());

        let other_holders: Vec<OtherHolderRef> = if project.anonymous {
            vec![]
        } else {
            shares
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(j, _)| OtherHolderRef {
                    index: (j + 1) as u8,
                    name: project.holder_label((j + 1) as usize),
                })
                .collect()
        };
        let other_holder_labels: Vec<String> =
            other_holders.iter().map(|h| h.name.clone()).collect();

        let render = RenderInput {
            project_name: &project.name,
            holder_label: &holder_label,
            total,
            threshold: project.threshold,
            anonymous: project.anonymous,
            other_holder_labels: &other_holder_labels,
            manifest_embedded: input.embed_manifest,
            release_url: input.release_url,
            share,
            lang,
        };

        let readme_filename = readme_filename_for(lang);
        let build_input = BuildInput {
            project_name: &project.name,
            readme_filename: &readme_filename,
            render_pdf: input.render_pdf,
            recover_html_template: input.recover_html_template,
            manifest_ciphertext: &ciphertext,
            manifest_checksum: &manifest_checksum,
            embed_manifest: input.embed_manifest,
            sealed_at,
            release_url: input.release_url,
            holder_label: &holder_label,
            other_holders,
            anonymous: project.anonymous,
            share,
            render,
        };

        let BuildOutput { zip_bytes, readme_checksum, .. } = build_for_holder(build_input)
            .context(format!("building bundle for {holder_label}"))?;

        holders.push(SealedHolder {
            filename: filename::share_filename(&share.holder, index),
            holder_label,
            zip_bytes,
            readme_checksum,
        });
    }

    Ok(SealOutput {
        sealed_at,
        manifest_checksum,
        passphrase_verification,
        archive_warnings,
        holders,
    })
}

fn readme_filename_for(lang: wordlists::Language) -> String {
    match lang {
        wordlists::Language::Es => "LEEME.txt".to_string(),
        wordlists::Language::Fr => "LISEZMOI.txt".to_string(),
        wordlists::Language::De => "LIESMICH.txt".to_string(),
        wordlists::Language::Pt => "LEIAME.txt".to_string(),
        wordlists::Language::Sl => "PREBERIME.txt".to_string(),
        wordlists::Language::En => "README.txt".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Holder;
    use chrono::TimeZone;

    fn sample_project(anonymous: bool) -> Project {
        Project {
            name: "family-vault".into(),
            created: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            threshold: 3,
            anonymous,
            default_language: "en".into(),
            holders: vec![
                Holder { name: "Alice".into(), contact: None, language: None },
                Holder { name: "Bob".into(), contact: None, language: None },
                Holder { name: "Carol".into(), contact: None, language: None },
                Holder { name: "David".into(), contact: None, language: None },
                Holder { name: "Eve".into(), contact: None, language: None },
            ],
            manifest_dir: "manifest".into(),
            seal: None,
        }
    }

    #[test]
    fn seals_a_project_and_produces_one_bundle_per_holder() {
        let (_tmp, manifest_dir) = test_support::fresh::manifest_tree();

        let project = sample_project(false);
        let output = seal(SealInput {
            project: &project,
            manifest_dir: &manifest_dir,
            recover_html_template: "<html>{{REMEMORY_PERSONALIZATION_JSON}}-{{REMEMORY_CSP_NONCE}}</html>",
            render_pdf: &|_body: &str| b"%PDF-fake".to_vec(),
            release_url: "https://example.com/releases",
            embed_manifest: false,
        })
        .unwrap();

        assert_eq!(output.holders.len(), 5);
        assert_eq!(output.holders[0].filename, "SHARE-alice.txt");
        for holder in &output.holders {
            crate::verifier::verify(Cursor::new(holder.zip_bytes.clone()), &holder.holder_label).unwrap();
        }
    }

    #[test]
    fn anonymous_seal_produces_numbered_filenames_and_no_cross_holder_names() {
        let (_tmp, manifest_dir) = test_support::fresh::manifest_tree();

        let project = sample_project(true);
        let output = seal(SealInput {
            project: &project,
            manifest_dir: &manifest_dir,
            recover_html_template: "<html>{{REMEMORY_PERSONALIZATION_JSON}}-{{REMEMORY_CSP_NONCE}}</html>",
            render_pdf: &|_body: &str| b"%PDF-fake".to_vec(),
            release_url: "https://example.com/releases",
            embed_manifest: true,
        })
        .unwrap();

        assert_eq!(output.holders[0].filename, "SHARE-1.txt");
    }
}
