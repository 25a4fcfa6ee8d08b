// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! The language-aware README body and its machine-parseable footer.
//!
//! Actual translated strings are an external concern (only the key
//! contract lives here, per the project's scope): [`Translate`] is the
//! seam a real catalogue plugs into. [`EnglishCatalog`] is the one
//! complete implementation this crate owns, since English is the base of
//! the holder-language → project-language → `en` fallback chain.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use wordlists::Language;

use crate::encodings::{long, words};
use crate::error::{Error, Result};
use crate::share::Share;

const FOOTER_RULE: &str = "================================================================================";

/// The closed set of translation keys the README body can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Title,
    HolderLinePrefix,
    WhatIsThisHeading,
    WhatIsThisOneOfN,
    WhatIsThisThreshold,
    WarningHeading,
    WarningBody,
    OtherHoldersHeading,
    OtherHoldersSuppressed,
    OtherHoldersNoneOther,
    SharingGuidanceHeading,
    SharingGuidanceBody,
    BrowserHeading,
    BrowserEmbeddedSteps,
    BrowserSeparateManifestSteps,
    BrowserAnonymousNote,
    CliFallbackHeading,
    CliUsageLine,
    ShareWordsHeading,
    ShareWordsEnglishAlsoHeading,
    ShareLongHeading,
}

/// Capability a real translation catalogue implements; [`EnglishCatalog`]
/// is the only one this crate provides.
pub trait Translate {
    fn get(&self, lang: Language, key: Key) -> String;
}

/// Always returns the English string regardless of `lang`. Used when no
/// external catalogue is wired in yet, and as the fallback base for any
/// partial catalogue.
pub struct EnglishCatalog;

impl Translate for EnglishCatalog {
    fn get(&self, _lang: Language, key: Key) -> String {
        english(key).to_string()
    }
}

fn english(key: Key) -> &'static str {
    match key {
        Key::Title => "ReMemory recovery share",
        Key::HolderLinePrefix => "Prepared for",
        Key::WhatIsThisHeading => "What is this?",
        Key::WhatIsThisOneOfN => "This document contains one share of a secret split among several people.",
        Key::WhatIsThisThreshold => "Any threshold number of shares, collected together, can recover the protected files.",
        Key::WarningHeading => "Keep this safe",
        Key::WarningBody => "Do not publish this document. Anyone who collects enough shares can decrypt the protected files.",
        Key::OtherHoldersHeading => "Other holders",
        Key::OtherHoldersSuppressed => "Holder identities are withheld in this project.",
        Key::OtherHoldersNoneOther => "No other holders were listed.",
        Key::SharingGuidanceHeading => "What to do with this",
        Key::SharingGuidanceBody => "Store this document somewhere safe and separate from the other shares. Only act on it if asked to help with a recovery.",
        Key::BrowserHeading => "Recovering in a browser",
        Key::BrowserEmbeddedSteps => "Open recover.html from this bundle; the encrypted archive is already embedded, so no other file is needed.",
        Key::BrowserSeparateManifestSteps => "Open recover.html from this bundle and, when prompted, provide MANIFEST.age from one of the bundles.",
        Key::BrowserAnonymousNote => "Other shares will be identified by number, not by name.",
        Key::CliFallbackHeading => "Recovering from the command line",
        Key::CliUsageLine => "rememory recover SHARE... --manifest MANIFEST.age --output DIR",
        Key::ShareWordsHeading => "Your share, as words",
        Key::ShareWordsEnglishAlsoHeading => "The same share, in English",
        Key::ShareLongHeading => "Your share, as text",
    }
}

/// Everything the README body needs that isn't a translated string.
pub struct RenderInput<'a> {
    pub project_name: &'a str,
    pub holder_label: &'a str,
    pub total: u8,
    pub threshold: u8,
    pub anonymous: bool,
    pub other_holder_labels: &'a [String],
    pub manifest_embedded: bool,
    pub release_url: &'a str,
    pub share: &'a Share,
    pub lang: Language,
}

/// Render the README body (every section except the footer).
pub fn render_body(input: &RenderInput<'_>, translator: &dyn Translate) -> Result<String> {
    let lang = input.lang;
    let t = |k: Key| translator.get(lang, k);
    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", t(Key::Title)));
    out.push_str(&format!("{}: {}\n\n", t(Key::HolderLinePrefix), input.holder_label));

    out.push_str(&format!("## {}\n\n", t(Key::WhatIsThisHeading)));
    out.push_str(&format!("{}\n", t(Key::WhatIsThisOneOfN)));
    out.push_str(&format!(
        "{} ({} of {}, threshold {}: {})\n\n",
        t(Key::WhatIsThisThreshold),
        input.share.index,
        input.total,
        input.threshold,
        input.project_name,
    ));

    out.push_str(&format!("## {}\n\n", t(Key::WarningHeading)));
    out.push_str(&format!("{}\n\n", t(Key::WarningBody)));

    out.push_str(&format!("## {}\n\n", t(Key::OtherHoldersHeading)));
    if input.anonymous {
        out.push_str(&format!("{}\n\n", t(Key::OtherHoldersSuppressed)));
    } else if input.other_holder_labels.is_empty() {
        out.push_str(&format!("{}\n\n", t(Key::OtherHoldersNoneOther)));
    } else {
        for label in input.other_holder_labels {
            out.push_str(&format!("- {label}\n"));
        }
        out.push('\n');
    }

    out.push_str(&format!("## {}\n\n", t(Key::SharingGuidanceHeading)));
    out.push_str(&format!("{}\n\n", t(Key::SharingGuidanceBody)));

    out.push_str(&format!("## {}\n\n", t(Key::BrowserHeading)));
    if input.manifest_embedded {
        out.push_str(&format!("{}\n", t(Key::BrowserEmbeddedSteps)));
    } else {
        out.push_str(&format!("{}\n", t(Key::BrowserSeparateManifestSteps)));
    }
    if input.anonymous {
        out.push_str(&format!("{}\n", t(Key::BrowserAnonymousNote)));
    }
    out.push('\n');

    out.push_str(&format!("## {}\n\n", t(Key::CliFallbackHeading)));
    out.push_str(&format!("Release: {}\n\n", input.release_url));
    out.push_str(&format!("    {}\n\n", t(Key::CliUsageLine)));

    out.push_str(&format!("## {}\n\n", t(Key::ShareWordsHeading)));
    let native_words = words::encode(&input.share.data, input.share.index, lang)
        .map_err(|_| Error::InvalidShare("share data is not word-encodable".into()))?;
    out.push_str(&native_words.join(" "));
    out.push_str("\n\n");
    if lang != Language::En {
        out.push_str(&format!("### {}\n\n", t(Key::ShareWordsEnglishAlsoHeading)));
        let english_words = words::encode(&input.share.data, input.share.index, Language::En)
            .map_err(|_| Error::InvalidShare("share data is not word-encodable".into()))?;
        out.push_str(&english_words.join(" "));
        out.push_str("\n\n");
    }

    out.push_str(&format!("## {}\n\n", t(Key::ShareLongHeading)));
    out.push_str(&long::encode(input.share));
    out.push('\n');

    Ok(out)
}

/// The footer's field values, known only once the other bundle members
/// have been built.
pub struct FooterFields<'a> {
    pub rememory_version: &'a str,
    pub created: DateTime<Utc>,
    pub project: &'a str,
    pub threshold: u8,
    pub total: u8,
    pub github_release: &'a str,
    pub checksum_manifest: &'a str,
    pub checksum_recover_html: &'a str,
}

/// Append the machine-parseable footer to a README body. The banner and
/// key names are always literal English; the footer is a machine
/// contract, not a translation.
pub fn append_footer(body: &str, fields: &FooterFields<'_>) -> String {
    let mut out = String::from(body);
    out.push_str(FOOTER_RULE);
    out.push('\n');
    out.push_str("METADATA FOOTER (machine-parseable)\n");
    out.push_str(FOOTER_RULE);
    out.push('\n');
    out.push_str(&format!("rememory-version: {}\n", fields.rememory_version));
    out.push_str(&format!("created: {}\n", fields.created.to_rfc3339()));
    out.push_str(&format!("project: {}\n", fields.project));
    out.push_str(&format!("threshold: {}\n", fields.threshold));
    out.push_str(&format!("total: {}\n", fields.total));
    out.push_str(&format!("github-release: {}\n", fields.github_release));
    out.push_str(&format!("checksum-manifest: {}\n", fields.checksum_manifest));
    out.push_str(&format!("checksum-recover-html: {}\n", fields.checksum_recover_html));
    out.push_str(FOOTER_RULE);
    out.push('\n');
    out
}

/// Parse the footer's key/value lines out of a rendered README text.
pub fn parse_footer(text: &str) -> Result<HashMap<String, String>> {
    let marker = "METADATA FOOTER (machine-parseable)";
    let marker_pos = text
        .find(marker)
        .ok_or_else(|| Error::IntegrityMismatch("README has no metadata footer".into()))?;
    let after_marker = &text[marker_pos + marker.len()..];
    let mut fields = HashMap::new();
    for line in after_marker.lines() {
        let line = line.trim();
        if line.is_empty() || line.chars().all(|c| c == '=') {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            let is_valid_key = !key.is_empty()
                && key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
            if is_valid_key {
                fields.insert(key.to_string(), value.trim().to_string());
            }
        }
    }
    Ok(fields)
}
