// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! The long-form textual share block: an armoured header plus base64 body,
//! meant to survive a trip through a PDF and back out through OCR or
//! copy-paste.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{Error, Result};
use crate::share::{Share, ShareVersion};

const BEGIN: &str = "-----BEGIN REMEMORY SHARE-----";
const END: &str = "-----END REMEMORY SHARE-----";

/// Render `share` as the long armoured block.
pub fn encode(share: &Share) -> String {
    let mut out = String::new();
    out.push_str(BEGIN);
    out.push('\n');
    out.push_str(&format!("Version: {}\n", share.version.as_u8()));
    out.push_str(&format!("Index: {}\n", share.index));
    out.push_str(&format!("Total: {}\n", share.total));
    out.push_str(&format!("Threshold: {}\n", share.threshold));
    if !share.holder.is_empty() {
        out.push_str(&format!("Holder: {}\n", share.holder));
    }
    out.push_str(&format!("Created: {}\n", format_created(share)));
    out.push_str(&format!("Checksum: {}\n", share.checksum));
    out.push('\n');
    out.push_str(&STANDARD.encode(&share.data));
    out.push('\n');
    out.push_str(END);
    out.push('\n');
    out
}

fn format_created(share: &Share) -> String {
    match share.version {
        ShareVersion::V2 => share.created.format("%Y-%m-%d %H:%M").to_string(),
        ShareVersion::V1 => share.created.to_rfc3339(),
    }
}

/// Parse a long armoured block. Tolerates a missing blank line between the
/// headers and the base64 body: the first line that does not look like a
/// recognised `Key: Value` header is treated as the start of the body,
/// which is what happens when a share is copied out of a rendered PDF.
pub fn parse(text: &str) -> Result<Share> {
    let body_start = text
        .find(BEGIN)
        .ok_or_else(|| Error::InvalidShare("missing BEGIN REMEMORY SHARE marker".into()))?
        + BEGIN.len();
    let body_end = text
        .find(END)
        .ok_or_else(|| Error::InvalidShare("missing END REMEMORY SHARE marker".into()))?;
    if body_end <= body_start {
        return Err(Error::InvalidShare("BEGIN/END markers out of order".into()));
    }
    let inner = &text[body_start..body_end];

    let mut version = None;
    let mut index = None;
    let mut total = None;
    let mut threshold = None;
    let mut holder = String::new();
    let mut created_raw = None;
    let mut checksum = None;
    let mut base64_lines: Vec<&str> = Vec::new();
    let mut in_body = false;

    for raw_line in inner.lines() {
        let line = raw_line.trim();
        if in_body {
            if !line.is_empty() {
                base64_lines.push(line);
            }
            continue;
        }
        if line.is_empty() {
            in_body = true;
            continue;
        }
        match parse_header_line(line) {
            Some(("Version", v)) => version = Some(v.to_string()),
            Some(("Index", v)) => index = Some(v.to_string()),
            Some(("Total", v)) => total = Some(v.to_string()),
            Some(("Threshold", v)) => threshold = Some(v.to_string()),
            Some(("Holder", v)) => holder = v.to_string(),
            Some(("Created", v)) => created_raw = Some(v.to_string()),
            Some(("Checksum", v)) => checksum = Some(v.to_string()),
            _ => {
                // Not a recognised header: the blank line got lost, this
                // line is the start of the base64 body.
                in_body = true;
                base64_lines.push(line);
            }
        }
    }

    let version_num: u8 = version
        .ok_or_else(|| Error::InvalidShare("missing Version header".into()))?
        .parse()
        .map_err(|_| Error::InvalidShare("Version header is not a number".into()))?;
    let version = ShareVersion::from_u8(version_num)
        .ok_or_else(|| Error::InvalidShare(format!("unsupported share version {version_num}")))?;
    let index: u8 = index
        .ok_or_else(|| Error::InvalidShare("missing Index header".into()))?
        .parse()
        .map_err(|_| Error::InvalidShare("Index header is not a number".into()))?;
    let total: u8 = total
        .ok_or_else(|| Error::InvalidShare("missing Total header".into()))?
        .parse()
        .map_err(|_| Error::InvalidShare("Total header is not a number".into()))?;
    let threshold: u8 = threshold
        .ok_or_else(|| Error::InvalidShare("missing Threshold header".into()))?
        .parse()
        .map_err(|_| Error::InvalidShare("Threshold header is not a number".into()))?;
    let created_raw =
        created_raw.ok_or_else(|| Error::InvalidShare("missing Created header".into()))?;
    let created = parse_created(&created_raw)?;
    let checksum = checksum.ok_or_else(|| Error::InvalidShare("missing Checksum header".into()))?;

    let data = STANDARD
        .decode(base64_lines.concat())
        .map_err(|e| Error::InvalidShare(format!("malformed base64 body: {e}")))?;

    let computed = primitives::hash(&data);
    if !primitives::hash_eq(&computed, &checksum) {
        return Err(Error::InvalidShare(
            "checksum does not match share data".into(),
        ));
    }

    Share::new(version, index, total, threshold, holder, created, data)
}

fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    const KEYS: &[&str] = &["Version", "Index", "Total", "Threshold", "Holder", "Created", "Checksum"];
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if KEYS.contains(&key) {
        Some((key, value.trim()))
    } else {
        None
    }
}

fn parse_created(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    Err(Error::InvalidShare(format!(
        "Created header {raw:?} is neither minute-precision nor RFC3339"
    )))
}
