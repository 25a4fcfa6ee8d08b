// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! The compact single-line share form, short enough to live in a URL
//! fragment.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::share::{Share, ShareVersion};

/// Number of leading bytes of `sha256(data)` rendered into the trailing
/// checksum field, as 2 hex chars per byte.
const CHECKSUM_BYTES: usize = 4;

/// Render `share` as `RM{ver}:{idx}:{total}:{threshold}:{data}:{hex8}`.
/// Holder and creation time are not carried by this form.
pub fn encode(share: &Share) -> String {
    format!(
        "RM{}:{}:{}:{}:{}:{}",
        share.version.as_u8(),
        share.index,
        share.total,
        share.threshold,
        URL_SAFE_NO_PAD.encode(&share.data),
        checksum_hex(&share.data),
    )
}

fn checksum_hex(data: &[u8]) -> String {
    let full = primitives::hash(data);
    let hex_part = &full[primitives::PREFIX.len()..];
    hex_part[..CHECKSUM_BYTES * 2].to_string()
}

/// Parse a compact share string. The returned share has an empty holder
/// name and an epoch creation time, since compact form carries neither.
pub fn parse(text: &str) -> Result<Share> {
    let rest = text
        .strip_prefix("RM")
        .ok_or_else(|| Error::InvalidShare("compact share does not start with RM".into()))?;
    let fields: Vec<&str> = rest.split(':').collect();
    if fields.len() != 6 {
        return Err(Error::InvalidShare(format!(
            "compact share has {} fields, expected 6",
            fields.len()
        )));
    }
    let version_num: u8 = fields[0]
        .parse()
        .map_err(|_| Error::InvalidShare("compact version is not a number".into()))?;
    let version = ShareVersion::from_u8(version_num)
        .ok_or_else(|| Error::InvalidShare(format!("unsupported share version {version_num}")))?;
    let index: u8 = fields[1]
        .parse()
        .map_err(|_| Error::InvalidShare("compact index is not a number".into()))?;
    let total: u8 = fields[2]
        .parse()
        .map_err(|_| Error::InvalidShare("compact total is not a number".into()))?;
    let threshold: u8 = fields[3]
        .parse()
        .map_err(|_| Error::InvalidShare("compact threshold is not a number".into()))?;
    let data = URL_SAFE_NO_PAD
        .decode(fields[4])
        .map_err(|e| Error::InvalidShare(format!("malformed compact body: {e}")))?;
    let checksum_field = fields[5];
    if checksum_field.len() != CHECKSUM_BYTES * 2 {
        return Err(Error::InvalidShare(format!(
            "compact checksum must be {} hex chars, got {}",
            CHECKSUM_BYTES * 2,
            checksum_field.len()
        )));
    }
    if !checksum_field.eq_ignore_ascii_case(&checksum_hex(&data)) {
        return Err(Error::InvalidShare(
            "compact checksum does not match data".into(),
        ));
    }

    Share::new(
        version,
        index,
        total,
        threshold,
        String::new(),
        DateTime::<Utc>::UNIX_EPOCH,
        data,
    )
}
