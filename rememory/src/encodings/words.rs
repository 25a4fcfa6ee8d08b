// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! BIP39-style word encoding of share data, in English or any of the other
//! five embedded languages. A 25th word packs the share index and a 7-bit
//! checksum so a decode can catch a mistyped or transposed word.

use wordlists::{Language, LangList};

use crate::error::{Error, Result};

const BITS_PER_WORD: usize = 11;
const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Render `data` as BIP39 words in `lang`, followed by a 25th metadata word
/// encoding `index` (clamped into 4 bits, see
/// [`crate::share::Share::clamped_index`]) and a checksum of `data`.
///
/// Only defined for data lengths whose bit count divides evenly into
/// 11-bit groups (33 bytes, the standard v2 share size, is one such
/// length); other lengths are refused rather than silently padded, per the
/// open question this format leaves unresolved for non-standard sizes.
pub fn encode(data: &[u8], index: u8, lang: Language) -> Result<Vec<String>> {
    let mut groups = pack_groups(data)?;
    groups.push(metadata_word(data, index));

    let list = wordlists::registry().list(lang);
    Ok(groups
        .into_iter()
        .map(|g| list.word_at(g).to_string())
        .collect())
}

/// Decode a word list produced by [`encode`], verifying the 25th word's
/// checksum. Returns the recovered data and the packed (clamped) index.
pub fn decode(words: &[&str], lang: Language) -> Result<(Vec<u8>, u8)> {
    if words.len() < 2 {
        return Err(Error::InvalidShare(
            "word share must carry at least a data word and a metadata word".into(),
        ));
    }
    let list = wordlists::registry().list(lang);
    let mut indices = Vec::with_capacity(words.len());
    for word in words {
        match list.lookup(word) {
            Some(idx) => indices.push(idx),
            None => return Err(unknown_word_error(list, word)),
        }
    }

    let (meta, data_groups) = indices.split_last().expect("checked len >= 2 above");
    let meta = *meta;
    let data = unpack_groups(data_groups);

    let clamped_index = (meta >> 7) as u8 & 0x0F;
    let declared_checksum = (meta & 0x7F) as u8;
    let actual_checksum = first_hash_byte(&data) & 0x7F;
    if declared_checksum != actual_checksum {
        return Err(Error::InvalidShare(
            "25th-word checksum does not match the decoded share data".into(),
        ));
    }
    Ok((data, clamped_index))
}

fn unknown_word_error(list: &LangList, word: &str) -> Error {
    match list.closest(word, MAX_SUGGESTION_DISTANCE) {
        Some((candidate, _)) => Error::InvalidShare(format!(
            "{word:?} is not in the word list; did you mean {candidate:?}?"
        )),
        None => Error::InvalidShare(format!("{word:?} is not in the word list")),
    }
}

fn metadata_word(data: &[u8], index: u8) -> u16 {
    let clamped = if index <= 15 { index } else { 0 };
    let checksum_bits = first_hash_byte(data) & 0x7F;
    ((clamped as u16) << 7) | checksum_bits as u16
}

fn first_hash_byte(data: &[u8]) -> u8 {
    let rendered = primitives::hash(data);
    let hex_byte = &rendered[primitives::PREFIX.len()..primitives::PREFIX.len() + 2];
    u8::from_str_radix(hex_byte, 16).expect("sha256 hex output is always valid hex")
}

fn pack_groups(data: &[u8]) -> Result<Vec<u16>> {
    let total_bits = data.len() * 8;
    if total_bits % BITS_PER_WORD != 0 {
        return Err(Error::InvalidParams(format!(
            "data length {} bytes does not divide evenly into 11-bit words; word encoding only supports lengths that are a multiple of 11 bytes",
            data.len()
        )));
    }
    let mut groups = Vec::with_capacity(total_bits / BITS_PER_WORD);
    let mut acc: u32 = 0;
    let mut acc_bits = 0u32;
    for &byte in data {
        acc = (acc << 8) | byte as u32;
        acc_bits += 8;
        while acc_bits >= BITS_PER_WORD as u32 {
            acc_bits -= BITS_PER_WORD as u32;
            groups.push(((acc >> acc_bits) & 0x7FF) as u16);
        }
    }
    Ok(groups)
}

fn unpack_groups(groups: &[u16]) -> Vec<u8> {
    let mut acc: u32 = 0;
    let mut acc_bits = 0u32;
    let mut out = Vec::with_capacity(groups.len() * BITS_PER_WORD / 8);
    for &g in groups {
        acc = (acc << BITS_PER_WORD) | (g as u32 & 0x7FF);
        acc_bits += BITS_PER_WORD as u32;
        while acc_bits >= 8 {
            acc_bits -= 8;
            out.push(((acc >> acc_bits) & 0xFF) as u8);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_33_bytes() -> Vec<u8> {
        (0..33u8).collect()
    }

    #[test]
    fn round_trips_through_english() {
        let data = sample_33_bytes();
        let words = encode(&data, 7, Language::En).unwrap();
        assert_eq!(words.len(), 25);
        let refs: Vec<&str> = words.iter().map(|s| s.as_str()).collect();
        let (decoded, index) = decode(&refs, Language::En).unwrap();
        assert_eq!(decoded, data);
        assert_eq!(index, 7);
    }

    #[test]
    fn round_trips_through_every_language() {
        let data = sample_33_bytes();
        for lang in Language::ALL {
            let words = encode(&data, 3, lang).unwrap();
            let refs: Vec<&str> = words.iter().map(|s| s.as_str()).collect();
            let (decoded, index) = decode(&refs, lang).unwrap();
            assert_eq!(decoded, data, "language {lang}");
            assert_eq!(index, 3, "language {lang}");
        }
    }

    #[test]
    fn metadata_word_packs_index_and_checksum_per_scenario_five() {
        let data = sample_33_bytes();
        let checksum = first_hash_byte(&data) & 0x7F;

        assert_eq!(metadata_word(&data, 7), (7u16 << 7) | checksum as u16);
        assert_eq!(metadata_word(&data, 100), checksum as u16);
    }

    #[test]
    fn index_above_fifteen_clamps_to_sentinel_zero() {
        let data = sample_33_bytes();
        let words = encode(&data, 200, Language::En).unwrap();
        let refs: Vec<&str> = words.iter().map(|s| s.as_str()).collect();
        let (_, index) = decode(&refs, Language::En).unwrap();
        assert_eq!(index, 0);
    }

    #[test]
    fn rejects_lengths_that_do_not_divide_into_11_bit_words() {
        assert!(pack_groups(&[0u8; 10]).is_err());
        assert!(pack_groups(&[0u8; 11]).is_ok());
    }

    #[test]
    fn single_word_substitution_is_rejected() {
        let data = sample_33_bytes();
        let words = encode(&data, 1, Language::En).unwrap();
        let mut tampered = words.clone();
        let list = wordlists::registry().list(Language::En);
        let current = list.lookup(&tampered[0]).unwrap();
        let replacement = list.word_at((current + 1) % wordlists::WORD_COUNT as u16);
        tampered[0] = replacement.to_string();
        let refs: Vec<&str> = tampered.iter().map(|s| s.as_str()).collect();
        assert!(decode(&refs, Language::En).is_err());
    }

    #[test]
    fn unknown_word_reports_a_close_suggestion_when_one_exists() {
        let data = sample_33_bytes();
        let words = encode(&data, 1, Language::En).unwrap();
        let list = wordlists::registry().list(Language::En);
        let real_word = list.lookup(&words[0]).map(|idx| list.word_at(idx).to_string()).unwrap();
        let mut typo = real_word.clone();
        typo.pop();
        let mut tampered = words.clone();
        tampered[0] = typo;
        let refs: Vec<&str> = tampered.iter().map(|s| s.as_str()).collect();
        let err = decode(&refs, Language::En).unwrap_err();
        assert!(err.to_string().contains(&real_word) || err.to_string().contains("did you mean"));
    }
}
