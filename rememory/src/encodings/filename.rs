// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! Share filename slugging: turns a holder's display name into a filesystem
//! and ZIP-entry safe `SHARE-{slug}.txt`.

use unicode_normalization::UnicodeNormalization;

/// Render the share filename for `holder` at 1-based `index`. Falls back to
/// `SHARE-{index}.txt` when the holder name slugs down to nothing (an empty
/// name, or one made entirely of punctuation).
pub fn share_filename(holder: &str, index: u8) -> String {
    let slug = slugify(holder);
    if slug.is_empty() {
        format!("SHARE-{index}.txt")
    } else {
        format!("SHARE-{slug}.txt")
    }
}

fn slugify(holder: &str) -> String {
    let stripped: String = holder.nfd().filter(|c| !is_combining_mark(*c)).collect();

    let kept: String = stripped
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();

    let hyphenated: String = kept
        .chars()
        .map(|c| if c == ' ' || c == '_' { '-' } else { c })
        .collect();

    let lowercased = hyphenated.to_lowercase();

    let mut collapsed = String::with_capacity(lowercased.len());
    let mut last_was_hyphen = false;
    for c in lowercased.chars() {
        if c == '-' {
            if !last_was_hyphen {
                collapsed.push(c);
            }
            last_was_hyphen = true;
        } else {
            collapsed.push(c);
            last_was_hyphen = false;
        }
    }

    collapsed.trim_matches('-').to_string()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_scenario_two_examples() {
        assert_eq!(share_filename("Alice", 1), "SHARE-alice.txt");
        assert_eq!(share_filename("Bob Smith", 2), "SHARE-bob-smith.txt");
        assert_eq!(share_filename("Carol!", 3), "SHARE-carol.txt");
        assert_eq!(share_filename("José", 4), "SHARE-jose.txt");
        assert_eq!(share_filename("", 1), "SHARE-1.txt");
    }

    #[test]
    fn collapses_runs_of_separators() {
        assert_eq!(share_filename("  Multiple   Spaces  ", 5), "SHARE-multiple-spaces.txt");
        assert_eq!(share_filename("__under__score__", 6), "SHARE-under-score.txt");
    }

    #[test]
    fn punctuation_only_name_falls_back_to_index() {
        assert_eq!(share_filename("!!!", 9), "SHARE-9.txt");
    }
}
