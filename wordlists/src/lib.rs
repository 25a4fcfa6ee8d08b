// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! Embedded 2048-word lists for six languages, with a lookup that tolerates
//! the kind of typing a holder makes when copying words off paper: wrong
//! case, missing accents, and (in German) ASCII digraphs for umlauts.

mod registry;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use unicode_normalization::UnicodeNormalization;

pub use registry::WORD_COUNT;

/// The closed set of languages a share can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    En,
    Es,
    Fr,
    De,
    Sl,
    Pt,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::En,
        Language::Es,
        Language::Fr,
        Language::De,
        Language::Sl,
        Language::Pt,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Sl => "sl",
            Language::Pt => "pt",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One language's word list plus its tolerant lookup tables.
pub struct LangList {
    words: Vec<String>,
    exact: HashMap<String, u16>,
    stripped: HashMap<String, u16>,
    digraph: Option<HashMap<String, u16>>,
}

impl LangList {
    fn build(lang: Language, raw: &'static str) -> Self {
        let expected = registry::declared_hash(lang);
        let actual = primitives::hash(raw.as_bytes());
        if actual != expected {
            panic!(
                "word list for {} failed its integrity check: expected {}, got {}",
                lang.code(),
                expected,
                actual
            );
        }

        let words: Vec<String> = raw.lines().map(|w| w.to_string()).collect();
        assert_eq!(
            words.len(),
            WORD_COUNT,
            "word list for {} must have exactly {} entries",
            lang.code(),
            WORD_COUNT
        );

        let mut exact = HashMap::with_capacity(WORD_COUNT);
        let mut stripped = HashMap::with_capacity(WORD_COUNT);
        let mut digraph = if lang == Language::De {
            Some(HashMap::with_capacity(WORD_COUNT))
        } else {
            None
        };

        for (idx, word) in words.iter().enumerate() {
            let idx = idx as u16;
            exact.insert(word.to_lowercase(), idx);
            stripped.insert(strip_diacritics(word), idx);
            if let Some(table) = digraph.as_mut() {
                table.insert(collapse_german_digraphs(&strip_diacritics(word)), idx);
            }
        }

        Self {
            words,
            exact,
            stripped,
            digraph,
        }
    }

    pub fn word_at(&self, index: u16) -> &str {
        &self.words[index as usize]
    }

    /// Look up `word`, trying exact, diacritic-stripped, then (German only)
    /// digraph-collapsed matches in that order.
    pub fn lookup(&self, word: &str) -> Option<u16> {
        let trimmed = word.trim().to_lowercase();
        if let Some(&idx) = self.exact.get(&trimmed) {
            return Some(idx);
        }
        let stripped = strip_diacritics(&trimmed);
        if let Some(&idx) = self.stripped.get(&stripped) {
            return Some(idx);
        }
        if let Some(table) = &self.digraph {
            let collapsed = collapse_german_digraphs(&stripped);
            if let Some(&idx) = table.get(&collapsed) {
                return Some(idx);
            }
        }
        None
    }

    /// Find the nearest word by Levenshtein distance, used to produce a
    /// helpful error message when `lookup` misses outright.
    pub fn closest(&self, word: &str, max_distance: usize) -> Option<(&str, usize)> {
        let trimmed = word.trim().to_lowercase();
        self.words
            .iter()
            .map(|candidate| (candidate.as_str(), strsim::levenshtein(candidate, &trimmed)))
            .filter(|(_, dist)| *dist <= max_distance)
            .min_by_key(|(_, dist)| *dist)
    }
}

fn strip_diacritics(word: &str) -> String {
    word.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F)
}

fn collapse_german_digraphs(word: &str) -> String {
    word.replace("ae", "a").replace("oe", "o").replace("ue", "u")
}

/// The read-only, lazily-built set of all six language word lists.
///
/// Construction happens at most once, guarded by [`once_cell::sync::Lazy`];
/// every call after the first observes the same already-built registry.
pub struct Registry {
    lists: HashMap<Language, LangList>,
}

impl Registry {
    pub fn list(&self, lang: Language) -> &LangList {
        self.lists.get(&lang).expect("all languages are loaded at init")
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut lists = HashMap::with_capacity(Language::ALL.len());
    for lang in Language::ALL {
        lists.insert(lang, LangList::build(lang, registry::raw_list(lang)));
    }
    Registry { lists }
});

/// Access the shared, lazily-initialised word list registry.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Return the language whose word list matches more than half of `words`,
/// preferring whichever language matches the most when several qualify.
pub fn detect_language(words: &[&str]) -> Option<Language> {
    if words.is_empty() {
        return None;
    }
    let reg = registry();
    let mut best: Option<(Language, usize)> = None;
    for lang in Language::ALL {
        let list = reg.list(lang);
        let matches = words.iter().filter(|w| list.lookup(w).is_some()).count();
        if matches * 2 > words.len() && best.map_or(true, |(_, b)| matches > b) {
            best = Some((lang, matches));
        }
    }
    best.map(|(lang, _)| lang)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_language_loads_with_2048_words() {
        for lang in Language::ALL {
            let list = registry().list(lang);
            assert_eq!(list.words.len(), WORD_COUNT);
        }
    }

    #[test]
    fn exact_lookup_roundtrips_every_word() {
        let list = registry().list(Language::En);
        for (idx, word) in list.words.iter().enumerate() {
            assert_eq!(list.lookup(word), Some(idx as u16));
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let list = registry().list(Language::En);
        let word = list.word_at(42).to_string();
        assert_eq!(list.lookup(&word.to_uppercase()), Some(42));
    }

    #[test]
    fn spanish_lookup_tolerates_missing_accents() {
        let list = registry().list(Language::Es);
        if let Some(idx) = list.words.iter().position(|w| w.chars().any(|c| "áéíóú".contains(c))) {
            let accented = &list.words[idx];
            let stripped: String = accented.nfd().filter(|c| !is_combining_mark(*c)).collect();
            assert_eq!(list.lookup(&stripped), Some(idx as u16));
        }
    }

    #[test]
    fn german_lookup_tolerates_ascii_digraphs() {
        let list = registry().list(Language::De);
        if let Some(idx) = list
            .words
            .iter()
            .position(|w| w.chars().any(|c| "äöü".contains(c)))
        {
            let word = &list.words[idx];
            let digraph = word
                .replace('ä', "ae")
                .replace('ö', "oe")
                .replace('ü', "ue");
            assert_eq!(list.lookup(&digraph), Some(idx as u16));
        }
    }

    #[test]
    fn detect_language_finds_the_language_words_were_encoded_in() {
        let list = registry().list(Language::Fr);
        let words: Vec<&str> = list.words[0..16].iter().map(|s| s.as_str()).collect();
        assert_eq!(detect_language(&words), Some(Language::Fr));
    }

    #[test]
    fn closest_finds_near_misses() {
        let list = registry().list(Language::En);
        let word = list.word_at(10).to_string();
        let mut typo = word.clone();
        typo.pop();
        typo.push('x');
        let (closest, dist) = list.closest(&typo, 2).unwrap();
        assert_eq!(closest, word);
        assert!(dist <= 2);
    }
}
