// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::Language;

/// Every word list has exactly this many entries.
pub const WORD_COUNT: usize = 2048;

const EN: &str = include_str!("lists/en.txt");
const ES: &str = include_str!("lists/es.txt");
const FR: &str = include_str!("lists/fr.txt");
const DE: &str = include_str!("lists/de.txt");
const SL: &str = include_str!("lists/sl.txt");
const PT: &str = include_str!("lists/pt.txt");

const EN_HASH: &str = "sha256:d734866e30fd2814c8edc0f1962f02bd1357ca48379476c3aa66fcfde51d3bb1";
const ES_HASH: &str = "sha256:4ead548faaaacb367c1ef4174cc4576048f22a11431d9c3ade15f3f9d3cfef32";
const FR_HASH: &str = "sha256:c7c0097f207c1a41a908fa21820c69a23725512989dccf0ed64c4d1d5e453188";
const DE_HASH: &str = "sha256:c549d594f2c77915382d29dd90b8ab80064bc620f219129d3c9476466fd3d5af";
const SL_HASH: &str = "sha256:9f5ade679af30bc82d5733fd510adc8d9b5767671ea1f1836bf1d58694dac233";
const PT_HASH: &str = "sha256:0af598c1e4e9e839a3254e5b4dd2e3ed471722617241436d12422abfaf415ce9";

pub(crate) fn raw_list(lang: Language) -> &'static str {
    match lang {
        Language::En => EN,
        Language::Es => ES,
        Language::Fr => FR,
        Language::De => DE,
        Language::Sl => SL,
        Language::Pt => PT,
    }
}

pub(crate) fn declared_hash(lang: Language) -> &'static str {
    match lang {
        Language::En => EN_HASH,
        Language::Es => ES_HASH,
        Language::Fr => FR_HASH,
        Language::De => DE_HASH,
        Language::Sl => SL_HASH,
        Language::Pt => PT_HASH,
    }
}
