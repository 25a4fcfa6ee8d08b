// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! The seal-time inputs and the post-seal record, persisted as a YAML
//! project file. The interactive flow that reads and writes this file
//! lives in the CLI front-end; this module only owns the data shape and
//! the load/save mechanics.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wordlists::Language;

use crate::error::{Context, Error, Result};

/// One of the N trusted recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Holder {
    /// The holder's language if set, else `fallback`.
    pub fn language_or(&self, fallback: Language) -> Language {
        self.language
            .as_deref()
            .and_then(Language::from_code)
            .unwrap_or(fallback)
    }
}

/// One holder's outcome after a seal: where their share file ended up and
/// its checksum, recorded so a later `status` run can confirm nothing
/// moved or rotted on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub holder: String,
    pub file: String,
    pub checksum: String,
}

/// The record written once a project has been sealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealRecord {
    pub sealed_at: DateTime<Utc>,
    pub manifest_checksum: String,
    /// `sha256(passphrase)`, a local sanity check only; never transmitted
    /// anywhere and never sufficient on its own to reconstruct anything.
    pub passphrase_verification: String,
    pub deliveries: Vec<DeliveryRecord>,
}

/// The seal-time inputs for a ReMemory project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub created: DateTime<Utc>,
    pub threshold: u8,
    pub anonymous: bool,
    pub default_language: String,
    pub holders: Vec<Holder>,
    pub manifest_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seal: Option<SealRecord>,
}

impl Project {
    /// Total number of holders, i.e. Shamir's `N`.
    pub fn total(&self) -> usize {
        self.holders.len()
    }

    pub fn default_language(&self) -> Language {
        Language::from_code(&self.default_language).unwrap_or(Language::En)
    }

    /// Display name for holder at 1-based `index`, honouring anonymous mode.
    pub fn holder_label(&self, index: usize) -> String {
        if self.anonymous {
            format!("Share {index}")
        } else {
            self.holders
                .get(index - 1)
                .map(|h| h.name.clone())
                .unwrap_or_else(|| format!("Share {index}"))
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(Error::from)
            .context(format!("reading project file {}", path.display()))?;
        let project: Project = serde_yaml::from_str(&text)
            .map_err(Error::from)
            .context(format!("parsing project file {}", path.display()))?;
        Ok(project)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_yaml::to_string(self)?;
        fs::write(path, text)
            .map_err(Error::from)
            .context(format!("writing project file {}", path.display()))?;
        Ok(())
    }
}
