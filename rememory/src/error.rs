// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error as DeriveError;

#[derive(Debug, DeriveError)]
pub enum Error {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    #[error("invalid share: {0}")]
    InvalidShare(String),
    #[error("only {have} of the required {needed} valid, compatible shares were presented")]
    InsufficientShares { needed: usize, have: usize },
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("archive policy violation: {0}")]
    ArchivePolicy(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest missing: neither MANIFEST.age nor an embedded copy was present")]
    ManifestMissing,
    #[error("integrity mismatch: {0}")]
    IntegrityMismatch(String),
    #[error("zip error: {0}")]
    Zip(String),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<sharing::Error> for Error {
    fn from(e: sharing::Error) -> Self {
        match e {
            sharing::Error::InvalidParams(m) => Error::InvalidParams(m),
            sharing::Error::InvalidShare(m) => Error::InvalidShare(m),
        }
    }
}

impl From<crypto::Error> for Error {
    fn from(e: crypto::Error) -> Self {
        match e {
            crypto::Error::AuthenticationFailed => Error::AuthenticationFailed,
            crypto::Error::Io(io) => Error::Io(io),
            crypto::Error::Format(m) => Error::ArchivePolicy(m),
        }
    }
}

impl From<archive::Error> for Error {
    fn from(e: archive::Error) -> Self {
        match e {
            archive::Error::Io(io) => Error::Io(io),
            other => Error::ArchivePolicy(other.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e.to_string())
    }
}

/// Extension trait that lets any fallible step prefix its error with a
/// short description of what was being attempted, per the propagation
/// policy: callers should see "verifying bundle for Alice: <cause>", not
/// a bare cause.
pub trait Context<T> {
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T> Context<T> for Result<T> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|source| Error::Context {
            context: message.into(),
            source: Box::new(source),
        })
    }
}
