// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! Deterministic tar+gzip build and hardened extraction.
//!
//! `build` walks a directory and produces a gzip-compressed tar with
//! entries ordered by file name so that sealing the same tree twice
//! produces byte-identical archives. `extract` reverses that, refusing
//! any entry that would escape its destination or blow past a size
//! budget.

use std::collections::HashSet;
use std::fs;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error as DeriveError;

#[derive(Debug, DeriveError)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("entry {entry:?} exceeds the per-file size limit of {limit} bytes")]
    FileTooLarge { entry: String, limit: u64 },
    #[error("archive exceeds the aggregate size limit of {limit} bytes")]
    TotalTooLarge { limit: u64 },
    #[error("entry {0:?} escapes the destination directory")]
    PathEscape(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Size limits enforced while extracting an archive.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_file_size: u64,
    pub max_total_size: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: 200 * 1024 * 1024,
            max_total_size: 512 * 1024 * 1024,
        }
    }
}

/// How strictly extraction validates entry paths.
///
/// Extracting to a real destination directory cleans the entry's path and
/// checks it still resolves under that root; the in-memory path used by
/// the recovery web asset has no root to resolve against and refuses any
/// `..` segment outright instead. The two are not interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPolicy {
    /// Reject only entries whose cleaned path resolves outside the root.
    CleanedDescendant,
    /// Reject any entry containing a `..` path segment at all.
    RejectParentSegments,
}

/// One in-memory archive member, used by the recovery (no-filesystem) path.
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// Build a gzip-compressed tar of `source_root`.
///
/// Entry paths are rooted at `source_root`'s own name, so extracting the
/// result recreates `source_root` as a direct child of the destination.
/// Symlinks and other non-regular entries are skipped and reported as
/// warnings rather than causing a hard failure.
pub fn build(source_root: &Path) -> Result<(Vec<u8>, Vec<String>)> {
    let root_name = source_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());

    let gz = GzEncoder::new(Vec::new(), Compression::default());
    let mut tar_builder = tar::Builder::new(gz);
    let mut warnings = Vec::new();

    let mut entries: Vec<PathBuf> = walkdir::WalkDir::new(source_root)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.path().to_path_buf())
        .collect();
    entries.sort();

    for path in &entries {
        let relative = path.strip_prefix(source_root).unwrap_or(Path::new(""));
        let archive_path = if relative.as_os_str().is_empty() {
            PathBuf::from(&root_name)
        } else {
            Path::new(&root_name).join(relative)
        };

        let metadata = fs::symlink_metadata(path)?;
        if metadata.file_type().is_symlink() {
            warnings.push(format!("skipped symlink {}", path.display()));
            continue;
        }
        if metadata.is_dir() {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Directory);
            header.set_mode(mode_of(&metadata) & 0o777);
            header.set_size(0);
            header.set_mtime(0);
            let mut name = archive_path.to_string_lossy().into_owned();
            if !name.ends_with('/') {
                name.push('/');
            }
            header.set_cksum();
            tar_builder.append_data(&mut header, &name, std::io::empty())?;
        } else if metadata.is_file() {
            let mut file = fs::File::open(path)?;
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Regular);
            header.set_mode(mode_of(&metadata) & 0o777);
            header.set_size(metadata.len());
            header.set_mtime(0);
            header.set_cksum();
            tar_builder.append_data(&mut header, &archive_path, &mut file)?;
        } else {
            warnings.push(format!(
                "skipped special file {} (not a regular file or directory)",
                path.display()
            ));
        }
    }

    let gz = tar_builder.into_inner()?;
    let bytes = gz.finish()?;
    Ok((bytes, warnings))
}

#[cfg(unix)]
fn mode_of(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn mode_of(_metadata: &fs::Metadata) -> u32 {
    0o755
}

/// Extract a gzip-compressed tar read from `src` under `dest_root`.
///
/// Returns the path of the archive's root directory under `dest_root`
/// together with any warnings collected along the way.
pub fn extract<R: Read>(
    src: R,
    dest_root: &Path,
    limits: Limits,
    policy: PathPolicy,
) -> Result<(PathBuf, Vec<String>)> {
    fs::create_dir_all(dest_root)?;
    let gz = flate2::read::GzDecoder::new(src);
    let mut archive = tar::Archive::new(gz);
    let mut warnings = Vec::new();
    let mut total: u64 = 0;
    let mut root_dir: Option<PathBuf> = None;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_type = entry.header().entry_type();
        let raw_path = entry.path()?.into_owned();
        let name = raw_path.to_string_lossy().into_owned();

        if !entry_type.is_file() && !entry_type.is_dir() {
            warnings.push(format!("skipped non-regular entry {name:?}"));
            continue;
        }

        let dest_path = resolve_destination(dest_root, &raw_path, policy)
            .ok_or_else(|| Error::PathEscape(name.clone()))?;

        if root_dir.is_none() {
            if let Some(first) = raw_path.components().next() {
                root_dir = Some(dest_root.join(first.as_os_str()));
            }
        }

        if entry_type.is_dir() {
            let mode = entry.header().mode().unwrap_or(0o755) & 0o777;
            fs::create_dir_all(&dest_path)?;
            set_mode(&dest_path, mode);
            continue;
        }

        let size = entry.header().size()?;
        if size > limits.max_file_size {
            return Err(Error::FileTooLarge {
                entry: name,
                limit: limits.max_file_size,
            });
        }
        total += size;
        if total > limits.max_total_size {
            return Err(Error::TotalTooLarge {
                limit: limits.max_total_size,
            });
        }

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&dest_path)?;
        std::io::copy(&mut entry, &mut out)?;
        let mode = entry.header().mode().unwrap_or(0o666) & 0o666;
        set_mode(&dest_path, mode);
    }

    Ok((
        root_dir.unwrap_or_else(|| dest_root.to_path_buf()),
        warnings,
    ))
}

/// Extract a gzip-compressed tar held entirely in memory.
///
/// Always uses [`PathPolicy::RejectParentSegments`]: this path feeds the
/// recovery web asset, which has no filesystem to resolve paths against.
pub fn extract_tar_gz(bytes: &[u8]) -> Result<Vec<MemoryEntry>> {
    let gz = flate2::read::GzDecoder::new(bytes);
    let mut archive = tar::Archive::new(gz);
    let mut out = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.into_owned();
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(Error::PathEscape(path.to_string_lossy().into_owned()));
        }
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        out.push(MemoryEntry {
            name: path.to_string_lossy().into_owned(),
            data,
        });
    }
    Ok(out)
}

fn resolve_destination(dest_root: &Path, entry_path: &Path, policy: PathPolicy) -> Option<PathBuf> {
    match policy {
        PathPolicy::RejectParentSegments => {
            if entry_path
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::RootDir))
            {
                return None;
            }
            Some(dest_root.join(entry_path))
        }
        PathPolicy::CleanedDescendant => {
            let mut cleaned = PathBuf::new();
            for component in entry_path.components() {
                match component {
                    Component::Normal(part) => cleaned.push(part),
                    Component::ParentDir => {
                        cleaned.pop();
                    }
                    Component::CurDir => {}
                    Component::RootDir | Component::Prefix(_) => return None,
                }
            }
            let joined = dest_root.join(&cleaned);
            let dest_root_abs = dest_root.to_path_buf();
            if joined.starts_with(&dest_root_abs) && joined != dest_root_abs {
                Some(joined)
            } else {
                None
            }
        }
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(mode));
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn write_file(path: &Path, contents: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn build_then_extract_round_trips_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("manifest");
        write_file(&source.join("secrets.txt"), b"hunter2");
        write_file(&source.join("notes.md"), b"hi");
        write_file(&source.join("nested/deep.txt"), b"deep");

        let (bytes, warnings) = build(&source).unwrap();
        assert!(warnings.is_empty());

        let dest = tmp.path().join("out");
        let (root, warnings) = extract(
            &bytes[..],
            &dest,
            Limits::default(),
            PathPolicy::CleanedDescendant,
        )
        .unwrap();
        assert!(warnings.is_empty());

        assert_eq!(fs::read(root.join("secrets.txt")).unwrap(), b"hunter2");
        assert_eq!(fs::read(root.join("notes.md")).unwrap(), b"hi");
        assert_eq!(fs::read(root.join("nested/deep.txt")).unwrap(), b"deep");
    }

    #[test]
    fn build_is_deterministic() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("manifest");
        write_file(&source.join("a.txt"), b"a");
        write_file(&source.join("b.txt"), b"b");

        let (first, _) = build(&source).unwrap();
        let (second, _) = build(&source).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn build_skips_symlinks_with_a_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("manifest");
        write_file(&source.join("real.txt"), b"real");
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(
                source.join("real.txt"),
                source.join("link.txt"),
            )
            .unwrap();
            let (_, warnings) = build(&source).unwrap();
            assert_eq!(warnings.len(), 1);
        }
    }

    #[test]
    fn in_memory_extraction_rejects_parent_segments() {
        let gz = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(gz);
        let mut header = tar::Header::new_gnu();
        header.set_size(3);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "../etc/passwd", &b"pwn"[..])
            .unwrap();
        let gz = builder.into_inner().unwrap();
        let bytes = gz.finish().unwrap();

        let err = extract_tar_gz(&bytes).unwrap_err();
        assert!(matches!(err, Error::PathEscape(_)));
    }

    #[test]
    fn on_disk_extraction_rejects_escaping_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let gz = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(gz);
        let mut header = tar::Header::new_gnu();
        header.set_size(3);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "../../evil.txt", &b"pwn"[..])
            .unwrap();
        let gz = builder.into_inner().unwrap();
        let bytes = gz.finish().unwrap();

        let dest = tmp.path().join("dest");
        let err = extract(
            &bytes[..],
            &dest,
            Limits::default(),
            PathPolicy::CleanedDescendant,
        )
        .unwrap_err();
        assert!(matches!(err, Error::PathEscape(_)));
    }

    #[test]
    fn extraction_enforces_per_file_size_limit() {
        let tmp = tempfile::tempdir().unwrap();
        let gz = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(gz);
        let mut header = tar::Header::new_gnu();
        header.set_size(10);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "big.bin", &[0u8; 10][..])
            .unwrap();
        let gz = builder.into_inner().unwrap();
        let bytes = gz.finish().unwrap();

        let dest = tmp.path().join("dest");
        let limits = Limits {
            max_file_size: 5,
            max_total_size: 1024,
        };
        let err = extract(&bytes[..], &dest, limits, PathPolicy::CleanedDescendant).unwrap_err();
        assert!(matches!(err, Error::FileTooLarge { .. }));
    }

    #[test]
    fn extracted_file_set_matches_source() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("manifest");
        write_file(&source.join("one.txt"), b"1");
        write_file(&source.join("dir/two.txt"), b"2");

        let (bytes, _) = build(&source).unwrap();
        let dest = tmp.path().join("out");
        let (root, _) = extract(
            &bytes[..],
            &dest,
            Limits::default(),
            PathPolicy::CleanedDescendant,
        )
        .unwrap();

        let found: BTreeSet<String> = walkdir::WalkDir::new(&root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                e.path()
                    .strip_prefix(&root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(
            found,
            BTreeSet::from(["one.txt".to_string(), "dir/two.txt".to_string()])
        );
    }
}
