// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

pub fn bytestring() -> Vec<u8> {
    let s = if rand::random::<u8>() % 4 == 0 {
        0
    } else {
        rand::random::<usize>() % 4096
    };

    let mut bs = Vec::with_capacity(s);
    for _ in 0..s {
        bs.push(rand::random());
    }
    bs
}

pub fn non_empty_bytestring() -> Vec<u8> {
    let s = (rand::random::<usize>() % 4096) + 1;
    let mut bs = Vec::with_capacity(s);
    for _ in 0..s {
        bs.push(rand::random());
    }
    bs
}

pub fn holder_name() -> String {
    const NAMES: &[&str] = &["Alice", "Bob", "Carol", "David", "Eve", "José", "Bob Smith"];
    NAMES[rand::random::<usize>() % NAMES.len()].to_string()
}

/// A scratch directory tree with a few files and a nested subdirectory,
/// suitable as the manifest root passed to `archive::build`.
pub fn manifest_tree() -> (tempfile::TempDir, PathBuf) {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let root = tmp.path().join("manifest");
    write(&root.join("secrets.txt"), b"hunter2");
    write(&root.join("notes.md"), b"hi");
    write(&root.join("nested/deep.txt"), b"deep secret");
    (tmp, root)
}

fn write(path: &Path, contents: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).expect("create parent dir");
    std::fs::write(path, contents).expect("write fixture file");
}
