// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hashing and randomness primitives shared by every other ReMemory crate.
//!
//! Nothing in this crate depends on the rest of the workspace; it exists so
//! that `sharing`, `crypto`, `archive` and `wordlists` agree on exactly one
//! digest format and exactly one source of randomness.

mod hash;
mod rng;

pub use hash::{hash, hash_eq, Sha256Hash, HASH_LEN, PREFIX};
pub use rng::random_bytes;
