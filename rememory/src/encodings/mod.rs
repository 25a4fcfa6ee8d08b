// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! The four textual share encodings and the filename slugger.

pub mod compact;
pub mod filename;
pub mod long;
pub mod words;
