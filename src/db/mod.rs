// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Store layer.

pub mod store;

pub use store::{collections, Db, FeedbackCursor};
