// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer (`pathguard-core`)
//!
//! Pure rules of the sandbox. Nothing here performs filesystem I/O.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`path_containment`] | Resolve untrusted names to paths inside the base directory |
//! | [`storage`] | `SandboxStore` trait, sample entries, store errors |
//! | [`validation`] | Optional shape checks for the `filename` request field |
//! | [`config`] | Node configuration manifest |

pub mod config;
pub mod path_containment;
pub mod storage;
pub mod validation;
