// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the pathguard CLI

pub mod config;
pub mod files;

pub use self::config::ConfigCommand;
pub use self::files::FilesCommand;
