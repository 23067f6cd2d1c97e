// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Pathguard core
//!
//! Contained file reads for untrusted callers: a path containment resolver,
//! a filesystem-backed sandbox store, and the HTTP surface over both.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain rules, application services, infrastructure and presentation

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
