// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`pathguard-core`)
//!
//! HTTP surface that translates requests into application service calls.
//! Containment, existence checks and reads all happen in
//! `crate::application`; routes only shape input and map outcomes.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Read, provisioning and health endpoints |

pub mod api;
