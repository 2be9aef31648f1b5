// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for Lakeshore
//!
//! Runs ingestion pipelines and inspects the catalog they commit to:
//! tables, their version history, and refs.

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{Cli, Commands};
pub use handlers::{handle_branch, handle_history, handle_run, handle_show, handle_tables};
