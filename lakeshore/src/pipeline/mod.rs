// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Ingestion pipeline: read → write → verify
//!
//! State machine:
//!
//! ```text
//! Idle → Reading → Writing → Verifying → Done
//!           │         │          │
//!           └─────────┴──────────┴──→ Failed(stage, cause)
//! ```

mod driver;
mod state;

pub use driver::Pipeline;
pub use state::{PipelineError, PipelineFailure, PipelineState, RunReport, Stage};
