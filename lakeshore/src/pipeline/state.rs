// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pipeline states, failures and run reports

use crate::catalog::{CatalogError, SnapshotHandle};
use crate::dataset::Dataset;
use crate::source::SourceError;
use crate::verify::MismatchDetail;
use std::time::Duration;
use thiserror::Error;

/// Stage a pipeline failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reading,
    Writing,
    Verifying,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Reading => "reading",
            Stage::Writing => "writing",
            Stage::Verifying => "verifying",
        };
        write!(f, "{}", name)
    }
}

/// Original cause of a failed run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Verification mismatch: {0}")]
    Mismatch(MismatchDetail),
}

/// Terminal failure: the stage that failed and why
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Pipeline failed while {stage}: {cause}")]
pub struct PipelineFailure {
    pub stage: Stage,
    pub cause: PipelineError,
}

/// Driver state. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Reading,
    Writing,
    Verifying,
    Done,
    Failed(PipelineFailure),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "Idle"),
            PipelineState::Reading => write!(f, "Reading"),
            PipelineState::Writing => write!(f, "Writing"),
            PipelineState::Verifying => write!(f, "Verifying"),
            PipelineState::Done => write!(f, "Done"),
            PipelineState::Failed(failure) => write!(f, "Failed({})", failure.stage),
        }
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub snapshot: SnapshotHandle,
    pub rows_read: usize,
    /// First rows of the source relation
    pub source_sample: Dataset,
    /// First rows of the table as re-read after the commit
    pub committed_sample: Dataset,
    pub elapsed: Duration,
}
