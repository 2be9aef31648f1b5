// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pipeline driver
//!
//! Runs read → write → verify strictly in sequence. The first failure moves
//! the driver to `Failed(stage, cause)` and nothing else happens: no retry,
//! no rollback. Components not injected with `with_reader` /
//! `with_catalog` are built from the config when their stage starts.

use super::state::{PipelineError, PipelineFailure, PipelineState, RunReport, Stage};
use crate::catalog::{CatalogClient, SnapshotHandle};
use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::source::{open_reader, SourceReader};
use crate::verify::{Verifier, VerifyOutcome};
use crate::writer::TableWriter;
use log::{error, info};
use std::time::Instant;

pub struct Pipeline {
    config: PipelineConfig,
    reader: Option<Box<dyn SourceReader>>,
    catalog: Option<CatalogClient>,
    state: PipelineState,
    trace: Vec<PipelineState>,
    outcome: Option<Result<RunReport, PipelineFailure>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            reader: None,
            catalog: None,
            state: PipelineState::Idle,
            trace: vec![PipelineState::Idle],
            outcome: None,
        }
    }

    pub fn with_reader(mut self, reader: Box<dyn SourceReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn with_catalog(mut self, catalog: CatalogClient) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Every state entered so far, starting with `Idle`
    pub fn trace(&self) -> &[PipelineState] {
        &self.trace
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The catalog client, once the writing stage has opened it
    pub fn catalog(&self) -> Option<&CatalogClient> {
        self.catalog.as_ref()
    }

    fn enter(&mut self, next: PipelineState) {
        match &next {
            PipelineState::Failed(failure) => error!("Pipeline {} -> {}", self.state, failure),
            _ => info!("Pipeline {} -> {}", self.state, next),
        }
        self.trace.push(next.clone());
        self.state = next;
    }

    fn fail(&mut self, stage: Stage, cause: PipelineError) -> PipelineFailure {
        let failure = PipelineFailure { stage, cause };
        self.enter(PipelineState::Failed(failure.clone()));
        failure
    }

    /// Run the pipeline once. A finished pipeline returns its recorded
    /// outcome without doing any work.
    pub fn run(&mut self) -> Result<RunReport, PipelineFailure> {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        let outcome = self.execute();
        self.outcome = Some(outcome.clone());
        outcome
    }

    fn execute(&mut self) -> Result<RunReport, PipelineFailure> {
        let started = Instant::now();
        let target = self.config.target.clone();
        let preview_rows = self.config.preview_rows;

        self.enter(PipelineState::Reading);
        let dataset = match self.read() {
            Ok(dataset) => dataset,
            Err(cause) => return Err(self.fail(Stage::Reading, cause)),
        };

        self.enter(PipelineState::Writing);
        let snapshot = match self.write(&dataset) {
            Ok(snapshot) => snapshot,
            Err(cause) => return Err(self.fail(Stage::Writing, cause)),
        };

        self.enter(PipelineState::Verifying);
        let committed = match self.verify(&snapshot, &dataset) {
            Ok(committed) => committed,
            Err(cause) => return Err(self.fail(Stage::Verifying, cause)),
        };

        self.enter(PipelineState::Done);
        info!(
            "Ingested {} rows into {} version {} on ref '{}'",
            dataset.row_count(),
            target,
            snapshot.version,
            snapshot.reference
        );

        Ok(RunReport {
            snapshot,
            rows_read: dataset.row_count(),
            source_sample: dataset.sample(preview_rows),
            committed_sample: committed.sample(preview_rows),
            elapsed: started.elapsed(),
        })
    }

    fn read(&mut self) -> Result<Dataset, PipelineError> {
        let reader = match self.reader.take() {
            Some(reader) => reader,
            None => open_reader(&self.config.source)?,
        };
        let reader = self.reader.insert(reader);
        Ok(reader.read(&self.config.source.relation)?)
    }

    fn catalog_client(&mut self) -> Result<&CatalogClient, PipelineError> {
        let catalog = match self.catalog.take() {
            Some(catalog) => catalog,
            None => CatalogClient::open(&self.config.catalog)?,
        };
        Ok(self.catalog.insert(catalog))
    }

    fn write(&mut self, dataset: &Dataset) -> Result<SnapshotHandle, PipelineError> {
        let options = self.config.write;
        let target = self.config.target.clone();
        let catalog = self.catalog_client()?;
        Ok(TableWriter::with_options(catalog, options).write(&target, dataset)?)
    }

    fn verify(
        &mut self,
        snapshot: &SnapshotHandle,
        expected: &Dataset,
    ) -> Result<Dataset, PipelineError> {
        let catalog = self.catalog_client()?;
        match Verifier::new(catalog).verify_committed(snapshot, expected)? {
            (VerifyOutcome::Match, committed) => Ok(committed),
            (VerifyOutcome::Mismatch(detail), _) => Err(PipelineError::Mismatch(detail)),
        }
    }
}
