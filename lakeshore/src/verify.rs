// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Post-commit verification
//!
//! Re-reads the table through the catalog and compares schema and row count
//! with what was written. After a commit the current snapshot must also be
//! the one that commit produced. A mismatch is reported, never repaired or
//! retried.

use crate::catalog::{CatalogClient, CatalogResult, SnapshotHandle, TableIdentity};
use crate::dataset::{Dataset, Schema};
use log::{info, warn};

/// What differed between the written dataset and the committed table
#[derive(Debug, Clone, PartialEq)]
pub struct MismatchDetail {
    pub expected_schema: Schema,
    pub actual_schema: Schema,
    pub expected_rows: usize,
    pub actual_rows: usize,
    /// Version the verified commit produced, when verifying a commit
    pub committed_version: Option<u64>,
    /// Version current at the time of the read
    pub current_version: Option<u64>,
}

impl MismatchDetail {
    fn superseded(&self) -> bool {
        matches!(
            (self.committed_version, self.current_version),
            (Some(committed), Some(current)) if committed != current
        )
    }
}

impl std::fmt::Display for MismatchDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let (true, Some(committed), Some(current)) =
            (self.superseded(), self.committed_version, self.current_version)
        {
            parts.push(format!(
                "committed version {} was superseded by version {}",
                committed, current
            ));
        }
        if self.expected_schema != self.actual_schema {
            parts.push(format!(
                "schema expected {} but found {}",
                self.expected_schema, self.actual_schema
            ));
        }
        if self.expected_rows != self.actual_rows {
            parts.push(format!(
                "expected {} rows but found {}",
                self.expected_rows, self.actual_rows
            ));
        }
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
    Match,
    Mismatch(MismatchDetail),
}

impl VerifyOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, VerifyOutcome::Match)
    }
}

pub struct Verifier<'a> {
    catalog: &'a CatalogClient,
}

impl<'a> Verifier<'a> {
    pub fn new(catalog: &'a CatalogClient) -> Self {
        Self { catalog }
    }

    /// Read the current snapshot of `identity` and compare it with `expected`
    pub fn verify(&self, identity: &TableIdentity, expected: &Dataset) -> CatalogResult<VerifyOutcome> {
        self.verify_read(identity, expected).map(|(outcome, _)| outcome)
    }

    /// Like [`Verifier::verify`], also returning the table as read
    pub fn verify_read(
        &self,
        identity: &TableIdentity,
        expected: &Dataset,
    ) -> CatalogResult<(VerifyOutcome, Dataset)> {
        let actual = self.catalog.read_snapshot(identity, None)?;
        let outcome = self.compare(identity, expected, &actual);
        Ok((outcome, actual))
    }

    /// Verify the commit behind `handle`: its snapshot must still be current
    /// and match `expected`. Returns the table as read.
    pub fn verify_committed(
        &self,
        handle: &SnapshotHandle,
        expected: &Dataset,
    ) -> CatalogResult<(VerifyOutcome, Dataset)> {
        let (entry, actual) = self.catalog.read_current(&handle.identity)?;
        let outcome = self.outcome(
            &handle.identity,
            expected,
            &actual,
            Some(handle.version),
            Some(entry.version),
        );
        Ok((outcome, actual))
    }

    /// Compare an already read table with `expected`
    pub fn compare(&self, identity: &TableIdentity, expected: &Dataset, actual: &Dataset) -> VerifyOutcome {
        self.outcome(identity, expected, actual, None, None)
    }

    fn outcome(
        &self,
        identity: &TableIdentity,
        expected: &Dataset,
        actual: &Dataset,
        committed_version: Option<u64>,
        current_version: Option<u64>,
    ) -> VerifyOutcome {
        let detail = MismatchDetail {
            expected_schema: expected.schema().clone(),
            actual_schema: actual.schema().clone(),
            expected_rows: expected.row_count(),
            actual_rows: actual.row_count(),
            committed_version,
            current_version,
        };

        if !detail.superseded()
            && detail.expected_schema == detail.actual_schema
            && detail.expected_rows == detail.actual_rows
        {
            info!(
                "Verified {} on ref '{}': {} rows",
                identity,
                self.catalog.reference(),
                actual.row_count()
            );
            return VerifyOutcome::Match;
        }

        warn!("Verification of {} failed: {}", identity, detail);
        VerifyOutcome::Mismatch(detail)
    }
}
