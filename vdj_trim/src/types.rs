// Copyright (c) 2024 10x Genomics, Inc. All rights reserved.
use crate::errors::{Segment, TrimFailure};
use itertools::Itertools;
use serde::Serialize;

/// Outcome of one resolver on one record.
pub type TrimResult<T> = Result<T, TrimFailure>;

/// One unit of work: the three sequences the engine reads, plus columns it carries along.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct JunctionRecord {
    pub v_segment: String,
    pub cdr3: String,
    pub j_segment: String,
    /// Pass-through (column, value) pairs, in input column order.
    pub metadata: Vec<(String, String)>,
}

impl JunctionRecord {
    pub fn new(
        v_segment: impl Into<String>,
        cdr3: impl Into<String>,
        j_segment: impl Into<String>,
    ) -> Self {
        JunctionRecord {
            v_segment: v_segment.into(),
            cdr3: cdr3.into(),
            j_segment: j_segment.into(),
            metadata: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Vec<(String, String)>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Value of a pass-through column.
    pub fn meta(&self, column: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

/// Which tier of the V resolver produced the overlap.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum AnchorTier {
    Exact,
    /// `score` is in natural units times two; `shift` is how far the aligned start was moved
    /// forward onto the anchor.
    Alignment { score: i32, shift: usize },
}

/// A trimmed V segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VTrim {
    /// V residues kept, i.e. everything before the junction overlap.
    pub trimmed: String,
    /// The anchor-starting overlap shared with the CDR3.
    pub overlap: String,
    pub tier: AnchorTier,
}

/// A trimmed J segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JTrim {
    /// J residues kept, starting one past the motif anchor.
    pub trimmed: String,
    /// Index of the motif anchor residue in the J segment.
    pub motif_start: usize,
    /// The motif pattern that matched.
    pub pattern: String,
}

/// A record whose V and J segments were both trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssembledRecord {
    pub record: JunctionRecord,
    pub v: VTrim,
    pub j: JTrim,
    /// `v.trimmed + cdr3 + j.trimmed`
    pub full_sequence: String,
}

impl AssembledRecord {
    pub fn v_trimmed(&self) -> &str {
        &self.v.trimmed
    }

    pub fn j_trimmed(&self) -> &str {
        &self.j.trimmed
    }
}

/// A record set aside because at least one resolver failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarantinedRecord {
    pub record: JunctionRecord,
    /// One entry per failing resolver, V before J.
    pub failures: Vec<(Segment, TrimFailure)>,
}

impl QuarantinedRecord {
    /// Failure tags as `segment:tag`, joined by `;`.
    pub fn reason(&self) -> String {
        self.failures
            .iter()
            .map(|(segment, failure)| format!("{segment}:{}", failure.tag()))
            .join(";")
    }
}
