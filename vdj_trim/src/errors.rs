// Copyright (c) 2024 10x Genomics, Inc. All rights reserved.
//! Typed failures of the trimming engine.

use serde::Serialize;
use strum_macros::{Display, EnumIter};

/// The germline segment a resolver works on.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, EnumIter,
)]
pub enum Segment {
    /// Variable segment, trimmed on the right.
    V,
    /// Joining segment, trimmed on the left.
    J,
}

/// Why a resolver could not trim a segment.
///
/// These are expected per-record outcomes. The orchestrator routes them to the quarantine
/// stream; they never abort a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
pub enum TrimFailure {
    #[error("no anchor-starting overlap between the V tail and the CDR3 passed either tier")]
    NoQualifyingAnchorFound,

    #[error(
        "no framework motif pattern matched in full (longest partial match was {best_match_len})"
    )]
    NoQualifyingMotifFound { best_match_len: usize },

    #[error("the {segment} germline sequence is missing (upstream lookup failed)")]
    UpstreamLookupMissing { segment: Segment },
}

impl TrimFailure {
    /// Stable short tag written to the quarantine output.
    pub fn tag(&self) -> &'static str {
        match self {
            TrimFailure::NoQualifyingAnchorFound => "no_qualifying_anchor",
            TrimFailure::NoQualifyingMotifFound { .. } => "no_qualifying_motif",
            TrimFailure::UpstreamLookupMissing { .. } => "upstream_lookup_missing",
        }
    }
}

/// Problems with a [`crate::TrimConfig`], reported before any record is processed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be at least {min}, but got {value}")]
    TooSmall {
        name: &'static str,
        value: usize,
        min: usize,
    },

    #[error(
        "{name} = {value} cannot be represented in half-point units. \
         Scores must be multiples of 0.5."
    )]
    UnrepresentableScore { name: &'static str, value: f64 },

    #[error(
        "{name}: gap_open ({gap_open}) scores better than gap_extend ({gap_extend}). \
         Opening a gap may not be cheaper than extending one, and neither may be positive."
    )]
    InvalidGapScores {
        name: &'static str,
        gap_open: f64,
        gap_extend: f64,
    },

    #[error("alignment_score_threshold must be a finite number, but got {0}")]
    NonFiniteThreshold(f64),

    #[error("motif_patterns must contain at least one pattern")]
    NoMotifPatterns,

    #[error(
        "motif pattern '{pattern}' is invalid. Patterns must be non-empty strings of the \
         digits 0-9."
    )]
    InvalidMotifPattern { pattern: String },

    #[error("residue_to_motif_value maps '{residue}' to {value}, but values must be 0-9")]
    InvalidMotifValue { residue: char, value: u8 },

    #[error("{name} residue '{residue}' is not an ASCII character")]
    NonAsciiResidue { name: &'static str, residue: char },

    #[error("failed to parse the trimming configuration")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read the trimming configuration from {path}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}
