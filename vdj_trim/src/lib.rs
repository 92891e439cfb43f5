// Copyright (c) 2024 10x Genomics, Inc. All rights reserved.

//! Trimming of germline V and J amino-acid segments at their junctions with a CDR3, and
//! assembly of the trimmed pieces into one V-CDR3-J sequence.
//!
//! The crate does no I/O. Records come in as [`JunctionRecord`]s and go out either as
//! [`AssembledRecord`]s or as [`QuarantinedRecord`]s carrying typed [`TrimFailure`]s.

mod align;
pub mod assemble;
pub mod config;
pub mod errors;
pub mod j_boundary;
pub mod matching;
pub mod types;
pub mod v_boundary;

pub use assemble::{assemble, assemble_record, AssemblyOutput, AssemblySummary};
pub use config::{AlignmentScoring, ScoringPreset, SplitPolicy, TrimConfig};
pub use errors::{ConfigError, Segment, TrimFailure};
pub use j_boundary::resolve_j;
pub use types::{
    AnchorTier, AssembledRecord, JTrim, JunctionRecord, QuarantinedRecord, TrimResult, VTrim,
};
pub use v_boundary::resolve_v;
