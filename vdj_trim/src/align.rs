// Copyright (c) 2024 10x Genomics, Inc. All rights reserved.
use crate::config::{AlignmentScoring, SCORE_SCALE};
use bio::alignment::pairwise::{Aligner, Scoring};
use bio::alignment::{Alignment, AlignmentOperation};

/// Integer version of an [`AlignmentScoring`], in half-point units and in the
/// `gap_open + n * gap_extend` convention used by `bio`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct ScaledScoring {
    match_score: i32,
    mismatch_score: i32,
    gap_open: i32,
    gap_extend: i32,
}

impl From<&AlignmentScoring> for ScaledScoring {
    /// Exact for scorings that pass [`crate::TrimConfig::validate`]; anything else is rounded
    /// and clamped so that bio's preconditions hold.
    fn from(scoring: &AlignmentScoring) -> Self {
        let scale = |v: f64| (v * SCORE_SCALE).round() as i32;
        let gap_extend = scale(scoring.gap_extend).min(0);
        ScaledScoring {
            match_score: scale(scoring.match_score),
            mismatch_score: scale(scoring.mismatch_score),
            // bio charges gap_open on top of the first extension.
            gap_open: (scale(scoring.gap_open) - gap_extend).min(0),
            gap_extend,
        }
    }
}

/// Return the global alignment of x to y. Scores are in half-point units.
///
/// bio's traceback visits operations in a fixed order, so among co-optimal alignments the same
/// one is always returned for the same inputs.
pub(crate) fn global_align(x: &[u8], y: &[u8], scoring: &ScaledScoring) -> Alignment {
    let scoring = Scoring::from_scores(
        scoring.gap_open,
        scoring.gap_extend,
        scoring.match_score,
        scoring.mismatch_score,
    );
    let mut aligner = Aligner::with_capacity_and_scoring(x.len(), y.len(), scoring);
    aligner.global(x, y)
}

/// Score of the global alignment of x to y, in half-point units.
pub(crate) fn global_score(x: &[u8], y: &[u8], scoring: &ScaledScoring) -> i32 {
    global_align(x, y, scoring).score
}

/// Position in x of the first residue that is aligned (as a match or a substitution) to a
/// residue of y.
pub(crate) fn first_aligned_x(alignment: &Alignment) -> Option<usize> {
    let mut x = alignment.xstart;
    for op in &alignment.operations {
        match op {
            AlignmentOperation::Match | AlignmentOperation::Subst => return Some(x),
            AlignmentOperation::Ins => x += 1,
            AlignmentOperation::Xclip(n) => x += n,
            AlignmentOperation::Del | AlignmentOperation::Yclip(_) => {}
        }
    }
    None
}
