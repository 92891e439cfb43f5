// Copyright (c) 2024 10x Genomics, Inc. All rights reserved.

// This file finds where a V segment runs into its CDR3. The CDR3 begins with the conserved
// cysteine that also closes FWR3 of the V segment, so the tail of the V segment and the start
// of the CDR3 share an anchor-starting overlap. Everything from that overlap onward is removed
// from the V segment; the CDR3 supplies it in the assembled sequence.
//
// Only the last tail_window_size residues of the V segment are searched, which keeps repeated
// motifs deep in the framework regions from being mistaken for the junction.
//
// There are two tiers:
// 1. exact: the longest common substring of the window and the CDR3 that starts with the
//    anchor and is at least min_exact_match_length long;
// 2. alignment: a global alignment of the window against the CDR3, taking the window from the
//    first aligned residue onward. If that residue is not the anchor, the start may be moved
//    forward by up to max_anchor_shift residues onto an anchor, provided the dropped residues
//    do not change the probe-scoring alignment score against the CDR3.

use crate::align::{first_aligned_x, global_align, global_score, ScaledScoring};
use crate::config::{SplitPolicy, TrimConfig, SCORE_SCALE};
use crate::errors::{Segment, TrimFailure};
use crate::matching::longest_anchored_match;
use crate::types::{AnchorTier, TrimResult, VTrim};
use log::debug;

/// An overlap found in the tail window: `window[start..end]`.
#[derive(Debug, PartialEq, Eq)]
struct Overlap {
    start: usize,
    end: usize,
    tier: AnchorTier,
}

fn exact_overlap(window: &[u8], cdr3: &[u8], config: &TrimConfig) -> Option<Overlap> {
    let block = longest_anchored_match(window, cdr3, config.anchor())?;
    if block.len < config.min_exact_match_length {
        return None;
    }
    Some(Overlap {
        start: block.a_start,
        end: block.a_start + block.len,
        tier: AnchorTier::Exact,
    })
}

fn aligned_overlap(window: &[u8], cdr3: &[u8], config: &TrimConfig) -> Option<Overlap> {
    let anchor = config.anchor();
    let alignment = global_align(window, cdr3, &ScaledScoring::from(&config.alignment_scoring));
    let score = alignment.score;
    if f64::from(score) / SCORE_SCALE < config.alignment_score_threshold {
        debug!(
            "alignment score {} is below threshold {}",
            f64::from(score) / SCORE_SCALE,
            config.alignment_score_threshold
        );
        return None;
    }
    let start = first_aligned_x(&alignment)?;
    if window[start] == anchor {
        return Some(Overlap {
            start,
            end: window.len(),
            tier: AnchorTier::Alignment { score, shift: 0 },
        });
    }

    // The aligner may pull in a residue or two ahead of the anchor.
    let probe = ScaledScoring::from(&config.probe_scoring);
    let unshifted = global_score(&window[start..], cdr3, &probe);
    (1..=config.max_anchor_shift)
        .map(|shift| (shift, start + shift))
        .take_while(|&(_, pos)| pos < window.len())
        .find(|&(_, pos)| {
            window[pos] == anchor && global_score(&window[pos..], cdr3, &probe) == unshifted
        })
        .map(|(shift, pos)| Overlap {
            start: pos,
            end: window.len(),
            tier: AnchorTier::Alignment { score, shift },
        })
}

/// Position in `seq` at which to cut off `overlap`.
///
/// Occurrences are found left to right and do not overlap one another, so the last occurrence
/// of `CACA` in `XCACACA` starts at 1.
fn split_point(seq: &[u8], overlap: &[u8], policy: SplitPolicy) -> Option<usize> {
    let n = overlap.len();
    let next_hit = |from: usize| {
        seq.get(from..)?
            .windows(n)
            .position(|w| w == overlap)
            .map(|pos| from + pos)
    };
    let mut hits = std::iter::successors(next_hit(0), |&hit| next_hit(hit + n));
    match policy {
        SplitPolicy::FirstOccurrence => hits.next(),
        SplitPolicy::LastOccurrence => hits.last(),
    }
}

/// Trim a V segment at its junction with `cdr3`.
pub fn resolve_v(v_segment: &str, cdr3: &str, config: &TrimConfig) -> TrimResult<VTrim> {
    if config.is_missing(v_segment) {
        return Err(TrimFailure::UpstreamLookupMissing {
            segment: Segment::V,
        });
    }
    if cdr3.is_empty() {
        return Err(TrimFailure::NoQualifyingAnchorFound);
    }
    let v = v_segment.as_bytes();
    let window_start = v.len().saturating_sub(config.tail_window_size);
    let window = &v[window_start..];
    let cdr3 = cdr3.as_bytes();

    let overlap = exact_overlap(window, cdr3, config)
        .or_else(|| aligned_overlap(window, cdr3, config))
        .ok_or(TrimFailure::NoQualifyingAnchorFound)?;
    let matched = &window[overlap.start..overlap.end];
    let cut = split_point(v, matched, config.split_policy).unwrap_or(window_start + overlap.start);
    debug!(
        "V overlap {} via {:?}, cut at {cut}",
        String::from_utf8_lossy(matched),
        overlap.tier
    );

    // None only if the anchor is not a character boundary, which an ASCII anchor cannot produce.
    let trimmed = v_segment
        .get(..cut)
        .ok_or(TrimFailure::NoQualifyingAnchorFound)?;
    Ok(VTrim {
        trimmed: trimmed.to_string(),
        overlap: String::from_utf8_lossy(matched).into_owned(),
        tier: overlap.tier,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn trim(v: &str, cdr3: &str) -> TrimResult<VTrim> {
        resolve_v(v, cdr3, &TrimConfig::default())
    }

    #[test]
    fn exact_overlap_is_removed() {
        let v = trim("MKLTVAVYYCASS", "CASSLKTGELFF").unwrap();
        assert_eq!(
            v,
            VTrim {
                trimmed: "MKLTVAVYY".to_string(),
                overlap: "CASS".to_string(),
                tier: AnchorTier::Exact,
            }
        );
    }

    #[test]
    fn exact_overlap_at_end_of_long_v() {
        let v = trim("EVQLLESGGGLVQPGGSXXXCASS", "CASSLKT").unwrap();
        assert_eq!(v.trimmed, "EVQLLESGGGLVQPGGSXXX");
        assert_eq!(v.overlap, "CASS");
    }

    #[test]
    fn only_the_tail_window_is_searched() {
        // The head of V shares all of CASSLKT with the CDR3, but lies outside the window.
        let v = format!("CASSLKT{}YYCASQ", "A".repeat(20));
        let first = trim(&v, "CASSLKT").unwrap();
        assert_eq!(first.overlap, "CAS");
        assert_eq!(first.trimmed, "");

        let config = TrimConfig {
            split_policy: SplitPolicy::LastOccurrence,
            ..TrimConfig::default()
        };
        let last = resolve_v(&v, "CASSLKT", &config).unwrap();
        assert_eq!(last.trimmed, format!("CASSLKT{}YY", "A".repeat(20)));
    }

    #[test]
    fn short_overlap_falls_through_to_alignment() {
        // The anchored exact overlap is just "C"; the alignment gaps GGAVYY, matches C,
        // gaps T and matches ASSLK.
        let v = trim("GGAVYYCASSLK", "CTASSLKT").unwrap();
        assert_eq!(v.trimmed, "GGAVYY");
        assert_eq!(v.overlap, "CASSLK");
        assert_eq!(v.tier, AnchorTier::Alignment { score: 7, shift: 0 });
    }

    #[test]
    fn alignment_below_threshold_fails() {
        let config = TrimConfig {
            alignment_score_threshold: 5.0,
            ..TrimConfig::default()
        };
        assert_eq!(
            resolve_v("GGAVYYCASSLK", "CTASSLKT", &config),
            Err(TrimFailure::NoQualifyingAnchorFound)
        );
    }

    #[test]
    fn longer_minimum_rejects_short_exact_overlap() {
        // CASS is too short for the exact tier, and aligning it means gapping nine V residues
        // and eight CDR3 residues, which scores below zero.
        let config = TrimConfig {
            min_exact_match_length: 5,
            ..TrimConfig::default()
        };
        assert_eq!(
            resolve_v("MKLTVAVYYCASS", "CASSLKTGELFF", &config),
            Err(TrimFailure::NoQualifyingAnchorFound)
        );
    }

    #[test]
    fn early_alignment_start_is_shifted_onto_anchor() {
        // With a five residue window the aligner pairs R with Q, one residue ahead of the
        // anchor. Dropping R leaves the free-gap score unchanged, so the start moves onto C.
        let config = TrimConfig {
            tail_window_size: 5,
            ..TrimConfig::default()
        };
        let v = resolve_v("EVQLVESGGGRCASS", "QCTASS", &config).unwrap();
        assert_eq!(v.trimmed, "EVQLVESGGGR");
        assert_eq!(v.overlap, "CASS");
        assert_eq!(v.tier, AnchorTier::Alignment { score: 10, shift: 1 });

        let no_shift = TrimConfig {
            max_anchor_shift: 0,
            ..config
        };
        assert_eq!(
            resolve_v("EVQLVESGGGRCASS", "QCTASS", &no_shift),
            Err(TrimFailure::NoQualifyingAnchorFound)
        );
    }

    #[test]
    fn shift_rejected_when_dropped_residue_scores() {
        // A matches the first CDR3 residue, so dropping it lowers the probe score.
        let config = TrimConfig {
            tail_window_size: 5,
            ..TrimConfig::default()
        };
        assert_eq!(
            resolve_v("EVQLVESGGGACASS", "ACTASS", &config),
            Err(TrimFailure::NoQualifyingAnchorFound)
        );
    }

    #[test]
    fn last_occurrence_does_not_count_overlapping_hits() {
        let config = TrimConfig {
            split_policy: SplitPolicy::LastOccurrence,
            ..TrimConfig::default()
        };
        let v = resolve_v("XCACACA", "CACAY", &config).unwrap();
        assert_eq!(v.overlap, "CACA");
        assert_eq!(v.trimmed, "X");
    }

    #[test]
    fn doubled_germline_anchor_keeps_its_first_copy() {
        // The first C is a germline residue ahead of the junction, so it stays.
        let v = trim("QVQLVAVYYCCASS", "CASSLKT").unwrap();
        assert_eq!(v.overlap, "CASS");
        assert_eq!(v.trimmed, "QVQLVAVYYC");
    }

    #[test]
    fn non_ascii_anchor_never_splits_a_character() {
        // Not a valid configuration; the anchor byte is a UTF-8 continuation byte.
        let config = TrimConfig {
            anchor_residue: '\u{183}',
            ..TrimConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(
            resolve_v("AA\u{e9}\u{183}BB", "\u{183}BB", &config),
            Err(TrimFailure::NoQualifyingAnchorFound)
        );
    }

    #[test]
    fn no_anchor_anywhere() {
        assert_eq!(
            trim("QQQQQQQQQQQQ", "CASSLKT"),
            Err(TrimFailure::NoQualifyingAnchorFound)
        );
    }

    #[test]
    fn empty_cdr3() {
        assert_eq!(
            trim("MKLTVAVYYCASS", ""),
            Err(TrimFailure::NoQualifyingAnchorFound)
        );
    }

    #[test]
    fn missing_v() {
        for v in ["", "NA"] {
            assert_eq!(
                trim(v, "CASSLKT"),
                Err(TrimFailure::UpstreamLookupMissing {
                    segment: Segment::V
                })
            );
        }
    }

    #[test]
    fn custom_anchor() {
        let config = TrimConfig {
            anchor_residue: 'W',
            ..TrimConfig::default()
        };
        let v = resolve_v("AAAYYWGSS", "WGSSLK", &config).unwrap();
        assert_eq!(v.trimmed, "AAAYY");
    }

    #[test]
    fn split_point_policies() {
        assert_eq!(
            split_point(b"CASXCASY", b"CAS", SplitPolicy::FirstOccurrence),
            Some(0)
        );
        assert_eq!(
            split_point(b"CASXCASY", b"CAS", SplitPolicy::LastOccurrence),
            Some(4)
        );
        assert_eq!(
            split_point(b"XCACACA", b"CACA", SplitPolicy::LastOccurrence),
            Some(1)
        );
        assert_eq!(
            split_point(b"CACACACA", b"CACA", SplitPolicy::LastOccurrence),
            Some(4)
        );
        assert_eq!(split_point(b"AAAA", b"C", SplitPolicy::FirstOccurrence), None);
        assert_eq!(split_point(b"AAAA", b"C", SplitPolicy::LastOccurrence), None);
    }
}
