// Copyright (c) 2024 10x Genomics, Inc. All rights reserved.

// This file locates the conserved F/W-G-X-G framework motif at the start of FWR4 in a J segment
// and trims the segment so that it begins one residue after the motif anchor.
//
// The search does not look at residues directly. Each residue is first mapped to a digit
// (by default F and W to 2, G to 1, everything else to 0) and the motif is expressed as a digit
// pattern over that alphabet: 2101 is F/W G x G, and 2111 tolerates a G in the x position.

use crate::config::TrimConfig;
use crate::errors::{Segment, TrimFailure};
use crate::matching::longest_match;
use crate::types::{JTrim, TrimResult};
use log::debug;
use std::collections::BTreeMap;

/// Maps residues to motif digits.
struct MotifEncoder {
    /// ASCII digit for each ASCII residue.
    digits: [u8; 128],
}

impl MotifEncoder {
    fn new(table: &BTreeMap<char, u8>) -> Self {
        let mut digits = [b'0'; 128];
        for (&residue, &value) in table {
            if residue.is_ascii() && value <= 9 {
                digits[residue as usize] = b'0' + value;
            }
        }
        MotifEncoder { digits }
    }

    /// Encode a sequence byte by byte. Bytes outside ASCII encode to 0.
    fn encode(&self, seq: &[u8]) -> Vec<u8> {
        seq.iter()
            .map(|&b| self.digits.get(b as usize).copied().unwrap_or(b'0'))
            .collect()
    }
}

/// Result of searching for one pattern: the motif start, or the length of the longest
/// partial match.
type MatchResult = Result<usize, usize>;

fn find_pattern(digits: &[u8], pattern: &str) -> MatchResult {
    let block = longest_match(digits, pattern.as_bytes());
    if block.len == pattern.len() {
        Ok(block.a_start)
    } else {
        Err(block.len)
    }
}

/// Trim a J segment at its framework motif.
///
/// Patterns are tried in configuration order and the first one found in full wins. Within a
/// pattern the leftmost occurrence wins. The returned sequence starts one residue after the
/// start of the motif, so the aromatic anchor itself is dropped.
pub fn resolve_j(j_segment: &str, config: &TrimConfig) -> TrimResult<JTrim> {
    if config.is_missing(j_segment) {
        return Err(TrimFailure::UpstreamLookupMissing {
            segment: Segment::J,
        });
    }
    let digits = MotifEncoder::new(&config.residue_to_motif_value).encode(j_segment.as_bytes());

    let mut best_match_len = 0;
    for pattern in &config.motif_patterns {
        match find_pattern(&digits, pattern) {
            Ok(motif_start) => {
                // None only if the anchor is not a character boundary, which a configured
                // ASCII residue cannot produce.
                if let Some(trimmed) = j_segment.get(motif_start + 1..) {
                    return Ok(JTrim {
                        trimmed: trimmed.to_string(),
                        motif_start,
                        pattern: pattern.clone(),
                    });
                }
                best_match_len = best_match_len.max(pattern.len());
            }
            Err(partial) => best_match_len = best_match_len.max(partial),
        }
    }
    debug!(
        "no motif in J segment {j_segment} (encoded {})",
        String::from_utf8_lossy(&digits)
    );
    Err(TrimFailure::NoQualifyingMotifFound { best_match_len })
}
