// Copyright (c) 2024 10x Genomics, Inc. All rights reserved.
//! Trimming parameters.
//!
//! Every constant on which the historical trimming scripts disagreed lives here. A
//! [`TrimConfig`] is built once, validated, and then passed by shared reference into every
//! resolver call; nothing in the engine mutates it.

use crate::errors::ConfigError;
use log::warn;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;
use strum_macros::{Display, EnumString};

/// Alignment scores are handed to the aligner as integers in half-point units.
pub(crate) const SCORE_SCALE: f64 = 2.0;

/// Which occurrence of the matched overlap the V segment is cut at.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SplitPolicy {
    /// Keep everything before the first occurrence.
    #[default]
    FirstOccurrence,
    /// Keep everything before the last occurrence.
    LastOccurrence,
}

/// Named alignment scoring schemes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScoringPreset {
    /// match +2, mismatch -1, gap open -2, gap extend -0.5
    Standard,
    /// match +2, mismatch -1, gaps free
    FreeGaps,
}

/// Scores for a global pairwise alignment.
///
/// A gap of length `n` scores `gap_open + (n - 1) * gap_extend`, i.e. `gap_open` is the score
/// of the first gap position.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlignmentScoring {
    pub match_score: f64,
    pub mismatch_score: f64,
    pub gap_open: f64,
    pub gap_extend: f64,
}

impl AlignmentScoring {
    pub const STANDARD: AlignmentScoring = AlignmentScoring {
        match_score: 2.0,
        mismatch_score: -1.0,
        gap_open: -2.0,
        gap_extend: -0.5,
    };

    pub const FREE_GAPS: AlignmentScoring = AlignmentScoring {
        match_score: 2.0,
        mismatch_score: -1.0,
        gap_open: 0.0,
        gap_extend: 0.0,
    };

    pub fn preset(preset: ScoringPreset) -> Self {
        match preset {
            ScoringPreset::Standard => Self::STANDARD,
            ScoringPreset::FreeGaps => Self::FREE_GAPS,
        }
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        for value in [
            self.match_score,
            self.mismatch_score,
            self.gap_open,
            self.gap_extend,
        ] {
            half_points(name, value)?;
        }
        if self.gap_extend > 0.0 || self.gap_open > self.gap_extend {
            return Err(ConfigError::InvalidGapScores {
                name,
                gap_open: self.gap_open,
                gap_extend: self.gap_extend,
            });
        }
        Ok(())
    }
}

/// Convert a score to integer half-point units.
pub(crate) fn half_points(name: &'static str, value: f64) -> Result<i32, ConfigError> {
    let scaled = value * SCORE_SCALE;
    if !scaled.is_finite() || scaled.fract() != 0.0 || scaled.abs() > f64::from(i32::MAX / 4) {
        return Err(ConfigError::UnrepresentableScore { name, value });
    }
    Ok(scaled as i32)
}

/// Accept either a preset name or an explicit score table.
fn scoring_or_preset<'de, D>(deserializer: D) -> Result<AlignmentScoring, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Preset(ScoringPreset),
        Explicit(AlignmentScoring),
    }
    Ok(match Repr::deserialize(deserializer)? {
        Repr::Preset(preset) => AlignmentScoring::preset(preset),
        Repr::Explicit(scoring) => scoring,
    })
}

/// Parameters of the V and J boundary resolvers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrimConfig {
    /// Number of trailing V residues searched for the junction.
    pub tail_window_size: usize,
    /// Shortest anchor-starting overlap accepted by the exact tier.
    pub min_exact_match_length: usize,
    /// Scoring of the V-tail versus CDR3 alignment.
    #[serde(deserialize_with = "scoring_or_preset")]
    pub alignment_scoring: AlignmentScoring,
    /// Scoring used when probing a shifted anchor start.
    #[serde(deserialize_with = "scoring_or_preset")]
    pub probe_scoring: AlignmentScoring,
    /// Minimum alignment score, in natural (not half-point) units.
    pub alignment_score_threshold: f64,
    /// How far the alignment start may be moved forward onto the anchor.
    pub max_anchor_shift: usize,
    pub split_policy: SplitPolicy,
    pub anchor_residue: char,
    /// Digit patterns tried in order against the encoded J segment.
    pub motif_patterns: Vec<String>,
    /// Residues with a non-zero motif digit. Everything else encodes to 0.
    pub residue_to_motif_value: BTreeMap<char, u8>,
    /// Sequence value the upstream join writes when a germline lookup fails.
    pub missing_sequence: String,
}

impl Default for TrimConfig {
    fn default() -> Self {
        TrimConfig {
            tail_window_size: 20,
            min_exact_match_length: 2,
            alignment_scoring: AlignmentScoring::STANDARD,
            probe_scoring: AlignmentScoring::FREE_GAPS,
            alignment_score_threshold: 0.0,
            max_anchor_shift: 2,
            split_policy: SplitPolicy::FirstOccurrence,
            anchor_residue: 'C',
            motif_patterns: vec!["2101".to_string(), "2111".to_string()],
            residue_to_motif_value: [('F', 2), ('W', 2), ('G', 1)].into_iter().collect(),
            missing_sequence: "NA".to_string(),
        }
    }
}

macro_rules! warn_if_changed {
    ($cfg:ident, $default:ident, $($field:ident),+ $(,)?) => {
        $(
            if $cfg.$field != $default.$field {
                warn!("using non-default {} = {:?}", stringify!($field), $cfg.$field);
            }
        )+
    };
}

impl TrimConfig {
    /// The stricter historical thresholds: score threshold 5, overlaps longer than two
    /// residues, and no fallback motif pattern.
    pub fn strict() -> Self {
        TrimConfig {
            min_exact_match_length: 3,
            alignment_score_threshold: 5.0,
            motif_patterns: vec!["2101".to_string()],
            ..TrimConfig::default()
        }
    }

    /// Parse a TOML document. Keys that are absent keep their default value.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: TrimConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file, logging every non-default value.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&s)?;
        config.warn_non_default();
        Ok(config)
    }

    pub fn warn_non_default(&self) {
        let default = TrimConfig::default();
        let cfg = self;
        warn_if_changed!(
            cfg,
            default,
            tail_window_size,
            min_exact_match_length,
            alignment_scoring,
            probe_scoring,
            alignment_score_threshold,
            max_anchor_shift,
            split_policy,
            anchor_residue,
            motif_patterns,
            residue_to_motif_value,
            missing_sequence,
        );
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tail_window_size < 1 {
            return Err(ConfigError::TooSmall {
                name: "tail_window_size",
                value: self.tail_window_size,
                min: 1,
            });
        }
        if self.min_exact_match_length < 1 {
            return Err(ConfigError::TooSmall {
                name: "min_exact_match_length",
                value: self.min_exact_match_length,
                min: 1,
            });
        }
        self.alignment_scoring.validate("alignment_scoring")?;
        self.probe_scoring.validate("probe_scoring")?;
        if !self.alignment_score_threshold.is_finite() {
            return Err(ConfigError::NonFiniteThreshold(
                self.alignment_score_threshold,
            ));
        }
        if !self.anchor_residue.is_ascii() {
            return Err(ConfigError::NonAsciiResidue {
                name: "anchor_residue",
                residue: self.anchor_residue,
            });
        }
        if self.motif_patterns.is_empty() {
            return Err(ConfigError::NoMotifPatterns);
        }
        for pattern in &self.motif_patterns {
            if pattern.is_empty() || !pattern.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ConfigError::InvalidMotifPattern {
                    pattern: pattern.clone(),
                });
            }
        }
        for (&residue, &value) in &self.residue_to_motif_value {
            if !residue.is_ascii() {
                return Err(ConfigError::NonAsciiResidue {
                    name: "residue_to_motif_value",
                    residue,
                });
            }
            if value > 9 {
                return Err(ConfigError::InvalidMotifValue { residue, value });
            }
        }
        Ok(())
    }

    /// The anchor residue as a byte. Valid after [`TrimConfig::validate`].
    pub(crate) fn anchor(&self) -> u8 {
        self.anchor_residue as u8
    }

    /// True if `seq` stands for a germline sequence the upstream join could not find.
    pub(crate) fn is_missing(&self, seq: &str) -> bool {
        seq.is_empty() || seq == self.missing_sequence
    }
}
