// Copyright (c) 2024 10x Genomics, Inc. All rights reserved.
//! Per-record assembly of V, CDR3 and J into one junction-spanning sequence.

use crate::config::TrimConfig;
use crate::errors::Segment;
use crate::j_boundary::resolve_j;
use crate::types::{AssembledRecord, JunctionRecord, QuarantinedRecord};
use crate::v_boundary::resolve_v;
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Trim both segments of one record and join them around the CDR3.
///
/// Both resolvers always run, so a quarantined record lists every reason it failed.
pub fn assemble_record(
    record: &JunctionRecord,
    config: &TrimConfig,
) -> Result<AssembledRecord, QuarantinedRecord> {
    let v = resolve_v(&record.v_segment, &record.cdr3, config);
    let j = resolve_j(&record.j_segment, config);
    match (v, j) {
        (Ok(v), Ok(j)) => {
            let full_sequence =
                [v.trimmed.as_str(), record.cdr3.as_str(), j.trimmed.as_str()].concat();
            Ok(AssembledRecord {
                record: record.clone(),
                v,
                j,
                full_sequence,
            })
        }
        (v, j) => {
            let failures: Vec<_> = [(Segment::V, v.err()), (Segment::J, j.err())]
                .into_iter()
                .filter_map(|(segment, failure)| Some((segment, failure?)))
                .collect();
            debug!("quarantined CDR3 {}: {failures:?}", record.cdr3);
            Err(QuarantinedRecord {
                record: record.clone(),
                failures,
            })
        }
    }
}

/// The two output streams of a batch, each in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AssemblyOutput {
    pub successes: Vec<AssembledRecord>,
    pub quarantined: Vec<QuarantinedRecord>,
}

/// Counts describing one batch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AssemblySummary {
    pub input: usize,
    pub assembled: usize,
    pub quarantined: usize,
    /// Number of records failing for each `segment:tag` reason. A record failing on both
    /// segments is counted under both.
    pub failure_reasons: BTreeMap<String, usize>,
}

impl AssemblyOutput {
    pub fn summary(&self) -> AssemblySummary {
        let mut failure_reasons = BTreeMap::new();
        for (segment, failure) in self.quarantined.iter().flat_map(|q| &q.failures) {
            *failure_reasons
                .entry(format!("{segment}:{}", failure.tag()))
                .or_insert(0) += 1;
        }
        AssemblySummary {
            input: self.successes.len() + self.quarantined.len(),
            assembled: self.successes.len(),
            quarantined: self.quarantined.len(),
            failure_reasons,
        }
    }
}

/// Assemble a batch of records in parallel.
///
/// Every record ends up in exactly one of the two streams, and a failing record never affects
/// any other.
pub fn assemble(records: Vec<JunctionRecord>, config: &TrimConfig) -> AssemblyOutput {
    let results: Vec<_> = records
        .into_par_iter()
        .map(|record| assemble_record(&record, config))
        .collect();

    let mut output = AssemblyOutput::default();
    for result in results {
        match result {
            Ok(assembled) => output.successes.push(assembled),
            Err(quarantined) => output.quarantined.push(quarantined),
        }
    }

    let summary = output.summary();
    info!(
        "assembled {} of {} records, quarantined {}",
        summary.assembled, summary.input, summary.quarantined
    );
    for (reason, count) in &summary.failure_reasons {
        info!("  {reason}: {count}");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TrimFailure;
    use crate::types::AnchorTier;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn rec(v: &str, cdr3: &str, j: &str) -> JunctionRecord {
        JunctionRecord::new(v, cdr3, j)
    }

    #[test]
    fn assembles_a_clean_record() {
        let record = rec("EVQLLESGGGLVQPGGSXXXCASS", "CASSLKTGELFF", "YFDYWGQGTLVTVSS");
        let assembled = assemble_record(&record, &TrimConfig::default()).unwrap();
        assert_eq!(assembled.v_trimmed(), "EVQLLESGGGLVQPGGSXXX");
        assert_eq!(assembled.j_trimmed(), "GQGTLVTVSS");
        assert_eq!(assembled.v.tier, AnchorTier::Exact);
        assert_eq!(
            assembled.full_sequence,
            "EVQLLESGGGLVQPGGSXXXCASSLKTGELFFGQGTLVTVSS"
        );
    }

    #[test]
    fn both_failures_are_reported() {
        let record = rec("QQQQQQQQQQQQ", "CASSLKT", "AAAAAAAA");
        let quarantined = assemble_record(&record, &TrimConfig::default()).unwrap_err();
        assert_eq!(quarantined.record, record);
        assert_eq!(
            quarantined.failures,
            vec![
                (Segment::V, TrimFailure::NoQualifyingAnchorFound),
                (
                    Segment::J,
                    TrimFailure::NoQualifyingMotifFound { best_match_len: 1 }
                ),
            ]
        );
        assert_eq!(
            quarantined.reason(),
            "V:no_qualifying_anchor;J:no_qualifying_motif"
        );
    }

    #[test]
    fn missing_lookup_is_quarantined() {
        let record = rec("NA", "CASSLKT", "YFDYWGQGTLVTVSS");
        let quarantined = assemble_record(&record, &TrimConfig::default()).unwrap_err();
        assert_eq!(quarantined.reason(), "V:upstream_lookup_missing");
    }

    #[test]
    fn batch_keeps_order_and_counts_reasons() {
        let tagged = |id: &str, v: &str, cdr3: &str, j: &str| {
            rec(v, cdr3, j).with_metadata(vec![("id".to_string(), id.to_string())])
        };
        let records = vec![
            tagged("a", "MKLTVAVYYCASS", "CASSLKTGELFF", "YFDYWGQGTLVTVSS"),
            tagged("b", "NA", "CASSLKT", "GTFGGGTKLTVL"),
            tagged("c", "GGAVYYCASSLK", "CTASSLKT", "GTFGGGTKLTVL"),
            tagged("d", "QQQQQQQQ", "CASS", "NA"),
        ];
        let output = assemble(records, &TrimConfig::default());

        let ids = |recs: Vec<&JunctionRecord>| -> Vec<String> {
            recs.iter().filter_map(|r| r.meta("id")).map(String::from).collect()
        };
        assert_eq!(
            ids(output.successes.iter().map(|s| &s.record).collect()),
            vec!["a", "c"]
        );
        assert_eq!(
            ids(output.quarantined.iter().map(|q| &q.record).collect()),
            vec!["b", "d"]
        );
        assert_eq!(output.successes[1].full_sequence, "GGAVYYCTASSLKTGGGTKLTVL");

        let summary = output.summary();
        assert_eq!(summary.input, 4);
        assert_eq!(summary.assembled, 2);
        assert_eq!(summary.quarantined, 2);
        assert_eq!(
            summary.failure_reasons,
            [
                ("J:upstream_lookup_missing".to_string(), 1),
                ("V:no_qualifying_anchor".to_string(), 1),
                ("V:upstream_lookup_missing".to_string(), 1),
            ]
            .into_iter()
            .collect::<BTreeMap<_, _>>()
        );
    }

    #[test]
    fn empty_batch() {
        let output = assemble(Vec::new(), &TrimConfig::default());
        assert_eq!(output, AssemblyOutput::default());
        assert_eq!(output.summary().input, 0);
    }

    fn residues() -> impl Strategy<Value = String> {
        proptest::string::string_regex("[ACFGWQSTY]{0,30}").unwrap()
    }

    fn records() -> impl Strategy<Value = Vec<JunctionRecord>> {
        proptest::collection::vec(
            (residues(), residues(), residues()).prop_map(|(v, c, j)| rec(&v, &c, &j)),
            0..40,
        )
    }

    proptest! {
        #[test]
        fn every_record_lands_in_one_stream(batch in records()) {
            let n = batch.len();
            let output = assemble(batch.clone(), &TrimConfig::default());
            prop_assert_eq!(output.successes.len() + output.quarantined.len(), n);

            // Each stream is a subsequence of the input.
            let mut rest = batch.iter();
            for s in &output.successes {
                prop_assert!(rest.any(|r| *r == s.record));
            }
            let mut rest = batch.iter();
            for q in &output.quarantined {
                prop_assert!(rest.any(|r| *r == q.record));
                prop_assert!(!q.failures.is_empty());
            }
        }

        #[test]
        fn assembled_sequence_is_the_concatenation(batch in records()) {
            let output = assemble(batch, &TrimConfig::default());
            for s in &output.successes {
                prop_assert_eq!(
                    &s.full_sequence,
                    &format!("{}{}{}", s.v_trimmed(), s.record.cdr3, s.j_trimmed())
                );
                prop_assert_eq!(
                    s.full_sequence.len(),
                    s.v_trimmed().len() + s.record.cdr3.len() + s.j_trimmed().len()
                );
                prop_assert!(s.record.v_segment.starts_with(s.v_trimmed()));
                prop_assert!(s.record.j_segment.ends_with(s.j_trimmed()));
                prop_assert!(s.v_trimmed().len() < s.record.v_segment.len());
                prop_assert!(s.j_trimmed().len() < s.record.j_segment.len());
            }
        }

        #[test]
        fn anchor_is_not_duplicated_without_a_doubled_germline_anchor(batch in records()) {
            let output = assemble(batch, &TrimConfig::default());
            for s in output.successes.iter().filter(|s| !s.record.v_segment.contains("CC")) {
                prop_assert!(!s.v_trimmed().ends_with('C'), "{:?}", s);
            }
        }

        #[test]
        fn assembly_is_repeatable(batch in records()) {
            let config = TrimConfig::default();
            prop_assert_eq!(assemble(batch.clone(), &config), assemble(batch, &config));
        }
    }
}
