// Copyright (c) 2024 10x Genomics, Inc. All rights reserved.
use crate::csv_parser::CsvParser;
use crate::germline::GermlineTable;
use anyhow::Result;
use log::{info, warn};
use std::path::Path;
use vdj_trim::JunctionRecord;

pub const VID: &str = "VID";
pub const JID: &str = "JID";
pub const CDR3: &str = "CDR3";

/// A junction table: one row per receptor chain, with its V and J identifiers and CDR3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionTable {
    /// Column names in file order. Every row carries all of them as metadata.
    pub headers: Vec<String>,
    pub rows: Vec<Vec<(String, String)>>,
}

impl JunctionTable {
    pub fn load(path: &Path) -> Result<Self> {
        let mut parser = CsvParser::new(path, [VID, JID, CDR3], "junction")?;
        let rows = (0..parser.len())
            .map(|line| {
                parser.set_line(line);
                parser.row_pairs()
            })
            .collect();
        Ok(JunctionTable {
            headers: parser.headers().to_vec(),
            rows,
        })
    }

    /// Attach germline sequences to every row. A VID or JID missing from its table gets
    /// `missing_sequence`, which the trimming engine reports as a failed lookup.
    pub fn join(
        self,
        v_table: &GermlineTable,
        j_table: &GermlineTable,
        missing_sequence: &str,
    ) -> Vec<JunctionRecord> {
        let lookup = |table: &GermlineTable, row: &[(String, String)], col: &str| -> String {
            column(row, col)
                .and_then(|id| table.get(id))
                .unwrap_or(missing_sequence)
                .to_string()
        };

        let mut v_missing = 0;
        let mut j_missing = 0;
        let records: Vec<_> = self
            .rows
            .into_iter()
            .map(|row| {
                let v_segment = lookup(v_table, &row, VID);
                let j_segment = lookup(j_table, &row, JID);
                v_missing += usize::from(v_segment == missing_sequence);
                j_missing += usize::from(j_segment == missing_sequence);
                let cdr3 = column(&row, CDR3).unwrap_or_default().to_string();
                JunctionRecord::new(v_segment, cdr3, j_segment).with_metadata(row)
            })
            .collect();

        info!("joined {} junction rows to germline sequences", records.len());
        if v_missing + j_missing > 0 {
            warn!(
                "{v_missing} VID and {j_missing} JID values were not found in the germline tables"
            );
        }
        records
    }
}

fn column<'a>(row: &'a [(String, String)], col: &str) -> Option<&'a str> {
    row.iter()
        .find(|(name, _)| name == col)
        .map(|(_, value)| value.as_str())
}
