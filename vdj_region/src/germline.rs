// Copyright (c) 2024 10x Genomics, Inc. All rights reserved.
//! Germline V and J amino-acid tables, keyed by the `accession|gene|Homo` identifiers used in the
//! VID and JID columns of a junction table.

use crate::csv_parser::CsvParser;
use anyhow::Result;
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;
use vdj_trim::Segment;

/// Species tag appended to every germline identifier.
const SPECIES: &str = "Homo";

/// Column names of a germline table, e.g. `V.Accession.Number`.
struct Columns {
    accession: String,
    name: String,
    sequence: String,
}

impl Columns {
    fn for_segment(segment: Segment) -> Self {
        Columns {
            accession: format!("{segment}.Accession.Number"),
            name: format!("{segment}.Name"),
            sequence: format!("{segment}.AA.String"),
        }
    }
}

/// The accession number from a FASTA-style header such as `>J00256>IGHJ4*01`: the text after the
/// leading `>` up to the next one. A value without `>` is used as is.
pub fn clean_accession(raw: &str) -> &str {
    let raw = raw.trim();
    match raw.split('>').nth(1) {
        Some(accession) => accession.trim(),
        None => raw,
    }
}

/// Identifier of a germline segment as it appears in a VID or JID column.
pub fn germline_id(accession: &str, gene_name: &str) -> String {
    format!("{accession}|{gene_name}|{SPECIES}")
}

/// Amino-acid sequences of one segment type, by identifier.
#[derive(Debug, Clone, Default)]
pub struct GermlineTable {
    sequences: HashMap<String, String>,
}

impl GermlineTable {
    /// Build a table from (raw accession, gene name, sequence) rows. If an identifier is repeated
    /// the first row wins.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>) -> Self {
        let mut sequences = HashMap::new();
        let mut duplicates = 0;
        for (accession, gene_name, sequence) in rows {
            let id = germline_id(clean_accession(accession), gene_name);
            if sequences.contains_key(&id) {
                duplicates += 1;
                continue;
            }
            sequences.insert(id, sequence.to_string());
        }
        if duplicates > 0 {
            warn!("ignored {duplicates} germline rows with an identifier seen earlier");
        }
        GermlineTable { sequences }
    }

    /// Read the germline table of `segment` from a CSV file.
    pub fn load(path: &Path, segment: Segment) -> Result<Self> {
        let cols = Columns::for_segment(segment);
        let mut parser = CsvParser::new(
            path,
            [&cols.accession, &cols.name, &cols.sequence],
            &format!("{segment} germline"),
        )?;
        let mut rows = Vec::with_capacity(parser.len());
        for line in 0..parser.len() {
            parser.set_line(line);
            rows.push((
                parser.require_string(&cols.accession)?,
                parser.get_string(&cols.name),
                parser.get_string(&cols.sequence),
            ));
        }
        let table = Self::from_rows(
            rows.iter()
                .map(|(a, n, s)| (a.as_str(), n.as_str(), s.as_str())),
        );
        info!(
            "loaded {} {segment} germline sequences from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.sequences.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}
