// Copyright (c) 2024 10x Genomics, Inc. All rights reserved.
//! CSV writers for the assembled and quarantined streams.
//!
//! Both files start with the junction table's own columns, in input order, followed by the
//! columns added here.

use anyhow::{Context, Result};
use csv::Writer;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use vdj_trim::{AssembledRecord, JunctionRecord, QuarantinedRecord};

pub const V_AA_SEQ: &str = "V_AA_Seq";
pub const J_AA_SEQ: &str = "J_AA_Seq";
pub const V_AA_TRIMMED: &str = "V_AA_Trimmed";
pub const J_AA_TRIMMED: &str = "J_AA_Trimmed";
pub const V_CDR3_J_SEQUENCE: &str = "V_CDR3_J_Sequence";
pub const FAILURE_REASON: &str = "Failure_Reason";

const ASSEMBLED_COLUMNS: [&str; 5] = [
    V_AA_SEQ,
    J_AA_SEQ,
    V_AA_TRIMMED,
    J_AA_TRIMMED,
    V_CDR3_J_SEQUENCE,
];
const QUARANTINED_COLUMNS: [&str; 3] = [V_AA_SEQ, J_AA_SEQ, FAILURE_REASON];

/// Values of the `headers` columns of a record, "" where the record lacks one.
fn passthrough<'a>(headers: &'a [String], record: &'a JunctionRecord) -> Vec<&'a str> {
    headers
        .iter()
        .map(|h| record.meta(h).unwrap_or_default())
        .collect()
}

fn write_header<W: Write>(wtr: &mut Writer<W>, headers: &[String], extra: &[&str]) -> Result<()> {
    wtr.write_record(headers.iter().map(String::as_str).chain(extra.iter().copied()))?;
    Ok(())
}

pub fn write_assembled<W: Write>(
    wtr: W,
    headers: &[String],
    records: &[AssembledRecord],
) -> Result<()> {
    let mut wtr = Writer::from_writer(wtr);
    write_header(&mut wtr, headers, &ASSEMBLED_COLUMNS)?;
    for rec in records {
        let mut row = passthrough(headers, &rec.record);
        row.extend([
            rec.record.v_segment.as_str(),
            rec.record.j_segment.as_str(),
            rec.v_trimmed(),
            rec.j_trimmed(),
            rec.full_sequence.as_str(),
        ]);
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_quarantined<W: Write>(
    wtr: W,
    headers: &[String],
    records: &[QuarantinedRecord],
) -> Result<()> {
    let mut wtr = Writer::from_writer(wtr);
    write_header(&mut wtr, headers, &QUARANTINED_COLUMNS)?;
    for rec in records {
        let reason = rec.reason();
        let mut row = passthrough(headers, &rec.record);
        row.extend([
            rec.record.v_segment.as_str(),
            rec.record.j_segment.as_str(),
            reason.as_str(),
        ]);
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Create `path` and hand it to one of the writers above.
pub fn write_csv_file<T>(
    path: &Path,
    headers: &[String],
    records: &[T],
    write: impl FnOnce(File, &[String], &[T]) -> Result<()>,
) -> Result<()> {
    let file = File::create(path).with_context(|| path.display().to_string())?;
    write(file, headers, records).with_context(|| format!("writing {}", path.display()))
}
