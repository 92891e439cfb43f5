// Copyright (c) 2024 10x Genomics, Inc. All rights reserved.

//! Table plumbing around `vdj_trim`: load the germline and junction tables, join them, run the
//! assembly and write the assembled and quarantined CSV files.

pub mod csv_parser;
pub mod germline;
pub mod junction_table;
pub mod write;

use anyhow::Result;
use germline::GermlineTable;
use junction_table::JunctionTable;
use std::path::PathBuf;
use vdj_trim::{assemble, AssemblySummary, Segment, TrimConfig};
use write::{write_assembled, write_csv_file, write_quarantined};

/// Input and output files of one run.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub junction_table: PathBuf,
    pub v_germline: PathBuf,
    pub j_germline: PathBuf,
    pub assembled: PathBuf,
    pub quarantined: PathBuf,
}

/// Assemble every row of the junction table and write both output files.
pub fn run(paths: &RunPaths, config: &TrimConfig) -> Result<AssemblySummary> {
    let v_table = GermlineTable::load(&paths.v_germline, Segment::V)?;
    let j_table = GermlineTable::load(&paths.j_germline, Segment::J)?;
    let junctions = JunctionTable::load(&paths.junction_table)?;
    let headers = junctions.headers.clone();

    let records = junctions.join(&v_table, &j_table, &config.missing_sequence);
    let output = assemble(records, config);

    write_csv_file(
        &paths.assembled,
        &headers,
        &output.successes,
        write_assembled,
    )?;
    write_csv_file(
        &paths.quarantined,
        &headers,
        &output.quarantined,
        write_quarantined,
    )?;
    Ok(output.summary())
}
