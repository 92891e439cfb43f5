// Copyright (c) 2024 10x Genomics, Inc. All rights reserved.
use anyhow::{anyhow, bail, Context, Result};
use csv::StringRecord;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Reads a whole CSV table into memory, checks its headers and gives readable errors that name
/// the file, line and column.
pub struct CsvParser {
    filetype: String,
    filename: PathBuf,
    headers: Vec<String>,
    rows: Vec<StringRecord>,
    col_map: HashMap<String, usize>,
    line: usize,
}

impl CsvParser {
    /// Open `filename` and check that every one of `required_headers` is present. `filetype` is
    /// a readable description of the table used in error messages.
    pub fn new<T: AsRef<str>>(
        filename: &Path,
        required_headers: impl IntoIterator<Item = T>,
        filetype: &str,
    ) -> Result<CsvParser> {
        let file = File::open(filename).with_context(|| filename.display().to_string())?;
        let mut rdr = csv::Reader::from_reader(BufReader::new(file));

        let mut headers = rdr
            .headers()
            .with_context(|| format!("reading the header of {}", filename.display()))?
            .clone();
        headers.trim();
        let headers: Vec<_> = headers.iter().map(String::from).collect();

        let mut rows = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let mut record = result.with_context(|| {
                format!(
                    "Error in {filetype} file '{}' on line {}",
                    filename.display(),
                    i + 1
                )
            })?;
            record.trim();
            rows.push(record);
        }

        let col_map = CsvParser::check_headers(filename, required_headers, &headers)?;

        Ok(CsvParser {
            filetype: filetype.to_string(),
            filename: filename.to_path_buf(),
            headers,
            rows,
            col_map,
            line: 0,
        })
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Headers in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Set the line number (not including the header) to pull data from
    pub fn set_line(&mut self, line: usize) {
        self.line = line;
    }

    /// Get a string from column `col` on the current line.
    /// Returns None for an empty cell, a short row or an unknown column.
    pub fn try_get_string(&self, col: &str) -> Option<String> {
        let &i = self.col_map.get(col)?;
        let val = self.rows.get(self.line)?.get(i)?;
        if val.is_empty() {
            None
        } else {
            Some(val.to_string())
        }
    }

    /// Get a string from column `col` on the current line, "" if it is empty.
    pub fn get_string(&self, col: &str) -> String {
        self.try_get_string(col).unwrap_or_default()
    }

    /// Get a string from column `col` on the current line, failing on an empty cell.
    pub fn require_string(&self, col: &str) -> Result<String> {
        self.try_get_string(col).ok_or_else(|| {
            anyhow!(
                "Error in {} file '{}'. On line {} in '{col}' column: \
                 Value required but cell is empty.",
                self.filetype,
                self.filename.display(),
                self.line + 1,
            )
        })
    }

    /// Every (column, value) pair of the current line, in column order. Missing trailing cells
    /// read as "".
    pub fn row_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .map(|h| (h.clone(), self.get_string(h)))
            .collect()
    }

    fn check_headers<T: AsRef<str>>(
        file_arg: &Path,
        required: impl IntoIterator<Item = T>,
        headers: &[String],
    ) -> Result<HashMap<String, usize>> {
        for r in required {
            if !headers.iter().any(|h| h == r.as_ref()) {
                bail!(
                    "The input file '{}' must contain a column named '{}', but it was not found. \
                    Please check the headers in the CSV file.",
                    file_arg.display(),
                    r.as_ref()
                );
            }
        }

        // first column wins if a header is repeated
        let mut result = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            result.entry(h.to_string()).or_insert(i);
        }
        Ok(result)
    }
}
