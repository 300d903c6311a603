//! Reads one sensor channel out of a delimited sample file and coerces it into a numeric signal.
//!
//! Parsing and filling are two separate steps: [`parse_cell`] reports whether a cell holds a
//! usable number, and a [`FillPolicy`] decides what replaces the cells that don't. Rows are never
//! dropped, so the signal always has one value per data row of the file.

use std::path::Path;

use ndarray::Array1;
use thiserror::Error;

use crate::error::{AnalysisError, Result};

/// Cells of the selected channel, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSamples {
    pub column: String,
    pub column_index: usize,
    pub cells: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CellParseError {
    #[error("empty cell")]
    Empty,
    #[error("not a number: {0:?}")]
    NotNumeric(String),
    #[error("not a finite number: {0:?}")]
    NonFinite(String),
}

/// What a cell that failed to parse turns into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillPolicy {
    Constant(f64),
}

impl Default for FillPolicy {
    fn default() -> Self {
        FillPolicy::Constant(0.0)
    }
}

impl FillPolicy {
    pub fn fill_value(&self) -> f64 {
        match self {
            FillPolicy::Constant(value) => *value,
        }
    }

    pub fn resolve(&self, parsed: std::result::Result<f64, CellParseError>) -> f64 {
        parsed.unwrap_or_else(|_| self.fill_value())
    }
}

/// A coerced channel together with how many of its cells had to be filled.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSignal {
    pub column: String,
    pub signal: Array1<f64>,
    pub filled: usize,
}

pub fn parse_cell(cell: &str) -> std::result::Result<f64, CellParseError> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Err(CellParseError::Empty);
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| CellParseError::NotNumeric(trimmed.to_string()))?;
    if !value.is_finite() {
        return Err(CellParseError::NonFinite(trimmed.to_string()));
    }
    Ok(value)
}

/// Parses every cell and applies `policy` to the failures. Returns the signal and the fill count.
pub fn coerce<S: AsRef<str>>(cells: &[S], policy: FillPolicy) -> (Array1<f64>, usize) {
    let mut filled = 0;
    let signal = cells
        .iter()
        .map(|cell| {
            let parsed = parse_cell(cell.as_ref());
            if parsed.is_err() {
                filled += 1;
            }
            policy.resolve(parsed)
        })
        .collect::<Array1<f64>>();
    (signal, filled)
}

/// Reads the column named `channel` (exact, case-sensitive), or the first column if no header
/// matches. Short rows contribute an empty cell.
pub fn read_channel(path: &Path, channel: &str) -> Result<RawSamples> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|source| file_error(path, source))?;

    let headers = reader
        .headers()
        .map_err(|source| file_error(path, source))?
        .clone();
    if headers.is_empty() {
        return Err(AnalysisError::NoColumns(path.to_path_buf()));
    }

    let column_index = headers.iter().position(|h| h == channel).unwrap_or(0);
    let column = headers.get(column_index).unwrap_or_default().to_string();

    let mut cells = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| file_error(path, source))?;
        cells.push(record.get(column_index).unwrap_or_default().to_string());
    }

    Ok(RawSamples {
        column,
        column_index,
        cells,
    })
}

pub fn load_signal(path: &Path, channel: &str, policy: FillPolicy) -> Result<LoadedSignal> {
    let raw = read_channel(path, channel)?;
    let (signal, filled) = coerce(&raw.cells, policy);
    Ok(LoadedSignal {
        column: raw.column,
        signal,
        filled,
    })
}

fn file_error(path: &Path, source: csv::Error) -> AnalysisError {
    if source.is_io_error() {
        AnalysisError::FileAccess {
            path: path.to_path_buf(),
            source,
        }
    } else {
        AnalysisError::Malformed {
            path: path.to_path_buf(),
            source,
        }
    }
}
