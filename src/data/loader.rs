use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use thiserror::Error;

use super::model::{AnalogDataset, AnalogInput};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Structured load failures. Malformed rows abort the load and name the
/// offending row instead of propagating invalid values into the index.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("data file contains no rows")]
    Empty,

    #[error("row {row}: invalid {field} date '{token}' (expected YYYYMMDD)")]
    InvalidDate {
        row: usize,
        field: &'static str,
        token: String,
    },
}

// ---------------------------------------------------------------------------
// Analogues data file (tab-separated)
// ---------------------------------------------------------------------------

/// One raw line of the analogues output file.
///
/// ```text
/// dateRef \t dateAnlg \t Dis \t Corr
/// 20030601 \t 19900612 \t 1377.1 \t 0.43
/// ```
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "dateRef")]
    date_ref: String,
    #[serde(rename = "dateAnlg")]
    date_anlg: String,
    #[serde(rename = "Dis")]
    dis: f64,
    #[serde(rename = "Corr")]
    corr: f64,
}

/// Load the analogues data file produced by the detection process.
pub fn load_data(path: &Path) -> Result<AnalogDataset, LoadError> {
    let reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;
    parse_data(reader)
}

fn parse_data<R: Read>(mut reader: csv::Reader<R>) -> Result<AnalogDataset, LoadError> {
    let mut inputs = Vec::new();

    for (row_no, result) in reader.deserialize::<RawRow>().enumerate() {
        let raw = result?;
        inputs.push(parse_row(row_no, raw)?);
    }

    AnalogDataset::from_inputs(&inputs).ok_or(LoadError::Empty)
}

fn parse_row(row: usize, raw: RawRow) -> Result<AnalogInput, LoadError> {
    let date_ref = parse_compact_date(&raw.date_ref).ok_or_else(|| LoadError::InvalidDate {
        row,
        field: "dateRef",
        token: raw.date_ref.clone(),
    })?;
    // Only the year feeds the decade bucketing, but the whole token is
    // validated so a mangled line cannot slip through.
    let date_anlg = parse_compact_date(&raw.date_anlg).ok_or_else(|| LoadError::InvalidDate {
        row,
        field: "dateAnlg",
        token: raw.date_anlg.clone(),
    })?;

    Ok(AnalogInput {
        date_ref,
        analog_year: date_anlg.year(),
        distance: raw.dis,
        correlation: raw.corr,
    })
}

/// Parse a `YYYYMMDD` date token.
pub fn parse_compact_date(token: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(token.trim(), "%Y%m%d").ok()
}

// ---------------------------------------------------------------------------
// Run configuration (key = value text blob)
// ---------------------------------------------------------------------------

/// The analogues-detection run parameters, rendered verbatim in the UI.
/// No computation depends on these beyond the reference-period display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunConfig {
    pub outputfile: String,
    pub nanalog: String,
    pub varname: String,
    pub simsource: String,
    pub archivesource: String,
    pub bbox: String,
    /// Reference period, `dd/mm/yyyy` each, or the literal "dummy".
    pub ref_start: String,
    pub ref_end: String,
}

/// Load the key=value configuration blob written next to the data file.
pub fn load_config(path: &Path) -> Result<RunConfig, LoadError> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_config(&text))
}

/// Fields are matched by key substring, like the upstream tooling writes
/// them; missing fields simply stay empty.
fn parse_config(text: &str) -> RunConfig {
    let mut config = RunConfig::default();

    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().trim_matches('"').trim();

        if key.contains("outputfile") {
            config.outputfile = value.to_string();
        } else if key.contains("nanalog") {
            config.nanalog = value.to_string();
        } else if key.contains("varname") {
            config.varname = value.to_string();
        } else if key.contains("simsource") {
            config.simsource = value.to_string();
        } else if key.contains("archisource") {
            config.archivesource = value.to_string();
        } else if key.contains("predictordom") {
            config.bbox = value.to_string();
        } else if key.contains("archiperiod") {
            let mut parts = value.splitn(2, ',');
            config.ref_start = format_ref_date(parts.next().unwrap_or(""));
            config.ref_end = format_ref_date(parts.next().unwrap_or(""));
        }
    }

    config
}

/// Reformat a reference-period token to `dd/mm/yyyy`. The "dummy" sentinel
/// and anything unparseable pass through verbatim.
fn format_ref_date(token: &str) -> String {
    let token = token.trim().trim_matches('"').trim();
    let parsed = NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(token, "%Y%m%d"));
    match parsed {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => token.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
