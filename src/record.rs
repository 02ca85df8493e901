//! Record Store
//!
//! Statistics of one experiment point (code, decoder, error model, probability), persisted as one JSON object per line.
//! A file is streaming-friendly: each line is independent, so a sweep interrupted half way still leaves every finished
//! record loadable. Records are written as strict JSON and read as JSON5, so files with unquoted keys written by
//! older tooling load as well. On reading, trailing `;` terminators and blank lines are tolerated.
//!

use super::error::{Error, Result};
use super::util::*;
use crate::serde::{Deserialize, Serialize};
use crate::serde_json;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRecord {
    /// label of the code
    pub code: String,
    pub n_k_d: CodeShape,
    /// always 1: single-shot decoding without repeated syndrome extraction
    #[serde(default = "record_default_configs::time_steps")]
    pub time_steps: usize,
    /// label of the decoder
    pub decoder: String,
    /// label of the error model; absent in some older records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_model: Option<String>,
    pub error_probability: f64,
    #[serde(default)]
    pub measurement_error_probability: f64,
    pub n_run: u64,
    pub n_success: u64,
    pub n_fail: u64,
    /// failures against the logical X generators; not exclusive with the other two axes
    pub n_xfail: u64,
    pub n_yfail: u64,
    pub n_zfail: u64,
    #[serde(default)]
    pub n_logical_commutations: Option<Vec<u64>>,
    #[serde(default)]
    pub custom_totals: Option<serde_json::Value>,
    pub error_weight_total: u64,
    /// population variance of the per-trial error weight
    pub error_weight_pvar: f64,
    /// rates are `None` (`null`) as long as `n_run == 0`
    #[serde(default)]
    pub logical_failure_rate: Option<f64>,
    #[serde(default)]
    pub logicalx_failure_rate: Option<f64>,
    #[serde(default)]
    pub logicaly_failure_rate: Option<f64>,
    #[serde(default)]
    pub logicalz_failure_rate: Option<f64>,
    #[serde(default)]
    pub physical_error_rate: Option<f64>,
    /// seconds
    pub wall_time: f64,
}

pub mod record_default_configs {
    pub fn time_steps() -> usize {
        1
    }
}

/// which logical failure count a rate refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAxis {
    Total,
    X,
    Y,
    Z,
}

impl StatisticsRecord {
    /// an empty record at the beginning of a run: all counters zero and rates undefined
    pub fn new(code: String, n_k_d: CodeShape, decoder: String, error_model: Option<String>, error_probability: f64) -> Self {
        Self {
            code,
            n_k_d,
            time_steps: record_default_configs::time_steps(),
            decoder,
            error_model,
            error_probability,
            measurement_error_probability: 0.,
            n_run: 0,
            n_success: 0,
            n_fail: 0,
            n_xfail: 0,
            n_yfail: 0,
            n_zfail: 0,
            n_logical_commutations: None,
            custom_totals: None,
            error_weight_total: 0,
            error_weight_pvar: 0.,
            logical_failure_rate: None,
            logicalx_failure_rate: None,
            logicaly_failure_rate: None,
            logicalz_failure_rate: None,
            physical_error_rate: None,
            wall_time: 0.,
        }
    }

    /// set the error weight statistics and the wall time, then compute the rates; called once at the end of a run
    pub fn finalize(&mut self, error_weights: &[usize], wall_time: f64) {
        self.error_weight_total = error_weights.iter().map(|weight| *weight as u64).sum();
        self.error_weight_pvar = population_variance(error_weights);
        self.wall_time = wall_time;
        self.update_rates();
    }

    /// recompute the rate fields from the integer counters
    pub fn update_rates(&mut self) {
        let ratio = |numerator: u64, denominator: u128| -> Option<f64> {
            if denominator == 0 {
                None
            } else {
                Some(numerator as f64 / denominator as f64)
            }
        };
        let n_run = self.n_run as u128;
        self.logical_failure_rate = ratio(self.n_fail, n_run);
        self.logicalx_failure_rate = ratio(self.n_xfail, n_run);
        self.logicaly_failure_rate = ratio(self.n_yfail, n_run);
        self.logicalz_failure_rate = ratio(self.n_zfail, n_run);
        let qubit_num = self.n_k_d.0 as u128;
        self.physical_error_rate = ratio(self.error_weight_total, qubit_num * self.time_steps as u128 * n_run);
    }

    pub fn failure_count(&self, axis: FailureAxis) -> u64 {
        match axis {
            FailureAxis::Total => self.n_fail,
            FailureAxis::X => self.n_xfail,
            FailureAxis::Y => self.n_yfail,
            FailureAxis::Z => self.n_zfail,
        }
    }

    pub fn failure_rate(&self, axis: FailureAxis) -> Option<f64> {
        match axis {
            FailureAxis::Total => self.logical_failure_rate,
            FailureAxis::X => self.logicalx_failure_rate,
            FailureAxis::Y => self.logicaly_failure_rate,
            FailureAxis::Z => self.logicalz_failure_rate,
        }
    }

    /// binomial standard error `sqrt(r (1 - r) / n_run)` of a failure rate, used as error bar when plotting
    pub fn failure_rate_std_err(&self, axis: FailureAxis) -> Option<f64> {
        let rate = self.failure_rate(axis)?;
        Some((rate * (1. - rate) / self.n_run as f64).sqrt())
    }

    /// the distance column used when fitting thresholds
    pub fn code_distance(&self) -> usize {
        self.n_k_d.2
    }

    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// parse a single line as JSON5, ignoring trailing statement terminators; records with `n = 0` or `d = 0` are rejected
    pub fn from_line(line: &str) -> std::result::Result<Self, json5::Error> {
        let record: Self = json5::from_str(trim_line(line))?;
        let (n, _, d) = record.n_k_d;
        if n == 0 || d == 0 {
            return Err(serde::de::Error::custom(format!("invalid code parameters n_k_d = {:?}", record.n_k_d)));
        }
        Ok(record)
    }
}

fn trim_line(line: &str) -> &str {
    line.trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

/// writes one record per line and flushes after each, so an interrupted sweep leaves a loadable prefix
pub struct RecordWriter {
    filename: String,
    writer: BufWriter<File>,
}

impl RecordWriter {
    /// create (or truncate) the file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let filename = path.as_ref().display().to_string();
        let file = File::create(path.as_ref()).map_err(|err| Error::io(filename.as_str(), err))?;
        Ok(Self {
            filename,
            writer: BufWriter::new(file),
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn write(&mut self, record: &StatisticsRecord) -> Result<()> {
        let line = record.to_line().map_err(|err| Error::Serialize {
            filename: self.filename.clone(),
            source: err,
        })?;
        let filename = self.filename.as_str();
        self.writer.write_all(line.as_bytes()).map_err(|err| Error::io(filename, err))?;
        self.writer.write_all(b"\n").map_err(|err| Error::io(filename, err))?;
        self.writer.flush().map_err(|err| Error::io(filename, err))
    }
}

/// iterate the records of a file, one `Result` per non-blank line
pub struct RecordReader {
    filename: String,
    lines: Lines<BufReader<File>>,
    line_index: usize,
}

impl RecordReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let filename = path.as_ref().display().to_string();
        let file = File::open(path.as_ref()).map_err(|err| Error::io(filename.as_str(), err))?;
        Ok(Self {
            filename,
            lines: BufReader::new(file).lines(),
            line_index: 0,
        })
    }
}

impl Iterator for RecordReader {
    type Item = Result<StatisticsRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_index += 1;
            let line = match line {
                Ok(line) => line,
                Err(err) => return Some(Err(Error::io(self.filename.as_str(), err))),
            };
            if trim_line(&line).is_empty() {
                continue;
            }
            return Some(StatisticsRecord::from_line(&line).map_err(|err| Error::MalformedRecord {
                filename: self.filename.clone(),
                line: self.line_index,
                source: err,
            }));
        }
    }
}

/// save records to a file, replacing any existing content
pub fn save<P: AsRef<Path>>(path: P, records: &[StatisticsRecord]) -> Result<()> {
    let mut writer = RecordWriter::create(path)?;
    for record in records.iter() {
        writer.write(record)?;
    }
    Ok(())
}

/// load every record of a file; any unreadable or malformed line fails the whole load
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<StatisticsRecord>> {
    RecordReader::open(path)?.collect()
}

/// load the valid prefix of a possibly truncated file, together with the error that stopped reading
pub fn load_partial<P: AsRef<Path>>(path: P) -> Result<(Vec<StatisticsRecord>, Option<Error>)> {
    let mut records = vec![];
    for record in RecordReader::open(path)? {
        match record {
            Ok(record) => records.push(record),
            Err(err) => return Ok((records, Some(err))),
        }
    }
    Ok((records, None))
}
