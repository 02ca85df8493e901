//! Aggregator
//!
//! Pools K independent repetitions of the same sweep into one dataset. Files are aligned by position: record `i` of
//! every file describes the same experiment point. Identity fields are taken from the first file, counters and wall
//! time are summed and rates recomputed from the summed counters. The optional `n_logical_commutations` and
//! `custom_totals` are carried over from the first file as they are, not summed.
//!
//! The pooled `error_weight_pvar` is the mean of the per-file population variances, which ignores the spread between
//! file means; it is exact only when all files have the same mean error weight.
//!

use super::error::{Error, Result};
use super::record::{self, StatisticsRecord};
use std::path::Path;
use tracing::{debug, warn};

/// merge record files that repeat the same sweep
pub fn merge<P: AsRef<Path>>(filenames: &[P]) -> Result<Vec<StatisticsRecord>> {
    if filenames.is_empty() {
        return Err(Error::NoInputFiles);
    }
    let mut batches = Vec::with_capacity(filenames.len());
    for filename in filenames.iter() {
        let records = record::load(filename)?;
        debug!(filename = %filename.as_ref().display(), records = records.len(), "loaded record file");
        batches.push(records);
    }
    let reference = filenames[0].as_ref().display().to_string();
    for (filename, records) in filenames.iter().zip(batches.iter()) {
        if records.len() != batches[0].len() {
            return Err(Error::RecordCountMismatch {
                filename: filename.as_ref().display().to_string(),
                reference: reference.clone(),
                expected: batches[0].len(),
                found: records.len(),
            });
        }
    }
    Ok(merge_aligned(&batches))
}

/// merge the series `{data_name}0.json`, `{data_name}1.json`, ..., `{data_name}{data_num - 1}.json`
pub fn merge_series(data_name: &str, data_num: usize) -> Result<Vec<StatisticsRecord>> {
    let filenames: Vec<String> = (0..data_num).map(|i| format!("{}{}.json", data_name, i)).collect();
    merge(&filenames)
}

/// merge in-memory batches, each batch being the content of one file
pub fn merge_records(batches: &[Vec<StatisticsRecord>]) -> Result<Vec<StatisticsRecord>> {
    let first = batches.first().ok_or(Error::NoInputFiles)?;
    for (i, records) in batches.iter().enumerate() {
        if records.len() != first.len() {
            return Err(Error::RecordCountMismatch {
                filename: format!("batch {}", i),
                reference: "batch 0".to_string(),
                expected: first.len(),
                found: records.len(),
            });
        }
    }
    Ok(merge_aligned(batches))
}

fn merge_aligned(batches: &[Vec<StatisticsRecord>]) -> Vec<StatisticsRecord> {
    let first = &batches[0];
    (0..first.len())
        .map(|index| merge_point(&first[index], batches[1..].iter().map(|records| &records[index])))
        .collect()
}

/// pool the records of a single experiment point
fn merge_point<'a>(first: &StatisticsRecord, others: impl Iterator<Item = &'a StatisticsRecord>) -> StatisticsRecord {
    let mut merged = StatisticsRecord::new(
        first.code.clone(),
        first.n_k_d,
        first.decoder.clone(),
        first.error_model.clone(),
        first.error_probability,
    );
    merged.time_steps = first.time_steps;
    merged.measurement_error_probability = first.measurement_error_probability;
    merged.n_logical_commutations = first.n_logical_commutations.clone();
    merged.custom_totals = first.custom_totals.clone();
    accumulate(&mut merged, first);
    let mut pvar_sum = first.error_weight_pvar;
    let mut count = 1;
    for record in others {
        if record.code != first.code || record.n_k_d != first.n_k_d || record.error_probability != first.error_probability {
            warn!(
                expected_code = %first.code,
                found_code = %record.code,
                expected_probability = first.error_probability,
                found_probability = record.error_probability,
                "merging records of different experiment points, identity taken from the first"
            );
        }
        accumulate(&mut merged, record);
        pvar_sum += record.error_weight_pvar;
        count += 1;
    }
    merged.error_weight_pvar = pvar_sum / count as f64;
    merged.update_rates();
    merged
}

fn accumulate(merged: &mut StatisticsRecord, record: &StatisticsRecord) {
    merged.n_run += record.n_run;
    merged.n_success += record.n_success;
    merged.n_fail += record.n_fail;
    merged.n_xfail += record.n_xfail;
    merged.n_yfail += record.n_yfail;
    merged.n_zfail += record.n_zfail;
    merged.error_weight_total += record.error_weight_total;
    merged.wall_time += record.wall_time;
}
