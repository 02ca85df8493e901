//! Runner
//!
//! Generics for Monte Carlo runners: repeat trials of one [`Simulation`] and accumulate a [`StatisticsRecord`].
//! The serial and parallel runners differ only in how trials are scheduled; accumulation and finalization are shared
//! so both produce identical records from identical error sequences.
//!

use super::error::{Error, Result};
use super::pauli::*;
use super::record::StatisticsRecord;
use super::trial::*;
use std::time::Instant;
use tracing::{info, warn};

/// common trait that must be implemented for each implementation of the runner
pub trait RunnerImpl {
    /// sample `max_runs` random errors and decode each of them
    fn run(&self, simulation: &Simulation, max_runs: usize) -> Result<StatisticsRecord>;

    /// decode the given errors instead of sampling; the record counts exactly `errors.len()` trials
    fn run_errors(&self, simulation: &Simulation, errors: &[PauliVector]) -> Result<StatisticsRecord>;
}

pub fn check_run_count(max_runs: usize) -> Result<()> {
    if max_runs == 0 {
        return Err(Error::InvalidRunCount(max_runs));
    }
    Ok(())
}

/// counters of a run in progress
#[derive(Debug)]
pub struct RunAccumulator {
    pub record: StatisticsRecord,
    pub error_weights: Vec<usize>,
    begin_time: Instant,
}

impl RunAccumulator {
    /// the wall time of the run is measured from here
    pub fn new(simulation: &Simulation, capacity: usize) -> Self {
        Self::new_since(simulation, capacity, Instant::now())
    }

    /// the wall time of the run is measured from `begin_time`, so that work done before the first trial
    /// (e.g. generating all errors up front) is included
    pub fn new_since(simulation: &Simulation, capacity: usize, begin_time: Instant) -> Self {
        info!(
            code = %simulation.code.label(),
            decoder = %simulation.decoder.label(),
            error_model = %simulation.error_model.label(),
            probability = simulation.probability,
            "run begins"
        );
        Self {
            record: simulation.new_record(),
            error_weights: Vec::with_capacity(capacity),
            begin_time,
        }
    }

    pub fn add(&mut self, outcome: &TrialOutcome) {
        let record = &mut self.record;
        record.n_run += 1;
        if outcome.success {
            record.n_success += 1;
        } else {
            record.n_fail += 1;
        }
        record.n_xfail += outcome.failure_x as u64;
        record.n_yfail += outcome.failure_y as u64;
        record.n_zfail += outcome.failure_z as u64;
        self.error_weights.push(outcome.error_weight);
        if let Some(violation) = outcome.violation.as_ref() {
            warn!("RECOVERY DOES NOT RETURN TO CODESPACE: {}", violation.to_json());
        }
    }

    pub fn finish(self) -> StatisticsRecord {
        let mut record = self.record;
        record.finalize(&self.error_weights, self.begin_time.elapsed().as_secs_f64());
        info!(
            code = %record.code,
            n_run = record.n_run,
            n_fail = record.n_fail,
            wall_time = record.wall_time,
            "run ends"
        );
        record
    }
}
