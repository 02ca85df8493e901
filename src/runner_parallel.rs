//! Parallel Runner
//!
//! All random errors are generated on the calling thread first, so the random stream and hence the record are
//! independent of scheduling. Trials are then decoded in a rayon thread pool, one task per error, and reduced in task
//! order with the same accumulator as the serial runner. A failing or panicking task fails the whole run.
//!

use super::error::{Error, Result};
use super::pauli::*;
use super::record::StatisticsRecord;
use super::runner::*;
use super::trial::*;
use super::util::*;
use crate::derivative::Derivative;
use crate::rayon::prelude::*;
use crate::serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use tracing::debug;

#[derive(Derivative)]
#[derivative(Debug)]
pub struct RunnerParallel {
    pub seed: Option<u64>,
    /// thread pool used to decode trials in parallel
    #[derivative(Debug = "ignore")]
    pub thread_pool: rayon::ThreadPool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerParallelConfig {
    /// number of threads used, 0 means use all the available cores
    #[serde(default = "runner_parallel_default_configs::thread_pool_size")]
    pub thread_pool_size: usize,
    #[serde(default = "runner_parallel_default_configs::seed")]
    pub seed: Option<u64>,
}

impl Default for RunnerParallelConfig {
    fn default() -> Self {
        Self {
            thread_pool_size: runner_parallel_default_configs::thread_pool_size(),
            seed: runner_parallel_default_configs::seed(),
        }
    }
}

pub mod runner_parallel_default_configs {
    pub fn thread_pool_size() -> usize {
        0
    } // by default to the number of CPU cores
    pub fn seed() -> Option<u64> {
        None
    }
}

impl RunnerParallel {
    pub fn new() -> Result<Self> {
        Self::new_config(RunnerParallelConfig::default())
    }

    pub fn new_seeded(seed: u64) -> Result<Self> {
        Self::new_config(RunnerParallelConfig {
            seed: Some(seed),
            ..Default::default()
        })
    }

    pub fn new_config(config: RunnerParallelConfig) -> Result<Self> {
        let thread_pool_size = if config.thread_pool_size != 0 {
            config.thread_pool_size
        } else {
            std::thread::available_parallelism().map(|size| size.get()).unwrap_or(1)
        };
        let thread_pool = rayon::ThreadPoolBuilder::new().num_threads(thread_pool_size).build()?;
        debug!(thread_pool_size, "parallel runner thread pool created");
        Ok(Self {
            seed: config.seed,
            thread_pool,
        })
    }

    pub fn thread_num(&self) -> usize {
        self.thread_pool.current_num_threads()
    }

    fn decode_and_accumulate(&self, simulation: &Simulation, errors: &[PauliVector], begin_time: Instant) -> Result<StatisticsRecord> {
        let mut accumulator = RunAccumulator::new_since(simulation, errors.len(), begin_time);
        for outcome in self.decode_all(simulation, errors) {
            accumulator.add(&outcome?);
        }
        Ok(accumulator.finish())
    }

    /// decode every error in the thread pool, results in the same order as `errors`
    fn decode_all(&self, simulation: &Simulation, errors: &[PauliVector]) -> Vec<Result<TrialOutcome>> {
        self.thread_pool.install(|| {
            errors
                .par_iter()
                .enumerate()
                .map(|(index, error)| {
                    catch_unwind(AssertUnwindSafe(|| simulation.trial(error))).unwrap_or_else(|payload| {
                        let message = if let Some(message) = payload.downcast_ref::<&str>() {
                            message.to_string()
                        } else if let Some(message) = payload.downcast_ref::<String>() {
                            message.clone()
                        } else {
                            "unknown panic".to_string()
                        };
                        Err(Error::TaskPanicked { index, message })
                    })
                })
                .collect()
        })
    }
}

impl RunnerImpl for RunnerParallel {
    fn run(&self, simulation: &Simulation, max_runs: usize) -> Result<StatisticsRecord> {
        let begin_time = Instant::now();
        check_run_count(max_runs)?;
        let mut rng = create_rng(self.seed);
        let errors: Vec<PauliVector> = (0..max_runs).map(|_| simulation.sample_error(&mut rng)).collect();
        self.decode_and_accumulate(simulation, &errors, begin_time)
    }

    fn run_errors(&self, simulation: &Simulation, errors: &[PauliVector]) -> Result<StatisticsRecord> {
        let begin_time = Instant::now();
        check_run_count(errors.len())?;
        self.decode_and_accumulate(simulation, errors, begin_time)
    }
}
