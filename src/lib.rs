extern crate rand;
extern crate rand_xoshiro;
extern crate parking_lot;
extern crate serde;
#[macro_use] extern crate serde_json;
extern crate json5;
extern crate derivative;
extern crate rayon;
extern crate thiserror;
extern crate tracing;

pub mod error;
pub mod util;
pub mod pauli;
pub mod capability;
pub mod trial;
pub mod runner;
pub mod runner_serial;
pub mod runner_parallel;
pub mod record;
pub mod aggregate;
pub mod example_codes;

use capability::*;
use error::Result;
use record::StatisticsRecord;
use runner::RunnerImpl;
use trial::Simulation;


/// estimate the logical failure rate of `code` at `probability` with `max_runs` trials on the calling thread
/// (to fix the random stream, use a seeded [`runner_serial::RunnerSerial`] instead)
pub fn run(code: &dyn CodeImpl, decoder: &dyn DecoderImpl, error_model: &dyn ErrorModelImpl, probability: f64, max_runs: usize) -> Result<StatisticsRecord> {
    let simulation = Simulation::new(code, decoder, error_model, probability)?;
    runner_serial::RunnerSerial::new().run(&simulation, max_runs)
}

/// same as [`run`] but decodes in a thread pool sized to the available cores
pub fn run_parallel(code: &dyn CodeImpl, decoder: &dyn DecoderImpl, error_model: &dyn ErrorModelImpl, probability: f64, max_runs: usize) -> Result<StatisticsRecord> {
    let simulation = Simulation::new(code, decoder, error_model, probability)?;
    runner_parallel::RunnerParallel::new()?.run(&simulation, max_runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::example_codes::*;

    #[test]
    fn lib_run_five_qubit_code() {
        // cargo test lib_run_five_qubit_code -- --nocapture
        let code = FiveQubitCode::new();
        let decoder = LookupDecoder::new(LookupDecoderConfig { max_qubits: 5 });
        let error_model = DepolarizingErrorModel;
        for record in [
            run(&code, &decoder, &error_model, 0.1, 1000).unwrap(),
            run_parallel(&code, &decoder, &error_model, 0.1, 1000).unwrap(),
        ] {
            assert_eq!(record.code, "5-qubit");
            assert_eq!(record.decoder, "Lookup");
            assert_eq!(record.error_model.as_deref(), Some("Depolarizing"));
            assert_eq!(record.n_run, 1000);
            assert_eq!(record.n_success + record.n_fail, 1000);
            // a distance-3 code fails only with two or more errors, about 8% at p = 0.1
            assert!(record.n_fail > 0 && record.n_fail < 250, "{:?}", record);
            let physical_error_rate = record.physical_error_rate.unwrap();
            assert!((physical_error_rate - 0.1).abs() < 0.03, "{}", physical_error_rate);
        }
    }

    #[test]
    fn lib_run_rejects_invalid_input() {
        // cargo test lib_run_rejects_invalid_input -- --nocapture
        let code = TrivialCode::new(1);
        assert!(matches!(
            run(&code, &ZeroDecoder, &DepolarizingErrorModel, 0.1, 0),
            Err(error::Error::InvalidRunCount(0))
        ));
        assert!(matches!(
            run_parallel(&code, &ZeroDecoder, &DepolarizingErrorModel, 2., 10),
            Err(error::Error::InvalidProbability(_))
        ));
    }
}
