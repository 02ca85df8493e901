//! Serial Runner
//!
//! Draws and decodes one error at a time on the calling thread.
//!

use super::error::Result;
use super::pauli::*;
use super::record::StatisticsRecord;
use super::runner::*;
use super::trial::*;
use super::util::*;
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct RunnerSerial {
    /// fixes the random stream; a fresh seed is drawn from the thread rng when `None`
    pub seed: Option<u64>,
}

impl RunnerSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl RunnerImpl for RunnerSerial {
    fn run(&self, simulation: &Simulation, max_runs: usize) -> Result<StatisticsRecord> {
        let begin_time = Instant::now();
        check_run_count(max_runs)?;
        let mut rng = create_rng(self.seed);
        let mut accumulator = RunAccumulator::new_since(simulation, max_runs, begin_time);
        for _ in 0..max_runs {
            let error = simulation.sample_error(&mut rng);
            let outcome = simulation.trial(&error)?;
            accumulator.add(&outcome);
        }
        Ok(accumulator.finish())
    }

    fn run_errors(&self, simulation: &Simulation, errors: &[PauliVector]) -> Result<StatisticsRecord> {
        check_run_count(errors.len())?;
        let mut accumulator = RunAccumulator::new(simulation, errors.len());
        for error in errors.iter() {
            let outcome = simulation.trial(error)?;
            accumulator.add(&outcome);
        }
        Ok(accumulator.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::super::error::Error;
    use super::super::trial::tests::*;
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn runner_serial_noiseless() {
        // cargo test runner_serial_noiseless -- --nocapture
        let code = StubRepetition::new();
        let decoder = StubDecoder::identity(3);
        let error_model = StubErrorModel {
            distribution: [1., 0., 0., 0.],
        };
        let simulation = Simulation::new(&code, &decoder, &error_model, 0.).unwrap();
        let record = RunnerSerial::new().run(&simulation, 10).unwrap();
        assert_eq!((record.n_run, record.n_success, record.n_fail), (10, 10, 0));
        assert_eq!((record.n_xfail, record.n_yfail, record.n_zfail), (0, 0, 0));
        assert_eq!(record.error_weight_total, 0);
        assert_eq!(record.error_weight_pvar, 0.);
        assert_eq!(record.logical_failure_rate, Some(0.));
        assert_eq!(record.physical_error_rate, Some(0.));
    }

    #[test]
    fn runner_serial_certain_x_error() {
        // cargo test runner_serial_certain_x_error -- --nocapture
        // an X error on a bare qubit anticommutes with logical Z and logical Y = XZ, never with logical X
        let code = StubQubit::new();
        let decoder = StubDecoder::identity(1);
        let error_model = StubErrorModel {
            distribution: [0., 1., 0., 0.],
        };
        let simulation = Simulation::new(&code, &decoder, &error_model, 1.).unwrap();
        let record = RunnerSerial::new_seeded(0).run(&simulation, 50).unwrap();
        assert_eq!((record.n_run, record.n_success, record.n_fail), (50, 0, 50));
        assert_eq!((record.n_xfail, record.n_yfail, record.n_zfail), (0, 50, 50));
        assert_eq!(record.error_weight_total, 50);
        assert_eq!(record.physical_error_rate, Some(1.));
        assert_eq!(record.logicalz_failure_rate, Some(1.));
    }

    #[test]
    fn runner_serial_seeded_is_reproducible() {
        // cargo test runner_serial_seeded_is_reproducible -- --nocapture
        let code = StubRepetition::new();
        let decoder = StubDecoder::identity(3);
        let error_model = StubErrorModel {
            distribution: [0.7, 0.1, 0.1, 0.1],
        };
        let simulation = Simulation::new(&code, &decoder, &error_model, 0.3).unwrap();
        let runner = RunnerSerial::new_seeded(42);
        let mut first = runner.run(&simulation, 500).unwrap();
        let mut second = runner.run(&simulation, 500).unwrap();
        assert_eq!(first.n_run, 500);
        assert_eq!(first.n_success + first.n_fail, 500);
        assert!(first.n_xfail <= first.n_fail && first.n_yfail <= first.n_fail && first.n_zfail <= first.n_fail);
        first.wall_time = 0.;
        second.wall_time = 0.;
        assert_eq!(first, second);
    }

    #[test]
    fn runner_serial_given_errors() {
        // cargo test runner_serial_given_errors -- --nocapture
        let code = StubQubit::new();
        let decoder = StubDecoder::identity(1);
        let error_model = StubErrorModel {
            distribution: [0.25, 0.25, 0.25, 0.25],
        };
        let simulation = Simulation::new(&code, &decoder, &error_model, 0.75).unwrap();
        let errors: Vec<PauliVector> = ["I", "X", "Y", "Z", "Z"].iter().map(|text| text.parse().unwrap()).collect();
        let record = RunnerSerial::new().run_errors(&simulation, &errors).unwrap();
        assert_eq!((record.n_run, record.n_success, record.n_fail), (5, 1, 4));
        assert_eq!((record.n_xfail, record.n_yfail, record.n_zfail), (3, 3, 2));
        assert!(matches!(
            RunnerSerial::new().run_errors(&simulation, &[]),
            Err(Error::InvalidRunCount(0))
        ));
    }

    /// collects the formatted log lines of a test
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn runner_serial_codespace_violation() {
        // cargo test runner_serial_codespace_violation -- --nocapture
        // `XII` flips `ZZI`, the identity recovery leaves the residual outside the codespace
        let code = StubRepetition::new();
        let decoder = StubDecoder::identity(3);
        let error_model = StubErrorModel {
            distribution: [0.9, 0.1, 0., 0.],
        };
        let simulation = Simulation::new(&code, &decoder, &error_model, 0.1).unwrap();
        let errors: Vec<PauliVector> = ["XII", "III"].iter().map(|text| text.parse().unwrap()).collect();
        let log = CapturedLog::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer({
                let log = log.clone();
                move || log.clone()
            })
            .with_ansi(false)
            .finish();
        let record = tracing::subscriber::with_default(subscriber, || RunnerSerial::new().run_errors(&simulation, &errors)).unwrap();
        assert_eq!(record.n_run, 2);
        assert_eq!(record.n_success, 1);
        assert_eq!((record.n_fail, record.n_xfail, record.n_yfail, record.n_zfail), (1, 0, 0, 0));
        let output = String::from_utf8(log.0.lock().clone()).unwrap();
        println!("{}", output);
        assert_eq!(output.matches("RECOVERY DOES NOT RETURN TO CODESPACE").count(), 1, "{}", output);
        assert!(output.contains("stub repetition"), "{}", output);
    }

    #[test]
    fn runner_serial_errors_abort_run() {
        // cargo test runner_serial_errors_abort_run -- --nocapture
        let code = StubRepetition::new();
        let error_model = StubErrorModel {
            distribution: [1., 0., 0., 0.],
        };
        let simulation = Simulation::new(&code, &StubBrokenDecoder, &error_model, 0.).unwrap();
        assert!(matches!(RunnerSerial::new().run(&simulation, 10), Err(Error::Decoder { .. })));
        assert!(matches!(RunnerSerial::new().run(&simulation, 0), Err(Error::InvalidRunCount(0))));
    }
}
