extern crate clap;
extern crate pbr;

use clap::{Parser, Subcommand};
use pbr::ProgressBar;
use qec_failure_rate::aggregate;
use qec_failure_rate::error::{Error, Result};
use qec_failure_rate::example_codes::*;
use qec_failure_rate::record::{self, FailureAxis, RecordWriter, StatisticsRecord};
use qec_failure_rate::runner::RunnerImpl;
use qec_failure_rate::runner_parallel::{RunnerParallel, RunnerParallelConfig};
use qec_failure_rate::runner_serial::RunnerSerial;
use qec_failure_rate::trial::Simulation;
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Clone)]
#[clap(author = clap::crate_authors!(", "))]
#[clap(version = env!("CARGO_PKG_VERSION"))]
#[clap(about = "Monte Carlo logical failure rate of quantum error correcting codes")]
#[clap(color = clap::ColorChoice::Auto)]
#[clap(propagate_version = true)]
#[clap(subcommand_required = true)]
#[clap(arg_required_else_help = true)]
pub struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
#[allow(clippy::large_enum_variant)]
enum Commands {
    /// sweep codes and error probabilities, one record per (code, probability)
    Simulate {
        /// code type
        #[clap(value_enum)]
        code_type: CodeType,
        /// decoder type
        #[clap(value_enum)]
        decoder_type: DecoderType,
        /// error model type
        #[clap(value_enum)]
        error_model_type: ErrorModelType,
        /// physical error probabilities: [p1,p2,p3,...,pm]
        #[clap(short = 'p', long, default_value_t = format!("[0.1]"))]
        probabilities: String,
        /// one config per code in the sweep: [{"d":3},{"d":5},...]
        #[clap(short = 'c', long, default_value_t = format!("[{{}}]"))]
        code_configs: String,
        /// decoder config
        #[clap(long, default_value_t = format!("{{}}"))]
        decoder_config: String,
        /// error model config
        #[clap(long, default_value_t = format!("{{}}"))]
        error_model_config: String,
        /// number of trials per record
        #[clap(short = 'r', long, default_value_t = 1000)]
        max_runs: usize,
        /// decode in a thread pool
        #[clap(long, action)]
        parallel: bool,
        /// parallel runner config, e.g. {"thread_pool_size":8}
        #[clap(long, default_value_t = format!("{{}}"))]
        runner_config: String,
        /// fix the random stream of every record
        #[clap(long)]
        seed: Option<u64>,
        /// output record file, by default a timestamped file in the current folder
        #[clap(short = 'o', long)]
        output: Option<String>,
        /// disable the progress bar
        #[clap(long, action)]
        disable_progress_bar: bool,
    },
    /// merge files that repeat the same sweep
    Merge {
        /// record files, aligned by position
        #[clap(required = true)]
        filenames: Vec<String>,
        /// output record file
        #[clap(short = 'o', long)]
        output: String,
    },
    /// merge the series {data_name}0.json, ..., {data_name}{data_num-1}.json
    MergeSeries {
        data_name: String,
        data_num: usize,
        /// output record file
        #[clap(short = 'o', long)]
        output: String,
    },
    /// print the failure rates of a record file with binomial error bars
    Summary {
        filename: String,
        /// accept a truncated file, printing only the complete records
        #[clap(long, action)]
        partial: bool,
    },
}

fn parse_json<T: serde::de::DeserializeOwned>(name: &str, value: &str) -> Result<T> {
    serde_json::from_str(value).map_err(|err| Error::Config(format!("{} `{}`: {}", name, value, err)))
}

fn default_output_filename() -> String {
    format!("failure_rate_{}.json", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

fn format_rate(record: &StatisticsRecord, axis: FailureAxis) -> String {
    match (record.failure_rate(axis), record.failure_rate_std_err(axis)) {
        (Some(rate), Some(std_err)) => format!("{:.3e} ± {:.1e}", rate, std_err),
        _ => "-".to_string(),
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Simulate {
                code_type,
                decoder_type,
                error_model_type,
                probabilities,
                code_configs,
                decoder_config,
                error_model_config,
                max_runs,
                parallel,
                runner_config,
                seed,
                output,
                disable_progress_bar,
            } => {
                let probabilities: Vec<f64> = parse_json("probabilities", &probabilities)?;
                let code_configs: Vec<serde_json::Value> = parse_json("code configs", &code_configs)?;
                let decoder = decoder_type.build(parse_json("decoder config", &decoder_config)?)?;
                let error_model = error_model_type.build(parse_json("error model config", &error_model_config)?)?;
                let runner: Box<dyn RunnerImpl> = if parallel {
                    let mut config: RunnerParallelConfig = parse_json("runner config", &runner_config)?;
                    if seed.is_some() {
                        config.seed = seed;
                    }
                    Box::new(RunnerParallel::new_config(config)?)
                } else {
                    Box::new(RunnerSerial { seed })
                };
                let codes = code_configs
                    .into_iter()
                    .map(|config| code_type.build(config))
                    .collect::<Result<Vec<_>>>()?;
                let output = output.unwrap_or_else(default_output_filename);
                let mut writer = RecordWriter::create(&output)?;
                info!(output = %writer.filename(), "simulation begins");
                let total = codes.len() * probabilities.len();
                let mut pb = if disable_progress_bar {
                    None
                } else {
                    Some(ProgressBar::on(std::io::stderr(), total as u64))
                };
                for (code_index, code) in codes.iter().enumerate() {
                    for (probability_index, &probability) in probabilities.iter().enumerate() {
                        if let Some(pb) = pb.as_mut() {
                            pb.message(format!("{} p={} ", code.label(), probability).as_str());
                            pb.set((code_index * probabilities.len() + probability_index) as u64);
                        }
                        let simulation = Simulation::new(code.as_ref(), decoder.as_ref(), error_model.as_ref(), probability)?;
                        let record = runner.run(&simulation, max_runs)?;
                        writer.write(&record)?;
                    }
                }
                if let Some(pb) = pb.as_mut() {
                    pb.set(total as u64);
                    pb.finish();
                }
                info!(output = %writer.filename(), records = total, "simulation ends");
            }
            Commands::Merge { filenames, output } => {
                let records = aggregate::merge(&filenames)?;
                record::save(&output, &records)?;
                info!(inputs = filenames.len(), records = records.len(), output = %output, "merged");
            }
            Commands::MergeSeries {
                data_name,
                data_num,
                output,
            } => {
                let records = aggregate::merge_series(&data_name, data_num)?;
                record::save(&output, &records)?;
                info!(inputs = data_num, records = records.len(), output = %output, "merged");
            }
            Commands::Summary { filename, partial } => {
                let records = if partial {
                    let (records, error) = record::load_partial(&filename)?;
                    if let Some(error) = error {
                        error!("{}", error);
                    }
                    records
                } else {
                    record::load(&filename)?
                };
                println!("code, n_k_d, decoder, error_model, p, n_run, logical, logical X, logical Y, logical Z");
                for record in records.iter() {
                    println!(
                        "{}, {:?}, {}, {}, {}, {}, {}, {}, {}, {}",
                        record.code,
                        record.n_k_d,
                        record.decoder,
                        record.error_model.as_deref().unwrap_or("-"),
                        record.error_probability,
                        record.n_run,
                        format_rate(record, FailureAxis::Total),
                        format_rate(record, FailureAxis::X),
                        format_rate(record, FailureAxis::Y),
                        format_rate(record, FailureAxis::Z),
                    );
                }
            }
        }
        Ok(())
    }
}

pub fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    if let Err(err) = Cli::parse().run() {
        error!("{}", err);
        std::process::exit(1);
    }
}
