//! Error types
//!
//! Precondition violations are rejected before any trial runs; decoder failures abort a whole run;
//! missing or malformed record files are never replaced by default records.
//!

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// a run needs at least one trial, otherwise every rate divides by zero
    #[error("invalid trial count {0}: at least one trial is required")]
    InvalidRunCount(usize),

    #[error("invalid error probability {0}: must be within [0, 1]")]
    InvalidProbability(f64),

    /// the error model returned something that is not a distribution over (I, X, Y, Z)
    #[error("error model `{error_model}` returned an invalid distribution {distribution:?} at p = {probability}")]
    InvalidDistribution {
        error_model: String,
        probability: f64,
        distribution: [f64; 4],
    },

    #[error("invalid Pauli operator: {0}")]
    InvalidPauli(String),

    #[error("cannot merge an empty list of record files")]
    NoInputFiles,

    /// positional alignment between record files is broken
    #[error("record file {filename} has {found} records but {reference} has {expected}")]
    RecordCountMismatch {
        filename: String,
        reference: String,
        expected: usize,
        found: usize,
    },

    #[error("cannot access {filename}: {source}")]
    Io {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    /// records are read as JSON5, which also accepts the unquoted keys of older record files
    #[error("malformed record at {filename}:{line}: {source}")]
    MalformedRecord {
        filename: String,
        line: usize,
        #[source]
        source: json5::Error,
    },

    #[error("cannot serialize record for {filename}: {source}")]
    Serialize {
        filename: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("decoder `{decoder}` failed: {message}")]
    Decoder { decoder: String, message: String },

    #[error("decoder `{decoder}` returned a recovery on {found} qubits, code `{code}` has {expected}")]
    RecoveryLength {
        decoder: String,
        code: String,
        expected: usize,
        found: usize,
    },

    /// a worker panicked during a parallel run; the partial result is discarded
    #[error("trial {index} panicked: {message}")]
    TaskPanicked { index: usize, message: String },

    #[error("cannot build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(filename: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            filename: filename.into(),
            source,
        }
    }
}
