use thiserror::Error;

/// Errors raised by the PCA engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PcaError {
    /// The dataset is too small to analyse; the message names the failed condition.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Errors raised while building a dataset or editing a sample.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatasetError {
    #[error("dataset has no parameter columns")]
    NoHeaders,

    #[error("parameter name in column {0} is empty")]
    EmptyHeader(usize),

    #[error("parameter '{0}' appears more than once")]
    DuplicateHeader(String),

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
}
