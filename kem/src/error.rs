use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KemError {
    #[error("unsupported KEM algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("{0} cannot be empty")]
    EmptyInput(&'static str),

    #[error("invalid {what} length for {algorithm}: expected {expected} bytes, found {actual}")]
    InvalidLength {
        what: &'static str,
        algorithm: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = core::result::Result<T, KemError>;
