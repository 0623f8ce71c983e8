use crate::eio::EioError;

#[derive(thiserror::Error, Debug)]
pub enum ArithmError {
    /// Error when an element has no multiplicative inverse modulo the given modulus.
    #[error("NoInverse: {0}")]
    NoInverse(String),
    /// Error when a modulus, order or field characteristic is not acceptable.
    #[error("InvalidModulus: {0}")]
    InvalidModulus(String),
    /// Error when decoded data is malformed or out of range.
    #[error("Format: {0}")]
    Format(String),
    #[error("DimensionMismatch: {0}")]
    DimensionMismatch(String),
    /// Error when a permutation table has repeated or out-of-range targets.
    #[error("InvalidPermutation: {0}")]
    InvalidPermutation(String),
    #[error("InvalidParameters: {0}")]
    InvalidParameters(String),
    #[error("InternalError: {0}")]
    InternalError(String),

    #[error("Encoding: {0}")]
    Eio(#[from] EioError),
    #[error("Storage: {0}")]
    Io(#[from] std::io::Error),
    #[error("Data serialization: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ArithmError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        ArithmError::Format(message.into())
    }

    pub(crate) fn mismatch(what: &str, left: usize, right: usize) -> Self {
        ArithmError::DimensionMismatch(format!(
            "Lengths must match for {} ({} vs {})",
            what, left, right
        ))
    }
}
