#[derive(thiserror::Error, Debug)]
pub enum EioError {
    /// Malformed encoding or a request the underlying tree can not satisfy.
    #[error("Format: {0}")]
    Format(String),
    #[error("Io: {0}")]
    Io(#[from] std::io::Error),
}

impl EioError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        EioError::Format(message.into())
    }
}
