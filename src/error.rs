//! Error types shared by the generation stages.

pub type ArtResult<T> = Result<T, ArtError>;

#[derive(thiserror::Error, Debug)]
pub enum ArtError {
    /// No parameters were supplied at all. Raised before any stage runs.
    #[error("input missing: {0}")]
    InputMissing(String),

    /// The input exists but cannot be read as an analysis record.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The vector document could not be produced or its metadata embedded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Metadata could not be recovered from a vector document.
    #[error("metadata extraction error: {0}")]
    Extraction(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ArtError {
    pub fn input_missing(msg: impl Into<String>) -> Self {
        Self::InputMissing(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }
}

impl From<std::fmt::Error> for ArtError {
    fn from(err: std::fmt::Error) -> Self {
        Self::serialization(format!("failed to write document: {err}"))
    }
}
