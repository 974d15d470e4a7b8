use medemap::error::MedemapError;

#[derive(thiserror::Error, Debug)]
pub enum MedemapCliError {
    #[error("Anyhow error")]
    Anyhow(#[from] anyhow::Error),
    #[error("serde JSON error")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("medemap error: {0}")]
    MedemapError(#[from] MedemapError),
    #[error("std IO error")]
    IOError(#[from] std::io::Error),
    #[error("{0}")]
    Rejected(String),
}

pub type MedemapCliResult<T> = Result<T, MedemapCliError>;
