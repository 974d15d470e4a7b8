//! Error types.

#[derive(thiserror::Error, Debug)]
pub enum MedemapError {
    #[error("Wrapped anyhow error: {0}")]
    AnyhowError(#[from] anyhow::Error),
    #[error("Failed to fetch '{url}': {reason}")]
    FetchFailed { url: String, reason: String },
    #[error("Request to '{url}' returned HTTP status {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("No data found for table: {0}")]
    MissingTable(String),
    #[error("Cannot compute: {0}")]
    CannotCompute(String),
    #[error("Invalid view parameter: {0}")]
    InvalidParameter(String),
    #[error("Wrapped serde JSON error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("Wrapped IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type MedemapResult<T> = Result<T, MedemapError>;

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn test_anyhow() {
        let anyhow_error = anyhow!("An anyhow error");
        let medemap_error: MedemapError = anyhow_error.into();
        assert_eq!(
            medemap_error.to_string(),
            "Wrapped anyhow error: An anyhow error"
        );
    }

    #[test]
    fn cannot_compute_message() {
        let err = MedemapError::CannotCompute("all indicators have zero variance".into());
        assert_eq!(
            err.to_string(),
            "Cannot compute: all indicators have zero variance"
        );
    }
}
