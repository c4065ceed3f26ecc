use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrailmarkError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type TrailmarkResult<T> = Result<T, TrailmarkError>;

impl From<std::io::Error> for TrailmarkError {
    fn from(e: std::io::Error) -> Self {
        TrailmarkError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category() {
        let err = TrailmarkError::Config("TRAILMARK_WORKERS must be >= 1".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: TRAILMARK_WORKERS must be >= 1"
        );
    }

    #[test]
    fn io_error_maps_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: TrailmarkError = io.into();
        assert!(matches!(err, TrailmarkError::Storage(msg) if msg.contains("missing.csv")));
    }
}
