use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Storage error: {0}")]
    StorageError(#[from] anyhow::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),
}

impl DomainError {
    /// Validation failures are permanent; redelivering the same input cannot succeed
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            DomainError::ValidationError(_) | DomainError::InvalidLimit(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_is_retryable() {
        let err = DomainError::StorageError(anyhow::anyhow!("connection refused"));
        assert!(!err.is_permanent());
        assert_eq!(err.to_string(), "Storage error: connection refused");
    }

    #[test]
    fn test_validation_error_is_permanent() {
        let err = DomainError::ValidationError("humidity: greater than 100".to_string());
        assert!(err.is_permanent());
    }
}
