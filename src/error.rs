/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Shorthand for a validation failure on entity construction
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    /// Shorthand for a broken required relationship inside a repository
    pub fn repository(message: impl Into<String>) -> Self {
        AppError::Repository(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_display() {
        let err = AppError::invalid("rating must be between 1 and 5");
        assert_eq!(
            err.to_string(),
            "Invalid input: rating must be between 1 and 5"
        );
    }

    #[test]
    fn test_repository_display() {
        let err = AppError::repository("review not attached to a user");
        assert_eq!(
            err.to_string(),
            "Repository error: review not attached to a user"
        );
    }
}
