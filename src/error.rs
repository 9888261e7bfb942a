// src/error.rs
use tracing::error;

/// Failure of a call against the data backend, or of a rule checked before
/// one is issued.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Backend returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Backend unreachable: {0}")]
    Transport(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

impl BackendError {
    pub fn not_found(entity: &'static str) -> Self {
        BackendError::NotFound { entity }
    }

    /// Short machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            BackendError::NotFound { .. } => "NOT_FOUND",
            BackendError::Validation(_) => "VALIDATION_ERROR",
            BackendError::Conflict(_) => "CONFLICT",
            BackendError::Unauthorized(_) => "UNAUTHORIZED",
            BackendError::Forbidden(_) => "FORBIDDEN",
            BackendError::Remote { .. } => "BACKEND_ERROR",
            BackendError::Transport(_) => "BACKEND_UNAVAILABLE",
            BackendError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Internal(format!("Unexpected backend payload: {}", err))
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => BackendError::not_found("Row"),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    BackendError::Conflict(db_err.message().to_string())
                } else if db_err.is_foreign_key_violation() || db_err.is_check_violation() {
                    BackendError::Validation(db_err.message().to_string())
                } else {
                    error!("Database error: {}", db_err);
                    BackendError::Internal("Database error".to_string())
                }
            }
            other => {
                error!("Database error: {}", other);
                BackendError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Internal(format!("Malformed stored value: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_per_variant() {
        let errors = [
            BackendError::not_found("Job"),
            BackendError::Validation("x".into()),
            BackendError::Conflict("x".into()),
            BackendError::Unauthorized("x".into()),
            BackendError::Forbidden("x".into()),
            BackendError::Remote {
                status: 502,
                message: "x".into(),
            },
            BackendError::Transport("x".into()),
            BackendError::Internal("x".into()),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_not_found_message_names_entity() {
        assert_eq!(BackendError::not_found("Job").to_string(), "Job not found");
    }
}
