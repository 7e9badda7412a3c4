use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuizError>;

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("no matching row")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(rusqlite::Error),
    #[error("constraint violation: {0}")]
    Constraint(String),
    /// Failure reported by an external [`Leaderboard`](crate::Leaderboard)
    /// implementation.
    #[error("leaderboard error: {0}")]
    Leaderboard(String),
}

impl From<rusqlite::Error> for QuizError {
    /// Constraint rejections (foreign keys, unique indexes, checks) map to
    /// [`QuizError::Constraint`]; everything else is a storage failure.
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(cause, message)
                if cause.code == rusqlite::ffi::ErrorCode::ConstraintViolation =>
            {
                QuizError::Constraint(message.unwrap_or_else(|| cause.to_string()))
            }
            other => QuizError::Storage(other),
        }
    }
}

impl QuizError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, QuizError::NotFound)
    }
}
