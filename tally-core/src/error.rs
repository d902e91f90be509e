use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Store(String),
}

pub type CrmResult<T> = Result<T, CrmError>;

impl CrmError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{} not found", what))
    }
}

impl From<rusqlite::Error> for CrmError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, _) = &value {
            // SQLITE_CONSTRAINT_FOREIGNKEY
            if err.code == ErrorCode::ConstraintViolation && err.extended_code == 787 {
                return Self::Validation("referenced record does not exist".to_string());
            }
        }
        Self::Store(value.to_string())
    }
}
