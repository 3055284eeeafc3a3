use thiserror::Error;

pub type SocialResult<T> = Result<T, SocialError>;

/// Failures surfaced by the core services.
///
/// Duplicate follows and likes are not represented here: they are reported
/// as success by the toggle operations.
#[derive(Debug, Error)]
pub enum SocialError {
    /// Missing required input or a forbidden operation such as following oneself
    #[error("{0}")]
    Validation(String),
    /// Missing, invalid or expired credentials
    #[error("{0}")]
    Auth(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl SocialError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SocialError::Validation(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        SocialError::Auth(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        SocialError::NotFound(what.into())
    }
}

impl From<rusqlite::Error> for SocialError {
    fn from(err: rusqlite::Error) -> Self {
        SocialError::Storage(err.into())
    }
}
