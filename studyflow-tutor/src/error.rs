use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TutorError {
    #[error("tutor request timed out after {0:?}")]
    Timeout(Duration),
    #[error("tutor returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(reqwest::Error),
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),
}

impl TutorError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TutorError::Timeout(_))
    }
}
