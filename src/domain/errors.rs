//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Storage upload failed: {0}")]
    Storage(String),

    #[error("Triage backend error: {0}")]
    Backend(String),

    #[error("Not a video file: {0}")]
    InvalidMedia(String),

    #[error("Input error: {0}")]
    Input(String),
}
