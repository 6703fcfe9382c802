use thiserror::Error;

/// Every failure of a submission, carrying a message fit to show a user.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("{0}")]
    InvalidImage(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The relay answered with a non-success status.
    #[error("{message}")]
    Relay { status: u16, message: String },

    #[error("{0}")]
    MalformedResponse(String),
}
