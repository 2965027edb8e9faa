use thiserror::Error;

/// Errors surfaced to the caller of the message pipeline
///
/// Every variant guarantees that no message row was written and no broadcast
/// or background work was started.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Attachment '{filename}' upload failed: {source}")]
    AttachmentUpload {
        filename: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Persistence error: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PipelineError::Validation(msg.into())
    }
}

/// Errors of a single verdict poll
#[derive(Error, Debug)]
pub enum ConsumerError {
    /// Bounded wait elapsed without a message
    #[error("poll timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}
