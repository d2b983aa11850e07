use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use thiserror::Error;

use crate::models::ThreadId;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Raw response body, delivered in whatever chunks the transport produced.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BackendError>> + Send>>;

/// Reply from `/assistant`: the thread the server used plus the streamed body.
pub struct AssistantReply {
    /// `None` when the response carried no thread header.
    pub thread_id: Option<ThreadId>,
    pub body: ByteStream,
}

impl std::fmt::Debug for AssistantReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantReply")
            .field("thread_id", &self.thread_id)
            .field("body", &"<stream>")
            .finish()
    }
}
