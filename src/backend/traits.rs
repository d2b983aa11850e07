use async_trait::async_trait;

use super::types::{AssistantReply, BackendError, ByteStream};
use crate::models::{SlideContent, ThreadId};

/// The lab server endpoints the front-ends talk to.
#[async_trait]
pub trait LabBackend: Send + Sync {
    async fn slide_count(&self) -> Result<usize, BackendError>;

    async fn slide(&self, index: usize) -> Result<SlideContent, BackendError>;

    /// Returns the narration URL for a slide, generating it server-side if needed.
    async fn slide_audio(&self, index: usize) -> Result<String, BackendError>;

    async fn answer(&self, query: &str) -> Result<ByteStream, BackendError>;

    async fn assistant(
        &self,
        input: &str,
        thread: &ThreadId,
    ) -> Result<AssistantReply, BackendError>;

    /// Resolves an assistant image file id to something an image viewer can load.
    async fn image_source(&self, file_id: &str) -> Result<String, BackendError>;
}
