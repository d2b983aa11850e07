use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::renderer::{conclude, RenderOutcome, StreamRenderer};
use super::transcript::TranscriptView;
use crate::backend::LabBackend;
use crate::models::ThreadId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("Nothing to send")]
    EmptyInput,
}

/// One conversation with the assistant backend.
///
/// Owns the thread id for the lifetime of the session. `submit` borrows the
/// session mutably, so a second message cannot start while a reply is still
/// streaming; callers stop a reply early through the cancellation token.
pub struct ChatSession {
    backend: Arc<dyn LabBackend>,
    thread: ThreadId,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn LabBackend>) -> Self {
        Self {
            backend,
            thread: ThreadId::default(),
        }
    }

    #[cfg(test)]
    pub fn thread(&self) -> &ThreadId {
        &self.thread
    }

    pub async fn submit<V>(
        &mut self,
        input: &str,
        view: &mut V,
        cancel: CancellationToken,
    ) -> Result<RenderOutcome, ChatError>
    where
        V: TranscriptView + ?Sized,
    {
        let input = input.trim();
        if input.is_empty() {
            return Err(ChatError::EmptyInput);
        }

        view.push_user(input);
        view.scroll_to_latest();
        view.open_assistant();
        view.scroll_to_latest();

        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            reply = self.backend.assistant(input, &self.thread) => Some(reply),
        };

        let reply = match reply {
            None => {
                conclude(view, &RenderOutcome::Cancelled);
                return Ok(RenderOutcome::Cancelled);
            }
            Some(Err(e)) => {
                tracing::warn!("Assistant request failed: {}", e);
                let outcome = RenderOutcome::Failed(e.to_string());
                conclude(view, &outcome);
                return Ok(outcome);
            }
            Some(Ok(reply)) => reply,
        };

        match reply.thread_id {
            Some(id) => {
                if id != self.thread {
                    tracing::debug!("Conversation thread is now {}", id);
                }
                self.thread = id;
            }
            None => tracing::warn!("Response carried no thread id; keeping {}", self.thread),
        }

        let outcome = StreamRenderer::new(self.backend.as_ref())
            .render(reply.body, view, &cancel)
            .await;
        Ok(outcome)
    }

    /// Forgets the thread and wipes the transcript.
    pub fn delete_conversation<V>(&mut self, view: &mut V)
    where
        V: TranscriptView + ?Sized,
    {
        self.thread.clear();
        view.clear();
        view.scroll_to_latest();
    }
}
