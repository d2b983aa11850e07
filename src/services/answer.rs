use tokio_util::sync::CancellationToken;

use super::renderer::{conclude, RenderOutcome, StreamRenderer};
use super::transcript::TranscriptView;
use crate::backend::LabBackend;

/// Asks the retrieval backend a question and streams the answer into a
/// freshly cleared view. Returns `None` for a blank query.
pub async fn ask<V>(
    backend: &dyn LabBackend,
    query: &str,
    view: &mut V,
    cancel: &CancellationToken,
) -> Option<RenderOutcome>
where
    V: TranscriptView + ?Sized,
{
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    view.clear();
    view.open_assistant();

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        response = backend.answer(query) => Some(response),
    };

    let outcome = match response {
        None => {
            conclude(view, &RenderOutcome::Cancelled);
            RenderOutcome::Cancelled
        }
        Some(Ok(body)) => {
            StreamRenderer::text_only(backend)
                .render(body, view, cancel)
                .await
        }
        Some(Err(e)) => {
            tracing::warn!("Answer request failed: {}", e);
            let outcome = RenderOutcome::Failed(e.to_string());
            conclude(view, &outcome);
            outcome
        }
    };
    Some(outcome)
}
