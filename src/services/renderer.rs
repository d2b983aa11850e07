use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use super::decoder::Utf8StreamDecoder;
use super::transcript::TranscriptView;
use crate::backend::{BackendError, ByteStream, LabBackend};
use crate::models::ImageRef;

/// A chunk starting with this marker carries an image file id instead of text.
pub const IMAGE_MARKER: &str = "[[[IMAGEID]]]";

pub const STOPPED_NOTICE: &str = "Generation stopped.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk<'a> {
    Text(&'a str),
    Image(&'a str),
}

/// Splits a decoded chunk into text or an image reference.
///
/// Only a marker at the very start of the chunk is recognised. A marker that
/// the transport split across two chunks is shown as plain text.
pub fn classify(chunk: &str) -> Chunk<'_> {
    match chunk.strip_prefix(IMAGE_MARKER) {
        Some(file_id) => Chunk::Image(file_id.trim()),
        None => Chunk::Text(chunk),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Completed,
    Failed(String),
    Cancelled,
}

pub fn failure_notice(partial_text: &str, error: &str) -> String {
    if partial_text.is_empty() {
        format!("I'm sorry, but something went wrong ({}).", error)
    } else {
        format!("...I'm sorry, but something went wrong ({}).", error)
    }
}

/// Writes the closing state of a stream into the open message and closes it.
pub fn conclude<V>(view: &mut V, outcome: &RenderOutcome)
where
    V: TranscriptView + ?Sized,
{
    match outcome {
        RenderOutcome::Completed => {}
        RenderOutcome::Failed(error) => {
            let notice = failure_notice(view.current_text(), error);
            view.append_text(&notice);
        }
        RenderOutcome::Cancelled => {
            if view.current_text().is_empty() {
                view.append_text(STOPPED_NOTICE);
            }
        }
    }
    view.scroll_to_latest();
    view.finish_assistant();
}

/// Renders a chunked response body into the open assistant message.
pub struct StreamRenderer<'a> {
    backend: &'a dyn LabBackend,
    detect_images: bool,
}

impl<'a> StreamRenderer<'a> {
    pub fn new(backend: &'a dyn LabBackend) -> Self {
        Self {
            backend,
            detect_images: true,
        }
    }

    /// Renderer for plain text answers, where marker chunks are shown verbatim.
    pub fn text_only(backend: &'a dyn LabBackend) -> Self {
        Self {
            backend,
            detect_images: false,
        }
    }

    pub async fn render<V>(
        &self,
        body: ByteStream,
        view: &mut V,
        cancel: &CancellationToken,
    ) -> RenderOutcome
    where
        V: TranscriptView + ?Sized,
    {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => RenderOutcome::Cancelled,
            result = self.pump(body, &mut *view) => match result {
                Ok(()) => RenderOutcome::Completed,
                Err(e) => {
                    tracing::warn!("Response stream failed: {}", e);
                    RenderOutcome::Failed(e.to_string())
                }
            },
        };

        conclude(view, &outcome);
        outcome
    }

    async fn pump<V>(&self, mut body: ByteStream, view: &mut V) -> Result<(), BackendError>
    where
        V: TranscriptView + ?Sized,
    {
        let mut decoder = Utf8StreamDecoder::new();

        while let Some(bytes) = body.next().await {
            let bytes = bytes?;
            let chunk = decoder.decode(&bytes);
            self.apply(&chunk, view).await?;
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            view.append_text(&tail);
            view.scroll_to_latest();
        }
        Ok(())
    }

    async fn apply<V>(&self, chunk: &str, view: &mut V) -> Result<(), BackendError>
    where
        V: TranscriptView + ?Sized,
    {
        if chunk.is_empty() {
            return Ok(());
        }

        let kind = if self.detect_images {
            classify(chunk)
        } else {
            Chunk::Text(chunk)
        };

        match kind {
            Chunk::Text(text) => view.append_text(text),
            Chunk::Image(file_id) => {
                if file_id.is_empty() {
                    return Err(BackendError::InvalidResponse(
                        "Image marker without a file id".to_string(),
                    ));
                }
                tracing::debug!("Resolving image {}", file_id);
                let src = self.backend.image_source(file_id).await?;
                view.insert_image(ImageRef {
                    file_id: file_id.to_string(),
                    src,
                    saved_to: None,
                });
            }
        }

        view.scroll_to_latest();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::backend::fake::{Call, ScriptedBackend, Step};
    use crate::services::transcript::Transcript;

    async fn render_steps(
        renderer: StreamRenderer<'_>,
        steps: Vec<Step>,
    ) -> (Transcript, RenderOutcome) {
        let mut view = Transcript::new();
        view.open_assistant();
        let outcome = renderer
            .render(ScriptedBackend::stream(steps), &mut view, &CancellationToken::new())
            .await;
        (view, outcome)
    }

    fn shown(view: &Transcript) -> &str {
        &view.last_message().unwrap().content
    }

    #[test]
    fn test_classify_marker_at_start() {
        assert_eq!(classify("[[[IMAGEID]]]file-42"), Chunk::Image("file-42"));
        assert_eq!(classify("see [[[IMAGEID]]]x"), Chunk::Text("see [[[IMAGEID]]]x"));
        assert_eq!(classify("[[[IMAGE"), Chunk::Text("[[[IMAGE"));
    }

    #[test]
    fn test_failure_notice_prefix_and_suffix_forms() {
        assert_eq!(
            failure_notice("", "boom"),
            "I'm sorry, but something went wrong (boom)."
        );
        assert_eq!(
            failure_notice("Partial", "boom"),
            "...I'm sorry, but something went wrong (boom)."
        );
    }

    #[tokio::test]
    async fn test_text_chunks_are_appended_in_order() {
        let backend = ScriptedBackend::new();
        let (view, outcome) = render_steps(
            StreamRenderer::new(&backend),
            vec![Step::text("Hello "), Step::text("world")],
        )
        .await;

        assert_eq!(outcome, RenderOutcome::Completed);
        assert_eq!(shown(&view), "Hello world");
        assert!(!view.is_streaming());
        // one per chunk plus the final one
        assert_eq!(view.scroll_count(), 3);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_multibyte_text_survives_byte_sized_chunks() {
        let text = "naïve café 📈 ok";
        let steps = text.bytes().map(|b| Step::Chunk(vec![b])).collect();
        let backend = ScriptedBackend::new();
        let (view, outcome) = render_steps(StreamRenderer::new(&backend), steps).await;

        assert_eq!(outcome, RenderOutcome::Completed);
        assert_eq!(shown(&view), text);
    }

    #[tokio::test]
    async fn test_image_marker_resolves_and_inserts_image() {
        let backend = ScriptedBackend::new().with_image("42", "data:image/png;base64,iVBORw0K");
        let (view, outcome) = render_steps(
            StreamRenderer::new(&backend),
            vec![Step::text("[[[IMAGEID]]]42")],
        )
        .await;

        assert_eq!(outcome, RenderOutcome::Completed);
        let message = view.last_message().unwrap();
        assert_eq!(message.content, "");
        assert_eq!(message.images.len(), 1);
        assert_eq!(message.images[0].file_id, "42");
        assert_eq!(message.images[0].src, "data:image/png;base64,iVBORw0K");
        assert_eq!(backend.calls(), vec![Call::Image("42".to_string())]);
    }

    #[tokio::test]
    async fn test_text_around_image_is_kept() {
        let backend = ScriptedBackend::new().with_image("file-7", "https://img/7.png");
        let (view, _) = render_steps(
            StreamRenderer::new(&backend),
            vec![
                Step::text("Here is the chart."),
                Step::text("[[[IMAGEID]]]file-7"),
                Step::text(" Sales rose."),
            ],
        )
        .await;

        let message = view.last_message().unwrap();
        assert_eq!(message.content, "Here is the chart. Sales rose.");
        assert_eq!(message.images[0].src, "https://img/7.png");
    }

    #[tokio::test]
    async fn test_failed_image_stops_stream_after_partial_text() {
        let backend = ScriptedBackend::new().with_failing_image("bad", "quota");
        let (view, outcome) = render_steps(
            StreamRenderer::new(&backend),
            vec![
                Step::text("Partial "),
                Step::text("[[[IMAGEID]]]bad"),
                Step::text("never shown"),
            ],
        )
        .await;

        assert_eq!(outcome, RenderOutcome::Failed("HTTP 500: quota".to_string()));
        assert_eq!(
            shown(&view),
            "Partial ...I'm sorry, but something went wrong (HTTP 500: quota)."
        );
        assert!(view.last_message().unwrap().images.is_empty());
    }

    #[tokio::test]
    async fn test_read_error_before_any_text_uses_prefix_form() {
        let backend = ScriptedBackend::new();
        let (view, outcome) = render_steps(
            StreamRenderer::new(&backend),
            vec![Step::Fail("connection reset".to_string())],
        )
        .await;

        assert!(matches!(outcome, RenderOutcome::Failed(_)));
        assert_eq!(
            shown(&view),
            "I'm sorry, but something went wrong (Network error: connection reset)."
        );
    }

    #[tokio::test]
    async fn test_empty_marker_is_an_error() {
        let backend = ScriptedBackend::new();
        let (_, outcome) = render_steps(
            StreamRenderer::new(&backend),
            vec![Step::text("[[[IMAGEID]]]")],
        )
        .await;

        assert!(matches!(outcome, RenderOutcome::Failed(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_text_only_renderer_ignores_markers() {
        let backend = ScriptedBackend::new();
        let (view, outcome) = render_steps(
            StreamRenderer::text_only(&backend),
            vec![Step::text("[[[IMAGEID]]]42")],
        )
        .await;

        assert_eq!(outcome, RenderOutcome::Completed);
        assert_eq!(shown(&view), "[[[IMAGEID]]]42");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_keeps_partial_text() {
        let backend = ScriptedBackend::new();
        let renderer = StreamRenderer::new(&backend);
        let cancel = CancellationToken::new();
        let mut view = Transcript::new();
        view.open_assistant();

        let body = ScriptedBackend::stream(vec![Step::text("Half"), Step::Hang]);
        let (outcome, _) = tokio::join!(renderer.render(body, &mut view, &cancel), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        assert_eq!(outcome, RenderOutcome::Cancelled);
        assert_eq!(shown(&view), "Half");
        assert!(!view.is_streaming());
    }

    #[tokio::test]
    async fn test_cancel_before_any_text_shows_stopped() {
        let backend = ScriptedBackend::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut view = Transcript::new();
        view.open_assistant();

        let outcome = StreamRenderer::new(&backend)
            .render(ScriptedBackend::stream(vec![Step::Hang]), &mut view, &cancel)
            .await;

        assert_eq!(outcome, RenderOutcome::Cancelled);
        assert_eq!(shown(&view), STOPPED_NOTICE);
    }
}
