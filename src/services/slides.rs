use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::backend::{BackendError, LabBackend};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSlide {
    pub index: usize,
    pub image_url: String,
    pub audio_url: String,
    /// True when the narration had to be generated for this load.
    pub narration_generated: bool,
}

/// Paging state for the narrated slide viewer.
pub struct SlideViewer {
    backend: Arc<dyn LabBackend>,
    index: usize,
    count: usize,
}

impl SlideViewer {
    pub async fn open(backend: Arc<dyn LabBackend>) -> Result<Self, BackendError> {
        let count = backend.slide_count().await?;
        tracing::debug!("Deck has {} slides", count);
        Ok(Self {
            backend,
            index: 0,
            count,
        })
    }

    #[cfg(test)]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn can_prev(&self) -> bool {
        self.index > 0
    }

    pub fn can_next(&self) -> bool {
        self.index + 1 < self.count
    }

    pub fn next(&mut self) -> bool {
        if self.can_next() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.can_prev() {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Loads the current slide, or returns `None` if `cancel` fires first.
    /// `overlay` is called with `true` before narration is generated and
    /// with `false` once that ends, whether it succeeded, failed or was
    /// cancelled.
    pub async fn load<F>(
        &self,
        cancel: &CancellationToken,
        mut overlay: F,
    ) -> Result<Option<LoadedSlide>, BackendError>
    where
        F: FnMut(bool),
    {
        let content = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(None),
            content = self.backend.slide(self.index) => content?,
        };

        if !content.audio_url.is_empty() {
            return Ok(Some(LoadedSlide {
                index: self.index,
                image_url: content.image_url,
                audio_url: content.audio_url,
                narration_generated: false,
            }));
        }

        overlay(true);
        let audio = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            audio = self.backend.slide_audio(self.index) => Some(audio),
        };
        overlay(false);

        let Some(audio) = audio else {
            tracing::debug!("Narration for slide {} cancelled", self.index);
            return Ok(None);
        };

        Ok(Some(LoadedSlide {
            index: self.index,
            image_url: content.image_url,
            audio_url: audio?,
            narration_generated: true,
        }))
    }
}
