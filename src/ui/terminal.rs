use std::io::{self, Write};

use crossterm::{
    cursor::MoveLeft,
    queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
};

use super::palette::Palette;
use crate::models::ImageRef;
use crate::services::{ImageStore, Transcript, TranscriptView};

const TYPING: &str = "...";
const IMAGE_ALT: &str = "llm-generated chart";

/// Transcript printed to a terminal as it streams.
pub struct TerminalTranscript<W: Write> {
    out: W,
    palette: Palette,
    transcript: Transcript,
    images: Option<ImageStore>,
    greeting: bool,
    typing: bool,
}

impl TerminalTranscript<io::Stdout> {
    pub fn stdout(palette: Palette) -> Self {
        Self::new(io::stdout(), palette)
    }
}

impl<W: Write> TerminalTranscript<W> {
    pub fn new(out: W, palette: Palette) -> Self {
        Self {
            out,
            palette,
            transcript: Transcript::new(),
            images: None,
            greeting: false,
            typing: false,
        }
    }

    /// Show the assistant greeting whenever the transcript is cleared.
    pub fn with_greeting(mut self) -> Self {
        self.greeting = true;
        self
    }

    pub fn with_image_store(mut self, store: ImageStore) -> Self {
        self.images = Some(store);
        self
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    #[cfg(test)]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn stop_typing(&mut self) {
        if self.typing {
            queue!(
                self.out,
                MoveLeft(TYPING.len() as u16),
                Clear(ClearType::UntilNewLine),
                SetForegroundColor(self.palette.text)
            )
            .ok();
            self.typing = false;
        }
    }

    fn print_greeting(&mut self) {
        queue!(
            self.out,
            Print("\n"),
            SetForegroundColor(self.palette.assistant),
            SetAttribute(Attribute::Bold),
            Print("  Ask LISA\n"),
            SetAttribute(Attribute::Reset),
            SetForegroundColor(self.palette.muted),
            Print("  I'm LISA, your AI-powered virtual assistant.\n"),
            Print("  How can I help you today?\n"),
            ResetColor
        )
        .ok();
    }

    fn describe_image(&self, image: &ImageRef) -> String {
        match &image.saved_to {
            Some(path) => path.display().to_string(),
            None if image.src.starts_with("data:") => "(inline image could not be saved)".to_string(),
            None => image.src.clone(),
        }
    }
}

impl<W: Write> TranscriptView for TerminalTranscript<W> {
    fn clear(&mut self) {
        self.stop_typing();
        self.transcript.clear();
        if self.greeting {
            self.print_greeting();
        }
    }

    fn push_user(&mut self, text: &str) {
        self.transcript.push_user(text);
        queue!(
            self.out,
            Print("\n"),
            SetForegroundColor(self.palette.user),
            SetAttribute(Attribute::Bold),
            Print("▸ "),
            SetAttribute(Attribute::Reset),
            SetForegroundColor(self.palette.text),
            Print(text),
            ResetColor,
            Print("\n")
        )
        .ok();
    }

    fn open_assistant(&mut self) {
        self.transcript.open_assistant();
        queue!(
            self.out,
            Print("\n"),
            SetForegroundColor(self.palette.assistant),
            SetAttribute(Attribute::Bold),
            Print("◆ "),
            SetAttribute(Attribute::Reset),
            SetForegroundColor(self.palette.muted),
            Print(TYPING)
        )
        .ok();
        self.typing = true;
    }

    fn append_text(&mut self, text: &str) {
        self.stop_typing();
        self.transcript.append_text(text);
        queue!(self.out, Print(text)).ok();
    }

    fn insert_image(&mut self, mut image: ImageRef) {
        self.stop_typing();
        if let Some(store) = &self.images {
            match store.save(&image) {
                Ok(path) => image.saved_to = path,
                Err(e) => tracing::warn!("Failed to save image {}: {:#}", image.file_id, e),
            }
        }
        let location = self.describe_image(&image);
        queue!(
            self.out,
            Print("\n"),
            SetForegroundColor(self.palette.muted),
            Print(format!("  [{}] ", IMAGE_ALT)),
            SetForegroundColor(self.palette.link),
            Print(location),
            SetForegroundColor(self.palette.text),
            Print("\n")
        )
        .ok();
        self.transcript.insert_image(image);
    }

    fn current_text(&self) -> &str {
        self.transcript.current_text()
    }

    fn scroll_to_latest(&mut self) {
        self.transcript.scroll_to_latest();
        self.out.flush().ok();
    }

    fn finish_assistant(&mut self) {
        self.stop_typing();
        self.transcript.finish_assistant();
        queue!(self.out, ResetColor, Print("\n")).ok();
        self.out.flush().ok();
    }
}
