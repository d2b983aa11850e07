use chrono::Utc;

use crate::models::{ImageRef, Message, Role};

/// Display surface for a chat transcript.
///
/// At most one assistant message is open at a time; text and images are
/// appended to it until `finish_assistant` closes it.
pub trait TranscriptView {
    /// Drops every message and shows the empty state.
    fn clear(&mut self);

    fn push_user(&mut self, text: &str);

    fn open_assistant(&mut self);

    fn append_text(&mut self, text: &str);

    fn insert_image(&mut self, image: ImageRef);

    /// Text shown so far in the open assistant message.
    fn current_text(&self) -> &str;

    fn scroll_to_latest(&mut self);

    fn finish_assistant(&mut self);
}

/// In-memory transcript. Also the state behind the terminal view.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    open: Option<usize>,
    scrolls: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn open_message(&self) -> Option<&Message> {
        self.open.and_then(|i| self.messages.get(i))
    }

    #[cfg(test)]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    #[cfg(test)]
    pub fn is_streaming(&self) -> bool {
        self.open.is_some()
    }

    /// How many times the view was asked to follow the latest content.
    #[cfg(test)]
    pub fn scroll_count(&self) -> usize {
        self.scrolls
    }

    fn open_mut(&mut self) -> Option<&mut Message> {
        match self.open {
            Some(i) => self.messages.get_mut(i),
            None => None,
        }
    }
}

impl TranscriptView for Transcript {
    fn clear(&mut self) {
        self.messages.clear();
        self.open = None;
    }

    fn push_user(&mut self, text: &str) {
        self.messages.push(Message::new(Role::User, text));
    }

    fn open_assistant(&mut self) {
        self.messages.push(Message::new(Role::Assistant, String::new()));
        self.open = Some(self.messages.len() - 1);
    }

    fn append_text(&mut self, text: &str) {
        match self.open_mut() {
            Some(message) => message.content.push_str(text),
            None => tracing::warn!("Dropping text with no open assistant message"),
        }
    }

    fn insert_image(&mut self, image: ImageRef) {
        match self.open_mut() {
            Some(message) => message.images.push(image),
            None => tracing::warn!("Dropping image {} with no open assistant message", image.file_id),
        }
    }

    fn current_text(&self) -> &str {
        self.open_message().map(|m| m.content.as_str()).unwrap_or("")
    }

    fn scroll_to_latest(&mut self) {
        self.scrolls += 1;
    }

    fn finish_assistant(&mut self) {
        if let Some(message) = self.open_message() {
            let elapsed = Utc::now() - message.created_at;
            tracing::debug!(
                "{:?} message {} finished after {} ms",
                message.role,
                message.id,
                elapsed.num_milliseconds()
            );
        }
        self.open = None;
    }
}
