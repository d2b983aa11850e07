pub mod answer;
pub mod chat;
pub mod database;
pub mod decoder;
pub mod images;
pub mod renderer;
pub mod settings;
pub mod slides;
pub mod transcript;

pub use chat::{ChatError, ChatSession};
pub use database::Database;
pub use images::ImageStore;
pub use settings::{SettingsService, Theme};
pub use slides::SlideViewer;
pub use transcript::{Transcript, TranscriptView};
