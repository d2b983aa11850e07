pub mod message;
pub mod slide;
pub mod thread;

pub use message::{ImageRef, Message, Role};
pub use slide::{SlideAudio, SlideContent, SlideCount};
pub use thread::{ThreadId, THREAD_HEADER};
