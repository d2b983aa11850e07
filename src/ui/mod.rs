pub mod console;
pub mod input;
pub mod palette;
pub mod terminal;

pub use palette::Palette;
pub use terminal::TerminalTranscript;
