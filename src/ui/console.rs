use std::io::{self, Write};

use crossterm::{
    execute,
    style::{Attribute, Print, ResetColor, SetAttribute, SetForegroundColor},
};
use url::Url;

use super::palette::Palette;
use crate::services::slides::LoadedSlide;

pub fn print_prompt(palette: &Palette) {
    let mut stdout = io::stdout();
    execute!(
        stdout,
        Print("\n"),
        SetForegroundColor(palette.user),
        SetAttribute(Attribute::Bold),
        Print("▸"),
        SetAttribute(Attribute::Reset),
        ResetColor,
        Print(" ")
    )
    .ok();
    stdout.flush().ok();
}

pub fn print_notice(palette: &Palette, text: &str) {
    execute!(
        io::stdout(),
        SetForegroundColor(palette.muted),
        Print(format!("  {}\n", text)),
        ResetColor
    )
    .ok();
}

/// Stand-in for a browser alert: the error is shown and the viewer carries on.
pub fn print_alert(palette: &Palette, text: &str) {
    execute!(
        io::stdout(),
        SetForegroundColor(palette.user),
        SetAttribute(Attribute::Bold),
        Print("  ! "),
        SetAttribute(Attribute::Reset),
        SetForegroundColor(palette.text),
        Print(format!("{}\n", text)),
        ResetColor
    )
    .ok();
}

pub fn print_chat_help(palette: &Palette) {
    print_notice(palette, "Commands:");
    print_notice(palette, "  /delete  - Delete the conversation");
    print_notice(palette, "  /theme   - Toggle light and dark mode");
    print_notice(palette, "  /exit    - Exit");
    print_notice(palette, "  /help    - Show this help");
    print_notice(palette, "Press Ctrl+C to stop a reply.");
}

pub fn print_overlay(palette: &Palette, visible: bool) {
    let text = if visible {
        "  Generating narration...\n"
    } else {
        "  Narration ready.\n"
    };
    execute!(
        io::stdout(),
        SetForegroundColor(palette.muted),
        Print(text),
        ResetColor
    )
    .ok();
}

pub fn print_slide(palette: &Palette, base_url: &str, slide: &LoadedSlide, count: usize) {
    let audio_label = if slide.narration_generated {
        "audio (new)"
    } else {
        "audio"
    };
    execute!(
        io::stdout(),
        Print("\n"),
        SetForegroundColor(palette.assistant),
        SetAttribute(Attribute::Bold),
        Print(format!("  Slide {}/{}\n", slide.index + 1, count)),
        SetAttribute(Attribute::Reset),
        SetForegroundColor(palette.muted),
        Print("  image        "),
        SetForegroundColor(palette.link),
        Print(format!("{}\n", absolute_url(base_url, &slide.image_url))),
        SetForegroundColor(palette.muted),
        Print(format!("  {:<12} ", audio_label)),
        SetForegroundColor(palette.link),
        Print(format!("{}\n", absolute_url(base_url, &slide.audio_url))),
        ResetColor
    )
    .ok();
}

/// Slide media paths come back relative to the lab server.
pub fn absolute_url(base_url: &str, path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let base = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    };
    match Url::parse(&base).and_then(|b| b.join(path)) {
        Ok(url) => url.to_string(),
        Err(_) => path.to_string(),
    }
}
