use crossterm::style::Color;

use crate::services::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub user: Color,
    pub assistant: Color,
    pub text: Color,
    pub muted: Color,
    pub link: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                user: Color::Rgb { r: 206, g: 66, b: 43 },
                assistant: Color::Rgb { r: 139, g: 233, b: 253 },
                text: Color::Rgb { r: 235, g: 235, b: 235 },
                muted: Color::Rgb { r: 140, g: 140, b: 140 },
                link: Color::Rgb { r: 80, g: 250, b: 123 },
            },
            Theme::Light => Self {
                user: Color::Rgb { r: 170, g: 50, b: 30 },
                assistant: Color::Rgb { r: 16, g: 110, b: 190 },
                text: Color::Rgb { r: 30, g: 30, b: 30 },
                muted: Color::Rgb { r: 110, g: 110, b: 110 },
                link: Color::Rgb { r: 20, g: 130, b: 60 },
            },
        }
    }
}
