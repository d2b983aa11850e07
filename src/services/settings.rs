use anyhow::Result;

use super::database::Database;

const THEME_KEY: &str = "themeColor";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light_mode",
            Theme::Dark => "dark_mode",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "light_mode" | "light" => Some(Theme::Light),
            "dark_mode" | "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

pub struct SettingsService;

impl SettingsService {
    pub async fn load_theme(db: &Database) -> Theme {
        match db.get_setting(THEME_KEY).await {
            Ok(Some(value)) => Theme::from_str(&value).unwrap_or_else(|| {
                tracing::warn!("Ignoring unknown theme {:?}", value);
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                tracing::warn!("Failed to read theme: {}", e);
                Theme::default()
            }
        }
    }

    pub async fn save_theme(db: &Database, theme: Theme) -> Result<()> {
        db.set_setting(THEME_KEY, theme.as_str()).await
    }

    /// Flips the stored theme and returns the new one.
    pub async fn toggle_theme(db: &Database) -> Result<Theme> {
        let theme = Self::load_theme(db).await.toggled();
        Self::save_theme(db, theme).await?;
        Ok(theme)
    }
}
