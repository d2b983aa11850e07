use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const APP_NAME: &str = "lisa";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn new(base_url: String, data_dir: Option<PathBuf>, timeout_secs: u64) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        Ok(Self {
            base_url,
            data_dir,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("settings.db")
    }

    pub fn image_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let data_dir = match std::env::var("XDG_DATA_HOME") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let home = std::env::var("HOME").context("Neither XDG_DATA_HOME nor HOME is set")?;
            PathBuf::from(home).join(".local/share")
        }
    };
    Ok(data_dir.join(APP_NAME))
}
