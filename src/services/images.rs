use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use base64::Engine;

use crate::models::ImageRef;

/// Writes assistant images delivered as `data:` URLs to disk.
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns `None` for images that are already addressable by URL.
    pub fn save(&self, image: &ImageRef) -> Result<Option<PathBuf>> {
        let Some((mime, bytes)) = decode_data_url(&image.src)? else {
            return Ok(None);
        };

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create image directory: {}", self.dir.display()))?;

        let path = self
            .dir
            .join(format!("{}.{}", file_stem(&image.file_id), extension_for(&mime)));
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write image to {}", path.display()))?;
        Ok(Some(path))
    }
}

/// Splits `data:<mime>;base64,<payload>` into its mime type and decoded bytes.
pub fn decode_data_url(src: &str) -> Result<Option<(String, Vec<u8>)>> {
    let Some(rest) = src.strip_prefix("data:") else {
        return Ok(None);
    };
    let Some((meta, payload)) = rest.split_once(',') else {
        bail!("Malformed data URL");
    };
    let Some(mime) = meta.strip_suffix(";base64") else {
        bail!("Unsupported data URL encoding: {}", meta);
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .context("Invalid base64 image payload")?;
    Ok(Some((mime.to_string(), bytes)))
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        // the assistant backend only emits PNG charts
        _ => "png",
    }
}

fn file_stem(file_id: &str) -> String {
    let stem: String = file_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if stem.is_empty() {
        "image".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(file_id: &str, src: &str) -> ImageRef {
        ImageRef {
            file_id: file_id.to_string(),
            src: src.to_string(),
            saved_to: None,
        }
    }

    #[test]
    fn test_decode_png_data_url() {
        let (mime, bytes) = decode_data_url("data:image/png;base64,aGVsbG8=")
            .unwrap()
            .unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_plain_url_is_not_decoded() {
        assert!(decode_data_url("https://example.com/chart.png").unwrap().is_none());
    }

    #[test]
    fn test_bad_payload_is_an_error() {
        assert!(decode_data_url("data:image/png;base64,@@@").is_err());
        assert!(decode_data_url("data:image/png,raw").is_err());
    }

    #[test]
    fn test_file_stem_strips_path_characters() {
        assert_eq!(file_stem("../../etc/passwd"), "etcpasswd");
        assert_eq!(file_stem("file-abc_123"), "file-abc_123");
        assert_eq!(file_stem("///"), "image");
    }

    #[test]
    fn test_save_writes_decoded_bytes() {
        let dir = std::env::temp_dir().join(format!("lisa-images-{}", uuid::Uuid::new_v4()));
        let store = ImageStore::new(&dir);

        let saved = store
            .save(&image("file-1", "data:image/png;base64,aGVsbG8="))
            .unwrap()
            .unwrap();
        assert_eq!(saved, dir.join("file-1.png"));
        assert_eq!(std::fs::read(&saved).unwrap(), b"hello");

        assert!(store.save(&image("file-2", "/static/chart.png")).unwrap().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
