use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SlideCount {
    #[serde(deserialize_with = "count_from_number_or_string")]
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SlideContent {
    #[serde(default)]
    pub image_url: String,
    /// Empty when no narration has been generated for the slide yet.
    #[serde(default)]
    pub audio_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SlideAudio {
    #[serde(default)]
    pub audio_url: String,
}

// The slide server formats the count as a string.
fn count_from_number_or_string<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(usize),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
