/// Header carrying the backend conversation thread in both directions.
pub const THREAD_HEADER: &str = "X-Thread-ID";

/// Opaque thread identifier issued by the assistant backend.
///
/// Empty until the first `/assistant` response assigns one. Lives only for
/// the lifetime of a session and is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadId(String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
