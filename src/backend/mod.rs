#[cfg(test)]
pub mod fake;
pub mod http;
pub mod traits;
pub mod types;

pub use http::HttpBackend;
pub use traits::LabBackend;
pub use types::{BackendError, ByteStream};
