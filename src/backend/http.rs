use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::{Client, Response};
use url::Url;

use super::traits::LabBackend;
use super::types::{AssistantReply, BackendError, ByteStream};
use crate::models::{SlideAudio, SlideContent, SlideCount, ThreadId, THREAD_HEADER};

pub struct HttpBackend {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| BackendError::RequestFailed(format!("Invalid base URL {}: {}", base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        // Streaming bodies can run for minutes, so the timeout is applied per
        // request on the plain JSON endpoints only.
        let client = Client::builder()
            .build()
            .map_err(|e| BackendError::RequestFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    fn endpoint(&self, path: &str, query: Option<(&str, &str)>) -> Result<Url, BackendError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| BackendError::RequestFailed(format!("Invalid endpoint {}: {}", path, e)))?;
        if let Some((key, value)) = query {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }

    async fn check_status(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("Request failed").to_string()
        } else {
            body.trim().to_string()
        };
        Err(BackendError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| BackendError::NetworkError(e.to_string()))?;
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    fn body_stream(response: Response) -> ByteStream {
        Box::pin(
            response
                .bytes_stream()
                .map_err(|e| BackendError::NetworkError(format!("Stream error: {}", e))),
        )
    }
}

#[async_trait]
impl LabBackend for HttpBackend {
    async fn slide_count(&self) -> Result<usize, BackendError> {
        let url = self.endpoint("get_slide_count", None)?;
        let parsed: SlideCount = self.get_json(url).await?;
        Ok(parsed.count)
    }

    async fn slide(&self, index: usize) -> Result<SlideContent, BackendError> {
        let url = self.endpoint(&format!("get_slide/{}", index), None)?;
        self.get_json(url).await
    }

    async fn slide_audio(&self, index: usize) -> Result<String, BackendError> {
        let url = self.endpoint(&format!("get_audio/{}", index), None)?;
        // Narration is generated on demand, which can take far longer than a lookup.
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::NetworkError(e.to_string()))?;
        let response = Self::check_status(response).await?;
        let parsed: SlideAudio = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        Ok(parsed.audio_url)
    }

    async fn answer(&self, query: &str) -> Result<ByteStream, BackendError> {
        let url = self.endpoint("answer", Some(("query", query)))?;
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::NetworkError(e.to_string()))?;
        let response = Self::check_status(response).await?;
        Ok(Self::body_stream(response))
    }

    async fn assistant(
        &self,
        input: &str,
        thread: &ThreadId,
    ) -> Result<AssistantReply, BackendError> {
        let url = self.endpoint("assistant", Some(("input", input)))?;
        tracing::debug!(thread = %thread, "GET {}", url);
        let response = self
            .client
            .get(url)
            .header(THREAD_HEADER, thread.as_str())
            .send()
            .await
            .map_err(|e| BackendError::NetworkError(e.to_string()))?;
        let response = Self::check_status(response).await?;

        let thread_id = response
            .headers()
            .get(THREAD_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(ThreadId::new);

        Ok(AssistantReply {
            thread_id,
            body: Self::body_stream(response),
        })
    }

    async fn image_source(&self, file_id: &str) -> Result<String, BackendError> {
        let url = self.endpoint("image", Some(("id", file_id)))?;
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| BackendError::NetworkError(e.to_string()))?;
        let response = Self::check_status(response).await?;
        let src = response
            .text()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        let src = src.trim().to_string();
        if src.is_empty() {
            return Err(BackendError::InvalidResponse(format!(
                "No image source for {}",
                file_id
            )));
        }
        Ok(src)
    }
}
