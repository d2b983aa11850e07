//! Scripted in-process backend used by the service tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};

use super::traits::LabBackend;
use super::types::{AssistantReply, BackendError, ByteStream};
use crate::models::{SlideContent, ThreadId};

#[derive(Debug, Clone)]
pub enum Step {
    Chunk(Vec<u8>),
    Fail(String),
    /// Never yields again; only meaningful as the last step.
    Hang,
}

impl Step {
    pub fn text(s: &str) -> Self {
        Step::Chunk(s.as_bytes().to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SlideCount,
    Slide(usize),
    SlideAudio(usize),
    Answer(String),
    Assistant { input: String, thread: String },
    Image(String),
}

#[derive(Default)]
pub struct ScriptedBackend {
    slides: Vec<SlideContent>,
    issued_thread: Option<String>,
    assistant_replies: Mutex<VecDeque<Result<Vec<Step>, String>>>,
    answer: Mutex<Option<Vec<Step>>>,
    answer_hangs: bool,
    audio_hangs: bool,
    images: HashMap<String, Result<String, String>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Thread id handed out when a request arrives without one.
    pub fn with_thread(mut self, id: &str) -> Self {
        self.issued_thread = Some(id.to_string());
        self
    }

    pub fn with_assistant_reply(self, steps: Vec<Step>) -> Self {
        self.assistant_replies.lock().unwrap().push_back(Ok(steps));
        self
    }

    pub fn with_failing_assistant(self, message: &str) -> Self {
        self.assistant_replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn with_answer(self, steps: Vec<Step>) -> Self {
        *self.answer.lock().unwrap() = Some(steps);
        self
    }

    /// `/answer` never sends its response headers.
    pub fn with_hanging_answer(mut self) -> Self {
        self.answer_hangs = true;
        self
    }

    /// Narration generation never finishes.
    pub fn with_hanging_audio(mut self) -> Self {
        self.audio_hangs = true;
        self
    }

    pub fn with_image(mut self, id: &str, src: &str) -> Self {
        self.images.insert(id.to_string(), Ok(src.to_string()));
        self
    }

    pub fn with_failing_image(mut self, id: &str, message: &str) -> Self {
        self.images.insert(id.to_string(), Err(message.to_string()));
        self
    }

    pub fn with_slides(mut self, slides: Vec<SlideContent>) -> Self {
        self.slides = slides;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn stream(steps: Vec<Step>) -> ByteStream {
        let hang = matches!(steps.last(), Some(Step::Hang));
        let items: Vec<Result<Bytes, BackendError>> = steps
            .into_iter()
            .filter_map(|step| match step {
                Step::Chunk(bytes) => Some(Ok(Bytes::from(bytes))),
                Step::Fail(message) => Some(Err(BackendError::NetworkError(message))),
                Step::Hang => None,
            })
            .collect();
        let head = stream::iter(items);
        if hang {
            return Box::pin(head.chain(stream::pending()));
        }
        Box::pin(head)
    }
}

#[async_trait]
impl LabBackend for ScriptedBackend {
    async fn slide_count(&self) -> Result<usize, BackendError> {
        self.record(Call::SlideCount);
        Ok(self.slides.len())
    }

    async fn slide(&self, index: usize) -> Result<SlideContent, BackendError> {
        self.record(Call::Slide(index));
        Ok(self.slides.get(index).cloned().unwrap_or_default())
    }

    async fn slide_audio(&self, index: usize) -> Result<String, BackendError> {
        self.record(Call::SlideAudio(index));
        if self.audio_hangs {
            futures::future::pending::<()>().await;
        }
        if index >= self.slides.len() {
            return Err(BackendError::Status {
                status: 404,
                message: "Not Found".to_string(),
            });
        }
        Ok(format!("static/audio/{:02}.mp3", index))
    }

    async fn answer(&self, query: &str) -> Result<ByteStream, BackendError> {
        self.record(Call::Answer(query.to_string()));
        if self.answer_hangs {
            futures::future::pending::<()>().await;
        }
        let steps = self.answer.lock().unwrap().take().unwrap_or_default();
        Ok(Self::stream(steps))
    }

    async fn assistant(
        &self,
        input: &str,
        thread: &ThreadId,
    ) -> Result<AssistantReply, BackendError> {
        self.record(Call::Assistant {
            input: input.to_string(),
            thread: thread.as_str().to_string(),
        });

        let next = self.assistant_replies.lock().unwrap().pop_front();
        let steps = match next {
            Some(Ok(steps)) => steps,
            Some(Err(message)) => return Err(BackendError::NetworkError(message)),
            None => Vec::new(),
        };

        let thread_id = if thread.is_empty() {
            self.issued_thread.as_deref().map(ThreadId::new)
        } else {
            Some(thread.clone())
        };

        Ok(AssistantReply {
            thread_id,
            body: Self::stream(steps),
        })
    }

    async fn image_source(&self, file_id: &str) -> Result<String, BackendError> {
        self.record(Call::Image(file_id.to_string()));
        match self.images.get(file_id) {
            Some(Ok(src)) => Ok(src.clone()),
            Some(Err(message)) => Err(BackendError::Status {
                status: 500,
                message: message.clone(),
            }),
            None => Err(BackendError::Status {
                status: 404,
                message: format!("No such file: {}", file_id),
            }),
        }
    }
}
