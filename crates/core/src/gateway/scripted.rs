//! Scripted backend for tests and offline demos.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use super::backends::{GenerateRequest, ModelBackend};
use crate::error::BackendError;

type Responder = dyn Fn(&GenerateRequest<'_>) -> Result<String, String> + Send + Sync;

/// A backend that replays pre-recorded replies.
///
/// Queued replies are consumed first; once the queue is empty the responder
/// (if any) answers, otherwise the call fails with "script exhausted".
pub struct ScriptedBackend {
    name: String,
    replies: Mutex<VecDeque<Result<String, String>>>,
    responder: Option<Box<Responder>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(VecDeque::new()),
            responder: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A backend whose every call fails.
    pub fn failing(name: impl Into<String>) -> Self {
        Self::new(name).with_responder(|_| Err("simulated backend failure".to_string()))
    }

    /// A backend that answers every call with the same text.
    pub fn always(name: impl Into<String>, reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self::new(name).with_responder(move |_| Ok(reply.clone()))
    }

    /// Queue one successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()))
    }

    /// Queue one failure.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()))
    }

    fn push(mut self, reply: Result<String, String>) -> Self {
        self.replies.get_mut().push_back(reply);
        self
    }

    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&GenerateRequest<'_>) -> Result<String, String> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Sleep before answering, to exercise the attempt timeout.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `generate` calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self.replies.lock().await.pop_front();
        let reply = match (queued, &self.responder) {
            (Some(reply), _) => reply,
            (None, Some(responder)) => responder(request),
            (None, None) => Err("script exhausted".to_string()),
        };
        reply.map_err(BackendError::Scripted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerateRequest<'static> {
        GenerateRequest {
            system_instruction: "sys",
            user_prompt: "user",
            include_thoughts: false,
        }
    }

    #[tokio::test]
    async fn test_queue_then_exhausted() {
        let backend = ScriptedBackend::new("s").reply("one").fail("boom");

        assert_eq!(backend.generate(&request()).await.unwrap(), "one");
        assert!(matches!(
            backend.generate(&request()).await,
            Err(BackendError::Scripted(msg)) if msg == "boom"
        ));
        assert!(backend.generate(&request()).await.is_err());
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_responder_sees_prompt() {
        let backend = ScriptedBackend::new("echo")
            .with_responder(|req| Ok(format!("{}|{}", req.system_instruction, req.user_prompt)));
        assert_eq!(backend.generate(&request()).await.unwrap(), "sys|user");
    }
}
