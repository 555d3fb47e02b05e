//! Fragment types, the producer contract, and channel plumbing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};

use crate::error::{Result, TagflowError};

/// Which output channel a fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    /// Visible answer text
    Answer,
    /// Model reasoning narration
    Reasoning,
}

/// One incremental piece of producer output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub text: String,
}

impl Fragment {
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            kind: FragmentKind::Answer,
            text: text.into(),
        }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            kind: FragmentKind::Reasoning,
            text: text.into(),
        }
    }
}

/// Events delivered over a fragment stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentEvent {
    Fragment(Fragment),
    /// Producer finished cleanly
    Done,
    /// Producer failed mid-stream
    Error(String),
}

/// Handle for receiving fragment events from a producer.
pub struct FragmentStream {
    receiver: mpsc::Receiver<FragmentEvent>,
}

impl FragmentStream {
    pub fn new(receiver: mpsc::Receiver<FragmentEvent>) -> Self {
        Self { receiver }
    }

    /// Receive the next event. `None` means the sender hung up without a
    /// terminal event, which callers treat like `Done`.
    pub async fn recv(&mut self) -> Option<FragmentEvent> {
        self.receiver.recv().await
    }
}

/// Builder for fragment channel pairs (sender and stream handle).
pub fn create_fragment_channel(buffer_size: usize) -> (mpsc::Sender<FragmentEvent>, FragmentStream) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (tx, FragmentStream::new(rx))
}

/// Cooperative cancellation signal, checked at fragment and round boundaries.
/// Once observed, no further producer invocations are made.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Observers may process at most one more fragment.
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Role of a message in the producer's context window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message of prior context handed to the producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// External producer of typed fragment streams. Each call is one model
/// invocation; the implementation must respect the abort signal.
#[async_trait]
pub trait FragmentProducer: Send + Sync {
    async fn stream(
        &self,
        system_prompt: &str,
        messages: &[Message],
        abort: &AbortSignal,
    ) -> Result<FragmentStream>;
}

/// Scripted producer for tests and offline replay. Each invocation pops the
/// next fragment script and streams it.
pub struct ScriptedProducer {
    scripts: Mutex<VecDeque<Vec<Fragment>>>,
}

impl ScriptedProducer {
    pub fn new(scripts: Vec<Vec<Fragment>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
        }
    }

    /// Convenience for a producer that answers once with a single text blob.
    pub fn single_answer(text: impl Into<String>) -> Self {
        Self::new(vec![vec![Fragment::answer(text)]])
    }
}

#[async_trait]
impl FragmentProducer for ScriptedProducer {
    async fn stream(
        &self,
        _system_prompt: &str,
        _messages: &[Message],
        _abort: &AbortSignal,
    ) -> Result<FragmentStream> {
        let script = self
            .scripts
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| TagflowError::Producer("scripted producer exhausted".to_string()))?;

        let (tx, stream) = create_fragment_channel(script.len().max(1));
        tokio::spawn(async move {
            for fragment in script {
                if tx.send(FragmentEvent::Fragment(fragment)).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(FragmentEvent::Done).await;
        });

        Ok(stream)
    }
}
