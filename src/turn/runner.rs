//! TurnRunner - runs one full turn from streaming to final parse.
//!
//! One turn is a single sequential async flow: stream the producer's
//! fragments through the multiplexer, re-invoke the producer while the
//! document ends inside an unclosed write tag (up to the configured ceiling),
//! hand the completed document to the auto-fix collaborator when enabled,
//! then parse once and return a structured result. Cancellation is
//! cooperative: checked before each fragment and at the top of each
//! continuation round, and always yields a partial result rather than an
//! error.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, TagflowError};
use crate::stream::{AbortSignal, FragmentEvent, FragmentProducer, Message, Multiplexer};
use crate::tags::{ParsedResult, is_truncated, parse_document};
use crate::turn::config::{TurnConfig, TurnMode};

/// Observational lifecycle events for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    Start,
    Chunk { delta: String },
    End,
    Error { message: String },
}

/// Receives turn events. Purely observational; return values are ignored.
pub trait EventSink: Send + Sync {
    fn on_event(&self, _event: &TurnEvent) {}
}

/// Event sink that ignores everything.
pub struct NullEventSink;

impl EventSink for NullEventSink {}

/// Invoked after every non-empty emission with the accumulated document and
/// the latest increment. The returned document replaces the accumulated one,
/// so a transforming observer (e.g. live display rewriting) feeds back into
/// the next append.
#[async_trait]
pub trait ChunkObserver: Send + Sync {
    async fn on_chunk(&self, accumulated: String, _delta: &str) -> String {
        accumulated
    }
}

/// Observer that keeps the document unchanged.
pub struct NullObserver;

impl ChunkObserver for NullObserver {}

/// Result of one auto-fix invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    /// Document to carry forward as the turn's final document
    pub document: String,
    /// How many repair rounds the collaborator reports
    pub attempts: u32,
}

/// External diagnostic/repair collaborator. Runs at most once per turn, only
/// in Build mode with auto-fix enabled.
#[async_trait]
pub trait AutoFixer: Send + Sync {
    async fn fix(&self, document: String) -> Result<FixOutcome>;
}

/// Auto-fixer that changes nothing.
pub struct NoAutoFixer;

#[async_trait]
impl AutoFixer for NoAutoFixer {
    async fn fix(&self, document: String) -> Result<FixOutcome> {
        Ok(FixOutcome { document, attempts: 0 })
    }
}

/// Structured outcome of one `process` call.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    /// The final tagged document
    pub full_response: String,
    /// Operations extracted from the final document
    pub parsed: ParsedResult,
    /// True when the continuation ceiling was reached while still truncated
    pub was_truncated: bool,
    /// Repair rounds reported by the auto-fix collaborator
    pub auto_fix_attempts: u32,
    /// True when cancellation cut the turn short
    pub was_aborted: bool,
}

/// Mutable per-call record. Created fresh for every `process` invocation.
#[derive(Debug, Default)]
struct TurnState {
    document: String,
    continuation_rounds: u32,
    auto_fix_attempts: u32,
    aborted: bool,
}

/// Orchestrates one turn against an external fragment producer.
pub struct TurnRunner<P: FragmentProducer> {
    producer: Arc<P>,
    config: TurnConfig,
    observer: Arc<dyn ChunkObserver>,
    events: Arc<dyn EventSink>,
    fixer: Arc<dyn AutoFixer>,
}

impl<P: FragmentProducer> TurnRunner<P> {
    pub fn new(producer: Arc<P>, config: TurnConfig) -> Self {
        Self {
            producer,
            config,
            observer: Arc::new(NullObserver),
            events: Arc::new(NullEventSink),
            fixer: Arc::new(NoAutoFixer),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ChunkObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_fixer(mut self, fixer: Arc<dyn AutoFixer>) -> Self {
        self.fixer = fixer;
        self
    }

    /// Run one full turn and return the structured result.
    ///
    /// Producer failures propagate after being reported through the event
    /// sink, unless attributable to cancellation, in which case the partial
    /// document is returned with `was_aborted: true`.
    pub async fn process(
        &self,
        system_prompt: &str,
        messages: &[Message],
        abort: &AbortSignal,
    ) -> Result<TurnResult> {
        self.events.on_event(&TurnEvent::Start);
        let mut state = TurnState::default();

        self.checked_round(system_prompt, messages, abort, &mut state).await?;

        while !state.aborted
            && !abort.is_aborted()
            && state.continuation_rounds < self.config.max_continuation_rounds
            && is_truncated(&state.document)
        {
            debug!(round = state.continuation_rounds + 1, "continuing truncated document");
            // The partial document rides along as a synthetic prior answer.
            let mut continued = messages.to_vec();
            continued.push(Message::assistant(state.document.clone()));
            self.checked_round(system_prompt, &continued, abort, &mut state).await?;
            state.continuation_rounds += 1;
        }

        if !state.aborted && self.config.auto_fix_enabled && self.config.mode == TurnMode::Build {
            match self.fixer.fix(state.document.clone()).await {
                Ok(outcome) => {
                    state.document = outcome.document;
                    state.auto_fix_attempts = outcome.attempts;
                }
                Err(err) => {
                    self.events.on_event(&TurnEvent::Error {
                        message: err.to_string(),
                    });
                    return Err(err);
                }
            }
        }

        let parsed = parse_document(&state.document);
        let was_truncated = is_truncated(&state.document);
        self.events.on_event(&TurnEvent::End);

        Ok(TurnResult {
            full_response: state.document,
            parsed,
            was_truncated,
            auto_fix_attempts: state.auto_fix_attempts,
            was_aborted: state.aborted,
        })
    }

    /// One streaming round with error reporting; failures surface through
    /// the event sink before propagating.
    async fn checked_round(
        &self,
        system_prompt: &str,
        messages: &[Message],
        abort: &AbortSignal,
        state: &mut TurnState,
    ) -> Result<()> {
        if let Err(err) = self.stream_round(system_prompt, messages, abort, state).await {
            self.events.on_event(&TurnEvent::Error {
                message: err.to_string(),
            });
            return Err(err);
        }
        Ok(())
    }

    /// Invoke the producer once and fold its fragment stream into the
    /// document. Cancellation observed here is recorded, never thrown.
    async fn stream_round(
        &self,
        system_prompt: &str,
        messages: &[Message],
        abort: &AbortSignal,
        state: &mut TurnState,
    ) -> Result<()> {
        let mut stream = match self.producer.stream(system_prompt, messages, abort).await {
            Ok(stream) => stream,
            Err(err) => {
                if abort.is_aborted() {
                    state.aborted = true;
                    return Ok(());
                }
                return Err(err);
            }
        };

        let mut mux = Multiplexer::new();
        loop {
            // Cooperative cancellation: checked before processing each
            // fragment, so at most one fragment lands after the request.
            if abort.is_aborted() {
                state.aborted = true;
                break;
            }

            match stream.recv().await {
                Some(FragmentEvent::Fragment(fragment)) => {
                    let emitted = mux.fold(&fragment);
                    self.append(state, emitted).await;
                }
                Some(FragmentEvent::Done) | None => break,
                Some(FragmentEvent::Error(message)) => {
                    if abort.is_aborted() {
                        state.aborted = true;
                        break;
                    }
                    return Err(TagflowError::Producer(message));
                }
            }
        }

        let tail = mux.finish();
        self.append(state, tail).await;
        Ok(())
    }

    /// Append one emission, then let the chunk observer transform the
    /// accumulated document. The observer's return value is the document
    /// going forward.
    async fn append(&self, state: &mut TurnState, emitted: String) {
        if emitted.is_empty() {
            return;
        }
        state.document.push_str(&emitted);
        state.document = self
            .observer
            .on_chunk(std::mem::take(&mut state.document), &emitted)
            .await;
        self.events.on_event(&TurnEvent::Chunk { delta: emitted });
    }
}
