//! One-turn orchestration: streaming, continuation, auto-fix, final parse.

mod config;
mod runner;

pub use config::{TurnConfig, TurnMode};
pub use runner::{
    AutoFixer, ChunkObserver, EventSink, FixOutcome, NoAutoFixer, NullEventSink, NullObserver, TurnEvent,
    TurnResult, TurnRunner,
};
