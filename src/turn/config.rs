//! Immutable per-turn configuration.
//!
//! Read-only knobs live here; the mutable per-call record (document,
//! counters, flags) is private to the runner, so no state leaks across calls.

use serde::{Deserialize, Serialize};

/// What kind of turn this is. Auto-fix only runs in the code-modifying mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnMode {
    /// Question answering, no repair pass
    Ask,
    /// Code-modifying turn, eligible for auto-fix
    Build,
}

/// Configuration for turn processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Ceiling on continuation rounds when output arrives truncated
    pub max_continuation_rounds: u32,
    /// Whether the auto-fix stage may run at all
    pub auto_fix_enabled: bool,
    /// Turn mode; see [`TurnMode`]
    pub mode: TurnMode,
    /// Buffer size for the fragment channel
    pub channel_buffer: usize,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_continuation_rounds: 2,
            auto_fix_enabled: false,
            mode: TurnMode::Build,
            channel_buffer: 64,
        }
    }
}
