//! Per-turn execution records.

use serde::{Deserialize, Serialize};

use crate::trace::TraceEvent;

/// What happened during a single user turn.
///
/// Created once per completed turn and never mutated afterwards. `events`
/// derives only from this turn's `raw_log_lines`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// The raw user input, without the flattened history.
    pub prompt: String,
    /// Diagnostic lines captured while the pipeline ran, in emission order.
    pub raw_log_lines: Vec<String>,
    /// Structured trace classified from `raw_log_lines`.
    pub events: Vec<TraceEvent>,
    /// Assistant reply, `None` when the pipeline produced no qualifying message.
    pub reply: Option<String>,
    /// Timestamp when the turn started (ISO 8601 format).
    pub started_at: String,
    /// Timestamp when the turn completed (ISO 8601 format).
    pub completed_at: String,
}

impl TurnRecord {
    /// Number of tool invocations observed in this turn.
    pub fn function_call_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, TraceEvent::FunctionCallStarted { .. }))
            .count()
    }
}
