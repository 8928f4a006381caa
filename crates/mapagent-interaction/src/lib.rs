//! Bridges the session's turn-based transcript to the agent pipeline.

pub mod dispatcher;
pub mod prompt;

pub use dispatcher::{DispatchOutcome, TurnDispatcher};
pub use prompt::{PROMPT_SEPARATOR, build_prompt, extract_reply, format_history};
