//! Structured trace events reconstructed from pipeline diagnostics.

use serde::{Deserialize, Serialize};

/// One observable step of the agent pipeline during a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEvent {
    /// The pipeline started executing a tool.
    FunctionCallStarted { name: String },
    /// A tool returned; `response_text` is what the pipeline reported back.
    FunctionCallResult { response_text: String },
    /// Prose the assistant addressed to the user proxy.
    AssistantUtterance { text: String },
}

impl TraceEvent {
    /// Short human-readable rendering for logs and terminal output.
    pub fn summary(&self) -> String {
        match self {
            TraceEvent::FunctionCallStarted { name } => format!("EXECUTING FUNCTION {}...", name),
            TraceEvent::FunctionCallResult { response_text } => {
                format!("Function result: {}", response_text)
            }
            TraceEvent::AssistantUtterance { text } => format!("Assistant: {}", text),
        }
    }
}
