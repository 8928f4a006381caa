//! Collaborator boundary for the agent pipeline.
//!
//! The pipeline interprets a flattened prompt, may call tools that mutate the
//! session's `WorldState`, and reports what it did through a free-text
//! diagnostic stream. Its reasoning and tools live outside this workspace;
//! only the contract is defined here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Receives diagnostic lines emitted by the pipeline while it runs.
///
/// Injected per call, so each turn gets its own sink and nothing
/// process-wide has to be redirected.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// One entry of the pipeline's internal chat log.
///
/// `role` uses the pipeline's own vocabulary (`"user"`, `"assistant"`,
/// `"tool"`, ...), which does not line up with the session's `MessageRole`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl PipelineMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
        }
    }

    /// A message without textual content, e.g. a bare tool call.
    pub fn empty(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: None,
        }
    }
}

/// Failures raised by the agent pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A tool invoked by the pipeline failed
    #[error("Tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    /// The pipeline's own state was unusable
    #[error("Malformed pipeline state: {0}")]
    InvalidState(String),

    #[error("{0}")]
    Other(String),
}

/// A tool-calling agent pipeline bound to one session's world state.
#[async_trait]
pub trait AgentPipeline: Send + Sync {
    /// Runs the pipeline to completion for one flattened prompt.
    ///
    /// Every diagnostic line must be written to `diagnostics`. Returns the
    /// pipeline's internal message list in order.
    async fn run(
        &self,
        prompt: &str,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Result<Vec<PipelineMessage>, PipelineError>;
}
