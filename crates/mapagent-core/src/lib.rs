//! Domain model and collaborator contracts for the map agent session core.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod trace;
pub mod world;

// Re-export common error type
pub use config::SessionConfig;
pub use error::{MapAgentError, Result};
pub use pipeline::{AgentPipeline, DiagnosticSink, PipelineError, PipelineMessage};
pub use session::{Message, MessageRole, TurnRecord};
pub use trace::TraceEvent;
pub use world::{WorldHandle, WorldState};
