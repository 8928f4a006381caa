//! Turn-scoped diagnostic capture and trace classification.
//!
//! - `capture`: collects every diagnostic line the pipeline emits during one
//!   bounded call while still forwarding it to the normal log output
//! - `classifier`: turns raw diagnostic lines into `TraceEvent`s
//! - `tracing_layer`: adapter for pipelines that only log through `tracing`

pub mod capture;
pub mod classifier;
pub mod tracing_layer;

pub use capture::{CapturingSink, DiagnosticCapture, TracingSink, capture_tracing_during};
pub use classifier::{TraceClassifier, strip_color_escapes};
pub use tracing_layer::DiagnosticLineLayer;
