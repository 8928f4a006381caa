//! Turn-scoped diagnostic capture.
//!
//! A capture hands the pipeline a fresh `CapturingSink` for exactly one call.
//! The sink forwards each line to the regular output and keeps a copy, so
//! nothing process-wide is redirected and two sessions can capture at the
//! same time without seeing each other's lines.

use mapagent_core::DiagnosticSink;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::instrument::WithSubscriber;
use tracing_subscriber::layer::SubscriberExt;

use crate::tracing_layer::DiagnosticLineLayer;

/// Target under which forwarded pipeline diagnostics are logged.
pub const PIPELINE_LOG_TARGET: &str = "mapagent::pipeline";

/// Forwards diagnostic lines to the application's `tracing` output unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, line: &str) {
        tracing::info!(target: PIPELINE_LOG_TARGET, "{}", line);
    }
}

/// Sink that forwards every line and buffers a copy until sealed.
///
/// Once sealed, late lines (from a pipeline that kept the sink around) are
/// still forwarded but no longer buffered.
pub struct CapturingSink {
    forward: Arc<dyn DiagnosticSink>,
    buffer: Mutex<Vec<String>>,
    sealed: AtomicBool,
}

impl CapturingSink {
    pub fn new(forward: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            forward,
            buffer: Mutex::new(Vec::new()),
            sealed: AtomicBool::new(false),
        }
    }

    /// Seals the sink and returns everything captured so far, in order.
    pub fn seal(&self) -> Vec<String> {
        self.sealed.store(true, Ordering::SeqCst);
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *buffer)
    }
}

impl DiagnosticSink for CapturingSink {
    fn emit(&self, line: &str) {
        self.forward.emit(line);
        if self.sealed.load(Ordering::SeqCst) {
            return;
        }
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

/// Scoped acquisition of a pipeline's diagnostic output.
#[derive(Clone)]
pub struct DiagnosticCapture {
    forward: Arc<dyn DiagnosticSink>,
}

impl Default for DiagnosticCapture {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl DiagnosticCapture {
    /// Creates a capture whose lines are also forwarded to `forward`.
    pub fn new(forward: Arc<dyn DiagnosticSink>) -> Self {
        Self { forward }
    }

    /// Runs `f` with a fresh capturing sink and returns its output together
    /// with every line emitted during the call.
    ///
    /// The sink is sealed on every exit path of `f`, including an error
    /// value; the buffer never outlives this call.
    pub async fn capture_during<F, Fut, T>(&self, f: F) -> (T, Vec<String>)
    where
        F: FnOnce(Arc<dyn DiagnosticSink>) -> Fut,
        Fut: Future<Output = T>,
    {
        let sink = Arc::new(CapturingSink::new(Arc::clone(&self.forward)));
        let shared: Arc<dyn DiagnosticSink> = sink.clone();
        let output = f(shared).await;
        let lines = sink.seal();
        tracing::debug!(lines = lines.len(), "[DiagnosticCapture] Capture sealed");
        (output, lines)
    }
}

/// Runs `future` under a scoped subscriber that records every `tracing`
/// event it emits as a diagnostic line.
///
/// The scoped subscriber also writes each event to stderr, so the lines stay
/// visible while captured. The previous default subscriber is back in place
/// as soon as the future completes or is dropped.
pub async fn capture_tracing_during<Fut, T>(future: Fut) -> (T, Vec<String>)
where
    Fut: Future<Output = T>,
{
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let subscriber = tracing_subscriber::registry()
        .with(DiagnosticLineLayer::new(sender))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    let output = future.with_subscriber(subscriber).await;

    let mut lines = Vec::new();
    while let Ok(line) = receiver.try_recv() {
        lines.push(line);
    }
    (output, lines)
}
