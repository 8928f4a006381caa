//! Turn dispatch to the agent pipeline.

use mapagent_core::error::{MapAgentError, Result};
use mapagent_core::{AgentPipeline, DiagnosticSink, Message, PipelineError, PipelineMessage};
use mapagent_execution::DiagnosticCapture;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::prompt::{build_prompt, extract_reply};

/// Result of one successful pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// Extracted assistant reply, `None` if the pipeline produced none.
    pub reply: Option<String>,
    /// Every diagnostic line emitted during the run, in order.
    pub raw_log_lines: Vec<String>,
    /// The pipeline's internal message list, as returned.
    pub messages: Vec<PipelineMessage>,
}

enum RunOutcome {
    Completed(std::result::Result<Vec<PipelineMessage>, PipelineError>),
    TimedOut(Duration),
    Cancelled,
}

/// Invokes the agent pipeline for one turn.
///
/// The run is bounded by an optional timeout and a caller-owned cancellation
/// token. Diagnostics are captured for exactly the duration of the run.
pub struct TurnDispatcher {
    pipeline: Arc<dyn AgentPipeline>,
    capture: DiagnosticCapture,
    timeout: Option<Duration>,
}

impl TurnDispatcher {
    /// Creates a dispatcher without a timeout that forwards diagnostics to
    /// `tracing`.
    pub fn new(pipeline: Arc<dyn AgentPipeline>) -> Self {
        Self {
            pipeline,
            capture: DiagnosticCapture::default(),
            timeout: None,
        }
    }

    /// Sets the upper bound for one pipeline run.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces the diagnostic capture, e.g. to forward lines elsewhere.
    pub fn with_capture(mut self, capture: DiagnosticCapture) -> Self {
        self.capture = capture;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Runs the pipeline for `input` with `history` as context.
    ///
    /// # Arguments
    ///
    /// * `history` - Every prior message, excluding the one for `input`
    /// * `input` - The new user input
    /// * `cancel` - Token that aborts the run when cancelled
    ///
    /// # Errors
    ///
    /// Returns `Dispatch`, `DispatchTimeout` or `Cancelled`, each carrying the
    /// diagnostic lines captured before the run ended.
    pub async fn dispatch(
        &self,
        history: &[Message],
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome> {
        let prompt = build_prompt(history, input);
        tracing::info!(
            history_len = history.len(),
            prompt_len = prompt.len(),
            "[TurnDispatcher] Dispatching turn"
        );

        let (outcome, raw_log_lines) = self
            .capture
            .capture_during(|sink| self.run_bounded(&prompt, sink, cancel))
            .await;

        match outcome {
            RunOutcome::Completed(Ok(messages)) => {
                let reply = extract_reply(&messages, &prompt, input);
                if reply.is_none() {
                    tracing::info!("[TurnDispatcher] Pipeline finished without a reply");
                }
                Ok(DispatchOutcome {
                    reply,
                    raw_log_lines,
                    messages,
                })
            }
            RunOutcome::Completed(Err(err)) => {
                tracing::error!("[TurnDispatcher] Pipeline failed: {}", err);
                Err(MapAgentError::dispatch(err.to_string(), raw_log_lines))
            }
            RunOutcome::TimedOut(limit) => {
                tracing::warn!("[TurnDispatcher] Pipeline timed out after {:?}", limit);
                Err(MapAgentError::DispatchTimeout {
                    after_secs: whole_secs_ceil(limit),
                    diagnostics: raw_log_lines,
                })
            }
            RunOutcome::Cancelled => {
                tracing::warn!("[TurnDispatcher] Pipeline run cancelled");
                Err(MapAgentError::Cancelled {
                    diagnostics: raw_log_lines,
                })
            }
        }
    }

    async fn run_bounded(
        &self,
        prompt: &str,
        sink: Arc<dyn DiagnosticSink>,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let run = self.pipeline.run(prompt, sink);
        let bounded = async {
            match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, run).await {
                    Ok(result) => RunOutcome::Completed(result),
                    Err(_) => RunOutcome::TimedOut(limit),
                },
                None => RunOutcome::Completed(run.await),
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => RunOutcome::Cancelled,
            outcome = bounded => outcome,
        }
    }
}

/// Rounds up so a sub-second limit is never reported as zero.
fn whole_secs_ceil(limit: Duration) -> u64 {
    limit.as_secs() + u64::from(limit.subsec_nanos() > 0)
}
