use chrono::Utc;
use mapagent_core::error::{MapAgentError, Result};
use mapagent_core::{AgentPipeline, Message, SessionConfig, TurnRecord, WorldHandle, WorldState};
use mapagent_execution::{DiagnosticCapture, TraceClassifier};
use mapagent_interaction::TurnDispatcher;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as TurnLock, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::draw_sync::DrawSync;

/// Owns one conversational map session.
///
/// `SessionStore` is responsible for:
/// - Building the agent pipeline against the session's world
/// - Running turns strictly one at a time
/// - Recording the transcript and one `TurnRecord` per completed turn
/// - Exposing read-only views of history, traces and the world
pub struct SessionStore {
    id: String,
    config: SessionConfig,
    classifier: TraceClassifier,
    capture: DiagnosticCapture,
    world: WorldHandle,
    draw_sync: DrawSync,
    dispatcher: RwLock<Option<Arc<TurnDispatcher>>>,
    history: RwLock<Vec<Message>>,
    traces: RwLock<Vec<TurnRecord>>,
    turn_lock: TurnLock<()>,
    active_turn: Mutex<Option<CancellationToken>>,
}

impl SessionStore {
    /// Creates an uninitialized session.
    ///
    /// The world starts at the configured map view; no turn can be submitted
    /// until `initialize` has built the pipeline.
    pub fn new(config: SessionConfig) -> Self {
        let world = WorldHandle::new(WorldState::new(config.map.initial_view()));
        Self {
            id: Uuid::new_v4().to_string(),
            classifier: TraceClassifier::from_config(&config),
            capture: DiagnosticCapture::default(),
            draw_sync: DrawSync::new(world.clone()),
            world,
            config,
            dispatcher: RwLock::new(None),
            history: RwLock::new(Vec::new()),
            traces: RwLock::new(Vec::new()),
            turn_lock: TurnLock::new(()),
            active_turn: Mutex::new(None),
        }
    }

    /// Replaces the diagnostic capture, e.g. to forward lines to a UI panel.
    pub fn with_capture(mut self, capture: DiagnosticCapture) -> Self {
        self.capture = capture;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Starts the session: fresh world, empty history, and a pipeline built
    /// by `factory` against this session's world.
    ///
    /// # Arguments
    ///
    /// * `factory` - Builds the pipeline; it closes over any database or
    ///   lookup collaborators the pipeline's tools need
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInitialized` on a second call, or whatever the
    /// factory returns. A failed factory leaves the session uninitialized.
    pub async fn initialize<F>(&self, factory: F) -> Result<()>
    where
        F: FnOnce(WorldHandle) -> Result<Arc<dyn AgentPipeline>>,
    {
        let mut slot = self.dispatcher.write().await;
        if slot.is_some() {
            tracing::warn!("[SessionStore] Session {} already initialized", self.id);
            return Err(MapAgentError::AlreadyInitialized);
        }

        self.world.restore(WorldState::new(self.config.map.initial_view()));
        self.draw_sync.reset();
        self.history.write().await.clear();
        self.traces.write().await.clear();

        let pipeline = factory(self.world.clone())?;
        let dispatcher = TurnDispatcher::new(pipeline)
            .with_timeout(self.config.dispatch_timeout())
            .with_capture(self.capture.clone());
        *slot = Some(Arc::new(dispatcher));

        tracing::info!("[SessionStore] Session {} initialized", self.id);
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.dispatcher.read().await.is_some()
    }

    /// Runs one user turn to completion.
    ///
    /// The user message is appended before dispatch. On success the assistant
    /// reply (if any) and the turn's record are appended; on failure only the
    /// user message remains and the error carries the captured diagnostics.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` before `initialize`
    /// - `TurnInProgress` if another turn on this session is still running
    /// - `Dispatch`, `DispatchTimeout` or `Cancelled` from the pipeline run
    pub async fn submit_turn(&self, input: &str) -> Result<TurnRecord> {
        let dispatcher = self
            .dispatcher
            .read()
            .await
            .clone()
            .ok_or(MapAgentError::NotInitialized)?;

        let _turn = self
            .turn_lock
            .try_lock()
            .map_err(|_| MapAgentError::TurnInProgress)?;

        let started_at = Utc::now().to_rfc3339();
        let prior = {
            let mut history = self.history.write().await;
            let prior = history.clone();
            history.push(Message::user(input));
            prior
        };
        let turn_index = self.traces.read().await.len();

        let snapshot = self
            .config
            .restore_world_on_failure
            .then(|| self.world.snapshot());

        let cancel = CancellationToken::new();
        let result = {
            let _active = ActiveTurn::register(&self.active_turn, cancel.clone());
            dispatcher.dispatch(&prior, input, &cancel).await
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                if let Some(state) = snapshot {
                    let restored_draw = state.draw_info().cloned();
                    self.world.restore(state);
                    self.draw_sync.resync(restored_draw);
                    tracing::info!("[SessionStore] World restored after failed turn");
                }
                tracing::error!(
                    turn = turn_index,
                    diagnostics = err.diagnostics().len(),
                    "[SessionStore] Turn failed: {}",
                    err
                );
                return Err(err);
            }
        };

        let events = self.classifier.classify_lines(&outcome.raw_log_lines);
        for event in &events {
            tracing::debug!(turn = turn_index, "[SessionStore] {}", event.summary());
        }
        let record = TurnRecord {
            prompt: input.to_string(),
            raw_log_lines: outcome.raw_log_lines,
            events,
            reply: outcome.reply,
            started_at,
            completed_at: Utc::now().to_rfc3339(),
        };

        if let Some(reply) = &record.reply {
            self.history.write().await.push(Message::assistant(reply.clone()));
        }
        self.traces.write().await.push(record.clone());

        tracing::info!(
            turn = turn_index,
            lines = record.raw_log_lines.len(),
            events = record.events.len(),
            replied = record.reply.is_some(),
            "[SessionStore] Turn completed"
        );
        Ok(record)
    }

    /// Cancels the turn currently running, if any.
    ///
    /// # Returns
    ///
    /// `true` if a running turn was signalled.
    pub fn cancel_turn(&self) -> bool {
        let active = self
            .active_turn
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match active.as_ref() {
            Some(token) => {
                token.cancel();
                tracing::info!("[SessionStore] Cancellation requested");
                true
            }
            None => false,
        }
    }

    /// The last `n` turn records, most recent first.
    pub async fn recent_traces(&self, n: usize) -> Vec<TurnRecord> {
        self.traces.read().await.iter().rev().take(n).cloned().collect()
    }

    /// The last `recent_trace_limit` turn records, most recent first.
    pub async fn latest_traces(&self) -> Vec<TurnRecord> {
        self.recent_traces(self.config.recent_trace_limit).await
    }

    /// The full transcript in submission order.
    pub async fn history(&self) -> Vec<Message> {
        self.history.read().await.clone()
    }

    /// Shared handle to this session's world.
    pub fn world_state(&self) -> WorldHandle {
        self.world.clone()
    }

    /// Draw reconciler bound to this session's world.
    pub fn draw_sync(&self) -> &DrawSync {
        &self.draw_sync
    }

}

/// Publishes a turn's cancellation token for `cancel_turn` and withdraws it
/// when dropped, including when the `submit_turn` future itself is dropped.
struct ActiveTurn<'a> {
    slot: &'a Mutex<Option<CancellationToken>>,
}

impl<'a> ActiveTurn<'a> {
    fn register(slot: &'a Mutex<Option<CancellationToken>>, token: CancellationToken) -> Self {
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token);
        Self { slot }
    }
}

impl Drop for ActiveTurn<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_before_initialize_is_rejected() {
        let store = SessionStore::new(SessionConfig::default());

        let err = store.submit_turn("hello").await.unwrap_err();

        assert_eq!(err, MapAgentError::NotInitialized);
        assert!(store.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_factory_leaves_session_uninitialized() {
        let store = SessionStore::new(SessionConfig::default());

        let err = store
            .initialize(|_| Err(MapAgentError::internal("flood database unreachable")))
            .await
            .unwrap_err();

        assert!(matches!(err, MapAgentError::Internal(_)));
        assert!(!store.is_initialized().await);
    }

    #[tokio::test]
    async fn test_new_session_uses_configured_view() {
        let mut config = SessionConfig::default();
        config.map.center = (35.68, 139.76);
        config.map.zoom = 9;
        let store = SessionStore::new(config);

        let view = store.world_state().read(|w| w.view());
        assert_eq!(view.center, (35.68, 139.76));
        assert_eq!(view.zoom, 9);
        assert!(!store.session_id().is_empty());
    }

    #[test]
    fn test_active_turn_withdraws_token_on_drop() {
        let slot = Mutex::new(None);
        {
            let _active = ActiveTurn::register(&slot, CancellationToken::new());
            assert!(slot.lock().unwrap().is_some());
        }
        assert!(slot.lock().unwrap().is_none());
    }

    #[test]
    fn test_cancel_without_turn_is_noop() {
        let store = SessionStore::new(SessionConfig::default());
        assert!(!store.cancel_turn());
    }
}
