//! Session management
//!
//! One [`ConversationEngine`] per conversation id. Each session sits behind
//! an async mutex held for the whole `run()` + `transition()` cycle, so turns
//! of the same conversation never interleave while distinct conversations
//! proceed in parallel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chat_agent_agent::{Collaborators, ConversationEngine, StateGraph, TurnReport};
use chat_agent_config::constants::session;
use chat_agent_core::{ConversationContext, InboundMessage};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::{watch, Mutex};

use crate::ServerError;

/// A live conversation
pub struct Session {
    pub id: String,
    engine: Mutex<ConversationEngine>,
    created_at: Instant,
    last_activity: RwLock<Instant>,
}

impl Session {
    fn new(id: impl Into<String>, engine: ConversationEngine) -> Self {
        let now = Instant::now();
        Self {
            id: id.into(),
            engine: Mutex::new(engine),
            created_at: now,
            last_activity: RwLock::new(now),
        }
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// Idle for longer than `timeout` and not in the middle of a turn
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout && self.engine.try_lock().is_ok()
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Exclusive access to the engine
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, ConversationEngine> {
        self.engine.lock().await
    }
}

/// Session manager
pub struct SessionManager {
    sessions: DashMap<String, Arc<Session>>,
    graph: Arc<StateGraph>,
    collaborators: Arc<Collaborators>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    pub fn new(graph: Arc<StateGraph>, collaborators: Arc<Collaborators>) -> Self {
        Self::with_config(
            graph,
            collaborators,
            session::MAX_SESSIONS,
            Duration::from_secs(session::IDLE_TIMEOUT_SECONDS),
            Duration::from_secs(session::CLEANUP_INTERVAL_SECONDS),
        )
    }

    pub fn with_config(
        graph: Arc<StateGraph>,
        collaborators: Arc<Collaborators>,
        max_sessions: usize,
        session_timeout: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            graph,
            collaborators,
            max_sessions,
            session_timeout,
            cleanup_interval,
        }
    }

    /// Start a background task that periodically removes idle sessions.
    ///
    /// Send `true` on the returned channel to stop it.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let removed = manager.cleanup_expired();
                        if removed > 0 {
                            tracing::info!(
                                removed,
                                remaining = manager.count(),
                                "Session cleanup"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Get the session for `conversation_id`, creating it if needed.
    ///
    /// An existing session is touched while its map entry is held.
    pub fn get_or_create(&self, conversation_id: &str) -> Result<Arc<Session>, ServerError> {
        if let Some(entry) = self.sessions.get(conversation_id) {
            entry.value().touch();
            return Ok(Arc::clone(entry.value()));
        }

        if self.sessions.len() >= self.max_sessions {
            self.cleanup_expired();
            if self.sessions.len() >= self.max_sessions {
                tracing::warn!(
                    conversation_id,
                    max_sessions = self.max_sessions,
                    "Rejecting new conversation"
                );
                return Err(ServerError::CapacityExceeded(self.max_sessions));
            }
        }

        let session = self
            .sessions
            .entry(conversation_id.to_string())
            .or_insert_with(|| {
                tracing::info!(conversation_id, "Created session");
                let engine = ConversationEngine::new(
                    Arc::clone(&self.graph),
                    Arc::clone(&self.collaborators),
                    ConversationContext::new(conversation_id),
                );
                Arc::new(Session::new(conversation_id, engine))
            })
            .clone();
        Ok(session)
    }

    /// Run one full turn for an inbound message
    pub async fn handle_turn(&self, mut message: InboundMessage) -> Result<TurnReport, ServerError> {
        if message.conversation_id.trim().is_empty() {
            return Err(ServerError::InvalidRequest(
                "conversation_id must not be empty".to_string(),
            ));
        }

        loop {
            let session = self.get_or_create(&message.conversation_id)?;
            let mut engine = session.lock().await;
            if !self.reinstate(&session) {
                tracing::debug!(
                    conversation_id = %message.conversation_id,
                    "Session replaced while waiting, retrying"
                );
                continue;
            }
            session.touch();

            if let Some(name) = message.display_name.take() {
                engine.context_mut().set_display_name(name);
            }

            let report = engine.handle_turn(&message.text).await;
            session.touch();

            tracing::debug!(
                conversation_id = %message.conversation_id,
                from = %report.from,
                to = %report.to,
                messages = report.messages.len(),
                "Turn complete"
            );
            return Ok(report);
        }
    }

    /// Make sure the locked `session` is still the one registered for its id.
    ///
    /// A session evicted while its turn waited for the lock is put back.
    /// Returns `false` when another session took its place.
    fn reinstate(&self, session: &Arc<Session>) -> bool {
        match self.sessions.entry(session.id.clone()) {
            Entry::Occupied(entry) => Arc::ptr_eq(entry.get(), session),
            Entry::Vacant(entry) => {
                tracing::info!(conversation_id = %session.id, "Reinstated evicted session");
                entry.insert(Arc::clone(session));
                true
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, id: &str) {
        if self.sessions.remove(id).is_some() {
            tracing::info!(conversation_id = id, "Removed session");
        }
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Remove idle sessions, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let timeout = self.session_timeout;
        let before = self.sessions.len();
        self.sessions.retain(|id, session| {
            let expired = session.is_expired(timeout);
            if expired {
                tracing::info!(conversation_id = %id, "Expired session");
            }
            !expired
        });
        before.saturating_sub(self.sessions.len())
    }

    pub fn list(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }
}
