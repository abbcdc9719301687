//! Session Management
//!
//! Each session owns one `Conversation` behind an async mutex, so turns for
//! the same session run one at a time while other sessions proceed freely.
//! Sessions idle longer than the configured timeout are removed by a
//! background cleanup task.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};

use lead_assistant_agent::{Conversation, GeneratorConfig, ResponseGenerator};
use lead_assistant_config::Settings;
use lead_assistant_core::PropertyContext;
use lead_assistant_integrations::InquirySubmitter;

use crate::ServerError;

/// A visitor session
pub struct Session {
    pub id: String,
    pub conversation: Arc<Mutex<Conversation>>,
    property: RwLock<Option<PropertyContext>>,
    created_at: Instant,
    last_activity: RwLock<Instant>,
}

impl Session {
    fn new(id: String, conversation: Conversation, property: Option<PropertyContext>) -> Self {
        Self {
            id,
            conversation: Arc::new(Mutex::new(conversation)),
            property: RwLock::new(property),
            created_at: Instant::now(),
            last_activity: RwLock::new(Instant::now()),
        }
    }

    /// Property currently on the visitor's screen
    pub fn property(&self) -> Option<PropertyContext> {
        self.property.read().clone()
    }

    pub fn set_property(&self, property: PropertyContext) {
        *self.property.write() = Some(property);
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Check if session is expired
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
    submitter: Arc<dyn InquirySubmitter>,
    generator: GeneratorConfig,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(max_sessions: usize, submitter: Arc<dyn InquirySubmitter>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout: Duration::from_secs(1800),
            cleanup_interval: Duration::from_secs(300),
            submitter,
            generator: GeneratorConfig::default(),
        }
    }

    /// Create from the session and assistant settings
    pub fn from_settings(settings: &Settings, submitter: Arc<dyn InquirySubmitter>) -> Self {
        Self::new(settings.session.max_sessions, submitter)
            .with_timeouts(
                Duration::from_secs(settings.session.timeout_secs),
                Duration::from_secs(settings.session.cleanup_interval_secs),
            )
            .with_generator_config(GeneratorConfig::from(&settings.assistant))
    }

    pub fn with_timeouts(mut self, session_timeout: Duration, cleanup_interval: Duration) -> Self {
        self.session_timeout = session_timeout;
        self.cleanup_interval = cleanup_interval;
        self
    }

    pub fn with_generator_config(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }

    /// Start a background task that periodically removes expired sessions
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

    /// Create a new session
    pub fn create(&self, property: Option<PropertyContext>) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);

            if sessions.len() >= self.max_sessions {
                tracing::warn!(max_sessions = self.max_sessions, "Session capacity reached");
                return Err(ServerError::CapacityExceeded);
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let conversation = Conversation::new(id.clone(), Arc::clone(&self.submitter))
            .with_generator(ResponseGenerator::new(self.generator.clone()));
        let session = Arc::new(Session::new(id.clone(), conversation, property));
        sessions.insert(id.clone(), Arc::clone(&session));

        tracing::info!(session_id = %id, "Created session");
        Ok(session)
    }

    /// Get a session by ID
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session; false when it did not exist
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Removed session");
        }
        removed
    }

    /// Get active session count
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Remove expired sessions, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions)
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Arc<Session>>) -> usize {
        let timeout = self.session_timeout;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = !session.is_expired(timeout);
            if !keep {
                tracing::info!(session_id = %id, age_secs = session.age().as_secs(), "Expired session");
            }
            keep
        });
        before - sessions.len()
    }

    /// List all session IDs
    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }
}
