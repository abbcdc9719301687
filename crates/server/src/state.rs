//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use lead_assistant_config::Settings;
use lead_assistant_integrations::{HttpInquirySubmitter, InquirySubmitter, StubInquirySubmitter};

use crate::session::SessionManager;
use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    /// Build sessions from the settings, all sharing one inquiry submitter
    pub fn new(config: Settings, submitter: Arc<dyn InquirySubmitter>) -> Self {
        let sessions = SessionManager::from_settings(&config, submitter);
        Self {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
        }
    }

    /// Build state with the submitter the settings call for
    pub fn from_settings(config: Settings) -> Result<Self, ServerError> {
        let submitter = inquiry_submitter(&config)?;
        Ok(Self::new(config, submitter))
    }
}

/// HTTP submitter when an endpoint is configured, otherwise the stub
///
/// Production never runs on the stub: leads would be acknowledged and dropped.
pub fn inquiry_submitter(config: &Settings) -> Result<Arc<dyn InquirySubmitter>, ServerError> {
    let http = HttpInquirySubmitter::from_config(&config.inquiry)
        .map_err(|e| ServerError::Configuration(e.to_string()))?;

    match http {
        Some(http) => {
            tracing::info!(endpoint = %http.endpoint(), "Submitting inquiries over HTTP");
            Ok(Arc::new(http))
        },
        None if config.environment.is_production() => Err(ServerError::Configuration(
            "inquiry.endpoint is required in production".to_string(),
        )),
        None => {
            tracing::warn!("No inquiry endpoint configured, using stub submitter");
            Ok(Arc::new(StubInquirySubmitter::new()))
        },
    }
}
