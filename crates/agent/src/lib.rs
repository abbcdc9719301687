//! Property Lead-Capture Agent
//!
//! Features:
//! - Rule-based intent classification with an explicit, ordered rule table
//! - Slot filling for name, phone and email
//! - Templated responses grounded in the property on screen
//! - Per-session conversation controller that submits completed leads

pub mod classifier;
pub mod conversation;
pub mod response;
pub mod transition;

pub use classifier::{IntentClassifier, NameGate, Rule, KEYWORD_TABLE};
pub use conversation::{Conversation, ConversationEvent, TurnOutcome};
pub use response::{
    FixedVariety, GeneratorConfig, RandomVariety, ResponseGenerator, VarietySource,
    FALLBACK_RESPONSES, GREETING_RESPONSES,
};
pub use transition::{apply_intent, build_inquiry, Transition};

use lead_assistant_core::CoreError;
use lead_assistant_integrations::IntegrationError;
use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Inquiry submission failed: {0}")]
    Submission(#[from] IntegrationError),

    #[error("State error: {0}")]
    State(#[from] CoreError),
}
