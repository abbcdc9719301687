//! Core types for the property lead-capture assistant
//!
//! This crate provides the value types shared by every other crate:
//! - Messages exchanged in a conversation and the append-only message log
//! - Conversation state and stages
//! - Intent labels produced by the classifier
//! - Read-only property context supplied by the listing collaborator
//! - Error types

pub mod error;
pub mod intent;
pub mod message;
pub mod property;
pub mod state;

pub use error::{CoreError, Result};
pub use intent::Intent;
pub use message::{Message, MessageKind, MessageLog, Sender};
pub use property::{AgentInfo, PropertyContext, PropertyStatus};
pub use state::{ContactSlot, ConversationState, Stage};
