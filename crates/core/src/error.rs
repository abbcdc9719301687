//! Error types shared by the core crate

use thiserror::Error;

use crate::state::Stage;

/// Core errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown intent label: {0}")]
    UnknownIntent(String),

    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    #[error("Invalid stage transition from {from} to {to}")]
    InvalidTransition { from: Stage, to: Stage },

    #[error("Cannot mark inquiry submitted: missing {0}")]
    IncompleteLead(&'static str),
}

pub type Result<T> = std::result::Result<T, CoreError>;
