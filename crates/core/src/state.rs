//! Conversation state for one session
//!
//! `ConversationState` is a value: every update consumes the old state and
//! returns a new one, so a turn can be computed without touching the state
//! the session currently holds.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{CoreError, Result};

/// Coarse phase of the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Greeting,
    CollectingInfo,
    InquirySubmitted,
    General,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Greeting => "greeting",
            Stage::CollectingInfo => "collecting_info",
            Stage::InquirySubmitted => "inquiry_submitted",
            Stage::General => "general",
        }
    }

    /// Stages reachable from this one. Staying put is always allowed.
    pub fn allowed_transitions(&self) -> &'static [Stage] {
        match self {
            Stage::Greeting => &[Stage::CollectingInfo, Stage::General],
            Stage::General => &[Stage::CollectingInfo],
            Stage::CollectingInfo => &[Stage::InquirySubmitted],
            Stage::InquirySubmitted => &[],
        }
    }

    pub fn can_transition_to(&self, target: Stage) -> bool {
        *self == target || self.allowed_transitions().contains(&target)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Stage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "greeting" => Ok(Stage::Greeting),
            "collecting_info" => Ok(Stage::CollectingInfo),
            "inquiry_submitted" => Ok(Stage::InquirySubmitted),
            "general" => Ok(Stage::General),
            other => Err(CoreError::UnknownStage(other.to_string())),
        }
    }
}

/// Contact slots, filled strictly in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactSlot {
    Name,
    Phone,
    Email,
}

impl ContactSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactSlot::Name => "name",
            ContactSlot::Phone => "phone",
            ContactSlot::Email => "email",
        }
    }
}

/// State held per session and replaced after every turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    collecting_info: bool,
    explicitly_asked_for_name: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    property_interest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    property_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bedroom_count: Option<u8>,
    stage: Stage,
}

impl ConversationState {
    /// Fresh state at session start
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collecting_info(&self) -> bool {
        self.collecting_info
    }

    pub fn explicitly_asked_for_name(&self) -> bool {
        self.explicitly_asked_for_name
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn user_phone(&self) -> Option<&str> {
        self.user_phone.as_deref()
    }

    pub fn user_email(&self) -> Option<&str> {
        self.user_email.as_deref()
    }

    pub fn property_interest(&self) -> Option<&str> {
        self.property_interest.as_deref()
    }

    pub fn property_type(&self) -> Option<&str> {
        self.property_type.as_deref()
    }

    pub fn bedroom_count(&self) -> Option<u8> {
        self.bedroom_count
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// True when a name was asked for and has not been recorded yet
    pub fn is_awaiting_name(&self) -> bool {
        self.explicitly_asked_for_name && self.user_name.is_none()
    }

    /// Next contact slot to collect, in name → phone → email order
    pub fn next_missing_contact_slot(&self) -> Option<ContactSlot> {
        if self.user_name.is_none() {
            Some(ContactSlot::Name)
        } else if self.user_phone.is_none() {
            Some(ContactSlot::Phone)
        } else if self.user_email.is_none() {
            Some(ContactSlot::Email)
        } else {
            None
        }
    }

    pub fn contact_complete(&self) -> bool {
        self.next_missing_contact_slot().is_none()
    }

    /// Enter lead capture and ask for a name
    ///
    /// The property interest is only recorded the first time one is known.
    pub fn begin_lead_capture(mut self, property_interest: Option<&str>) -> Self {
        self.collecting_info = true;
        self.explicitly_asked_for_name = self.user_name.is_none();
        if self.property_interest.is_none() {
            self.property_interest = property_interest.map(str::to_string);
        }
        if self.stage.can_transition_to(Stage::CollectingInfo) {
            self.stage = Stage::CollectingInfo;
        }
        self
    }

    /// Record the visitor's name and close the name gate. Write-once.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        if self.user_name.is_none() {
            self.user_name = Some(name.into());
            self.explicitly_asked_for_name = false;
        }
        self
    }

    /// Write-once
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        if self.user_phone.is_none() {
            self.user_phone = Some(phone.into());
        }
        self
    }

    /// Write-once
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        if self.user_email.is_none() {
            self.user_email = Some(email.into());
        }
        self
    }

    /// Write-once
    pub fn with_property_type(mut self, property_type: impl Into<String>) -> Self {
        if self.property_type.is_none() {
            self.property_type = Some(property_type.into());
        }
        self
    }

    /// Write-once
    pub fn with_bedroom_count(mut self, count: u8) -> Self {
        if self.bedroom_count.is_none() {
            self.bedroom_count = Some(count);
        }
        self
    }

    /// Move to another stage, enforcing the stage graph
    ///
    /// `InquirySubmitted` additionally requires all three contact slots.
    pub fn advance_to(mut self, stage: Stage) -> Result<Self> {
        if !self.stage.can_transition_to(stage) {
            return Err(CoreError::InvalidTransition {
                from: self.stage,
                to: stage,
            });
        }
        if stage == Stage::InquirySubmitted {
            if let Some(missing) = self.next_missing_contact_slot() {
                return Err(CoreError::IncompleteLead(missing.as_str()));
            }
        }
        self.stage = stage;
        Ok(self)
    }
}
