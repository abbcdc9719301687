//! Per-turn state transitions
//!
//! `apply_intent` is the whole state machine: given the classified intent and
//! the state before the turn it produces the state after the turn. It never
//! performs I/O; submitting a completed lead is left to the caller.

use lead_assistant_core::{ContactSlot, ConversationState, Intent, PropertyContext, Stage};
use lead_assistant_integrations::InquiryRequest;

use crate::classifier::{
    extract_bedroom_count, extract_email, extract_name, extract_phone, extract_property_type,
};
use crate::AgentError;

/// Result of applying one intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ConversationState,
    /// The email slot was filled on this turn and the lead must be submitted
    pub lead_completed: bool,
}

impl Transition {
    fn unchanged(state: &ConversationState) -> Self {
        Self {
            state: state.clone(),
            lead_completed: false,
        }
    }
}

/// Compute the state after a turn
pub fn apply_intent(
    intent: Option<Intent>,
    text: &str,
    state: &ConversationState,
    property: Option<&PropertyContext>,
) -> Result<Transition, AgentError> {
    let Some(intent) = intent else {
        return Ok(Transition::unchanged(state));
    };

    if intent.starts_lead_capture() {
        return Ok(start_lead_capture(state, property));
    }
    if intent.is_contact_detail() {
        return fill_contact_slot(intent, text, state);
    }
    if intent.is_search_refinement() {
        return Ok(Transition {
            state: leave_greeting(refine_search(intent, text, state.clone()))?,
            lead_completed: false,
        });
    }

    // Informational questions and greetings
    Ok(Transition::unchanged(state))
}

/// Buy, sell and agent requests open lead capture once per session
fn start_lead_capture(state: &ConversationState, property: Option<&PropertyContext>) -> Transition {
    if state.user_name().is_some() || state.stage() == Stage::InquirySubmitted {
        return Transition::unchanged(state);
    }
    Transition {
        state: state.clone().begin_lead_capture(property.map(|p| p.title.as_str())),
        lead_completed: false,
    }
}

/// Record a contact detail when it is the one the conversation is waiting for
fn fill_contact_slot(
    intent: Intent,
    text: &str,
    state: &ConversationState,
) -> Result<Transition, AgentError> {
    let next = state.clone();
    let transition = match (intent, expected_slot(state)) {
        (Intent::NameProvided, Some(ContactSlot::Name)) => extract_name(text).map(|name| Transition {
            state: next.with_name(name),
            lead_completed: false,
        }),
        (Intent::PhoneProvided, Some(ContactSlot::Phone)) => extract_phone(text).map(|phone| Transition {
            state: next.with_phone(phone),
            lead_completed: false,
        }),
        (Intent::EmailProvided, Some(ContactSlot::Email)) => match extract_email(text) {
            Some(email) => Some(Transition {
                state: next.with_email(email).advance_to(Stage::InquirySubmitted)?,
                lead_completed: true,
            }),
            None => None,
        },
        _ => None,
    };
    Ok(transition.unwrap_or_else(|| Transition::unchanged(state)))
}

/// Store the property type or bedroom count named in the text, if any
fn refine_search(intent: Intent, text: &str, state: ConversationState) -> ConversationState {
    match intent {
        Intent::PropertyType => match extract_property_type(text) {
            Some(kind) => state.with_property_type(kind),
            None => state,
        },
        Intent::BedroomCount => match extract_bedroom_count(text) {
            Some(count) => state.with_bedroom_count(count),
            None => state,
        },
        _ => state,
    }
}

/// Slot a contact detail may fill on this turn, if any
fn expected_slot(state: &ConversationState) -> Option<ContactSlot> {
    if state.stage() == Stage::CollectingInfo {
        state.next_missing_contact_slot()
    } else {
        None
    }
}

/// Browsing from the opening stage moves the session into general Q&A
fn leave_greeting(state: ConversationState) -> Result<ConversationState, AgentError> {
    if state.stage() == Stage::Greeting {
        Ok(state.advance_to(Stage::General)?)
    } else {
        Ok(state)
    }
}

/// Build the inquiry for a state whose contact slots are complete
pub fn build_inquiry(
    state: &ConversationState,
    property: Option<&PropertyContext>,
) -> Result<InquiryRequest, AgentError> {
    let (Some(name), Some(phone), Some(email)) =
        (state.user_name(), state.user_phone(), state.user_email())
    else {
        let missing = state
            .next_missing_contact_slot()
            .map(|slot| slot.as_str())
            .unwrap_or("contact");
        return Err(lead_assistant_core::CoreError::IncompleteLead(missing).into());
    };

    let mut details = vec![format!("Phone: {}", phone)];
    if let Some(interest) = state.property_interest() {
        details.push(format!("Interested in: {}", interest));
    }
    if let Some(kind) = state.property_type() {
        details.push(format!("Property type: {}", kind));
    }
    if let Some(count) = state.bedroom_count() {
        details.push(format!("Bedrooms: {}", count));
    }

    Ok(InquiryRequest {
        property_id: property.map(|p| p.id.clone()),
        name: name.to_string(),
        email: email.to_string(),
        message: details.join("\n"),
    })
}
