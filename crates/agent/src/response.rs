//! Response Generation
//!
//! Turns a classified intent into the assistant's reply. Generation is pure:
//! it reads the post-turn state and the property context and never mutates
//! either. The only non-determinism is the choice among fixed candidate
//! replies for greetings and fallbacks, which goes through [`VarietySource`].

use std::sync::Arc;

use rand::Rng;

use lead_assistant_config::AssistantConfig;
use lead_assistant_core::{ContactSlot, ConversationState, Intent, PropertyContext, Stage};

use crate::classifier::{extract_bedroom_count, extract_property_type};
use crate::transition::Transition;

/// Generic greetings used when no property is in view
pub const GREETING_RESPONSES: &[&str] = &[
    "Hello! How can I help you find your next property today?",
    "Hi there! Are you looking to buy, sell, or just browsing our listings?",
    "Welcome! I can help you search properties, check prices, or connect you with an agent.",
];

/// Replies for messages no intent matched
pub const FALLBACK_RESPONSES: &[&str] = &[
    "I'm not sure I understood that. Could you rephrase it?",
    "Sorry, I didn't quite catch that. You can ask me about prices, locations, or viewings.",
    "I'm still learning! Try asking about a property's price, its location, or talking to an agent.",
];

/// Chooses one of several candidate replies
pub trait VarietySource: Send + Sync {
    /// Index in `0..candidates`; `candidates` is never zero
    fn pick(&self, candidates: usize) -> usize;
}

/// Uniform random choice
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomVariety;

impl VarietySource for RandomVariety {
    fn pick(&self, candidates: usize) -> usize {
        rand::thread_rng().gen_range(0..candidates)
    }
}

/// Always the same index (wrapped to the candidate count)
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedVariety(pub usize);

impl VarietySource for FixedVariety {
    fn pick(&self, candidates: usize) -> usize {
        self.0 % candidates
    }
}

/// Formatting options for replies
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Currency code printed before prices
    pub currency: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            currency: "AED".to_string(),
        }
    }
}

impl From<&AssistantConfig> for GeneratorConfig {
    fn from(config: &AssistantConfig) -> Self {
        Self {
            currency: config.currency.clone(),
        }
    }
}

/// Builds the assistant's reply for one turn
#[derive(Clone)]
pub struct ResponseGenerator {
    config: GeneratorConfig,
    variety: Arc<dyn VarietySource>,
}

impl Default for ResponseGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl ResponseGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            variety: Arc::new(RandomVariety),
        }
    }

    /// Replace the randomness source, e.g. with [`FixedVariety`] in tests
    pub fn with_variety(mut self, variety: Arc<dyn VarietySource>) -> Self {
        self.variety = variety;
        self
    }

    /// Reply to `text` classified as `intent`, given the state after this turn
    ///
    /// Contact details arriving after submission get the "already have your
    /// details" reply; use [`Self::respond_to_turn`] on the turn that completes the lead.
    pub fn respond(
        &self,
        intent: Option<Intent>,
        text: &str,
        state: &ConversationState,
        property: Option<&PropertyContext>,
    ) -> String {
        self.reply(intent, text, state, false, property)
    }

    /// Reply for a turn whose transition has already been computed
    pub fn respond_to_turn(
        &self,
        intent: Option<Intent>,
        text: &str,
        transition: &Transition,
        property: Option<&PropertyContext>,
    ) -> String {
        self.reply(intent, text, &transition.state, transition.lead_completed, property)
    }

    fn reply(
        &self,
        intent: Option<Intent>,
        text: &str,
        state: &ConversationState,
        lead_completed: bool,
        property: Option<&PropertyContext>,
    ) -> String {
        let Some(intent) = intent else {
            let fallback = self.choose(FALLBACK_RESPONSES).to_string();
            return with_slot_reminder(fallback, state);
        };

        let reply = match intent {
            Intent::Greeting => return self.greeting(property),
            Intent::BuyIntent => return buy_reply(state, property),
            Intent::SellIntent => return sell_reply(state),
            Intent::AgentContact => return agent_contact_reply(state, property),
            Intent::NameProvided | Intent::PhoneProvided | Intent::EmailProvided => {
                return contact_reply(intent, state, lead_completed, property)
            },
            Intent::PropertyType => property_type_reply(text, state),
            Intent::BedroomCount => bedroom_count_reply(text, state),
            Intent::ViewListings => view_listings_reply(state),
            Intent::PropertySearch => property_search_reply(state),
            Intent::PriceInquiry => self.price_reply(property),
            Intent::LocationInquiry => location_reply(property),
            Intent::ViewingRequest => viewing_reply(state, property),
            Intent::Help => help_reply(property),
            Intent::Thanks => {
                "You're welcome! Let me know if there's anything else I can help with.".to_string()
            },
        };
        with_slot_reminder(reply, state)
    }

    fn choose<'a>(&self, candidates: &[&'a str]) -> &'a str {
        candidates[self.variety.pick(candidates.len()) % candidates.len()]
    }

    fn price(&self, amount: u64) -> String {
        format!("{} {}", self.config.currency, group_thousands(amount))
    }

    fn greeting(&self, property: Option<&PropertyContext>) -> String {
        match property {
            Some(p) => format!(
                "Hello! Welcome to {}. It's listed at {} in {}. Would you like to know more or arrange a viewing?",
                p.title,
                self.price(p.price),
                p.location
            ),
            None => self.choose(GREETING_RESPONSES).to_string(),
        }
    }

    fn price_reply(&self, property: Option<&PropertyContext>) -> String {
        match property {
            Some(p) if p.status.is_available() => format!(
                "{} is listed at {} and is currently {}.",
                p.title,
                self.price(p.price),
                p.status.describe()
            ),
            Some(p) => format!(
                "{} was listed at {} but is {}. Would you like me to show you similar listings?",
                p.title,
                self.price(p.price),
                p.status.describe()
            ),
            None => "Prices vary by location and size. What budget range do you have in mind?".to_string(),
        }
    }
}

fn property_type_reply(text: &str, state: &ConversationState) -> String {
    let kind = extract_property_type(text)
        .or(state.property_type())
        .unwrap_or("property");
    format!(
        "{} {} is a great choice! How many bedrooms are you looking for?",
        capitalize(article(kind)),
        kind
    )
}

fn bedroom_count_reply(text: &str, state: &ConversationState) -> String {
    let rooms = extract_bedroom_count(text)
        .or(state.bedroom_count())
        .map(bedroom_label)
        .unwrap_or_else(|| "That number of bedrooms".to_string());
    format!(
        "{}, noted. Do you have a preferred location or budget in mind? I can also show you matching listings.",
        capitalize(&rooms)
    )
}

fn view_listings_reply(state: &ConversationState) -> String {
    let description = match (state.bedroom_count(), state.property_type()) {
        (Some(n), Some(kind)) => format!("{} {}", bedroom_label(n), kind),
        (Some(n), None) => format!("{} property", bedroom_label(n)),
        (None, Some(kind)) => kind.to_string(),
        (None, None) => {
            return "You can browse all our available listings on the properties page. Would you like me to narrow it down by property type or number of bedrooms?".to_string()
        },
    };
    format!(
        "Sure! Here are our available {} listings. You can narrow them down further by location or price.",
        description
    )
}

fn property_search_reply(state: &ConversationState) -> String {
    match (state.property_type(), state.bedroom_count()) {
        (None, _) => "I can help you find the right property. What type are you looking for: an apartment, house, villa, or something else?".to_string(),
        (Some(kind), None) => format!("Let's find you the right {}. How many bedrooms do you need?", kind),
        (Some(_), Some(_)) => {
            "Great, I have your preferences. Would you like to see the matching listings?".to_string()
        },
    }
}

fn location_reply(property: Option<&PropertyContext>) -> String {
    match property {
        Some(p) => format!(
            "{} is located in {}. Would you like details about the area or to arrange a viewing?",
            p.title, p.location
        ),
        None => "Which area are you interested in? I can help you find properties there.".to_string(),
    }
}

fn viewing_reply(state: &ConversationState, property: Option<&PropertyContext>) -> String {
    let opening = match property {
        Some(p) => format!("I'd be happy to arrange a viewing of {}.", p.title),
        None => "I'd be happy to arrange a viewing.".to_string(),
    };
    if state.stage() == Stage::CollectingInfo {
        // the slot reminder asks for the missing detail
        opening
    } else if state.contact_complete() {
        format!("{} Your agent will confirm a time with you.", opening)
    } else {
        format!(
            "{} Just let me know you'd like an agent to contact you and I'll take your details.",
            opening
        )
    }
}

fn help_reply(property: Option<&PropertyContext>) -> String {
    match property {
        Some(p) => {
            let agent = p
                .agent
                .as_ref()
                .map(|a| a.first_name.as_str())
                .unwrap_or("an agent");
            format!(
                "I can tell you about the price and location of {}, arrange a viewing, or connect you with {}. What would you like to do?",
                p.title, agent
            )
        },
        None => "I can help you browse listings, narrow them down by property type or bedrooms, answer price and location questions, or connect you with an agent.".to_string(),
    }
}

/// Question asking for one contact slot
fn slot_prompt(slot: ContactSlot) -> &'static str {
    match slot {
        ContactSlot::Name => "May I have your name, please?",
        ContactSlot::Phone => "What's the best phone number to reach you?",
        ContactSlot::Email => "And what's your email address?",
    }
}

/// Append the pending slot question while a lead is being collected
fn with_slot_reminder(reply: String, state: &ConversationState) -> String {
    if state.stage() != Stage::CollectingInfo {
        return reply;
    }
    match state.next_missing_contact_slot() {
        Some(slot) => format!("{} {}", reply, slot_prompt(slot)),
        None => reply,
    }
}

fn buy_reply(state: &ConversationState, property: Option<&PropertyContext>) -> String {
    match (state.next_missing_contact_slot(), property) {
        (Some(ContactSlot::Name), Some(p)) => format!(
            "Great choice! I'd be happy to help you with {}. {}",
            p.title,
            slot_prompt(ContactSlot::Name)
        ),
        (Some(ContactSlot::Name), None) => format!(
            "Great! I'd be happy to help you find a property to buy. {}",
            slot_prompt(ContactSlot::Name)
        ),
        (Some(slot), _) => slot_prompt(slot).to_string(),
        (None, _) => already_submitted(state, property),
    }
}

fn sell_reply(state: &ConversationState) -> String {
    match state.next_missing_contact_slot() {
        Some(ContactSlot::Name) => "I'd be glad to help you sell your property. I'll need your name and phone number so an agent can get in touch. Let's start with your name.".to_string(),
        Some(slot) => slot_prompt(slot).to_string(),
        None => already_submitted(state, None),
    }
}

fn agent_contact_reply(state: &ConversationState, property: Option<&PropertyContext>) -> String {
    let agent = property.and_then(|p| p.agent.as_ref().map(|a| (p, a)));
    let opening = match agent {
        Some((p, a)) => format!(
            "{} is the listing agent for {} and would be happy to help.",
            a.first_name, p.title
        ),
        None => "I can connect you with one of our agents.".to_string(),
    };
    match state.next_missing_contact_slot() {
        Some(ContactSlot::Name) => {
            let ask = match agent {
                Some((_, a)) => format!("May I have your name so {} can reach you?", a.first_name),
                None => slot_prompt(ContactSlot::Name).to_string(),
            };
            format!("{} {}", opening, ask)
        },
        Some(slot) => format!("{} {}", opening, slot_prompt(slot)),
        None => already_submitted(state, property),
    }
}

fn contact_reply(
    intent: Intent,
    state: &ConversationState,
    lead_completed: bool,
    property: Option<&PropertyContext>,
) -> String {
    if state.stage() == Stage::InquirySubmitted {
        return if lead_completed {
            confirmation(state, property)
        } else {
            already_submitted(state, property)
        };
    }

    if state.stage() != Stage::CollectingInfo {
        return match property {
            Some(p) => format!(
                "Thanks for sharing that. Would you like an agent to contact you about {}?",
                p.title
            ),
            None => "Thanks for sharing that. Would you like an agent to contact you?".to_string(),
        };
    }

    let name = state.user_name().unwrap_or_default();
    match (intent, state.next_missing_contact_slot()) {
        (Intent::NameProvided, Some(ContactSlot::Phone)) => format!(
            "Nice to meet you, {}! {}",
            name,
            slot_prompt(ContactSlot::Phone)
        ),
        (Intent::PhoneProvided, Some(ContactSlot::Email)) => format!(
            "Thanks, {}! {}",
            name,
            slot_prompt(ContactSlot::Email)
        ),
        // The detail did not fill the expected slot; ask again for the one we need
        (_, Some(slot)) => slot_prompt(slot).to_string(),
        (_, None) => confirmation(state, property),
    }
}

fn confirmation(state: &ConversationState, property: Option<&PropertyContext>) -> String {
    let name = state.user_name().unwrap_or_default();
    let email = state.user_email().unwrap_or_default();
    let subject = property
        .map(|p| format!(" about {}", p.title))
        .unwrap_or_default();
    format!(
        "Thank you, {}! Your inquiry{} has been sent. An agent will follow up with you at {} shortly.",
        name, subject, email
    )
}

fn already_submitted(state: &ConversationState, property: Option<&PropertyContext>) -> String {
    let name = state.user_name().unwrap_or_default();
    let subject = property
        .map(|p| format!(" about {}", p.title))
        .unwrap_or_default();
    format!(
        "We already have your details, {}. An agent will be in touch{} shortly.",
        name, subject
    )
}

fn bedroom_label(count: u8) -> String {
    format!("{}-bedroom", count)
}

fn article(word: &str) -> &'static str {
    match word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// 1200000 -> "1,200,000"
pub fn group_thousands(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
