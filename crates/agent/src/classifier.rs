//! Intent Classification
//!
//! Maps one free-text visitor message to at most one [`Intent`].
//!
//! The lexical rules overlap (a bare "2" could be a bedroom count or part of
//! some unrelated answer), so evaluation is ordered and first-match-wins. The
//! order lives in [`IntentClassifier::rules`] followed by [`KEYWORD_TABLE`];
//! both are public so precedence can be inspected and tested directly.

use once_cell::sync::Lazy;
use regex::Regex;

use lead_assistant_core::{ConversationState, Intent};

/// Whether the next message may be read as the visitor's name
///
/// Only open right after the assistant explicitly asked for a name and
/// before one has been recorded. Outside that moment ordinary replies like
/// "Paris" or "Maybe later" must not be captured as names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameGate {
    Open,
    Closed,
}

impl NameGate {
    pub fn from_state(state: &ConversationState) -> Self {
        if state.is_awaiting_name() {
            NameGate::Open
        } else {
            NameGate::Closed
        }
    }
}

/// Closed vocabulary for the property-type rule
pub const PROPERTY_TYPES: &[&str] = &[
    "apartment",
    "house",
    "condo",
    "villa",
    "penthouse",
    "studio",
    "flat",
    "loft",
];

/// Replies that are never names
const ACKNOWLEDGEMENTS: &[&str] = &[
    "yes", "no", "ok", "okay", "sure", "thanks", "thank you", "hi", "hello", "hey", "yeah",
    "yep", "yup", "nope", "nah", "maybe", "fine", "cool", "great", "good", "alright", "hmm",
    "what", "why", "how", "who", "later", "not now", "no thanks", "skip", "bye",
];

/// Characters that disqualify text as a name
const NAME_DISALLOWED: &[char] = &[
    '?', '!', '@', '#', '$', '%', '^', '&', '*', '(', ')', '_', '+', '=', '[', ']', '{', '}',
    '|', '\\', ':', ';', '"', '<', '>', '/', ',',
];

/// Lead-ins stripped before a name is checked ("my name is John")
const NAME_PREFIXES: &[&str] = &["my name is ", "name is ", "i'm ", "i am ", "this is ", "call me "];

/// Fallback keyword table, evaluated top to bottom after the ordered rules
pub const KEYWORD_TABLE: &[(Intent, &[&str])] = &[
    (
        Intent::PropertySearch,
        &["looking for", "search", "find", "available", "properties", "listings", "browse"],
    ),
    (
        Intent::PriceInquiry,
        &["price", "cost", "how much", "budget", "expensive", "afford"],
    ),
    (
        Intent::LocationInquiry,
        &["location", "where", "area", "neighborhood", "neighbourhood", "address", "located"],
    ),
    (
        Intent::AgentContact,
        &["agent", "contact", "call me", "speak to", "talk to", "representative", "realtor"],
    ),
    (
        Intent::ViewingRequest,
        &["viewing", "visit", "tour", "see the property", "see it", "schedule", "appointment"],
    ),
    (
        Intent::Help,
        &["help", "what can you do", "options", "assist"],
    ),
    (
        Intent::Thanks,
        &["thank", "thanks", "appreciate", "cheers"],
    ),
];

static GREETING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:hi|hello|hey|hiya|greetings|good\s+(?:morning|afternoon|evening))(?:\s+(?:there|all|everyone))?[\s!.,]*$",
    )
    .unwrap()
});

static VIEW_LISTINGS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:please\s+|can\s+you\s+|could\s+you\s+)?(?:show|view|see|list|browse)\s+(?:me\s+|us\s+)?(?:all\s+|the\s+|your\s+|some\s+)?(?:available\s+)?(?:listings?|properties|homes|units)\b",
    )
    .unwrap()
});

static BUY_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(
            r"^(?:i\s+|i'd\s+|i'm\s+|we\s+|we'd\s+|we're\s+)?(?:really\s+)?(?:(?:want|would\s+like|like|need|plan|planning|am\s+planning|hope)\s+to|wanna)\s+(?:buy|purchase)\b[^?]{0,40}$",
        )
        .unwrap(),
        Regex::new(
            r"^(?:i'm\s+|i\s+am\s+|we're\s+|we\s+are\s+)?(?:very\s+|really\s+)?interested\s+in\s+(?:buying|purchasing)\b[^?]{0,40}$",
        )
        .unwrap(),
        Regex::new(
            r"^(?:i'm|i\s+am)\s+(?:very\s+|really\s+)?interested(?:\s+in\s+(?:it|this(?:\s+(?:one|property))?))?[\s!.]*$",
        )
        .unwrap(),
        Regex::new(r"^(?:buy|purchase)(?:\s+(?:it|this|this\s+one|this\s+property|now))?[\s!.]*$")
            .unwrap(),
    ]
});

static SELL_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(
            r"^(?:i\s+|i'd\s+|i'm\s+|we\s+|we'd\s+|we're\s+)?(?:really\s+)?(?:(?:want|would\s+like|like|need|plan|planning|am\s+planning|hope)\s+to|wanna)\s+sell\b[^?]{0,40}$",
        )
        .unwrap(),
        Regex::new(
            r"^(?:i'm\s+|i\s+am\s+|we're\s+|we\s+are\s+)?(?:very\s+|really\s+)?interested\s+in\s+selling\b[^?]{0,40}$",
        )
        .unwrap(),
        Regex::new(r"^sell(?:ing)?\s+my\b[^?]{0,40}$").unwrap(),
    ]
});

static BEDROOM_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(\d{1,2}|one|two|three|four|five|six|seven|eight|nine|ten)[\s-]*(?:bed(?:room)?s?|br|bhk)\b",
    )
    .unwrap()
});

static BARE_INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}$").unwrap());

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d\s+().\-]{7,}$").unwrap());

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap()
});

/// Trimmed input plus its lowercase form
pub(crate) struct Utterance<'a> {
    trimmed: &'a str,
    lower: String,
}

impl<'a> Utterance<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        let trimmed = text.trim();
        Self {
            trimmed,
            lower: trimmed.to_lowercase().replace('\u{2019}', "'"),
        }
    }
}

type Predicate = fn(&Utterance<'_>, NameGate) -> bool;

/// One entry of the ordered rule table
pub struct Rule {
    pub intent: Intent,
    pub description: &'static str,
    predicate: Predicate,
}

impl Rule {
    /// Evaluate this rule on its own, ignoring precedence
    pub fn matches(&self, text: &str, gate: NameGate) -> bool {
        (self.predicate)(&Utterance::new(text), gate)
    }
}

static RULES: [Rule; 8] = [
    Rule {
        intent: Intent::Greeting,
        description: "whole input is a greeting phrase",
        predicate: is_greeting,
    },
    Rule {
        intent: Intent::ViewListings,
        description: "imperative request to show listings",
        predicate: is_view_listings,
    },
    Rule {
        intent: Intent::BuyIntent,
        description: "short first-person wish to buy",
        predicate: is_buy_intent,
    },
    Rule {
        intent: Intent::SellIntent,
        description: "short first-person wish to sell",
        predicate: is_sell_intent,
    },
    Rule {
        intent: Intent::PropertyType,
        description: "single word from the property-type vocabulary",
        predicate: is_property_type,
    },
    Rule {
        intent: Intent::BedroomCount,
        description: "bedroom phrase or a bare integer 1-99",
        predicate: is_bedroom_count,
    },
    Rule {
        intent: Intent::PhoneProvided,
        description: "phone-shaped text",
        predicate: is_phone,
    },
    Rule {
        intent: Intent::EmailProvided,
        description: "text containing an email address",
        predicate: is_email,
    },
];

/// Rule for names; evaluated after the table above and only when the gate is open
static NAME_RULE: Rule = Rule {
    intent: Intent::NameProvided,
    description: "name given right after being asked for one",
    predicate: is_name,
};

fn is_greeting(u: &Utterance<'_>, _gate: NameGate) -> bool {
    GREETING_RE.is_match(&u.lower)
}

fn is_view_listings(u: &Utterance<'_>, _gate: NameGate) -> bool {
    VIEW_LISTINGS_RE.is_match(&u.lower)
}

fn is_buy_intent(u: &Utterance<'_>, _gate: NameGate) -> bool {
    BUY_RES.iter().any(|re| re.is_match(&u.lower))
}

fn is_sell_intent(u: &Utterance<'_>, _gate: NameGate) -> bool {
    SELL_RES.iter().any(|re| re.is_match(&u.lower))
}

fn is_property_type(u: &Utterance<'_>, _gate: NameGate) -> bool {
    property_type_of(&u.lower).is_some()
}

fn is_bedroom_count(u: &Utterance<'_>, _gate: NameGate) -> bool {
    bedroom_count_of(&u.lower).is_some()
}

fn is_phone(u: &Utterance<'_>, _gate: NameGate) -> bool {
    PHONE_RE.is_match(u.trimmed) && u.trimmed.chars().any(|c| c.is_ascii_digit())
}

fn is_email(u: &Utterance<'_>, _gate: NameGate) -> bool {
    EMAIL_RE.is_match(u.trimmed)
}

fn is_name(u: &Utterance<'_>, gate: NameGate) -> bool {
    gate == NameGate::Open && name_of(u.trimmed).is_some()
}

fn property_type_of(lower: &str) -> Option<&'static str> {
    let word = lower.trim_end_matches(['.', '!']).trim();
    let word = word
        .strip_prefix("an ")
        .or_else(|| word.strip_prefix("a "))
        .unwrap_or(word)
        .trim();
    if word.contains(char::is_whitespace) {
        return None;
    }
    PROPERTY_TYPES.iter().copied().find(|t| {
        word == *t || word.strip_suffix('s') == Some(*t) || word.strip_suffix("es") == Some(*t)
    })
}

fn word_to_number(word: &str) -> Option<u8> {
    let n = match word {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        digits => return digits.parse().ok(),
    };
    Some(n)
}

fn bedroom_count_of(lower: &str) -> Option<u8> {
    if let Some(caps) = BEDROOM_PHRASE_RE.captures(lower) {
        return caps.get(1).and_then(|m| word_to_number(m.as_str()));
    }
    if BARE_INTEGER_RE.is_match(lower) {
        return lower.parse::<u8>().ok().filter(|n| (1..=99).contains(n));
    }
    None
}

fn name_of(trimmed: &str) -> Option<String> {
    let normalized = trimmed.replace('\u{2019}', "'");
    let lower = normalized.to_lowercase();
    let candidate = NAME_PREFIXES
        .iter()
        .find_map(|prefix| {
            lower
                .starts_with(prefix)
                .then(|| normalized.get(prefix.len()..))
                .flatten()
        })
        .unwrap_or(&normalized)
        .trim()
        .trim_end_matches(['.', '!'])
        .trim_end();

    let len = candidate.chars().count();
    if len <= 1 || len >= 20 {
        return None;
    }
    if candidate.contains(NAME_DISALLOWED) {
        return None;
    }
    if candidate.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let candidate_lower = candidate.to_lowercase();
    if ACKNOWLEDGEMENTS.contains(&candidate_lower.as_str()) {
        return None;
    }
    Some(candidate.to_string())
}

/// Canonical property type named by the text, if it is a single vocabulary word
pub fn extract_property_type(text: &str) -> Option<&'static str> {
    property_type_of(&Utterance::new(text).lower)
}

/// Bedroom count from a bedroom phrase or a bare integer in 1..=99
pub fn extract_bedroom_count(text: &str) -> Option<u8> {
    bedroom_count_of(&Utterance::new(text).lower)
}

/// Phone number as typed, if the text is phone-shaped
pub fn extract_phone(text: &str) -> Option<String> {
    let u = Utterance::new(text);
    is_phone(&u, NameGate::Closed).then(|| u.trimmed.to_string())
}

/// First email address contained in the text
pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

/// Name from the text after stripping lead-ins like "my name is"
pub fn extract_name(text: &str) -> Option<String> {
    name_of(text.trim())
}

/// Rule-based intent classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Ordered rules evaluated before the name rule and the keyword table
    pub fn rules() -> &'static [Rule] {
        &RULES
    }

    /// Classify using the name gate implied by the conversation state
    pub fn classify(&self, text: &str, state: &ConversationState) -> Option<Intent> {
        self.classify_with_gate(text, NameGate::from_state(state))
    }

    /// Classify with an explicit name gate
    pub fn classify_with_gate(&self, text: &str, gate: NameGate) -> Option<Intent> {
        let utterance = Utterance::new(text);
        if utterance.trimmed.is_empty() {
            return None;
        }

        let rule = RULES
            .iter()
            .chain(std::iter::once(&NAME_RULE))
            .find(|rule| (rule.predicate)(&utterance, gate));
        let intent = rule
            .map(|rule| rule.intent)
            .or_else(|| Self::match_keywords(&utterance.lower));

        tracing::debug!(
            intent = intent.map(|i| i.as_str()).unwrap_or("none"),
            rule = rule.map(|r| r.description).unwrap_or("keyword table"),
            name_gate = ?gate,
            "Classified message"
        );

        intent
    }

    fn match_keywords(lower: &str) -> Option<Intent> {
        KEYWORD_TABLE
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
            .map(|(intent, _)| *intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Option<Intent> {
        IntentClassifier::new().classify_with_gate(text, NameGate::Closed)
    }

    fn classify_asked(text: &str) -> Option<Intent> {
        IntentClassifier::new().classify_with_gate(text, NameGate::Open)
    }

    #[test]
    fn test_greetings() {
        for text in ["hi", "hello", "hey", "hi there", "good morning", "good evening", "Hello!", "  HEY  "] {
            assert_eq!(classify(text), Some(Intent::Greeting), "input: {text}");
        }
    }

    #[test]
    fn test_greeting_requires_whole_input() {
        assert_ne!(classify("hi, what's the price of this villa?"), Some(Intent::Greeting));
        assert_eq!(
            classify("hi, what's the price of this villa?"),
            Some(Intent::PriceInquiry)
        );
        assert_ne!(classify("this is a high ceiling"), Some(Intent::Greeting));
    }

    #[test]
    fn test_view_listings() {
        assert_eq!(classify("show listings"), Some(Intent::ViewListings));
        assert_eq!(classify("Show me available properties"), Some(Intent::ViewListings));
        assert_eq!(classify("list all properties"), Some(Intent::ViewListings));
    }

    #[test]
    fn test_buy_and_sell() {
        assert_eq!(classify("I want to buy"), Some(Intent::BuyIntent));
        assert_eq!(classify("I'd like to purchase this property"), Some(Intent::BuyIntent));
        assert_eq!(classify("interested in buying"), Some(Intent::BuyIntent));
        assert_eq!(classify("I’m interested"), Some(Intent::BuyIntent));
        assert_eq!(classify("I want to sell"), Some(Intent::SellIntent));
        assert_eq!(classify("sell my apartment"), Some(Intent::SellIntent));
        assert_eq!(classify("interested in selling"), Some(Intent::SellIntent));
    }

    #[test]
    fn test_buy_ignores_incidental_mentions() {
        // Longer questions that merely mention buying are not a lead signal
        assert_ne!(
            classify("what taxes do people usually pay when they buy here?"),
            Some(Intent::BuyIntent)
        );
    }

    #[test]
    fn test_property_type() {
        assert_eq!(classify("villa"), Some(Intent::PropertyType));
        assert_eq!(classify("Apartments"), Some(Intent::PropertyType));
        assert_eq!(classify("a penthouse."), Some(Intent::PropertyType));
        assert_eq!(extract_property_type("Houses"), Some("house"));
        assert_eq!(extract_property_type("big villa"), None);
    }

    #[test]
    fn test_bedroom_count() {
        assert_eq!(classify("3 bed"), Some(Intent::BedroomCount));
        assert_eq!(classify("three bedroom"), Some(Intent::BedroomCount));
        assert_eq!(classify("2 bed apartment"), Some(Intent::BedroomCount));
        assert_eq!(extract_bedroom_count("2 bed apartment"), Some(2));
        assert_eq!(extract_bedroom_count("four-bedroom"), Some(4));
    }

    #[test]
    fn test_bare_integer_is_bedroom_count() {
        assert_eq!(classify("42"), Some(Intent::BedroomCount));
        assert_eq!(extract_bedroom_count("42"), Some(42));
        assert_eq!(classify("0"), None);
        assert_eq!(extract_bedroom_count("100"), None);
    }

    #[test]
    fn test_phone() {
        assert_eq!(classify("+971501234567"), Some(Intent::PhoneProvided));
        assert_eq!(classify("(050) 123-4567"), Some(Intent::PhoneProvided));
        assert_eq!(extract_phone(" 050 123 4567 "), Some("050 123 4567".to_string()));
        assert_eq!(classify("123"), None);
    }

    #[test]
    fn test_email() {
        assert_eq!(classify("john@example.com"), Some(Intent::EmailProvided));
        assert_eq!(
            classify("you can reach me at jane.doe+homes@mail.co.uk"),
            Some(Intent::EmailProvided)
        );
        assert_eq!(
            extract_email("reach me at jane.doe@mail.com please"),
            Some("jane.doe@mail.com".to_string())
        );
    }

    #[test]
    fn test_name_only_when_asked() {
        assert_eq!(classify_asked("John"), Some(Intent::NameProvided));
        assert_eq!(classify("John"), None);
        assert_eq!(classify_asked("my name is Mary-Jane"), Some(Intent::NameProvided));
        assert_eq!(extract_name("my name is Mary-Jane"), Some("Mary-Jane".to_string()));
    }

    #[test]
    fn test_name_with_curly_apostrophe() {
        assert_eq!(classify_asked("I\u{2019}m Priya"), Some(Intent::NameProvided));
        assert_eq!(extract_name("I\u{2019}m Priya"), Some("Priya".to_string()));
        assert_eq!(extract_name("Sin\u{e9}ad O\u{2019}Brien"), Some("Sin\u{e9}ad O'Brien".to_string()));
    }

    #[test]
    fn test_name_trailing_punctuation() {
        assert_eq!(extract_name("My name is John."), Some("John".to_string()));
        assert_eq!(extract_name("call me Ana!"), Some("Ana".to_string()));
        assert_eq!(extract_name("ok."), None);
    }

    #[test]
    fn test_name_filters() {
        assert_ne!(classify_asked("2 guests"), Some(Intent::NameProvided));
        assert_ne!(classify_asked("ok"), Some(Intent::NameProvided));
        assert_ne!(classify_asked("thanks"), Some(Intent::NameProvided));
        assert_ne!(classify_asked("why?"), Some(Intent::NameProvided));
        assert_ne!(classify_asked("J"), Some(Intent::NameProvided));
        assert_ne!(
            classify_asked("Bartholomew Maximilian"),
            Some(Intent::NameProvided)
        );
        assert_eq!(extract_name("R2D2"), None);
    }

    #[test]
    fn test_name_gate_from_state() {
        let classifier = IntentClassifier::new();
        let fresh = ConversationState::new();
        assert_eq!(classifier.classify("John", &fresh), None);

        let asked = fresh.begin_lead_capture(None);
        assert_eq!(classifier.classify("John", &asked), Some(Intent::NameProvided));

        let named = asked.with_name("John");
        assert_eq!(classifier.classify("Peter", &named), None);
    }

    #[test]
    fn test_earlier_rules_win_over_name() {
        assert_eq!(classify_asked("hello"), Some(Intent::Greeting));
        assert_eq!(classify_asked("villa"), Some(Intent::PropertyType));
        assert_eq!(classify_asked("john@example.com"), Some(Intent::EmailProvided));
    }

    #[test]
    fn test_keyword_fallback_order() {
        assert_eq!(classify("What's the price?"), Some(Intent::PriceInquiry));
        assert_eq!(classify("where is it located"), Some(Intent::LocationInquiry));
        assert_eq!(classify("can I talk to someone"), Some(Intent::AgentContact));
        assert_eq!(classify("I'd like to schedule a tour"), Some(Intent::ViewingRequest));
        assert_eq!(classify("help"), Some(Intent::Help));
        assert_eq!(classify("thank you so much"), Some(Intent::Thanks));
        // property-search is declared before price
        assert_eq!(
            classify("looking for something in my budget"),
            Some(Intent::PropertySearch)
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(classify("the weather is nice"), None);
        assert_eq!(classify(""), None);
        assert_eq!(classify("   "), None);
    }

    #[test]
    fn test_rule_table_order() {
        let order: Vec<Intent> = IntentClassifier::rules().iter().map(|r| r.intent).collect();
        assert_eq!(
            order,
            vec![
                Intent::Greeting,
                Intent::ViewListings,
                Intent::BuyIntent,
                Intent::SellIntent,
                Intent::PropertyType,
                Intent::BedroomCount,
                Intent::PhoneProvided,
                Intent::EmailProvided,
            ]
        );
        let keyword_order: Vec<Intent> = KEYWORD_TABLE.iter().map(|(i, _)| *i).collect();
        assert_eq!(keyword_order.first(), Some(&Intent::PropertySearch));
        assert_eq!(keyword_order.last(), Some(&Intent::Thanks));
    }

    #[test]
    fn test_rules_individually() {
        let bedroom = &IntentClassifier::rules()[5];
        assert_eq!(bedroom.intent, Intent::BedroomCount);
        assert!(bedroom.matches("7", NameGate::Closed));
        assert!(!bedroom.matches("seven dwarfs", NameGate::Closed));
    }

    #[test]
    fn test_rule_descriptions_are_distinct() {
        let mut descriptions: Vec<&str> = IntentClassifier::rules()
            .iter()
            .chain(std::iter::once(&NAME_RULE))
            .map(|r| r.description)
            .collect();
        assert!(descriptions.iter().all(|d| !d.is_empty()));
        descriptions.sort_unstable();
        descriptions.dedup();
        assert_eq!(descriptions.len(), IntentClassifier::rules().len() + 1);
    }
}
