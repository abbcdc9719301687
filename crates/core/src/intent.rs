//! Intent labels produced by the classifier

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::CoreError;

/// Purpose behind one free-text visitor message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    Greeting,
    ViewListings,
    BuyIntent,
    SellIntent,
    PropertyType,
    BedroomCount,
    PhoneProvided,
    EmailProvided,
    NameProvided,
    PropertySearch,
    PriceInquiry,
    LocationInquiry,
    AgentContact,
    ViewingRequest,
    Help,
    Thanks,
}

impl Intent {
    /// Every intent, in classifier precedence order
    pub const ALL: [Intent; 16] = [
        Intent::Greeting,
        Intent::ViewListings,
        Intent::BuyIntent,
        Intent::SellIntent,
        Intent::PropertyType,
        Intent::BedroomCount,
        Intent::PhoneProvided,
        Intent::EmailProvided,
        Intent::NameProvided,
        Intent::PropertySearch,
        Intent::PriceInquiry,
        Intent::LocationInquiry,
        Intent::AgentContact,
        Intent::ViewingRequest,
        Intent::Help,
        Intent::Thanks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::ViewListings => "view-listings",
            Intent::BuyIntent => "buy-intent",
            Intent::SellIntent => "sell-intent",
            Intent::PropertyType => "property-type",
            Intent::BedroomCount => "bedroom-count",
            Intent::PhoneProvided => "phone-provided",
            Intent::EmailProvided => "email-provided",
            Intent::NameProvided => "name-provided",
            Intent::PropertySearch => "property-search",
            Intent::PriceInquiry => "price-inquiry",
            Intent::LocationInquiry => "location-inquiry",
            Intent::AgentContact => "agent-contact",
            Intent::ViewingRequest => "viewing-request",
            Intent::Help => "help",
            Intent::Thanks => "thanks",
        }
    }

    /// Intents that start lead capture when no name is on file yet
    pub fn starts_lead_capture(&self) -> bool {
        matches!(
            self,
            Intent::BuyIntent | Intent::SellIntent | Intent::AgentContact
        )
    }

    /// Intents that carry a contact detail
    pub fn is_contact_detail(&self) -> bool {
        matches!(
            self,
            Intent::NameProvided | Intent::PhoneProvided | Intent::EmailProvided
        )
    }

    /// Browsing intents that refine a property search
    pub fn is_search_refinement(&self) -> bool {
        matches!(
            self,
            Intent::ViewListings
                | Intent::PropertySearch
                | Intent::PropertyType
                | Intent::BedroomCount
        )
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Intent {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .iter()
            .copied()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| CoreError::UnknownIntent(s.to_string()))
    }
}
