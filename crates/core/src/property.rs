//! Property context supplied by the listing collaborator
//!
//! The assistant never fetches or mutates these values; they are only used
//! for string interpolation in responses and to address the inquiry.

use serde::{Deserialize, Serialize};

/// Listing status of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    #[default]
    ForSale,
    ForRent,
    Sold,
    Rented,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::ForSale => "for_sale",
            PropertyStatus::ForRent => "for_rent",
            PropertyStatus::Sold => "sold",
            PropertyStatus::Rented => "rented",
        }
    }

    /// Phrase used in replies, e.g. "for sale"
    pub fn describe(&self) -> &'static str {
        match self {
            PropertyStatus::ForSale => "for sale",
            PropertyStatus::ForRent => "for rent",
            PropertyStatus::Sold => "sold",
            PropertyStatus::Rented => "already rented",
        }
    }

    /// Whether the listing can still be inquired about
    pub fn is_available(&self) -> bool {
        matches!(self, PropertyStatus::ForSale | PropertyStatus::ForRent)
    }
}

/// Listing agent responsible for a property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl AgentInfo {
    pub fn new(first_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: None,
            avatar: None,
        }
    }
}

/// Property currently shown to the visitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyContext {
    pub id: String,
    pub title: String,
    /// Listing price in whole currency units
    pub price: u64,
    pub location: String,
    #[serde(default)]
    pub status: PropertyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentInfo>,
}

impl PropertyContext {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        price: u64,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            location: location.into(),
            status: PropertyStatus::default(),
            agent: None,
        }
    }

    pub fn with_status(mut self, status: PropertyStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_agent(mut self, agent: AgentInfo) -> Self {
        self.agent = Some(agent);
        self
    }
}
