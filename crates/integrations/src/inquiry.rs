//! Inquiry submission
//!
//! A completed lead is handed to the listing platform's inquiry endpoint as
//! `POST {propertyId, name, email, message}`. One call per lead, no retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use lead_assistant_config::InquiryConfig;

use crate::IntegrationError;

/// Body of the outbound inquiry call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryRequest {
    /// Absent when the lead was captured without a property on screen
    pub property_id: Option<String>,
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Acknowledgement returned by the inquiry endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryReceipt {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inquiry_id: Option<String>,
}

/// Inquiry creation collaborator
///
/// Implementations return `Err` for transport failures and for inquiries the
/// endpoint refuses; a returned receipt always has `success == true`.
#[async_trait]
pub trait InquirySubmitter: Send + Sync {
    async fn submit(&self, inquiry: &InquiryRequest) -> Result<InquiryReceipt, IntegrationError>;
}

/// Response shape of the listing platform's inquiry endpoint
#[derive(Debug, Deserialize)]
struct EndpointResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Submits inquiries to an HTTP endpoint
pub struct HttpInquirySubmitter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpInquirySubmitter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, IntegrationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Build from config; `None` when no endpoint is configured
    pub fn from_config(config: &InquiryConfig) -> Result<Option<Self>, IntegrationError> {
        config
            .endpoint
            .as_ref()
            .map(|endpoint| Self::new(endpoint.clone(), Duration::from_millis(config.timeout_ms)))
            .transpose()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl InquirySubmitter for HttpInquirySubmitter {
    async fn submit(&self, inquiry: &InquiryRequest) -> Result<InquiryReceipt, IntegrationError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            property_id = ?inquiry.property_id,
            "Submitting inquiry"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(inquiry)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = %status, "Inquiry endpoint returned an error status");
            return Err(IntegrationError::Rejected(format!("HTTP {}: {}", status, body)));
        }

        // An empty or non-JSON 2xx body still counts as accepted
        let parsed = serde_json::from_str::<EndpointResponse>(&body).ok();
        let (success, id, message) = match parsed {
            Some(r) => (r.success.unwrap_or(true), r.id, r.message),
            None => (true, None, None),
        };

        if !success {
            return Err(IntegrationError::Rejected(
                message.unwrap_or_else(|| "endpoint reported failure".to_string()),
            ));
        }

        let inquiry_id = id.map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });

        tracing::info!(inquiry_id = ?inquiry_id, "Inquiry accepted");
        Ok(InquiryReceipt {
            success: true,
            inquiry_id,
        })
    }
}

/// Stub submitter for development
///
/// Logs the inquiry and returns a generated id without contacting anything.
#[derive(Debug, Default)]
pub struct StubInquirySubmitter;

impl StubInquirySubmitter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InquirySubmitter for StubInquirySubmitter {
    async fn submit(&self, inquiry: &InquiryRequest) -> Result<InquiryReceipt, IntegrationError> {
        if inquiry.name.trim().is_empty() || inquiry.email.trim().is_empty() {
            return Err(IntegrationError::InvalidRequest(
                "name and email are required".to_string(),
            ));
        }
        let id = format!(
            "INQ-{}",
            uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase()
        );
        tracing::info!(
            inquiry_id = %id,
            property_id = ?inquiry.property_id,
            name = %inquiry.name,
            "Stub submitter: created inquiry"
        );
        Ok(InquiryReceipt {
            success: true,
            inquiry_id: Some(id),
        })
    }
}
