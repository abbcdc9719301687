//! External System Integrations
//!
//! The assistant consumes exactly one external capability: submitting a
//! completed lead as an inquiry on a property.

pub mod inquiry;

pub use inquiry::{
    HttpInquirySubmitter, InquiryReceipt, InquiryRequest, InquirySubmitter, StubInquirySubmitter,
};

use thiserror::Error;

/// Integration errors
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Inquiry rejected: {0}")]
    Rejected(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for IntegrationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IntegrationError::Timeout
        } else if err.is_builder() {
            IntegrationError::InvalidRequest(err.to_string())
        } else {
            IntegrationError::ConnectionFailed(err.to_string())
        }
    }
}
