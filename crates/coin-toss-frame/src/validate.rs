//! Frame message validation.
//!
//! Farcaster clients sign every frame action; `trustedData.messageBytes` carries
//! the signed message hex-encoded. A hub can verify the signature, otherwise
//! only the presence of a message is checked.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Validation {
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("hub request failed: {0}")]
    Network(String),

    #[error("unexpected hub response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait MessageValidator: Send + Sync {
    /// Check a hex-encoded signed frame message
    async fn validate(&self, message_bytes: &str) -> Result<Validation, ValidationError>;
}

fn decode(message_bytes: &str) -> Result<Vec<u8>, Validation> {
    let hex_str = message_bytes.trim_start_matches("0x");
    match hex::decode(hex_str) {
        Ok(bytes) if !bytes.is_empty() => Ok(bytes),
        Ok(_) => Err(Validation::invalid("Missing frame message data")),
        Err(e) => Err(Validation::invalid(format!("Malformed message bytes: {}", e))),
    }
}

/// Accepts any non-empty message without looking inside it
#[derive(Clone, Debug, Default)]
pub struct PresenceValidator;

#[async_trait]
impl MessageValidator for PresenceValidator {
    async fn validate(&self, message_bytes: &str) -> Result<Validation, ValidationError> {
        Ok(if message_bytes.is_empty() {
            Validation::invalid("Missing frame message data")
        } else {
            Validation::valid()
        })
    }
}

#[derive(Deserialize)]
struct HubResponse {
    valid: bool,
}

/// Verifies messages with a Farcaster hub (`/v1/validateMessage`)
pub struct HubValidator {
    client: Client,
    hub_url: String,
}

impl HubValidator {
    pub fn new(hub_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), hub_url)
    }

    pub fn with_client(client: Client, hub_url: impl Into<String>) -> Self {
        Self {
            client,
            hub_url: hub_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1/validateMessage", self.hub_url)
    }
}

#[async_trait]
impl MessageValidator for HubValidator {
    async fn validate(&self, message_bytes: &str) -> Result<Validation, ValidationError> {
        let bytes = match decode(message_bytes) {
            Ok(bytes) => bytes,
            Err(invalid) => return Ok(invalid),
        };

        let response = self
            .client
            .post(self.endpoint())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| ValidationError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ValidationError::InvalidResponse(format!("status {}", status)));
        }

        let body: HubResponse = response
            .json()
            .await
            .map_err(|e| ValidationError::InvalidResponse(e.to_string()))?;

        tracing::debug!(valid = body.valid, "hub validated frame message");
        Ok(if body.valid {
            Validation::valid()
        } else {
            Validation::invalid("Frame message signature is not valid")
        })
    }
}
