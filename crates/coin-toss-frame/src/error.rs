//! Service errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coin_toss_core::{BetAmountError, ContractError};
use thiserror::Error;

use crate::render::RenderError;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid bet amount: {0}")]
    InvalidBet(#[from] BetAmountError),

    #[error("malformed frame request: {0}")]
    Malformed(String),

    #[error("manifest unavailable: {0}")]
    Manifest(#[from] std::io::Error),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("contract call failed: {0}")]
    Contract(#[from] ContractError),

    #[error("contract client not configured")]
    ContractUnavailable,
}

impl FrameError {
    pub fn status(&self) -> StatusCode {
        match self {
            FrameError::InvalidBet(_) => StatusCode::BAD_REQUEST,
            FrameError::Malformed(_) | FrameError::Manifest(_) | FrameError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            FrameError::Contract(_) => StatusCode::BAD_GATEWAY,
            FrameError::ContractUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Text shown to clients; internal details stay in the logs
    pub fn public_message(&self) -> &'static str {
        match self {
            FrameError::InvalidBet(_) => "Invalid bet amount",
            FrameError::Malformed(_) => "Failed to process frame",
            FrameError::Manifest(_) => "Internal Server Error",
            FrameError::Render(_) => "Failed to generate image",
            FrameError::Contract(_) => "Failed to read game state",
            FrameError::ContractUnavailable => "Contract client not configured",
        }
    }

    fn log(&self) {
        tracing::error!(status = self.status().as_u16(), "{}", self);
    }
}

/// JSON body `{ "error": ... }`
impl IntoResponse for FrameError {
    fn into_response(self) -> Response {
        self.log();
        let body = serde_json::json!({ "error": self.public_message() });
        (self.status(), Json(body)).into_response()
    }
}

/// Plain-text body, for endpoints that otherwise answer with images
pub struct PlainError(pub FrameError);

impl From<FrameError> for PlainError {
    fn from(e: FrameError) -> Self {
        PlainError(e)
    }
}

impl IntoResponse for PlainError {
    fn into_response(self) -> Response {
        self.0.log();
        (self.0.status(), self.0.public_message()).into_response()
    }
}
