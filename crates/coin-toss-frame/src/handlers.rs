//! HTTP API handlers.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use coin_toss_core::{game::format_token_amount, game::wager, BetAmount, CoinSide};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{FrameError, PlainError};
use crate::frame::{
    home_page, FlipRequest, FrameActionBody, FrameMetadata, FramePayload, BET_PROMPT,
    FLIP_BUTTON, PLAY_AGAIN_BUTTON, STATIC_IMAGE,
};
use crate::render::{self, Card};
use crate::state::AppState;

const CACHE_FOREVER: &str = "public, max-age=31536000";
const NO_STORE: &str = "no-store, must-revalidate";
const NO_CACHE: &str = "no-cache, no-store, must-revalidate";
const URL_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

fn png(card: Card, cache: &'static str) -> Result<Response, FrameError> {
    let bytes = card.render()?;
    Ok((
        [(header::CONTENT_TYPE, "image/png"), (header::CACHE_CONTROL, cache)],
        bytes,
    )
        .into_response())
}

fn inline_png(card: Card) -> Result<String, FrameError> {
    Ok(render::data_uri(&card.render()?))
}

// ============ Pages ============

pub async fn home(State(state): State<AppState>) -> Html<String> {
    Html(home_page(&state.config))
}

pub async fn metadata(State(state): State<AppState>) -> Response {
    let html = FrameMetadata::for_config(&state.config).to_html();
    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, NO_STORE),
        ],
        html,
    )
        .into_response()
}

// ============ Images ============

pub async fn welcome_image() -> Result<Response, PlainError> {
    Ok(png(render::welcome_card(), CACHE_FOREVER)?)
}

pub async fn frame_image() -> Result<Response, PlainError> {
    Ok(png(render::ready_card(), CACHE_FOREVER)?)
}

#[derive(Debug, Default, Deserialize)]
pub struct ChoiceImageQuery {
    pub result: Option<String>,
    pub win: Option<String>,
}

/// Reads `result` the way a browser's `parseInt` would: leading digits after
/// an optional sign, `0x` for hex. Absent or empty means heads; anything that
/// is not a number, or not zero, means tails.
fn result_side(result: Option<&str>) -> CoinSide {
    let Some(raw) = result.filter(|r| !r.is_empty()) else {
        return CoinSide::Heads;
    };
    let unsigned = raw.trim_start();
    let unsigned = unsigned
        .strip_prefix('-')
        .or_else(|| unsigned.strip_prefix('+'))
        .unwrap_or(unsigned);
    let (digits, radix) = match unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (unsigned, 10),
    };
    let leading: Vec<char> = digits.chars().take_while(|c| c.is_digit(radix)).collect();
    let is_zero = !leading.is_empty() && leading.iter().all(|&c| c == '0');
    CoinSide::from_code(if is_zero { 0 } else { 1 })
}

/// `?result=0|1&win=true|false`
pub async fn choice_image(Query(query): Query<ChoiceImageQuery>) -> Result<Response, PlainError> {
    let side = result_side(query.result.as_deref());
    let win = query.win.as_deref() == Some("true");
    Ok(png(render::choice_outcome_card(side, win), NO_CACHE)?)
}

// ============ Frame actions ============

/// Bet typed into the frame input; answers with an image
pub async fn frame_action(body: Bytes) -> Result<Response, PlainError> {
    let action: FrameActionBody =
        serde_json::from_slice(&body).map_err(|e| FrameError::Malformed(e.to_string()))?;
    if action.untrusted_data.is_none() {
        return Err(FrameError::Malformed("missing untrustedData".to_string()).into());
    }

    let bet = BetAmount::parse(action.input_text()).map_err(FrameError::from)?;
    let side = CoinSide::flip();
    tracing::info!(bet = %bet, result = %side, "Frame bet flipped");

    Ok(png(render::bet_result_card(side, bet.as_str()), CACHE_FOREVER)?)
}

pub async fn choice_frame(State(state): State<AppState>) -> Json<FramePayload> {
    let config = &state.config;
    Json(
        FramePayload::new(config.url(STATIC_IMAGE))
            .button(CoinSide::Heads.as_str())
            .button(CoinSide::Tails.as_str())
            .post_url(config.url("/api/frame/choice")),
    )
}

/// Button 1 picks heads, anything else tails
pub async fn choice_action(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<FramePayload>, FrameError> {
    let action: FrameActionBody =
        serde_json::from_slice(&body).map_err(|e| FrameError::Malformed(e.to_string()))?;
    let choice = CoinSide::from_button_index(action.button_index().unwrap_or(0));
    let result = CoinSide::flip();
    let win = result == choice;
    tracing::info!(choice = %choice, result = %result, win, "Choice flipped");

    let config = &state.config;
    let image = config.url(&format!(
        "/api/frame/image?result={}&win={}",
        result.code(),
        win
    ));
    Ok(Json(
        FramePayload::new(image)
            .button(PLAY_AGAIN_BUTTON)
            .post_url(config.url("/api/frame/choice"))
            .outcome(result.as_str(), win),
    ))
}

// ============ Flip ============

pub async fn flip_frame() -> Result<Json<FramePayload>, FrameError> {
    Ok(Json(
        FramePayload::new(inline_png(render::ready_card())?)
            .button(FLIP_BUTTON)
            .input(BET_PROMPT),
    ))
}

/// Heads wins
pub async fn flip(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<FramePayload>, FrameError> {
    let request: FlipRequest =
        serde_json::from_slice(&body).map_err(|e| FrameError::Malformed(e.to_string()))?;
    let bet = BetAmount::parse(&request.bet_text())?;

    let result = CoinSide::flip();
    let win = result == CoinSide::Heads;
    tracing::info!(bet = %bet, result = %result, win, "Coin flipped");

    let image = inline_png(render::flip_outcome_card(result.as_str(), bet.as_str(), win))?;
    Ok(Json(
        FramePayload::new(image)
            .button(PLAY_AGAIN_BUTTON)
            .input(BET_PROMPT)
            .post_url(state.config.url("/api/flip"))
            .outcome(result.as_str(), win),
    ))
}

// ============ Manifest ============

/// Serve the manifest file byte for byte
pub async fn manifest(State(state): State<AppState>) -> Result<Response, FrameError> {
    let bytes = tokio::fs::read(&state.config.manifest_path).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        bytes,
    )
        .into_response())
}

// ============ Validation ============

fn validation_reply(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "valid": false, "message": message.into() })),
    )
        .into_response()
}

pub async fn validate_message(State(state): State<AppState>, body: Bytes) -> Response {
    let action: FrameActionBody = match serde_json::from_slice(&body) {
        Ok(action) => action,
        Err(e) => {
            tracing::warn!("Unparseable validation request: {}", e);
            return validation_reply(StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e));
        }
    };

    let Some(message_bytes) = action.message_bytes() else {
        return validation_reply(StatusCode::BAD_REQUEST, "Missing frame message data");
    };

    match state.validator.validate(message_bytes).await {
        Ok(validation) => {
            let status = if validation.valid {
                StatusCode::OK
            } else {
                StatusCode::BAD_REQUEST
            };
            (status, Json(validation)).into_response()
        }
        Err(e) => {
            tracing::error!("Frame message validation failed: {}", e);
            validation_reply(StatusCode::BAD_GATEWAY, "Error validating frame message")
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlCheck {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn check_url(client: &reqwest::Client, url: String) -> UrlCheck {
    let response = client
        .get(&url)
        .header(header::ACCEPT, "text/html,application/json,image/*")
        .timeout(URL_CHECK_TIMEOUT)
        .send()
        .await;
    match response {
        Ok(response) => UrlCheck {
            status: Some(response.status().as_u16()),
            ok: response.status().is_success(),
            content_type: response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            error: None,
            url,
        },
        Err(e) => {
            tracing::warn!("URL check failed for {}: {}", url, e);
            UrlCheck {
                status: None,
                ok: false,
                content_type: None,
                error: Some(e.to_string()),
                url,
            }
        }
    }
}

/// Reachability of the frame's URLs plus a metadata completeness check
pub async fn validate_report(State(state): State<AppState>) -> Response {
    let config = &state.config;
    let urls = [
        config.app_url.clone(),
        config.url("/api/frame"),
        config.url("/api/frame/image"),
        config.url("/favicon.ico"),
        config.url(STATIC_IMAGE),
    ];
    let checks = join_all(urls.into_iter().map(|url| check_url(&state.http, url))).await;

    let metadata = FrameMetadata::for_config(config);
    let missing = metadata.missing_fields();
    let report = serde_json::json!({
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "urlValidation": checks,
        "metadataValidation": {
            "hasRequiredFields": missing.is_empty(),
            "missingFields": missing,
            "requiredFields": metadata.required_fields(),
        },
        "frameMetadata": metadata.to_json(),
    });

    ([(header::CACHE_CONTROL, NO_CACHE)], Json(report)).into_response()
}

// ============ Game state ============

pub async fn game_state(State(state): State<AppState>) -> Result<Json<serde_json::Value>, FrameError> {
    let contract = state.contract.as_ref().ok_or(FrameError::ContractUnavailable)?;
    let game = contract.get_state().await?;

    Ok(Json(serde_json::json!({
        "contract": format!("{:#x}", contract.address()),
        "tossNumber": game.toss_number,
        "player1": game.player1(),
        "player2": game.player2(),
        "winner": game.winner().map(|w| format!("{:#x}", w)),
        "availableSide": game.available_side(),
        "status": game.status_message(),
        "wager": format_token_amount(wager()),
    })))
}

pub async fn health() -> &'static str {
    "ok"
}
