//! Endpoint tests driving the router in-process.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use coin_toss_core::{CoinSide, MockTossContract, TossContract};
use coin_toss_frame::{
    app,
    config::Config,
    frame::FramePayload,
    render,
    validate::{MessageValidator, Validation, ValidationError},
    AppState,
};
use ethers::types::Address;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

const APP_URL: &str = "https://toss.example";

fn test_config() -> Config {
    Config {
        app_url: APP_URL.to_string(),
        manifest_path: PathBuf::from("/nonexistent/coin-toss/manifest"),
        public_dir: std::env::temp_dir(),
        ..Config::default()
    }
}

fn test_app() -> Router {
    app(AppState::new(test_config()))
}

fn write_manifest(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "coin-toss-manifest-{}-{}",
        name,
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ORIGIN, "https://warpcast.com");
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(request.body(body).unwrap()).await.unwrap()
}

async fn send_raw(app: Router, method: Method, uri: &str, body: &'static str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn header_value<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn assert_png(bytes: &[u8]) {
    let img = image::load_from_memory(bytes).unwrap();
    assert_eq!((img.width(), img.height()), (1200, 630));
}

#[tokio::test]
async fn test_health() {
    let response = send(test_app(), Method::GET, "/api/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ok");
}

#[tokio::test]
async fn test_home_and_metadata() {
    let response = send(test_app(), Method::GET, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("Share this URL on Farcaster to play: https://toss.example"));

    let response = send(test_app(), Method::GET, "/api/metadata", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_value(&response, header::CONTENT_TYPE),
        "text/html; charset=utf-8"
    );
    assert_eq!(
        header_value(&response, header::CACHE_CONTROL),
        "no-store, must-revalidate"
    );
    assert_eq!(header_value(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains(r#"content="https://toss.example/api/frame""#));
}

#[tokio::test]
async fn test_images() {
    for uri in [
        "/api/image",
        "/api/frame",
        "/api/frame/image?result=1&win=true",
        "/api/frame/image?result=bogus",
    ] {
        let response = send(test_app(), Method::GET, uri, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert_eq!(header_value(&response, header::CONTENT_TYPE), "image/png");
        assert_png(&body_bytes(response).await);
    }

    let response = send(test_app(), Method::GET, "/api/frame", None).await;
    assert_eq!(
        header_value(&response, header::CACHE_CONTROL),
        "public, max-age=31536000"
    );
    let response = send(test_app(), Method::GET, "/api/frame/image?result=0", None).await;
    assert_eq!(
        header_value(&response, header::CACHE_CONTROL),
        "no-cache, no-store, must-revalidate"
    );
}

#[tokio::test]
async fn test_choice_image_result_parsing() {
    let heads = render::choice_outcome_card(CoinSide::Heads, false).render().unwrap();
    let tails = render::choice_outcome_card(CoinSide::Tails, false).render().unwrap();
    assert_ne!(heads, tails);

    for (uri, expected) in [
        ("/api/frame/image", &heads),
        ("/api/frame/image?result=", &heads),
        ("/api/frame/image?result=0&win=false", &heads),
        ("/api/frame/image?result=abc&win=false", &tails),
        ("/api/frame/image?result=1abc", &tails),
    ] {
        let response = send(test_app(), Method::GET, uri, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert_eq!(&body_bytes(response).await, expected, "{}", uri);
    }

    let response = send(test_app(), Method::GET, "/api/frame/image?result=1&win=true", None).await;
    let won = render::choice_outcome_card(CoinSide::Tails, true).render().unwrap();
    assert_eq!(body_bytes(response).await, won);
}

#[tokio::test]
async fn test_frame_post_bet() {
    let body = serde_json::json!({ "untrustedData": { "inputText": "0.5", "buttonIndex": 1 } });
    let response = send(test_app(), Method::POST, "/api/frame", Some(body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_value(&response, header::CONTENT_TYPE), "image/png");
    assert_png(&body_bytes(response).await);
}

#[tokio::test]
async fn test_frame_post_invalid_bets() {
    for input in [
        serde_json::json!({ "untrustedData": { "inputText": "abc" } }),
        serde_json::json!({ "untrustedData": { "inputText": "-1" } }),
        serde_json::json!({ "untrustedData": { "inputText": "0" } }),
        serde_json::json!({ "untrustedData": {} }),
    ] {
        let response = send(test_app(), Method::POST, "/api/frame", Some(input)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_bytes(response).await, b"Invalid bet amount");
    }
}

#[tokio::test]
async fn test_frame_post_malformed() {
    let response = send_raw(test_app(), Method::POST, "/api/frame", "{not json").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_bytes(response).await, b"Failed to process frame");

    let response = send_raw(test_app(), Method::POST, "/api/frame", "{}").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_choice_frames() {
    let response = send(test_app(), Method::GET, "/api/frame/choice", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let frame: FramePayload = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(frame.image, "https://toss.example/coin-toss-frame.png");
    let labels: Vec<_> = frame.buttons.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, ["Heads", "Tails"]);
    assert_eq!(
        frame.post_url.as_deref(),
        Some("https://toss.example/api/frame/choice")
    );

    let body = serde_json::json!({ "untrustedData": { "buttonIndex": 1 } });
    let response = send(test_app(), Method::POST, "/api/frame/choice", Some(body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let frame: FramePayload = serde_json::from_value(body_json(response).await).unwrap();
    let result = frame.result.clone().unwrap();
    let win = frame.win.unwrap();
    // Button 1 is heads
    assert_eq!(win, result == "Heads");
    let code = if result == "Heads" { 0 } else { 1 };
    assert_eq!(
        frame.image,
        format!(
            "https://toss.example/api/frame/image?result={}&win={}",
            code, win
        )
    );
    assert_eq!(frame.buttons[0].label, "Play Again");

    let response = send_raw(test_app(), Method::POST, "/api/frame/choice", "nope").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "Failed to process frame" })
    );
}

#[tokio::test]
async fn test_flip_get() {
    let response = send(test_app(), Method::GET, "/api/flip", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let frame: FramePayload = serde_json::from_value(body_json(response).await).unwrap();
    assert!(frame.image.starts_with("data:image/png;base64,"));
    assert_eq!(frame.buttons[0].label, "Flip Coin");
    assert_eq!(frame.input.unwrap().text, "Place your bet (in ETH)");
    assert!(frame.result.is_none());
}

#[tokio::test]
async fn test_flip_valid_bets() {
    for body in [
        serde_json::json!({ "betAmount": "0.1" }),
        serde_json::json!({ "betAmount": 3 }),
        serde_json::json!({ "betAmount": "2.5eth" }),
        serde_json::json!({ "untrustedData": { "inputText": "1" } }),
    ] {
        let response = send(test_app(), Method::POST, "/api/flip", Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", body);
        let json = body_json(response).await;
        let result = json["result"].as_str().unwrap();
        assert!(result == "Heads" || result == "Tails");
        assert_eq!(json["win"].as_bool().unwrap(), result == "Heads");
        assert!(json["image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
        assert_eq!(json["buttons"][0]["label"], "Play Again");
    }
}

#[tokio::test]
async fn test_flip_invalid_bets() {
    for body in [
        serde_json::json!({ "betAmount": "abc" }),
        serde_json::json!({ "betAmount": "" }),
        serde_json::json!({ "betAmount": "0" }),
        serde_json::json!({ "betAmount": "-5" }),
        serde_json::json!({ "betAmount": -5 }),
        serde_json::json!({ "betAmount": null }),
        serde_json::json!({ "betAmount": true }),
        serde_json::json!({}),
    ] {
        let response = send(test_app(), Method::POST, "/api/flip", Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Invalid bet amount" })
        );
    }
}

#[tokio::test]
async fn test_manifest_served_verbatim() {
    let contents = "{\n  \"accountAssociation\": { \"header\": \"eyJmaWQ\" },\n  \"frame\": { \"name\": \"Coin Toss\" }\n}\n";
    let path = write_manifest("verbatim", contents);
    let config = Config {
        manifest_path: path.clone(),
        ..test_config()
    };

    for uri in ["/.well-known/farcaster", "/api/farcaster-manifest"] {
        let response = send(app(AppState::new(config.clone())), Method::GET, uri, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_value(&response, header::CONTENT_TYPE), "application/json");
        assert_eq!(header_value(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
        assert_eq!(body_bytes(response).await, contents.as_bytes());
    }

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn test_manifest_missing() {
    let response = send(test_app(), Method::GET, "/.well-known/farcaster", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "Internal Server Error" })
    );
}

#[tokio::test]
async fn test_validate_message() {
    let response = send(
        test_app(),
        Method::POST,
        "/api/validate",
        Some(serde_json::json!({ "untrustedData": { "fid": 1 } })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "valid": false, "message": "Missing frame message data" })
    );

    let response = send(
        test_app(),
        Method::POST,
        "/api/validate",
        Some(serde_json::json!({ "trustedData": { "messageBytes": "0a4b0c" } })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["valid"], true);

    // Without a hub the message is not decoded
    let response = send(
        test_app(),
        Method::POST,
        "/api/validate",
        Some(serde_json::json!({ "trustedData": { "messageBytes": "abc" } })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "valid": true }));

    let response = send_raw(test_app(), Method::POST, "/api/validate", "garbage").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["valid"], false);
}

/// Accepts only one message, fails on another
struct FixedValidator;

#[async_trait::async_trait]
impl MessageValidator for FixedValidator {
    async fn validate(&self, message_bytes: &str) -> Result<Validation, ValidationError> {
        match message_bytes {
            "0a" => Ok(Validation::valid()),
            "ff" => Err(ValidationError::Network("hub down".to_string())),
            _ => Ok(Validation::invalid("Frame message signature is not valid")),
        }
    }
}

#[tokio::test]
async fn test_validate_with_custom_validator() {
    let state = AppState::new(test_config()).with_validator(Arc::new(FixedValidator));
    let validate = |bytes: &str| {
        send(
            app(state.clone()),
            Method::POST,
            "/api/validate",
            Some(serde_json::json!({ "trustedData": { "messageBytes": bytes } })),
        )
    };

    let response = validate("0a").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "valid": true }));

    let response = validate("0b").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["valid"], false);

    let response = validate("ff").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["valid"], false);
}

#[tokio::test]
async fn test_validate_preflight() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/validate")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert!(response.status().is_success());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/validate")
        .header(header::ORIGIN, "https://warpcast.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(header_value(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
    assert!(header_value(&response, header::ACCESS_CONTROL_ALLOW_METHODS).contains("POST"));
}

#[tokio::test]
async fn test_validate_report() {
    let config = Config {
        // Nothing listens here; every URL check fails fast
        app_url: "http://127.0.0.1:9".to_string(),
        ..test_config()
    };
    let response = send(app(AppState::new(config)), Method::GET, "/api/validate", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;

    assert!(report["timestamp"].as_str().unwrap().ends_with('Z'));
    let checks = report["urlValidation"].as_array().unwrap();
    assert_eq!(checks.len(), 5);
    assert!(checks.iter().all(|c| c["ok"] == false && c["error"].is_string()));
    assert_eq!(report["metadataValidation"]["hasRequiredFields"], true);
    assert_eq!(
        report["metadataValidation"]["requiredFields"]
            .as_array()
            .unwrap()
            .len(),
        4
    );
    assert_eq!(report["frameMetadata"]["fc:frame"], "vNext");
    assert_eq!(report["frameMetadata"].as_object().unwrap().len(), 6);
    assert!(report["frameMetadata"].get("fc:frame:state").is_none());
}

#[tokio::test]
async fn test_game_state_unavailable() {
    let response = send(test_app(), Method::GET, "/api/game/state", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "Contract client not configured" })
    );
}

#[tokio::test]
async fn test_game_state_from_contract() {
    let owner = Address::from_low_u64_be(0xAA);
    let player = Address::from_low_u64_be(0xB1);
    let mock = MockTossContract::new(owner);
    mock.fund(player, coin_toss_core::game::wager());

    let as_player = mock.as_player(player);
    as_player
        .approve_token(coin_toss_core::game::wager())
        .await
        .unwrap();
    as_player
        .place_bet(CoinSide::Tails)
        .await
        .unwrap();

    let state = AppState::new(test_config()).with_contract(Arc::new(mock));
    let response = send(app(state), Method::GET, "/api/game/state", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["tossNumber"], 1);
    assert_eq!(json["player1"]["side"], "tails");
    assert!(json["player2"].is_null());
    assert_eq!(json["availableSide"], "heads");
    assert_eq!(json["status"], "Waiting for Player 2 to bet on HEADS");
    assert_eq!(json["wager"], "0.1");
}

#[tokio::test]
async fn test_game_state_shows_settled_winner() {
    let mock = MockTossContract::new(Address::from_low_u64_be(0xAA));
    mock.keep_settled_rounds(true);
    for (n, side) in [(0xB1, CoinSide::Heads), (0xB2, CoinSide::Tails)] {
        let player = Address::from_low_u64_be(n);
        mock.fund(player, coin_toss_core::game::wager());
        let as_player = mock.as_player(player);
        as_player
            .approve_token(coin_toss_core::game::wager())
            .await
            .unwrap();
        as_player.place_bet(side).await.unwrap();
    }
    let (winner, _) = mock.last_winner().unwrap();

    let state = AppState::new(test_config()).with_contract(Arc::new(mock));
    let response = send(app(state), Method::GET, "/api/game/state", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["tossNumber"], 1);
    assert_eq!(json["winner"], format!("{:#x}", winner));
    assert!(json["status"].as_str().unwrap().starts_with("Winner: 0x"));
    assert!(!json["player2"].is_null());
}

#[tokio::test]
async fn test_static_fallback() {
    let name = format!("coin-toss-static-{}.txt", std::process::id());
    let path = std::env::temp_dir().join(&name);
    std::fs::write(&path, "static file").unwrap();

    let response = send(test_app(), Method::GET, &format!("/{}", name), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"static file");

    std::fs::remove_file(path).ok();
}
