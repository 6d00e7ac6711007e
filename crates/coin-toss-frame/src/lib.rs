//! Coin Toss Frame Service
//!
//! Farcaster Frame endpoints for the coin toss game: frame metadata, PNG
//! cards, flip actions, manifest serving, message validation and a read-only
//! view of the on-chain round.

pub mod config;
pub mod error;
pub mod frame;
pub mod handlers;
pub mod render;
pub mod state;
pub mod validate;

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use handlers::*;
pub use state::AppState;

/// Build the service router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let public_dir = ServeDir::new(&state.config.public_dir);

    Router::new()
        // Pages
        .route("/", get(home))
        .route("/api/metadata", get(metadata))
        // Images
        .route("/api/image", get(welcome_image))
        .route("/api/frame", get(frame_image).post(frame_action))
        .route("/api/frame/image", get(choice_image))
        // JSON frames
        .route("/api/frame/choice", get(choice_frame).post(choice_action))
        .route("/api/flip", get(flip_frame).post(flip))
        // Manifest
        .route("/.well-known/farcaster", get(manifest))
        .route("/api/farcaster-manifest", get(manifest))
        // Validation
        // OPTIONS preflights are answered by the CORS layer
        .route("/api/validate", get(validate_report).post(validate_message))
        // Game
        .route("/api/game/state", get(game_state))
        // Health
        .route("/api/health", get(health))
        // Static files
        .fallback_service(public_dir)
        .layer(cors)
        .with_state(state)
}
