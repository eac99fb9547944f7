use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::registry::actor_client::RegistryClient;

mod health;
mod metrics;
mod room;

pub fn create_router(config: &Config) -> Router<Arc<RegistryClient>> {
    Router::new()
        .route("/health", get(health::get))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/room", post(room::create))
        .route("/room/:code/snapshot", get(room::snapshot))
        .route(
            "/room/:code/player/:name/ws",
            get(room::connect_player_to_websocket),
        )
        .route("/room/:code/watch/ws", get(room::watch_room_websocket))
        .layer(if config.allow_cors {
            log::info!("CorsLayer Permissive");
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
        })
}
