//! Sprint Poker server binary.
//!
//! Loads configuration, wires the estimation authority to the broadcast
//! sink, and serves the HTTP + WebSocket API.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sprint_poker::adapters::events::BroadcastSink;
use sprint_poker::adapters::http::{room_routes, RoomHandlers};
use sprint_poker::adapters::websocket::{websocket_router, WebSocketState};
use sprint_poker::application::EstimationAuthority;
use sprint_poker::config::AppConfig;
use sprint_poker::ports::NotificationSink;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let sink = Arc::new(BroadcastSink::new(config.server.ws_channel_capacity));
    let authority = Arc::new(EstimationAuthority::new(
        sink.clone() as Arc<dyn NotificationSink>
    ));

    let handlers = RoomHandlers::new(authority.clone(), config.server.public_base_url.clone());
    let ws_state = WebSocketState::new(authority, sink);

    let api = room_routes(handlers).merge(websocket_router().with_state(ws_state));

    let app = Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(&config));

    let addr = config.server.socket_addr();
    tracing::info!(%addr, environment = ?config.server.environment, "sprint-poker listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_cors(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
