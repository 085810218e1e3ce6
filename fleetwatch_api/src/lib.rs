pub mod error;
pub mod fleet;
pub mod state;
pub mod ws;

use std::sync::Arc;

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    fleet::{get_truck_schedules_handler, post_fleet_handler, post_frame_handler},
    state::AppState,
};

pub const DEFAULT_RELAY_ADDR: &str = "127.0.0.1:8080";

pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/fleet", post(post_fleet_handler))
        .route("/fleet/ws", get(ws::handler))
        .route("/frames/{name}", post(post_frame_handler))
        .route("/schedules/truck", get(get_truck_schedules_handler))
        .layer(ServiceBuilder::new().layer(cors_layer))
        .with_state(state)
}
