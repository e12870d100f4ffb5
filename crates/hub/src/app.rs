use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::routes::{self, AppState};
use crate::stream;

const CORS_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/stops", get(routes::list_stops))
        .route("/buses", get(routes::list_buses).post(routes::register_bus))
        .route("/buses/positions", post(routes::submit_position))
        .route("/buses/positions/stream", get(stream::position_stream))
        .route("/buses/{bus_id}/schedule", get(routes::bus_schedule))
        .route("/buses/{bus_id}/positions", get(routes::bus_positions))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_LENGTH])
        .max_age(CORS_MAX_AGE);
    if origins.iter().any(|origin| origin == "*") {
        return base.allow_origin(AllowOrigin::any());
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("hub: ignoring invalid cors origin {origin:?}");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
}
