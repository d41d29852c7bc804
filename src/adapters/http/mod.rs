pub mod routes;
pub mod state;

use axum::{routing::{get, post}, Router};
use crate::adapters::http::state::HttpState;

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/video-feed", get(routes::video_feed))
        .route("/control/:action", post(routes::control_feed))
        .route("/identified-items", get(routes::identified_items))
        .route("/api/status", get(routes::feed_status))
        .route("/api/config", get(routes::get_config))
        .with_state(state)
}
