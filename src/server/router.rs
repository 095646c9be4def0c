use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::server::{
    controller::{reward::ad_reward, system::health},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/rewards/ad", post(ad_reward))
        .layer(TraceLayer::new_for_http())
}
