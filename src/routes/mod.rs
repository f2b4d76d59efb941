pub mod auth;
pub mod itineraries;
pub mod trips;

use axum::{middleware, routing::get, Json, Router};
use tower_http::trace::TraceLayer;

use crate::{auth::auth_middleware, models::ResponseDto, state::AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth::router())
        .nest("/api/trips", trips::router().merge(itineraries::router()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<ResponseDto<&'static str>> {
    Json(ResponseDto::ok("healthy", "ok"))
}
