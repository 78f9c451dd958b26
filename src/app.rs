use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/items", post(handlers::form_add_item))
        .route("/track/:id", post(handlers::form_track))
        .route("/api/items", get(handlers::list_items).post(handlers::create_item))
        .route("/api/items/:id/track", post(handlers::track))
        .route("/api/today", get(handlers::get_today))
        .with_state(state)
}
