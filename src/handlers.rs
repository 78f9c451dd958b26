use crate::errors::AppError;
use crate::models::{CreateItemRequest, Item, TodayResponse, TrackResponse};
use crate::state::AppState;
use crate::ui::{render_index, DEFAULT_COLOR};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Redirect},
    Form, Json,
};
use chrono::{DateTime, Local};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let now = Local::now();
    let store = state.store.lock().await;
    let counts = store.today_counts(&now);
    Html(render_index(&date_string(&now), &counts))
}

pub async fn list_items(State(state): State<AppState>) -> Json<Vec<Item>> {
    let store = state.store.lock().await;
    Json(store.items().to_vec())
}

pub async fn get_today(State(state): State<AppState>) -> Json<TodayResponse> {
    let now = Local::now();
    let store = state.store.lock().await;
    Json(TodayResponse {
        date: date_string(&now),
        items: store.today_counts(&now),
    })
}

pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    let item = apply_add_item(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn form_add_item(
    State(state): State<AppState>,
    Form(payload): Form<CreateItemRequest>,
) -> Result<Redirect, AppError> {
    apply_add_item(&state, payload).await?;
    Ok(Redirect::to("/"))
}

pub async fn track(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TrackResponse>, AppError> {
    let response = apply_track(&state, &id).await?;
    Ok(Json(response))
}

pub async fn form_track(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    apply_track(&state, &id).await?;
    Ok(Redirect::to("/"))
}

async fn apply_add_item(state: &AppState, payload: CreateItemRequest) -> Result<Item, AppError> {
    let color = payload
        .color
        .filter(|color| !color.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_COLOR.to_string());

    let mut store = state.store.lock().await;
    store
        .add_item(&payload.name, &color)?
        .ok_or_else(|| AppError::bad_request("name must not be empty"))
}

async fn apply_track(state: &AppState, item_id: &str) -> Result<TrackResponse, AppError> {
    let now = Local::now();
    let mut store = state.store.lock().await;
    store.add_log_at(item_id, now.timestamp_millis())?;

    Ok(TrackResponse {
        item_id: item_id.to_string(),
        date: date_string(&now),
        count: store.count_today(item_id, &now),
    })
}

fn date_string(now: &DateTime<Local>) -> String {
    now.date_naive().to_string()
}
