use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::models::{DeleteResult, Image};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::services::images::{self, CreateImage, UpdateImage};
use crate::state::AppState;

/// Images arrive base64-encoded inside the JSON body; anything above
/// this is rejected with a 400 rather than stored.
const MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListQuery {
    uploader: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/images", get(list).post(create))
        .route(
            "/api/v1/images/{id}",
            get(get_by_id).patch(update).delete(remove),
        )
        // Axum's default request cap is far below the image limit; the
        // handler enforces the real cap so oversized payloads get a 400.
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES * 2))
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CreateImage>,
) -> AppResult<Json<Image>> {
    if body.data.len() > MAX_IMAGE_BYTES {
        return Err(AppError::PayloadTooLarge);
    }
    let image = images::create_image(&state.db, &user.id, body)?;
    Ok(Json(image))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Image>>> {
    let uploader = query
        .uploader
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            AppError::Validation("uploader query parameter is required".to_string())
        })?;
    let images = images::list_images_by_uploader(&state.db, uploader)?;
    Ok(Json(images))
}

async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Image>> {
    let image = images::get_image_by_id(&state.db, &id)?.ok_or(AppError::NotFound)?;
    Ok(Json(image))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateImage>,
) -> AppResult<Json<Image>> {
    let image = images::update_image(&state.db, &user.id, &id, body)?.ok_or(AppError::NotFound)?;
    Ok(Json(image))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteResult>> {
    let result = images::delete_image(&state.db, &user.id, &id)?;
    Ok(Json(result))
}
