use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::models::UserInfo;
use crate::error::{AppError, AppResult};
use crate::services::users;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Credentials {
    username: String,
    password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/user/signup", post(signup))
        .route("/api/v1/user/login", post(login))
        .route("/api/v1/user/{id}", get(user_info))
}

async fn signup(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> AppResult<(StatusCode, Json<UserInfo>)> {
    let user = users::create_user(&state.db, &body.username, &body.password)?;
    Ok((
        StatusCode::CREATED,
        Json(UserInfo {
            username: user.username,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> AppResult<Json<serde_json::Value>> {
    let token = users::login(&state.db, &state.tokens, &body.username, &body.password)?;
    Ok(Json(serde_json::json!({ "token": token })))
}

async fn user_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserInfo>> {
    let info = users::get_user_info_by_id(&state.db, &id)?.ok_or(AppError::NotFound)?;
    Ok(Json(info))
}
