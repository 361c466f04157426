use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::models::{DeleteResult, Post};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::services::posts::{self, CreatePost, ListOptions, SortBy, SortOrder, UpdatePost};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ListQuery {
    author: Option<String>,
    tags: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/posts", get(list).post(create))
        .route(
            "/api/v1/posts/{id}",
            get(get_by_id).patch(update).delete(remove),
        )
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CreatePost>,
) -> AppResult<Json<Post>> {
    let post = posts::create_post(&state.db, &user.id, body)?;
    Ok(Json(post))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Post>>> {
    let options = parse_options(query.sort_by.as_deref(), query.sort_order.as_deref())?;

    // The web client sends empty strings for filters it is not using
    let author = query.author.as_deref().filter(|s| !s.is_empty());
    let tag = query.tags.as_deref().filter(|s| !s.is_empty());

    let posts = match (author, tag) {
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "query posts by either author or tag, not both".to_string(),
            ))
        }
        (Some(author), None) => posts::list_posts_by_author(&state.db, author, options)?,
        (None, Some(tag)) => posts::list_posts_by_tag(&state.db, tag, options)?,
        (None, None) => posts::list_all_posts(&state.db, options)?,
    };
    Ok(Json(posts))
}

async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Post>> {
    let post = posts::get_post_by_id(&state.db, &id)?.ok_or(AppError::NotFound)?;
    Ok(Json(post))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<UpdatePost>,
) -> AppResult<Json<Post>> {
    let post = posts::update_post(&state.db, &user.id, &id, body)?.ok_or(AppError::NotFound)?;
    Ok(Json(post))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteResult>> {
    let result = posts::delete_post(&state.db, &user.id, &id)?;
    Ok(Json(result))
}

fn parse_options(sort_by: Option<&str>, sort_order: Option<&str>) -> AppResult<ListOptions> {
    let sort_by = match sort_by.filter(|s| !s.is_empty()) {
        None => SortBy::default(),
        Some(s) => SortBy::from_param(s).ok_or_else(|| {
            AppError::Validation("sortBy must be createdAt or updatedAt".to_string())
        })?,
    };
    let sort_order = match sort_order.filter(|s| !s.is_empty()) {
        None => SortOrder::default(),
        Some(s) => SortOrder::from_param(s).ok_or_else(|| {
            AppError::Validation("sortOrder must be ascending or descending".to_string())
        })?,
    };
    Ok(ListOptions { sort_by, sort_order })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_options_defaults_when_absent() {
        let options = parse_options(None, None).unwrap();
        assert_eq!(options.sort_by, SortBy::CreatedAt);
        assert_eq!(options.sort_order, SortOrder::Descending);
    }

    #[test]
    fn parse_options_treats_empty_strings_as_absent() {
        let options = parse_options(Some(""), Some("")).unwrap();
        assert_eq!(options.sort_by, SortBy::CreatedAt);
        assert_eq!(options.sort_order, SortOrder::Descending);
    }

    #[test]
    fn parse_options_accepts_known_values() {
        let options = parse_options(Some("updatedAt"), Some("ascending")).unwrap();
        assert_eq!(options.sort_by, SortBy::UpdatedAt);
        assert_eq!(options.sort_order, SortOrder::Ascending);
    }

    #[test]
    fn parse_options_rejects_unknown_values() {
        assert!(parse_options(Some("score"), None).is_err());
        assert!(parse_options(None, Some("sideways")).is_err());
    }
}
