pub mod images;
pub mod posts;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Assemble the full application router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(greeting))
        .merge(users::router())
        .merge(posts::router())
        .merge(images::router())
}

async fn greeting() -> &'static str {
    "Hello from sulat"
}
