use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::db::models::Post;
use crate::db::queries::{self, PostKey};
use crate::error::{AppError, AppResult};
use crate::extractors::ApiQuery;
use crate::filters::POSTS;
use crate::pagination::Page;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/posts/", get(list_posts))
        .route("/api/v1/posts/{key}/", get(get_post))
        .route("/api/v1/posts/{key}/{permlink}/", get(get_post_by_permlink))
}

async fn list_posts(
    State(state): State<AppState>,
    query: ApiQuery,
) -> AppResult<Json<Page<Post>>> {
    super::list_resource(&state, &POSTS, state.paginator(), &query)
}

/// `/posts/{id}/`, or `/posts/{author}/?permlink=...`.
async fn get_post(
    State(state): State<AppState>,
    Path(key): Path<String>,
    query: ApiQuery,
) -> AppResult<Json<Post>> {
    let key = PostKey::resolve(&key, query.params.get("permlink")).ok_or(AppError::NotFound)?;
    lookup(&state, &key)
}

async fn get_post_by_permlink(
    State(state): State<AppState>,
    Path((author, permlink)): Path<(String, String)>,
) -> AppResult<Json<Post>> {
    lookup(&state, &PostKey::Permlink { author, permlink })
}

fn lookup(state: &AppState, key: &PostKey) -> AppResult<Json<Post>> {
    let conn = state.db.get()?;
    let post = queries::find_post(&conn, key)?.ok_or(AppError::NotFound)?;
    Ok(Json(post))
}
