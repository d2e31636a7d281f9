use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::db::models::{PostCache, PostReblog};
use crate::db::queries::{self, PostKey};
use crate::error::{AppError, AppResult};
use crate::extractors::ApiQuery;
use crate::filters::{order_clause, Predicate, POST_CACHE};
use crate::pagination::Page;
use crate::state::AppState;
use crate::votes::{parse_votes, Vote};

/// Repeated query parameter carrying the tags for `filter_by_tags`.
pub const EXACT_TAG_PARAM: &str = "[]exact";

/// Distinct tags accepted by one `filter_by_tags` request. Each tag is one
/// arm of a compound SELECT, which SQLite caps at 500.
pub const MAX_TAGS: usize = 32;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/post_cache/", get(list_post_cache))
        .route("/api/v1/post_cache/filter_by_tags/", get(filter_by_tags))
        .route("/api/v1/post_cache/{key}/", get(get_post_cache))
        .route(
            "/api/v1/post_cache/{key}/{permlink}/",
            get(get_post_cache_by_permlink),
        )
        .route("/api/v1/post_cache/{key}/{permlink}/votes/", get(votes))
        .route("/api/v1/post_cache/{key}/{permlink}/reblogs/", get(reblogs))
}

async fn list_post_cache(
    State(state): State<AppState>,
    query: ApiQuery,
) -> AppResult<Json<Page<PostCache>>> {
    super::list_resource(&state, &POST_CACHE, state.post_cache_paginator(), &query)
}

/// `/post_cache/{id}/`, or `/post_cache/{author}/?permlink=...`.
async fn get_post_cache(
    State(state): State<AppState>,
    Path(key): Path<String>,
    query: ApiQuery,
) -> AppResult<Json<PostCache>> {
    let key = PostKey::resolve(&key, query.params.get("permlink")).ok_or(AppError::NotFound)?;
    Ok(Json(lookup(&state, &key)?))
}

async fn get_post_cache_by_permlink(
    State(state): State<AppState>,
    Path((author, permlink)): Path<(String, String)>,
) -> AppResult<Json<PostCache>> {
    Ok(Json(lookup(&state, &PostKey::Permlink { author, permlink })?))
}

async fn votes(
    State(state): State<AppState>,
    Path((author, permlink)): Path<(String, String)>,
) -> AppResult<Json<Vec<Vote>>> {
    let post = lookup(&state, &PostKey::Permlink { author, permlink })?;
    let votes = parse_votes(post.votes.as_deref().unwrap_or_default())?;
    Ok(Json(votes))
}

async fn reblogs(
    State(state): State<AppState>,
    Path((author, permlink)): Path<(String, String)>,
) -> AppResult<Json<Vec<PostReblog>>> {
    let post = lookup(&state, &PostKey::Permlink { author, permlink })?;
    let conn = state.db.get()?;
    Ok(Json(queries::post_reblogs(&conn, post.post_id)?))
}

/// Posts tagged with every `[]exact` value, newest first. No tags at all
/// is a 404 rather than an empty page.
async fn filter_by_tags(
    State(state): State<AppState>,
    query: ApiQuery,
) -> AppResult<Json<Page<PostCache>>> {
    let mut tags: Vec<&str> = Vec::new();
    for tag in query.params.get_all(EXACT_TAG_PARAM) {
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    if tags.is_empty() {
        return Err(AppError::NotFound);
    }
    if tags.len() > MAX_TAGS {
        return Err(AppError::BadRequest(format!(
            "At most {} distinct tags may be given.",
            MAX_TAGS
        )));
    }

    let mut predicate = Predicate::new();
    queries::push_tag_intersection(&mut predicate, &tags);
    let order_by = order_clause(&["-created_at"], POST_CACHE.pk);
    let window = state.post_cache_paginator().window(&query.params);

    let conn = state.db.get()?;
    let (results, count) =
        queries::list_page::<PostCache>(&conn, &predicate, &order_by, window)?;
    Ok(Json(Page::new(results, count, window, &query)))
}

fn lookup(state: &AppState, key: &PostKey) -> AppResult<PostCache> {
    let conn = state.db.get()?;
    queries::find_post_cache(&conn, key)?.ok_or(AppError::NotFound)
}
