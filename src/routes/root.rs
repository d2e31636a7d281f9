use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Map, Value};

use crate::extractors::ApiQuery;
use crate::state::AppState;

const RESOURCES: &[&str] = &["accounts", "blocks", "posts", "post_cache", "state"];

pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/", get(api_root))
}

/// Collection URL of every resource, keyed by name.
async fn api_root(query: ApiQuery) -> Json<Map<String, Value>> {
    let base = query.url.trim_end_matches('/');
    let links = RESOURCES
        .iter()
        .map(|name| (name.to_string(), Value::String(format!("{}/{}/", base, name))))
        .collect();
    Json(links)
}
