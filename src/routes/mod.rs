pub mod accounts;
pub mod blocks;
pub mod hive_state;
pub mod post_cache;
pub mod posts;
pub mod root;

use axum::http::Method;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::models::Entity;
use crate::db::queries;
use crate::error::AppResult;
use crate::extractors::ApiQuery;
use crate::filters::{self, ResourceTable, TableError};
use crate::pagination::{Page, Paginator};
use crate::state::AppState;

/// Builds the full API. The filter tables are validated here, so a bad
/// table fails startup instead of a request.
pub fn app(state: AppState) -> Result<Router, TableError> {
    filters::validate_all()?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Ok(Router::new()
        .merge(root::router())
        .merge(accounts::router())
        .merge(blocks::router())
        .merge(posts::router())
        .merge(post_cache::router())
        .merge(hive_state::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

/// Filtered, ordered, paginated listing of `E` under `table`.
fn list_resource<E: Entity>(
    state: &AppState,
    table: &ResourceTable,
    paginator: Paginator,
    query: &ApiQuery,
) -> AppResult<Json<Page<E>>> {
    let predicate = table.predicate(&query.params)?;
    let order_by = table.order_by(&query.params)?;
    let window = paginator.window(&query.params);

    let conn = state.db.get()?;
    let (results, count) = queries::list_page::<E>(&conn, &predicate, &order_by, window)?;
    Ok(Json(Page::new(results, count, window, query)))
}
