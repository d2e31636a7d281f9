use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use rusqlite::types::Value;

use crate::db::models::Block;
use crate::db::queries;
use crate::error::{AppError, AppResult};
use crate::extractors::ApiQuery;
use crate::filters::{Predicate, BLOCKS};
use crate::pagination::Page;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/blocks/", get(list_blocks))
        .route("/api/v1/blocks/{num}/", get(get_block))
}

async fn list_blocks(
    State(state): State<AppState>,
    query: ApiQuery,
) -> AppResult<Json<Page<Block>>> {
    super::list_resource(&state, &BLOCKS, state.paginator(), &query)
}

async fn get_block(
    State(state): State<AppState>,
    Path(num): Path<String>,
) -> AppResult<Json<Block>> {
    // A segment that is not a block number cannot name a block.
    let num: i64 = num.parse().map_err(|_| AppError::NotFound)?;

    let mut predicate = Predicate::new();
    predicate.push("t.num = ?", [Value::Integer(num)]);

    let conn = state.db.get()?;
    let block = queries::find_one::<Block>(&conn, &predicate)?.ok_or(AppError::NotFound)?;
    Ok(Json(block))
}
