use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::db::models::HiveState;
use crate::db::queries;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/state/", get(current_state))
}

/// The head block the indexer has processed.
async fn current_state(State(state): State<AppState>) -> AppResult<Json<HiveState>> {
    let conn = state.db.get()?;
    let head = queries::last_state(&conn)?.ok_or(AppError::NotFound)?;
    Ok(Json(head))
}
