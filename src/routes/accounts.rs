use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::db::models::{Account, AccountReblog, FollowState};
use crate::db::queries::{self, FollowSide};
use crate::error::{AppError, AppResult};
use crate::extractors::ApiQuery;
use crate::filters::ACCOUNTS;
use crate::pagination::Page;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/accounts/", get(list_accounts))
        .route("/api/v1/accounts/{name}/", get(get_account))
        .route("/api/v1/accounts/{name}/followers/", get(followers))
        .route("/api/v1/accounts/{name}/following/", get(following))
        .route("/api/v1/accounts/{name}/muters/", get(muters))
        .route("/api/v1/accounts/{name}/muting/", get(muting))
        .route("/api/v1/accounts/{name}/reblogs/", get(reblogs))
}

async fn list_accounts(
    State(state): State<AppState>,
    query: ApiQuery,
) -> AppResult<Json<Page<Account>>> {
    super::list_resource(&state, &ACCOUNTS, state.paginator(), &query)
}

async fn get_account(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Account>> {
    let conn = state.db.get()?;
    let account = queries::account_by_name(&conn, &name)?.ok_or(AppError::NotFound)?;
    Ok(Json(account))
}

async fn followers(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    relation(&state, &name, FollowSide::Incoming, FollowState::Active)
}

async fn following(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    relation(&state, &name, FollowSide::Outgoing, FollowState::Active)
}

async fn muters(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    relation(&state, &name, FollowSide::Incoming, FollowState::Muted)
}

async fn muting(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    relation(&state, &name, FollowSide::Outgoing, FollowState::Muted)
}

fn relation(
    state: &AppState,
    name: &str,
    side: FollowSide,
    follow_state: FollowState,
) -> AppResult<Json<Vec<String>>> {
    let conn = state.db.get()?;
    let account = queries::account_by_name(&conn, name)?.ok_or(AppError::NotFound)?;
    let names = queries::follow_names(&conn, account.id, side, follow_state)?;
    Ok(Json(names))
}

async fn reblogs(
    State(state): State<AppState>,
    Path(name): Path<String>,
    query: ApiQuery,
) -> AppResult<Json<Page<AccountReblog>>> {
    let window = state.paginator().window(&query.params);
    let conn = state.db.get()?;
    let account = queries::account_by_name(&conn, &name)?.ok_or(AppError::NotFound)?;
    let (results, count) = queries::account_reblogs(&conn, &account.name, window)?;
    Ok(Json(Page::new(results, count, window, &query)))
}
