//! Account CRUD endpoints.

use api_types::account::{AccountNew, AccountUpdate, AccountView, AccountsResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{ServerError, server::ServerState};
use ledger::{Account, Money, UpdateAccountCmd, users};

fn view(account: Account) -> AccountView {
    AccountView {
        id: account.id,
        account_name: account.name,
        account_balance_cents: account.balance.map(Money::cents),
    }
}

fn parse_balance(raw: Option<&str>) -> Result<Option<Money>, ServerError> {
    raw.map(str::parse::<Money>)
        .transpose()
        .map_err(ServerError::from)
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let balance = parse_balance(payload.account_balance.as_deref())?;
    let account = state
        .engine
        .new_account(user.id, &payload.account_name, balance)
        .await?;

    Ok((StatusCode::CREATED, Json(view(account))))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<AccountsResponse>, ServerError> {
    let accounts = state.engine.accounts(user.id).await?;
    Ok(Json(AccountsResponse {
        accounts: accounts.into_iter().map(view).collect(),
    }))
}

pub async fn get_by_id(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.account(user.id, id).await?;
    Ok(Json(view(account)))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<AccountUpdate>,
) -> Result<Json<AccountView>, ServerError> {
    let cmd = UpdateAccountCmd {
        account_name: payload.account_name,
        account_balance: parse_balance(payload.account_balance.as_deref())?,
    };
    let account = state.engine.update_account(user.id, id, cmd).await?;
    Ok(Json(view(account)))
}

pub async fn remove(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_account(user.id, id).await?;
    Ok(StatusCode::OK)
}
