//! Transactions API endpoints

use api_types::EntryKind;
use api_types::transaction::{
    TransactionNew, TransactionUpdate, TransactionView, TransactionsResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{ServerError, server::ServerState};
use ledger::{
    RecordTransactionCmd, Transaction, TransactionKind, UpdateTransactionCmd, users,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u64>,
}

fn map_kind(kind: TransactionKind) -> EntryKind {
    match kind {
        TransactionKind::Income => EntryKind::Income,
        TransactionKind::Expense => EntryKind::Expense,
    }
}

fn map_api_kind(kind: EntryKind) -> TransactionKind {
    match kind {
        EntryKind::Income => TransactionKind::Income,
        EntryKind::Expense => TransactionKind::Expense,
    }
}

fn view(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        account_id: tx.account_id,
        category_id: tx.category_id,
        kind: map_kind(tx.kind),
        amount_cents: tx.amount.cents(),
        date: tx.date.format("%Y-%m-%d").to_string(),
        description: tx.description,
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, ServerError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ServerError::Generic(format!("invalid date: {raw:?}")))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let amount = payload.amount.parse()?;
    let date = parse_date(&payload.date)?;

    let mut cmd = RecordTransactionCmd::new(
        user.id,
        payload.account_id,
        map_api_kind(payload.kind),
        amount,
        date,
    );
    if let Some(category_id) = payload.category_id {
        cmd = cmd.category_id(category_id);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let tx = state.engine.record_transaction(cmd).await?;
    Ok((StatusCode::CREATED, Json(view(tx))))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(params): Query<ListParams>,
) -> Result<Json<TransactionsResponse>, ServerError> {
    let transactions = state.engine.transactions(user.id, params.limit).await?;
    Ok(Json(TransactionsResponse {
        transactions: transactions.into_iter().map(view).collect(),
    }))
}

pub async fn get_by_id(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(user.id, id).await?;
    Ok(Json(view(tx)))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let mut cmd = UpdateTransactionCmd::default();
    if let Some(raw) = payload.amount.as_deref() {
        cmd = cmd.amount(raw.parse()?);
    }
    if let Some(raw) = payload.date.as_deref() {
        cmd = cmd.date(parse_date(raw)?);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let tx = state.engine.update_transaction(user.id, id, cmd).await?;
    Ok(Json(view(tx)))
}

pub async fn remove(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction(user.id, id).await?;
    Ok(StatusCode::OK)
}
