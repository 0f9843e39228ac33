use axum::{Json, http::StatusCode, response::IntoResponse};
use ledger::LedgerError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod accounts;
mod budgets;
mod categories;
mod server;
mod transactions;
mod users;

pub mod types {
    pub mod user {
        pub use api_types::user::{RegisterUser, UserCreated, UserView};
    }

    pub mod account {
        pub use api_types::account::{AccountNew, AccountUpdate, AccountView, AccountsResponse};
    }

    pub mod category {
        pub use api_types::category::{
            CategoriesResponse, CategoryNew, CategoryUpdate, CategoryView,
        };
    }

    pub mod budget {
        pub use api_types::budget::{BudgetSet, BudgetView, BudgetsResponse};
    }

    pub mod transaction {
        pub use api_types::transaction::{
            TransactionNew, TransactionUpdate, TransactionView, TransactionsResponse,
        };
    }
}

pub enum ServerError {
    Ledger(LedgerError),
    Generic(String),
    Internal(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_ledger_error(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::Conflict(_) => StatusCode::CONFLICT,
        LedgerError::InvalidArgument(_) | LedgerError::BudgetExceeded(_) => {
            StatusCode::BAD_REQUEST
        }
        LedgerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_ledger_error(err: LedgerError) -> String {
    match err {
        LedgerError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Ledger(err) => {
                (status_for_ledger_error(&err), message_for_ledger_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Internal(err) => {
                tracing::error!("internal error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<LedgerError> for ServerError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}
