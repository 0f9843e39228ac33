//! Budget endpoints: set/replace a category cap and list budgets.

use api_types::budget::{BudgetSet, BudgetView, BudgetsResponse};
use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::{ServerError, server::ServerState};
use ledger::{Budget, SetBudgetCmd, users};

fn view(budget: Budget) -> BudgetView {
    BudgetView {
        id: budget.id,
        category_id: budget.category_id,
        budget_amount_cents: budget.budget_amount.cents(),
        total_amount_cents: budget.total_amount.cents(),
    }
}

pub async fn set(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetSet>,
) -> Result<(StatusCode, Json<BudgetView>), ServerError> {
    let budget_amount = payload.budget_amount.parse()?;
    let (budget, created) = state
        .engine
        .set_budget(SetBudgetCmd {
            user_id: user.id,
            category_id: payload.category_id,
            budget_amount,
        })
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(view(budget))))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<BudgetsResponse>, ServerError> {
    let budgets = state.engine.budgets(user.id).await?;
    Ok(Json(BudgetsResponse {
        budgets: budgets.into_iter().map(view).collect(),
    }))
}
