//! Category CRUD endpoints. Deletion is a soft delete.

use api_types::EntryKind;
use api_types::category::{CategoriesResponse, CategoryNew, CategoryUpdate, CategoryView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{ServerError, server::ServerState};
use ledger::{Category, CategoryKind, UpdateCategoryCmd, users};

fn map_kind(kind: CategoryKind) -> EntryKind {
    match kind {
        CategoryKind::Income => EntryKind::Income,
        CategoryKind::Expense => EntryKind::Expense,
    }
}

fn map_api_kind(kind: EntryKind) -> CategoryKind {
    match kind {
        EntryKind::Income => CategoryKind::Income,
        EntryKind::Expense => CategoryKind::Expense,
    }
}

fn view(category: Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        kind: map_kind(category.kind),
        sort_order: category.sort_order,
        description: category.description,
    }
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .new_category(
            user.id,
            &payload.name,
            map_api_kind(payload.kind),
            payload.sort_order.unwrap_or(0),
            payload.description.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(view(category))))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<CategoriesResponse>, ServerError> {
    let categories = state.engine.categories(user.id).await?;
    Ok(Json(CategoriesResponse {
        categories: categories.into_iter().map(view).collect(),
    }))
}

pub async fn get_by_id(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state.engine.category(user.id, id).await?;
    Ok(Json(view(category)))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    let cmd = UpdateCategoryCmd {
        name: payload.name,
        sort_order: payload.sort_order,
        description: payload.description,
    };
    let category = state.engine.update_category(user.id, id, cmd).await?;
    Ok(Json(view(category)))
}

pub async fn remove(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(user.id, id).await?;
    Ok(StatusCode::OK)
}
