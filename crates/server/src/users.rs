//! User registration and identity endpoints.
//!
//! Passwords are hashed here, at the HTTP boundary; the ledger only ever
//! sees the bcrypt hash.

use api_types::user::{RegisterUser, UserCreated, UserView};
use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::{ServerError, server::ServerState};
use ledger::users;

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterUser>,
) -> Result<(StatusCode, Json<UserCreated>), ServerError> {
    if payload.name.trim().chars().count() < 3 {
        return Err(ServerError::Generic(
            "name must be at least 3 characters long".to_string(),
        ));
    }
    if payload.password.chars().count() < 6 {
        return Err(ServerError::Generic(
            "password must be at least 6 characters long".to_string(),
        ));
    }

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|err| ServerError::Internal(format!("failed to hash password: {err}")))?;

    let user = state
        .engine
        .register_user(&payload.name, &payload.email, &password_hash)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserCreated {
            user: UserView {
                id: user.id,
                name: user.name,
                email: user.email,
            },
        }),
    ))
}

pub async fn me(Extension(user): Extension<users::Model>) -> Json<UserView> {
    Json(UserView {
        id: user.id,
        name: user.name,
        email: user.email,
    })
}
