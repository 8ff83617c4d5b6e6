//! Token issuance stub. Real credential checking belongs to the external
//! auth collaborator; this endpoint just mints an opaque token for a
//! username so clients can reach the game routes and the socket.

use std::sync::Arc;

use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::storage::MemoryAuthStore;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub username: String,
    pub auth_token: String,
}

pub async fn register(
    Extension(auth): Extension<Arc<MemoryAuthStore>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    let username = body.username.trim();
    if username.is_empty() {
        return Err(AppError::BadRequest("username must not be empty".into()));
    }
    let auth_token = auth.issue(username);
    Ok(Json(RegisterResponse {
        username: username.to_string(),
        auth_token,
    }))
}
