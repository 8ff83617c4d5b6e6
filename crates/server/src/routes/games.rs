//! Thin HTTP CRUD over the game store: create, list, claim a seat.
//! All game logic lives behind the session layer; these handlers only
//! resolve the token and move records in and out of storage.

use std::sync::Arc;

use axum::{extract::Path, http::HeaderMap, Extension, Json};
use chess_core::Color;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::session::SessionHub;
use crate::storage::{GameId, GameRecord};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub game_name: String,
}

#[derive(Deserialize)]
pub struct SeatRequest {
    pub color: Color,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub game_id: GameId,
    pub game_name: String,
    pub white_username: Option<String>,
    pub black_username: Option<String>,
    pub is_over: bool,
}

impl From<&GameRecord> for GameSummary {
    fn from(record: &GameRecord) -> GameSummary {
        GameSummary {
            game_id: record.id,
            game_name: record.name.clone(),
            white_username: record.white.clone(),
            black_username: record.black.clone(),
            is_over: record.is_over,
        }
    }
}

pub async fn create_game(
    Extension(hub): Extension<Arc<SessionHub>>,
    headers: HeaderMap,
    Json(body): Json<CreateGameRequest>,
) -> Result<Json<GameSummary>, AppError> {
    require_identity(&hub, &headers)?;
    if body.game_name.trim().is_empty() {
        return Err(AppError::BadRequest("game name must not be empty".into()));
    }
    let record = hub.games().create_game(body.game_name.trim());
    tracing::info!("created game {} ({})", record.id, record.name);
    Ok(Json(GameSummary::from(&record)))
}

pub async fn list_games(
    Extension(hub): Extension<Arc<SessionHub>>,
    headers: HeaderMap,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    require_identity(&hub, &headers)?;
    let games = hub.games().list_games();
    Ok(Json(games.iter().map(GameSummary::from).collect()))
}

/// Claim a color in a game. Re-claiming your own seat is a no-op; taking
/// an occupied seat is a conflict.
pub async fn claim_seat(
    Extension(hub): Extension<Arc<SessionHub>>,
    headers: HeaderMap,
    Path(game_id): Path<GameId>,
    Json(body): Json<SeatRequest>,
) -> Result<Json<Value>, AppError> {
    let identity = require_identity(&hub, &headers)?;

    let lock = hub.registry().game_lock(game_id);
    let _guard = lock.lock().await;

    let mut record = hub
        .games()
        .get_game(game_id)
        .ok_or_else(|| AppError::NotFound(format!("no game with id {game_id}")))?;

    let seat = match body.color {
        Color::White => &mut record.white,
        Color::Black => &mut record.black,
    };
    match seat {
        Some(existing) if *existing != identity => {
            return Err(AppError::BadRequest("that seat is already taken".into()));
        }
        _ => *seat = Some(identity.clone()),
    }
    hub.games().update_game(game_id, record);
    tracing::info!("{identity} claimed {:?} in game {game_id}", body.color);
    Ok(Json(json!({ "gameId": game_id })))
}

/// Token from the Authorization header, with or without a Bearer prefix,
/// resolved through the auth collaborator.
fn require_identity(hub: &SessionHub, headers: &HeaderMap) -> Result<String, AppError> {
    let header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .unwrap_or(header);
    hub.auth()
        .resolve_identity(token)
        .ok_or(AppError::Unauthorized)
}
