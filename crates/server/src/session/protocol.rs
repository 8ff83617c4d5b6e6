//! Wire shapes for the game-session socket: internally tagged JSON enums,
//! commands inbound and server messages outbound.

use chess_core::{Color, Move, Square};
use serde::{Deserialize, Serialize};

use crate::storage::GameId;

/// Client → server commands. Every command carries the auth token and the
/// game id; MOVE adds the move and HIGHLIGHT the square to mark.
#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "commandType",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum UserGameCommand {
    Connect {
        auth_token: String,
        game_id: GameId,
    },
    #[serde(rename = "MOVE")]
    MakeMove {
        auth_token: String,
        game_id: GameId,
        #[serde(rename = "move")]
        mv: Move,
    },
    Resign {
        auth_token: String,
        game_id: GameId,
    },
    Leave {
        auth_token: String,
        game_id: GameId,
    },
    Redraw {
        auth_token: String,
        game_id: GameId,
    },
    Highlight {
        auth_token: String,
        game_id: GameId,
        square: Square,
    },
}

/// Server → client messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "serverMessageType",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    Notification {
        message: String,
    },
    Error {
        message: String,
    },
    LoadGame {
        game_id: GameId,
        viewer_color: Color,
        board_view: String,
    },
}
