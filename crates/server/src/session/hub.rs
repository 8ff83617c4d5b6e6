//! The per-command state machine behind the game-session socket. Each
//! handler validates auth/game/turn constraints, mutates the game record
//! through the rules engine, and drives the registry's broadcast. Failures
//! go back to the sender only and never touch shared state.

use std::sync::Arc;

use chess_core::{Color, Move, Square};
use tokio::sync::mpsc;

use crate::error::SessionError;
use crate::render;
use crate::session::protocol::{ServerMessage, UserGameCommand};
use crate::session::registry::{ConnId, Connection, ConnectionRegistry};
use crate::storage::{AuthStore, GameId, GameRecord, GameStore};

pub struct SessionHub {
    registry: ConnectionRegistry,
    games: Arc<dyn GameStore>,
    auth: Arc<dyn AuthStore>,
}

impl SessionHub {
    pub fn new(games: Arc<dyn GameStore>, auth: Arc<dyn AuthStore>) -> Self {
        SessionHub {
            registry: ConnectionRegistry::new(),
            games,
            auth,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn games(&self) -> &Arc<dyn GameStore> {
        &self.games
    }

    pub fn auth(&self) -> &Arc<dyn AuthStore> {
        &self.auth
    }

    /// Dispatch one inbound command. `tx` is the sender half of the
    /// connection's outbound channel; user-facing failures are delivered
    /// there and nowhere else.
    pub async fn handle(
        &self,
        conn_id: ConnId,
        tx: &mpsc::UnboundedSender<ServerMessage>,
        command: UserGameCommand,
    ) {
        let result = match command {
            UserGameCommand::Connect {
                auth_token,
                game_id,
            } => self.connect(conn_id, tx, &auth_token, game_id).await,
            UserGameCommand::MakeMove {
                auth_token,
                game_id,
                mv,
            } => self.make_move(conn_id, &auth_token, game_id, mv).await,
            UserGameCommand::Resign {
                auth_token,
                game_id,
            } => self.resign(&auth_token, game_id).await,
            UserGameCommand::Leave {
                auth_token,
                game_id,
            } => self.leave(conn_id, &auth_token, game_id).await,
            UserGameCommand::Redraw {
                auth_token,
                game_id,
            } => self.send_view(tx, &auth_token, game_id, None),
            UserGameCommand::Highlight {
                auth_token,
                game_id,
                square,
            } => self.send_view(tx, &auth_token, game_id, Some(square)),
        };

        if let Err(err) = result {
            if err.is_user_facing() {
                let _ = tx.send(ServerMessage::Error {
                    message: err.to_string(),
                });
            }
        }
    }

    /// Socket gone without a LEAVE. Same cleanup, no auth required: the
    /// registry entry already proves who was connected.
    pub async fn disconnect(&self, conn_id: ConnId) {
        if let Some(connection) = self.registry.remove(conn_id) {
            self.depart(&connection.identity, connection.game_id).await;
        }
    }

    async fn connect(
        &self,
        conn_id: ConnId,
        tx: &mpsc::UnboundedSender<ServerMessage>,
        token: &str,
        game_id: GameId,
    ) -> Result<(), SessionError> {
        let (identity, record) = self.authenticate(token, game_id)?;

        self.registry.insert(
            conn_id,
            Connection {
                identity: identity.clone(),
                game_id,
                tx: tx.clone(),
            },
        );

        let seat = match record.seat_of(&identity) {
            Some(Color::White) => "white",
            Some(Color::Black) => "black",
            None => "an observer",
        };
        self.registry.broadcast(
            game_id,
            Some(conn_id),
            &ServerMessage::Notification {
                message: format!("{identity} has joined the game as {seat}"),
            },
        );

        let viewer = record.viewer_color(&identity);
        tx.send(load_game(&record, viewer, &[]))
            .map_err(|_| SessionError::Transport)?;
        tracing::info!("{identity} connected to game {game_id} as {seat}");
        Ok(())
    }

    async fn make_move(
        &self,
        conn_id: ConnId,
        token: &str,
        game_id: GameId,
        mv: Move,
    ) -> Result<(), SessionError> {
        let (identity, _) = self.authenticate(token, game_id)?;

        // Hold the game's mutation slot across the read-modify-write.
        let lock = self.registry.game_lock(game_id);
        let _guard = lock.lock().await;

        let mut record = self
            .games
            .get_game(game_id)
            .ok_or(SessionError::Unauthorized)?;
        let seat = record
            .seat_of(&identity)
            .ok_or(SessionError::NotAParticipant)?;
        if record.is_over {
            return Err(SessionError::GameOver);
        }
        if record.game.turn() != seat {
            return Err(SessionError::InvalidMove);
        }

        record
            .game
            .apply_move(mv)
            .map_err(|_| SessionError::InvalidMove)?;
        if record.game.is_over() {
            record.is_over = true;
        }
        self.games.update_game(game_id, record.clone());

        // Every viewer gets the new board from their own side.
        self.registry.broadcast_with(game_id, None, |connection| {
            let viewer = record.viewer_color(&connection.identity);
            load_game(&record, viewer, &[])
        });
        self.registry.broadcast(
            game_id,
            Some(conn_id),
            &ServerMessage::Notification {
                message: format!("{identity} moved {} to {}", mv.from, mv.to),
            },
        );

        let opponent = record.game.turn();
        let status = if record.game.is_in_checkmate(opponent) {
            Some(format!("{} is in checkmate", self.player_label(&record, opponent)))
        } else if record.game.is_in_stalemate(opponent) {
            Some("the game is a stalemate".to_string())
        } else if record.game.is_in_check(opponent) {
            Some(format!("{} is in check", self.player_label(&record, opponent)))
        } else {
            None
        };
        if let Some(message) = status {
            self.registry
                .broadcast(game_id, None, &ServerMessage::Notification { message });
        }

        tracing::info!("{identity} moved {} to {} in game {game_id}", mv.from, mv.to);
        Ok(())
    }

    async fn resign(&self, token: &str, game_id: GameId) -> Result<(), SessionError> {
        let (identity, _) = self.authenticate(token, game_id)?;

        let lock = self.registry.game_lock(game_id);
        let _guard = lock.lock().await;

        let mut record = self
            .games
            .get_game(game_id)
            .ok_or(SessionError::Unauthorized)?;
        if !record.is_player(&identity) {
            return Err(SessionError::NotAParticipant);
        }
        if record.is_over {
            return Err(SessionError::GameOver);
        }

        record.is_over = true;
        self.games.update_game(game_id, record);
        self.registry.broadcast(
            game_id,
            None,
            &ServerMessage::Notification {
                message: format!("{identity} has resigned"),
            },
        );
        tracing::info!("{identity} resigned game {game_id}");
        Ok(())
    }

    async fn leave(
        &self,
        conn_id: ConnId,
        token: &str,
        game_id: GameId,
    ) -> Result<(), SessionError> {
        let (identity, _) = self.authenticate(token, game_id)?;
        self.registry.remove(conn_id);
        self.depart(&identity, game_id).await;
        Ok(())
    }

    /// Shared tail of LEAVE and disconnect: vacate the seat if one was
    /// held, persist, and tell whoever is still around.
    async fn depart(&self, identity: &str, game_id: GameId) {
        let lock = self.registry.game_lock(game_id);
        let _guard = lock.lock().await;

        if let Some(mut record) = self.games.get_game(game_id) {
            match record.seat_of(identity) {
                Some(Color::White) => record.white = None,
                Some(Color::Black) => record.black = None,
                None => {}
            }
            self.games.update_game(game_id, record);
        }

        self.registry.broadcast(
            game_id,
            None,
            &ServerMessage::Notification {
                message: format!("{identity} has left the game"),
            },
        );
        self.registry.prune_game_lock(game_id);
        tracing::info!("{identity} left game {game_id}");
    }

    /// REDRAW and HIGHLIGHT: side-effect free, sender only.
    fn send_view(
        &self,
        tx: &mpsc::UnboundedSender<ServerMessage>,
        token: &str,
        game_id: GameId,
        highlight: Option<Square>,
    ) -> Result<(), SessionError> {
        let (identity, record) = self.authenticate(token, game_id)?;
        let viewer = record.viewer_color(&identity);
        let highlights: Vec<Square> = match highlight {
            Some(square) => record
                .game
                .valid_moves(square)
                .iter()
                .map(|m| m.to)
                .collect(),
            None => Vec::new(),
        };
        tx.send(load_game(&record, viewer, &highlights))
            .map_err(|_| SessionError::Transport)
    }

    fn authenticate(
        &self,
        token: &str,
        game_id: GameId,
    ) -> Result<(String, GameRecord), SessionError> {
        let identity = self
            .auth
            .resolve_identity(token)
            .ok_or(SessionError::Unauthorized)?;
        let record = self
            .games
            .get_game(game_id)
            .ok_or(SessionError::Unauthorized)?;
        Ok((identity, record))
    }

    fn player_label(&self, record: &GameRecord, color: Color) -> String {
        let seated = match color {
            Color::White => record.white.as_deref(),
            Color::Black => record.black.as_deref(),
        };
        match (seated, color) {
            (Some(name), _) => name.to_string(),
            (None, Color::White) => "white".to_string(),
            (None, Color::Black) => "black".to_string(),
        }
    }
}

fn load_game(record: &GameRecord, viewer: Color, highlights: &[Square]) -> ServerMessage {
    ServerMessage::LoadGame {
        game_id: record.id,
        viewer_color: viewer,
        board_view: render::board_view(record.game.board(), viewer, highlights),
    }
}
