//! Game persistence at its interface. The backend here is an in-memory
//! map; the session layer only ever talks to the `GameStore` trait.

use std::collections::HashMap;
use std::sync::Mutex;

use chess_core::{ChessGame, Color};
use serde::{Deserialize, Serialize};

pub type GameId = i64;

/// The persisted aggregate for one game: seating, name, the embedded
/// rules-engine state, and the finished flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: GameId,
    pub white: Option<String>,
    pub black: Option<String>,
    pub name: String,
    pub game: ChessGame,
    pub is_over: bool,
}

impl GameRecord {
    /// The color this identity is seated as, if any.
    pub fn seat_of(&self, identity: &str) -> Option<Color> {
        if self.white.as_deref() == Some(identity) {
            Some(Color::White)
        } else if self.black.as_deref() == Some(identity) {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn is_player(&self, identity: &str) -> bool {
        self.seat_of(identity).is_some()
    }

    /// Observers see the board from white's side.
    pub fn viewer_color(&self, identity: &str) -> Color {
        self.seat_of(identity).unwrap_or(Color::White)
    }
}

pub trait GameStore: Send + Sync {
    fn create_game(&self, name: &str) -> GameRecord;
    fn get_game(&self, id: GameId) -> Option<GameRecord>;
    fn list_games(&self) -> Vec<GameRecord>;
    fn update_game(&self, id: GameId, record: GameRecord);
    fn clear(&self);
}

#[derive(Default)]
pub struct MemoryGameStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: GameId,
    games: HashMap<GameId, GameRecord>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryGameStore {
    fn create_game(&self, name: &str) -> GameRecord {
        let mut inner = self.inner.lock().expect("game store lock poisoned");
        inner.next_id += 1;
        let record = GameRecord {
            id: inner.next_id,
            white: None,
            black: None,
            name: name.to_string(),
            game: ChessGame::new(),
            is_over: false,
        };
        inner.games.insert(record.id, record.clone());
        record
    }

    fn get_game(&self, id: GameId) -> Option<GameRecord> {
        let inner = self.inner.lock().expect("game store lock poisoned");
        inner.games.get(&id).cloned()
    }

    fn list_games(&self) -> Vec<GameRecord> {
        let inner = self.inner.lock().expect("game store lock poisoned");
        let mut games: Vec<GameRecord> = inner.games.values().cloned().collect();
        games.sort_by_key(|g| g.id);
        games
    }

    fn update_game(&self, id: GameId, record: GameRecord) {
        let mut inner = self.inner.lock().expect("game store lock poisoned");
        inner.games.insert(id, record);
    }

    fn clear(&self) {
        let mut inner = self.inner.lock().expect("game store lock poisoned");
        inner.games.clear();
    }
}
