pub mod auth;
pub mod games;

pub use auth::{AuthStore, MemoryAuthStore};
pub use games::{GameId, GameRecord, GameStore, MemoryGameStore};
