pub mod board;
pub mod game;
pub mod history;
pub mod moves;
pub mod piece;
pub mod rules;
pub mod square;

pub use board::Board;
pub use game::{CastlingRights, ChessGame, MoveError};
pub use history::{MadeMove, MoveHistory, MoveTag, MovedPiece};
pub use moves::Move;
pub use piece::{Color, Piece, PieceType};
pub use square::Square;
