use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::piece::{Color, Piece, PieceType};
use crate::square::Square;

/// Sparse 8x8 board: squares not in the map are empty. Cloning the board
/// yields a fully independent snapshot, which is what the rule engine uses
/// for hypothetical-move simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    #[serde(with = "square_map")]
    squares: HashMap<Square, Piece>,
}

impl Board {
    pub fn empty() -> Board {
        Board {
            squares: HashMap::new(),
        }
    }

    /// The standard starting position.
    pub fn starting() -> Board {
        use PieceType::*;

        let mut board = Board::empty();
        let back_rank = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        for (i, &kind) in back_rank.iter().enumerate() {
            let col = i as u8 + 1;
            board.place(Square::new(1, col), Piece::new(Color::White, kind));
            board.place(Square::new(8, col), Piece::new(Color::Black, kind));
            board.place(Square::new(2, col), Piece::new(Color::White, Pawn));
            board.place(Square::new(7, col), Piece::new(Color::Black, Pawn));
        }
        board
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares.get(&square).copied()
    }

    pub fn place(&mut self, square: Square, piece: Piece) {
        self.squares.insert(square, piece);
    }

    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        self.squares.remove(&square)
    }

    /// All occupied squares, in no particular order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.squares.iter().map(|(&sq, &piece)| (sq, piece))
    }

    /// Legal play keeps exactly one king per color on the board; a missing
    /// king means the caller installed a degenerate position.
    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.color == color && p.kind == PieceType::King)
            .map(|(sq, _)| sq)
    }
}

/// JSON object keys must be strings, so the square map serializes as a list
/// of (square, piece) pairs.
mod square_map {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(map: &HashMap<Square, Piece>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let pairs: Vec<(Square, Piece)> = map.iter().map(|(&sq, &p)| (sq, p)).collect();
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<HashMap<Square, Piece>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs = Vec::<(Square, Piece)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}
