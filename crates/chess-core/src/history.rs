use serde::{Deserialize, Serialize};

use crate::moves::Move;
use crate::piece::{Color, PieceType};

/// What moved, as recorded in the log. Castling gets its own synthetic tags
/// rather than reading as a bare king move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovedPiece {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
    KingsideCastle,
    QueensideCastle,
}

impl From<PieceType> for MovedPiece {
    fn from(kind: PieceType) -> MovedPiece {
        match kind {
            PieceType::King => MovedPiece::King,
            PieceType::Queen => MovedPiece::Queen,
            PieceType::Rook => MovedPiece::Rook,
            PieceType::Bishop => MovedPiece::Bishop,
            PieceType::Knight => MovedPiece::Knight,
            PieceType::Pawn => MovedPiece::Pawn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveTag {
    Check,
    Capture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MadeMove {
    pub color: Color,
    pub piece: MovedPiece,
    pub mv: Move,
    pub tag: Option<MoveTag>,
}

/// Append-only log of executed moves. The engine consults only the tail,
/// for en passant eligibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveHistory {
    moves: Vec<MadeMove>,
}

impl MoveHistory {
    pub fn record(&mut self, made: MadeMove) {
        self.moves.push(made);
    }

    pub fn last(&self) -> Option<&MadeMove> {
        self.moves.last()
    }

    pub fn get(&self, index: usize) -> Option<&MadeMove> {
        self.moves.get(index)
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::Square;

    #[test]
    fn test_append_and_last() {
        let mut history = MoveHistory::default();
        assert!(history.last().is_none());

        let first = MadeMove {
            color: Color::White,
            piece: MovedPiece::Pawn,
            mv: Move::new(Square::new(2, 5), Square::new(4, 5)),
            tag: None,
        };
        let second = MadeMove {
            color: Color::Black,
            piece: MovedPiece::Knight,
            mv: Move::new(Square::new(8, 2), Square::new(6, 3)),
            tag: Some(MoveTag::Capture),
        };
        history.record(first);
        history.record(second);

        assert_eq!(history.len(), 2);
        assert_eq!(history.last(), Some(&second));
        assert_eq!(history.get(0), Some(&first));
    }
}
