use serde::{Deserialize, Serialize};

use crate::piece::PieceType;
use crate::square::Square;

/// A move from one square to another, with an optional promotion choice.
/// A move carrying a promotion never equals the same relocation without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceType>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Move {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    pub fn promoting(from: Square, to: Square, kind: PieceType) -> Move {
        Move {
            from,
            to,
            promotion: Some(kind),
        }
    }
}
