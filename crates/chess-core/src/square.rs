use std::fmt;

use serde::{Deserialize, Serialize};

/// A single square on the 8x8 board. Rank 1 is white's back rank,
/// file 1 is the a-file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSquare", into = "RawSquare")]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    /// Panics if either coordinate is outside 1..=8. Use `try_new` for
    /// untrusted input; the wire deserializer already goes through it.
    pub fn new(row: u8, col: u8) -> Square {
        assert!(
            (1..=8).contains(&row) && (1..=8).contains(&col),
            "square ({row},{col}) off the board"
        );
        Square { row, col }
    }

    pub fn try_new(row: u8, col: u8) -> Option<Square> {
        if (1..=8).contains(&row) && (1..=8).contains(&col) {
            Some(Square { row, col })
        } else {
            None
        }
    }

    /// Rank, 1..=8.
    pub fn row(&self) -> u8 {
        self.row
    }

    /// File, 1..=8.
    pub fn col(&self) -> u8 {
        self.col
    }

    /// The square offset by (rows, cols), or None if that walks off the board.
    pub fn offset(&self, rows: i8, cols: i8) -> Option<Square> {
        let row = self.row as i8 + rows;
        let col = self.col as i8 + cols;
        if (1..=8).contains(&row) && (1..=8).contains(&col) {
            Some(Square {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }
}

impl fmt::Display for Square {
    /// Algebraic coordinates, e.g. "e4".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.col - 1) as char;
        write!(f, "{}{}", file, self.row)
    }
}

/// Wire shape — lets serde reject off-board squares at parse time.
#[derive(Serialize, Deserialize)]
struct RawSquare {
    row: u8,
    col: u8,
}

impl TryFrom<RawSquare> for Square {
    type Error = String;

    fn try_from(raw: RawSquare) -> Result<Square, String> {
        Square::try_new(raw.row, raw.col)
            .ok_or_else(|| format!("square ({},{}) off the board", raw.row, raw.col))
    }
}

impl From<Square> for RawSquare {
    fn from(sq: Square) -> RawSquare {
        RawSquare {
            row: sq.row,
            col: sq.col,
        }
    }
}
