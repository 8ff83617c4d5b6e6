//! Pseudo-legal move generation: geometrically reachable destinations for
//! the piece on a square, ignoring check safety. Castling and en passant
//! are layered on by the game layer, not here.

use crate::board::Board;
use crate::moves::Move;
use crate::piece::{Color, PieceType};
use crate::square::Square;

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROYAL_DIRECTIONS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];
const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

const PROMOTION_CHOICES: [PieceType; 4] = [
    PieceType::Queen,
    PieceType::Rook,
    PieceType::Bishop,
    PieceType::Knight,
];

/// Pseudo-legal moves for the piece on `from`. Empty if the square is empty.
pub fn candidate_moves(board: &Board, from: Square) -> Vec<Move> {
    let Some(piece) = board.piece_at(from) else {
        return Vec::new();
    };
    match piece.kind {
        PieceType::Rook => walk(board, from, piece.color, &ROOK_DIRECTIONS, true),
        PieceType::Bishop => walk(board, from, piece.color, &BISHOP_DIRECTIONS, true),
        PieceType::Queen => walk(board, from, piece.color, &ROYAL_DIRECTIONS, true),
        PieceType::King => walk(board, from, piece.color, &ROYAL_DIRECTIONS, false),
        PieceType::Knight => walk(board, from, piece.color, &KNIGHT_JUMPS, false),
        PieceType::Pawn => pawn_moves(board, from, piece.color),
    }
}

/// Ray walk shared by sliding and stepping pieces. A ray stops at the board
/// edge or at the first occupied square, including that square only when it
/// holds an opposing piece. `keep_going` is false for king and knight.
fn walk(
    board: &Board,
    from: Square,
    color: Color,
    directions: &[(i8, i8)],
    keep_going: bool,
) -> Vec<Move> {
    let mut moves = Vec::new();
    for &(dr, dc) in directions {
        let mut cursor = from;
        loop {
            let Some(next) = cursor.offset(dr, dc) else {
                break;
            };
            match board.piece_at(next) {
                None => moves.push(Move::new(from, next)),
                Some(other) => {
                    if other.color != color {
                        moves.push(Move::new(from, next));
                    }
                    break;
                }
            }
            if !keep_going {
                break;
            }
            cursor = next;
        }
    }
    moves
}

fn pawn_moves(board: &Board, from: Square, color: Color) -> Vec<Move> {
    let dir = color.pawn_direction();
    let mut moves = Vec::new();

    // Straight ahead needs an empty destination; the double step additionally
    // needs an unobstructed path and the home rank.
    if let Some(one) = from.offset(dir, 0) {
        if board.piece_at(one).is_none() {
            push_pawn_move(&mut moves, from, one, color);
            if from.row() == color.pawn_row() {
                if let Some(two) = one.offset(dir, 0) {
                    if board.piece_at(two).is_none() {
                        moves.push(Move::new(from, two));
                    }
                }
            }
        }
    }

    // Diagonals are captures only.
    for dc in [-1, 1] {
        if let Some(diag) = from.offset(dir, dc) {
            if matches!(board.piece_at(diag), Some(other) if other.color != color) {
                push_pawn_move(&mut moves, from, diag, color);
            }
        }
    }
    moves
}

/// A pawn arriving on the back rank is recorded once per promotion option,
/// never un-promoted.
fn push_pawn_move(moves: &mut Vec<Move>, from: Square, to: Square, color: Color) {
    if to.row() == color.promotion_row() {
        for kind in PROMOTION_CHOICES {
            moves.push(Move::promoting(from, to, kind));
        }
    } else {
        moves.push(Move::new(from, to));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Piece;

    fn sq(row: u8, col: u8) -> Square {
        Square::new(row, col)
    }

    fn targets(board: &Board, from: Square) -> Vec<Square> {
        candidate_moves(board, from).iter().map(|m| m.to).collect()
    }

    #[test]
    fn test_rook_rays_stop_at_blockers() {
        let mut board = Board::empty();
        board.place(sq(4, 4), Piece::new(Color::White, PieceType::Rook));
        board.place(sq(4, 6), Piece::new(Color::Black, PieceType::Pawn));
        board.place(sq(6, 4), Piece::new(Color::White, PieceType::Pawn));

        let t = targets(&board, sq(4, 4));
        // Captures the black pawn but goes no further.
        assert!(t.contains(&sq(4, 5)));
        assert!(t.contains(&sq(4, 6)));
        assert!(!t.contains(&sq(4, 7)));
        // Stops short of its own pawn.
        assert!(t.contains(&sq(5, 4)));
        assert!(!t.contains(&sq(6, 4)));
        // Open directions run to the edge.
        assert!(t.contains(&sq(1, 4)));
        assert!(t.contains(&sq(4, 1)));
    }

    #[test]
    fn test_bishop_moves_from_corner() {
        let mut board = Board::empty();
        board.place(sq(1, 1), Piece::new(Color::Black, PieceType::Bishop));
        let t = targets(&board, sq(1, 1));
        assert_eq!(t.len(), 7);
        assert!(t.contains(&sq(8, 8)));
    }

    #[test]
    fn test_knight_jumps_over_pieces() {
        let board = Board::starting();
        let t = targets(&board, sq(1, 2));
        assert_eq!(t.len(), 2);
        assert!(t.contains(&sq(3, 1)));
        assert!(t.contains(&sq(3, 3)));
    }

    #[test]
    fn test_king_single_steps() {
        let mut board = Board::empty();
        board.place(sq(4, 4), Piece::new(Color::White, PieceType::King));
        board.place(sq(5, 5), Piece::new(Color::Black, PieceType::Pawn));
        board.place(sq(3, 3), Piece::new(Color::White, PieceType::Pawn));
        let t = targets(&board, sq(4, 4));
        assert_eq!(t.len(), 7);
        assert!(t.contains(&sq(5, 5)));
        assert!(!t.contains(&sq(3, 3)));
        assert!(!t.contains(&sq(6, 4)));
    }

    #[test]
    fn test_pawn_double_step_only_from_home_rank() {
        let board = Board::starting();
        let t = targets(&board, sq(2, 5));
        assert!(t.contains(&sq(3, 5)));
        assert!(t.contains(&sq(4, 5)));

        let mut advanced = Board::empty();
        advanced.place(sq(3, 5), Piece::new(Color::White, PieceType::Pawn));
        let t = targets(&advanced, sq(3, 5));
        assert_eq!(t, vec![sq(4, 5)]);
    }

    #[test]
    fn test_pawn_double_step_blocked_by_path() {
        let mut board = Board::empty();
        board.place(sq(2, 5), Piece::new(Color::White, PieceType::Pawn));
        board.place(sq(3, 5), Piece::new(Color::Black, PieceType::Knight));
        assert!(candidate_moves(&board, sq(2, 5)).is_empty());

        let mut board = Board::empty();
        board.place(sq(2, 5), Piece::new(Color::White, PieceType::Pawn));
        board.place(sq(4, 5), Piece::new(Color::Black, PieceType::Knight));
        let t = targets(&board, sq(2, 5));
        assert_eq!(t, vec![sq(3, 5)]);
    }

    #[test]
    fn test_pawn_diagonal_capture_only() {
        let mut board = Board::empty();
        board.place(sq(4, 4), Piece::new(Color::White, PieceType::Pawn));
        board.place(sq(5, 3), Piece::new(Color::Black, PieceType::Pawn));
        board.place(sq(5, 5), Piece::new(Color::White, PieceType::Pawn));
        let t = targets(&board, sq(4, 4));
        assert!(t.contains(&sq(5, 3)));
        assert!(t.contains(&sq(5, 4)));
        assert!(!t.contains(&sq(5, 5)));
    }

    #[test]
    fn test_pawn_promotion_expands_four_ways() {
        let mut board = Board::empty();
        board.place(sq(7, 1), Piece::new(Color::White, PieceType::Pawn));
        let moves = candidate_moves(&board, sq(7, 1));
        assert_eq!(moves.len(), 4);
        assert!(moves.iter().all(|m| m.to == sq(8, 1)));
        assert!(moves.iter().all(|m| m.promotion.is_some()));
        let kinds: Vec<_> = moves.iter().filter_map(|m| m.promotion).collect();
        assert!(kinds.contains(&PieceType::Queen));
        assert!(kinds.contains(&PieceType::Knight));
    }

    #[test]
    fn test_black_pawn_moves_down() {
        let board = Board::starting();
        let t = targets(&board, sq(7, 4));
        assert!(t.contains(&sq(6, 4)));
        assert!(t.contains(&sq(5, 4)));
    }
}
