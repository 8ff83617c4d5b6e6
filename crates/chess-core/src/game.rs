//! The rule engine: legality filtering on top of pseudo-legal candidates,
//! check/checkmate/stalemate queries, and move application with the castle
//! and en passant side effects.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::history::{MadeMove, MoveHistory, MoveTag, MovedPiece};
use crate::moves::Move;
use crate::piece::{Color, Piece, PieceType};
use crate::rules;
use crate::square::Square;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("invalid move")]
    InvalidMove,
}

/// Piece-moved flags backing castling eligibility. Reset only when a fresh
/// board is installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_king_moved: bool,
    pub white_a_rook_moved: bool,
    pub white_h_rook_moved: bool,
    pub black_king_moved: bool,
    pub black_a_rook_moved: bool,
    pub black_h_rook_moved: bool,
}

impl CastlingRights {
    fn king_moved(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_king_moved,
            Color::Black => self.black_king_moved,
        }
    }

    fn rook_moved(&self, color: Color, col: u8) -> bool {
        match (color, col) {
            (Color::White, 1) => self.white_a_rook_moved,
            (Color::White, _) => self.white_h_rook_moved,
            (Color::Black, 1) => self.black_a_rook_moved,
            (Color::Black, _) => self.black_h_rook_moved,
        }
    }

    fn mark_king_moved(&mut self, color: Color) {
        match color {
            Color::White => self.white_king_moved = true,
            Color::Black => self.black_king_moved = true,
        }
    }

    fn mark_rook_moved(&mut self, color: Color, col: u8) {
        match (color, col) {
            (Color::White, 1) => self.white_a_rook_moved = true,
            (Color::White, _) => self.white_h_rook_moved = true,
            (Color::Black, 1) => self.black_a_rook_moved = true,
            (Color::Black, _) => self.black_h_rook_moved = true,
        }
    }

    fn reset(&mut self) {
        *self = CastlingRights::default();
    }
}

/// One game of chess: the authoritative board, side to move, castling
/// flags, and the move log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChessGame {
    board: Board,
    turn: Color,
    rights: CastlingRights,
    history: MoveHistory,
}

impl Default for ChessGame {
    fn default() -> Self {
        ChessGame::new()
    }
}

impl ChessGame {
    pub fn new() -> ChessGame {
        ChessGame {
            board: Board::starting(),
            turn: Color::White,
            rights: CastlingRights::default(),
            history: MoveHistory::default(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn set_turn(&mut self, color: Color) {
        self.turn = color;
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    /// Install a fresh board. Moved-piece flags and the move log describe
    /// the old board, so both are reset.
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
        self.rights.reset();
        self.history.clear();
    }

    /// Truly legal moves for the piece on `from`: pseudo-legal candidates
    /// minus any that leave the mover's own king in check, plus castling
    /// (kings) and en passant (pawns).
    pub fn valid_moves(&self, from: Square) -> Vec<Move> {
        let Some(piece) = self.board.piece_at(from) else {
            return Vec::new();
        };
        let mut moves: Vec<Move> = rules::candidate_moves(&self.board, from)
            .into_iter()
            .filter(|&mv| self.is_safe_after(mv, piece.color))
            .collect();
        if piece.kind == PieceType::King {
            self.castle_options(from, piece.color, &mut moves);
        }
        if piece.kind == PieceType::Pawn {
            if let Some(mv) = self.en_passant_option(from, piece.color) {
                moves.push(mv);
            }
        }
        moves
    }

    /// Whether `color` is in check on the live board.
    pub fn is_in_check(&self, color: Color) -> bool {
        Self::in_check_on(color, &self.board)
    }

    /// Checkmate: in check with no legal move anywhere.
    pub fn is_in_checkmate(&self, color: Color) -> bool {
        self.is_in_check(color) && !self.has_any_move(color)
    }

    /// Stalemate: not in check, but no legal move anywhere.
    pub fn is_in_stalemate(&self, color: Color) -> bool {
        !self.is_in_check(color) && !self.has_any_move(color)
    }

    /// True once the side to move has been mated or stalemated.
    pub fn is_over(&self) -> bool {
        !self.has_any_move(self.turn)
    }

    /// Validates and executes a move: relocation (or promotion), the rook
    /// shift on a castle, the passed-pawn removal on en passant, history
    /// append, moved-flag updates, and the turn flip.
    pub fn apply_move(&mut self, mv: Move) -> Result<(), MoveError> {
        let piece = self.board.piece_at(mv.from).ok_or(MoveError::InvalidMove)?;
        if piece.color != self.turn {
            return Err(MoveError::InvalidMove);
        }
        if !self.valid_moves(mv.from).contains(&mv) {
            return Err(MoveError::InvalidMove);
        }

        let capture = self.board.piece_at(mv.to).is_some();
        let castle = piece.kind == PieceType::King
            && (mv.from.col() as i8 - mv.to.col() as i8).abs() == 2;
        let en_passant = piece.kind == PieceType::Pawn && mv.from.col() != mv.to.col() && !capture;

        let placed = match mv.promotion {
            Some(kind) => Piece::new(piece.color, kind),
            None => piece,
        };
        self.board.remove(mv.from);
        self.board.place(mv.to, placed);

        if castle {
            let row = mv.from.row();
            let (rook_from, rook_to) = if mv.to.col() > mv.from.col() {
                (Square::new(row, 8), Square::new(row, 6))
            } else {
                (Square::new(row, 1), Square::new(row, 4))
            };
            if let Some(rook) = self.board.remove(rook_from) {
                self.board.place(rook_to, rook);
            }
        }
        if en_passant {
            // The passed pawn sits beside the origin, not on the landing square.
            self.board.remove(Square::new(mv.from.row(), mv.to.col()));
        }

        match piece.kind {
            PieceType::King => self.rights.mark_king_moved(piece.color),
            PieceType::Rook
                if mv.from.row() == piece.color.home_row()
                    && (mv.from.col() == 1 || mv.from.col() == 8) =>
            {
                self.rights.mark_rook_moved(piece.color, mv.from.col());
            }
            _ => {}
        }

        let moved = if castle {
            if mv.to.col() > mv.from.col() {
                MovedPiece::KingsideCastle
            } else {
                MovedPiece::QueensideCastle
            }
        } else {
            MovedPiece::from(piece.kind)
        };
        let tag = if Self::in_check_on(piece.color.opposite(), &self.board) {
            Some(MoveTag::Check)
        } else if capture || en_passant {
            Some(MoveTag::Capture)
        } else {
            None
        };
        self.history.record(MadeMove {
            color: piece.color,
            piece: moved,
            mv,
            tag,
        });

        self.turn = self.turn.opposite();
        Ok(())
    }

    /// Check detection on an arbitrary board. Works from pseudo-legal
    /// opposing moves, never from `valid_moves`, so the legality filter can
    /// call it without recursing.
    fn in_check_on(color: Color, board: &Board) -> bool {
        let Some(king) = board.find_king(color) else {
            return false;
        };
        for (sq, piece) in board.pieces() {
            if piece.color == color {
                continue;
            }
            if rules::candidate_moves(board, sq)
                .iter()
                .any(|mv| mv.to == king)
            {
                return true;
            }
        }
        false
    }

    /// Simulate `mv` on a throwaway board and test for self-check.
    fn is_safe_after(&self, mv: Move, color: Color) -> bool {
        let mut probe = self.board.clone();
        relocate(&mut probe, mv.from, mv.to);
        !Self::in_check_on(color, &probe)
    }

    fn has_any_move(&self, color: Color) -> bool {
        let occupied: Vec<Square> = self
            .board
            .pieces()
            .filter(|(_, p)| p.color == color)
            .map(|(sq, _)| sq)
            .collect();
        occupied.into_iter().any(|sq| !self.valid_moves(sq).is_empty())
    }

    /// Castling options for a king on its home square: both piece unmoved,
    /// no piece between king and rook, king not currently in check, and the
    /// king neither crosses nor lands on an attacked square.
    fn castle_options(&self, from: Square, color: Color, moves: &mut Vec<Move>) {
        if from != Square::new(color.home_row(), 5) {
            return;
        }
        if self.rights.king_moved(color) {
            return;
        }
        if Self::in_check_on(color, &self.board) {
            return;
        }
        self.try_castle(color, from, 8, moves);
        self.try_castle(color, from, 1, moves);
    }

    fn try_castle(&self, color: Color, king: Square, rook_col: u8, moves: &mut Vec<Move>) {
        if self.rights.rook_moved(color, rook_col) {
            return;
        }
        let row = king.row();
        let rook = self.board.piece_at(Square::new(row, rook_col));
        if !matches!(rook, Some(p) if p.kind == PieceType::Rook && p.color == color) {
            return;
        }

        let between: &[u8] = if rook_col == 8 { &[6, 7] } else { &[2, 3, 4] };
        if between
            .iter()
            .any(|&col| self.board.piece_at(Square::new(row, col)).is_some())
        {
            return;
        }

        // The crossed square and the landing square, in king walking order.
        let path: [u8; 2] = if rook_col == 8 { [6, 7] } else { [4, 3] };
        for &col in &path {
            let mut probe = self.board.clone();
            relocate(&mut probe, king, Square::new(row, col));
            if Self::in_check_on(color, &probe) {
                return;
            }
        }

        let to_col = if rook_col == 8 { 7 } else { 3 };
        moves.push(Move::new(king, Square::new(row, to_col)));
    }

    /// En passant, synthesized from the move log: available only when the
    /// immediately preceding move was an enemy pawn double-step landing on
    /// an adjacent file of the same rank as this pawn.
    fn en_passant_option(&self, from: Square, color: Color) -> Option<Move> {
        let last = self.history.last()?;
        if last.piece != MovedPiece::Pawn || last.color == color {
            return None;
        }
        let prev = last.mv;
        if (prev.from.row() as i8 - prev.to.row() as i8).abs() != 2 {
            return None;
        }
        if prev.to.row() != from.row() {
            return None;
        }
        if (prev.to.col() as i8 - from.col() as i8).abs() != 1 {
            return None;
        }

        let target = from.offset(color.pawn_direction(), 0)?;
        let target = Square::new(target.row(), prev.to.col());
        let capture = Move::new(from, target);

        // The passed pawn comes off the clone before the self-check probe.
        let mut probe = self.board.clone();
        relocate(&mut probe, from, target);
        probe.remove(prev.to);
        if Self::in_check_on(color, &probe) {
            return None;
        }
        Some(capture)
    }
}

fn relocate(board: &mut Board, from: Square, to: Square) {
    if let Some(piece) = board.remove(from) {
        board.place(to, piece);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(row: u8, col: u8) -> Square {
        Square::new(row, col)
    }

    fn mv(from: Square, to: Square) -> Move {
        Move::new(from, to)
    }

    fn targets(game: &ChessGame, from: Square) -> Vec<Square> {
        game.valid_moves(from).iter().map(|m| m.to).collect()
    }

    /// Kings-plus-extras board builder for constructed positions.
    fn position(pieces: &[(u8, u8, Color, PieceType)]) -> Board {
        let mut board = Board::empty();
        for &(row, col, color, kind) in pieces {
            board.place(sq(row, col), Piece::new(color, kind));
        }
        board
    }

    #[test]
    fn test_opening_pawn_moves_are_legal() {
        // Fresh game: 1. e4 e5 both play as legal moves.
        let mut game = ChessGame::new();
        assert!(game.apply_move(mv(sq(2, 5), sq(4, 5))).is_ok());
        assert_eq!(game.turn(), Color::Black);
        assert!(game.apply_move(mv(sq(7, 5), sq(5, 5))).is_ok());
        assert_eq!(game.turn(), Color::White);
        assert!(game.board().piece_at(sq(4, 5)).is_some());
        assert!(game.board().piece_at(sq(2, 5)).is_none());
    }

    #[test]
    fn test_king_cannot_step_into_pawn_attack() {
        // A just-advanced black pawn on d3 covers e2, so the white king
        // may not step there.
        let mut game = ChessGame::new();
        game.set_board(position(&[
            (1, 5, Color::White, PieceType::King),
            (8, 5, Color::Black, PieceType::King),
            (4, 4, Color::Black, PieceType::Pawn),
        ]));
        game.set_turn(Color::Black);
        assert!(game.apply_move(mv(sq(4, 4), sq(3, 4))).is_ok());

        let king_targets = targets(&game, sq(1, 5));
        assert!(!king_targets.contains(&sq(2, 5)), "e2 is attacked by the d3 pawn");
        assert!(king_targets.contains(&sq(1, 4)));
    }

    #[test]
    fn test_valid_moves_never_leave_mover_in_check() {
        // Every legal reply in a position where white is in check resolves it.
        let mut game = ChessGame::new();
        game.set_board(position(&[
            (1, 5, Color::White, PieceType::King),
            (3, 1, Color::White, PieceType::Rook),
            (8, 5, Color::Black, PieceType::King),
            (5, 5, Color::Black, PieceType::Rook),
        ]));
        assert!(game.is_in_check(Color::White));

        for from in [sq(1, 5), sq(3, 1)] {
            for legal in game.valid_moves(from) {
                let mut probe = game.clone();
                probe.apply_move(legal).unwrap();
                assert!(
                    !probe.is_in_check(Color::White),
                    "{legal:?} left white in check"
                );
            }
        }
        // The rook's only legal move is the e3 block.
        assert_eq!(targets(&game, sq(3, 1)), vec![sq(3, 5)]);
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        let mut game = ChessGame::new();
        game.set_board(position(&[
            (1, 5, Color::White, PieceType::King),
            (3, 5, Color::White, PieceType::Knight),
            (8, 5, Color::Black, PieceType::Rook),
            (8, 1, Color::Black, PieceType::King),
        ]));
        // The knight shields the king from the e-file rook and may not move.
        assert!(game.valid_moves(sq(3, 5)).is_empty());
    }

    #[test]
    fn test_kingside_castle() {
        // Unmoved king and h-rook, f1/g1 empty, path unattacked.
        let mut game = ChessGame::new();
        let mut board = Board::starting();
        board.remove(sq(1, 6));
        board.remove(sq(1, 7));
        game.set_board(board);

        let king_moves = game.valid_moves(sq(1, 5));
        let castle = mv(sq(1, 5), sq(1, 7));
        assert!(king_moves.contains(&castle));

        game.apply_move(castle).unwrap();
        assert_eq!(
            game.board().piece_at(sq(1, 7)),
            Some(Piece::new(Color::White, PieceType::King))
        );
        assert_eq!(
            game.board().piece_at(sq(1, 6)),
            Some(Piece::new(Color::White, PieceType::Rook))
        );
        assert!(game.board().piece_at(sq(1, 8)).is_none());
        assert!(game.board().piece_at(sq(1, 5)).is_none());
        assert_eq!(game.history().last().unwrap().piece, MovedPiece::KingsideCastle);
    }

    #[test]
    fn test_queenside_castle() {
        let mut game = ChessGame::new();
        let mut board = Board::starting();
        board.remove(sq(1, 2));
        board.remove(sq(1, 3));
        board.remove(sq(1, 4));
        game.set_board(board);

        let castle = mv(sq(1, 5), sq(1, 3));
        assert!(game.valid_moves(sq(1, 5)).contains(&castle));
        game.apply_move(castle).unwrap();
        assert_eq!(
            game.board().piece_at(sq(1, 4)),
            Some(Piece::new(Color::White, PieceType::Rook))
        );
        assert!(game.board().piece_at(sq(1, 1)).is_none());
        assert_eq!(
            game.history().last().unwrap().piece,
            MovedPiece::QueensideCastle
        );
    }

    #[test]
    fn test_castle_refused_through_attacked_square() {
        let mut game = ChessGame::new();
        game.set_board(position(&[
            (1, 5, Color::White, PieceType::King),
            (1, 8, Color::White, PieceType::Rook),
            (8, 6, Color::Black, PieceType::Rook),
            (8, 1, Color::Black, PieceType::King),
        ]));
        // f1 is covered by the f8 rook; the king may not cross it.
        assert!(!game.valid_moves(sq(1, 5)).contains(&mv(sq(1, 5), sq(1, 7))));
    }

    #[test]
    fn test_castle_refused_while_in_check() {
        let mut game = ChessGame::new();
        game.set_board(position(&[
            (1, 5, Color::White, PieceType::King),
            (1, 8, Color::White, PieceType::Rook),
            (8, 5, Color::Black, PieceType::Rook),
            (8, 1, Color::Black, PieceType::King),
        ]));
        assert!(game.is_in_check(Color::White));
        assert!(!game.valid_moves(sq(1, 5)).contains(&mv(sq(1, 5), sq(1, 7))));
    }

    #[test]
    fn test_castle_refused_after_rook_moved() {
        let mut game = ChessGame::new();
        let mut board = Board::starting();
        board.remove(sq(1, 6));
        board.remove(sq(1, 7));
        game.set_board(board);

        // Shuffle the h-rook out and back; the right is gone for good.
        game.apply_move(mv(sq(1, 8), sq(1, 7))).unwrap();
        game.apply_move(mv(sq(7, 1), sq(6, 1))).unwrap();
        game.apply_move(mv(sq(1, 7), sq(1, 8))).unwrap();
        game.apply_move(mv(sq(6, 1), sq(5, 1))).unwrap();

        assert!(!game.valid_moves(sq(1, 5)).contains(&mv(sq(1, 5), sq(1, 7))));
    }

    #[test]
    fn test_en_passant_capture() {
        // Black c7-c5 lands beside the white d5 pawn; the capture goes
        // to c6 and removes the pawn on c5.
        let mut game = ChessGame::new();
        game.set_board(position(&[
            (1, 5, Color::White, PieceType::King),
            (8, 5, Color::Black, PieceType::King),
            (5, 4, Color::White, PieceType::Pawn),
            (7, 3, Color::Black, PieceType::Pawn),
        ]));
        game.set_turn(Color::Black);
        game.apply_move(mv(sq(7, 3), sq(5, 3))).unwrap();

        let capture = mv(sq(5, 4), sq(6, 3));
        assert!(game.valid_moves(sq(5, 4)).contains(&capture));
        game.apply_move(capture).unwrap();

        assert_eq!(
            game.board().piece_at(sq(6, 3)),
            Some(Piece::new(Color::White, PieceType::Pawn))
        );
        assert!(game.board().piece_at(sq(5, 3)).is_none(), "passed pawn removed");
        assert_eq!(game.history().last().unwrap().tag, Some(MoveTag::Capture));
    }

    #[test]
    fn test_en_passant_expires_after_one_ply() {
        let mut game = ChessGame::new();
        game.set_board(position(&[
            (1, 5, Color::White, PieceType::King),
            (8, 5, Color::Black, PieceType::King),
            (5, 4, Color::White, PieceType::Pawn),
            (7, 3, Color::Black, PieceType::Pawn),
        ]));
        game.set_turn(Color::Black);
        game.apply_move(mv(sq(7, 3), sq(5, 3))).unwrap();
        // White does something else; the en passant window closes.
        game.apply_move(mv(sq(1, 5), sq(1, 4))).unwrap();
        game.apply_move(mv(sq(8, 5), sq(8, 4))).unwrap();

        assert!(!game.valid_moves(sq(5, 4)).contains(&mv(sq(5, 4), sq(6, 3))));
    }

    #[test]
    fn test_promotion_requires_choice() {
        let mut game = ChessGame::new();
        game.set_board(position(&[
            (1, 5, Color::White, PieceType::King),
            (8, 1, Color::Black, PieceType::King),
            (7, 8, Color::White, PieceType::Pawn),
        ]));

        // The bare relocation is not among the legal moves.
        assert_eq!(
            game.apply_move(mv(sq(7, 8), sq(8, 8))),
            Err(MoveError::InvalidMove)
        );
        game.apply_move(Move::promoting(sq(7, 8), sq(8, 8), PieceType::Queen))
            .unwrap();
        assert_eq!(
            game.board().piece_at(sq(8, 8)),
            Some(Piece::new(Color::White, PieceType::Queen))
        );
    }

    #[test]
    fn test_apply_move_rejections() {
        let mut game = ChessGame::new();
        // Empty origin square.
        assert_eq!(
            game.apply_move(mv(sq(4, 4), sq(5, 4))),
            Err(MoveError::InvalidMove)
        );
        // Not black's turn.
        assert_eq!(
            game.apply_move(mv(sq(7, 5), sq(5, 5))),
            Err(MoveError::InvalidMove)
        );
        // Geometrically impossible.
        assert_eq!(
            game.apply_move(mv(sq(1, 1), sq(5, 1))),
            Err(MoveError::InvalidMove)
        );
        // Nothing mutated.
        assert_eq!(game.turn(), Color::White);
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_fools_mate_is_checkmate() {
        let mut game = ChessGame::new();
        game.apply_move(mv(sq(2, 6), sq(3, 6))).unwrap();
        game.apply_move(mv(sq(7, 5), sq(5, 5))).unwrap();
        game.apply_move(mv(sq(2, 7), sq(4, 7))).unwrap();
        game.apply_move(mv(sq(8, 4), sq(4, 8))).unwrap();

        assert!(game.is_in_check(Color::White));
        assert!(game.is_in_checkmate(Color::White));
        assert!(!game.is_in_stalemate(Color::White));
        assert!(game.is_over());
        assert_eq!(game.history().last().unwrap().tag, Some(MoveTag::Check));
    }

    #[test]
    fn test_stalemate_detection() {
        let mut game = ChessGame::new();
        game.set_board(position(&[
            (8, 1, Color::Black, PieceType::King),
            (6, 2, Color::White, PieceType::King),
            (7, 3, Color::White, PieceType::Queen),
        ]));
        game.set_turn(Color::Black);

        assert!(!game.is_in_check(Color::Black));
        assert!(game.is_in_stalemate(Color::Black));
        assert!(!game.is_in_checkmate(Color::Black));
        assert!(game.is_over());
    }

    #[test]
    fn test_check_tagged_in_history() {
        let mut game = ChessGame::new();
        game.set_board(position(&[
            (1, 5, Color::White, PieceType::King),
            (8, 1, Color::Black, PieceType::King),
            (4, 4, Color::White, PieceType::Rook),
        ]));
        game.apply_move(mv(sq(4, 4), sq(4, 1))).unwrap();
        assert_eq!(game.history().last().unwrap().tag, Some(MoveTag::Check));
        assert!(game.is_in_check(Color::Black));
    }

    #[test]
    fn test_game_serde_round_trip() {
        let mut game = ChessGame::new();
        game.apply_move(mv(sq(2, 5), sq(4, 5))).unwrap();
        game.apply_move(mv(sq(7, 5), sq(5, 5))).unwrap();

        let json = serde_json::to_string(&game).unwrap();
        let back: ChessGame = serde_json::from_str(&json).unwrap();
        assert_eq!(game, back);
        assert_eq!(back.turn(), Color::White);
        assert_eq!(back.history().len(), 2);
    }
}
