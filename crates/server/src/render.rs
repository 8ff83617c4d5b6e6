//! Board-view rendering for LOAD_GAME payloads: a plain-text grid oriented
//! to the viewer's color, with optional highlighted destination squares.
//! Terminal colors and unicode glyphs are the client's concern.

use chess_core::{Board, Color, Square};

/// Render `board` from `viewer`'s side of the table. White sees rank 1 at
/// the bottom and the a-file on the left; black sees the mirror. Squares in
/// `highlights` are bracketed. Output is deterministic for a given input.
pub fn board_view(board: &Board, viewer: Color, highlights: &[Square]) -> String {
    let (ranks, files): (Vec<u8>, Vec<u8>) = match viewer {
        Color::White => ((1..=8).rev().collect(), (1..=8).collect()),
        Color::Black => ((1..=8).collect(), (1..=8).rev().collect()),
    };

    let mut out = String::new();
    push_file_labels(&mut out, &files);
    for &rank in &ranks {
        let digit = (b'0' + rank) as char;
        out.push(digit);
        out.push(' ');
        for &file in &files {
            let square = Square::new(rank, file);
            let glyph = board.piece_at(square).map(|p| p.to_char()).unwrap_or('.');
            if highlights.contains(&square) {
                out.push('[');
                out.push(glyph);
                out.push(']');
            } else {
                out.push(' ');
                out.push(glyph);
                out.push(' ');
            }
        }
        out.push(' ');
        out.push(digit);
        out.push('\n');
    }
    push_file_labels(&mut out, &files);
    out
}

fn push_file_labels(out: &mut String, files: &[u8]) {
    out.push_str("  ");
    for &file in files {
        out.push(' ');
        out.push((b'a' + file - 1) as char);
        out.push(' ');
    }
    out.push('\n');
}
