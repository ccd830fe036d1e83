//! Position evaluation
//!
//! Every line contributes a signed term from its stone counts: lines
//! holding stones of both players are dead and score nothing, one-sided
//! lines score from a monotone table (positive for A, negative for B).
//! A completed line is worth more than every other line on the board
//! put together, so the total doubles as a win proxy.
//!
//! Boards keep the total up to date incrementally: before and after
//! touching a cell only the lines through that cell are rescored.

use crate::board::Cell;
use crate::game::Player;
use crate::lines::{LineTable, LINES, LINE_COUNT};

/// Search and heuristic score, positive favours A
pub type Score = i32;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Value of a line with 1, 2, 3 stones of one side
const OPEN_LINE_VALUES: [Score; 3] = [1, 10, 100];

/// Value of a completed line
pub const WIN_LINE_VALUE: Score = 20_000;

/// Upper bound on the magnitude of any total without a completed line
pub const POSITIONAL_BOUND: Score = LINE_COUNT as Score * OPEN_LINE_VALUES[2];

/// Score of a win on the current move; wins further away score less
pub const WIN_SCORE: Score = 1_000_000;

/// Deepest ply a game can reach
pub const MAX_PLY: u32 = 64;

/// Scores beyond this magnitude are forced wins, including one on the last ply
pub const FORCED_WIN_THRESHOLD: Score = WIN_SCORE - MAX_PLY as Score - 1;

/// Window sentinel; no real score reaches it
pub const INFINITY: Score = WIN_SCORE + 1;

/// Score of a drawn position
pub const DRAW_SCORE: Score = 0;

// ============================================================================
// LINE SCORES
// ============================================================================

/// Lookup from (count of A, count of B) on a line to its signed term
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreTable {
    terms: [[Score; 5]; 5],
}

/// Table for four-stone lines
pub static CUBE_SCORES: ScoreTable = ScoreTable::for_line_length(4);

impl ScoreTable {
    /// Build the table for lines of `length` cells (2..=4)
    pub const fn for_line_length(length: usize) -> Self {
        let mut terms = [[0; 5]; 5];
        let mut k = 1;
        while k <= length {
            let value = if k == length { WIN_LINE_VALUE } else { OPEN_LINE_VALUES[k - 1] };
            terms[k][0] = value;
            terms[0][k] = -value;
            k += 1;
        }
        Self { terms }
    }

    /// Signed term for a line holding `a` stones of A and `b` of B
    #[inline]
    pub fn term(&self, a: u32, b: u32) -> Score {
        self.terms[a as usize][b as usize]
    }

    /// Signed term for the line `mask` on the given occupancy
    #[inline]
    pub fn line_term(&self, mask: u64, a: u64, b: u64) -> Score {
        self.term((a & mask).count_ones(), (b & mask).count_ones())
    }
}

/// Sum of the terms of the lines through `cell`
#[inline]
pub fn cell_terms(cell: Cell, a: u64, b: u64) -> Score {
    cell_terms_with(&LINES, &CUBE_SCORES, cell, a, b)
}

pub fn cell_terms_with(lines: &LineTable, table: &ScoreTable, cell: Cell, a: u64, b: u64) -> Score {
    lines
        .through(cell)
        .iter()
        .map(|&i| table.line_term(lines.line(i as usize).mask, a, b))
        .sum()
}

/// From-scratch evaluation of a cube position (all 76 lines)
pub fn evaluate_full(a: u64, b: u64) -> Score {
    LINES
        .lines()
        .iter()
        .map(|line| CUBE_SCORES.line_term(line.mask, a, b))
        .sum()
}

/// Whether a total can only come from a board holding a completed line
#[inline]
pub fn signals_win(score: Score) -> bool {
    score.abs() > POSITIONAL_BOUND
}

// ============================================================================
// WIN SCORES
// ============================================================================

/// Score of a win by `winner` detected `ply` half-moves below the root
#[inline]
pub fn win_score(winner: Player, ply: u32) -> Score {
    winner.sign() * (WIN_SCORE - ply as Score)
}

/// Best score reachable from a node at `ply`: winning on the next move
#[inline]
pub fn decisive_score(ply: u32) -> Score {
    WIN_SCORE - (ply as Score + 1)
}

/// Whether `score` encodes a forced win for either side
#[inline]
pub fn is_forced_win(score: Score) -> bool {
    score.abs() > FORCED_WIN_THRESHOLD
}

/// Half-moves from the root to the forced win encoded in `score`
pub fn plies_to_win(score: Score) -> Option<u32> {
    if is_forced_win(score) {
        Some((WIN_SCORE - score.abs()) as u32)
    } else {
        None
    }
}

/// Rebase a forced-win score from root distance to node distance
#[inline]
pub fn score_to_node(score: Score, ply: u32) -> Score {
    if score > FORCED_WIN_THRESHOLD {
        score + ply as Score
    } else if score < -FORCED_WIN_THRESHOLD {
        score - ply as Score
    } else {
        score
    }
}

/// Inverse of [`score_to_node`]
#[inline]
pub fn score_from_node(score: Score, ply: u32) -> Score {
    if score > FORCED_WIN_THRESHOLD {
        score - ply as Score
    } else if score < -FORCED_WIN_THRESHOLD {
        score + ply as Score
    } else {
        score
    }
}

/// Map a score into [-1, 1]; forced wins land on the ends
pub fn normalize(score: Score) -> f64 {
    if is_forced_win(score) {
        score.signum() as f64
    } else {
        (score as f64 / POSITIONAL_BOUND as f64).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::bit;

    #[test]
    fn test_table_shape() {
        let t = &CUBE_SCORES;
        assert_eq!(t.term(0, 0), 0);
        assert_eq!(t.term(1, 0), 1);
        assert_eq!(t.term(2, 0), 10);
        assert_eq!(t.term(3, 0), 100);
        assert_eq!(t.term(4, 0), WIN_LINE_VALUE);
        assert_eq!(t.term(0, 3), -100);
        assert_eq!(t.term(2, 1), 0);
        assert_eq!(t.term(1, 3), 0);
    }

    #[test]
    fn test_win_line_dominates() {
        // A completed line outweighs every other line going the other way
        assert!(WIN_LINE_VALUE - (LINE_COUNT as Score - 1) * 100 > POSITIONAL_BOUND);
        assert!(POSITIONAL_BOUND < FORCED_WIN_THRESHOLD);
    }

    #[test]
    fn test_short_line_table() {
        let t = ScoreTable::for_line_length(3);
        assert_eq!(t.term(2, 0), 10);
        assert_eq!(t.term(3, 0), WIN_LINE_VALUE);
        assert_eq!(t.term(0, 3), -WIN_LINE_VALUE);
    }

    #[test]
    fn test_empty_board_is_zero() {
        assert_eq!(evaluate_full(0, 0), 0);
    }

    #[test]
    fn test_single_corner_stone() {
        // Corner lies on seven lines, each worth 1
        assert_eq!(evaluate_full(bit(0), 0), 7);
        assert_eq!(evaluate_full(0, bit(0)), -7);
        assert_eq!(cell_terms(0, bit(0), 0), 7);
    }

    #[test]
    fn test_blocked_line_scores_nothing() {
        // A and B sharing the bottom row of layer 0
        let a = bit(0) | bit(1);
        let b = bit(2);
        let row = crate::lines::LINES
            .lines()
            .iter()
            .find(|l| l.cells == [0, 1, 2, 3])
            .map(|l| l.mask)
            .unwrap();
        assert_eq!(CUBE_SCORES.line_term(row, a, b), 0);
    }

    #[test]
    fn test_win_scores_prefer_speed() {
        assert!(win_score(Player::A, 1) > win_score(Player::A, 3));
        assert!(win_score(Player::B, 1) < win_score(Player::B, 3));
        assert_eq!(plies_to_win(win_score(Player::A, 5)), Some(5));
        assert_eq!(plies_to_win(win_score(Player::B, 2)), Some(2));
        assert_eq!(plies_to_win(POSITIONAL_BOUND), None);
        assert_eq!(decisive_score(0), win_score(Player::A, 1));
    }

    #[test]
    fn test_node_rebasing() {
        let root = win_score(Player::A, 7);
        let stored = score_to_node(root, 3);
        assert_eq!(plies_to_win(stored), Some(4));
        assert_eq!(score_from_node(stored, 3), root);
        assert_eq!(score_from_node(stored, 5), win_score(Player::A, 9));
        assert_eq!(score_to_node(42, 10), 42);
        let loss = win_score(Player::B, 6);
        assert_eq!(score_from_node(score_to_node(loss, 2), 2), loss);
    }

    #[test]
    fn test_win_on_last_ply_is_forced() {
        let last = win_score(Player::A, MAX_PLY);
        assert!(is_forced_win(last));
        assert!(is_forced_win(-last));
        assert_eq!(plies_to_win(last), Some(MAX_PLY));
        assert_eq!(plies_to_win(win_score(Player::B, MAX_PLY)), Some(MAX_PLY));

        // Stored at the root, read back where the last stone drops
        let stored = score_to_node(last, 0);
        assert_eq!(score_from_node(stored, 0), last);
        assert_eq!(score_to_node(win_score(Player::A, MAX_PLY), 60), win_score(Player::A, 4));
        assert_eq!(score_from_node(win_score(Player::B, 4), 60), win_score(Player::B, MAX_PLY));
        assert_eq!(normalize(last), 1.0);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(0), 0.0);
        assert_eq!(normalize(win_score(Player::A, 3)), 1.0);
        assert_eq!(normalize(win_score(Player::B, 3)), -1.0);
        assert!(normalize(100) > 0.0 && normalize(100) < 1.0);
    }
}
