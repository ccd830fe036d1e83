//! Move lists and move ordering
//!
//! Moves are ranked by how much they improve the heuristic for the side
//! making them, best first, so alpha-beta meets its cutoffs early. A move
//! suggested by the transposition table always goes to the front.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::ai::SearchBoard;
use crate::eval::Score;

/// Capacity of a move list (one move per cube column)
pub const MAX_MOVES: usize = 16;

/// A move with its ordering key
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoredMove<M> {
    pub mv: M,
    /// Heuristic gain for the side making the move
    pub gain: Score,
}

/// Fixed-capacity move list with an explicit length
#[derive(Clone, Copy, Debug)]
pub struct MoveList<M> {
    entries: [ScoredMove<M>; MAX_MOVES],
    len: usize,
}

impl<M: Copy + Default + PartialEq> MoveList<M> {
    pub fn new() -> Self {
        Self {
            entries: [ScoredMove::default(); MAX_MOVES],
            len: 0,
        }
    }

    /// Append a move.
    ///
    /// # Panics
    ///
    /// Panics if the list already holds [`MAX_MOVES`] moves.
    pub fn push(&mut self, mv: M) {
        assert!(self.len < MAX_MOVES, "move list overflow");
        self.entries[self.len] = ScoredMove { mv, gain: 0 };
        self.len += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<M> {
        self.as_slice().get(index).map(|e| e.mv)
    }

    pub fn first(&self) -> Option<M> {
        self.get(0)
    }

    pub fn as_slice(&self) -> &[ScoredMove<M>] {
        &self.entries[..self.len]
    }

    fn as_mut_slice(&mut self) -> &mut [ScoredMove<M>] {
        &mut self.entries[..self.len]
    }

    /// Moves in list order
    pub fn iter(&self) -> impl Iterator<Item = M> + '_ {
        self.as_slice().iter().map(|e| e.mv)
    }

    pub fn contains(&self, mv: M) -> bool {
        self.iter().any(|m| m == mv)
    }

    /// Move `mv` to the front keeping the order of the rest.
    /// Returns false if `mv` is not in the list.
    pub fn move_to_front(&mut self, mv: M) -> bool {
        match self.as_slice().iter().position(|e| e.mv == mv) {
            Some(i) => {
                self.as_mut_slice()[..=i].rotate_right(1);
                true
            }
            None => false,
        }
    }
}

impl<M: Copy + Default + PartialEq> Default for MoveList<M> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ORDERING
// ============================================================================

/// Rank `moves` best-first for the side to move.
///
/// Gains are measured by making each move and reading the heuristic, so
/// the maximizer gets descending and the minimizer ascending heuristic
/// deltas. The sort is stable; with `shuffle` set, moves are shuffled
/// first so only equally ranked moves change places. `hint` is forced to
/// the front when it is in the list.
pub fn order_moves<B: SearchBoard>(
    board: &mut B,
    moves: &mut MoveList<B::Move>,
    hint: Option<B::Move>,
    shuffle: Option<&mut ChaCha8Rng>,
) {
    let before = board.heuristic();
    let sign = board.side_to_move().sign();
    for entry in moves.as_mut_slice() {
        board.make_move(entry.mv);
        entry.gain = (board.heuristic() - before) * sign;
        board.undo_move(entry.mv);
    }

    if let Some(rng) = shuffle {
        moves.as_mut_slice().shuffle(rng);
    }
    moves.as_mut_slice().sort_by(|x, y| y.gain.cmp(&x.gain));

    if let Some(mv) = hint {
        moves.move_to_front(mv);
    }
}

/// One-ply choice: the move with the best heuristic gain
pub fn greedy_move<B: SearchBoard>(board: &mut B) -> Option<ScoredMove<B::Move>> {
    let mut moves = MoveList::new();
    board.generate_moves(&mut moves);
    order_moves(board, &mut moves, None, None);
    moves.as_slice().first().copied()
}
