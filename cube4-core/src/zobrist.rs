//! Zobrist keys and symmetry-folded position hashing
//!
//! A position is hashed eight times in parallel, once per board
//! symmetry: lane `s` holds the hash of the position relabeled by
//! symmetry `s`. Symmetric positions therefore own the same set of lane
//! values, and the smallest lane is a hash of the whole symmetry class.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::board::{CELLS, SYMMETRY_COUNT};
use crate::game::Player;

/// Seed for the key table; fixed so hashes are reproducible across runs
pub const ZOBRIST_SEED: u64 = 0x0123_4567_89AB_CDEF;

/// Random keys for every (player, cell) pair plus the side to move.
///
/// Built once and shared read-only (typically behind an `Arc`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZobristKeys {
    pieces: [[u64; CELLS]; 2],
    side_to_move: u64,
}

impl ZobristKeys {
    /// Key table from the standard seed
    pub fn new() -> Self {
        Self::with_seed(ZOBRIST_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut pieces = [[0u64; CELLS]; 2];
        for cell in 0..CELLS {
            pieces[0][cell] = rng.gen();
            pieces[1][cell] = rng.gen();
        }
        let side_to_move = rng.gen();
        Self { pieces, side_to_move }
    }

    #[inline]
    pub fn piece(&self, player: Player, cell: u8) -> u64 {
        self.pieces[player.index()][cell as usize]
    }

    #[inline]
    pub fn side_to_move(&self) -> u64 {
        self.side_to_move
    }
}

impl Default for ZobristKeys {
    fn default() -> Self {
        Self::new()
    }
}

/// Eight running hashes, one per symmetry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SymmetricHash {
    lanes: [u64; SYMMETRY_COUNT],
}

impl SymmetricHash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a stone of `player`; `images[s]` is the cell under symmetry `s`.
    ///
    /// Self-inverse: toggling twice restores the previous lanes.
    #[inline]
    pub fn toggle_stone(&mut self, keys: &ZobristKeys, player: Player, images: &[u8; SYMMETRY_COUNT]) {
        for (lane, &image) in self.lanes.iter_mut().zip(images.iter()) {
            *lane ^= keys.piece(player, image);
        }
    }

    /// Toggle the side-to-move key on every lane
    #[inline]
    pub fn toggle_side(&mut self, keys: &ZobristKeys) {
        let key = keys.side_to_move();
        for lane in self.lanes.iter_mut() {
            *lane ^= key;
        }
    }

    #[inline]
    pub fn lane(&self, symmetry: usize) -> u64 {
        self.lanes[symmetry]
    }

    pub fn lanes(&self) -> &[u64; SYMMETRY_COUNT] {
        &self.lanes
    }

    /// Class hash: the minimum over all lanes
    #[inline]
    pub fn canonical(&self) -> u64 {
        self.lanes[self.canonical_symmetry()]
    }

    /// Lowest symmetry index whose lane is the minimum
    #[inline]
    pub fn canonical_symmetry(&self) -> usize {
        let mut best = 0;
        for s in 1..SYMMETRY_COUNT {
            if self.lanes[s] < self.lanes[best] {
                best = s;
            }
        }
        best
    }
}
