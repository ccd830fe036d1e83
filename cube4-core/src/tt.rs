//! Transposition Table for caching search results
//!
//! Positions are keyed by the canonical (symmetry-folded) hash and
//! verified against a canonical position signature, so a false hash
//! match can never be used. Each hash owns a pair of adjacent slots:
//! the primary slot `hash % capacity` and its neighbour `primary ^ 1`.
//!
//! # Example
//!
//! ```
//! use cube4_core::tt::{Bound, TableKey, TranspositionTable};
//!
//! let mut tt = TranspositionTable::with_bytes(1 << 16);
//! let key = TableKey { hash: 0x1234_5678, signature: 42, symmetry: 0 };
//! tt.store(&key, 5, 100, Bound::Exact, Some(3), 0);
//!
//! let probe = tt.probe(&key, 5, -1000, 1000, 0);
//! assert_eq!(probe.cutoff, Some(100));
//! assert_eq!(probe.best_move, Some(3));
//! ```

use serde::Serialize;

use crate::codec::NO_MOVE;
use crate::eval::{score_from_node, score_to_node, Score};

/// How a stored score relates to the true value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Search completed inside the window
    Exact,
    /// True value is at least the score (failed high)
    Lower,
    /// True value is at most the score (failed low)
    Upper,
}

impl Bound {
    /// Classify a fail-soft result against the window it was searched with
    pub fn classify(score: Score, alpha: Score, beta: Score) -> Self {
        if score <= alpha {
            Bound::Upper
        } else if score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        }
    }
}

/// Lookup key of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableKey {
    /// Canonical hash (minimum symmetry lane)
    pub hash: u64,
    /// Position encoding under the canonical symmetry
    pub signature: u128,
    /// Symmetry mapping this position onto its canonical form
    pub symmetry: u8,
}

/// Transposition table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTEntry {
    pub signature: u128,
    /// Score, forced wins counted from this node
    pub score: Score,
    /// Remaining depth the score was searched to
    pub depth: u8,
    /// Best move code in canonical orientation
    pub best_move: u8,
    pub bound: Bound,
}

/// Outcome of a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    /// Stored score settles the node
    pub cutoff: Option<Score>,
    /// Window after tightening by a stored bound
    pub alpha: Score,
    pub beta: Score,
    /// Move-ordering hint in canonical orientation
    pub best_move: Option<u8>,
}

/// Statistics about table usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    /// Total number of slots
    pub capacity: usize,
    /// Slots currently occupied
    pub used: usize,
    /// Stores where a different position held the primary slot
    pub collisions: u64,
}

/// Fixed-capacity transposition table.
///
/// A capacity of zero disables the table: probes miss and stores are
/// dropped.
pub struct TranspositionTable {
    entries: Vec<Option<TTEntry>>,
    collisions: u64,
}

impl TranspositionTable {
    /// Table sized to at most `bytes` of entries (rounded down to an
    /// even slot count; zero bytes disables it)
    pub fn with_bytes(bytes: usize) -> Self {
        let slot = std::mem::size_of::<Option<TTEntry>>();
        let mut capacity = bytes / slot;
        if capacity > 0 {
            capacity = (capacity & !1).max(2);
        }
        tracing::trace!(bytes, capacity, "allocating transposition table");
        Self {
            entries: vec![None; capacity],
            collisions: 0,
        }
    }

    /// Disabled table
    pub fn disabled() -> Self {
        Self::with_bytes(0)
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Collisions since creation or the last clear
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    #[inline]
    fn slots(&self, hash: u64) -> (usize, usize) {
        let primary = (hash % self.entries.len() as u64) as usize;
        (primary, primary ^ 1)
    }

    /// Entry for exactly this position, if cached
    pub fn get(&self, key: &TableKey) -> Option<&TTEntry> {
        if !self.is_enabled() {
            return None;
        }
        let (primary, secondary) = self.slots(key.hash);
        [primary, secondary]
            .into_iter()
            .filter_map(|i| self.entries[i].as_ref())
            .find(|e| e.signature == key.signature)
    }

    /// Probe for a node `ply` half-moves below the root with `depth`
    /// plies left to search.
    ///
    /// A matching entry searched at least `depth` deep settles an exact
    /// score or tightens the window; any match supplies its best move.
    pub fn probe(&self, key: &TableKey, depth: u8, mut alpha: Score, mut beta: Score, ply: u32) -> Probe {
        let mut probe = Probe { cutoff: None, alpha, beta, best_move: None };
        let Some(entry) = self.get(key) else {
            return probe;
        };
        probe.best_move = (entry.best_move != NO_MOVE).then_some(entry.best_move);

        if entry.depth >= depth {
            let score = score_from_node(entry.score, ply);
            match entry.bound {
                Bound::Exact => {
                    probe.cutoff = Some(score);
                    return probe;
                }
                Bound::Lower => alpha = alpha.max(score),
                Bound::Upper => beta = beta.min(score),
            }
            if alpha >= beta {
                probe.cutoff = Some(score);
            }
        }
        probe.alpha = alpha;
        probe.beta = beta;
        probe
    }

    /// Store a search result.
    ///
    /// Writes over an empty slot or the same position; when both slots
    /// hold other positions the shallower one is replaced if the new
    /// result is at least as deep.
    pub fn store(
        &mut self,
        key: &TableKey,
        depth: u8,
        score: Score,
        bound: Bound,
        best_move: Option<u8>,
        ply: u32,
    ) {
        if !self.is_enabled() {
            return;
        }
        let entry = TTEntry {
            signature: key.signature,
            score: score_to_node(score, ply),
            depth,
            best_move: best_move.unwrap_or(NO_MOVE),
            bound,
        };

        let (primary, secondary) = self.slots(key.hash);
        let holds = |slot: &Option<TTEntry>| slot.map_or(false, |e| e.signature == key.signature);

        if self.entries[primary].is_some() && !holds(&self.entries[primary]) {
            self.collisions += 1;
        }

        let target = if holds(&self.entries[primary]) || self.entries[primary].is_none() {
            Some(primary)
        } else if holds(&self.entries[secondary]) || self.entries[secondary].is_none() {
            Some(secondary)
        } else {
            let depth_of = |i: usize| self.entries[i].map_or(0, |e| e.depth);
            let shallow = if depth_of(secondary) < depth_of(primary) { secondary } else { primary };
            (depth >= depth_of(shallow)).then_some(shallow)
        };

        if let Some(i) = target {
            self.entries[i] = Some(entry);
        }
    }

    /// Clear all entries and the collision counter
    pub fn clear(&mut self) {
        tracing::trace!(capacity = self.capacity(), "clearing transposition table");
        self.entries.fill(None);
        self.collisions = 0;
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            capacity: self.capacity(),
            used: self.entries.iter().filter(|e| e.is_some()).count(),
            collisions: self.collisions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{win_score, INFINITY};
    use crate::game::Player;

    fn key(hash: u64, signature: u128) -> TableKey {
        TableKey { hash, signature, symmetry: 0 }
    }

    fn small_table() -> TranspositionTable {
        let slot = std::mem::size_of::<Option<TTEntry>>();
        TranspositionTable::with_bytes(slot * 8)
    }

    #[test]
    fn test_bound_classification() {
        assert_eq!(Bound::classify(-5, -5, 10), Bound::Upper);
        assert_eq!(Bound::classify(10, -5, 10), Bound::Lower);
        assert_eq!(Bound::classify(3, -5, 10), Bound::Exact);
        assert_eq!(Bound::classify(3, -INFINITY, INFINITY), Bound::Exact);
    }

    #[test]
    fn test_capacity() {
        assert_eq!(small_table().capacity(), 8);
        assert!(!TranspositionTable::disabled().is_enabled());
        let odd = TranspositionTable::with_bytes(std::mem::size_of::<Option<TTEntry>>() * 5);
        assert_eq!(odd.capacity(), 4);
    }

    #[test]
    fn test_disabled_table_ignores_stores() {
        let mut tt = TranspositionTable::disabled();
        let k = key(1, 1);
        tt.store(&k, 3, 50, Bound::Exact, Some(2), 0);
        let probe = tt.probe(&k, 0, -10, 10, 0);
        assert_eq!(probe.cutoff, None);
        assert_eq!(probe.best_move, None);
        assert_eq!(tt.stats().used, 0);
    }

    #[test]
    fn test_exact_hit() {
        let mut tt = small_table();
        let k = key(17, 99);
        tt.store(&k, 4, 123, Bound::Exact, Some(7), 0);
        let probe = tt.probe(&k, 4, -1000, 1000, 0);
        assert_eq!(probe.cutoff, Some(123));
        assert_eq!(probe.best_move, Some(7));
    }

    #[test]
    fn test_shallow_entry_only_hints() {
        let mut tt = small_table();
        let k = key(17, 99);
        tt.store(&k, 2, 123, Bound::Exact, Some(7), 0);
        let probe = tt.probe(&k, 3, -1000, 1000, 0);
        assert_eq!(probe.cutoff, None);
        assert_eq!(probe.best_move, Some(7));
        assert_eq!((probe.alpha, probe.beta), (-1000, 1000));
    }

    #[test]
    fn test_signature_mismatch_misses() {
        let mut tt = small_table();
        tt.store(&key(17, 99), 4, 123, Bound::Exact, Some(7), 0);
        let probe = tt.probe(&key(17, 100), 1, -1000, 1000, 0);
        assert_eq!(probe.cutoff, None);
        assert_eq!(probe.best_move, None);
    }

    #[test]
    fn test_bounds_tighten_window() {
        let mut tt = small_table();
        let lower = key(2, 20);
        let upper = key(4, 40);
        tt.store(&lower, 3, 50, Bound::Lower, Some(1), 0);
        tt.store(&upper, 3, -50, Bound::Upper, Some(1), 0);

        let p = tt.probe(&lower, 3, 0, 100, 0);
        assert_eq!((p.alpha, p.beta, p.cutoff), (50, 100, None));
        let p = tt.probe(&lower, 3, 0, 40, 0);
        assert_eq!(p.cutoff, Some(50));

        let p = tt.probe(&upper, 3, -100, 0, 0);
        assert_eq!((p.alpha, p.beta, p.cutoff), (-100, -50, None));
        let p = tt.probe(&upper, 3, -40, 0, 0);
        assert_eq!(p.cutoff, Some(-50));
    }

    #[test]
    fn test_collisions_use_second_slot_then_depth() {
        let mut tt = small_table();
        // Hashes 2 and 10 share the slot pair (2, 3) in an 8-slot table
        tt.store(&key(2, 1), 5, 1, Bound::Exact, None, 0);
        tt.store(&key(10, 2), 3, 2, Bound::Exact, None, 0);
        assert_eq!(tt.collisions(), 1);
        assert!(tt.get(&key(2, 1)).is_some());
        assert!(tt.get(&key(10, 2)).is_some());

        // Third contender: too shallow to evict anything
        tt.store(&key(18, 3), 1, 3, Bound::Exact, None, 0);
        assert_eq!(tt.collisions(), 2);
        assert!(tt.get(&key(18, 3)).is_none());

        // Deep enough to evict the shallower resident
        tt.store(&key(18, 3), 4, 3, Bound::Exact, None, 0);
        assert!(tt.get(&key(18, 3)).is_some());
        assert!(tt.get(&key(2, 1)).is_some());
        assert!(tt.get(&key(10, 2)).is_none());
    }

    #[test]
    fn test_same_position_overwrites() {
        let mut tt = small_table();
        let k = key(6, 60);
        tt.store(&k, 5, 10, Bound::Exact, Some(1), 0);
        tt.store(&k, 2, 20, Bound::Lower, Some(2), 0);
        let e = tt.get(&k).unwrap();
        assert_eq!((e.depth, e.score, e.bound, e.best_move), (2, 20, Bound::Lower, 2));
        assert_eq!(tt.collisions(), 0);
        assert_eq!(tt.stats().used, 1);
    }

    #[test]
    fn test_win_scores_are_rebased() {
        let mut tt = small_table();
        let k = key(3, 30);
        // Win three plies below a node at ply 2
        tt.store(&k, 4, win_score(Player::A, 5), Bound::Exact, None, 2);
        // Reached again at ply 4: still three plies from the node
        let p = tt.probe(&k, 4, -INFINITY, INFINITY, 4);
        assert_eq!(p.cutoff, Some(win_score(Player::A, 7)));
    }

    #[test]
    fn test_clear() {
        let mut tt = small_table();
        tt.store(&key(2, 1), 5, 1, Bound::Exact, None, 0);
        tt.store(&key(10, 2), 5, 1, Bound::Exact, None, 0);
        tt.clear();
        assert_eq!(tt.stats(), TableStats { capacity: 8, used: 0, collisions: 0 });
    }
}
