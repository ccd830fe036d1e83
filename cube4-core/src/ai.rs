//! Alpha-beta minimax search
//!
//! The engine is generic over [`SearchBoard`], so the same search runs on
//! the 4x4x4 cube and on tic-tac-toe. One board is mutated in place
//! through make/undo for the whole search; the engine owns its
//! transposition table, so engines must not be shared between threads.
//! Parallel callers give every worker its own board and engine.

use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::{LeafScore, OrderingMode, SearchConfig};
use crate::eval::{decisive_score, normalize, plies_to_win, win_score, Score, DRAW_SCORE, INFINITY};
use crate::game::Player;
use crate::movegen::{order_moves, MoveList};
use crate::tt::{Bound, TableKey, TableStats, TranspositionTable};

// ============================================================================
// BOARD INTERFACE
// ============================================================================

/// What the search needs from a game board.
///
/// Player A maximizes. `make_move`/`undo_move` must be exact inverses
/// and undos come in reverse order of makes.
pub trait SearchBoard {
    type Move: Copy + Default + PartialEq + fmt::Debug;

    fn side_to_move(&self) -> Player;

    /// Push every legal move for the side to move
    fn generate_moves(&self, moves: &mut MoveList<Self::Move>);

    fn make_move(&mut self, mv: Self::Move);

    fn undo_move(&mut self, mv: Self::Move);

    /// Winner by any completed line on the board
    fn winner(&self) -> Option<Player>;

    /// Winner by a line through the cell `mv` just filled; called right
    /// after `make_move(mv)`
    fn winner_after(&self, mv: Self::Move) -> Option<Player>;

    /// Static evaluation, positive favours A
    fn heuristic(&self) -> Score;

    /// Symmetry-folded table key of the current position
    fn table_key(&self) -> TableKey;

    /// Move code in the canonical orientation of `symmetry`
    fn encode_move(&self, mv: Self::Move, symmetry: u8) -> u8;

    /// Inverse of [`SearchBoard::encode_move`]; `None` unless the decoded
    /// move is legal here
    fn decode_move(&self, code: u8, symmetry: u8) -> Option<Self::Move>;
}

// ============================================================================
// RESULTS
// ============================================================================

/// Counters of one search
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Child positions visited
    pub nodes: u64,
    /// Table stores that met a different position in the primary slot
    pub collisions: u64,
    /// Nodes settled by a table entry
    pub table_cutoffs: u64,
}

/// Result of a root search
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SearchOutcome<M> {
    /// `None` when the game is already over, or at depth 0
    pub best_move: Option<M>,
    pub score: Score,
    pub stats: SearchStats,
    pub depth: u8,
}

impl<M> SearchOutcome<M> {
    /// Score mapped into [-1, 1]
    pub fn normalized(&self) -> f64 {
        normalize(self.score)
    }

    /// Winner and half-moves to the win, when the score proves one
    pub fn forced_win_in(&self) -> Option<(Player, u32)> {
        let plies = plies_to_win(self.score)?;
        let winner = if self.score > 0 { Player::A } else { Player::B };
        Some((winner, plies))
    }
}

// ============================================================================
// ALPHA-BETA AI
// ============================================================================

/// Depth-limited alpha-beta player with a transposition table
pub struct AlphaBetaAI {
    config: SearchConfig,
    table: TranspositionTable,
    rng: Option<ChaCha8Rng>,
}

impl AlphaBetaAI {
    pub fn new(config: SearchConfig) -> Self {
        let table = TranspositionTable::with_bytes(config.table_bytes);
        let rng = shuffle_rng(config.ordering);
        Self { config, table, rng }
    }

    /// Default configuration at `depth`
    pub fn with_depth(depth: u8) -> Self {
        Self::new(SearchConfig::with_depth(depth))
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn table_stats(&self) -> TableStats {
        self.table.stats()
    }

    /// Forget cached results and restart the shuffle sequence
    pub fn reset(&mut self) {
        self.table.clear();
        self.rng = shuffle_rng(self.config.ordering);
    }

    /// Search the position to the configured depth.
    ///
    /// The board is restored before returning. Table entries persist
    /// across calls until [`AlphaBetaAI::reset`].
    pub fn search<B: SearchBoard>(&mut self, board: &mut B) -> SearchOutcome<B::Move> {
        let collisions_before = self.table.collisions();
        let mut stats = SearchStats::default();
        let depth = self.config.depth;

        // Nothing to play on a position that is already won
        if let Some(winner) = board.winner() {
            tracing::debug!(winner = %winner, "search on a decided position");
            return SearchOutcome { best_move: None, score: win_score(winner, 0), stats, depth };
        }

        let (score, best_move) = self.alphabeta(board, depth, 0, -INFINITY, INFINITY, None, &mut stats);
        stats.collisions = self.table.collisions() - collisions_before;

        tracing::debug!(
            depth,
            score,
            best_move = ?best_move,
            nodes = stats.nodes,
            collisions = stats.collisions,
            table_cutoffs = stats.table_cutoffs,
            "search complete"
        );

        SearchOutcome { best_move, score, stats, depth }
    }

    /// Get best move for current position
    pub fn best_move<B: SearchBoard>(&mut self, board: &mut B) -> Option<B::Move> {
        self.search(board).best_move
    }

    /// Play both sides until a win, no legal move, or `max_plies` moves.
    /// The board is left at the final position.
    pub fn play_game<B: SearchBoard>(&mut self, board: &mut B, max_plies: usize) -> Vec<B::Move> {
        let mut history = Vec::new();
        while history.len() < max_plies {
            let Some(mv) = self.best_move(board) else {
                break;
            };
            board.make_move(mv);
            history.push(mv);
            if board.winner_after(mv).is_some() {
                break;
            }
        }
        history
    }

    fn leaf_score<B: SearchBoard>(&self, board: &B) -> Score {
        match self.config.leaf_score {
            LeafScore::Heuristic => board.heuristic(),
            LeafScore::Neutral => DRAW_SCORE,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn alphabeta<B: SearchBoard>(
        &mut self,
        board: &mut B,
        depth: u8,
        ply: u32,
        mut alpha: Score,
        mut beta: Score,
        last: Option<B::Move>,
        stats: &mut SearchStats,
    ) -> (Score, Option<B::Move>) {
        let key = board.table_key();
        let probe = self.table.probe(&key, depth, alpha, beta, ply);
        // The root always searches so it can name a move
        if ply > 0 {
            if let Some(score) = probe.cutoff {
                stats.table_cutoffs += 1;
                return (score, None);
            }
            alpha = probe.alpha;
            beta = probe.beta;
        }

        if let Some(winner) = last.and_then(|mv| board.winner_after(mv)) {
            return (win_score(winner, ply), None);
        }

        if depth == 0 {
            return (self.leaf_score(board), None);
        }

        let mut moves = MoveList::new();
        board.generate_moves(&mut moves);
        if moves.is_empty() {
            return (DRAW_SCORE, None);
        }
        let hint = probe.best_move.and_then(|code| board.decode_move(code, key.symmetry));
        order_moves(board, &mut moves, hint, self.rng.as_mut());

        let maximizing = board.side_to_move() == Player::A;
        let (window_alpha, window_beta) = (alpha, beta);
        let decisive = decisive_score(ply);
        let mut best_score = if maximizing { -INFINITY } else { INFINITY };
        let mut best_move = None;

        for mv in moves.iter() {
            board.make_move(mv);
            stats.nodes += 1;
            let (score, _) = self.alphabeta(board, depth - 1, ply + 1, alpha, beta, Some(mv), stats);
            board.undo_move(mv);

            if maximizing {
                if score > best_score {
                    best_score = score;
                    best_move = Some(mv);
                }
                if best_score >= decisive {
                    break;
                }
                if self.config.pruning {
                    alpha = alpha.max(best_score);
                }
            } else {
                if score < best_score {
                    best_score = score;
                    best_move = Some(mv);
                }
                if best_score <= -decisive {
                    break;
                }
                if self.config.pruning {
                    beta = beta.min(best_score);
                }
            }
            if self.config.pruning && alpha >= beta {
                break;
            }
        }

        let bound = Bound::classify(best_score, window_alpha, window_beta);
        let code = best_move.map(|mv| board.encode_move(mv, key.symmetry));
        self.table.store(&key, depth, best_score, bound, code, ply);

        (best_score, best_move)
    }
}

fn shuffle_rng(ordering: OrderingMode) -> Option<ChaCha8Rng> {
    match ordering {
        OrderingMode::Heuristic => None,
        OrderingMode::Shuffled { seed } => Some(ChaCha8Rng::seed_from_u64(seed)),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::WIN_SCORE;
    use crate::game::{Cube, GameStatus, Move};
    use crate::zobrist::ZobristKeys;
    use rand::Rng;
    use std::sync::Arc;

    /// Full board without any four in a row
    const DRAWN_A: u64 = 0x3dca_7829_265e_9687;
    const DRAWN_B: u64 = 0xc235_87d6_d9a1_6978;

    fn cube(columns: &[u8]) -> Cube {
        Cube::from_moves(Arc::new(ZobristKeys::new()), columns).unwrap()
    }

    /// Random reachable position with no winner yet
    fn random_position(rng: &mut ChaCha8Rng, plies: usize) -> Cube {
        let mut board = cube(&[]);
        while (board.moves_played() as usize) < plies {
            let column = rng.gen_range(0..16u8);
            if !board.is_open(column) {
                continue;
            }
            let placement = board.play(column).unwrap();
            if placement.status != GameStatus::Ongoing {
                board.undo(column);
            }
        }
        board
    }

    #[test]
    fn test_empty_board_depth_one_is_neutral() {
        let mut board = cube(&[]);
        let mut ai = AlphaBetaAI::new(SearchConfig::with_depth(1).with_leaf_score(LeafScore::Neutral));
        let outcome = ai.search(&mut board);
        assert_eq!(outcome.score, 0);
        let mv = outcome.best_move.unwrap();
        assert!(mv.column < 16);
        assert_eq!(mv.player, Player::A);
        assert_eq!(outcome.stats.nodes, 16);
        assert_eq!(outcome.forced_win_in(), None);
    }

    #[test]
    fn test_takes_stacked_win() {
        let mut board = cube(&[0, 1, 0, 1, 0, 2]);
        for depth in [1, 2, 4] {
            let mut ai = AlphaBetaAI::with_depth(depth);
            let outcome = ai.search(&mut board);
            assert_eq!(outcome.best_move, Some(Move::new(0, Player::A)));
            assert_eq!(outcome.score, WIN_SCORE - 1);
            assert_eq!(outcome.forced_win_in(), Some((Player::A, 1)));
            assert_eq!(outcome.normalized(), 1.0);
        }
    }

    #[test]
    fn test_blocks_stacked_threat() {
        let mut board = cube(&[0, 1, 0, 1, 0]);
        let mut ai = AlphaBetaAI::with_depth(2);
        let outcome = ai.search(&mut board);
        assert_eq!(outcome.best_move.map(|m| m.column), Some(0));
        assert!(outcome.forced_win_in().is_none());
    }

    #[test]
    fn test_drawn_full_board() {
        let keys = Arc::new(ZobristKeys::new());
        let mut board = Cube::from_occupancy(keys, DRAWN_A, DRAWN_B).unwrap();
        assert_eq!(board.status(), GameStatus::Draw);
        assert_eq!(board.heuristic(), 0);

        let mut moves = MoveList::new();
        board.generate_moves(&mut moves);
        assert!(moves.is_empty());

        let outcome = AlphaBetaAI::with_depth(3).search(&mut board);
        assert_eq!(outcome.best_move, None);
        assert_eq!(outcome.score, 0);
    }

    #[test]
    fn test_already_won_board() {
        // A stacked four in column 0, B to move
        let mut board = cube(&[0, 1, 0, 1, 0, 1, 0]);
        assert_eq!(board.status(), GameStatus::Won(Player::A));
        for depth in [0, 2] {
            let outcome = AlphaBetaAI::with_depth(depth).search(&mut board);
            assert_eq!(outcome.best_move, None);
            assert_eq!(outcome.score, WIN_SCORE);
            assert_eq!(outcome.forced_win_in(), Some((Player::A, 0)));
            assert_eq!(outcome.stats.nodes, 0);
        }
        assert!(AlphaBetaAI::with_depth(3).play_game(&mut board, 10).is_empty());
        assert_eq!(board.moves_played(), 7);
    }

    #[test]
    fn test_pruning_matches_minimax() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for _ in 0..6 {
            let plies = rng.gen_range(4..20);
            let mut board = random_position(&mut rng, plies);
            let base = SearchConfig::with_depth(3).without_table();
            let pruned = AlphaBetaAI::new(base.clone()).search(&mut board);
            let full = AlphaBetaAI::new(base.with_pruning(false)).search(&mut board);
            assert_eq!(pruned.score, full.score);
            assert_eq!(pruned.best_move, full.best_move);
            assert!(pruned.stats.nodes <= full.stats.nodes);
        }
    }

    #[test]
    fn test_table_keeps_root_score() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..4 {
            let plies = rng.gen_range(2..16);
            let mut board = random_position(&mut rng, plies);
            let with_table = AlphaBetaAI::new(SearchConfig::with_depth(4)).search(&mut board);
            let without = AlphaBetaAI::new(SearchConfig::with_depth(4).without_table()).search(&mut board);
            assert_eq!(with_table.score, without.score);
        }
    }

    #[test]
    fn test_repeat_search_is_identical() {
        let mut board = cube(&[5, 10, 6]);
        let mut ai = AlphaBetaAI::with_depth(4);
        let first = ai.search(&mut board);
        ai.reset();
        let second = ai.search(&mut board);
        assert_eq!(first, second);
    }

    #[test]
    fn test_shuffled_ordering_is_seeded() {
        let config = SearchConfig::with_depth(2).with_ordering(OrderingMode::Shuffled { seed: 21 });
        let mut board = cube(&[]);
        let a = AlphaBetaAI::new(config.clone()).search(&mut board);
        let b = AlphaBetaAI::new(config).search(&mut board);
        assert_eq!(a, b);
    }

    #[test]
    fn test_search_restores_board() {
        let mut board = cube(&[3, 3, 12]);
        let before = board.clone();
        AlphaBetaAI::with_depth(3).search(&mut board);
        assert_eq!(board.occupancy(), before.occupancy());
        assert_eq!(board.hash_lanes(), before.hash_lanes());
        assert_eq!(board.heuristic(), before.heuristic());
        assert_eq!(board.side_to_move(), before.side_to_move());
    }

    #[test]
    fn test_table_is_used() {
        let mut board = cube(&[]);
        let mut ai = AlphaBetaAI::with_depth(4);
        let outcome = ai.search(&mut board);
        assert!(outcome.stats.table_cutoffs > 0);
        assert!(ai.table_stats().used > 0);
    }

    #[test]
    fn test_play_game_ends() {
        let mut board = cube(&[]);
        let mut ai = AlphaBetaAI::with_depth(2);
        let history = ai.play_game(&mut board, 64);
        assert!(!history.is_empty());
        assert_eq!(board.moves_played() as usize, history.len());
        let finished = board.status() != GameStatus::Ongoing;
        assert!(finished || history.len() == 64);
    }
}
