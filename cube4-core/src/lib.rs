//! Cube4 Core - Game engine and AI for 4x4x4 gravity connect-four
//!
//! This crate provides:
//! - Bitboard cube geometry and the eight board symmetries
//! - The 76 winning lines and localized win detection
//! - Incremental line-count evaluation
//! - Symmetry-folded Zobrist hashing and a transposition table
//! - A generic alpha-beta search (also runs on tic-tac-toe)

pub mod board;
pub mod lines;
pub mod eval;
pub mod zobrist;
pub mod codec;
pub mod game;
pub mod movegen;
pub mod tt;
pub mod config;
pub mod ai;
pub mod tictactoe;

// Re-exports for convenient access
pub use board::{cell_index, column_index, Cell, COLUMNS, LAYERS, SIZE, SYMMETRY_COUNT};
pub use lines::{LINES, LINE_COUNT};
pub use eval::{evaluate_full, Score, WIN_SCORE};
pub use zobrist::{SymmetricHash, ZobristKeys};
pub use game::{Cube, GameError, GameStatus, Move, Placement, Player};
pub use movegen::{greedy_move, MoveList};
pub use tt::{TableStats, TranspositionTable};
pub use config::{LeafScore, OrderingMode, SearchConfig};
pub use ai::{AlphaBetaAI, SearchBoard, SearchOutcome, SearchStats};
pub use tictactoe::{Square, TicTacToe};
