//! Game state: the bitboard cube, moves and move application

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::SearchBoard;
use crate::board::{
    bit, cell_index, column_index, column_mask, layer_of, permute_bits, symmetry_images,
    transform_column, Cell, COLUMNS, INVERSE, LAYERS, SIZE, SYMMETRY_COUNT, TOP_LAYER,
};
use crate::codec::{encode_position, pack_move, unpack_move};
use crate::eval::{cell_terms, evaluate_full, Score};
use crate::lines::LINES;
use crate::movegen::MoveList;
use crate::tt::TableKey;
use crate::zobrist::{SymmetricHash, ZobristKeys};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Player. A moves first and is the maximizing side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    A = 0,
    B = 1,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// +1 for A, -1 for B
    #[inline]
    pub fn sign(self) -> Score {
        match self {
            Player::A => 1,
            Player::B => -1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::A => write!(f, "A"),
            Player::B => write!(f, "B"),
        }
    }
}

/// Game status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Ongoing,
    Won(Player),
    Draw,
}

/// A drop into one of the sixteen columns
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub column: u8,
    pub player: Player,
}

impl Default for Player {
    fn default() -> Self {
        Player::A
    }
}

impl Move {
    pub fn new(column: u8, player: Player) -> Self {
        Self { column, player }
    }

    /// Grid row of the column
    pub fn row(&self) -> u8 {
        self.column / SIZE
    }

    /// Grid col of the column
    pub fn col(&self) -> u8 {
        self.column % SIZE
    }
}

/// Where a checked move landed and what it did to the game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub column: u8,
    pub layer: u8,
    pub player: Player,
    pub status: GameStatus,
}

/// Rejected moves and positions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("column {0} is off the board (expected 0..16)")]
    InvalidColumn(u8),

    #[error("cell ({row}, {col}) is off the 4x4 grid")]
    InvalidCell { row: u8, col: u8 },

    #[error("column {0} is full")]
    ColumnFull(u8),

    #[error("square {0} is already taken")]
    SquareTaken(u8),

    #[error("game is already over")]
    GameOver,

    #[error("invalid position: {0}")]
    InvalidPosition(String),
}

// ============================================================================
// CUBE
// ============================================================================

/// 4x4x4 gravity board.
///
/// Two disjoint occupancy words, the side to move, the incrementally
/// maintained heuristic total and the eight symmetry hash lanes.
/// Searches mutate one `Cube` in place with [`Cube::apply`] and
/// [`Cube::undo`]; undos must come in exact reverse order of applies.
#[derive(Clone, Debug)]
pub struct Cube {
    stones: [u64; 2],
    side: Player,
    score: Score,
    hash: SymmetricHash,
    keys: Arc<ZobristKeys>,
}

impl Cube {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Empty board, A to move
    pub fn new(keys: Arc<ZobristKeys>) -> Self {
        Self {
            stones: [0, 0],
            side: Player::A,
            score: 0,
            hash: SymmetricHash::new(),
            keys,
        }
    }

    /// Replay a sequence of drop columns from the empty board
    pub fn from_moves(keys: Arc<ZobristKeys>, columns: &[u8]) -> Result<Self, GameError> {
        let mut cube = Self::new(keys);
        for &column in columns {
            cube.play(column)?;
        }
        Ok(cube)
    }

    /// Board from raw occupancy words. The side to move follows from the
    /// stone counts (A moves first).
    pub fn from_occupancy(keys: Arc<ZobristKeys>, a: u64, b: u64) -> Result<Self, GameError> {
        if a & b != 0 {
            return Err(GameError::InvalidPosition("players share a cell".into()));
        }
        let (na, nb) = (a.count_ones(), b.count_ones());
        let side = if na == nb {
            Player::A
        } else if na == nb + 1 {
            Player::B
        } else {
            return Err(GameError::InvalidPosition(format!("{na} A stones against {nb} B stones")));
        };
        let occupied = a | b;
        for column in 0..COLUMNS as u8 {
            let height = (occupied & column_mask(column)).count_ones() as u8;
            let expected = (0..height).fold(0, |m, layer| m | bit(cell_index(layer, column)));
            if occupied & column_mask(column) != expected {
                return Err(GameError::InvalidPosition(format!("column {column} has a gap")));
            }
        }

        let mut cube = Self::new(keys);
        cube.stones = [a, b];
        cube.side = side;
        cube.score = evaluate_full(a, b);
        cube.hash = cube.hash_from_scratch();
        Ok(cube)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    #[inline]
    pub fn side_to_move(&self) -> Player {
        self.side
    }

    #[inline]
    pub fn stones(&self, player: Player) -> u64 {
        self.stones[player.index()]
    }

    /// Raw packed occupancy words `(A, B)`
    pub fn occupancy(&self) -> (u64, u64) {
        (self.stones[0], self.stones[1])
    }

    #[inline]
    pub fn occupied(&self) -> u64 {
        self.stones[0] | self.stones[1]
    }

    pub fn moves_played(&self) -> u32 {
        self.occupied().count_ones()
    }

    /// Stones in a column
    #[inline]
    pub fn height(&self, column: u8) -> u8 {
        (self.occupied() & column_mask(column)).count_ones() as u8
    }

    /// Whether a stone can still be dropped into `column`
    #[inline]
    pub fn is_open(&self, column: u8) -> bool {
        (column as usize) < COLUMNS && self.occupied() & bit(cell_index(LAYERS - 1, column)) == 0
    }

    /// Bitmask of columns that are not full (bit `c` for column `c`)
    #[inline]
    pub fn open_columns(&self) -> u16 {
        !((self.occupied() & TOP_LAYER) >> 48) as u16
    }

    pub fn is_full(&self) -> bool {
        self.occupied() == u64::MAX
    }

    /// Owner of a cell
    pub fn owner(&self, cell: Cell) -> Option<Player> {
        if self.stones[0] & bit(cell) != 0 {
            Some(Player::A)
        } else if self.stones[1] & bit(cell) != 0 {
            Some(Player::B)
        } else {
            None
        }
    }

    /// Incrementally maintained heuristic total
    #[inline]
    pub fn heuristic(&self) -> Score {
        self.score
    }

    /// Heuristic total recomputed over all 76 lines
    pub fn recompute_heuristic(&self) -> Score {
        evaluate_full(self.stones[0], self.stones[1])
    }

    pub fn hash_lanes(&self) -> &SymmetricHash {
        &self.hash
    }

    /// Hash of the symmetry class of this position
    #[inline]
    pub fn canonical_hash(&self) -> u64 {
        self.hash.canonical()
    }

    pub fn keys(&self) -> &Arc<ZobristKeys> {
        &self.keys
    }

    /// Lanes rebuilt from the stones alone
    pub fn hash_from_scratch(&self) -> SymmetricHash {
        let mut hash = SymmetricHash::new();
        for player in [Player::A, Player::B] {
            let mut rest = self.stones(player);
            while rest != 0 {
                let cell = rest.trailing_zeros() as Cell;
                hash.toggle_stone(&self.keys, player, &symmetry_images(cell));
                rest &= rest - 1;
            }
        }
        if self.side == Player::B {
            hash.toggle_side(&self.keys);
        }
        hash
    }

    /// Canonical position encoding under the symmetry of the minimum lane
    pub fn signature(&self) -> u128 {
        self.signature_under(self.hash.canonical_symmetry())
    }

    fn signature_under(&self, symmetry: usize) -> u128 {
        encode_position(
            permute_bits(self.stones[0], symmetry),
            permute_bits(self.stones[1], symmetry),
        )
    }

    /// This position with every stone relabeled by `symmetry`
    pub fn transformed(&self, symmetry: usize) -> Cube {
        let a = permute_bits(self.stones[0], symmetry);
        let b = permute_bits(self.stones[1], symmetry);
        let mut cube = Self::new(Arc::clone(&self.keys));
        cube.stones = [a, b];
        cube.side = self.side;
        cube.score = evaluate_full(a, b);
        cube.hash = cube.hash_from_scratch();
        cube
    }

    // ========================================================================
    // WIN DETECTION
    // ========================================================================

    /// Winner through `cell`, scanning only the lines through it
    pub fn winner_at(&self, cell: Cell) -> Option<Player> {
        let owner = self.owner(cell)?;
        LINES.completes_line(cell, self.stones(owner)).then_some(owner)
    }

    /// Winner by a full rescan of all 76 lines
    pub fn winner(&self) -> Option<Player> {
        [Player::A, Player::B]
            .into_iter()
            .find(|&p| LINES.has_line(self.stones(p)))
    }

    /// Full-board status
    pub fn status(&self) -> GameStatus {
        match self.winner() {
            Some(p) => GameStatus::Won(p),
            None if self.is_full() => GameStatus::Draw,
            None => GameStatus::Ongoing,
        }
    }

    /// Topmost cell of a non-empty column
    #[inline]
    pub fn top_cell(&self, column: u8) -> Option<Cell> {
        match self.height(column) {
            0 => None,
            h => Some(cell_index(h - 1, column)),
        }
    }

    // ========================================================================
    // MOVE APPLICATION
    // ========================================================================

    /// Drop a stone for the side to move into `column` and return the
    /// landing layer.
    ///
    /// The column must be open; use [`Cube::play`] for checked input.
    pub fn apply(&mut self, column: u8) -> u8 {
        let layer = self.height(column);
        debug_assert!(layer < LAYERS, "apply on full column {column}");
        let cell = cell_index(layer, column);
        let mover = self.side;

        self.score -= cell_terms(cell, self.stones[0], self.stones[1]);
        self.stones[mover.index()] |= bit(cell);
        self.score += cell_terms(cell, self.stones[0], self.stones[1]);

        self.hash.toggle_stone(&self.keys, mover, &symmetry_images(cell));
        self.hash.toggle_side(&self.keys);
        self.side = mover.opponent();
        layer
    }

    /// Take back the top stone of `column`, which must be the last stone played
    pub fn undo(&mut self, column: u8) {
        let height = self.height(column);
        debug_assert!(height > 0, "undo on empty column {column}");
        let cell = cell_index(height - 1, column);
        let mover = self.side.opponent();
        debug_assert!(self.stones(mover) & bit(cell) != 0, "undo out of order in column {column}");

        self.score -= cell_terms(cell, self.stones[0], self.stones[1]);
        self.stones[mover.index()] &= !bit(cell);
        self.score += cell_terms(cell, self.stones[0], self.stones[1]);

        self.hash.toggle_stone(&self.keys, mover, &symmetry_images(cell));
        self.hash.toggle_side(&self.keys);
        self.side = mover;
    }

    /// Checked drop for external callers
    pub fn play(&mut self, column: u8) -> Result<Placement, GameError> {
        if column as usize >= COLUMNS {
            return Err(GameError::InvalidColumn(column));
        }
        if self.status() != GameStatus::Ongoing {
            return Err(GameError::GameOver);
        }
        if !self.is_open(column) {
            return Err(GameError::ColumnFull(column));
        }
        let player = self.side;
        let layer = self.apply(column);
        let status = match self.winner_at(cell_index(layer, column)) {
            Some(p) => GameStatus::Won(p),
            None if self.is_full() => GameStatus::Draw,
            None => GameStatus::Ongoing,
        };
        Ok(Placement { column, layer, player, status })
    }

    /// Checked drop addressed by grid coordinate
    pub fn play_at(&mut self, row: u8, col: u8) -> Result<Placement, GameError> {
        if row >= SIZE || col >= SIZE {
            return Err(GameError::InvalidCell { row, col });
        }
        self.play(column_index(row, col))
    }
}

impl fmt::Display for Cube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for layer in (0..LAYERS).rev() {
            let label = match layer {
                3 => " (top)",
                0 => " (bottom)",
                _ => "",
            };
            writeln!(f, "layer {}{}", layer, label)?;
            for row in 0..SIZE {
                write!(f, "  {} |", row)?;
                for col in 0..SIZE {
                    let symbol = match self.owner(cell_index(layer, column_index(row, col))) {
                        Some(Player::A) => 'A',
                        Some(Player::B) => 'B',
                        None => '.',
                    };
                    write!(f, " {}", symbol)?;
                }
                writeln!(f)?;
            }
        }
        write!(f, "      0 1 2 3")
    }
}

// ============================================================================
// SEARCH INTERFACE
// ============================================================================

impl SearchBoard for Cube {
    type Move = Move;

    fn side_to_move(&self) -> Player {
        self.side
    }

    fn generate_moves(&self, moves: &mut MoveList<Move>) {
        let mut open = self.open_columns();
        while open != 0 {
            let column = open.trailing_zeros() as u8;
            moves.push(Move::new(column, self.side));
            open &= open - 1;
        }
    }

    fn make_move(&mut self, mv: Move) {
        debug_assert_eq!(mv.player, self.side);
        self.apply(mv.column);
    }

    fn undo_move(&mut self, mv: Move) {
        debug_assert_eq!(mv.player, self.side.opponent());
        self.undo(mv.column);
    }

    fn winner(&self) -> Option<Player> {
        Cube::winner(self)
    }

    fn winner_after(&self, mv: Move) -> Option<Player> {
        let cell = self.top_cell(mv.column)?;
        debug_assert_eq!(layer_of(cell), self.height(mv.column) - 1);
        self.winner_at(cell)
    }

    fn heuristic(&self) -> Score {
        self.score
    }

    fn table_key(&self) -> TableKey {
        let symmetry = self.hash.canonical_symmetry();
        TableKey {
            hash: self.hash.lane(symmetry),
            signature: self.signature_under(symmetry),
            symmetry: symmetry as u8,
        }
    }

    fn encode_move(&self, mv: Move, symmetry: u8) -> u8 {
        pack_move(Some(transform_column(symmetry as usize, mv.column)))
    }

    fn decode_move(&self, code: u8, symmetry: u8) -> Option<Move> {
        let canonical = unpack_move(code)?;
        let inverse = INVERSE[symmetry as usize % SYMMETRY_COUNT];
        let column = transform_column(inverse, canonical);
        self.is_open(column).then(|| Move::new(column, self.side))
    }
}
