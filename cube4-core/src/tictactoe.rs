//! Tic-tac-toe on a 3x3 grid
//!
//! A small [`SearchBoard`] for exercising the engine end to end: the
//! whole game tree fits in one search. Squares are `row * 3 + col`.
//! Scoring, hashing and symmetry folding work exactly as on the cube.

use std::fmt;
use std::sync::Arc;

use crate::ai::SearchBoard;
use crate::board::{transform_coord, INVERSE, SYMMETRY_COUNT};
use crate::eval::{Score, ScoreTable};
use crate::game::{GameError, GameStatus, Player};
use crate::movegen::MoveList;
use crate::tt::TableKey;
use crate::zobrist::{SymmetricHash, ZobristKeys};

const N: u8 = 3;
const SQUARES: u8 = 9;
const FULL: u16 = 0x1FF;

/// The eight three-in-a-row masks
const LINES: [u16; 8] = [
    0b000_000_111,
    0b000_111_000,
    0b111_000_000,
    0b001_001_001,
    0b010_010_010,
    0b100_100_100,
    0b100_010_001,
    0b001_010_100,
];

static SCORES: ScoreTable = ScoreTable::for_line_length(3);

/// A mark on one square
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Square(pub u8);

/// Image of `square` under symmetry `s`
fn transform_square(s: usize, square: u8) -> u8 {
    let (row, col) = transform_coord(s, square / N, square % N, N);
    row * N + col
}

fn square_images(square: u8) -> [u8; SYMMETRY_COUNT] {
    std::array::from_fn(|s| transform_square(s, square))
}

/// 3x3 board, A moves first
#[derive(Clone, Debug)]
pub struct TicTacToe {
    stones: [u16; 2],
    side: Player,
    hash: SymmetricHash,
    keys: Arc<ZobristKeys>,
}

impl TicTacToe {
    pub fn new(keys: Arc<ZobristKeys>) -> Self {
        Self {
            stones: [0, 0],
            side: Player::A,
            hash: SymmetricHash::new(),
            keys,
        }
    }

    /// Replay squares from the empty board
    pub fn from_moves(keys: Arc<ZobristKeys>, squares: &[u8]) -> Result<Self, GameError> {
        let mut board = Self::new(keys);
        for &square in squares {
            board.play(square)?;
        }
        Ok(board)
    }

    fn occupied(&self) -> u16 {
        self.stones[0] | self.stones[1]
    }

    pub fn owner(&self, square: u8) -> Option<Player> {
        [Player::A, Player::B]
            .into_iter()
            .find(|p| self.stones[p.index()] & (1 << square) != 0)
    }

    pub fn winner(&self) -> Option<Player> {
        [Player::A, Player::B]
            .into_iter()
            .find(|p| LINES.iter().any(|&l| self.stones[p.index()] & l == l))
    }

    pub fn status(&self) -> GameStatus {
        match self.winner() {
            Some(p) => GameStatus::Won(p),
            None if self.occupied() == FULL => GameStatus::Draw,
            None => GameStatus::Ongoing,
        }
    }

    /// Checked move for the side to move
    pub fn play(&mut self, square: u8) -> Result<GameStatus, GameError> {
        if square >= SQUARES {
            return Err(GameError::InvalidCell { row: square / N, col: square % N });
        }
        if self.status() != GameStatus::Ongoing {
            return Err(GameError::GameOver);
        }
        if self.occupied() & (1 << square) != 0 {
            return Err(GameError::SquareTaken(square));
        }
        self.toggle(square, self.side);
        Ok(self.status())
    }

    fn toggle(&mut self, square: u8, player: Player) {
        self.stones[player.index()] ^= 1 << square;
        self.hash.toggle_stone(&self.keys, player, &square_images(square));
        self.hash.toggle_side(&self.keys);
        self.side = self.side.opponent();
    }

    /// Two bits per square (1 = A, 2 = B) after relabeling by `symmetry`
    fn signature_under(&self, symmetry: usize) -> u128 {
        (0..SQUARES).fold(0u128, |sig, square| {
            let code = match self.owner(square) {
                Some(Player::A) => 1u128,
                Some(Player::B) => 2,
                None => 0,
            };
            sig | code << (2 * transform_square(symmetry, square))
        })
    }
}

impl fmt::Display for TicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..N {
            let marks: String = (0..N)
                .map(|col| match self.owner(row * N + col) {
                    Some(Player::A) => 'X',
                    Some(Player::B) => 'O',
                    None => '.',
                })
                .collect();
            writeln!(f, "{}", marks)?;
        }
        Ok(())
    }
}

impl SearchBoard for TicTacToe {
    type Move = Square;

    fn side_to_move(&self) -> Player {
        self.side
    }

    fn generate_moves(&self, moves: &mut MoveList<Square>) {
        let mut empty = !self.occupied() & FULL;
        while empty != 0 {
            moves.push(Square(empty.trailing_zeros() as u8));
            empty &= empty - 1;
        }
    }

    fn make_move(&mut self, mv: Square) {
        debug_assert!(self.occupied() & (1 << mv.0) == 0);
        self.toggle(mv.0, self.side);
    }

    fn undo_move(&mut self, mv: Square) {
        let mover = self.side.opponent();
        debug_assert!(self.stones[mover.index()] & (1 << mv.0) != 0);
        self.toggle(mv.0, mover);
    }

    fn winner(&self) -> Option<Player> {
        TicTacToe::winner(self)
    }

    fn winner_after(&self, mv: Square) -> Option<Player> {
        let owner = self.owner(mv.0)?;
        let stones = self.stones[owner.index()];
        LINES
            .iter()
            .any(|&l| l & (1 << mv.0) != 0 && stones & l == l)
            .then_some(owner)
    }

    fn heuristic(&self) -> Score {
        let [a, b] = self.stones;
        LINES
            .iter()
            .map(|&l| SCORES.term((a & l).count_ones(), (b & l).count_ones()))
            .sum()
    }

    fn table_key(&self) -> TableKey {
        let symmetry = self.hash.canonical_symmetry();
        TableKey {
            hash: self.hash.lane(symmetry),
            signature: self.signature_under(symmetry),
            symmetry: symmetry as u8,
        }
    }

    fn encode_move(&self, mv: Square, symmetry: u8) -> u8 {
        transform_square(symmetry as usize, mv.0)
    }

    fn decode_move(&self, code: u8, symmetry: u8) -> Option<Square> {
        if code >= SQUARES {
            return None;
        }
        let square = transform_square(INVERSE[symmetry as usize % SYMMETRY_COUNT], code);
        (self.occupied() & (1 << square) == 0).then_some(Square(square))
    }
}
