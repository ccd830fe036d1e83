//! The 76 winning lines of the cube and per-cell line lookup
//!
//! Lines are built at compile time by walking the 13 canonical
//! directions from every cell and keeping the walks that stay on the
//! board for four steps. That yields 16 stacks, 16 rows, 16 columns,
//! 8 planar diagonals, 16 inter-layer stairs and 4 space diagonals.

use crate::board::{bit, cell_index, column_index, Cell, CELLS};

/// Number of four-in-a-row lines
pub const LINE_COUNT: usize = 76;

/// Most lines any single cell lies on (the corners and inner diagonals)
pub const MAX_LINES_PER_CELL: usize = 7;

/// Direction vectors as (layer, row, col) steps; first nonzero step is positive
const DIRECTIONS: [[i8; 3]; 13] = [
    [1, 0, 0],   // stack
    [0, 1, 0],   // column
    [0, 0, 1],   // row
    [0, 1, 1],   // planar diagonal
    [0, 1, -1],  // planar anti-diagonal
    [1, 1, 0],   // stair along rows
    [1, -1, 0],
    [1, 0, 1],   // stair along cols
    [1, 0, -1],
    [1, 1, 1],   // space diagonals
    [1, 1, -1],
    [1, -1, 1],
    [1, -1, -1],
];

/// One winning line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Line {
    pub cells: [Cell; 4],
    pub mask: u64,
}

impl Line {
    const fn new(cells: [Cell; 4]) -> Self {
        let mask = bit(cells[0]) | bit(cells[1]) | bit(cells[2]) | bit(cells[3]);
        Self { cells, mask }
    }

    const EMPTY: Line = Line { cells: [0; 4], mask: 0 };
}

/// All lines plus, for each cell, the indices of lines through it
#[derive(Clone, Debug)]
pub struct LineTable {
    lines: [Line; LINE_COUNT],
    through: [[u8; MAX_LINES_PER_CELL]; CELLS],
    through_len: [u8; CELLS],
}

/// Line table shared by every cube board
pub static LINES: LineTable = LineTable::build();

impl LineTable {
    const fn build() -> Self {
        let mut lines = [Line::EMPTY; LINE_COUNT];
        let mut through = [[0u8; MAX_LINES_PER_CELL]; CELLS];
        let mut through_len = [0u8; CELLS];
        let mut count = 0;

        let mut d = 0;
        while d < DIRECTIONS.len() {
            let [dl, dr, dc] = DIRECTIONS[d];
            let mut start = 0;
            while start < CELLS {
                let layer = (start / 16) as i8;
                let row = ((start / 4) % 4) as i8;
                let col = (start % 4) as i8;
                let end_l = layer + 3 * dl;
                let end_r = row + 3 * dr;
                let end_c = col + 3 * dc;
                let inside = end_l >= 0 && end_l < 4 && end_r >= 0 && end_r < 4 && end_c >= 0 && end_c < 4;
                if inside {
                    let mut cells = [0u8; 4];
                    let mut k = 0;
                    while k < 4 {
                        let l = (layer + k as i8 * dl) as u8;
                        let r = (row + k as i8 * dr) as u8;
                        let c = (col + k as i8 * dc) as u8;
                        cells[k] = cell_index(l, column_index(r, c));
                        k += 1;
                    }
                    lines[count] = Line::new(cells);
                    let mut k = 0;
                    while k < 4 {
                        let cell = cells[k] as usize;
                        through[cell][through_len[cell] as usize] = count as u8;
                        through_len[cell] += 1;
                        k += 1;
                    }
                    count += 1;
                }
                start += 1;
            }
            d += 1;
        }

        assert!(count == LINE_COUNT);
        Self { lines, through, through_len }
    }

    /// All 76 lines
    #[inline]
    pub fn lines(&self) -> &[Line; LINE_COUNT] {
        &self.lines
    }

    #[inline]
    pub fn line(&self, index: usize) -> &Line {
        &self.lines[index]
    }

    /// Indices of the lines passing through `cell`
    #[inline]
    pub fn through(&self, cell: Cell) -> &[u8] {
        let cell = cell as usize;
        &self.through[cell][..self.through_len[cell] as usize]
    }

    /// Whether `stones` completes a line through `cell`.
    ///
    /// Only the lines through the cell are scanned; stops at the first
    /// full line.
    #[inline]
    pub fn completes_line(&self, cell: Cell, stones: u64) -> bool {
        self.through(cell).iter().any(|&i| {
            let mask = self.lines[i as usize].mask;
            stones & mask == mask
        })
    }

    /// Whether `stones` contains any complete line (full 76-line scan)
    pub fn has_line(&self, stones: u64) -> bool {
        self.lines.iter().any(|line| stones & line.mask == line.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{SYMMETRIES, SYMMETRY_COUNT};

    fn mask_of(cells: &[Cell]) -> u64 {
        cells.iter().fold(0, |m, &c| m | bit(c))
    }

    #[test]
    fn test_line_count_and_shape() {
        assert_eq!(LINES.lines().len(), LINE_COUNT);
        for line in LINES.lines() {
            assert_eq!(line.mask.count_ones(), 4);
        }
    }

    #[test]
    fn test_lines_are_distinct() {
        let mut masks: Vec<u64> = LINES.lines().iter().map(|l| l.mask).collect();
        masks.sort_unstable();
        masks.dedup();
        assert_eq!(masks.len(), LINE_COUNT);
    }

    #[test]
    fn test_through_counts() {
        let mut total = 0;
        for cell in 0..CELLS as u8 {
            let n = LINES.through(cell).len();
            assert!((4..=MAX_LINES_PER_CELL).contains(&n));
            total += n;
        }
        assert_eq!(total, LINE_COUNT * 4);
        // Corner cell: stack, row, column, planar diagonal, two stairs, space diagonal
        assert_eq!(LINES.through(0).len(), 7);
    }

    #[test]
    fn test_category_counts() {
        let span = |line: &Line, f: fn(Cell) -> u8| {
            let first = f(line.cells[0]);
            line.cells.iter().any(|&c| f(c) != first)
        };
        let mut by_axes = [0usize; 4];
        for line in LINES.lines() {
            let axes = span(line, crate::board::layer_of) as usize
                + span(line, crate::board::row_of) as usize
                + span(line, crate::board::col_of) as usize;
            by_axes[axes] += 1;
        }
        assert_eq!(by_axes, [0, 48, 24, 4]);
    }

    #[test]
    fn test_symmetries_preserve_lines() {
        let masks: Vec<u64> = LINES.lines().iter().map(|l| l.mask).collect();
        for s in 0..SYMMETRY_COUNT {
            for line in LINES.lines() {
                let image: Vec<Cell> = line.cells.iter().map(|&c| SYMMETRIES[s][c as usize]).collect();
                assert!(masks.contains(&mask_of(&image)));
            }
        }
    }

    #[test]
    fn test_completes_line() {
        let stack = mask_of(&[5, 21, 37, 53]);
        assert!(LINES.completes_line(53, stack));
        assert!(LINES.completes_line(5, stack));
        assert!(!LINES.completes_line(6, stack));
        assert!(!LINES.completes_line(53, stack & !bit(21)));
        assert!(LINES.has_line(stack));
        assert!(!LINES.has_line(stack & !bit(5)));
    }

    #[test]
    fn test_space_diagonal() {
        let diag = mask_of(&[0, 21, 42, 63]);
        assert!(LINES.completes_line(42, diag));
        assert!(LINES.has_line(diag));
    }
}
