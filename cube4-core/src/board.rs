//! Cube geometry: cell indexing, columns and the eight board symmetries
//!
//! Cells are numbered `layer * 16 + row * 4 + col`, so bit `i` of an
//! occupancy word is cell `i`. Layer 0 is the bottom; the sixteen
//! columns are the `(row, col)` pairs, numbered `row * 4 + col`.

/// Width of the grid along rows and columns
pub const SIZE: u8 = 4;

/// Number of layers stones can stack to
pub const LAYERS: u8 = 4;

/// Number of drop columns
pub const COLUMNS: usize = 16;

/// Number of cells on the board
pub const CELLS: usize = 64;

/// Cell index (0..64)
pub type Cell = u8;

/// Bits of column 0 on every layer
const COLUMN_0: u64 = 0x0001_0001_0001_0001;

/// Bits of the top layer
pub const TOP_LAYER: u64 = 0xFFFF_0000_0000_0000;

/// Cell index for a layer and a column
#[inline]
pub const fn cell_index(layer: u8, column: u8) -> Cell {
    layer * 16 + column
}

/// Column index for a grid coordinate
#[inline]
pub const fn column_index(row: u8, col: u8) -> u8 {
    row * SIZE + col
}

/// Column a cell belongs to
#[inline]
pub const fn column_of(cell: Cell) -> u8 {
    cell & 0x0F
}

/// Layer a cell sits on
#[inline]
pub const fn layer_of(cell: Cell) -> u8 {
    cell >> 4
}

#[inline]
pub const fn row_of(cell: Cell) -> u8 {
    (cell >> 2) & 0x03
}

#[inline]
pub const fn col_of(cell: Cell) -> u8 {
    cell & 0x03
}

/// Single-bit mask for a cell
#[inline]
pub const fn bit(cell: Cell) -> u64 {
    1u64 << cell
}

/// Mask of all four cells of a column
#[inline]
pub const fn column_mask(column: u8) -> u64 {
    COLUMN_0 << column
}

// ============================================================================
// SYMMETRIES
// ============================================================================

/// Number of symmetries preserving the line structure
pub const SYMMETRY_COUNT: usize = 8;

/// Cell relabeling: `perm[i]` is where cell `i` goes
pub type Permutation = [Cell; CELLS];

/// The eight symmetries of the cube that keep gravity intact:
/// identity, three quarter-turns about the vertical axis and the four
/// mirror images. Every symmetry maps each layer onto itself.
///
/// Index: 0=identity, 1=rot90, 2=rot180, 3=rot270,
/// 4=mirror cols, 5=mirror rows, 6=transpose, 7=anti-transpose
pub static SYMMETRIES: [Permutation; SYMMETRY_COUNT] = build_symmetries();

/// `INVERSE[s]` undoes symmetry `s`
pub const INVERSE: [usize; SYMMETRY_COUNT] = [0, 3, 2, 1, 4, 5, 6, 7];

/// Image of a grid coordinate under symmetry `s` on an `n`-wide square
pub const fn transform_coord(s: usize, row: u8, col: u8, n: u8) -> (u8, u8) {
    let m = n - 1;
    match s {
        0 => (row, col),
        1 => (col, m - row),
        2 => (m - row, m - col),
        3 => (m - col, row),
        4 => (row, m - col),
        5 => (m - row, col),
        6 => (col, row),
        _ => (m - col, m - row),
    }
}

const fn build_symmetries() -> [Permutation; SYMMETRY_COUNT] {
    let mut table = [[0u8; CELLS]; SYMMETRY_COUNT];
    let mut s = 0;
    while s < SYMMETRY_COUNT {
        let mut cell = 0;
        while cell < CELLS {
            let c = cell as u8;
            let (row, col) = transform_coord(s, row_of(c), col_of(c), SIZE);
            table[s][cell] = cell_index(layer_of(c), column_index(row, col));
            cell += 1;
        }
        s += 1;
    }
    table
}

/// Images of one cell under all eight symmetries
#[inline]
pub fn symmetry_images(cell: Cell) -> [Cell; SYMMETRY_COUNT] {
    let mut images = [0; SYMMETRY_COUNT];
    for (s, image) in images.iter_mut().enumerate() {
        *image = SYMMETRIES[s][cell as usize];
    }
    images
}

/// Column a drop in `column` lands in after applying symmetry `s`
#[inline]
pub fn transform_column(s: usize, column: u8) -> u8 {
    // Layer-0 cells share their index with their column
    column_of(SYMMETRIES[s][column as usize])
}

/// Relabel every set bit of an occupancy word under symmetry `s`
pub fn permute_bits(bits: u64, s: usize) -> u64 {
    if s == 0 {
        return bits;
    }
    let perm = &SYMMETRIES[s];
    let mut out = 0u64;
    let mut rest = bits;
    while rest != 0 {
        let cell = rest.trailing_zeros() as usize;
        out |= 1u64 << perm[cell];
        rest &= rest - 1;
    }
    out
}
