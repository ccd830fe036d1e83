//! Compact encodings for table entries
//!
//! ## Move code (one byte)
//!
//! `0..16` is a drop column, [`NO_MOVE`] (`0xFF`) is "no move". Any other
//! byte decodes to `None`.
//!
//! ## Column code (five bits)
//!
//! `(1 << height) | owners`, where bit `l` of `owners` (for `l < height`)
//! is set when layer `l` holds a B stone. The leading one marks the
//! height, so an empty column is `0b00001` and no column code is zero.
//!
//! ## Position signature (80 bits in a `u128`)
//!
//! Column `c`'s code sits at bits `5c..5c + 5`. Decoding a signature
//! yields exactly the occupancy words that produced it; words that break
//! gravity cannot be encoded faithfully and are rejected on decode.

use crate::board::{bit, cell_index, column_mask, COLUMNS, LAYERS};

/// Byte stored when there is no move
pub const NO_MOVE: u8 = 0xFF;

/// Bits per column code
const COLUMN_BITS: u32 = 5;
const COLUMN_CODE_MASK: u128 = (1 << COLUMN_BITS) - 1;

/// Pack an optional drop column into one byte
#[inline]
pub fn pack_move(column: Option<u8>) -> u8 {
    match column {
        Some(c) if (c as usize) < COLUMNS => c,
        _ => NO_MOVE,
    }
}

/// Inverse of [`pack_move`]
#[inline]
pub fn unpack_move(code: u8) -> Option<u8> {
    if (code as usize) < COLUMNS {
        Some(code)
    } else {
        None
    }
}

/// Five-bit code of one column. Assumes gravity holds for the column.
#[inline]
pub fn column_code(a: u64, b: u64, column: u8) -> u8 {
    let height = ((a | b) & column_mask(column)).count_ones() as u8;
    let mut owners = 0u8;
    for layer in 0..height {
        if b & bit(cell_index(layer, column)) != 0 {
            owners |= 1 << layer;
        }
    }
    (1 << height) | owners
}

/// Pack a whole position into 80 bits
pub fn encode_position(a: u64, b: u64) -> u128 {
    let mut signature = 0u128;
    for column in 0..COLUMNS as u8 {
        let code = column_code(a, b, column) as u128;
        signature |= code << (column as u32 * COLUMN_BITS);
    }
    signature
}

/// Unpack a signature into `(a, b)` occupancy words.
///
/// Returns `None` for bit patterns no position encodes to.
pub fn decode_position(signature: u128) -> Option<(u64, u64)> {
    if signature >> (COLUMNS as u32 * COLUMN_BITS) != 0 {
        return None;
    }
    let mut a = 0u64;
    let mut b = 0u64;
    for column in 0..COLUMNS as u8 {
        let code = ((signature >> (column as u32 * COLUMN_BITS)) & COLUMN_CODE_MASK) as u8;
        if code == 0 {
            return None;
        }
        let height = 7 - code.leading_zeros() as u8;
        if height > LAYERS {
            return None;
        }
        for layer in 0..height {
            let cell = bit(cell_index(layer, column));
            if code & (1 << layer) != 0 {
                b |= cell;
            } else {
                a |= cell;
            }
        }
    }
    Some((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_code() {
        assert_eq!(pack_move(Some(0)), 0);
        assert_eq!(pack_move(Some(15)), 15);
        assert_eq!(pack_move(Some(16)), NO_MOVE);
        assert_eq!(pack_move(None), NO_MOVE);
        assert_eq!(unpack_move(9), Some(9));
        assert_eq!(unpack_move(NO_MOVE), None);
        assert_eq!(unpack_move(16), None);
    }

    #[test]
    fn test_column_codes() {
        assert_eq!(column_code(0, 0, 3), 0b00001);
        // A, B, A stacked in column 3
        let a = bit(cell_index(0, 3)) | bit(cell_index(2, 3));
        let b = bit(cell_index(1, 3));
        assert_eq!(column_code(a, b, 3), 0b01010);
        // Full column of B
        let full = column_mask(7);
        assert_eq!(column_code(0, full, 7), 0b11111);
        assert_eq!(column_code(full, 0, 7), 0b10000);
    }

    #[test]
    fn test_empty_signature() {
        let sig = encode_position(0, 0);
        assert_ne!(sig, 0);
        assert_eq!(decode_position(sig), Some((0, 0)));
    }

    #[test]
    fn test_signature_roundtrip() {
        let a = bit(0) | bit(16) | bit(5) | bit(cell_index(0, 15)) | bit(cell_index(2, 15));
        let b = bit(32) | bit(1) | bit(cell_index(1, 15)) | bit(cell_index(3, 15));
        assert_eq!(decode_position(encode_position(a, b)), Some((a, b)));
    }

    #[test]
    fn test_signatures_separate_positions() {
        // Same occupancy shape, different owners
        let x = encode_position(bit(0), bit(16));
        let y = encode_position(bit(16), bit(0));
        assert_ne!(x, y);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(decode_position(0), None);
        assert_eq!(decode_position(u128::MAX), None);
    }
}
