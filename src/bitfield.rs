//! Bit-level layout of one named identifier field
//!
//! A cell identifier packs several named integer fields into a single 64-bit
//! word. `FieldLayout` describes one such field (bit offset, bit width,
//! signedness) and carries the pure packing arithmetic: range validation,
//! two's-complement packing, and sign-extending extraction. The arithmetic
//! never truncates silently; an out-of-range value is rejected before any
//! bit is written.

use crate::error::ReadoutError;
use crate::ReadoutResult;
use serde::{Deserialize, Serialize};

/// Total width of a packed cell identifier, in bits
pub const IDENTIFIER_WIDTH: u8 = 64;

/// Layout of one named field inside a 64-bit identifier
///
/// Immutable after construction; owned by its
/// [`IdentifierSpec`](crate::idspec::IdentifierSpec).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    /// Field name, unique within one identifier spec
    pub name: String,
    /// Offset of the least significant bit
    pub offset: u8,
    /// Number of bits, 1..=64
    pub width: u8,
    /// Two's-complement interpretation when set
    pub signed: bool,
}

impl FieldLayout {
    /// Create a layout, validating that the field fits inside the identifier
    pub fn new(name: impl Into<String>, offset: u8, width: u8, signed: bool) -> ReadoutResult<Self> {
        let name = name.into();
        if width == 0 || offset as u16 + width as u16 > IDENTIFIER_WIDTH as u16 {
            return Err(ReadoutError::InvalidDescriptor(format!(
                "field '{}': offset {} width {} exceeds {} bits",
                name, offset, width, IDENTIFIER_WIDTH
            )));
        }
        Ok(Self {
            name,
            offset,
            width,
            signed,
        })
    }

    /// Mask covering the field's bits in place
    #[inline]
    pub fn mask(&self) -> u64 {
        self.low_mask() << self.offset
    }

    /// Mask of `width` low bits
    #[inline]
    fn low_mask(&self) -> u64 {
        u64::MAX >> (IDENTIFIER_WIDTH - self.width)
    }

    /// Smallest representable value
    pub fn min_value(&self) -> i64 {
        if !self.signed {
            0
        } else if self.width == IDENTIFIER_WIDTH {
            i64::MIN
        } else {
            -(1i64 << (self.width - 1))
        }
    }

    /// Largest representable value
    pub fn max_value(&self) -> i64 {
        if self.width == IDENTIFIER_WIDTH || (!self.signed && self.width == IDENTIFIER_WIDTH - 1) {
            i64::MAX
        } else if self.signed {
            (1i64 << (self.width - 1)) - 1
        } else {
            (1i64 << self.width) - 1
        }
    }

    /// Whether a value is representable within the field's width
    #[inline]
    pub fn in_range(&self, value: i64) -> bool {
        value >= self.min_value() && value <= self.max_value()
    }

    /// Pack a value into its bit range
    ///
    /// Fails with `OutOfRange` when the value does not fit the declared
    /// width; the value is never wrapped or truncated.
    pub fn pack(&self, value: i64) -> ReadoutResult<u64> {
        if !self.in_range(value) {
            return Err(ReadoutError::OutOfRange {
                field: self.name.clone(),
                value,
                width: self.width,
            });
        }
        // Two's complement within the field width; safe after the range check.
        Ok((value as u64 & self.low_mask()) << self.offset)
    }

    /// Extract the field's value from a packed word
    ///
    /// Total over the 64-bit space: every word decodes. Signed fields are
    /// sign-extended from their declared width.
    #[inline]
    pub fn unpack(&self, word: u64) -> i64 {
        let raw = (word >> self.offset) & self.low_mask();
        if self.signed && self.width < IDENTIFIER_WIDTH && (raw >> (self.width - 1)) & 1 == 1 {
            (raw | !self.low_mask()) as i64
        } else {
            raw as i64
        }
    }
}
