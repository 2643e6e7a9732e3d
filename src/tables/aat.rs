//! Structures shared by the Apple Advanced Typography tables.

use crate::binary::read::{ReadBinary, ReadCtxt};
use crate::error::ParseError;

/// Set in the coverage word of a metamorphosis subtable that applies only to vertical text.
pub const COVERAGE_VERTICAL: u16 = 0x8000;

/// Bits of the coverage word holding the subtable type.
pub const COVERAGE_SUBTABLE_TYPE: u16 = 0x0007;

// Metamorphosis subtable types
pub const SUBTABLE_REARRANGEMENT: u16 = 0;
pub const SUBTABLE_CONTEXTUAL: u16 = 1;
pub const SUBTABLE_LIGATURE: u16 = 2;
pub const SUBTABLE_NONCONTEXTUAL: u16 = 4;
pub const SUBTABLE_INSERTION: u16 = 5;

// Lookup table formats
pub const LOOKUP_SIMPLE_ARRAY: u16 = 0;
pub const LOOKUP_SEGMENT_SINGLE: u16 = 2;
pub const LOOKUP_SEGMENT_ARRAY: u16 = 4;
pub const LOOKUP_SINGLE_TABLE: u16 = 6;
pub const LOOKUP_TRIMMED_ARRAY: u16 = 8;

/// Header preceding the units of a binary searchable lookup table.
///
/// <https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6Tables.html>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinarySearchHeader {
    pub unit_size: u16,
    pub n_units: u16,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
}

impl ReadBinary for BinarySearchHeader {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let unit_size = ctxt.read_u16be()?;
        let n_units = ctxt.read_u16be()?;
        let search_range = ctxt.read_u16be()?;
        let entry_selector = ctxt.read_u16be()?;
        let range_shift = ctxt.read_u16be()?;

        Ok(BinarySearchHeader {
            unit_size,
            n_units,
            search_range,
            entry_selector,
            range_shift,
        })
    }
}

/// Whether a lookup table of this format starts with a `BinarySearchHeader`.
pub fn has_binary_search_header(format: u16) -> bool {
    matches!(
        format,
        LOOKUP_SEGMENT_SINGLE | LOOKUP_SEGMENT_ARRAY | LOOKUP_SINGLE_TABLE
    )
}
