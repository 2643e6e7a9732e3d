//! Binary reading of the `mort` table.
//!
//! Only vertical non-contextual substitution subtables are decoded; every other subtable type is
//! stepped over. A vertical non-contextual subtable using a lookup format other than 6 is
//! reported as `ParseError::UnsupportedFormat`, which fails the whole table.

use log::{debug, warn};

use crate::binary::read::{ReadBinary, ReadCtxt, ReadFrom};
use crate::binary::{U16Be, U32Be};
use crate::error::ParseError;
use crate::gsub::SingleSubstitution;
use crate::size;
use crate::tables::aat::{self, BinarySearchHeader};

/// The glyph metamorphosis table.
///
/// <https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6mort.html>
#[derive(Debug)]
pub struct MortTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub chains: Vec<Chain>,
}

#[derive(Debug, Clone, Copy)]
pub struct ChainHeader {
    pub default_flags: u32,
    pub chain_length: u32,
    pub n_feature_entries: u16,
    pub n_subtables: u16,
}

/// A feature entry of a chain, mapping a feature type and setting to sub-feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub feature_type: u16,
    pub feature_setting: u16,
    pub enable_flags: u32,
    pub disable_flags: u32,
}

#[derive(Debug)]
pub struct Chain {
    pub chain_header: ChainHeader,
    pub features: Vec<Feature>,
    pub subtables: Vec<MetamorphosisSubtable>,
}

#[derive(Debug)]
pub struct MetamorphosisSubtable {
    pub length: u16,
    pub coverage: u16,
    pub sub_feature_flags: u32,
    /// Lookup table format, present for vertical non-contextual subtables.
    pub format: Option<u16>,
    pub binary_search_header: Option<BinarySearchHeader>,
    /// Substitutions of a vertical non-contextual subtable, empty for every other subtable.
    pub single_substitutions: Vec<SingleSubstitution>,
}

impl ReadBinary for MortTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let major_version = ctxt.read_u16be()?;
        let minor_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let n_chains = ctxt.read_u32be()?;
        let mut chains = Vec::new();

        for _i in 0..n_chains {
            let chain_start = ctxt.position();
            let chain = ctxt.read::<Chain>()?;
            let chain_length = usize::try_from(chain.chain_header.chain_length)?;
            // The next chain starts after `chain_length` bytes regardless of how much of this
            // chain was understood.
            let chain_end = chain_start
                .checked_add(chain_length)
                .ok_or(ParseError::BadOffset)?;
            ctxt.seek(chain_end)?;
            chains.push(chain);
        }

        Ok(MortTable {
            major_version,
            minor_version,
            chains,
        })
    }
}

impl MortTable {
    /// The substitutions of the first vertical subtable in the first chain.
    ///
    /// Returns `None` if there are no chains or the first chain has no vertical subtable.
    pub fn vertical_substitutions(&self) -> Option<&[SingleSubstitution]> {
        self.chains
            .first()?
            .subtables
            .iter()
            .find(|subtable| subtable.is_vertical())
            .map(|subtable| subtable.single_substitutions.as_slice())
    }
}

impl ReadFrom for ChainHeader {
    type ReadType = (U32Be, U32Be, U16Be, U16Be);

    fn read_from(
        (default_flags, chain_length, n_feature_entries, n_subtables): (u32, u32, u16, u16),
    ) -> Self {
        ChainHeader {
            default_flags,
            chain_length,
            n_feature_entries,
            n_subtables,
        }
    }
}

impl ReadFrom for Feature {
    type ReadType = (U16Be, U16Be, U32Be, U32Be);

    fn read_from(
        (feature_type, feature_setting, enable_flags, disable_flags): (u16, u16, u32, u32),
    ) -> Self {
        Feature {
            feature_type,
            feature_setting,
            enable_flags,
            disable_flags,
        }
    }
}

impl ReadBinary for Chain {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let chain_header = ctxt.read::<ChainHeader>()?;
        let features = ctxt
            .read_array::<Feature>(usize::from(chain_header.n_feature_entries))?
            .to_vec();
        // Subtables have no offset array, each one follows the previous.
        let subtables = (0..chain_header.n_subtables)
            .map(|_i| ctxt.read::<MetamorphosisSubtable>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Chain {
            chain_header,
            features,
            subtables,
        })
    }
}

impl MetamorphosisSubtable {
    /// Length of the length, coverage and sub-feature flags fields.
    const HEADER_SIZE: usize = size::U16 + size::U16 + size::U32;

    pub fn is_vertical(&self) -> bool {
        self.coverage & aat::COVERAGE_VERTICAL != 0
    }

    pub fn subtable_type(&self) -> u16 {
        self.coverage & aat::COVERAGE_SUBTABLE_TYPE
    }
}

impl ReadBinary for MetamorphosisSubtable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let subtable_start = ctxt.position();
        let length = ctxt.read_u16be()?;
        let coverage = ctxt.read_u16be()?;
        let sub_feature_flags = ctxt.read_u32be()?;
        ctxt.check(usize::from(length) >= Self::HEADER_SIZE)?;

        let mut subtable = MetamorphosisSubtable {
            length,
            coverage,
            sub_feature_flags,
            format: None,
            binary_search_header: None,
            single_substitutions: Vec::new(),
        };

        if subtable.is_vertical() && subtable.subtable_type() == aat::SUBTABLE_NONCONTEXTUAL {
            let format = ctxt.read_u16be()?;
            subtable.format = Some(format);
            if aat::has_binary_search_header(format) {
                subtable.binary_search_header = Some(ctxt.read::<BinarySearchHeader>()?);
            }
            match (format, subtable.binary_search_header) {
                (aat::LOOKUP_SINGLE_TABLE, Some(header)) => {
                    subtable.single_substitutions = ctxt
                        .read_array::<SingleSubstitution>(usize::from(header.n_units))?
                        .to_vec();
                }
                (
                    aat::LOOKUP_SIMPLE_ARRAY
                    | aat::LOOKUP_SEGMENT_SINGLE
                    | aat::LOOKUP_SEGMENT_ARRAY
                    | aat::LOOKUP_TRIMMED_ARRAY,
                    _,
                ) => return Err(ParseError::UnsupportedFormat(format)),
                _ => warn!("unknown mort lookup format {}, no substitutions read", format),
            }
        } else {
            debug!(
                "skipping mort subtable of type {} (coverage 0x{:04x})",
                subtable.subtable_type(),
                coverage
            );
        }

        ctxt.seek(subtable_start + usize::from(length))?;
        Ok(subtable)
    }
}
