//! Loading of a font's layout tables and construction of the derived converters and metrics.

use log::warn;

use crate::adjustment::{PairAdjustmentMetrics, SingleAdjustmentMetrics};
use crate::binary::read::ReadScope;
use crate::binary::U32Be;
use crate::error::ParseError;
use crate::glyph_converter::{LigatureGlyphConverter, SingleGlyphConverter};
use crate::gpos::GposTable;
use crate::gsub::GsubTable;
use crate::tables::mort::MortTable;
use crate::tables::os2::Os2;
use crate::tables::{FontTableProvider, HeadTable, HheaTable, OpenTypeFont, TTCHeader, TTCF_MAGIC};
use crate::tag::{self, DisplayTag};

/// The tables of one font needed for CJK layout.
///
/// Only `head` is required. A `GSUB`, `GPOS`, `mort`, `hhea`, `vhea` or `OS/2` table that is absent, or
/// that is malformed, leaves its slot empty. Malformed tables are listed by `table_errors`.
#[derive(Debug)]
pub struct FontInfo {
    head: HeadTable,
    hhea: Option<HheaTable>,
    vhea: Option<HheaTable>,
    os2: Option<Os2>,
    gsub: Option<GsubTable>,
    gpos: Option<GposTable>,
    mort: Option<MortTable>,
    table_errors: Vec<(u32, ParseError)>,
}

impl FontInfo {
    /// Whether `data` starts with the `ttcf` tag of a TrueType collection.
    pub fn is_collection(data: &[u8]) -> bool {
        ReadScope::new(data).read::<U32Be>() == Ok(TTCF_MAGIC)
    }

    /// Number of fonts in the collection `data`.
    ///
    /// Returns `ParseError::NotCollection` if `data` is not a collection.
    pub fn collection_count(data: &[u8]) -> Result<usize, ParseError> {
        let ttc_header = ReadScope::new(data).read::<TTCHeader<'_>>()?;
        Ok(ttc_header.offset_tables.len())
    }

    /// Load the font in `data`, or the first font of a collection.
    pub fn read(data: &[u8]) -> Result<FontInfo, ParseError> {
        FontInfo::read_index(data, 0)
    }

    /// Load the font at `index` of the collection `data`. `index` is ignored for a single font.
    pub fn read_index(data: &[u8], index: usize) -> Result<FontInfo, ParseError> {
        let font = ReadScope::new(data).read::<OpenTypeFont<'_>>()?;
        let provider = font.table_provider(index)?;
        FontInfo::new(&provider)
    }

    pub fn new(provider: &impl FontTableProvider) -> Result<FontInfo, ParseError> {
        let head_data = provider.read_table_data(tag::HEAD)?;
        let head = ReadScope::new(&head_data).read::<HeadTable>()?;

        let mut table_errors = Vec::new();
        let hhea = read_optional_table(provider, tag::HHEA, &mut table_errors, |scope| {
            scope.read::<HheaTable>()
        })?;
        let vhea = read_optional_table(provider, tag::VHEA, &mut table_errors, |scope| {
            scope.read::<HheaTable>()
        })?;
        let os2 = read_optional_table(provider, tag::OS_2, &mut table_errors, |scope| {
            scope.read::<Os2>()
        })?;
        let gsub = read_optional_table(provider, tag::GSUB, &mut table_errors, |scope| {
            scope.read::<GsubTable>()
        })?;
        let gpos = read_optional_table(provider, tag::GPOS, &mut table_errors, |scope| {
            scope.read::<GposTable>()
        })?;
        let mort = read_optional_table(provider, tag::MORT, &mut table_errors, |scope| {
            scope.read::<MortTable>()
        })?;

        Ok(FontInfo {
            head,
            hhea,
            vhea,
            os2,
            gsub,
            gpos,
            mort,
            table_errors,
        })
    }

    pub fn head(&self) -> &HeadTable {
        &self.head
    }

    pub fn hhea(&self) -> Option<&HheaTable> {
        self.hhea.as_ref()
    }

    pub fn vhea(&self) -> Option<&HheaTable> {
        self.vhea.as_ref()
    }

    pub fn os2(&self) -> Option<&Os2> {
        self.os2.as_ref()
    }

    pub fn gsub(&self) -> Option<&GsubTable> {
        self.gsub.as_ref()
    }

    pub fn gpos(&self) -> Option<&GposTable> {
        self.gpos.as_ref()
    }

    pub fn mort(&self) -> Option<&MortTable> {
        self.mort.as_ref()
    }

    /// Tables that were present but could not be decoded.
    pub fn table_errors(&self) -> &[(u32, ParseError)] {
        &self.table_errors
    }

    pub fn units_per_em(&self) -> u16 {
        self.head.units_per_em
    }

    /// Vertical alternates for punctuation and symbols, from the `vert` feature.
    pub fn vertical_glyph_converter(&self) -> SingleGlyphConverter {
        SingleGlyphConverter::vertical(self.gsub.as_ref(), self.mort.as_ref(), false)
    }

    /// Vertical alternates including Latin glyphs, from the `vrt2` feature with `vert` as a
    /// fallback.
    pub fn advanced_vertical_glyph_converter(&self) -> SingleGlyphConverter {
        SingleGlyphConverter::vertical(self.gsub.as_ref(), self.mort.as_ref(), true)
    }

    pub fn ligature_glyph_converter(&self) -> LigatureGlyphConverter {
        self.gsub
            .as_ref()
            .map(LigatureGlyphConverter::from_gsub)
            .unwrap_or_default()
    }

    /// Proportional metrics from `palt`, or `vpal` when `vertical`.
    pub fn proportional_adjustment_metrics(&self, vertical: bool) -> SingleAdjustmentMetrics {
        let feature_tag = if vertical { tag::VPAL } else { tag::PALT };
        self.single_adjustment_metrics(feature_tag)
    }

    /// Half-width metrics from `halt`, or `vhal` when `vertical`.
    pub fn half_adjustment_metrics(&self, vertical: bool) -> SingleAdjustmentMetrics {
        let feature_tag = if vertical { tag::VHAL } else { tag::HALT };
        self.single_adjustment_metrics(feature_tag)
    }

    pub fn kerning_adjustment_metrics(&self) -> PairAdjustmentMetrics {
        self.gpos
            .as_ref()
            .map(|gpos| PairAdjustmentMetrics::from_gpos(gpos, self.units_per_em()))
            .unwrap_or_default()
    }

    fn single_adjustment_metrics(&self, feature_tag: u32) -> SingleAdjustmentMetrics {
        self.gpos
            .as_ref()
            .map(|gpos| SingleAdjustmentMetrics::from_gpos(gpos, feature_tag, self.units_per_em()))
            .unwrap_or_default()
    }
}

/// Read an optional table.
///
/// A structural error drops the table and is recorded in `table_errors`. Other errors are
/// returned.
fn read_optional_table<T>(
    provider: &impl FontTableProvider,
    table_tag: u32,
    table_errors: &mut Vec<(u32, ParseError)>,
    read: impl FnOnce(ReadScope<'_>) -> Result<T, ParseError>,
) -> Result<Option<T>, ParseError> {
    let result = provider
        .table_data(table_tag)
        .and_then(|data| data.map(|data| read(ReadScope::new(&data))).transpose());
    match result {
        Ok(table) => Ok(table),
        Err(err) if err.is_structural() => {
            warn!("dropping {} table: {}", DisplayTag(table_tag), err);
            table_errors.push((table_tag, err));
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
