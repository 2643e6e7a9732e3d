//! Structures shared by the `GSUB` and `GPOS` tables.
//!
//! Both tables have the same top-level layout: a script list, a feature list and a lookup list,
//! each found at an offset from the start of the table. Decoding is eager: every script, language
//! system, feature and lookup is read when the table is read, and the subtables of the lookup
//! types this crate understands are flattened into per-lookup record lists.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2>

use std::fmt;

use bitflags::bitflags;
use log::debug;
use rustc_hash::FxHashSet;

use crate::binary::read::{
    CheckIndex, ReadBinary, ReadBinaryDep, ReadCtxt, ReadFixedSizeDep, ReadFrom,
};
use crate::binary::{U16Be, U32Be};
use crate::error::ParseError;
use crate::size;

/// Marker for the glyph substitution table
#[derive(Debug)]
pub enum GSUB {}

/// Marker for the glyph positioning table
#[derive(Debug)]
pub enum GPOS {}

/// Behaviour specific to `GSUB` or `GPOS`.
pub trait LayoutTableType: Sized {
    /// The lookup types that are recognised for this table.
    type LookupType: Copy + PartialEq + fmt::Debug;
    /// Records decoded from the subtables of one lookup.
    type Subtables: Default + fmt::Debug;

    /// Map a raw lookup type to `LookupType`, `None` if the type is not recognised.
    fn check_lookup_type(lookup_type: u16) -> Option<Self::LookupType>;

    /// Decode the subtable at `subtable_address`, appending its records to `subtables`.
    ///
    /// Implementations must seek to `subtable_address` before reading.
    fn read_subtable(
        ctxt: &mut ReadCtxt<'_>,
        lookup_type: Self::LookupType,
        subtable_address: usize,
        subtables: &mut Self::Subtables,
    ) -> Result<(), ParseError>;
}

/// A decoded `GSUB` or `GPOS` table.
///
/// Addresses stored in the nested tables are positions relative to the start of this table.
#[derive(Debug)]
pub struct LayoutTable<T: LayoutTableType> {
    pub major_version: u16,
    pub minor_version: u16,
    pub script_list: Vec<ScriptTable>,
    pub feature_list: Vec<FeatureTable>,
    pub lookup_list: Vec<LookupTable<T>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTable {
    pub script_tag: u32,
    pub address: usize,
    /// The default language system, if any, comes first.
    pub langsys_tables: Vec<LangSysTable>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangSysTable {
    /// `None` for the default language system of a script.
    pub langsys_tag: Option<u32>,
    pub address: usize,
    pub lookup_order: u16,
    pub required_feature_index: Option<u16>,
    pub feature_indices: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureTable {
    pub feature_tag: u32,
    pub address: usize,
    pub feature_params: u16,
    pub lookup_indices: Vec<u16>,
}

#[derive(Debug)]
pub struct LookupTable<T: LayoutTableType> {
    pub address: usize,
    pub lookup_type: u16,
    pub lookup_flag: LookupFlag,
    /// Offsets from the start of this lookup.
    pub subtable_offsets: Vec<u16>,
    pub subtables: T::Subtables,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LookupFlag: u16 {
        const RIGHT_TO_LEFT = 0x0001;
        const IGNORE_BASE_GLYPHS = 0x0002;
        const IGNORE_LIGATURES = 0x0004;
        const IGNORE_MARKS = 0x0008;
        const USE_MARK_FILTERING_SET = 0x0010;
        const MARK_ATTACHMENT_TYPE = 0xFF00;
    }
}

/// Tag and offset pair found in script, language system and feature lists.
#[derive(Debug, Clone, Copy)]
struct TagOffsetRecord {
    tag: u32,
    offset: u16,
}

impl ReadFrom for TagOffsetRecord {
    type ReadType = (U32Be, U16Be);

    fn read_from((tag, offset): (u32, u16)) -> Self {
        TagOffsetRecord { tag, offset }
    }
}

const NO_REQUIRED_FEATURE: u16 = 0xFFFF;

impl<T: LayoutTableType> ReadBinary for LayoutTable<T> {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let table_start = ctxt.position();
        let major_version = ctxt.read_u16be()?;
        let minor_version = ctxt.read_u16be()?;
        let script_list_offset = usize::from(ctxt.read_u16be()?);
        let feature_list_offset = usize::from(ctxt.read_u16be()?);
        let lookup_list_offset = usize::from(ctxt.read_u16be()?);

        // We handle versions 1.x
        ctxt.check_version(major_version == 1)?;

        let script_list = match script_list_offset {
            0 => Vec::new(),
            offset => read_tag_offset_list(ctxt, table_start + offset)?
                .into_iter()
                .map(|(script_tag, address)| ctxt.read_dep::<ScriptTable>((script_tag, address)))
                .collect::<Result<Vec<_>, _>>()?,
        };

        let feature_list = match feature_list_offset {
            0 => Vec::new(),
            offset => read_tag_offset_list(ctxt, table_start + offset)?
                .into_iter()
                .map(|(feature_tag, address)| {
                    ctxt.read_dep::<FeatureTable>((feature_tag, address))
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        let mut lookup_list = match lookup_list_offset {
            0 => Vec::new(),
            offset => {
                let lookup_list_address = table_start + offset;
                ctxt.seek(lookup_list_address)?;
                let lookup_count = usize::from(ctxt.read_u16be()?);
                let lookup_offsets = ctxt.read_array::<U16Be>(lookup_count)?.to_vec();
                lookup_offsets
                    .into_iter()
                    .map(|offset| {
                        ctxt.read_dep::<LookupTable<T>>(lookup_list_address + usize::from(offset))
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        for lookup in lookup_list.iter_mut() {
            lookup.read_subtables(ctxt)?;
        }

        let table = LayoutTable {
            major_version,
            minor_version,
            script_list,
            feature_list,
            lookup_list,
        };
        table.check_indices()?;
        Ok(table)
    }
}

/// Read a count followed by that many (tag, offset) records, resolving the offsets against
/// `list_address`.
fn read_tag_offset_list(
    ctxt: &mut ReadCtxt<'_>,
    list_address: usize,
) -> Result<Vec<(u32, usize)>, ParseError> {
    ctxt.seek(list_address)?;
    let count = usize::from(ctxt.read_u16be()?);
    let records = ctxt.read_array::<TagOffsetRecord>(count)?;
    Ok(records
        .iter()
        .map(|record| (record.tag, list_address + usize::from(record.offset)))
        .collect())
}

impl ReadBinaryDep for ScriptTable {
    type Args<'a> = (u32, usize);
    type HostType<'a> = Self;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (script_tag, address): (u32, usize),
    ) -> Result<Self, ParseError> {
        ctxt.seek(address)?;
        let default_langsys_offset = usize::from(ctxt.read_u16be()?);
        let langsys_count = usize::from(ctxt.read_u16be()?);
        let langsys_records = ctxt.read_array::<TagOffsetRecord>(langsys_count)?;

        let mut entries = Vec::with_capacity(langsys_count + 1);
        if default_langsys_offset != 0 {
            entries.push((None, address + default_langsys_offset));
        }
        entries.extend(
            langsys_records
                .iter()
                .map(|record| (Some(record.tag), address + usize::from(record.offset))),
        );

        let langsys_tables = entries
            .into_iter()
            .map(|(langsys_tag, address)| ctxt.read_dep::<LangSysTable>((langsys_tag, address)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ScriptTable {
            script_tag,
            address,
            langsys_tables,
        })
    }
}

impl ScriptTable {
    pub fn default_langsys(&self) -> Option<&LangSysTable> {
        self.langsys_tables
            .iter()
            .find(|langsys| langsys.langsys_tag.is_none())
    }

    pub fn find_langsys(&self, langsys_tag: u32) -> Option<&LangSysTable> {
        self.langsys_tables
            .iter()
            .find(|langsys| langsys.langsys_tag == Some(langsys_tag))
    }
}

impl ReadBinaryDep for LangSysTable {
    type Args<'a> = (Option<u32>, usize);
    type HostType<'a> = Self;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (langsys_tag, address): (Option<u32>, usize),
    ) -> Result<Self, ParseError> {
        ctxt.seek(address)?;
        let lookup_order = ctxt.read_u16be()?; // reserved, should be zero
        let required_feature_index = match ctxt.read_u16be()? {
            NO_REQUIRED_FEATURE => None,
            index => Some(index),
        };
        let feature_index_count = usize::from(ctxt.read_u16be()?);
        let feature_indices = ctxt.read_array::<U16Be>(feature_index_count)?.to_vec();
        Ok(LangSysTable {
            langsys_tag,
            address,
            lookup_order,
            required_feature_index,
            feature_indices,
        })
    }
}

impl LangSysTable {
    pub fn is_default(&self) -> bool {
        self.langsys_tag.is_none()
    }
}

impl ReadBinaryDep for FeatureTable {
    type Args<'a> = (u32, usize);
    type HostType<'a> = Self;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (feature_tag, address): (u32, usize),
    ) -> Result<Self, ParseError> {
        ctxt.seek(address)?;
        let feature_params = ctxt.read_u16be()?;
        let lookup_index_count = usize::from(ctxt.read_u16be()?);
        let lookup_indices = ctxt.read_array::<U16Be>(lookup_index_count)?.to_vec();
        Ok(FeatureTable {
            feature_tag,
            address,
            feature_params,
            lookup_indices,
        })
    }
}

impl<T: LayoutTableType> ReadBinaryDep for LookupTable<T> {
    type Args<'a> = usize;
    type HostType<'a> = Self;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, address: usize) -> Result<Self, ParseError> {
        ctxt.seek(address)?;
        let lookup_type = ctxt.read_u16be()?;
        let lookup_flag = LookupFlag::from_bits_retain(ctxt.read_u16be()?);
        let subtable_count = usize::from(ctxt.read_u16be()?);
        let subtable_offsets = ctxt.read_array::<U16Be>(subtable_count)?.to_vec();
        Ok(LookupTable {
            address,
            lookup_type,
            lookup_flag,
            subtable_offsets,
            subtables: T::Subtables::default(),
        })
    }
}

impl<T: LayoutTableType> LookupTable<T> {
    fn read_subtables(&mut self, ctxt: &mut ReadCtxt<'_>) -> Result<(), ParseError> {
        match T::check_lookup_type(self.lookup_type) {
            Some(lookup_type) => {
                for &offset in &self.subtable_offsets {
                    let subtable_address = self.address + usize::from(offset);
                    T::read_subtable(ctxt, lookup_type, subtable_address, &mut self.subtables)?;
                }
            }
            None => debug!(
                "skipping lookup at 0x{:x} with unsupported type {}",
                self.address, self.lookup_type
            ),
        }
        Ok(())
    }
}

impl<T: LayoutTableType> LayoutTable<T> {
    /// Check that every feature index refers to a feature and every lookup index to a lookup.
    fn check_indices(&self) -> Result<(), ParseError> {
        for langsys in self
            .script_list
            .iter()
            .flat_map(|script| script.langsys_tables.iter())
        {
            if let Some(index) = langsys.required_feature_index {
                self.feature_list.check_index(usize::from(index))?;
            }
            for &index in &langsys.feature_indices {
                self.feature_list.check_index(usize::from(index))?;
            }
        }
        for feature in &self.feature_list {
            for &index in &feature.lookup_indices {
                self.lookup_list.check_index(usize::from(index))?;
            }
        }
        Ok(())
    }

    /// The first script with `script_tag`, later duplicates are unreachable.
    pub fn find_script(&self, script_tag: u32) -> Option<&ScriptTable> {
        self.script_list
            .iter()
            .find(|script| script.script_tag == script_tag)
    }

    /// Resolve a feature through the default language system of a script.
    ///
    /// Finds the first script tagged `script_tag`, then the first feature index of its default
    /// language system whose feature is tagged `feature_tag`. Other language systems are not
    /// consulted, so a script without a default language system never yields a feature.
    pub fn find_feature_index(&self, script_tag: u32, feature_tag: u32) -> Option<usize> {
        let langsys = self.find_script(script_tag)?.default_langsys()?;
        langsys
            .feature_indices
            .iter()
            .map(|&index| usize::from(index))
            .find(|&index| {
                self.feature_list
                    .get(index)
                    .map_or(false, |feature| feature.feature_tag == feature_tag)
            })
    }

    /// The lookups of the feature at `feature_index`, in the order the feature lists them.
    pub fn feature_lookups(&self, feature_index: usize) -> impl Iterator<Item = &LookupTable<T>> {
        self.feature_list
            .get(feature_index)
            .into_iter()
            .flat_map(|feature| feature.lookup_indices.iter())
            .filter_map(|&index| self.lookup_list.get(usize::from(index)))
    }

    /// Lookups of the first feature found by trying each (script, feature) pair in turn.
    pub fn first_feature_lookups(
        &self,
        candidates: &[(u32, u32)],
    ) -> Option<impl Iterator<Item = &LookupTable<T>>> {
        candidates
            .iter()
            .find_map(|&(script_tag, feature_tag)| self.find_feature_index(script_tag, feature_tag))
            .map(|feature_index| self.feature_lookups(feature_index))
    }
}

/// Coverage table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table>
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
    Format1 {
        glyph_array: Vec<u16>,
    },
    Format2 {
        coverage_range_array: Vec<CoverageRangeRecord>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageRangeRecord {
    pub start_glyph: u16,
    pub end_glyph: u16,
    pub start_coverage_index: u16,
}

impl ReadFrom for CoverageRangeRecord {
    type ReadType = (U16Be, U16Be, U16Be);
    fn read_from((start_glyph, end_glyph, start_coverage_index): (u16, u16, u16)) -> Self {
        CoverageRangeRecord {
            start_glyph,
            end_glyph,
            start_coverage_index,
        }
    }
}

impl ReadBinary for Coverage {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        match ctxt.read_u16be()? {
            1 => {
                let glyph_count = ctxt.read_u16be()?;
                let glyph_array = ctxt.read_array::<U16Be>(usize::from(glyph_count))?.to_vec();
                Ok(Coverage::Format1 { glyph_array })
            }
            2 => {
                let coverage_range_count = ctxt.read_u16be()?;
                let coverage_range_array = ctxt
                    .read_array::<CoverageRangeRecord>(usize::from(coverage_range_count))?
                    .to_vec();
                Ok(Coverage::Format2 {
                    coverage_range_array,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl Coverage {
    /// The covered glyphs in coverage index order.
    ///
    /// Ranges are expanded in the order they are declared. A range whose end precedes its start
    /// covers nothing.
    pub fn glyphs(&self) -> Vec<u16> {
        match self {
            Coverage::Format1 { glyph_array } => glyph_array.clone(),
            Coverage::Format2 {
                coverage_range_array,
            } => coverage_range_array
                .iter()
                .flat_map(|range| range.start_glyph..=range.end_glyph)
                .collect(),
        }
    }

    /// Convenience method to count the total number of glyphs covered
    pub fn glyph_count(&self) -> usize {
        match self {
            Coverage::Format1 { glyph_array } => glyph_array.len(),
            Coverage::Format2 {
                coverage_range_array,
            } => coverage_range_array
                .iter()
                .filter(|range| range.start_glyph <= range.end_glyph)
                .map(|range| usize::from(range.end_glyph - range.start_glyph) + 1)
                .sum(),
        }
    }
}

/// Class definition table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table>
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassDef {
    Format1 {
        start_glyph: u16,
        class_value_array: Vec<u16>,
    },
    Format2 {
        class_range_array: Vec<ClassRangeRecord>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassRangeRecord {
    pub start_glyph: u16,
    pub end_glyph: u16,
    pub class_value: u16,
}

impl ReadFrom for ClassRangeRecord {
    type ReadType = (U16Be, U16Be, U16Be);
    fn read_from((start_glyph, end_glyph, class_value): (u16, u16, u16)) -> Self {
        ClassRangeRecord {
            start_glyph,
            end_glyph,
            class_value,
        }
    }
}

impl ReadBinary for ClassDef {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let classdef = match ctxt.read_u16be()? {
            1 => {
                let start_glyph = ctxt.read_u16be()?;
                let glyph_count = ctxt.read_u16be()?;
                let class_value_array =
                    ctxt.read_array::<U16Be>(usize::from(glyph_count))?.to_vec();
                ClassDef::Format1 {
                    start_glyph,
                    class_value_array,
                }
            }
            2 => {
                let class_range_count = usize::from(ctxt.read_u16be()?);
                let class_range_array = ctxt
                    .read_array::<ClassRangeRecord>(class_range_count)?
                    .to_vec();
                ClassDef::Format2 { class_range_array }
            }
            _ => return Err(ParseError::BadVersion),
        };

        // A glyph may only be assigned one class
        let mut seen = FxHashSet::default();
        for (glyph, _class) in classdef.glyph_classes() {
            ctxt.check(seen.insert(glyph))?;
        }

        Ok(classdef)
    }
}

impl ClassDef {
    /// Every glyph listed by this table with its class, in declaration order.
    ///
    /// Format 1 glyph ids wrap around after 0xFFFF. A range whose end precedes its start lists
    /// nothing.
    pub fn glyph_classes(&self) -> Vec<(u16, u16)> {
        match self {
            ClassDef::Format1 {
                start_glyph,
                class_value_array,
            } => class_value_array
                .iter()
                .enumerate()
                .map(|(i, &class_value)| (start_glyph.wrapping_add(i as u16), class_value))
                .collect(),
            ClassDef::Format2 { class_range_array } => class_range_array
                .iter()
                .flat_map(|range| {
                    (range.start_glyph..=range.end_glyph).map(move |glyph| (glyph, range.class_value))
                })
                .collect(),
        }
    }
}

bitflags! {
    /// Fields present in a `ValueRecord`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ValueFormat: u16 {
        const X_PLACEMENT = 0x0001;
        const Y_PLACEMENT = 0x0002;
        const X_ADVANCE = 0x0004;
        const Y_ADVANCE = 0x0008;
        const X_PLACEMENT_DEVICE = 0x0010;
        const Y_PLACEMENT_DEVICE = 0x0020;
        const X_ADVANCE_DEVICE = 0x0040;
        const Y_ADVANCE_DEVICE = 0x0080;
    }
}

impl ReadBinary for ValueFormat {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        // Bits 0xFF00 are reserved
        Ok(ValueFormat::from_bits_truncate(ctxt.read_u16be()?))
    }
}

impl ValueFormat {
    /// Size in bytes of a `ValueRecord` with this format
    pub fn size(self) -> usize {
        self.bits().count_ones() as usize * size::U16
    }
}

/// Positioning adjustment of a glyph
///
/// Only the fields flagged in `value_format` are read from the font, the rest are zero. Device
/// table offsets are kept as read and never followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ValueRecord {
    pub value_format: ValueFormat,
    pub x_placement: i16,
    pub y_placement: i16,
    pub x_advance: i16,
    pub y_advance: i16,
    pub x_placement_device: u16,
    pub y_placement_device: u16,
    pub x_advance_device: u16,
    pub y_advance_device: u16,
}

impl ReadBinaryDep for ValueRecord {
    type Args<'a> = ValueFormat;
    type HostType<'a> = Self;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, value_format: ValueFormat) -> Result<Self, ParseError> {
        let mut record = ValueRecord {
            value_format,
            ..ValueRecord::default()
        };
        if value_format.contains(ValueFormat::X_PLACEMENT) {
            record.x_placement = ctxt.read_i16be()?;
        }
        if value_format.contains(ValueFormat::Y_PLACEMENT) {
            record.y_placement = ctxt.read_i16be()?;
        }
        if value_format.contains(ValueFormat::X_ADVANCE) {
            record.x_advance = ctxt.read_i16be()?;
        }
        if value_format.contains(ValueFormat::Y_ADVANCE) {
            record.y_advance = ctxt.read_i16be()?;
        }
        if value_format.contains(ValueFormat::X_PLACEMENT_DEVICE) {
            record.x_placement_device = ctxt.read_u16be()?;
        }
        if value_format.contains(ValueFormat::Y_PLACEMENT_DEVICE) {
            record.y_placement_device = ctxt.read_u16be()?;
        }
        if value_format.contains(ValueFormat::X_ADVANCE_DEVICE) {
            record.x_advance_device = ctxt.read_u16be()?;
        }
        if value_format.contains(ValueFormat::Y_ADVANCE_DEVICE) {
            record.y_advance_device = ctxt.read_u16be()?;
        }
        Ok(record)
    }
}

impl ReadFixedSizeDep for ValueRecord {
    fn size(value_format: ValueFormat) -> usize {
        value_format.size()
    }
}

impl ValueRecord {
    /// `true` if every field present in the format is zero.
    pub fn is_empty(&self) -> bool {
        let format = self.value_format;
        let present = |flag: ValueFormat, value: i32| !format.contains(flag) || value == 0;
        present(ValueFormat::X_PLACEMENT, i32::from(self.x_placement))
            && present(ValueFormat::Y_PLACEMENT, i32::from(self.y_placement))
            && present(ValueFormat::X_ADVANCE, i32::from(self.x_advance))
            && present(ValueFormat::Y_ADVANCE, i32::from(self.y_advance))
            && present(ValueFormat::X_PLACEMENT_DEVICE, i32::from(self.x_placement_device))
            && present(ValueFormat::Y_PLACEMENT_DEVICE, i32::from(self.y_placement_device))
            && present(ValueFormat::X_ADVANCE_DEVICE, i32::from(self.x_advance_device))
            && present(ValueFormat::Y_ADVANCE_DEVICE, i32::from(self.y_advance_device))
    }
}

/// Read the coverage table at `address` and expand it to its glyphs.
pub(crate) fn read_coverage_glyphs(
    ctxt: &mut ReadCtxt<'_>,
    address: usize,
) -> Result<Vec<u16>, ParseError> {
    ctxt.seek(address)?;
    Ok(ctxt.read::<Coverage>()?.glyphs())
}

/// Read an array of offsets at the current position, resolving them against `base`.
pub(crate) fn read_offsets(
    ctxt: &mut ReadCtxt<'_>,
    count: usize,
    base: usize,
) -> Result<Vec<usize>, ParseError> {
    Ok(ctxt
        .read_array::<U16Be>(count)?
        .iter()
        .map(|offset| base + usize::from(offset))
        .collect())
}
