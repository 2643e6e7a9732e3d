//! Decoding of glyph positioning (`GPOS`) lookups.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/gpos>

use itertools::iproduct;
use log::{debug, warn};

use crate::binary::read::{ReadBinaryDep, ReadCtxt, ReadFixedSizeDep};
use crate::error::ParseError;
use crate::layout::{
    read_coverage_glyphs, read_offsets, ClassDef, Coverage, LayoutTable, LayoutTableType,
    ValueFormat, ValueRecord, GPOS,
};
use crate::size;

pub type GposTable = LayoutTable<GPOS>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PosLookupType {
    Single,
    Pair,
    Cursive,
    MarkToBase,
    MarkToLigature,
    MarkToMark,
    Context,
}

/// Adjustment applied to a single glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleAdjustment {
    pub glyph: u16,
    pub value_record: ValueRecord,
}

/// Adjustments applied to both glyphs of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairAdjustment {
    pub first_glyph: u16,
    pub first_value_record: ValueRecord,
    pub second_glyph: u16,
    pub second_value_record: ValueRecord,
}

/// Records decoded from the subtables of a single `GPOS` lookup.
#[derive(Debug, Default)]
pub struct PosSubtables {
    pub single: Vec<SingleAdjustment>,
    pub pair: Vec<PairAdjustment>,
}

impl LayoutTableType for GPOS {
    type LookupType = PosLookupType;
    type Subtables = PosSubtables;

    fn check_lookup_type(lookup_type: u16) -> Option<Self::LookupType> {
        match lookup_type {
            1 => Some(PosLookupType::Single),
            2 => Some(PosLookupType::Pair),
            3 => Some(PosLookupType::Cursive),
            4 => Some(PosLookupType::MarkToBase),
            5 => Some(PosLookupType::MarkToLigature),
            6 => Some(PosLookupType::MarkToMark),
            7 => Some(PosLookupType::Context),
            _ => None,
        }
    }

    fn read_subtable(
        ctxt: &mut ReadCtxt<'_>,
        lookup_type: PosLookupType,
        subtable_address: usize,
        subtables: &mut PosSubtables,
    ) -> Result<(), ParseError> {
        match lookup_type {
            PosLookupType::Single | PosLookupType::Pair => {}
            _ => {
                debug!(
                    "skipping {:?} positioning subtable at 0x{:x}",
                    lookup_type, subtable_address
                );
                return Ok(());
            }
        }

        ctxt.seek(subtable_address)?;
        let format = ctxt.read_u16be()?;
        match (lookup_type, format) {
            (PosLookupType::Single, 1) => {
                read_single_pos_format1(ctxt, subtable_address, &mut subtables.single)
            }
            (PosLookupType::Single, 2) => {
                read_single_pos_format2(ctxt, subtable_address, &mut subtables.single)
            }
            (PosLookupType::Pair, 1) => {
                read_pair_pos_format1(ctxt, subtable_address, &mut subtables.pair)
            }
            (PosLookupType::Pair, 2) => {
                read_pair_pos_format2(ctxt, subtable_address, &mut subtables.pair)
            }
            (lookup_type, format) => {
                warn!(
                    "skipping {:?} positioning subtable at 0x{:x} with unknown format {}",
                    lookup_type, subtable_address, format
                );
                Ok(())
            }
        }
    }
}

fn read_single_pos_format1(
    ctxt: &mut ReadCtxt<'_>,
    subtable_address: usize,
    records: &mut Vec<SingleAdjustment>,
) -> Result<(), ParseError> {
    let coverage_offset = usize::from(ctxt.read_u16be()?);
    let value_format = ctxt.read::<ValueFormat>()?;
    let value_record = ctxt.read_dep::<ValueRecord>(value_format)?;
    let glyphs = read_coverage_glyphs(ctxt, subtable_address + coverage_offset)?;
    records.extend(glyphs.into_iter().map(|glyph| SingleAdjustment {
        glyph,
        value_record,
    }));
    Ok(())
}

fn read_single_pos_format2(
    ctxt: &mut ReadCtxt<'_>,
    subtable_address: usize,
    records: &mut Vec<SingleAdjustment>,
) -> Result<(), ParseError> {
    let coverage_offset = usize::from(ctxt.read_u16be()?);
    let value_format = ctxt.read::<ValueFormat>()?;
    let value_count = usize::from(ctxt.read_u16be()?);
    let value_records = ctxt
        .read_array_dep::<ValueRecord>(value_count, value_format)?
        .read_to_vec()?;
    let glyphs = read_coverage_glyphs(ctxt, subtable_address + coverage_offset)?;
    ctxt.check_index(glyphs.len() <= value_records.len())?;
    records.extend(
        glyphs
            .into_iter()
            .zip(value_records)
            .map(|(glyph, value_record)| SingleAdjustment {
                glyph,
                value_record,
            }),
    );
    Ok(())
}

/// A second glyph and the adjustments for both glyphs of the pair.
#[derive(Debug, Clone, Copy)]
struct PairValueRecord {
    second_glyph: u16,
    value_record1: ValueRecord,
    value_record2: ValueRecord,
}

impl ReadBinaryDep for PairValueRecord {
    type Args<'a> = (ValueFormat, ValueFormat);
    type HostType<'a> = Self;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (value_format1, value_format2): (ValueFormat, ValueFormat),
    ) -> Result<Self, ParseError> {
        let second_glyph = ctxt.read_u16be()?;
        let value_record1 = ctxt.read_dep::<ValueRecord>(value_format1)?;
        let value_record2 = ctxt.read_dep::<ValueRecord>(value_format2)?;
        Ok(PairValueRecord {
            second_glyph,
            value_record1,
            value_record2,
        })
    }
}

impl ReadFixedSizeDep for PairValueRecord {
    fn size((value_format1, value_format2): (ValueFormat, ValueFormat)) -> usize {
        size::U16 + value_format1.size() + value_format2.size()
    }
}

fn read_pair_pos_format1(
    ctxt: &mut ReadCtxt<'_>,
    subtable_address: usize,
    records: &mut Vec<PairAdjustment>,
) -> Result<(), ParseError> {
    let coverage_offset = usize::from(ctxt.read_u16be()?);
    let value_format1 = ctxt.read::<ValueFormat>()?;
    let value_format2 = ctxt.read::<ValueFormat>()?;
    let pair_set_count = usize::from(ctxt.read_u16be()?);
    let pair_set_addresses = read_offsets(ctxt, pair_set_count, subtable_address)?;
    let glyphs = read_coverage_glyphs(ctxt, subtable_address + coverage_offset)?;
    // Pair sets are indexed by coverage position
    ctxt.check_index(pair_set_addresses.len() <= glyphs.len())?;

    for (first_glyph, pair_set_address) in glyphs.into_iter().zip(pair_set_addresses) {
        ctxt.seek(pair_set_address)?;
        let pair_value_count = usize::from(ctxt.read_u16be()?);
        let pair_value_records = ctxt
            .read_array_dep::<PairValueRecord>(pair_value_count, (value_format1, value_format2))?
            .read_to_vec()?;
        records.extend(
            pair_value_records
                .into_iter()
                .map(|pair_value_record| PairAdjustment {
                    first_glyph,
                    first_value_record: pair_value_record.value_record1,
                    second_glyph: pair_value_record.second_glyph,
                    second_value_record: pair_value_record.value_record2,
                }),
        );
    }
    Ok(())
}

/// One cell of the class pair matrix.
#[derive(Debug, Clone, Copy)]
struct Class2Record {
    value_record1: ValueRecord,
    value_record2: ValueRecord,
}

impl ReadBinaryDep for Class2Record {
    type Args<'a> = (ValueFormat, ValueFormat);
    type HostType<'a> = Self;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (value_format1, value_format2): (ValueFormat, ValueFormat),
    ) -> Result<Self, ParseError> {
        let value_record1 = ctxt.read_dep::<ValueRecord>(value_format1)?;
        let value_record2 = ctxt.read_dep::<ValueRecord>(value_format2)?;
        Ok(Class2Record {
            value_record1,
            value_record2,
        })
    }
}

impl ReadFixedSizeDep for Class2Record {
    fn size((value_format1, value_format2): (ValueFormat, ValueFormat)) -> usize {
        value_format1.size() + value_format2.size()
    }
}

/// Expand a class pair subtable into glyph pairs.
///
/// Every glyph listed in the first class definition is paired with every glyph listed in the
/// second, in declaration order. Pairs whose matrix cell adjusts neither glyph are dropped.
fn read_pair_pos_format2(
    ctxt: &mut ReadCtxt<'_>,
    subtable_address: usize,
    records: &mut Vec<PairAdjustment>,
) -> Result<(), ParseError> {
    let coverage_offset = usize::from(ctxt.read_u16be()?);
    let value_format1 = ctxt.read::<ValueFormat>()?;
    let value_format2 = ctxt.read::<ValueFormat>()?;
    let class_def1_offset = usize::from(ctxt.read_u16be()?);
    let class_def2_offset = usize::from(ctxt.read_u16be()?);
    let class1_count = usize::from(ctxt.read_u16be()?);
    let class2_count = usize::from(ctxt.read_u16be()?);
    // Cells are read on demand, a matrix with empty value formats occupies no bytes
    let class_records = ctxt.read_array_dep::<Class2Record>(
        class1_count * class2_count,
        (value_format1, value_format2),
    )?;

    // The coverage table must be readable even though the pairs come from the class definitions
    ctxt.seek(subtable_address + coverage_offset)?;
    ctxt.read::<Coverage>()?;
    ctxt.seek(subtable_address + class_def1_offset)?;
    let class_def1 = ctxt.read::<ClassDef>()?.glyph_classes();
    ctxt.seek(subtable_address + class_def2_offset)?;
    let class_def2 = ctxt.read::<ClassDef>()?.glyph_classes();

    for (&(first_glyph, class1), &(second_glyph, class2)) in
        iproduct!(class_def1.iter(), class_def2.iter())
    {
        let (class1, class2) = (usize::from(class1), usize::from(class2));
        ctxt.check_index(class1 < class1_count && class2 < class2_count)?;
        let cell = class_records.read_item(class1 * class2_count + class2)?;
        if !cell.value_record1.is_empty() || !cell.value_record2.is_empty() {
            records.push(PairAdjustment {
                first_glyph,
                first_value_record: cell.value_record1,
                second_glyph,
                second_value_record: cell.value_record2,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::tests::writer::{self, TtfType::*};

    fn read_subtable(data: &[u8], lookup_type: PosLookupType) -> Result<PosSubtables, ParseError> {
        let mut subtables = PosSubtables::default();
        let mut ctxt = ReadScope::new(data).ctxt();
        GPOS::read_subtable(&mut ctxt, lookup_type, 0, &mut subtables)?;
        Ok(subtables)
    }

    #[test]
    fn test_single_pos_format1_shared_record() {
        let data = writer::convert(&[
            UInt16(1),
            UInt16(8), // coverage
            UInt16(0x0004),
            Int16(-200),
            // coverage @8
            UInt16(1),
            UInt16(2),
            UInt16(3),
            UInt16(4),
        ]);
        let subtables = read_subtable(&data, PosLookupType::Single).unwrap();
        assert_eq!(subtables.single.len(), 2);
        assert_eq!(subtables.single[0].glyph, 3);
        assert_eq!(subtables.single[1].glyph, 4);
        assert_eq!(subtables.single[1].value_record.x_advance, -200);
        assert_eq!(
            subtables.single[0].value_record,
            subtables.single[1].value_record
        );
    }

    #[test]
    fn test_single_pos_format2_parallel_records() {
        let data = writer::convert(&[
            UInt16(2),
            UInt16(16), // coverage
            UInt16(0x0005),
            UInt16(2),
            Int16(-10),
            Int16(-100),
            Int16(20),
            Int16(200),
            // coverage @16
            UInt16(1),
            UInt16(2),
            UInt16(40),
            UInt16(41),
        ]);
        let subtables = read_subtable(&data, PosLookupType::Single).unwrap();
        let values = subtables
            .single
            .iter()
            .map(|s| (s.glyph, s.value_record.x_placement, s.value_record.x_advance))
            .collect::<Vec<_>>();
        assert_eq!(values, vec![(40, -10, -100), (41, 20, 200)]);
    }

    #[test]
    fn test_single_pos_format2_short_array() {
        let data = writer::convert(&[
            UInt16(2),
            UInt16(10), // coverage
            UInt16(0x0004),
            UInt16(1),
            Int16(-100),
            // coverage @10
            UInt16(1),
            UInt16(2),
            UInt16(40),
            UInt16(41),
        ]);
        assert_eq!(
            read_subtable(&data, PosLookupType::Single).err(),
            Some(ParseError::BadIndex)
        );
    }

    #[test]
    fn test_pair_pos_format1() {
        let data = writer::convert(&[
            UInt16(1),
            UInt16(12), // coverage
            UInt16(0x0004),
            UInt16(0x0000),
            UInt16(1),
            UInt16(18),
            // coverage @12
            UInt16(1),
            UInt16(1),
            UInt16(10),
            // pair set @18
            UInt16(2),
            UInt16(20),
            Int16(-50),
            UInt16(21),
            Int16(-60),
        ]);
        let subtables = read_subtable(&data, PosLookupType::Pair).unwrap();
        let pairs = subtables
            .pair
            .iter()
            .map(|p| (p.first_glyph, p.second_glyph, p.first_value_record.x_advance))
            .collect::<Vec<_>>();
        assert_eq!(pairs, vec![(10, 20, -50), (10, 21, -60)]);
        assert!(subtables.pair[0].second_value_record.is_empty());
    }

    #[test]
    fn test_pair_pos_format2_class_expansion() {
        let data = writer::convert(&[
            UInt16(2),
            UInt16(32), // coverage
            UInt16(0x0004),
            UInt16(0x0004),
            UInt16(38), // class def 1
            UInt16(48), // class def 2
            UInt16(2),
            UInt16(2),
            // class records @16
            Int16(0),
            Int16(0),
            Int16(0),
            Int16(0),
            Int16(0),
            Int16(0),
            Int16(-120),
            Int16(30),
            // coverage @32
            UInt16(1),
            UInt16(1),
            UInt16(10),
            // class def 1 @38
            UInt16(1),
            UInt16(10),
            UInt16(2),
            UInt16(1),
            UInt16(0),
            // class def 2 @48
            UInt16(1),
            UInt16(20),
            UInt16(2),
            UInt16(0),
            UInt16(1),
        ]);
        let subtables = read_subtable(&data, PosLookupType::Pair).unwrap();
        assert_eq!(subtables.pair.len(), 1);
        let pair = &subtables.pair[0];
        assert_eq!((pair.first_glyph, pair.second_glyph), (10, 21));
        assert_eq!(pair.first_value_record.x_advance, -120);
        assert_eq!(pair.second_value_record.x_advance, 30);
    }

    #[test]
    fn test_pair_pos_format2_empty_value_formats() {
        let data = writer::convert(&[
            UInt16(2),
            UInt16(16), // coverage
            UInt16(0x0000),
            UInt16(0x0000),
            UInt16(22), // class def 1
            UInt16(30), // class def 2
            UInt16(0xFFFF),
            UInt16(0xFFFF),
            // coverage @16
            UInt16(1),
            UInt16(1),
            UInt16(10),
            // class def 1 @22
            UInt16(1),
            UInt16(10),
            UInt16(1),
            UInt16(0),
            // class def 2 @30
            UInt16(1),
            UInt16(20),
            UInt16(1),
            UInt16(0),
        ]);
        let subtables = read_subtable(&data, PosLookupType::Pair).unwrap();
        assert!(subtables.pair.is_empty());
    }

    #[test]
    fn test_pair_pos_format2_class_out_of_range() {
        let data = writer::convert(&[
            UInt16(2),
            UInt16(20), // coverage
            UInt16(0x0004),
            UInt16(0x0000),
            UInt16(26), // class def 1
            UInt16(34), // class def 2
            UInt16(1),
            UInt16(2),
            // class records @16
            Int16(-5),
            Int16(-6),
            // coverage @20
            UInt16(1),
            UInt16(1),
            UInt16(10),
            // class def 1 @26, class 3 is outside the matrix
            UInt16(1),
            UInt16(10),
            UInt16(1),
            UInt16(3),
            // class def 2 @34
            UInt16(1),
            UInt16(20),
            UInt16(1),
            UInt16(1),
        ]);
        assert_eq!(
            read_subtable(&data, PosLookupType::Pair).err(),
            Some(ParseError::BadIndex)
        );
    }

    #[test]
    fn test_unimplemented_lookup_types_not_visited() {
        let subtables = read_subtable(&[], PosLookupType::MarkToBase).unwrap();
        assert!(subtables.single.is_empty());
        assert!(subtables.pair.is_empty());
        assert_eq!(GPOS::check_lookup_type(9), None);
    }

    #[test]
    fn test_unknown_format_skipped() {
        let data = writer::convert(&[UInt16(3)]);
        let subtables = read_subtable(&data, PosLookupType::Pair).unwrap();
        assert!(subtables.pair.is_empty());
    }
}
