//! Decoding of glyph substitution (`GSUB`) lookups.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/gsub>

use std::iter;

use log::{debug, warn};

use crate::binary::read::{ReadCtxt, ReadFrom};
use crate::binary::U16Be;
use crate::error::ParseError;
use crate::layout::{read_coverage_glyphs, read_offsets, LayoutTable, LayoutTableType, GSUB};

pub type GsubTable = LayoutTable<GSUB>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubstLookupType {
    Single,
    Multiple,
    Alternate,
    Ligature,
    Context,
}

/// A one-to-one glyph replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SingleSubstitution {
    pub glyph: u16,
    pub substitute_glyph: u16,
}

impl ReadFrom for SingleSubstitution {
    type ReadType = (U16Be, U16Be);

    fn read_from((glyph, substitute_glyph): (u16, u16)) -> Self {
        SingleSubstitution {
            glyph,
            substitute_glyph,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipleSubstitution {
    pub glyph: u16,
    pub substitute_glyphs: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateSubstitution {
    pub glyph: u16,
    pub alternate_glyphs: Vec<u16>,
}

/// A sequence of glyphs replaced by a single ligature glyph.
///
/// The first component is the glyph found in the coverage table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LigatureSubstitution {
    pub component_glyphs: Vec<u16>,
    pub ligature_glyph: u16,
}

/// Records decoded from the subtables of a single `GSUB` lookup.
#[derive(Debug, Default)]
pub struct SubstSubtables {
    pub single: Vec<SingleSubstitution>,
    pub multiple: Vec<MultipleSubstitution>,
    pub alternate: Vec<AlternateSubstitution>,
    pub ligature: Vec<LigatureSubstitution>,
}

impl LayoutTableType for GSUB {
    type LookupType = SubstLookupType;
    type Subtables = SubstSubtables;

    fn check_lookup_type(lookup_type: u16) -> Option<Self::LookupType> {
        match lookup_type {
            1 => Some(SubstLookupType::Single),
            2 => Some(SubstLookupType::Multiple),
            3 => Some(SubstLookupType::Alternate),
            4 => Some(SubstLookupType::Ligature),
            5 => Some(SubstLookupType::Context),
            _ => None,
        }
    }

    fn read_subtable(
        ctxt: &mut ReadCtxt<'_>,
        lookup_type: SubstLookupType,
        subtable_address: usize,
        subtables: &mut SubstSubtables,
    ) -> Result<(), ParseError> {
        if lookup_type == SubstLookupType::Context {
            debug!(
                "skipping contextual substitution subtable at 0x{:x}",
                subtable_address
            );
            return Ok(());
        }

        ctxt.seek(subtable_address)?;
        let format = ctxt.read_u16be()?;
        match (lookup_type, format) {
            (SubstLookupType::Single, 1) => {
                read_single_subst_format1(ctxt, subtable_address, &mut subtables.single)
            }
            (SubstLookupType::Single, 2) => {
                read_single_subst_format2(ctxt, subtable_address, &mut subtables.single)
            }
            (SubstLookupType::Multiple, 1) => {
                for (glyph, substitute_glyphs) in read_glyph_sequences(ctxt, subtable_address)? {
                    subtables.multiple.push(MultipleSubstitution {
                        glyph,
                        substitute_glyphs,
                    });
                }
                Ok(())
            }
            (SubstLookupType::Alternate, 1) => {
                for (glyph, alternate_glyphs) in read_glyph_sequences(ctxt, subtable_address)? {
                    subtables.alternate.push(AlternateSubstitution {
                        glyph,
                        alternate_glyphs,
                    });
                }
                Ok(())
            }
            (SubstLookupType::Ligature, 1) => {
                read_ligature_subst(ctxt, subtable_address, &mut subtables.ligature)
            }
            (lookup_type, format) => {
                warn!(
                    "skipping {:?} substitution subtable at 0x{:x} with unknown format {}",
                    lookup_type, subtable_address, format
                );
                Ok(())
            }
        }
    }
}

fn read_single_subst_format1(
    ctxt: &mut ReadCtxt<'_>,
    subtable_address: usize,
    records: &mut Vec<SingleSubstitution>,
) -> Result<(), ParseError> {
    let coverage_offset = usize::from(ctxt.read_u16be()?);
    let delta_glyph_id = ctxt.read_i16be()?;
    let glyphs = read_coverage_glyphs(ctxt, subtable_address + coverage_offset)?;
    records.extend(glyphs.into_iter().map(|glyph| SingleSubstitution {
        glyph,
        substitute_glyph: glyph.wrapping_add(delta_glyph_id as u16),
    }));
    Ok(())
}

fn read_single_subst_format2(
    ctxt: &mut ReadCtxt<'_>,
    subtable_address: usize,
    records: &mut Vec<SingleSubstitution>,
) -> Result<(), ParseError> {
    let coverage_offset = usize::from(ctxt.read_u16be()?);
    let glyph_count = usize::from(ctxt.read_u16be()?);
    let substitute_glyphs = ctxt.read_array::<U16Be>(glyph_count)?.to_vec();
    let glyphs = read_coverage_glyphs(ctxt, subtable_address + coverage_offset)?;
    ctxt.check_index(glyphs.len() <= substitute_glyphs.len())?;
    records.extend(
        glyphs
            .into_iter()
            .zip(substitute_glyphs)
            .map(|(glyph, substitute_glyph)| SingleSubstitution {
                glyph,
                substitute_glyph,
            }),
    );
    Ok(())
}

/// Read the coverage table and the parallel array of glyph sequences shared by multiple and
/// alternate substitution subtables.
fn read_glyph_sequences(
    ctxt: &mut ReadCtxt<'_>,
    subtable_address: usize,
) -> Result<Vec<(u16, Vec<u16>)>, ParseError> {
    let coverage_offset = usize::from(ctxt.read_u16be()?);
    let sequence_count = usize::from(ctxt.read_u16be()?);
    let sequence_addresses = read_offsets(ctxt, sequence_count, subtable_address)?;
    let glyphs = read_coverage_glyphs(ctxt, subtable_address + coverage_offset)?;
    ctxt.check_index(glyphs.len() <= sequence_addresses.len())?;

    glyphs
        .into_iter()
        .zip(sequence_addresses)
        .map(|(glyph, sequence_address)| {
            ctxt.seek(sequence_address)?;
            let glyph_count = usize::from(ctxt.read_u16be()?);
            let sequence = ctxt.read_array::<U16Be>(glyph_count)?.to_vec();
            Ok((glyph, sequence))
        })
        .collect()
}

fn read_ligature_subst(
    ctxt: &mut ReadCtxt<'_>,
    subtable_address: usize,
    records: &mut Vec<LigatureSubstitution>,
) -> Result<(), ParseError> {
    let coverage_offset = usize::from(ctxt.read_u16be()?);
    let ligature_set_count = usize::from(ctxt.read_u16be()?);
    let ligature_set_addresses = read_offsets(ctxt, ligature_set_count, subtable_address)?;
    let glyphs = read_coverage_glyphs(ctxt, subtable_address + coverage_offset)?;
    ctxt.check_index(glyphs.len() <= ligature_set_addresses.len())?;

    for (glyph, ligature_set_address) in glyphs.into_iter().zip(ligature_set_addresses) {
        ctxt.seek(ligature_set_address)?;
        let ligature_count = usize::from(ctxt.read_u16be()?);
        let ligature_addresses = read_offsets(ctxt, ligature_count, ligature_set_address)?;
        for ligature_address in ligature_addresses {
            ctxt.seek(ligature_address)?;
            let ligature_glyph = ctxt.read_u16be()?;
            let component_count = usize::from(ctxt.read_u16be()?);
            // The first component is implied by the coverage table
            let components = ctxt.read_array::<U16Be>(component_count.saturating_sub(1))?;
            records.push(LigatureSubstitution {
                component_glyphs: iter::once(glyph).chain(components.iter()).collect(),
                ligature_glyph,
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

    fn read_subtable(
        data: &[u8],
        lookup_type: SubstLookupType,
    ) -> Result<SubstSubtables, ParseError> {
        let mut subtables = SubstSubtables::default();
        let mut ctxt = ReadScope::new(data).ctxt();
        GSUB::read_subtable(&mut ctxt, lookup_type, 0, &mut subtables)?;
        Ok(subtables)
    }

    #[test]
    fn test_single_subst_format1_wraps() {
        let data = writer::convert(&[
            UInt16(1),
            UInt16(6), // coverage
            Int16(-2),
            // coverage @6
            UInt16(1),
            UInt16(2),
            UInt16(1),
            UInt16(10),
        ]);
        let subtables = read_subtable(&data, SubstLookupType::Single).unwrap();
        assert_eq!(
            subtables.single,
            vec![
                SingleSubstitution {
                    glyph: 1,
                    substitute_glyph: 0xFFFF
                },
                SingleSubstitution {
                    glyph: 10,
                    substitute_glyph: 8
                },
            ]
        );
    }

    #[test]
    fn test_single_subst_format2() {
        let data = writer::convert(&[
            UInt16(2),
            UInt16(12), // coverage
            UInt16(3),
            UInt16(100),
            UInt16(101),
            UInt16(102),
            // coverage @12
            UInt16(2),
            UInt16(1),
            UInt16(20),
            UInt16(22),
            UInt16(0),
        ]);
        let subtables = read_subtable(&data, SubstLookupType::Single).unwrap();
        let pairs = subtables
            .single
            .iter()
            .map(|s| (s.glyph, s.substitute_glyph))
            .collect::<Vec<_>>();
        assert_eq!(pairs, vec![(20, 100), (21, 101), (22, 102)]);
    }

    #[test]
    fn test_single_subst_format2_short_array() {
        let data = writer::convert(&[
            UInt16(2),
            UInt16(10), // coverage
            UInt16(2),
            UInt16(100),
            UInt16(101),
            // coverage @10
            UInt16(1),
            UInt16(3),
            UInt16(1),
            UInt16(2),
            UInt16(3),
        ]);
        assert_eq!(
            read_subtable(&data, SubstLookupType::Single).err(),
            Some(ParseError::BadIndex)
        );
    }

    #[test]
    fn test_multiple_subst() {
        let data = writer::convert(&[
            UInt16(1),
            UInt16(10), // coverage
            UInt16(2),
            UInt16(18),
            UInt16(24),
            // coverage @10
            UInt16(1),
            UInt16(2),
            UInt16(5),
            UInt16(6),
            // sequence @18
            UInt16(2),
            UInt16(50),
            UInt16(51),
            // sequence @24
            UInt16(0),
        ]);
        let subtables = read_subtable(&data, SubstLookupType::Multiple).unwrap();
        assert_eq!(
            subtables.multiple,
            vec![
                MultipleSubstitution {
                    glyph: 5,
                    substitute_glyphs: vec![50, 51]
                },
                MultipleSubstitution {
                    glyph: 6,
                    substitute_glyphs: vec![]
                },
            ]
        );
    }

    #[test]
    fn test_alternate_subst() {
        let data = writer::convert(&[
            UInt16(1),
            UInt16(8), // coverage
            UInt16(1),
            UInt16(14),
            // coverage @8
            UInt16(1),
            UInt16(1),
            UInt16(7),
            // alternate set @14
            UInt16(3),
            UInt16(70),
            UInt16(71),
            UInt16(72),
        ]);
        let subtables = read_subtable(&data, SubstLookupType::Alternate).unwrap();
        assert_eq!(
            subtables.alternate,
            vec![AlternateSubstitution {
                glyph: 7,
                alternate_glyphs: vec![70, 71, 72]
            }]
        );
    }

    #[test]
    fn test_ligature_subst() {
        let data = writer::convert(&[
            UInt16(1),
            UInt16(8), // coverage
            UInt16(1),
            UInt16(14),
            // coverage @8
            UInt16(1),
            UInt16(1),
            UInt16(30),
            // ligature set @14
            UInt16(2),
            UInt16(6),
            UInt16(14),
            // ligature @20: 30 31 32
            UInt16(300),
            UInt16(3),
            UInt16(31),
            UInt16(32),
            // ligature @28, zero components
            UInt16(301),
            UInt16(0),
        ]);
        let subtables = read_subtable(&data, SubstLookupType::Ligature).unwrap();
        assert_eq!(
            subtables.ligature,
            vec![
                LigatureSubstitution {
                    component_glyphs: vec![30, 31, 32],
                    ligature_glyph: 300
                },
                LigatureSubstitution {
                    component_glyphs: vec![30],
                    ligature_glyph: 301
                },
            ]
        );
    }

    #[test]
    fn test_unknown_format_skipped() {
        let data = writer::convert(&[UInt16(3), UInt16(0), UInt16(0)]);
        let subtables = read_subtable(&data, SubstLookupType::Single).unwrap();
        assert!(subtables.single.is_empty());
    }

    #[test]
    fn test_context_subst_not_visited() {
        let subtables = read_subtable(&[], SubstLookupType::Context).unwrap();
        assert!(subtables.single.is_empty());
        assert_eq!(GSUB::check_lookup_type(7), None);
        assert_eq!(GSUB::check_lookup_type(4), Some(SubstLookupType::Ligature));
    }
}
