//! sfnt container parsing: the table directory, TrueType Collections and the header tables
//! needed alongside the layout tables.

pub mod aat;
pub mod mort;
pub mod os2;

use crate::binary::read::{CheckIndex, ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, I32Be, I64Be, U16Be, U32Be};
use crate::error::ParseError;
use crate::size;
use crate::tag;

use std::borrow::Cow;
use std::convert::TryFrom;

/// Magic value identifying a CFF font (`OTTO`)
pub const CFF_MAGIC: u32 = tag::OTTO;

/// Magic number identifying TrueType 1.0
///
/// The version number 1.0 as a 16.16 fixed-point value, indicating TrueType glyph data.
pub const TTF_MAGIC: u32 = 0x00010000;

/// Magic value used by some Apple TrueType fonts (`true`)
pub const APPLE_TRUE_MAGIC: u32 = tag::TRUE;

/// Magic value identifying a TrueType font collection `ttcf`
pub const TTCF_MAGIC: u32 = tag::TTCF;

/// Value of the `magicNumber` field of the `head` table
const HEAD_MAGIC: u32 = 0x5F0F3CF5;

/// Date represented in number of seconds since 12:00 midnight, January 1, 1904
///
/// The value is represented as a signed 64-bit integer.
type LongDateTime = i64;

pub trait FontTableProvider {
    /// Return data for the specified table if present
    fn table_data<'a>(&'a self, tag: u32) -> Result<Option<Cow<'a, [u8]>>, ParseError>;

    fn has_table(&self, tag: u32) -> bool;

    fn read_table_data<'a>(&'a self, tag: u32) -> Result<Cow<'a, [u8]>, ParseError> {
        self.table_data(tag)?.ok_or(ParseError::MissingTable(tag))
    }
}

pub struct OpenTypeFont<'a> {
    pub scope: ReadScope<'a>,
    pub data: OpenTypeData<'a>,
}

/// An OpenTypeFont containing a single font or a collection of fonts
pub enum OpenTypeData<'a> {
    Single(OffsetTable<'a>),
    Collection(TTCHeader<'a>),
}

/// TrueType collection header
pub struct TTCHeader<'a> {
    pub major_version: u16,
    pub minor_version: u16,
    pub offset_tables: ReadArray<'a, U32Be>,
}

/// OpenType Offset Table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/otff#organization-of-an-opentype-font>
#[derive(Clone)]
pub struct OffsetTable<'a> {
    pub sfnt_version: u32,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
    pub table_records: ReadArray<'a, TableRecord>,
}

pub struct OffsetTableFontProvider<'a> {
    scope: ReadScope<'a>,
    offset_table: Cow<'a, OffsetTable<'a>>,
}

/// An entry in the Offset Table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/otff#organization-of-an-opentype-font>
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TableRecord {
    pub table_tag: u32,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// 32-bit signed fixed-point number (16.16)
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Fixed(i32);

/// `head` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/head>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeadTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub font_revision: Fixed,
    pub check_sum_adjustment: u32,
    pub magic_number: u32,
    pub flags: u16,
    pub units_per_em: u16,
    pub created: LongDateTime,
    pub modified: LongDateTime,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    pub font_direction_hint: i16,
    pub index_to_loc_format: i16,
    pub glyph_data_format: i16,
}

/// `hhea` horizontal header table
///
/// > This table contains information for horizontal layout.
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/hhea>
///
/// This struct is also used for the `vhea` table, in which case the fields hold the vertical
/// counterparts (advance height max, min top/bottom side bearing, y max extent, number of
/// vertical metrics).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HheaTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
    pub num_h_metrics: u16,
}

impl<'a> OpenTypeFont<'a> {
    /// Number of fonts in this file: the collection size, or 1 for a single font.
    pub fn num_fonts(&self) -> usize {
        match &self.data {
            OpenTypeData::Single(_) => 1,
            OpenTypeData::Collection(ttc) => ttc.offset_tables.len(),
        }
    }

    pub fn table_provider(
        &'a self,
        index: usize,
    ) -> Result<OffsetTableFontProvider<'a>, ParseError> {
        match &self.data {
            OpenTypeData::Single(offset_table) => Ok(OffsetTableFontProvider {
                offset_table: Cow::Borrowed(offset_table),
                scope: self.scope,
            }),
            OpenTypeData::Collection(ttc) => ttc
                .offset_tables
                .check_index(index)
                .and_then(|()| ttc.offset_tables.read_item(index))
                .and_then(|offset| usize::try_from(offset).map_err(ParseError::from))
                .and_then(|offset| self.scope.offset(offset).read::<OffsetTable<'_>>())
                .map(|offset_table| OffsetTableFontProvider {
                    offset_table: Cow::Owned(offset_table),
                    scope: self.scope,
                }),
        }
    }
}

impl ReadBinary for OpenTypeFont<'_> {
    type HostType<'a> = OpenTypeFont<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let mut peek = ctxt.clone();
        let magic = peek.read_u32be()?;
        match magic {
            TTF_MAGIC | CFF_MAGIC | APPLE_TRUE_MAGIC => {
                let offset_table = ctxt.read::<OffsetTable<'_>>()?;
                let font = OpenTypeData::Single(offset_table);
                Ok(OpenTypeFont { scope, data: font })
            }
            TTCF_MAGIC => {
                let ttc_header = ctxt.read::<TTCHeader<'_>>()?;
                let font = OpenTypeData::Collection(ttc_header);
                Ok(OpenTypeFont { scope, data: font })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl ReadBinary for TTCHeader<'_> {
    type HostType<'a> = TTCHeader<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let ttc_tag = ctxt.read_u32be()?;
        match ttc_tag {
            TTCF_MAGIC => {
                let major_version = ctxt.read_u16be()?;
                let minor_version = ctxt.read_u16be()?;
                ctxt.check(major_version == 1 || major_version == 2)?;
                let num_fonts = usize::try_from(ctxt.read_u32be()?)?;
                let offset_tables = ctxt.read_array::<U32Be>(num_fonts)?;
                Ok(TTCHeader {
                    major_version,
                    minor_version,
                    offset_tables,
                })
            }
            _ => Err(ParseError::NotCollection),
        }
    }
}

impl ReadBinary for OffsetTable<'_> {
    type HostType<'a> = OffsetTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let sfnt_version = ctxt.read_u32be()?;
        match sfnt_version {
            TTF_MAGIC | CFF_MAGIC | APPLE_TRUE_MAGIC => {
                let num_tables = ctxt.read_u16be()?;
                let search_range = ctxt.read_u16be()?;
                let entry_selector = ctxt.read_u16be()?;
                let range_shift = ctxt.read_u16be()?;
                let table_records = ctxt.read_array::<TableRecord>(usize::from(num_tables))?;
                Ok(OffsetTable {
                    sfnt_version,
                    search_range,
                    entry_selector,
                    range_shift,
                    table_records,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl<'a> FontTableProvider for OffsetTableFontProvider<'a> {
    fn table_data<'b>(&'b self, tag: u32) -> Result<Option<Cow<'b, [u8]>>, ParseError> {
        self.offset_table
            .read_table(&self.scope, tag)
            .map(|scope| scope.map(|scope| Cow::Borrowed(scope.data())))
    }

    fn has_table(&self, tag: u32) -> bool {
        self.offset_table.find_table_record(tag).is_some()
    }
}

impl<T: FontTableProvider> FontTableProvider for Box<T> {
    fn table_data<'a>(&'a self, tag: u32) -> Result<Option<Cow<'a, [u8]>>, ParseError> {
        self.as_ref().table_data(tag)
    }

    fn has_table(&self, tag: u32) -> bool {
        self.as_ref().has_table(tag)
    }
}

impl ReadFrom for TableRecord {
    type ReadType = (U32Be, U32Be, U32Be, U32Be);

    fn read_from((table_tag, checksum, offset, length): (u32, u32, u32, u32)) -> Self {
        TableRecord {
            table_tag,
            checksum,
            offset,
            length,
        }
    }
}

impl<'a> OffsetTable<'a> {
    /// Find the directory entry for `tag`, the first one wins if it is listed twice.
    pub fn find_table_record(&self, tag: u32) -> Option<TableRecord> {
        self.table_records
            .iter()
            .find(|table_record| table_record.table_tag == tag)
    }

    pub fn read_table(
        &self,
        scope: &ReadScope<'a>,
        tag: u32,
    ) -> Result<Option<ReadScope<'a>>, ParseError> {
        if let Some(table_record) = self.find_table_record(tag) {
            let table = table_record.read_table(scope)?;
            Ok(Some(table))
        } else {
            Ok(None)
        }
    }
}

impl TableRecord {
    pub const SIZE: usize = 4 * size::U32;

    pub fn read_table<'a>(&self, scope: &ReadScope<'a>) -> Result<ReadScope<'a>, ParseError> {
        let offset = usize::try_from(self.offset)?;
        let length = usize::try_from(self.length)?;
        scope.offset_length(offset, length)
    }
}

impl ReadFrom for Fixed {
    type ReadType = I32Be;

    fn read_from(value: i32) -> Self {
        Fixed(value)
    }
}

impl From<Fixed> for f32 {
    fn from(value: Fixed) -> f32 {
        value.0 as f32 / 65536.0
    }
}

impl ReadBinary for HeadTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let major_version = ctxt.read::<U16Be>()?;
        let minor_version = ctxt.read::<U16Be>()?;
        let font_revision = ctxt.read::<Fixed>()?;
        let check_sum_adjustment = ctxt.read::<U32Be>()?;
        let magic_number = ctxt.read::<U32Be>()?;
        ctxt.check(magic_number == HEAD_MAGIC)?;
        let flags = ctxt.read::<U16Be>()?;
        let units_per_em = ctxt.read::<U16Be>()?;
        // Everything downstream divides by this
        ctxt.check(units_per_em != 0)?;
        let created = ctxt.read::<I64Be>()?;
        let modified = ctxt.read::<I64Be>()?;
        let x_min = ctxt.read::<I16Be>()?;
        let y_min = ctxt.read::<I16Be>()?;
        let x_max = ctxt.read::<I16Be>()?;
        let y_max = ctxt.read::<I16Be>()?;
        let mac_style = ctxt.read::<U16Be>()?;
        let lowest_rec_ppem = ctxt.read::<U16Be>()?;
        let font_direction_hint = ctxt.read::<I16Be>()?;
        let index_to_loc_format = ctxt.read::<I16Be>()?;
        let glyph_data_format = ctxt.read::<I16Be>()?;

        Ok(HeadTable {
            major_version,
            minor_version,
            font_revision,
            check_sum_adjustment,
            magic_number,
            flags,
            units_per_em,
            created,
            modified,
            x_min,
            y_min,
            x_max,
            y_max,
            mac_style,
            lowest_rec_ppem,
            font_direction_hint,
            index_to_loc_format,
            glyph_data_format,
        })
    }
}

impl ReadBinary for HheaTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let major_version = ctxt.read_u16be()?;
        let minor_version = ctxt.read_u16be()?;
        // vhea version 1.1 is stored as 0x00011000
        ctxt.check_version(major_version == 1)?;
        let ascender = ctxt.read_i16be()?;
        let descender = ctxt.read_i16be()?;
        let line_gap = ctxt.read_i16be()?;
        let advance_width_max = ctxt.read_u16be()?;
        let min_left_side_bearing = ctxt.read_i16be()?;
        let min_right_side_bearing = ctxt.read_i16be()?;
        let x_max_extent = ctxt.read_i16be()?;
        let caret_slope_rise = ctxt.read_i16be()?;
        let caret_slope_run = ctxt.read_i16be()?;
        let caret_offset = ctxt.read_i16be()?;
        let _reserved1 = ctxt.read_i16be()?;
        let _reserved2 = ctxt.read_i16be()?;
        let _reserved3 = ctxt.read_i16be()?;
        let _reserved4 = ctxt.read_i16be()?;
        let metric_data_format = ctxt.read_i16be()?;
        ctxt.check(metric_data_format == 0)?;
        let num_h_metrics = ctxt.read_u16be()?;

        Ok(HheaTable {
            major_version,
            minor_version,
            ascender,
            descender,
            line_gap,
            advance_width_max,
            min_left_side_bearing,
            min_right_side_bearing,
            x_max_extent,
            caret_slope_rise,
            caret_slope_run,
            caret_offset,
            num_h_metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::writer::{self, TtfType::*};

    fn head_data(units_per_em: u16) -> Vec<u8> {
        writer::convert(&[
            UInt16(1),          // major version
            UInt16(0),          // minor version
            Int32(0x0001_0000), // font revision
            UInt32(0),          // checksum adjustment
            UInt32(HEAD_MAGIC), // magic number
            UInt16(0x000B),     // flags
            UInt16(units_per_em),
            Int32(0), // created
            Int32(0),
            Int32(0), // modified
            Int32(0),
            Int16(-100), // x min
            Int16(-200), // y min
            Int16(900),  // x max
            Int16(800),  // y max
            UInt16(2),   // mac style
            UInt16(8),   // lowest rec ppem
            Int16(2),    // font direction hint
            Int16(0),    // index to loc format
            Int16(0),    // glyph data format
        ])
    }

    #[test]
    fn test_read_head_table() {
        let data = head_data(1000);
        let head = ReadScope::new(&data).read::<HeadTable>().unwrap();
        assert_eq!(head.units_per_em, 1000);
        assert_eq!(head.x_min, -100);
        assert_eq!(head.y_max, 800);
        assert_eq!(f32::from(head.font_revision), 1.0);
        assert_eq!(head.mac_style, 2);
    }

    #[test]
    fn test_read_head_table_bad_magic() {
        let mut data = head_data(1000);
        data[12] = 0;
        assert_eq!(
            ReadScope::new(&data).read::<HeadTable>().err(),
            Some(ParseError::BadValue)
        );
    }

    #[test]
    fn test_read_head_table_zero_units_per_em() {
        let data = head_data(0);
        assert!(ReadScope::new(&data).read::<HeadTable>().is_err());
    }

    #[test]
    fn test_read_vhea_as_hhea() {
        let data = writer::convert(&[
            UInt16(1),
            UInt16(0x1000), // version 1.1
            Int16(500),     // vert typo ascender
            Int16(-500),    // vert typo descender
            Int16(0),       // vert typo line gap
            UInt16(1000),   // advance height max
            Int16(10),      // min top side bearing
            Int16(20),      // min bottom side bearing
            Int16(990),     // y max extent
            Int16(0),       // caret slope rise
            Int16(1),       // caret slope run
            Int16(0),       // caret offset
            Int16(0),
            Int16(0),
            Int16(0),
            Int16(0),
            Int16(0),  // metric data format
            UInt16(4), // num of long ver metrics
        ]);
        let vhea = ReadScope::new(&data).read::<HheaTable>().unwrap();
        assert_eq!(vhea.minor_version, 0x1000);
        assert_eq!(vhea.advance_width_max, 1000);
        assert_eq!(vhea.x_max_extent, 990);
        assert_eq!(vhea.num_h_metrics, 4);
    }

    #[test]
    fn test_find_table_record() {
        let data = writer::convert(&[
            TrueTypeMagic,
            UInt16(2), // num tables
            UInt16(32),
            UInt16(1),
            UInt16(0),
            UInt32(tag::GSUB),
            UInt32(0),
            UInt32(44),
            UInt32(2),
            UInt32(tag::HEAD),
            UInt32(0),
            UInt32(46),
            UInt32(2),
            Raw(&[1, 2, 3, 4]),
        ]);
        let scope = ReadScope::new(&data);
        let font = scope.read::<OpenTypeFont<'_>>().unwrap();
        assert_eq!(font.num_fonts(), 1);
        let provider = font.table_provider(0).unwrap();
        assert!(provider.has_table(tag::GSUB));
        assert!(!provider.has_table(tag::MORT));
        assert_eq!(provider.table_data(tag::HEAD).unwrap().as_deref(), Some(&[3, 4][..]));
        assert_eq!(provider.table_data(tag::GPOS).unwrap(), None);
        assert_eq!(
            provider.read_table_data(tag::GPOS).err(),
            Some(ParseError::MissingTable(tag::GPOS))
        );
    }

    #[test]
    fn test_table_record_out_of_bounds() {
        let data = writer::convert(&[
            TrueTypeMagic,
            UInt16(1),
            UInt16(16),
            UInt16(0),
            UInt16(0),
            UInt32(tag::GSUB),
            UInt32(0),
            UInt32(28),
            UInt32(100),
        ]);
        let font = ReadScope::new(&data).read::<OpenTypeFont<'_>>().unwrap();
        let provider = font.table_provider(0).unwrap();
        assert!(provider.table_data(tag::GSUB).is_err());
    }

    #[test]
    fn test_unknown_sfnt_version() {
        let data = writer::convert(&[UInt32(0x1234_5678), UInt16(0)]);
        assert_eq!(
            ReadScope::new(&data).read::<OpenTypeFont<'_>>().err(),
            Some(ParseError::BadVersion)
        );
    }

    #[test]
    fn test_ttc_header() {
        let data = writer::convert(&[
            FontCollectionMagic,
            UInt16(1),
            UInt16(0),
            UInt32(2),
            UInt32(20),
            UInt32(40),
        ]);
        let ttc = ReadScope::new(&data).read::<TTCHeader<'_>>().unwrap();
        assert_eq!(ttc.offset_tables.to_vec(), vec![20, 40]);

        let font = ReadScope::new(&data).read::<OpenTypeFont<'_>>().unwrap();
        assert_eq!(font.num_fonts(), 2);
        assert_eq!(font.table_provider(2).err(), Some(ParseError::BadIndex));
    }

    #[test]
    fn test_ttc_header_not_collection() {
        let data = writer::convert(&[TrueTypeMagic, UInt16(0), UInt16(0), UInt32(0)]);
        assert_eq!(
            ReadScope::new(&data).read::<TTCHeader<'_>>().err(),
            Some(ParseError::NotCollection)
        );
    }
}
