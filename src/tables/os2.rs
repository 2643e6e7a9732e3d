use crate::binary::read::{ReadBinary, ReadCtxt};
use crate::error::ParseError;

/// `OS/2` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/os2>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Os2 {
    pub version: u16,
    pub x_avg_char_width: i16,
    pub us_weight_class: u16,
    pub us_width_class: u16,
    pub fs_type: u16,
    pub y_subscript_x_size: i16,
    pub y_subscript_y_size: i16,
    pub y_subscript_x_offset: i16,
    pub y_subscript_y_offset: i16,
    pub y_superscript_x_size: i16,
    pub y_superscript_y_size: i16,
    pub y_superscript_x_offset: i16,
    pub y_superscript_y_offset: i16,
    pub y_strikeout_size: i16,
    pub y_strikeout_position: i16,
    pub s_family_class: i16,
    pub panose: [u8; 10],
    pub ul_unicode_range1: u32,
    pub ul_unicode_range2: u32,
    pub ul_unicode_range3: u32,
    pub ul_unicode_range4: u32,
    pub ach_vend_id: u32, // tag
    pub fs_selection: u16,
    pub us_first_char_index: u16,
    pub us_last_char_index: u16,

    // Apple's definition of version 0 stops at usLastCharIndex, so legacy fonts may omit the
    // typographic metrics.
    pub s_typo_ascender: Option<i16>,
    pub s_typo_descender: Option<i16>,
    pub s_typo_line_gap: Option<i16>,
    pub us_win_ascent: Option<u16>,
    pub us_win_descent: Option<u16>,
    pub extra: Version,
}

/// Fields added by later versions of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Version {
    Version0,
    Version1 {
        ul_code_page_range1: u32,
        ul_code_page_range2: u32,
    },
    Version2to4 {
        ul_code_page_range1: u32,
        ul_code_page_range2: u32,
        sx_height: i16,
        s_cap_height: i16,
        us_default_char: u16,
        us_break_char: u16,
        us_max_context: u16,
    },
    Version5 {
        ul_code_page_range1: u32,
        ul_code_page_range2: u32,
        sx_height: i16,
        s_cap_height: i16,
        us_default_char: u16,
        us_break_char: u16,
        us_max_context: u16,
        us_lower_optical_point_size: u16,
        us_upper_optical_point_size: u16,
    },
}

impl ReadBinary for Os2 {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version <= 5)?;
        let x_avg_char_width = ctxt.read_i16be()?;
        let us_weight_class = ctxt.read_u16be()?;
        let us_width_class = ctxt.read_u16be()?;
        let fs_type = ctxt.read_u16be()?;
        let y_subscript_x_size = ctxt.read_i16be()?;
        let y_subscript_y_size = ctxt.read_i16be()?;
        let y_subscript_x_offset = ctxt.read_i16be()?;
        let y_subscript_y_offset = ctxt.read_i16be()?;
        let y_superscript_x_size = ctxt.read_i16be()?;
        let y_superscript_y_size = ctxt.read_i16be()?;
        let y_superscript_x_offset = ctxt.read_i16be()?;
        let y_superscript_y_offset = ctxt.read_i16be()?;
        let y_strikeout_size = ctxt.read_i16be()?;
        let y_strikeout_position = ctxt.read_i16be()?;
        let s_family_class = ctxt.read_i16be()?;
        let mut panose = [0; 10];
        for byte in panose.iter_mut() {
            *byte = ctxt.read_u8()?;
        }
        let ul_unicode_range1 = ctxt.read_u32be()?;
        let ul_unicode_range2 = ctxt.read_u32be()?;
        let ul_unicode_range3 = ctxt.read_u32be()?;
        let ul_unicode_range4 = ctxt.read_u32be()?;
        let ach_vend_id = ctxt.read_u32be()?;
        let fs_selection = ctxt.read_u16be()?;
        let us_first_char_index = ctxt.read_u16be()?;
        let us_last_char_index = ctxt.read_u16be()?;

        let (s_typo_ascender, s_typo_descender, s_typo_line_gap, us_win_ascent, us_win_descent) =
            if version == 0 && !ctxt.bytes_available() {
                (None, None, None, None, None)
            } else {
                (
                    Some(ctxt.read_i16be()?),
                    Some(ctxt.read_i16be()?),
                    Some(ctxt.read_i16be()?),
                    Some(ctxt.read_u16be()?),
                    Some(ctxt.read_u16be()?),
                )
            };

        let extra = match version {
            0 => Version::Version0,
            _ => {
                let ul_code_page_range1 = ctxt.read_u32be()?;
                let ul_code_page_range2 = ctxt.read_u32be()?;
                if version == 1 {
                    Version::Version1 {
                        ul_code_page_range1,
                        ul_code_page_range2,
                    }
                } else {
                    let sx_height = ctxt.read_i16be()?;
                    let s_cap_height = ctxt.read_i16be()?;
                    let us_default_char = ctxt.read_u16be()?;
                    let us_break_char = ctxt.read_u16be()?;
                    let us_max_context = ctxt.read_u16be()?;
                    if version < 5 {
                        Version::Version2to4 {
                            ul_code_page_range1,
                            ul_code_page_range2,
                            sx_height,
                            s_cap_height,
                            us_default_char,
                            us_break_char,
                            us_max_context,
                        }
                    } else {
                        Version::Version5 {
                            ul_code_page_range1,
                            ul_code_page_range2,
                            sx_height,
                            s_cap_height,
                            us_default_char,
                            us_break_char,
                            us_max_context,
                            us_lower_optical_point_size: ctxt.read_u16be()?,
                            us_upper_optical_point_size: ctxt.read_u16be()?,
                        }
                    }
                }
            }
        };

        Ok(Os2 {
            version,
            x_avg_char_width,
            us_weight_class,
            us_width_class,
            fs_type,
            y_subscript_x_size,
            y_subscript_y_size,
            y_subscript_x_offset,
            y_subscript_y_offset,
            y_superscript_x_size,
            y_superscript_y_size,
            y_superscript_x_offset,
            y_superscript_y_offset,
            y_strikeout_size,
            y_strikeout_position,
            s_family_class,
            panose,
            ul_unicode_range1,
            ul_unicode_range2,
            ul_unicode_range3,
            ul_unicode_range4,
            ach_vend_id,
            fs_selection,
            us_first_char_index,
            us_last_char_index,
            s_typo_ascender,
            s_typo_descender,
            s_typo_line_gap,
            us_win_ascent,
            us_win_descent,
            extra,
        })
    }
}

impl Os2 {
    /// Code page ranges, present from version 1.
    pub fn code_page_ranges(&self) -> Option<(u32, u32)> {
        match self.extra {
            Version::Version0 => None,
            Version::Version1 {
                ul_code_page_range1,
                ul_code_page_range2,
            }
            | Version::Version2to4 {
                ul_code_page_range1,
                ul_code_page_range2,
                ..
            }
            | Version::Version5 {
                ul_code_page_range1,
                ul_code_page_range2,
                ..
            } => Some((ul_code_page_range1, ul_code_page_range2)),
        }
    }
}
