#![warn(rust_2018_idioms)]

//! Reading of the OpenType `GSUB` and `GPOS` tables and the AAT `mort` table, and construction
//! of the lookup maps used for Japanese typesetting: vertical alternates, ligatures,
//! proportional and half-width metrics, and kerning.
//!
//! ```no_run
//! use fontlayout::font_info::FontInfo;
//!
//! # fn main() -> Result<(), fontlayout::error::ParseError> {
//! let data = std::fs::read("font.ttf").expect("unable to read font");
//! let info = FontInfo::read(&data)?;
//! let vertical = info.vertical_glyph_converter();
//! let glyph = vertical.convert(42);
//! # let _ = glyph;
//! # Ok(())
//! # }
//! ```

pub mod adjustment;
/// Reading of binary data.
pub mod binary;
pub mod error;
pub mod font_info;
pub mod glyph_converter;
pub mod gpos;
pub mod gsub;
pub mod layout;
pub mod size;
pub mod tables;
pub mod tag;
