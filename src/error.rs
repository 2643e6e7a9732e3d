//! Error types

use crate::binary::read::ReadEof;
use crate::tag::DisplayTag;
use std::fmt;

/// Errors that originate when parsing binary data
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ParseError {
    BadEof,
    BadValue,
    BadVersion,
    BadOffset,
    BadIndex,
    MissingValue,
    MissingTable(u32),
    /// A recognised subtable format that this crate does not decode.
    ///
    /// Raised for `mort` non-contextual substitution subtables that are not format 6. Unlike the
    /// structural errors it is never recovered from by skipping the table.
    UnsupportedFormat(u16),
    /// A collection-only operation was invoked on data that is not a TrueType Collection.
    NotCollection,
}

impl ParseError {
    /// Returns `true` for errors describing malformed data, as opposed to data this crate
    /// deliberately does not handle.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ParseError::BadEof
                | ParseError::BadValue
                | ParseError::BadVersion
                | ParseError::BadOffset
                | ParseError::BadIndex
        )
    }
}

impl From<ReadEof> for ParseError {
    fn from(_error: ReadEof) -> Self {
        ParseError::BadEof
    }
}

impl From<std::num::TryFromIntError> for ParseError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        ParseError::BadValue
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BadEof => write!(f, "end of data reached unexpectedly"),
            ParseError::BadValue => write!(f, "invalid value"),
            ParseError::BadVersion => write!(f, "unexpected data version"),
            ParseError::BadOffset => write!(f, "invalid data offset"),
            ParseError::BadIndex => write!(f, "invalid data index"),
            ParseError::MissingValue => write!(f, "an expected data value was missing"),
            ParseError::MissingTable(tag) => {
                write!(f, "font is missing '{}' table", DisplayTag(*tag))
            }
            ParseError::UnsupportedFormat(format) => {
                write!(f, "subtable format {} is not supported", format)
            }
            ParseError::NotCollection => write!(f, "data is not a font collection"),
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag;

    #[test]
    fn test_display_missing_table() {
        assert_eq!(
            ParseError::MissingTable(tag::HEAD).to_string(),
            "font is missing 'head' table"
        );
    }

    #[test]
    fn test_unsupported_is_not_structural() {
        assert!(ParseError::BadOffset.is_structural());
        assert!(!ParseError::UnsupportedFormat(4).is_structural());
        assert!(!ParseError::NotCollection.is_structural());
    }
}
