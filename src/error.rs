//! Error types for parsing, encoding and value access.
//!
//! The closed [`ParseCode`] taxonomy covers everything a format parser can
//! report; [`Error`] adds access and conversion failures on top. Parsers
//! keep their failure position queryable after the fact, and the position is
//! also folded into the [`Error::Parse`] variant they return.

use std::fmt::{self, Display};

use crate::Kind;

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The closed set of parse failure codes shared by every format parser.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParseCode {
    /// The input ended in the middle of a document.
    UnexpectedEof,
    /// The underlying byte source failed.
    SourceError,
    /// The input violates the format's grammar.
    SyntaxError,
    /// A string contains an invalid escape sequence.
    InvalidEscape,
    /// A string is not valid UTF-8.
    IllegalUtf8,
    /// A number literal is too large for the configured representation.
    NumberTooLarge,
    /// Container nesting exceeds the configured maximum depth.
    MaxNestingDepthExceeded,
    /// A container holds more items than its header declared, or more than
    /// the configured limit.
    TooManyItems,
    /// A container ended before the number of items its header declared.
    TooFewItems,
    /// An unknown type marker was encountered.
    UnknownTypeTag(u8),
}

impl ParseCode {
    pub const fn message(self) -> &'static str {
        match self {
            ParseCode::UnexpectedEof => "unexpected end of input",
            ParseCode::SourceError => "error reading from source",
            ParseCode::SyntaxError => "syntax error",
            ParseCode::InvalidEscape => "invalid escape sequence",
            ParseCode::IllegalUtf8 => "illegal UTF-8 in string",
            ParseCode::NumberTooLarge => "number too large",
            ParseCode::MaxNestingDepthExceeded => "maximum nesting depth exceeded",
            ParseCode::TooManyItems => "too many items in container",
            ParseCode::TooFewItems => "too few items in container",
            ParseCode::UnknownTypeTag(_) => "unknown type tag",
        }
    }
}

impl Display for ParseCode {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseCode::UnknownTypeTag(tag) => {
                write!(formatter, "unknown type tag: {tag:#04x}")
            }
            _ => formatter.write_str(self.message()),
        }
    }
}

/// This type represents all possible errors that can occur when parsing,
/// encoding or accessing document values.
#[derive(Debug)]
pub enum Error {
    Message(String),

    /// An I/O error occurred while writing to a sink.
    IO(std::io::Error),

    /// A format parser failed.
    ///
    /// `line` and `column` are 1-based and only meaningful for text formats;
    /// binary parsers report zero for both and identify the failure through
    /// `offset`, the count of bytes consumed.
    Parse {
        code: ParseCode,
        line: u64,
        column: u64,
        offset: u64,
    },

    /// `at` was called with a key the object does not contain.
    KeyNotFound(String),

    /// `at_index` was called with an index past the end of the array.
    IndexOutOfRange(usize),

    /// The value does not have the kind an accessor requires.
    TypeMismatch { expected: Kind, found: Kind },

    /// A numeric conversion would overflow the requested type.
    NumberOutOfRange,

    /// Object keys must be strings in every supported format.
    KeyMustBeString,

    /// Extra bytes remain after the end of a complete document.
    TrailingData(usize),
}

impl Error {
    /// The parse code, if this error came from a format parser.
    pub fn parse_code(&self) -> Option<ParseCode> {
        match self {
            Error::Parse { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(feature = "serde")]
impl serde::ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Message(message) => formatter.write_str(message),
            Error::IO(error) => formatter.write_str(&error.to_string()),
            Error::Parse {
                code,
                line,
                column,
                offset,
            } => {
                if *line > 0 {
                    write!(formatter, "{code} at line {line} column {column}")
                } else {
                    write!(formatter, "{code} at offset {offset}")
                }
            }
            Error::KeyNotFound(key) => write!(formatter, "key not found: {key:?}"),
            Error::IndexOutOfRange(index) => {
                write!(formatter, "index out of range: {index}")
            }
            Error::TypeMismatch { expected, found } => write!(
                formatter,
                "type mismatch: expected {}, found {}",
                expected.description(),
                found.description()
            ),
            Error::NumberOutOfRange => {
                formatter.write_str("number out of range for requested type")
            }
            Error::KeyMustBeString => formatter.write_str("object key must be a string"),
            Error::TrailingData(remaining_bytes) => write!(
                formatter,
                "trailing data after end of document: {remaining_bytes} bytes remaining"
            ),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IO(error)
    }
}
