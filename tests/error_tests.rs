//! Tests for the error taxonomy.

use polyjson::{Error, Kind, ParseCode};

#[test]
fn test_parse_code_display() {
    assert_eq!(
        format!("{}", ParseCode::UnexpectedEof),
        "unexpected end of input"
    );
    assert_eq!(format!("{}", ParseCode::SyntaxError), "syntax error");
    assert_eq!(
        format!("{}", ParseCode::MaxNestingDepthExceeded),
        "maximum nesting depth exceeded"
    );
    assert_eq!(
        format!("{}", ParseCode::UnknownTypeTag(0xc1)),
        "unknown type tag: 0xc1"
    );
}

#[test]
fn test_parse_error_display_with_position() {
    let text_error = Error::Parse {
        code: ParseCode::SyntaxError,
        line: 3,
        column: 14,
        offset: 52,
    };
    assert_eq!(format!("{text_error}"), "syntax error at line 3 column 14");

    let binary_error = Error::Parse {
        code: ParseCode::UnexpectedEof,
        line: 0,
        column: 0,
        offset: 17,
    };
    assert_eq!(
        format!("{binary_error}"),
        "unexpected end of input at offset 17"
    );
}

#[test]
fn test_access_error_display() {
    assert_eq!(
        format!("{}", Error::KeyNotFound("name".to_string())),
        "key not found: \"name\""
    );
    assert_eq!(
        format!("{}", Error::IndexOutOfRange(9)),
        "index out of range: 9"
    );
    assert_eq!(
        format!(
            "{}",
            Error::TypeMismatch {
                expected: Kind::Array,
                found: Kind::Int64,
            }
        ),
        "type mismatch: expected array, found int64"
    );
    assert_eq!(
        format!("{}", Error::TrailingData(4)),
        "trailing data after end of document: 4 bytes remaining"
    );
}

#[test]
fn test_parse_code_accessor() {
    let error = Error::Parse {
        code: ParseCode::IllegalUtf8,
        line: 1,
        column: 2,
        offset: 1,
    };
    assert_eq!(error.parse_code(), Some(ParseCode::IllegalUtf8));
    assert_eq!(Error::NumberOutOfRange.parse_code(), None);
}

#[test]
fn test_error_is_std_error() {
    fn assert_error<E: std::error::Error>() {}
    assert_error::<Error>();
}
