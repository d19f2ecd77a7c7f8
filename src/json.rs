//! Text JSON (RFC 8259): incremental parser and encoder plus one-shot
//! convenience functions.

use std::io::Write;

use crate::builder::ValueBuilder;
use crate::visit::{EventSource, dump, visit};
use crate::{Error, Result, Value};

mod encoder;
mod parser;

pub use encoder::{ByteStringFormat, Indent, JsonEncodeOptions, JsonEncoder};
pub use parser::{JsonParseOptions, JsonParser};

/// Parses a complete JSON document from a string.
pub fn from_str(text: &str) -> Result<Value> {
    from_slice(text.as_bytes())
}

pub fn from_str_with_options(text: &str, options: &JsonParseOptions) -> Result<Value> {
    from_slice_with_options(text.as_bytes(), options)
}

/// Parses a complete JSON document from a byte slice.
pub fn from_slice(data: &[u8]) -> Result<Value> {
    from_slice_with_options(data, &JsonParseOptions::default())
}

pub fn from_slice_with_options(data: &[u8], options: &JsonParseOptions) -> Result<Value> {
    let mut parser = JsonParser::with_options(options.clone());
    parser.update(data);
    parser.finish();
    let mut builder = ValueBuilder::new();
    visit(&mut parser, &mut builder)?;
    builder
        .take()
        .ok_or_else(|| Error::Message("incomplete document".to_string()))
}

/// Encodes as compact JSON text.
pub fn to_string(value: &Value) -> Result<String> {
    let bytes = to_vec(value)?;
    // SAFETY: the encoder only ever writes valid UTF-8.
    Ok(unsafe { String::from_utf8_unchecked(bytes) })
}

/// Encodes as pretty-printed JSON text.
pub fn to_string_pretty(value: &Value) -> Result<String> {
    let bytes = to_vec_with_options(value, &JsonEncodeOptions::pretty())?;
    // SAFETY: the encoder only ever writes valid UTF-8.
    Ok(unsafe { String::from_utf8_unchecked(bytes) })
}

pub fn to_vec(value: &Value) -> Result<Vec<u8>> {
    to_vec_with_options(value, &JsonEncodeOptions::default())
}

pub fn to_vec_with_options(value: &Value, options: &JsonEncodeOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut encoder = JsonEncoder::with_options(&mut out, options.clone());
    dump(value, &mut encoder)?;
    Ok(out)
}

pub fn to_writer<W: Write>(writer: W, value: &Value) -> Result<()> {
    to_writer_with_options(writer, value, &JsonEncodeOptions::default())
}

pub fn to_writer_with_options<W: Write>(
    writer: W,
    value: &Value,
    options: &JsonEncodeOptions,
) -> Result<()> {
    let mut encoder = JsonEncoder::with_options(writer, options.clone());
    dump(value, &mut encoder)
}
