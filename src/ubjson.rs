//! UBJSON: incremental parser and encoder. The parser understands the
//! `$`/`#` strongly-typed and counted container optimizations; the encoder
//! emits plain bracketed containers, except for byte strings which use the
//! counted `$U` form.

use std::io::Write;

use crate::builder::ValueBuilder;
use crate::visit::{EventSource, dump, visit};
use crate::{Error, Result, Value};

mod encoder;
mod parser;

pub use encoder::UbjsonEncoder;
pub use parser::{UbjsonParseOptions, UbjsonParser};

/// Parses a complete UBJSON document from a byte slice.
pub fn from_slice(data: &[u8]) -> Result<Value> {
    from_slice_with_options(data, &UbjsonParseOptions::default())
}

pub fn from_slice_with_options(data: &[u8], options: &UbjsonParseOptions) -> Result<Value> {
    let mut parser = UbjsonParser::with_options(options.clone());
    parser.update(data);
    parser.finish();
    let mut builder = ValueBuilder::new();
    visit(&mut parser, &mut builder)?;
    let trailing = data.len() as u64 - parser.offset();
    if trailing > 0 {
        return Err(Error::TrailingData(trailing as usize));
    }
    builder
        .take()
        .ok_or_else(|| Error::Message("incomplete document".to_string()))
}

pub fn to_vec(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut encoder = UbjsonEncoder::new(&mut out);
    dump(value, &mut encoder)?;
    Ok(out)
}

pub fn to_writer<W: Write>(writer: W, value: &Value) -> Result<()> {
    let mut encoder = UbjsonEncoder::new(writer);
    dump(value, &mut encoder)
}
