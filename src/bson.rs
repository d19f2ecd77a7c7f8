//! BSON: incremental parser and encoder. Documents carry a little-endian
//! total-size prefix that is validated byte-exactly on parse and
//! back-patched on encode.

use std::io::Write;

use crate::builder::ValueBuilder;
use crate::visit::{EventSource, dump, visit};
use crate::{Error, Result, Value};

mod encoder;
mod parser;

pub use encoder::BsonEncoder;
pub use parser::{BsonParseOptions, BsonParser};

/// Parses a complete BSON document from a byte slice.
pub fn from_slice(data: &[u8]) -> Result<Value> {
    from_slice_with_options(data, &BsonParseOptions::default())
}

pub fn from_slice_with_options(data: &[u8], options: &BsonParseOptions) -> Result<Value> {
    let mut parser = BsonParser::with_options(options.clone());
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
    let mut encoder = BsonEncoder::new(&mut out);
    dump(value, &mut encoder)?;
    Ok(out)
}

pub fn to_writer<W: Write>(writer: W, value: &Value) -> Result<()> {
    let mut encoder = BsonEncoder::new(writer);
    dump(value, &mut encoder)
}
