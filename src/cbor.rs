//! CBOR (RFC 8949): incremental parser and encoder.
//!
//! Supported tags: 0/1 (date-time), 2/3 (bignum), 4 (decimal fraction),
//! 21/22/23 (base-N byte-string hints), 25/256 (string references).
//! Indefinite-length strings and containers parse transparently; the
//! encoder emits indefinite containers whenever the size hint is absent.

use std::io::Write;

use crate::builder::ValueBuilder;
use crate::visit::{EventSource, dump, visit};
use crate::{Error, Result, Value};

mod encoder;
mod parser;

pub use encoder::{CborEncodeOptions, CborEncoder};
pub use parser::{CborParseOptions, CborParser};

/// Parses a complete CBOR document from a byte slice.
pub fn from_slice(data: &[u8]) -> Result<Value> {
    from_slice_with_options(data, &CborParseOptions::default())
}

pub fn from_slice_with_options(data: &[u8], options: &CborParseOptions) -> Result<Value> {
    let mut parser = CborParser::with_options(options.clone());
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
    to_vec_with_options(value, &CborEncodeOptions::default())
}

pub fn to_vec_with_options(value: &Value, options: &CborEncodeOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut encoder = CborEncoder::with_options(&mut out, options.clone());
    dump(value, &mut encoder)?;
    Ok(out)
}

pub fn to_writer<W: Write>(writer: W, value: &Value) -> Result<()> {
    let mut encoder = CborEncoder::new(writer);
    dump(value, &mut encoder)
}
