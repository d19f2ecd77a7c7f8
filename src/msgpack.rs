//! MessagePack: incremental parser and encoder, including the timestamp
//! extension (ext type -1). Other extension payloads degrade to plain byte
//! strings on parse.

use std::io::Write;

use crate::builder::ValueBuilder;
use crate::visit::{EventSource, dump, visit};
use crate::{Error, Result, Value};

mod encoder;
mod parser;

pub use encoder::MsgpackEncoder;
pub use parser::{MsgpackParseOptions, MsgpackParser};

/// Parses a complete MessagePack document from a byte slice.
pub fn from_slice(data: &[u8]) -> Result<Value> {
    from_slice_with_options(data, &MsgpackParseOptions::default())
}

pub fn from_slice_with_options(data: &[u8], options: &MsgpackParseOptions) -> Result<Value> {
    let mut parser = MsgpackParser::with_options(options.clone());
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
    let mut encoder = MsgpackEncoder::new(&mut out);
    dump(value, &mut encoder)?;
    Ok(out)
}

pub fn to_writer<W: Write>(writer: W, value: &Value) -> Result<()> {
    let mut encoder = MsgpackEncoder::new(writer);
    dump(value, &mut encoder)
}
