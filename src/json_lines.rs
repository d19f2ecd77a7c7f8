//! JSON Lines: one compact JSON document per newline-terminated line.

use std::io::Write;

use crate::builder::ValueBuilder;
use crate::json::{JsonParseOptions, JsonParser};
use crate::visit::{EventSource, visit};
use crate::{Error, Result, Value};

pub fn from_str(text: &str) -> Result<Vec<Value>> {
    from_slice(text.as_bytes())
}

/// Parses every non-blank line as one JSON document. A single parser (and
/// its scratch storage) is reused across lines.
pub fn from_slice(data: &[u8]) -> Result<Vec<Value>> {
    from_slice_with_options(data, &JsonParseOptions::default())
}

pub fn from_slice_with_options(data: &[u8], options: &JsonParseOptions) -> Result<Vec<Value>> {
    let mut values = Vec::new();
    let mut parser = JsonParser::with_options(options.clone());
    for line in data.split(|&b| b == b'\n') {
        if line.iter().all(|b| b.is_ascii_whitespace()) {
            continue;
        }
        parser.reset();
        parser.update(line);
        parser.finish();
        let mut builder = ValueBuilder::new();
        visit(&mut parser, &mut builder)?;
        values.push(
            builder
                .take()
                .ok_or_else(|| Error::Message("incomplete document".to_string()))?,
        );
    }
    Ok(values)
}

/// Encodes each value as one compact line.
pub fn to_vec(values: &[Value]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    to_writer(&mut out, values)?;
    Ok(out)
}

pub fn to_string(values: &[Value]) -> Result<String> {
    let bytes = to_vec(values)?;
    // SAFETY: the JSON encoder only ever writes valid UTF-8.
    Ok(unsafe { String::from_utf8_unchecked(bytes) })
}

pub fn to_writer<W: Write>(mut writer: W, values: &[Value]) -> Result<()> {
    for value in values {
        let line = crate::json::to_vec(value)?;
        writer.write_all(&line)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
