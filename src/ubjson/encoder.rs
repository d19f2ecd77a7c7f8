use std::io::Write;

use zerocopy::byteorder::{BigEndian, F64, I16, I32, I64};

use crate::visit::{Flow, Visitor};
use crate::{Result, SemanticTag};

/// UBJSON encoder.
///
/// Containers are written in the plain bracketed form; byte strings use the
/// counted `$U` optimization, which is also how the parser recovers them.
/// Big-number strings go out as high-precision `H` values.
pub struct UbjsonEncoder<W: Write> {
    out: W,
}

impl<W: Write> UbjsonEncoder<W> {
    pub fn new(out: W) -> Self {
        UbjsonEncoder { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Smallest integer encoding, marker included.
    fn write_int(&mut self, value: i64) -> Result<()> {
        if (-128..=127).contains(&value) {
            self.out.write_all(&[b'i', value as i8 as u8])?;
        } else if (128..=255).contains(&value) {
            self.out.write_all(&[b'U', value as u8])?;
        } else if i16::try_from(value).is_ok() {
            self.out.write_all(&[b'I'])?;
            self.out
                .write_all(&I16::<BigEndian>::new(value as i16).to_bytes())?;
        } else if i32::try_from(value).is_ok() {
            self.out.write_all(&[b'l'])?;
            self.out
                .write_all(&I32::<BigEndian>::new(value as i32).to_bytes())?;
        } else {
            self.out.write_all(&[b'L'])?;
            self.out.write_all(&I64::<BigEndian>::new(value).to_bytes())?;
        }
        Ok(())
    }

    /// Length-prefixed string payload, used for `S`, `H` and object keys.
    fn write_text(&mut self, value: &str) -> Result<()> {
        self.write_int(value.len() as i64)?;
        self.out.write_all(value.as_bytes())?;
        Ok(())
    }

    fn write_high_precision(&mut self, value: &str) -> Result<()> {
        self.out.write_all(&[b'H'])?;
        self.write_text(value)
    }
}

impl<W: Write> Visitor for UbjsonEncoder<W> {
    fn end_document(&mut self) -> Result<Flow> {
        self.out.flush()?;
        Ok(Flow::Continue)
    }

    fn begin_array(&mut self, _size_hint: Option<usize>, _tag: SemanticTag) -> Result<Flow> {
        self.out.write_all(&[b'['])?;
        Ok(Flow::Continue)
    }

    fn end_array(&mut self) -> Result<Flow> {
        self.out.write_all(&[b']'])?;
        Ok(Flow::Continue)
    }

    fn begin_object(&mut self, _size_hint: Option<usize>, _tag: SemanticTag) -> Result<Flow> {
        self.out.write_all(&[b'{'])?;
        Ok(Flow::Continue)
    }

    fn end_object(&mut self) -> Result<Flow> {
        self.out.write_all(&[b'}'])?;
        Ok(Flow::Continue)
    }

    fn key(&mut self, name: &str) -> Result<Flow> {
        self.write_text(name)?;
        Ok(Flow::Continue)
    }

    fn string_value(&mut self, value: &str, tag: SemanticTag) -> Result<Flow> {
        match tag {
            SemanticTag::BigInt | SemanticTag::BigDec | SemanticTag::Float128 => {
                self.write_high_precision(value)?;
            }
            _ => {
                self.out.write_all(&[b'S'])?;
                self.write_text(value)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn byte_string_value(&mut self, value: &[u8], _tag: SemanticTag) -> Result<Flow> {
        self.out.write_all(&[b'[', b'$', b'U', b'#'])?;
        self.write_int(value.len() as i64)?;
        self.out.write_all(value)?;
        Ok(Flow::Continue)
    }

    fn int_value(&mut self, value: i64, _tag: SemanticTag) -> Result<Flow> {
        self.write_int(value)?;
        Ok(Flow::Continue)
    }

    fn uint_value(&mut self, value: u64, _tag: SemanticTag) -> Result<Flow> {
        match i64::try_from(value) {
            Ok(value) => self.write_int(value)?,
            // above int64 range: high-precision decimal
            Err(_) => self.write_high_precision(itoa::Buffer::new().format(value))?,
        }
        Ok(Flow::Continue)
    }

    fn double_value(&mut self, value: f64, _precision: u8, _tag: SemanticTag) -> Result<Flow> {
        self.out.write_all(&[b'D'])?;
        self.out.write_all(&F64::<BigEndian>::new(value).to_bytes())?;
        Ok(Flow::Continue)
    }

    fn bool_value(&mut self, value: bool) -> Result<Flow> {
        self.out.write_all(&[if value { b'T' } else { b'F' }])?;
        Ok(Flow::Continue)
    }

    fn null_value(&mut self, _tag: SemanticTag) -> Result<Flow> {
        self.out.write_all(&[b'Z'])?;
        Ok(Flow::Continue)
    }
}
