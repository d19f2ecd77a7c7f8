use std::io::Write;

use zerocopy::byteorder::{F64, I32, I64, LittleEndian, U32, U64};

use crate::visit::{Flow, Visitor};
use crate::{Error, Result, SemanticTag};

struct Frame {
    /// Index of this document's size field in the output buffer.
    start: usize,
    is_array: bool,
    index: u64,
}

/// BSON encoder.
///
/// The whole document is assembled in memory — the size prefixes at every
/// level are back-patched once their document closes — and written to the
/// sink at `end_document`. The root must be a container; array roots are
/// serialized the BSON way, as a document with decimal index keys.
pub struct BsonEncoder<W: Write> {
    out: W,
    buf: Vec<u8>,
    frames: Vec<Frame>,
    pending_key: Option<String>,
}

impl<W: Write> BsonEncoder<W> {
    pub fn new(out: W) -> Self {
        BsonEncoder {
            out,
            buf: Vec::new(),
            frames: Vec::new(),
            pending_key: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Writes the element prelude: type byte, then the key as a cstring.
    fn element(&mut self, ty: u8) -> Result<()> {
        let Some(frame) = self.frames.last_mut() else {
            return Err(Error::Message(
                "bson document root must be an object or array".to_string(),
            ));
        };
        let key = if frame.is_array {
            let key = itoa::Buffer::new().format(frame.index).to_string();
            frame.index += 1;
            key
        } else {
            self.pending_key
                .take()
                .ok_or_else(|| Error::Message("bson element without a key".to_string()))?
        };
        if key.as_bytes().contains(&0x00) {
            return Err(Error::KeyMustBeString);
        }
        self.buf.push(ty);
        self.buf.extend_from_slice(key.as_bytes());
        self.buf.push(0x00);
        Ok(())
    }

    fn open_document(&mut self, is_array: bool) -> Result<Flow> {
        if !self.frames.is_empty() {
            self.element(if is_array { 0x04 } else { 0x03 })?;
        }
        self.frames.push(Frame {
            start: self.buf.len(),
            is_array,
            index: 0,
        });
        // size placeholder, patched on close
        self.buf.extend_from_slice(&[0u8; 4]);
        Ok(Flow::Continue)
    }

    fn close_document(&mut self) -> Result<Flow> {
        let Some(frame) = self.frames.pop() else {
            return Err(Error::Message(
                "document end without matching begin".to_string(),
            ));
        };
        self.buf.push(0x00);
        let size = (self.buf.len() - frame.start) as u32;
        self.buf[frame.start..frame.start + 4]
            .copy_from_slice(&U32::<LittleEndian>::new(size).to_bytes());
        Ok(Flow::Continue)
    }

    fn write_i32(&mut self, value: i32) {
        self.buf
            .extend_from_slice(&I32::<LittleEndian>::new(value).to_bytes());
    }

    fn write_i64_payload(&mut self, value: i64) {
        self.buf
            .extend_from_slice(&I64::<LittleEndian>::new(value).to_bytes());
    }
}

impl<W: Write> Visitor for BsonEncoder<W> {
    fn end_document(&mut self) -> Result<Flow> {
        self.out.write_all(&self.buf)?;
        self.out.flush()?;
        Ok(Flow::Continue)
    }

    fn begin_array(&mut self, _size_hint: Option<usize>, _tag: SemanticTag) -> Result<Flow> {
        self.open_document(true)
    }

    fn end_array(&mut self) -> Result<Flow> {
        self.close_document()
    }

    fn begin_object(&mut self, _size_hint: Option<usize>, _tag: SemanticTag) -> Result<Flow> {
        self.open_document(false)
    }

    fn end_object(&mut self) -> Result<Flow> {
        self.close_document()
    }

    fn key(&mut self, name: &str) -> Result<Flow> {
        self.pending_key = Some(name.to_string());
        Ok(Flow::Continue)
    }

    fn string_value(&mut self, value: &str, _tag: SemanticTag) -> Result<Flow> {
        self.element(0x02)?;
        self.write_i32(value.len() as i32 + 1);
        self.buf.extend_from_slice(value.as_bytes());
        self.buf.push(0x00);
        Ok(Flow::Continue)
    }

    fn byte_string_value(&mut self, value: &[u8], tag: SemanticTag) -> Result<Flow> {
        if tag == SemanticTag::Base16 && value.len() == 12 {
            // round-trips ObjectId values parsed from BSON
            self.element(0x07)?;
            self.buf.extend_from_slice(value);
            return Ok(Flow::Continue);
        }
        self.element(0x05)?;
        self.write_i32(value.len() as i32);
        self.buf.push(0x00); // generic subtype
        self.buf.extend_from_slice(value);
        Ok(Flow::Continue)
    }

    fn int_value(&mut self, value: i64, tag: SemanticTag) -> Result<Flow> {
        if tag == SemanticTag::EpochMillis {
            self.element(0x09)?;
            self.write_i64_payload(value);
            return Ok(Flow::Continue);
        }
        if let Ok(narrow) = i32::try_from(value) {
            self.element(0x10)?;
            self.write_i32(narrow);
        } else {
            self.element(0x12)?;
            self.write_i64_payload(value);
        }
        Ok(Flow::Continue)
    }

    fn uint_value(&mut self, value: u64, tag: SemanticTag) -> Result<Flow> {
        if let Ok(signed) = i64::try_from(value) {
            return self.int_value(signed, tag);
        }
        // above i64::MAX: BSON timestamp carries a raw u64
        self.element(0x11)?;
        self.buf
            .extend_from_slice(&U64::<LittleEndian>::new(value).to_bytes());
        Ok(Flow::Continue)
    }

    fn double_value(&mut self, value: f64, _precision: u8, _tag: SemanticTag) -> Result<Flow> {
        self.element(0x01)?;
        self.buf
            .extend_from_slice(&F64::<LittleEndian>::new(value).to_bytes());
        Ok(Flow::Continue)
    }

    fn bool_value(&mut self, value: bool) -> Result<Flow> {
        self.element(0x08)?;
        self.buf.push(u8::from(value));
        Ok(Flow::Continue)
    }

    fn null_value(&mut self, _tag: SemanticTag) -> Result<Flow> {
        self.element(0x0a)?;
        Ok(Flow::Continue)
    }
}
