use std::io::Write;

use zerocopy::byteorder::{BigEndian, F64, I16, I32, I64, U16, U32, U64};

use crate::visit::{Flow, Visitor};
use crate::{Error, Result, SemanticTag};

struct Frame {
    buf: Vec<u8>,
    count: usize,
    is_map: bool,
}

/// Streaming MessagePack encoder.
///
/// MessagePack container headers carry exact counts and the format has no
/// indefinite form, so each open container assembles its body in its own
/// buffer; the header is written from the actual item count at the close.
/// Size hints are therefore never trusted, only measured.
pub struct MsgpackEncoder<W: Write> {
    out: W,
    frames: Vec<Frame>,
    after_key: bool,
}

impl<W: Write> MsgpackEncoder<W> {
    pub fn new(out: W) -> Self {
        MsgpackEncoder {
            out,
            frames: Vec::new(),
            after_key: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn sink(&mut self, data: &[u8]) -> Result<()> {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.buf.extend_from_slice(data);
                Ok(())
            }
            None => {
                self.out.write_all(data)?;
                Ok(())
            }
        }
    }

    fn count_value(&mut self) {
        if self.after_key {
            self.after_key = false;
            return;
        }
        if let Some(top) = self.frames.last_mut() {
            top.count += 1;
        }
    }

    fn close_container(&mut self, expect_map: bool) -> Result<Flow> {
        let Some(frame) = self.frames.pop() else {
            return Err(Error::Message(
                "container end without matching begin".to_string(),
            ));
        };
        if frame.is_map != expect_map {
            return Err(Error::Message("mismatched container end".to_string()));
        }
        let count = frame.count;
        let mut header = [0u8; 5];
        let header: &[u8] = if frame.is_map {
            if count <= 15 {
                header[0] = 0x80 | count as u8;
                &header[..1]
            } else if count <= usize::from(u16::MAX) {
                header[0] = 0xde;
                header[1..3].copy_from_slice(&U16::<BigEndian>::new(count as u16).to_bytes());
                &header[..3]
            } else {
                header[0] = 0xdf;
                header[1..5].copy_from_slice(&U32::<BigEndian>::new(count as u32).to_bytes());
                &header[..5]
            }
        } else if count <= 15 {
            header[0] = 0x90 | count as u8;
            &header[..1]
        } else if count <= usize::from(u16::MAX) {
            header[0] = 0xdc;
            header[1..3].copy_from_slice(&U16::<BigEndian>::new(count as u16).to_bytes());
            &header[..3]
        } else {
            header[0] = 0xdd;
            header[1..5].copy_from_slice(&U32::<BigEndian>::new(count as u32).to_bytes());
            &header[..5]
        };
        let header = header.to_vec();
        self.sink(&header)?;
        self.sink(&frame.buf)?;
        Ok(Flow::Continue)
    }

    fn write_str(&mut self, value: &str) -> Result<()> {
        let len = value.len();
        if len <= 31 {
            self.sink(&[0xa0 | len as u8])?;
        } else if len <= usize::from(u8::MAX) {
            self.sink(&[0xd9, len as u8])?;
        } else if len <= usize::from(u16::MAX) {
            let mut header = [0u8; 3];
            header[0] = 0xda;
            header[1..].copy_from_slice(&U16::<BigEndian>::new(len as u16).to_bytes());
            self.sink(&header)?;
        } else if u32::try_from(len).is_ok() {
            let mut header = [0u8; 5];
            header[0] = 0xdb;
            header[1..].copy_from_slice(&U32::<BigEndian>::new(len as u32).to_bytes());
            self.sink(&header)?;
        } else {
            return Err(Error::Message("string too long for MessagePack".to_string()));
        }
        self.sink(value.as_bytes())
    }

    fn write_uint(&mut self, value: u64) -> Result<()> {
        if value <= 127 {
            self.sink(&[value as u8])
        } else if value <= u64::from(u8::MAX) {
            self.sink(&[0xcc, value as u8])
        } else if value <= u64::from(u16::MAX) {
            let mut b = [0u8; 3];
            b[0] = 0xcd;
            b[1..].copy_from_slice(&U16::<BigEndian>::new(value as u16).to_bytes());
            self.sink(&b)
        } else if value <= u64::from(u32::MAX) {
            let mut b = [0u8; 5];
            b[0] = 0xce;
            b[1..].copy_from_slice(&U32::<BigEndian>::new(value as u32).to_bytes());
            self.sink(&b)
        } else {
            let mut b = [0u8; 9];
            b[0] = 0xcf;
            b[1..].copy_from_slice(&U64::<BigEndian>::new(value).to_bytes());
            self.sink(&b)
        }
    }

    fn write_int(&mut self, value: i64) -> Result<()> {
        if value >= 0 {
            return self.write_uint(value as u64);
        }
        if value >= -32 {
            self.sink(&[value as i8 as u8])
        } else if value >= i64::from(i8::MIN) {
            self.sink(&[0xd0, value as i8 as u8])
        } else if value >= i64::from(i16::MIN) {
            let mut b = [0u8; 3];
            b[0] = 0xd1;
            b[1..].copy_from_slice(&I16::<BigEndian>::new(value as i16).to_bytes());
            self.sink(&b)
        } else if value >= i64::from(i32::MIN) {
            let mut b = [0u8; 5];
            b[0] = 0xd2;
            b[1..].copy_from_slice(&I32::<BigEndian>::new(value as i32).to_bytes());
            self.sink(&b)
        } else {
            let mut b = [0u8; 9];
            b[0] = 0xd3;
            b[1..].copy_from_slice(&I64::<BigEndian>::new(value).to_bytes());
            self.sink(&b)
        }
    }

    /// Timestamp extension: ts32 when seconds fit u32 and there are no
    /// nanos, else the full 96-bit form.
    fn write_timestamp(&mut self, seconds: i64, nanos: u32) -> Result<()> {
        if nanos == 0 {
            if let Ok(seconds) = u32::try_from(seconds) {
                let mut b = [0u8; 6];
                b[0] = 0xd6;
                b[1] = 0xff;
                b[2..].copy_from_slice(&U32::<BigEndian>::new(seconds).to_bytes());
                return self.sink(&b);
            }
        }
        let mut b = [0u8; 15];
        b[0] = 0xc7;
        b[1] = 12;
        b[2] = 0xff;
        b[3..7].copy_from_slice(&U32::<BigEndian>::new(nanos).to_bytes());
        b[7..].copy_from_slice(&I64::<BigEndian>::new(seconds).to_bytes());
        self.sink(&b)
    }
}

impl<W: Write> Visitor for MsgpackEncoder<W> {
    fn end_document(&mut self) -> Result<Flow> {
        self.out.flush()?;
        Ok(Flow::Continue)
    }

    fn begin_array(&mut self, _size_hint: Option<usize>, _tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        self.frames.push(Frame {
            buf: Vec::new(),
            count: 0,
            is_map: false,
        });
        Ok(Flow::Continue)
    }

    fn end_array(&mut self) -> Result<Flow> {
        self.close_container(false)
    }

    fn begin_object(&mut self, _size_hint: Option<usize>, _tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        self.frames.push(Frame {
            buf: Vec::new(),
            count: 0,
            is_map: true,
        });
        Ok(Flow::Continue)
    }

    fn end_object(&mut self) -> Result<Flow> {
        self.close_container(true)
    }

    fn key(&mut self, name: &str) -> Result<Flow> {
        if let Some(top) = self.frames.last_mut() {
            top.count += 1;
        }
        self.write_str(name)?;
        self.after_key = true;
        Ok(Flow::Continue)
    }

    fn string_value(&mut self, value: &str, _tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        self.write_str(value)?;
        Ok(Flow::Continue)
    }

    fn byte_string_value(&mut self, value: &[u8], _tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        let len = value.len();
        if len <= usize::from(u8::MAX) {
            self.sink(&[0xc4, len as u8])?;
        } else if len <= usize::from(u16::MAX) {
            let mut header = [0u8; 3];
            header[0] = 0xc5;
            header[1..].copy_from_slice(&U16::<BigEndian>::new(len as u16).to_bytes());
            self.sink(&header)?;
        } else if u32::try_from(len).is_ok() {
            let mut header = [0u8; 5];
            header[0] = 0xc6;
            header[1..].copy_from_slice(&U32::<BigEndian>::new(len as u32).to_bytes());
            self.sink(&header)?;
        } else {
            return Err(Error::Message(
                "byte string too long for MessagePack".to_string(),
            ));
        }
        self.sink(value)?;
        Ok(Flow::Continue)
    }

    fn int_value(&mut self, value: i64, tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        match tag {
            SemanticTag::EpochSeconds => self.write_timestamp(value, 0)?,
            SemanticTag::EpochNanos => self.write_timestamp(
                value.div_euclid(1_000_000_000),
                value.rem_euclid(1_000_000_000) as u32,
            )?,
            _ => self.write_int(value)?,
        }
        Ok(Flow::Continue)
    }

    fn uint_value(&mut self, value: u64, tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        match tag {
            SemanticTag::EpochSeconds if i64::try_from(value).is_ok() => {
                self.write_timestamp(value as i64, 0)?;
            }
            SemanticTag::EpochNanos => {
                let seconds = (value / 1_000_000_000) as i64;
                let nanos = (value % 1_000_000_000) as u32;
                self.write_timestamp(seconds, nanos)?;
            }
            _ => self.write_uint(value)?,
        }
        Ok(Flow::Continue)
    }

    fn double_value(&mut self, value: f64, _precision: u8, tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        if tag == SemanticTag::EpochSeconds && value.is_finite() {
            let seconds = value.floor();
            let nanos = ((value - seconds) * 1e9).round() as u32;
            self.write_timestamp(seconds as i64, nanos.min(999_999_999))?;
            return Ok(Flow::Continue);
        }
        let mut b = [0u8; 9];
        b[0] = 0xcb;
        b[1..].copy_from_slice(&F64::<BigEndian>::new(value).to_bytes());
        self.sink(&b)?;
        Ok(Flow::Continue)
    }

    fn bool_value(&mut self, value: bool) -> Result<Flow> {
        self.count_value();
        self.sink(&[if value { 0xc3 } else { 0xc2 }])?;
        Ok(Flow::Continue)
    }

    fn null_value(&mut self, _tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        self.sink(&[0xc0])?;
        Ok(Flow::Continue)
    }
}
