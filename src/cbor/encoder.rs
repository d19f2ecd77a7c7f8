use std::collections::HashMap;
use std::io::Write;

use num_bigint::{BigInt, Sign};
use zerocopy::byteorder::{BigEndian, F64, U16, U32, U64};

use crate::visit::{Flow, Visitor};
use crate::{Error, Result, SemanticTag};

#[derive(Clone, Debug, Default)]
pub struct CborEncodeOptions {
    /// Emit a stringref namespace (tag 256) around the document and replace
    /// repeated strings with tag 25 references.
    pub pack_strings: bool,
}

struct Frame {
    declared: Option<usize>,
    count: usize,
}

#[derive(PartialEq, Eq, Hash)]
enum RefKey {
    Text(String),
    Blob(Vec<u8>),
}

/// Streaming CBOR encoder.
///
/// Definite-length heads are written when the size hint is present (and the
/// actual item count is verified against it at the close); without a hint
/// the container is emitted indefinite-length with a break terminator.
pub struct CborEncoder<W: Write> {
    out: W,
    options: CborEncodeOptions,
    frames: Vec<Frame>,
    after_key: bool,
    refs: HashMap<RefKey, u64>,
    next_ref: u64,
    started: bool,
}

impl<W: Write> CborEncoder<W> {
    pub fn new(out: W) -> Self {
        Self::with_options(out, CborEncodeOptions::default())
    }

    pub fn with_options(out: W, options: CborEncodeOptions) -> Self {
        CborEncoder {
            out,
            options,
            frames: Vec::new(),
            after_key: false,
            refs: HashMap::new(),
            next_ref: 0,
            started: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_head(&mut self, major: u8, value: u64) -> Result<()> {
        let m = major << 5;
        if value < 24 {
            self.out.write_all(&[m | value as u8])?;
        } else if value <= u64::from(u8::MAX) {
            self.out.write_all(&[m | 24, value as u8])?;
        } else if value <= u64::from(u16::MAX) {
            self.out.write_all(&[m | 25])?;
            self.out
                .write_all(&U16::<BigEndian>::new(value as u16).to_bytes())?;
        } else if value <= u64::from(u32::MAX) {
            self.out.write_all(&[m | 26])?;
            self.out
                .write_all(&U32::<BigEndian>::new(value as u32).to_bytes())?;
        } else {
            self.out.write_all(&[m | 27])?;
            self.out.write_all(&U64::<BigEndian>::new(value).to_bytes())?;
        }
        Ok(())
    }

    fn write_tag(&mut self, tag: u64) -> Result<()> {
        self.write_head(6, tag)
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

    fn close_container(&mut self) -> Result<Flow> {
        let Some(frame) = self.frames.pop() else {
            return Err(Error::Message(
                "container end without matching begin".to_string(),
            ));
        };
        match frame.declared {
            Some(declared) if declared != frame.count => Err(Error::Message(format!(
                "container declared {declared} items but wrote {}",
                frame.count
            ))),
            Some(_) => Ok(Flow::Continue),
            None => {
                self.out.write_all(&[0xff])?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Writes a text or byte string, replacing repeats with stringref
    /// references when `pack_strings` is on. Strings shorter than 3 bytes
    /// never pay off as references and are always written raw.
    fn write_string_item(&mut self, major: u8, data: &[u8], is_text: bool) -> Result<()> {
        if self.options.pack_strings && data.len() >= 3 {
            let key = if is_text {
                RefKey::Text(String::from_utf8_lossy(data).into_owned())
            } else {
                RefKey::Blob(data.to_vec())
            };
            if let Some(&index) = self.refs.get(&key) {
                self.write_tag(25)?;
                return self.write_head(0, index);
            }
            self.refs.insert(key, self.next_ref);
            self.next_ref += 1;
        }
        self.write_head(major, data.len() as u64)?;
        self.out.write_all(data)?;
        Ok(())
    }

    fn write_int(&mut self, value: i64) -> Result<()> {
        if value >= 0 {
            self.write_head(0, value as u64)
        } else {
            self.write_head(1, !(value as u64))
        }
    }

    fn write_bignum(&mut self, value: &BigInt) -> Result<()> {
        let (sign, magnitude) = match value.sign() {
            Sign::Minus => (3u64, (-value - 1u8).magnitude().to_bytes_be()),
            _ => (2u64, value.magnitude().to_bytes_be()),
        };
        self.write_tag(sign)?;
        self.write_head(2, magnitude.len() as u64)?;
        self.out.write_all(&magnitude)?;
        Ok(())
    }
}

impl<W: Write> Visitor for CborEncoder<W> {
    fn begin_document(&mut self) -> Result<Flow> {
        if self.options.pack_strings && !self.started {
            self.write_tag(256)?;
        }
        self.started = true;
        Ok(Flow::Continue)
    }

    fn end_document(&mut self) -> Result<Flow> {
        self.out.flush()?;
        Ok(Flow::Continue)
    }

    fn begin_array(&mut self, size_hint: Option<usize>, _tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        match size_hint {
            Some(n) => self.write_head(4, n as u64)?,
            None => self.out.write_all(&[0x9f])?,
        }
        self.frames.push(Frame {
            declared: size_hint,
            count: 0,
        });
        Ok(Flow::Continue)
    }

    fn end_array(&mut self) -> Result<Flow> {
        self.close_container()
    }

    fn begin_object(&mut self, size_hint: Option<usize>, _tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        match size_hint {
            Some(n) => self.write_head(5, n as u64)?,
            None => self.out.write_all(&[0xbf])?,
        }
        self.frames.push(Frame {
            declared: size_hint,
            count: 0,
        });
        Ok(Flow::Continue)
    }

    fn end_object(&mut self) -> Result<Flow> {
        self.close_container()
    }

    fn key(&mut self, name: &str) -> Result<Flow> {
        if let Some(top) = self.frames.last_mut() {
            top.count += 1;
        }
        self.write_string_item(3, name.as_bytes(), true)?;
        self.after_key = true;
        Ok(Flow::Continue)
    }

    fn string_value(&mut self, value: &str, tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        match tag {
            SemanticTag::BigInt => {
                if let Some(big) = BigInt::parse_bytes(value.as_bytes(), 10) {
                    self.write_bignum(&big)?;
                    return Ok(Flow::Continue);
                }
            }
            SemanticTag::BigDec => {
                if let Some((mantissa, exponent)) = parse_decimal(value) {
                    self.write_tag(4)?;
                    self.write_head(4, 2)?;
                    self.write_int(exponent)?;
                    match i64::try_from(&mantissa) {
                        Ok(m) => self.write_int(m)?,
                        Err(_) => self.write_bignum(&mantissa)?,
                    }
                    return Ok(Flow::Continue);
                }
            }
            SemanticTag::DateTime => {
                self.write_tag(0)?;
            }
            _ => {}
        }
        self.write_string_item(3, value.as_bytes(), true)?;
        Ok(Flow::Continue)
    }

    fn byte_string_value(&mut self, value: &[u8], tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        match tag {
            SemanticTag::Base64Url => self.write_tag(21)?,
            SemanticTag::Base64 => self.write_tag(22)?,
            SemanticTag::Base16 => self.write_tag(23)?,
            _ => {}
        }
        self.write_string_item(2, value, false)?;
        Ok(Flow::Continue)
    }

    fn int_value(&mut self, value: i64, tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        if tag == SemanticTag::EpochSeconds {
            self.write_tag(1)?;
        }
        self.write_int(value)?;
        Ok(Flow::Continue)
    }

    fn uint_value(&mut self, value: u64, tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        if tag == SemanticTag::EpochSeconds {
            self.write_tag(1)?;
        }
        self.write_head(0, value)?;
        Ok(Flow::Continue)
    }

    fn double_value(&mut self, value: f64, _precision: u8, tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        if tag == SemanticTag::EpochSeconds {
            self.write_tag(1)?;
        }
        self.out.write_all(&[0xfb])?;
        self.out
            .write_all(&F64::<BigEndian>::new(value).to_bytes())?;
        Ok(Flow::Continue)
    }

    fn bool_value(&mut self, value: bool) -> Result<Flow> {
        self.count_value();
        self.out.write_all(&[if value { 0xf5 } else { 0xf4 }])?;
        Ok(Flow::Continue)
    }

    fn null_value(&mut self, _tag: SemanticTag) -> Result<Flow> {
        self.count_value();
        self.out.write_all(&[0xf6])?;
        Ok(Flow::Continue)
    }
}

/// Splits a decimal literal into `(mantissa, exponent)` with
/// `mantissa * 10^exponent` equal to the literal.
pub(crate) fn parse_decimal(text: &str) -> Option<(BigInt, i64)> {
    let (base, exp_part) = match text.split_once(['e', 'E']) {
        Some((base, exp)) => (base, exp.parse::<i64>().ok()?),
        None => (text, 0),
    };
    let (int_part, frac_part) = match base.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (base, ""),
    };
    if frac_part.contains(['+', '-']) {
        return None;
    }
    let mut digits = String::with_capacity(int_part.len() + frac_part.len());
    digits.push_str(int_part);
    digits.push_str(frac_part);
    let mantissa = BigInt::parse_bytes(digits.as_bytes(), 10)?;
    let exponent = exp_part.checked_sub(frac_part.len() as i64)?;
    Some((mantissa, exponent))
}
