use bytes::Bytes;
use num_bigint::{BigInt, BigUint};
use zerocopy::byteorder::{BigEndian, U16, U32, U64};

use crate::reader::InputBuffer;
use crate::scratch::Scratch;
use crate::visit::{Event, EventSource};
use crate::{Error, ParseCode, Result, SemanticTag};

#[derive(Clone, Debug)]
pub struct CborParseOptions {
    pub max_nesting_depth: usize,
}

impl Default for CborParseOptions {
    fn default() -> Self {
        CborParseOptions {
            max_nesting_depth: 1024,
        }
    }
}

/// A decoded item head: major type, argument, indefinite flag, and how many
/// bytes the head occupies.
#[derive(Clone, Copy)]
struct Head {
    major: u8,
    value: u64,
    indefinite: bool,
    len: usize,
}

enum Frame {
    Array { remaining: Option<u64> },
    Map { remaining: Option<u64>, expect_key: bool },
}

/// Multi-item constructs driven by tags: the tag byte arrives first and the
/// following item(s) are reinterpreted rather than emitted.
#[derive(Clone, Copy)]
enum Pending {
    None,
    /// Tag 25: the next unsigned int picks a string from the ref table.
    RefIndex,
    /// Tag 2/3: the next byte string is a big integer magnitude.
    Bignum { negative: bool },
    /// Tag 4: expect the `[exponent, mantissa]` array head.
    DecimalArray,
    DecimalExponent,
    DecimalMantissa { exponent: i64 },
    DecimalMantissaBignum { exponent: i64, negative: bool },
}

struct RefScope {
    depth: usize,
    table: Vec<RefEntry>,
}

#[derive(Clone)]
enum RefEntry {
    Text(String),
    Blob(Bytes),
}

/// Incremental CBOR (RFC 8949) parser.
///
/// Container frames, pending-tag state and indefinite-string accumulation
/// are all explicit fields, so the parser suspends cleanly at any byte
/// boundary. Heads are only consumed once the whole item they introduce is
/// buffered, which keeps declared lengths honest: a length prefix pointing
/// past the input ends in `UnexpectedEof`, never a wild read.
pub struct CborParser {
    input: InputBuffer,
    scratch: Scratch,
    options: CborParseOptions,
    frames: Vec<Frame>,
    sem_tag: SemanticTag,
    pending: Pending,
    /// `Some(is_text)` while inside an indefinite-length string.
    indef_string: Option<bool>,
    ref_scopes: Vec<RefScope>,
    /// Tag 256 seen; install a stringref namespace around the next value.
    pending_scope: bool,
    done_: bool,
    failure: Option<(ParseCode, u64)>,
}

impl CborParser {
    pub fn new() -> Self {
        Self::with_options(CborParseOptions::default())
    }

    pub fn with_options(options: CborParseOptions) -> Self {
        CborParser {
            input: InputBuffer::new(),
            scratch: Scratch::new(),
            options,
            frames: Vec::new(),
            sem_tag: SemanticTag::None,
            pending: Pending::None,
            indef_string: None,
            ref_scopes: Vec::new(),
            pending_scope: false,
            done_: false,
            failure: None,
        }
    }

    fn err(&mut self, code: ParseCode) -> Error {
        self.failure = Some((code, self.input.offset()));
        Error::Parse {
            code,
            line: 0,
            column: 0,
            offset: self.input.offset(),
        }
    }

    fn suspend_or_eof(&mut self) -> Result<Option<Event>> {
        if self.input.is_eof() {
            Err(self.err(ParseCode::UnexpectedEof))
        } else {
            Ok(None)
        }
    }

    fn take_tag(&mut self) -> SemanticTag {
        std::mem::take(&mut self.sem_tag)
    }

    fn expecting_key(&self) -> bool {
        matches!(
            self.frames.last(),
            Some(Frame::Map {
                expect_key: true,
                ..
            })
        )
    }

    fn note_value_done(&mut self) {
        while let Some(scope) = self.ref_scopes.last() {
            if scope.depth == self.frames.len() {
                self.ref_scopes.pop();
            } else {
                break;
            }
        }
        match self.frames.last_mut() {
            None => self.done_ = true,
            Some(Frame::Array { remaining }) => {
                if let Some(r) = remaining {
                    *r -= 1;
                }
            }
            Some(Frame::Map {
                remaining,
                expect_key,
            }) => {
                if let Some(r) = remaining {
                    *r -= 1;
                }
                *expect_key = true;
            }
        }
    }

    /// Emits a completed scalar, converting it to a key when the enclosing
    /// map expects one. Integer keys are stringified; anything else in key
    /// position is a syntax error.
    fn emit_scalar(&mut self, event: Event) -> Result<Option<Event>> {
        if self.expecting_key() {
            let name = match event {
                Event::String { value, .. } => value,
                Event::Int { value, .. } => itoa::Buffer::new().format(value).to_string(),
                Event::UInt { value, .. } => itoa::Buffer::new().format(value).to_string(),
                _ => return Err(self.err(ParseCode::SyntaxError)),
            };
            if let Some(Frame::Map { expect_key, .. }) = self.frames.last_mut() {
                *expect_key = false;
            }
            Ok(Some(Event::Key(name)))
        } else {
            self.note_value_done();
            Ok(Some(event))
        }
    }

    fn maybe_install_scope(&mut self) {
        if self.pending_scope {
            self.pending_scope = false;
            self.ref_scopes.push(RefScope {
                depth: self.frames.len(),
                table: Vec::new(),
            });
        }
    }

    fn record_ref(&mut self, entry: RefEntry) {
        let long_enough = match &entry {
            RefEntry::Text(s) => s.len() >= 3,
            RefEntry::Blob(b) => b.len() >= 3,
        };
        if long_enough {
            if let Some(scope) = self.ref_scopes.last_mut() {
                scope.table.push(entry);
            }
        }
    }

    /// Decodes the head at the front of the buffer without consuming it.
    fn peek_head(&mut self) -> Result<Option<Head>> {
        let Some(initial) = self.input.peek(0) else {
            return Ok(None);
        };
        let major = initial >> 5;
        let ai = initial & 0x1f;
        let head = match ai {
            0..=23 => Head {
                major,
                value: u64::from(ai),
                indefinite: false,
                len: 1,
            },
            24 => {
                let Some(b) = self.input.peek(1) else {
                    return Ok(None);
                };
                Head {
                    major,
                    value: u64::from(b),
                    indefinite: false,
                    len: 2,
                }
            }
            25 => {
                let Some(raw) = self.input.peek_array::<2>(1) else {
                    return Ok(None);
                };
                Head {
                    major,
                    value: u64::from(U16::<BigEndian>::from_bytes(raw).get()),
                    indefinite: false,
                    len: 3,
                }
            }
            26 => {
                let Some(raw) = self.input.peek_array::<4>(1) else {
                    return Ok(None);
                };
                Head {
                    major,
                    value: u64::from(U32::<BigEndian>::from_bytes(raw).get()),
                    indefinite: false,
                    len: 5,
                }
            }
            27 => {
                let Some(raw) = self.input.peek_array::<8>(1) else {
                    return Ok(None);
                };
                Head {
                    major,
                    value: U64::<BigEndian>::from_bytes(raw).get(),
                    indefinite: false,
                    len: 9,
                }
            }
            28..=30 => return Err(self.err(ParseCode::SyntaxError)),
            _ => Head {
                major,
                value: 0,
                indefinite: true,
                len: 1,
            },
        };
        Ok(Some(head))
    }

    fn step_indef_string(&mut self, is_text: bool) -> Result<Option<Event>> {
        loop {
            let Some(b) = self.input.peek(0) else {
                return self.suspend_or_eof();
            };
            if b == 0xff {
                self.input.advance(1);
                self.indef_string = None;
                let tag = self.take_tag();
                let event = if is_text {
                    let text = match std::str::from_utf8(&self.scratch.bytes) {
                        Ok(text) => text.to_string(),
                        Err(_) => return Err(self.err(ParseCode::IllegalUtf8)),
                    };
                    Event::String { value: text, tag }
                } else {
                    Event::Bytes {
                        value: Bytes::copy_from_slice(&self.scratch.bytes),
                        tag,
                    }
                };
                return self.emit_scalar(event);
            }
            let Some(head) = self.peek_head()? else {
                return self.suspend_or_eof();
            };
            let expected_major = if is_text { 3 } else { 2 };
            if head.major != expected_major || head.indefinite {
                return Err(self.err(ParseCode::SyntaxError));
            }
            let Ok(n) = usize::try_from(head.value) else {
                return Err(self.err(ParseCode::NumberTooLarge));
            };
            if self.input.remaining() < head.len.saturating_add(n) {
                return self.suspend_or_eof();
            }
            self.input.advance(head.len);
            let Some(chunk) = self.input.take_bytes(n) else {
                return self.suspend_or_eof();
            };
            self.scratch.bytes.extend_from_slice(&chunk);
        }
    }

    /// Finishes a definite-length string item, threading it through any
    /// pending bignum/decimal/stringref construct.
    fn finish_string(&mut self, is_text: bool, payload: Bytes) -> Result<Option<Event>> {
        match self.pending {
            Pending::Bignum { negative } => {
                self.pending = Pending::None;
                if is_text {
                    return Err(self.err(ParseCode::SyntaxError));
                }
                let _ = self.take_tag();
                let event = Event::String {
                    value: bignum_to_string(&payload, negative),
                    tag: SemanticTag::BigInt,
                };
                self.emit_scalar(event)
            }
            Pending::DecimalMantissaBignum {
                exponent,
                negative,
            } => {
                self.pending = Pending::None;
                if is_text {
                    return Err(self.err(ParseCode::SyntaxError));
                }
                let _ = self.take_tag();
                let mantissa = bignum_to_string(&payload, negative);
                let event = Event::String {
                    value: decimal_string(&mantissa, exponent),
                    tag: SemanticTag::BigDec,
                };
                self.emit_scalar(event)
            }
            Pending::RefIndex
            | Pending::DecimalArray
            | Pending::DecimalExponent
            | Pending::DecimalMantissa { .. } => Err(self.err(ParseCode::SyntaxError)),
            Pending::None => {
                let tag = self.take_tag();
                if is_text {
                    let text = match std::str::from_utf8(&payload) {
                        Ok(text) => text.to_string(),
                        Err(_) => return Err(self.err(ParseCode::IllegalUtf8)),
                    };
                    self.record_ref(RefEntry::Text(text.clone()));
                    self.emit_scalar(Event::String { value: text, tag })
                } else {
                    self.record_ref(RefEntry::Blob(payload.clone()));
                    self.emit_scalar(Event::Bytes {
                        value: payload,
                        tag,
                    })
                }
            }
        }
    }

    /// Routes a completed integer through pending constructs, or emits it.
    fn finish_integer(&mut self, event: Event, as_i64: Option<i64>) -> Result<Option<Event>> {
        match self.pending {
            Pending::RefIndex => {
                self.pending = Pending::None;
                let Event::UInt { value, .. } = event else {
                    return Err(self.err(ParseCode::SyntaxError));
                };
                let entry = self
                    .ref_scopes
                    .last()
                    .and_then(|scope| scope.table.get(value as usize))
                    .cloned();
                let Some(entry) = entry else {
                    return Err(self.err(ParseCode::SyntaxError));
                };
                let tag = self.take_tag();
                match entry {
                    RefEntry::Text(text) => {
                        self.emit_scalar(Event::String { value: text, tag })
                    }
                    RefEntry::Blob(blob) => self.emit_scalar(Event::Bytes {
                        value: blob,
                        tag,
                    }),
                }
            }
            Pending::DecimalExponent => {
                let Some(exponent) = as_i64 else {
                    return Err(self.err(ParseCode::NumberTooLarge));
                };
                // bound the zeros a decimal rendering may have to produce
                if exponent.unsigned_abs() > 10_000 {
                    return Err(self.err(ParseCode::NumberTooLarge));
                }
                self.pending = Pending::DecimalMantissa { exponent };
                Ok(None)
            }
            Pending::DecimalMantissa { exponent } => {
                self.pending = Pending::None;
                let _ = self.take_tag();
                let mantissa = match event {
                    Event::Int { value, .. } => itoa::Buffer::new().format(value).to_string(),
                    Event::UInt { value, .. } => itoa::Buffer::new().format(value).to_string(),
                    Event::String { value, .. } => value,
                    _ => return Err(self.err(ParseCode::SyntaxError)),
                };
                let event = Event::String {
                    value: decimal_string(&mantissa, exponent),
                    tag: SemanticTag::BigDec,
                };
                self.emit_scalar(event)
            }
            Pending::Bignum { .. }
            | Pending::DecimalArray
            | Pending::DecimalMantissaBignum { .. } => Err(self.err(ParseCode::SyntaxError)),
            Pending::None => self.emit_scalar(event),
        }
    }
}

impl Default for CborParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CborParser {
    fn update(&mut self, chunk: &[u8]) {
        self.input.update(chunk);
    }

    fn finish(&mut self) {
        self.input.finish();
    }

    fn next_event(&mut self) -> Result<Option<Event>> {
        if let Some((code, offset)) = self.failure {
            return Err(Error::Parse {
                code,
                line: 0,
                column: 0,
                offset,
            });
        }
        loop {
            if self.done_ {
                return Ok(None);
            }
            // close definite containers that ran out of declared items
            match self.frames.last() {
                Some(Frame::Array {
                    remaining: Some(0),
                }) => {
                    self.frames.pop();
                    self.note_value_done();
                    return Ok(Some(Event::EndArray));
                }
                Some(Frame::Map {
                    remaining: Some(0),
                    expect_key: true,
                }) => {
                    self.frames.pop();
                    self.note_value_done();
                    return Ok(Some(Event::EndObject));
                }
                _ => {}
            }
            if let Some(is_text) = self.indef_string {
                return self.step_indef_string(is_text);
            }

            let Some(head) = self.peek_head()? else {
                return self.suspend_or_eof();
            };
            match head.major {
                0 => {
                    self.input.advance(head.len);
                    self.maybe_install_scope();
                    let tag = self.take_tag();
                    let as_i64 = i64::try_from(head.value).ok();
                    let event = Event::UInt {
                        value: head.value,
                        tag,
                    };
                    match self.finish_integer(event, as_i64)? {
                        Some(event) => return Ok(Some(event)),
                        None => continue,
                    }
                }
                1 => {
                    self.input.advance(head.len);
                    self.maybe_install_scope();
                    let tag = self.take_tag();
                    let n = head.value;
                    let (event, as_i64) = if n <= i64::MAX as u64 {
                        let value = -1i64 - (n as i64);
                        (Event::Int { value, tag }, Some(value))
                    } else {
                        // below i64::MIN: exact digits, tagged
                        let value = -(BigInt::from(n) + 1i32);
                        (
                            Event::String {
                                value: value.to_string(),
                                tag: SemanticTag::BigInt,
                            },
                            None,
                        )
                    };
                    match self.finish_integer(event, as_i64)? {
                        Some(event) => return Ok(Some(event)),
                        None => continue,
                    }
                }
                2 | 3 => {
                    let is_text = head.major == 3;
                    if head.indefinite {
                        if !matches!(self.pending, Pending::None) {
                            return Err(self.err(ParseCode::SyntaxError));
                        }
                        self.input.advance(head.len);
                        self.maybe_install_scope();
                        self.scratch.bytes.clear();
                        self.indef_string = Some(is_text);
                        continue;
                    }
                    let Ok(n) = usize::try_from(head.value) else {
                        return Err(self.err(ParseCode::NumberTooLarge));
                    };
                    if self.input.remaining() < head.len.saturating_add(n) {
                        return self.suspend_or_eof();
                    }
                    self.input.advance(head.len);
                    self.maybe_install_scope();
                    let Some(payload) = self.input.take_bytes(n) else {
                        return self.suspend_or_eof();
                    };
                    return self.finish_string(is_text, payload);
                }
                4 => {
                    if self.expecting_key() {
                        return Err(self.err(ParseCode::SyntaxError));
                    }
                    match self.pending {
                        Pending::DecimalArray => {
                            if head.indefinite || head.value != 2 {
                                return Err(self.err(ParseCode::SyntaxError));
                            }
                            self.input.advance(head.len);
                            self.pending = Pending::DecimalExponent;
                            continue;
                        }
                        Pending::None => {}
                        _ => return Err(self.err(ParseCode::SyntaxError)),
                    }
                    if self.frames.len() >= self.options.max_nesting_depth {
                        return Err(self.err(ParseCode::MaxNestingDepthExceeded));
                    }
                    self.input.advance(head.len);
                    self.maybe_install_scope();
                    let tag = self.take_tag();
                    let remaining = if head.indefinite {
                        None
                    } else {
                        Some(head.value)
                    };
                    self.frames.push(Frame::Array { remaining });
                    return Ok(Some(Event::BeginArray {
                        size_hint: remaining.and_then(|n| usize::try_from(n).ok()),
                        tag,
                    }));
                }
                5 => {
                    if self.expecting_key() || !matches!(self.pending, Pending::None) {
                        return Err(self.err(ParseCode::SyntaxError));
                    }
                    if self.frames.len() >= self.options.max_nesting_depth {
                        return Err(self.err(ParseCode::MaxNestingDepthExceeded));
                    }
                    self.input.advance(head.len);
                    self.maybe_install_scope();
                    let tag = self.take_tag();
                    let remaining = if head.indefinite {
                        None
                    } else {
                        Some(head.value)
                    };
                    self.frames.push(Frame::Map {
                        remaining,
                        expect_key: true,
                    });
                    return Ok(Some(Event::BeginObject {
                        size_hint: remaining.and_then(|n| usize::try_from(n).ok()),
                        tag,
                    }));
                }
                6 => {
                    if head.indefinite {
                        return Err(self.err(ParseCode::SyntaxError));
                    }
                    self.input.advance(head.len);
                    match head.value {
                        0 => self.sem_tag = SemanticTag::DateTime,
                        1 => self.sem_tag = SemanticTag::EpochSeconds,
                        2 | 3 => {
                            let negative = head.value == 3;
                            self.pending = match self.pending {
                                Pending::DecimalMantissa { exponent } => {
                                    Pending::DecimalMantissaBignum {
                                        exponent,
                                        negative,
                                    }
                                }
                                Pending::None => Pending::Bignum { negative },
                                _ => return Err(self.err(ParseCode::SyntaxError)),
                            };
                        }
                        4 => {
                            if !matches!(self.pending, Pending::None) {
                                return Err(self.err(ParseCode::SyntaxError));
                            }
                            self.pending = Pending::DecimalArray;
                        }
                        21 => self.sem_tag = SemanticTag::Base64Url,
                        22 => self.sem_tag = SemanticTag::Base64,
                        23 => self.sem_tag = SemanticTag::Base16,
                        25 => {
                            if !matches!(self.pending, Pending::None) {
                                return Err(self.err(ParseCode::SyntaxError));
                            }
                            self.pending = Pending::RefIndex;
                        }
                        256 => self.pending_scope = true,
                        _ => {} // unrecognized tags are skipped
                    }
                    continue;
                }
                _ => {
                    // major 7: simple values, floats, break
                    if head.indefinite {
                        // break
                        self.input.advance(head.len);
                        let event = match self.frames.last() {
                            Some(Frame::Array { remaining: None }) => {
                                self.frames.pop();
                                Event::EndArray
                            }
                            Some(Frame::Map {
                                remaining: None,
                                expect_key: true,
                            }) => {
                                self.frames.pop();
                                Event::EndObject
                            }
                            _ => return Err(self.err(ParseCode::SyntaxError)),
                        };
                        self.note_value_done();
                        return Ok(Some(event));
                    }
                    if !matches!(self.pending, Pending::None) {
                        return Err(self.err(ParseCode::SyntaxError));
                    }
                    let ai = head.len_ai();
                    let event = match ai {
                        20 => Event::Bool(false),
                        21 => Event::Bool(true),
                        22 | 23 => Event::Null(self.take_tag()),
                        24 => {
                            // simple value: no model counterpart
                            Event::Null(self.take_tag())
                        }
                        25 => Event::Double {
                            value: half_to_f64(head.value as u16),
                            precision: 0,
                            tag: self.take_tag(),
                        },
                        26 => Event::Double {
                            value: f64::from(f32::from_bits(head.value as u32)),
                            precision: 0,
                            tag: self.take_tag(),
                        },
                        27 => Event::Double {
                            value: f64::from_bits(head.value),
                            precision: 0,
                            tag: self.take_tag(),
                        },
                        _ => return Err(self.err(ParseCode::UnknownTypeTag(0xe0 | ai))),
                    };
                    self.input.advance(head.len);
                    self.maybe_install_scope();
                    return self.emit_scalar(event);
                }
            }
        }
    }

    fn done(&self) -> bool {
        self.done_
    }

    fn offset(&self) -> u64 {
        self.input.offset()
    }
}

impl Head {
    /// Additional-information bits, recovered from the head length.
    fn len_ai(&self) -> u8 {
        match self.len {
            1 => self.value as u8,
            2 => 24,
            3 => 25,
            5 => 26,
            _ => 27,
        }
    }
}

pub(crate) fn bignum_to_string(magnitude: &[u8], negative: bool) -> String {
    let mag = BigUint::from_bytes_be(magnitude);
    if negative {
        (-(BigInt::from(mag) + 1i32)).to_string()
    } else {
        mag.to_string()
    }
}

/// Renders `mantissa * 10^exponent` as a plain decimal literal.
pub(crate) fn decimal_string(mantissa: &str, exponent: i64) -> String {
    let (sign, digits) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let mut out = String::with_capacity(digits.len() + 8);
    out.push_str(sign);
    if exponent >= 0 {
        out.push_str(digits);
        for _ in 0..exponent {
            out.push('0');
        }
        out.push_str(".0");
    } else {
        let shift = -exponent as usize;
        if shift < digits.len() {
            let split = digits.len() - shift;
            out.push_str(&digits[..split]);
            out.push('.');
            out.push_str(&digits[split..]);
        } else {
            out.push_str("0.");
            for _ in 0..shift - digits.len() {
                out.push('0');
            }
            out.push_str(digits);
        }
    }
    out
}

pub(crate) fn half_to_f64(h: u16) -> f64 {
    let exponent = (h >> 10) & 0x1f;
    let fraction = h & 0x3ff;
    let magnitude = if exponent == 0 {
        f64::from(fraction) * 2f64.powi(-24)
    } else if exponent == 0x1f {
        if fraction == 0 {
            f64::INFINITY
        } else {
            f64::NAN
        }
    } else {
        f64::from(1024 + fraction) * 2f64.powi(i32::from(exponent) - 25)
    };
    if h & 0x8000 != 0 { -magnitude } else { magnitude }
}
