use bytes::Bytes;

use zerocopy::byteorder::{BigEndian, F32, F64, I16, I32, I64, U16, U32, U64};

use crate::reader::InputBuffer;
use crate::visit::{Event, EventSource};
use crate::{Error, ParseCode, Result, SemanticTag};

#[derive(Clone, Debug)]
pub struct MsgpackParseOptions {
    pub max_nesting_depth: usize,
}

impl Default for MsgpackParseOptions {
    fn default() -> Self {
        MsgpackParseOptions {
            max_nesting_depth: 1024,
        }
    }
}

enum Frame {
    Array { remaining: u64 },
    Map { remaining: u64, expect_key: bool },
}

/// Incremental MessagePack parser.
///
/// Every MessagePack container is length-prefixed, so the frame stack holds
/// countdown counters; an item is consumed only once its full encoding is
/// buffered, which makes truncated declared lengths an `UnexpectedEof`
/// instead of a read past the input.
pub struct MsgpackParser {
    input: InputBuffer,
    options: MsgpackParseOptions,
    frames: Vec<Frame>,
    done_: bool,
    failure: Option<(ParseCode, u64)>,
}

impl MsgpackParser {
    pub fn new() -> Self {
        Self::with_options(MsgpackParseOptions::default())
    }

    pub fn with_options(options: MsgpackParseOptions) -> Self {
        MsgpackParser {
            input: InputBuffer::new(),
            options,
            frames: Vec::new(),
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
        match self.frames.last_mut() {
            None => self.done_ = true,
            Some(Frame::Array { remaining }) => *remaining -= 1,
            Some(Frame::Map {
                remaining,
                expect_key,
            }) => {
                *remaining -= 1;
                *expect_key = true;
            }
        }
    }

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

    fn begin_array(&mut self, header_len: usize, count: u64) -> Result<Option<Event>> {
        if self.expecting_key() {
            return Err(self.err(ParseCode::SyntaxError));
        }
        if self.frames.len() >= self.options.max_nesting_depth {
            return Err(self.err(ParseCode::MaxNestingDepthExceeded));
        }
        self.input.advance(header_len);
        self.frames.push(Frame::Array { remaining: count });
        Ok(Some(Event::BeginArray {
            size_hint: usize::try_from(count).ok(),
            tag: SemanticTag::None,
        }))
    }

    fn begin_map(&mut self, header_len: usize, count: u64) -> Result<Option<Event>> {
        if self.expecting_key() {
            return Err(self.err(ParseCode::SyntaxError));
        }
        if self.frames.len() >= self.options.max_nesting_depth {
            return Err(self.err(ParseCode::MaxNestingDepthExceeded));
        }
        self.input.advance(header_len);
        self.frames.push(Frame::Map {
            remaining: count,
            expect_key: true,
        });
        Ok(Some(Event::BeginObject {
            size_hint: usize::try_from(count).ok(),
            tag: SemanticTag::None,
        }))
    }

    /// Consumes `header_len + payload_len` bytes and returns the payload,
    /// or suspends if not fully buffered.
    fn take_payload(&mut self, header_len: usize, payload_len: usize) -> Option<Bytes> {
        if self.input.remaining() < header_len + payload_len {
            return None;
        }
        self.input.advance(header_len);
        self.input.take_bytes(payload_len)
    }

    fn emit_text(&mut self, payload: Bytes) -> Result<Option<Event>> {
        let text = match std::str::from_utf8(&payload) {
            Ok(text) => text.to_string(),
            Err(_) => return Err(self.err(ParseCode::IllegalUtf8)),
        };
        self.emit_scalar(Event::String {
            value: text,
            tag: SemanticTag::None,
        })
    }

    /// A timestamp extension payload: the only ext type with a model
    /// counterpart. Everything else degrades to a plain byte string.
    fn emit_ext(&mut self, ext_type: i8, payload: Bytes) -> Result<Option<Event>> {
        if ext_type == -1 {
            match payload.len() {
                4 => {
                    let mut raw = [0u8; 4];
                    raw.copy_from_slice(&payload);
                    let seconds = U32::<BigEndian>::from_bytes(raw).get();
                    return self.emit_scalar(Event::Int {
                        value: i64::from(seconds),
                        tag: SemanticTag::EpochSeconds,
                    });
                }
                8 => {
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(&payload);
                    let packed = U64::<BigEndian>::from_bytes(raw).get();
                    let nanos = packed >> 34;
                    let seconds = packed & 0x3_ffff_ffff;
                    return if nanos == 0 {
                        self.emit_scalar(Event::Int {
                            value: seconds as i64,
                            tag: SemanticTag::EpochSeconds,
                        })
                    } else {
                        self.emit_scalar(Event::UInt {
                            value: seconds * 1_000_000_000 + nanos,
                            tag: SemanticTag::EpochNanos,
                        })
                    };
                }
                12 => {
                    let mut raw_nanos = [0u8; 4];
                    raw_nanos.copy_from_slice(&payload[..4]);
                    let mut raw_seconds = [0u8; 8];
                    raw_seconds.copy_from_slice(&payload[4..]);
                    let nanos = U32::<BigEndian>::from_bytes(raw_nanos).get();
                    let seconds = I64::<BigEndian>::from_bytes(raw_seconds).get();
                    if nanos == 0 {
                        return self.emit_scalar(Event::Int {
                            value: seconds,
                            tag: SemanticTag::EpochSeconds,
                        });
                    }
                    let total = i128::from(seconds) * 1_000_000_000 + i128::from(nanos);
                    return if let Ok(value) = i64::try_from(total) {
                        self.emit_scalar(Event::Int {
                            value,
                            tag: SemanticTag::EpochNanos,
                        })
                    } else if let Ok(value) = u64::try_from(total) {
                        self.emit_scalar(Event::UInt {
                            value,
                            tag: SemanticTag::EpochNanos,
                        })
                    } else {
                        self.emit_scalar(Event::Double {
                            value: seconds as f64 + f64::from(nanos) * 1e-9,
                            precision: 0,
                            tag: SemanticTag::EpochSeconds,
                        })
                    };
                }
                _ => {}
            }
        }
        self.emit_scalar(Event::Bytes {
            value: payload,
            tag: SemanticTag::None,
        })
    }
}

impl Default for MsgpackParser {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! fixed_scalar {
    ($self:expr, $n:expr, $ty:ident, $make:expr) => {{
        let Some(raw) = $self.input.peek_array::<{ $n }>(1) else {
            return $self.suspend_or_eof();
        };
        let value = $ty::<BigEndian>::from_bytes(raw).get();
        $self.input.advance(1 + $n);
        $self.emit_scalar($make(value))
    }};
}

impl EventSource for MsgpackParser {
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
        if self.done_ {
            return Ok(None);
        }
        match self.frames.last() {
            Some(Frame::Array { remaining: 0 }) => {
                self.frames.pop();
                self.note_value_done();
                return Ok(Some(Event::EndArray));
            }
            Some(Frame::Map {
                remaining: 0,
                expect_key: true,
            }) => {
                self.frames.pop();
                self.note_value_done();
                return Ok(Some(Event::EndObject));
            }
            _ => {}
        }

        let Some(b) = self.input.peek(0) else {
            return self.suspend_or_eof();
        };
        match b {
            0x00..=0x7f => {
                self.input.advance(1);
                self.emit_scalar(Event::UInt {
                    value: u64::from(b),
                    tag: SemanticTag::None,
                })
            }
            0x80..=0x8f => self.begin_map(1, u64::from(b & 0x0f)),
            0x90..=0x9f => self.begin_array(1, u64::from(b & 0x0f)),
            0xa0..=0xbf => {
                let len = usize::from(b & 0x1f);
                let Some(payload) = self.take_payload(1, len) else {
                    return self.suspend_or_eof();
                };
                self.emit_text(payload)
            }
            0xc0 => {
                self.input.advance(1);
                self.emit_scalar(Event::Null(SemanticTag::None))
            }
            0xc2 | 0xc3 => {
                self.input.advance(1);
                self.emit_scalar(Event::Bool(b == 0xc3))
            }
            0xc4 | 0xc5 | 0xc6 => {
                let Some((header_len, len)) = self.peek_len(b - 0xc4) else {
                    return self.suspend_or_eof();
                };
                let Some(payload) = self.take_payload(header_len, len) else {
                    return self.suspend_or_eof();
                };
                self.emit_scalar(Event::Bytes {
                    value: payload,
                    tag: SemanticTag::None,
                })
            }
            0xc7 | 0xc8 | 0xc9 => {
                let Some((header_len, len)) = self.peek_len(b - 0xc7) else {
                    return self.suspend_or_eof();
                };
                let Some(ext_type) = self.input.peek(header_len) else {
                    return self.suspend_or_eof();
                };
                let Some(payload) = self.take_payload(header_len + 1, len) else {
                    return self.suspend_or_eof();
                };
                self.emit_ext(ext_type as i8, payload)
            }
            0xca => fixed_scalar!(self, 4, F32, |v: f32| Event::Double {
                value: f64::from(v),
                precision: 0,
                tag: SemanticTag::None,
            }),
            0xcb => fixed_scalar!(self, 8, F64, |v: f64| Event::Double {
                value: v,
                precision: 0,
                tag: SemanticTag::None,
            }),
            0xcc => {
                let Some(v) = self.input.peek(1) else {
                    return self.suspend_or_eof();
                };
                self.input.advance(2);
                self.emit_scalar(Event::UInt {
                    value: u64::from(v),
                    tag: SemanticTag::None,
                })
            }
            0xcd => fixed_scalar!(self, 2, U16, |v: u16| Event::UInt {
                value: u64::from(v),
                tag: SemanticTag::None,
            }),
            0xce => fixed_scalar!(self, 4, U32, |v: u32| Event::UInt {
                value: u64::from(v),
                tag: SemanticTag::None,
            }),
            0xcf => fixed_scalar!(self, 8, U64, |v: u64| Event::UInt {
                value: v,
                tag: SemanticTag::None,
            }),
            0xd0 => {
                let Some(v) = self.input.peek(1) else {
                    return self.suspend_or_eof();
                };
                self.input.advance(2);
                self.emit_scalar(Event::Int {
                    value: i64::from(v as i8),
                    tag: SemanticTag::None,
                })
            }
            0xd1 => fixed_scalar!(self, 2, I16, |v: i16| Event::Int {
                value: i64::from(v),
                tag: SemanticTag::None,
            }),
            0xd2 => fixed_scalar!(self, 4, I32, |v: i32| Event::Int {
                value: i64::from(v),
                tag: SemanticTag::None,
            }),
            0xd3 => fixed_scalar!(self, 8, I64, |v: i64| Event::Int {
                value: v,
                tag: SemanticTag::None,
            }),
            0xd4 | 0xd5 | 0xd6 | 0xd7 | 0xd8 => {
                let len = 1usize << (b - 0xd4);
                let Some(ext_type) = self.input.peek(1) else {
                    return self.suspend_or_eof();
                };
                let Some(payload) = self.take_payload(2, len) else {
                    return self.suspend_or_eof();
                };
                self.emit_ext(ext_type as i8, payload)
            }
            0xd9 | 0xda | 0xdb => {
                let Some((header_len, len)) = self.peek_len(b - 0xd9) else {
                    return self.suspend_or_eof();
                };
                let Some(payload) = self.take_payload(header_len, len) else {
                    return self.suspend_or_eof();
                };
                self.emit_text(payload)
            }
            0xdc | 0xdd => {
                let wide = b == 0xdd;
                let Some((header_len, len)) = self.peek_len(if wide { 2 } else { 1 }) else {
                    return self.suspend_or_eof();
                };
                self.begin_array(header_len, len as u64)
            }
            0xde | 0xdf => {
                let wide = b == 0xdf;
                let Some((header_len, len)) = self.peek_len(if wide { 2 } else { 1 }) else {
                    return self.suspend_or_eof();
                };
                self.begin_map(header_len, len as u64)
            }
            0xe0..=0xff => {
                self.input.advance(1);
                self.emit_scalar(Event::Int {
                    value: i64::from(b as i8),
                    tag: SemanticTag::None,
                })
            }
            0xc1 => Err(self.err(ParseCode::UnknownTypeTag(0xc1))),
        }
    }

    fn done(&self) -> bool {
        self.done_
    }

    fn offset(&self) -> u64 {
        self.input.offset()
    }
}

impl MsgpackParser {
    /// Reads a length field sized by `width` (0 = u8, 1 = u16, 2 = u32)
    /// following the marker byte. Returns `(header_len, length)`.
    fn peek_len(&self, width: u8) -> Option<(usize, usize)> {
        match width {
            0 => {
                let len = self.input.peek(1)?;
                Some((2, usize::from(len)))
            }
            1 => {
                let raw = self.input.peek_array::<2>(1)?;
                Some((3, usize::from(U16::<BigEndian>::from_bytes(raw).get())))
            }
            _ => {
                let raw = self.input.peek_array::<4>(1)?;
                let len = U32::<BigEndian>::from_bytes(raw).get();
                Some((5, len as usize))
            }
        }
    }
}
