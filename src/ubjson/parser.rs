use zerocopy::byteorder::{BigEndian, F32, F64, I16, I32, I64};

use crate::reader::InputBuffer;
use crate::visit::{Event, EventSource};
use crate::{Error, ParseCode, Result, SemanticTag};

#[derive(Clone, Debug)]
pub struct UbjsonParseOptions {
    pub max_nesting_depth: usize,
    /// Upper bound on a declared container count; larger declarations fail
    /// with `TooManyItems` before any allocation happens.
    pub max_items: usize,
}

impl Default for UbjsonParseOptions {
    fn default() -> Self {
        UbjsonParseOptions {
            max_nesting_depth: 1024,
            max_items: 1 << 24,
        }
    }
}

struct Frame {
    is_map: bool,
    /// `Some` for `#`-counted containers, which have no end marker.
    remaining: Option<u64>,
    /// `Some` for `$`-typed containers: elements carry no type markers.
    elem_type: Option<u8>,
    expect_key: bool,
}

/// Incremental UBJSON parser, including the `$`/`#` strongly-typed and
/// counted container optimizations. A counted `$U` array is decoded as a
/// byte string.
pub struct UbjsonParser {
    input: InputBuffer,
    options: UbjsonParseOptions,
    frames: Vec<Frame>,
    done_: bool,
    failure: Option<(ParseCode, u64)>,
}

impl UbjsonParser {
    pub fn new() -> Self {
        Self::with_options(UbjsonParseOptions::default())
    }

    pub fn with_options(options: UbjsonParseOptions) -> Self {
        UbjsonParser {
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
            Some(Frame {
                is_map: true,
                expect_key: true,
                ..
            })
        )
    }

    fn note_value_done(&mut self) {
        match self.frames.last_mut() {
            None => self.done_ = true,
            Some(frame) => {
                if let Some(r) = &mut frame.remaining {
                    *r -= 1;
                }
                if frame.is_map {
                    frame.expect_key = true;
                }
            }
        }
    }

    fn emit_scalar(&mut self, event: Event) -> Result<Option<Event>> {
        self.note_value_done();
        Ok(Some(event))
    }

    /// Reads an integer length value at `start`: `(bytes consumed, value)`.
    /// `Ok(None)` means not enough buffered input.
    fn peek_count(&mut self, start: usize) -> Result<Option<(usize, i64)>> {
        let Some(marker) = self.input.peek(start) else {
            return Ok(None);
        };
        let parsed = match marker {
            b'i' => self
                .input
                .peek(start + 1)
                .map(|b| (2, i64::from(b as i8))),
            b'U' => self.input.peek(start + 1).map(|b| (2, i64::from(b))),
            b'I' => self
                .input
                .peek_array::<2>(start + 1)
                .map(|raw| (3, i64::from(I16::<BigEndian>::from_bytes(raw).get()))),
            b'l' => self
                .input
                .peek_array::<4>(start + 1)
                .map(|raw| (5, i64::from(I32::<BigEndian>::from_bytes(raw).get()))),
            b'L' => self
                .input
                .peek_array::<8>(start + 1)
                .map(|raw| (9, I64::<BigEndian>::from_bytes(raw).get())),
            _ => return Err(self.err(ParseCode::SyntaxError)),
        };
        Ok(parsed)
    }

    /// Begins a container after its bracket: handles the optional `$` type
    /// and `#` count headers atomically.
    fn begin_container(&mut self, is_map: bool) -> Result<Option<Event>> {
        if self.frames.len() >= self.options.max_nesting_depth {
            return Err(self.err(ParseCode::MaxNestingDepthExceeded));
        }
        let mut at = 1usize;
        let mut elem_type = None;
        let Some(next) = self.input.peek(at) else {
            return self.suspend_or_eof();
        };
        if next == b'$' {
            let Some(ty) = self.input.peek(at + 1) else {
                return self.suspend_or_eof();
            };
            if !matches!(
                ty,
                b'i' | b'U' | b'I' | b'l' | b'L' | b'd' | b'D' | b'C' | b'S' | b'H' | b'T'
                    | b'F' | b'Z'
            ) {
                return Err(self.err(ParseCode::UnknownTypeTag(ty)));
            }
            elem_type = Some(ty);
            at += 2;
        }
        let count = {
            let Some(next) = self.input.peek(at) else {
                return self.suspend_or_eof();
            };
            if next == b'#' {
                let Some((consumed, n)) = self.peek_count(at + 1)? else {
                    return self.suspend_or_eof();
                };
                if n < 0 {
                    return Err(self.err(ParseCode::SyntaxError));
                }
                if n as u64 > self.options.max_items as u64 {
                    return Err(self.err(ParseCode::TooManyItems));
                }
                at += 1 + consumed;
                Some(n as u64)
            } else if elem_type.is_some() {
                // a typed container requires a count
                return Err(self.err(ParseCode::SyntaxError));
            } else {
                None
            }
        };

        // counted byte array: decode as a byte string
        if !is_map && elem_type == Some(b'U') {
            let Some(n) = count else {
                return Err(self.err(ParseCode::SyntaxError));
            };
            let n = n as usize;
            if self.input.remaining() < at + n {
                return self.suspend_or_eof();
            }
            self.input.advance(at);
            let Some(payload) = self.input.take_bytes(n) else {
                return self.suspend_or_eof();
            };
            return self.emit_scalar(Event::Bytes {
                value: payload,
                tag: SemanticTag::None,
            });
        }

        self.input.advance(at);
        self.frames.push(Frame {
            is_map,
            remaining: count,
            elem_type,
            expect_key: is_map,
        });
        let size_hint = count.and_then(|n| usize::try_from(n).ok());
        Ok(Some(if is_map {
            Event::BeginObject {
                size_hint,
                tag: SemanticTag::None,
            }
        } else {
            Event::BeginArray {
                size_hint,
                tag: SemanticTag::None,
            }
        }))
    }

    /// Reads a `(length, bytes)` string payload at `start`, returning the
    /// text. `Ok(None)` means not enough buffered input.
    fn peek_sized_text(&mut self, start: usize) -> Result<Option<(usize, String)>> {
        let Some((consumed, len)) = self.peek_count(start)? else {
            return Ok(None);
        };
        if len < 0 {
            return Err(self.err(ParseCode::SyntaxError));
        }
        let len = len as usize;
        let total = start + consumed + len;
        if self.input.remaining() < total {
            return Ok(None);
        }
        let Some(raw) = self.input.peek_slice(total) else {
            return Ok(None);
        };
        match std::str::from_utf8(&raw[start + consumed..]) {
            Ok(text) => {
                let text = text.to_string();
                Ok(Some((total, text)))
            }
            Err(_) => Err(self.err(ParseCode::IllegalUtf8)),
        }
    }

    fn read_value(&mut self, ty: u8, header: usize) -> Result<Option<Event>> {
        match ty {
            b'Z' => {
                self.input.advance(header);
                self.emit_scalar(Event::Null(SemanticTag::None))
            }
            b'T' | b'F' => {
                self.input.advance(header);
                self.emit_scalar(Event::Bool(ty == b'T'))
            }
            b'i' => {
                let Some(b) = self.input.peek(header) else {
                    return self.suspend_or_eof();
                };
                self.input.advance(header + 1);
                self.emit_scalar(Event::Int {
                    value: i64::from(b as i8),
                    tag: SemanticTag::None,
                })
            }
            b'U' => {
                let Some(b) = self.input.peek(header) else {
                    return self.suspend_or_eof();
                };
                self.input.advance(header + 1);
                self.emit_scalar(Event::Int {
                    value: i64::from(b),
                    tag: SemanticTag::None,
                })
            }
            b'I' => {
                let Some(raw) = self.input.peek_array::<2>(header) else {
                    return self.suspend_or_eof();
                };
                self.input.advance(header + 2);
                self.emit_scalar(Event::Int {
                    value: i64::from(I16::<BigEndian>::from_bytes(raw).get()),
                    tag: SemanticTag::None,
                })
            }
            b'l' => {
                let Some(raw) = self.input.peek_array::<4>(header) else {
                    return self.suspend_or_eof();
                };
                self.input.advance(header + 4);
                self.emit_scalar(Event::Int {
                    value: i64::from(I32::<BigEndian>::from_bytes(raw).get()),
                    tag: SemanticTag::None,
                })
            }
            b'L' => {
                let Some(raw) = self.input.peek_array::<8>(header) else {
                    return self.suspend_or_eof();
                };
                self.input.advance(header + 8);
                self.emit_scalar(Event::Int {
                    value: I64::<BigEndian>::from_bytes(raw).get(),
                    tag: SemanticTag::None,
                })
            }
            b'd' => {
                let Some(raw) = self.input.peek_array::<4>(header) else {
                    return self.suspend_or_eof();
                };
                self.input.advance(header + 4);
                self.emit_scalar(Event::Double {
                    value: f64::from(F32::<BigEndian>::from_bytes(raw).get()),
                    precision: 0,
                    tag: SemanticTag::None,
                })
            }
            b'D' => {
                let Some(raw) = self.input.peek_array::<8>(header) else {
                    return self.suspend_or_eof();
                };
                self.input.advance(header + 8);
                self.emit_scalar(Event::Double {
                    value: F64::<BigEndian>::from_bytes(raw).get(),
                    precision: 0,
                    tag: SemanticTag::None,
                })
            }
            b'C' => {
                let Some(b) = self.input.peek(header) else {
                    return self.suspend_or_eof();
                };
                if b > 0x7f {
                    return Err(self.err(ParseCode::SyntaxError));
                }
                self.input.advance(header + 1);
                self.emit_scalar(Event::String {
                    value: (b as char).to_string(),
                    tag: SemanticTag::None,
                })
            }
            b'S' => {
                let Some((total, text)) = self.peek_sized_text(header)? else {
                    return self.suspend_or_eof();
                };
                self.input.advance(total);
                self.emit_scalar(Event::String {
                    value: text,
                    tag: SemanticTag::None,
                })
            }
            b'H' => {
                let Some((total, text)) = self.peek_sized_text(header)? else {
                    return self.suspend_or_eof();
                };
                let Some(tag) = classify_high_precision(&text) else {
                    return Err(self.err(ParseCode::SyntaxError));
                };
                self.input.advance(total);
                self.emit_scalar(Event::String { value: text, tag })
            }
            b'[' => self.begin_container(false),
            b'{' => self.begin_container(true),
            b']' => {
                match self.frames.last() {
                    Some(Frame {
                        is_map: false,
                        remaining: None,
                        ..
                    }) => {}
                    _ => return Err(self.err(ParseCode::SyntaxError)),
                }
                self.input.advance(header);
                self.frames.pop();
                self.note_value_done();
                Ok(Some(Event::EndArray))
            }
            _ => Err(self.err(ParseCode::UnknownTypeTag(ty))),
        }
    }
}

impl Default for UbjsonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for UbjsonParser {
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
            // counted containers end when their countdown reaches zero
            match self.frames.last() {
                Some(Frame {
                    remaining: Some(0),
                    is_map,
                    expect_key,
                    ..
                }) if !*is_map || *expect_key => {
                    let is_map = *is_map;
                    self.frames.pop();
                    self.note_value_done();
                    return Ok(Some(if is_map {
                        Event::EndObject
                    } else {
                        Event::EndArray
                    }));
                }
                _ => {}
            }

            if self.expecting_key() {
                let Some(m) = self.input.peek(0) else {
                    return self.suspend_or_eof();
                };
                if m == b'N' {
                    self.input.advance(1);
                    continue;
                }
                if m == b'}' {
                    match self.frames.last() {
                        Some(Frame {
                            remaining: None, ..
                        }) => {
                            self.input.advance(1);
                            self.frames.pop();
                            self.note_value_done();
                            return Ok(Some(Event::EndObject));
                        }
                        _ => return Err(self.err(ParseCode::SyntaxError)),
                    }
                }
                let Some((total, name)) = self.peek_sized_text(0)? else {
                    return self.suspend_or_eof();
                };
                self.input.advance(total);
                if let Some(frame) = self.frames.last_mut() {
                    frame.expect_key = false;
                }
                return Ok(Some(Event::Key(name)));
            }

            // typed container elements carry no markers
            if let Some(Frame {
                elem_type: Some(ty),
                ..
            }) = self.frames.last()
            {
                let ty = *ty;
                return self.read_value(ty, 0);
            }

            let Some(m) = self.input.peek(0) else {
                return self.suspend_or_eof();
            };
            if m == b'N' {
                self.input.advance(1);
                continue;
            }
            return self.read_value(m, 1);
        }
    }

    fn done(&self) -> bool {
        self.done_
    }

    fn offset(&self) -> u64 {
        self.input.offset()
    }
}

fn classify_high_precision(text: &str) -> Option<SemanticTag> {
    let rest = text.strip_prefix('-').unwrap_or(text);
    if rest.is_empty() {
        return None;
    }
    if rest.bytes().all(|b| b.is_ascii_digit()) {
        return Some(SemanticTag::BigInt);
    }
    if rest.bytes().any(|b| b.is_ascii_digit())
        && rest
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return Some(SemanticTag::BigDec);
    }
    None
}
