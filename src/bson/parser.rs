use zerocopy::byteorder::{F64, I32, I64, LittleEndian, U64};

use crate::reader::InputBuffer;
use crate::scratch::Scratch;
use crate::visit::{Event, EventSource};
use crate::{Error, ParseCode, Result, SemanticTag};

#[derive(Clone, Debug)]
pub struct BsonParseOptions {
    pub max_nesting_depth: usize,
}

impl Default for BsonParseOptions {
    fn default() -> Self {
        BsonParseOptions {
            max_nesting_depth: 1024,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting for the 4-byte little-endian document size.
    DocSize { is_array: bool },
    /// Inside a document: expect an element type byte or the terminator.
    ElementType,
    /// Accumulating an element's NUL-terminated key.
    Key { ty: u8 },
    /// Waiting for the element payload.
    Value { ty: u8 },
    Done,
}

struct Frame {
    is_array: bool,
    declared: u64,
    /// Offset of the size field; the declared size counts from here.
    start: u64,
}

/// Incremental BSON parser.
///
/// Every document carries a total-size prefix; the parser records it per
/// frame and checks it byte-exactly against what was actually consumed when
/// the terminator arrives — a mismatch is `TooFewItems`/`TooManyItems`, and
/// a prefix pointing past the input ends in `UnexpectedEof`.
pub struct BsonParser {
    input: InputBuffer,
    scratch: Scratch,
    options: BsonParseOptions,
    state: State,
    frames: Vec<Frame>,
    failure: Option<(ParseCode, u64)>,
}

impl BsonParser {
    pub fn new() -> Self {
        Self::with_options(BsonParseOptions::default())
    }

    pub fn with_options(options: BsonParseOptions) -> Self {
        BsonParser {
            input: InputBuffer::new(),
            scratch: Scratch::new(),
            options,
            state: State::DocSize { is_array: false },
            frames: Vec::new(),
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

    fn in_array(&self) -> bool {
        self.frames.last().is_some_and(|f| f.is_array)
    }

    fn take_i32(&mut self) -> Option<i32> {
        let raw = self.input.peek_array::<4>(0)?;
        self.input.advance(4);
        Some(I32::<LittleEndian>::from_bytes(raw).get())
    }

    fn step_doc_size(&mut self, is_array: bool) -> Result<Option<Event>> {
        if self.input.remaining() < 4 {
            return self.suspend_or_eof();
        }
        if self.frames.len() >= self.options.max_nesting_depth {
            return Err(self.err(ParseCode::MaxNestingDepthExceeded));
        }
        let start = self.input.offset();
        let Some(declared) = self.take_i32() else {
            return self.suspend_or_eof();
        };
        if declared < 5 {
            return Err(self.err(ParseCode::SyntaxError));
        }
        self.frames.push(Frame {
            is_array,
            declared: declared as u64,
            start,
        });
        self.state = State::ElementType;
        Ok(Some(if is_array {
            Event::BeginArray {
                size_hint: None,
                tag: SemanticTag::None,
            }
        } else {
            Event::BeginObject {
                size_hint: None,
                tag: SemanticTag::None,
            }
        }))
    }

    fn step_element_type(&mut self) -> Result<Option<Event>> {
        let Some(ty) = self.input.peek(0) else {
            return self.suspend_or_eof();
        };
        self.input.advance(1);
        if ty == 0x00 {
            let Some(frame) = self.frames.pop() else {
                return Err(self.err(ParseCode::SyntaxError));
            };
            let actual = self.input.offset() - frame.start;
            if actual < frame.declared {
                return Err(self.err(ParseCode::TooFewItems));
            }
            if actual > frame.declared {
                return Err(self.err(ParseCode::TooManyItems));
            }
            self.state = if self.frames.is_empty() {
                State::Done
            } else {
                State::ElementType
            };
            return Ok(Some(if frame.is_array {
                Event::EndArray
            } else {
                Event::EndObject
            }));
        }
        self.scratch.bytes.clear();
        self.state = State::Key { ty };
        Ok(None) // fall through to the key state
    }

    fn step_key(&mut self, ty: u8) -> Result<Option<Event>> {
        loop {
            let Some(b) = self.input.peek(0) else {
                return self.suspend_or_eof();
            };
            self.input.advance(1);
            if b != 0x00 {
                self.scratch.bytes.push(b);
                continue;
            }
            self.state = State::Value { ty };
            if self.in_array() {
                // array keys are just indices; consume and drop
                return Ok(None);
            }
            let name = match std::str::from_utf8(&self.scratch.bytes) {
                Ok(name) => name.to_string(),
                Err(_) => return Err(self.err(ParseCode::IllegalUtf8)),
            };
            return Ok(Some(Event::Key(name)));
        }
    }

    fn step_value(&mut self, ty: u8) -> Result<Option<Event>> {
        let event = match ty {
            0x01 => {
                let Some(raw) = self.input.peek_array::<8>(0) else {
                    return self.suspend_or_eof();
                };
                self.input.advance(8);
                Event::Double {
                    value: F64::<LittleEndian>::from_bytes(raw).get(),
                    precision: 0,
                    tag: SemanticTag::None,
                }
            }
            0x02 => {
                let Some(raw) = self.input.peek_array::<4>(0) else {
                    return self.suspend_or_eof();
                };
                let len = I32::<LittleEndian>::from_bytes(raw).get();
                if len < 1 {
                    return Err(self.err(ParseCode::SyntaxError));
                }
                let len = len as usize;
                if self.input.remaining() < 4 + len {
                    return self.suspend_or_eof();
                }
                self.input.advance(4);
                let Some(payload) = self.input.take_bytes(len) else {
                    return self.suspend_or_eof();
                };
                if payload[len - 1] != 0x00 {
                    return Err(self.err(ParseCode::SyntaxError));
                }
                let text = match std::str::from_utf8(&payload[..len - 1]) {
                    Ok(text) => text.to_string(),
                    Err(_) => return Err(self.err(ParseCode::IllegalUtf8)),
                };
                Event::String {
                    value: text,
                    tag: SemanticTag::None,
                }
            }
            0x03 => {
                self.state = State::DocSize { is_array: false };
                return Ok(None);
            }
            0x04 => {
                self.state = State::DocSize { is_array: true };
                return Ok(None);
            }
            0x05 => {
                let Some(raw) = self.input.peek_array::<4>(0) else {
                    return self.suspend_or_eof();
                };
                let len = I32::<LittleEndian>::from_bytes(raw).get();
                if len < 0 {
                    return Err(self.err(ParseCode::SyntaxError));
                }
                let len = len as usize;
                if self.input.remaining() < 5 + len {
                    return self.suspend_or_eof();
                }
                self.input.advance(5); // length + subtype
                let Some(payload) = self.input.take_bytes(len) else {
                    return self.suspend_or_eof();
                };
                Event::Bytes {
                    value: payload,
                    tag: SemanticTag::None,
                }
            }
            0x06 => Event::Null(SemanticTag::None),
            0x07 => {
                let Some(payload) = self.input.take_bytes(12) else {
                    return self.suspend_or_eof();
                };
                Event::Bytes {
                    value: payload,
                    tag: SemanticTag::Base16,
                }
            }
            0x08 => {
                let Some(b) = self.input.peek(0) else {
                    return self.suspend_or_eof();
                };
                self.input.advance(1);
                Event::Bool(b != 0)
            }
            0x09 => {
                let Some(raw) = self.input.peek_array::<8>(0) else {
                    return self.suspend_or_eof();
                };
                self.input.advance(8);
                Event::Int {
                    value: I64::<LittleEndian>::from_bytes(raw).get(),
                    tag: SemanticTag::EpochMillis,
                }
            }
            0x0a => Event::Null(SemanticTag::None),
            0x10 => {
                let Some(raw) = self.input.peek_array::<4>(0) else {
                    return self.suspend_or_eof();
                };
                self.input.advance(4);
                Event::Int {
                    value: i64::from(I32::<LittleEndian>::from_bytes(raw).get()),
                    tag: SemanticTag::None,
                }
            }
            0x11 => {
                let Some(raw) = self.input.peek_array::<8>(0) else {
                    return self.suspend_or_eof();
                };
                self.input.advance(8);
                Event::UInt {
                    value: U64::<LittleEndian>::from_bytes(raw).get(),
                    tag: SemanticTag::None,
                }
            }
            0x12 => {
                let Some(raw) = self.input.peek_array::<8>(0) else {
                    return self.suspend_or_eof();
                };
                self.input.advance(8);
                Event::Int {
                    value: I64::<LittleEndian>::from_bytes(raw).get(),
                    tag: SemanticTag::None,
                }
            }
            _ => return Err(self.err(ParseCode::UnknownTypeTag(ty))),
        };
        self.state = State::ElementType;
        Ok(Some(event))
    }
}

impl Default for BsonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for BsonParser {
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
            let before = self.input.offset();
            let state = self.state;
            let result = match state {
                State::Done => return Ok(None),
                State::DocSize { is_array } => self.step_doc_size(is_array)?,
                State::ElementType => self.step_element_type()?,
                State::Key { ty } => self.step_key(ty)?,
                State::Value { ty } => self.step_value(ty)?,
            };
            if let Some(event) = result {
                return Ok(Some(event));
            }
            // No event: either a state transition that consumed input, or a
            // suspension that consumed none.
            if self.input.offset() == before && self.state == state {
                return Ok(None);
            }
        }
    }

    fn done(&self) -> bool {
        self.state == State::Done
    }

    fn offset(&self) -> u64 {
        self.input.offset()
    }
}
