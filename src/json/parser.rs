use crate::dtoa::significant_digits;
use crate::reader::InputBuffer;
use crate::scratch::Scratch;
use crate::visit::{Event, EventSource};
use crate::{Error, ParseCode, Result, SemanticTag};

/// Options for [`JsonParser`]. Defaults are strict RFC 8259; the leniencies
/// are opt-in only.
#[derive(Clone, Debug)]
pub struct JsonParseOptions {
    /// Containers nested deeper than this fail with
    /// `MaxNestingDepthExceeded`.
    pub max_nesting_depth: usize,
    /// Tolerate a comma before `]` or `}`.
    pub allow_trailing_comma: bool,
    /// Tolerate `//` and `/* */` comments wherever whitespace is allowed.
    pub allow_comments: bool,
}

impl Default for JsonParseOptions {
    fn default() -> Self {
        JsonParseOptions {
            max_nesting_depth: 1024,
            allow_trailing_comma: false,
            allow_comments: false,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ContainerKind {
    Array,
    Object,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum State {
    /// Expecting a value: document root, after `[`-comma, or after `:`.
    Value,
    /// Right after `[`; a `]` closes the empty array.
    FirstItemOrEnd,
    /// Right after `{`; a `}` closes the empty object.
    KeyOrEnd,
    /// After a comma inside an object.
    Key,
    /// Between an object key and its value.
    Colon,
    /// After a value inside a container.
    CommaOrEnd,
    /// Root value complete; only trailing whitespace is legal.
    Done,
}

#[derive(Clone, Copy)]
enum Esc {
    None,
    Backslash,
    Unicode { acc: u16, digits: u8 },
    PairBackslash { hi: u16 },
    PairU { hi: u16 },
    PairUnicode { hi: u16, acc: u16, digits: u8 },
}

#[derive(Clone, Copy)]
enum NumState {
    Minus,
    Zero,
    Int,
    Dot,
    Frac,
    ExpMark,
    ExpSign,
    ExpDigits,
}

enum Lex {
    None,
    Str { is_key: bool, esc: Esc },
    Num(NumState),
    Lit { text: &'static [u8], matched: usize },
    CommentStart,
    LineComment,
    BlockComment { star: bool },
}

enum Step {
    Event(Event),
    Suspend,
    Continue,
}

/// Incremental text JSON parser.
///
/// The container stack and the lexer micro-state are explicit fields, never
/// native recursion or control flow, so the parser can return to the caller
/// at any byte boundary — mid-string, mid-number, mid-escape — and pick up
/// exactly where it left off when more input arrives.
pub struct JsonParser {
    input: InputBuffer,
    scratch: Scratch,
    options: JsonParseOptions,
    state: State,
    lex: Lex,
    frames: Vec<ContainerKind>,
    line: u64,
    column: u64,
    failure: Option<(ParseCode, u64, u64, u64)>,
}

impl JsonParser {
    pub fn new() -> Self {
        Self::with_options(JsonParseOptions::default())
    }

    pub fn with_options(options: JsonParseOptions) -> Self {
        Self::with_scratch(options, Scratch::new())
    }

    /// Reuses an existing scratch buffer, carrying its capacity over from a
    /// previous parser.
    pub fn with_scratch(options: JsonParseOptions, scratch: Scratch) -> Self {
        JsonParser {
            input: InputBuffer::new(),
            scratch,
            options,
            state: State::Value,
            lex: Lex::None,
            frames: Vec::new(),
            line: 1,
            column: 1,
            failure: None,
        }
    }

    /// Clears all parse state for a fresh document, keeping the options and
    /// the scratch capacity.
    pub fn reset(&mut self) {
        self.input = InputBuffer::new();
        self.scratch.clear();
        self.state = State::Value;
        self.lex = Lex::None;
        self.frames.clear();
        self.line = 1;
        self.column = 1;
        self.failure = None;
    }

    /// Recovers the scratch buffer for reuse by another parser.
    pub fn into_scratch(self) -> Scratch {
        self.scratch
    }

    fn err(&mut self, code: ParseCode) -> Error {
        let failure = (code, self.line, self.column, self.input.offset());
        self.failure = Some(failure);
        Error::Parse {
            code,
            line: failure.1,
            column: failure.2,
            offset: failure.3,
        }
    }

    /// Consumes one byte, tracking line and column.
    fn bump(&mut self, b: u8) {
        self.input.advance(1);
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    fn after_value(&mut self) {
        self.state = if self.frames.is_empty() {
            State::Done
        } else {
            State::CommaOrEnd
        };
    }

    fn end_array(&mut self) -> Event {
        self.frames.pop();
        self.after_value();
        Event::EndArray
    }

    fn end_object(&mut self) -> Event {
        self.frames.pop();
        self.after_value();
        Event::EndObject
    }

    fn step_structural(&mut self) -> Result<Step> {
        let Some(b) = self.input.peek(0) else {
            if !self.input.is_eof() {
                return Ok(Step::Suspend);
            }
            return match self.state {
                State::Done => Ok(Step::Suspend),
                _ => Err(self.err(ParseCode::UnexpectedEof)),
            };
        };

        if matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
            self.bump(b);
            return Ok(Step::Continue);
        }
        if b == b'/' {
            if !self.options.allow_comments {
                return Err(self.err(ParseCode::SyntaxError));
            }
            self.bump(b);
            self.lex = Lex::CommentStart;
            return Ok(Step::Continue);
        }

        match self.state {
            State::Value | State::FirstItemOrEnd => match b {
                b'{' => {
                    if self.frames.len() >= self.options.max_nesting_depth {
                        return Err(self.err(ParseCode::MaxNestingDepthExceeded));
                    }
                    self.bump(b);
                    self.frames.push(ContainerKind::Object);
                    self.state = State::KeyOrEnd;
                    Ok(Step::Event(Event::BeginObject {
                        size_hint: None,
                        tag: SemanticTag::None,
                    }))
                }
                b'[' => {
                    if self.frames.len() >= self.options.max_nesting_depth {
                        return Err(self.err(ParseCode::MaxNestingDepthExceeded));
                    }
                    self.bump(b);
                    self.frames.push(ContainerKind::Array);
                    self.state = State::FirstItemOrEnd;
                    Ok(Step::Event(Event::BeginArray {
                        size_hint: None,
                        tag: SemanticTag::None,
                    }))
                }
                b']' if self.state == State::FirstItemOrEnd
                    || (self.options.allow_trailing_comma
                        && self.frames.last() == Some(&ContainerKind::Array)) =>
                {
                    self.bump(b);
                    Ok(Step::Event(self.end_array()))
                }
                b'"' => {
                    self.bump(b);
                    self.scratch.bytes.clear();
                    self.lex = Lex::Str {
                        is_key: false,
                        esc: Esc::None,
                    };
                    Ok(Step::Continue)
                }
                b'-' | b'0'..=b'9' => {
                    self.scratch.lexeme.clear();
                    self.scratch.lexeme.push(b as char);
                    self.bump(b);
                    self.lex = Lex::Num(match b {
                        b'-' => NumState::Minus,
                        b'0' => NumState::Zero,
                        _ => NumState::Int,
                    });
                    Ok(Step::Continue)
                }
                b't' => self.start_literal(b"true"),
                b'f' => self.start_literal(b"false"),
                b'n' => self.start_literal(b"null"),
                _ => Err(self.err(ParseCode::SyntaxError)),
            },
            State::KeyOrEnd | State::Key => match b {
                b'"' => {
                    self.bump(b);
                    self.scratch.bytes.clear();
                    self.lex = Lex::Str {
                        is_key: true,
                        esc: Esc::None,
                    };
                    Ok(Step::Continue)
                }
                b'}' if self.state == State::KeyOrEnd || self.options.allow_trailing_comma => {
                    self.bump(b);
                    Ok(Step::Event(self.end_object()))
                }
                _ => Err(self.err(ParseCode::SyntaxError)),
            },
            State::Colon => {
                if b == b':' {
                    self.bump(b);
                    self.state = State::Value;
                    Ok(Step::Continue)
                } else {
                    Err(self.err(ParseCode::SyntaxError))
                }
            }
            State::CommaOrEnd => match b {
                b',' => {
                    self.bump(b);
                    self.state = match self.frames.last() {
                        Some(ContainerKind::Array) => State::Value,
                        _ => State::Key,
                    };
                    Ok(Step::Continue)
                }
                b']' if self.frames.last() == Some(&ContainerKind::Array) => {
                    self.bump(b);
                    Ok(Step::Event(self.end_array()))
                }
                b'}' if self.frames.last() == Some(&ContainerKind::Object) => {
                    self.bump(b);
                    Ok(Step::Event(self.end_object()))
                }
                _ => Err(self.err(ParseCode::SyntaxError)),
            },
            State::Done => Err(self.err(ParseCode::SyntaxError)),
        }
    }

    fn start_literal(&mut self, text: &'static [u8]) -> Result<Step> {
        self.bump(text[0]);
        self.lex = Lex::Lit { text, matched: 1 };
        Ok(Step::Continue)
    }

    fn step_string(&mut self) -> Result<Step> {
        let Lex::Str { is_key, mut esc } = std::mem::replace(&mut self.lex, Lex::None) else {
            unreachable!()
        };
        loop {
            let Some(b) = self.input.peek(0) else {
                if self.input.is_eof() {
                    return Err(self.err(ParseCode::UnexpectedEof));
                }
                self.lex = Lex::Str { is_key, esc };
                return Ok(Step::Suspend);
            };
            self.bump(b);
            match esc {
                Esc::None => match b {
                    b'"' => {
                        let text = match std::str::from_utf8(&self.scratch.bytes) {
                            Ok(text) => text.to_string(),
                            Err(_) => return Err(self.err(ParseCode::IllegalUtf8)),
                        };
                        return if is_key {
                            self.state = State::Colon;
                            Ok(Step::Event(Event::Key(text)))
                        } else {
                            self.after_value();
                            Ok(Step::Event(Event::String {
                                value: text,
                                tag: SemanticTag::None,
                            }))
                        };
                    }
                    b'\\' => esc = Esc::Backslash,
                    0x00..=0x1f => return Err(self.err(ParseCode::SyntaxError)),
                    _ => self.scratch.bytes.push(b),
                },
                Esc::Backslash => {
                    let unescaped = match b {
                        b'"' => Some(b'"'),
                        b'\\' => Some(b'\\'),
                        b'/' => Some(b'/'),
                        b'b' => Some(0x08),
                        b'f' => Some(0x0c),
                        b'n' => Some(b'\n'),
                        b'r' => Some(b'\r'),
                        b't' => Some(b'\t'),
                        b'u' => None,
                        _ => return Err(self.err(ParseCode::InvalidEscape)),
                    };
                    match unescaped {
                        Some(byte) => {
                            self.scratch.bytes.push(byte);
                            esc = Esc::None;
                        }
                        None => esc = Esc::Unicode { acc: 0, digits: 0 },
                    }
                }
                Esc::Unicode { acc, digits } => {
                    let Some(h) = hex_digit(b) else {
                        return Err(self.err(ParseCode::InvalidEscape));
                    };
                    let acc = (acc << 4) | u16::from(h);
                    if digits < 3 {
                        esc = Esc::Unicode {
                            acc,
                            digits: digits + 1,
                        };
                    } else if (0xd800..=0xdbff).contains(&acc) {
                        esc = Esc::PairBackslash { hi: acc };
                    } else if (0xdc00..=0xdfff).contains(&acc) {
                        // lone low surrogate
                        return Err(self.err(ParseCode::InvalidEscape));
                    } else {
                        push_char(&mut self.scratch.bytes, u32::from(acc));
                        esc = Esc::None;
                    }
                }
                Esc::PairBackslash { hi } => {
                    if b != b'\\' {
                        return Err(self.err(ParseCode::InvalidEscape));
                    }
                    esc = Esc::PairU { hi };
                }
                Esc::PairU { hi } => {
                    if b != b'u' {
                        return Err(self.err(ParseCode::InvalidEscape));
                    }
                    esc = Esc::PairUnicode {
                        hi,
                        acc: 0,
                        digits: 0,
                    };
                }
                Esc::PairUnicode { hi, acc, digits } => {
                    let Some(h) = hex_digit(b) else {
                        return Err(self.err(ParseCode::InvalidEscape));
                    };
                    let acc = (acc << 4) | u16::from(h);
                    if digits < 3 {
                        esc = Esc::PairUnicode {
                            hi,
                            acc,
                            digits: digits + 1,
                        };
                    } else if (0xdc00..=0xdfff).contains(&acc) {
                        let scalar = 0x10000
                            + ((u32::from(hi) - 0xd800) << 10)
                            + (u32::from(acc) - 0xdc00);
                        push_char(&mut self.scratch.bytes, scalar);
                        esc = Esc::None;
                    } else {
                        return Err(self.err(ParseCode::InvalidEscape));
                    }
                }
            }
        }
    }

    fn step_number(&mut self) -> Result<Step> {
        let Lex::Num(mut ns) = std::mem::replace(&mut self.lex, Lex::None) else {
            unreachable!()
        };
        loop {
            let Some(b) = self.input.peek(0) else {
                if !self.input.is_eof() {
                    self.lex = Lex::Num(ns);
                    return Ok(Step::Suspend);
                }
                return self.finish_number(ns, ParseCode::UnexpectedEof);
            };
            let is_delimiter = matches!(
                b,
                b',' | b']' | b'}' | b' ' | b'\t' | b'\n' | b'\r' | b'/'
            );
            let next = match ns {
                NumState::Minus => match b {
                    b'0' => Some(NumState::Zero),
                    b'1'..=b'9' => Some(NumState::Int),
                    _ => None,
                },
                NumState::Zero => match b {
                    b'.' => Some(NumState::Dot),
                    b'e' | b'E' => Some(NumState::ExpMark),
                    _ if is_delimiter => return self.finish_number(ns, ParseCode::SyntaxError),
                    _ => None,
                },
                NumState::Int => match b {
                    b'0'..=b'9' => Some(NumState::Int),
                    b'.' => Some(NumState::Dot),
                    b'e' | b'E' => Some(NumState::ExpMark),
                    _ if is_delimiter => return self.finish_number(ns, ParseCode::SyntaxError),
                    _ => None,
                },
                NumState::Dot => match b {
                    b'0'..=b'9' => Some(NumState::Frac),
                    _ => None,
                },
                NumState::Frac => match b {
                    b'0'..=b'9' => Some(NumState::Frac),
                    b'e' | b'E' => Some(NumState::ExpMark),
                    _ if is_delimiter => return self.finish_number(ns, ParseCode::SyntaxError),
                    _ => None,
                },
                NumState::ExpMark => match b {
                    b'+' | b'-' => Some(NumState::ExpSign),
                    b'0'..=b'9' => Some(NumState::ExpDigits),
                    _ => None,
                },
                NumState::ExpSign => match b {
                    b'0'..=b'9' => Some(NumState::ExpDigits),
                    _ => None,
                },
                NumState::ExpDigits => match b {
                    b'0'..=b'9' => Some(NumState::ExpDigits),
                    _ if is_delimiter => return self.finish_number(ns, ParseCode::SyntaxError),
                    _ => None,
                },
            };
            match next {
                Some(state) => {
                    self.scratch.lexeme.push(b as char);
                    self.bump(b);
                    ns = state;
                }
                None => return Err(self.err(ParseCode::SyntaxError)),
            }
        }
    }

    /// Emits the event for a complete number lexeme. `incomplete` is the
    /// code to report when the lexeme stopped in a non-final state.
    fn finish_number(&mut self, ns: NumState, incomplete: ParseCode) -> Result<Step> {
        match ns {
            NumState::Zero | NumState::Int | NumState::Frac | NumState::ExpDigits => {}
            _ => return Err(self.err(incomplete)),
        }
        let lexeme = std::mem::take(&mut self.scratch.lexeme);
        let is_float = lexeme.contains(['.', 'e', 'E']);
        let event = if is_float {
            let value: f64 = match lexeme.parse() {
                Ok(value) => value,
                Err(_) => return Err(self.err(ParseCode::SyntaxError)),
            };
            if value.is_infinite() {
                return Err(self.err(ParseCode::NumberTooLarge));
            }
            let precision = significant_digits(&lexeme);
            self.scratch.lexeme = lexeme;
            Event::Double {
                value,
                precision,
                tag: SemanticTag::None,
            }
        } else if let Ok(value) = lexeme.parse::<i64>() {
            self.scratch.lexeme = lexeme;
            Event::Int {
                value,
                tag: SemanticTag::None,
            }
        } else if let Ok(value) = lexeme.parse::<u64>() {
            self.scratch.lexeme = lexeme;
            Event::UInt {
                value,
                tag: SemanticTag::None,
            }
        } else {
            // outside 64-bit range: keep the exact digits, tagged
            Event::String {
                value: lexeme,
                tag: SemanticTag::BigInt,
            }
        };
        self.after_value();
        Ok(Step::Event(event))
    }

    fn step_literal(&mut self) -> Result<Step> {
        let Lex::Lit { text, mut matched } = std::mem::replace(&mut self.lex, Lex::None) else {
            unreachable!()
        };
        loop {
            if matched == text.len() {
                let event = match text[0] {
                    b't' => Event::Bool(true),
                    b'f' => Event::Bool(false),
                    _ => Event::Null(SemanticTag::None),
                };
                self.after_value();
                return Ok(Step::Event(event));
            }
            let Some(b) = self.input.peek(0) else {
                if self.input.is_eof() {
                    return Err(self.err(ParseCode::UnexpectedEof));
                }
                self.lex = Lex::Lit { text, matched };
                return Ok(Step::Suspend);
            };
            if b != text[matched] {
                return Err(self.err(ParseCode::SyntaxError));
            }
            self.bump(b);
            matched += 1;
        }
    }

    fn step_comment(&mut self) -> Result<Step> {
        loop {
            let Some(b) = self.input.peek(0) else {
                return match &self.lex {
                    Lex::LineComment if self.input.is_eof() => {
                        self.lex = Lex::None;
                        Ok(Step::Continue)
                    }
                    _ if self.input.is_eof() => Err(self.err(ParseCode::UnexpectedEof)),
                    _ => Ok(Step::Suspend),
                };
            };
            self.bump(b);
            match &mut self.lex {
                Lex::CommentStart => match b {
                    b'/' => self.lex = Lex::LineComment,
                    b'*' => self.lex = Lex::BlockComment { star: false },
                    _ => return Err(self.err(ParseCode::SyntaxError)),
                },
                Lex::LineComment => {
                    if b == b'\n' {
                        self.lex = Lex::None;
                        return Ok(Step::Continue);
                    }
                }
                Lex::BlockComment { star } => {
                    if *star && b == b'/' {
                        self.lex = Lex::None;
                        return Ok(Step::Continue);
                    }
                    *star = b == b'*';
                }
                _ => unreachable!(),
            }
        }
    }
}

impl Default for JsonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for JsonParser {
    fn update(&mut self, chunk: &[u8]) {
        self.input.update(chunk);
    }

    fn finish(&mut self) {
        self.input.finish();
    }

    fn next_event(&mut self) -> Result<Option<Event>> {
        if let Some((code, line, column, offset)) = self.failure {
            return Err(Error::Parse {
                code,
                line,
                column,
                offset,
            });
        }
        loop {
            let step = match self.lex {
                Lex::None => self.step_structural()?,
                Lex::Str { .. } => self.step_string()?,
                Lex::Num(_) => self.step_number()?,
                Lex::Lit { .. } => self.step_literal()?,
                Lex::CommentStart | Lex::LineComment | Lex::BlockComment { .. } => {
                    self.step_comment()?
                }
            };
            match step {
                Step::Event(event) => return Ok(Some(event)),
                Step::Suspend => return Ok(None),
                Step::Continue => {}
            }
        }
    }

    fn done(&self) -> bool {
        self.state == State::Done
    }

    fn offset(&self) -> u64 {
        self.input.offset()
    }

    fn line(&self) -> u64 {
        self.line
    }

    fn column(&self) -> u64 {
        self.column
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn push_char(out: &mut Vec<u8>, scalar: u32) {
    // scalar is always a valid code point here: surrogate halves are
    // filtered before this is called.
    if let Some(c) = char::from_u32(scalar) {
        let mut buf = [0u8; 4];
        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
}
