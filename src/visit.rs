//! The event interface between parsers, builders and encoders.
//!
//! Format parsers produce a flat stream of structural and leaf events;
//! anything that consumes documents implements [`Visitor`] (push) or drives
//! an [`EventSource`] (pull). The two meet in [`visit`], which pumps a fully
//! fed source into a visitor — that one loop is transcoding, validation and
//! materialization, depending on the visitor plugged in.

use bytes::Bytes;

use crate::{Error, ParseCode, Result, SemanticTag};

/// Continuation signal returned by every visitor method.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[must_use]
pub enum Flow {
    Continue,
    /// Halt the producing loop without an error ("stop at first match").
    Stop,
}

impl Flow {
    #[inline]
    pub fn is_stop(self) -> bool {
        matches!(self, Flow::Stop)
    }
}

/// An event sink receiving one call per structural or leaf token.
///
/// All methods default to `Ok(Flow::Continue)`, so an implementation only
/// overrides the events it cares about. Size hints on `begin_array` /
/// `begin_object` are advisory: formats with unframed containers pass
/// `None`, and consumers must not trust a hint beyond pre-reserving
/// storage.
pub trait Visitor {
    fn begin_document(&mut self) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn end_document(&mut self) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn begin_array(&mut self, size_hint: Option<usize>, tag: SemanticTag) -> Result<Flow> {
        let _ = (size_hint, tag);
        Ok(Flow::Continue)
    }

    fn end_array(&mut self) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn begin_object(&mut self, size_hint: Option<usize>, tag: SemanticTag) -> Result<Flow> {
        let _ = (size_hint, tag);
        Ok(Flow::Continue)
    }

    fn end_object(&mut self) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn key(&mut self, name: &str) -> Result<Flow> {
        let _ = name;
        Ok(Flow::Continue)
    }

    fn string_value(&mut self, value: &str, tag: SemanticTag) -> Result<Flow> {
        let _ = (value, tag);
        Ok(Flow::Continue)
    }

    fn byte_string_value(&mut self, value: &[u8], tag: SemanticTag) -> Result<Flow> {
        let _ = (value, tag);
        Ok(Flow::Continue)
    }

    fn int_value(&mut self, value: i64, tag: SemanticTag) -> Result<Flow> {
        let _ = (value, tag);
        Ok(Flow::Continue)
    }

    fn uint_value(&mut self, value: u64, tag: SemanticTag) -> Result<Flow> {
        let _ = (value, tag);
        Ok(Flow::Continue)
    }

    fn double_value(&mut self, value: f64, precision: u8, tag: SemanticTag) -> Result<Flow> {
        let _ = (value, precision, tag);
        Ok(Flow::Continue)
    }

    fn bool_value(&mut self, value: bool) -> Result<Flow> {
        let _ = value;
        Ok(Flow::Continue)
    }

    fn null_value(&mut self, tag: SemanticTag) -> Result<Flow> {
        let _ = tag;
        Ok(Flow::Continue)
    }
}

/// Discards every event. Driving a parser into this visitor is
/// validate-only parsing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopVisitor;

impl Visitor for NoopVisitor {}

/// One parse event, owned. This is what the pull side ([`EventSource`],
/// [`Cursor`](crate::Cursor)) yields.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    BeginArray {
        size_hint: Option<usize>,
        tag: SemanticTag,
    },
    EndArray,
    BeginObject {
        size_hint: Option<usize>,
        tag: SemanticTag,
    },
    EndObject,
    Key(String),
    String {
        value: String,
        tag: SemanticTag,
    },
    Bytes {
        value: Bytes,
        tag: SemanticTag,
    },
    Int {
        value: i64,
        tag: SemanticTag,
    },
    UInt {
        value: u64,
        tag: SemanticTag,
    },
    Double {
        value: f64,
        precision: u8,
        tag: SemanticTag,
    },
    Bool(bool),
    Null(SemanticTag),
}

impl Event {
    /// Replays this event into a visitor.
    pub fn apply<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<Flow> {
        match self {
            Event::BeginArray { size_hint, tag } => visitor.begin_array(*size_hint, *tag),
            Event::EndArray => visitor.end_array(),
            Event::BeginObject { size_hint, tag } => visitor.begin_object(*size_hint, *tag),
            Event::EndObject => visitor.end_object(),
            Event::Key(name) => visitor.key(name),
            Event::String { value, tag } => visitor.string_value(value, *tag),
            Event::Bytes { value, tag } => visitor.byte_string_value(value, *tag),
            Event::Int { value, tag } => visitor.int_value(*value, *tag),
            Event::UInt { value, tag } => visitor.uint_value(*value, *tag),
            Event::Double {
                value,
                precision,
                tag,
            } => visitor.double_value(*value, *precision, *tag),
            Event::Bool(value) => visitor.bool_value(*value),
            Event::Null(tag) => visitor.null_value(*tag),
        }
    }

    pub fn is_begin_container(&self) -> bool {
        matches!(self, Event::BeginArray { .. } | Event::BeginObject { .. })
    }

    pub fn is_end_container(&self) -> bool {
        matches!(self, Event::EndArray | Event::EndObject)
    }
}

/// The pull side of a format parser.
///
/// Input arrives in chunks through [`update`](EventSource::update);
/// [`next_event`](EventSource::next_event) advances the state machine as
/// far as buffered input allows. `Ok(None)` means either "out of input
/// mid-document" (the suspension point — feed more bytes and call again) or
/// "document complete"; [`done`](EventSource::done) tells the two apart.
/// After an error the parser is terminal: no further events are emitted and
/// the same error keeps being returned, with the failure position still
/// queryable through `line`/`column`/`offset`.
pub trait EventSource {
    /// Supplies the next chunk of input bytes.
    fn update(&mut self, chunk: &[u8]);

    /// Marks the end of input; a document still open past this point is an
    /// `UnexpectedEof` parse error.
    fn finish(&mut self);

    fn next_event(&mut self) -> Result<Option<Event>>;

    /// `true` once a complete document has been parsed.
    fn done(&self) -> bool;

    /// Total bytes consumed.
    fn offset(&self) -> u64;

    /// 1-based failure/progress line; 0 for binary formats.
    fn line(&self) -> u64 {
        0
    }

    /// 1-based failure/progress column; 0 for binary formats.
    fn column(&self) -> u64 {
        0
    }
}

/// Pumps a fully fed source into a visitor, wrapped in a document frame.
///
/// Suspension (`Ok(None)` before `done`) is reported as `UnexpectedEof`
/// here; callers doing incremental feeding drive
/// [`next_event`](EventSource::next_event) themselves or use a
/// [`Cursor`](crate::Cursor).
pub fn visit<S, V>(source: &mut S, visitor: &mut V) -> Result<()>
where
    S: EventSource + ?Sized,
    V: Visitor + ?Sized,
{
    if visitor.begin_document()?.is_stop() {
        return Ok(());
    }
    loop {
        match source.next_event()? {
            Some(event) => {
                if event.apply(visitor)?.is_stop() {
                    return Ok(());
                }
            }
            None if source.done() => break,
            None => {
                return Err(Error::Parse {
                    code: ParseCode::UnexpectedEof,
                    line: source.line(),
                    column: source.column(),
                    offset: source.offset(),
                });
            }
        }
    }
    let _ = visitor.end_document()?;
    Ok(())
}

/// Walks a value into a visitor, wrapped in a document frame. This is the
/// reverse direction of [`visit`]: model to events to (typically) an
/// encoder.
pub fn dump<V>(value: &crate::Value, visitor: &mut V) -> Result<()>
where
    V: Visitor + ?Sized,
{
    if visitor.begin_document()?.is_stop() {
        return Ok(());
    }
    if value.accept(visitor)?.is_stop() {
        return Ok(());
    }
    let _ = visitor.end_document()?;
    Ok(())
}
