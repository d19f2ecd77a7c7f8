//! Pull-based iteration over a parser's event stream.
//!
//! A [`Cursor`] wraps any [`EventSource`] and exposes the current event,
//! structure-aware skipping, and materialization of just the current
//! subtree — the mechanism for processing very large documents with
//! bounded memory: only the subtrees the caller asks for are ever built.

use crate::builder::ValueBuilder;
use crate::visit::{Event, EventSource};
use crate::{Error, ParseCode, Result, Value};

pub struct Cursor<S: EventSource> {
    source: S,
    current: Option<Event>,
}

impl<S: EventSource> Cursor<S> {
    pub fn new(source: S) -> Self {
        Cursor {
            source,
            current: None,
        }
    }

    /// Supplies more input to the underlying parser.
    pub fn update(&mut self, chunk: &[u8]) {
        self.source.update(chunk);
    }

    pub fn finish(&mut self) {
        self.source.finish();
    }

    /// The event the cursor is positioned on, if any.
    pub fn current(&self) -> Option<&Event> {
        self.current.as_ref()
    }

    /// Advances to the next event. `Ok(None)` means the document is done
    /// (see [`Cursor::done`]) or the parser suspended waiting for input.
    pub fn next(&mut self) -> Result<Option<&Event>> {
        self.current = self.source.next_event()?;
        Ok(self.current.as_ref())
    }

    pub fn done(&self) -> bool {
        self.source.done()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn eof_error(&self) -> Error {
        Error::Parse {
            code: ParseCode::UnexpectedEof,
            line: self.source.line(),
            column: self.source.column(),
            offset: self.source.offset(),
        }
    }

    fn current_or_err(&mut self) -> Result<Event> {
        self.current
            .take()
            .ok_or_else(|| Error::Message("cursor is not positioned on a value".to_string()))
    }

    /// Materializes the value starting at the current event, consuming its
    /// whole subtree. The rest of the document stays unparsed.
    pub fn to_value(&mut self) -> Result<Value> {
        let first = self.current_or_err()?;
        let mut builder = ValueBuilder::new();
        let _ = first.apply(&mut builder)?;
        if first.is_begin_container() {
            let mut depth = 1u64;
            while depth > 0 {
                let Some(event) = self.source.next_event()? else {
                    return Err(self.eof_error());
                };
                if event.is_begin_container() {
                    depth += 1;
                } else if event.is_end_container() {
                    depth -= 1;
                }
                let _ = event.apply(&mut builder)?;
            }
        }
        builder
            .take()
            .ok_or_else(|| Error::Message("cursor is not positioned on a value".to_string()))
    }

    /// Skips the current event and, for containers, its whole subtree.
    pub fn skip(&mut self) -> Result<()> {
        let first = self.current_or_err()?;
        if first.is_begin_container() {
            let mut depth = 1u64;
            while depth > 0 {
                let Some(event) = self.source.next_event()? else {
                    return Err(self.eof_error());
                };
                if event.is_begin_container() {
                    depth += 1;
                } else if event.is_end_container() {
                    depth -= 1;
                }
            }
        }
        Ok(())
    }

    /// Scoped iteration over the elements of the array the cursor is
    /// positioned on. Consumes through the matching end event.
    pub fn array_elements(&mut self) -> Result<ArrayElements<'_, S>> {
        match self.current {
            Some(Event::BeginArray { .. }) => {
                self.current = None;
                Ok(ArrayElements {
                    cursor: self,
                    finished: false,
                })
            }
            _ => Err(Error::Message(
                "cursor is not positioned on an array".to_string(),
            )),
        }
    }

    /// Scoped iteration over the members of the object the cursor is
    /// positioned on.
    pub fn object_members(&mut self) -> Result<ObjectMembers<'_, S>> {
        match self.current {
            Some(Event::BeginObject { .. }) => {
                self.current = None;
                Ok(ObjectMembers {
                    cursor: self,
                    finished: false,
                })
            }
            _ => Err(Error::Message(
                "cursor is not positioned on an object".to_string(),
            )),
        }
    }
}

pub struct ArrayElements<'a, S: EventSource> {
    cursor: &'a mut Cursor<S>,
    finished: bool,
}

impl<S: EventSource> ArrayElements<'_, S> {
    /// The next element, materialized; `Ok(None)` once the array ends.
    pub fn next(&mut self) -> Result<Option<Value>> {
        if self.finished {
            return Ok(None);
        }
        match self.cursor.source.next_event()? {
            Some(Event::EndArray) => {
                self.finished = true;
                Ok(None)
            }
            Some(event) => {
                self.cursor.current = Some(event);
                Ok(Some(self.cursor.to_value()?))
            }
            None => Err(self.cursor.eof_error()),
        }
    }
}

pub struct ObjectMembers<'a, S: EventSource> {
    cursor: &'a mut Cursor<S>,
    finished: bool,
}

impl<S: EventSource> ObjectMembers<'_, S> {
    /// The next key/value member, materialized; `Ok(None)` once the object
    /// ends.
    pub fn next(&mut self) -> Result<Option<(String, Value)>> {
        if self.finished {
            return Ok(None);
        }
        let name = match self.cursor.source.next_event()? {
            Some(Event::EndObject) => {
                self.finished = true;
                return Ok(None);
            }
            Some(Event::Key(name)) => name,
            Some(_) => {
                return Err(Error::Message(
                    "expected an object key event".to_string(),
                ));
            }
            None => return Err(self.cursor.eof_error()),
        };
        match self.cursor.source.next_event()? {
            Some(event) => {
                self.cursor.current = Some(event);
                Ok(Some((name, self.cursor.to_value()?)))
            }
            None => Err(self.cursor.eof_error()),
        }
    }
}
