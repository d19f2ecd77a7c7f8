use std::io::Write;

use data_encoding::{BASE64, BASE64URL_NOPAD, HEXUPPER};

use crate::dtoa::format_double;
use crate::visit::{Flow, Visitor};
use crate::{Result, SemanticTag};

/// Whitespace mode for the text encoder.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Indent {
    /// No whitespace at all.
    #[default]
    None,
    /// One item per line, indented by `indent_width` spaces per level.
    Pretty,
}

/// Rendering for byte strings whose value carries no base-encoding tag.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ByteStringFormat {
    Base16,
    #[default]
    Base64,
    Base64Url,
}

#[derive(Clone, Debug)]
pub struct JsonEncodeOptions {
    pub indent: Indent,
    pub indent_width: usize,
    /// Escape every non-ASCII code point as `\uXXXX` for 7-bit-clean output.
    pub escape_all_non_ascii: bool,
    pub byte_string_format: ByteStringFormat,
}

impl Default for JsonEncodeOptions {
    fn default() -> Self {
        JsonEncodeOptions {
            indent: Indent::None,
            indent_width: 2,
            escape_all_non_ascii: false,
            byte_string_format: ByteStringFormat::default(),
        }
    }
}

impl JsonEncodeOptions {
    pub fn pretty() -> Self {
        JsonEncodeOptions {
            indent: Indent::Pretty,
            ..Default::default()
        }
    }
}

struct Frame {
    is_object: bool,
    count: usize,
}

/// Streaming JSON text encoder; a [`Visitor`] fed either by a live parser
/// (transcoding) or by a value walk.
pub struct JsonEncoder<W: Write> {
    out: W,
    options: JsonEncodeOptions,
    frames: Vec<Frame>,
    after_key: bool,
}

impl<W: Write> JsonEncoder<W> {
    pub fn new(out: W) -> Self {
        Self::with_options(out, JsonEncodeOptions::default())
    }

    pub fn with_options(out: W, options: JsonEncodeOptions) -> Self {
        JsonEncoder {
            out,
            options,
            frames: Vec::new(),
            after_key: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn newline_indent(&mut self, depth: usize) -> Result<()> {
        self.out.write_all(b"\n")?;
        for _ in 0..depth * self.options.indent_width {
            self.out.write_all(b" ")?;
        }
        Ok(())
    }

    /// Separator before an item (array element or object key).
    fn before_item(&mut self) -> Result<()> {
        let pretty = self.options.indent == Indent::Pretty;
        let depth = self.frames.len();
        if let Some(top) = self.frames.last_mut() {
            if top.count > 0 {
                self.out.write_all(b",")?;
            }
            top.count += 1;
            if pretty {
                self.newline_indent(depth)?;
            }
        }
        Ok(())
    }

    /// Separator before a value; a no-op when the key already wrote it.
    fn before_value(&mut self) -> Result<()> {
        if self.after_key {
            self.after_key = false;
            Ok(())
        } else {
            self.before_item()
        }
    }

    fn close_container(&mut self, bracket: &[u8]) -> Result<Flow> {
        let frame = self.frames.pop();
        if self.options.indent == Indent::Pretty
            && frame.is_some_and(|f| f.count > 0)
        {
            self.newline_indent(self.frames.len())?;
        }
        self.out.write_all(bracket)?;
        Ok(Flow::Continue)
    }

    fn write_string(&mut self, s: &str) -> Result<()> {
        self.out.write_all(b"\"")?;
        let mut start = 0;
        for (i, c) in s.char_indices() {
            let short: Option<&[u8]> = match c {
                '"' => Some(b"\\\""),
                '\\' => Some(b"\\\\"),
                '\u{8}' => Some(b"\\b"),
                '\u{c}' => Some(b"\\f"),
                '\n' => Some(b"\\n"),
                '\r' => Some(b"\\r"),
                '\t' => Some(b"\\t"),
                _ => None,
            };
            let needs_unicode = short.is_none()
                && ((c as u32) < 0x20 || (self.options.escape_all_non_ascii && !c.is_ascii()));
            if short.is_none() && !needs_unicode {
                continue;
            }
            self.out.write_all(&s.as_bytes()[start..i])?;
            if let Some(short) = short {
                self.out.write_all(short)?;
            } else {
                self.write_unicode_escape(c)?;
            }
            start = i + c.len_utf8();
        }
        self.out.write_all(&s.as_bytes()[start..])?;
        self.out.write_all(b"\"")?;
        Ok(())
    }

    fn write_unicode_escape(&mut self, c: char) -> Result<()> {
        fn write_u16<W: Write>(out: &mut W, unit: u16) -> std::io::Result<()> {
            const HEX: &[u8; 16] = b"0123456789abcdef";
            let buf = [
                b'\\',
                b'u',
                HEX[usize::from(unit >> 12)],
                HEX[usize::from((unit >> 8) & 0xf)],
                HEX[usize::from((unit >> 4) & 0xf)],
                HEX[usize::from(unit & 0xf)],
            ];
            out.write_all(&buf)
        }

        let scalar = c as u32;
        if scalar <= 0xffff {
            write_u16(&mut self.out, scalar as u16)?;
        } else {
            let reduced = scalar - 0x10000;
            write_u16(&mut self.out, 0xd800 + (reduced >> 10) as u16)?;
            write_u16(&mut self.out, 0xdc00 + (reduced & 0x3ff) as u16)?;
        }
        Ok(())
    }

    fn write_number_text(&mut self, text: &str) -> Result<()> {
        // Tagged big numbers are stored as decimal strings; they go out as
        // raw number tokens as long as they really are one.
        if is_number_literal(text) {
            self.out.write_all(text.as_bytes())?;
            Ok(())
        } else {
            self.write_string(text)
        }
    }
}

impl<W: Write> Visitor for JsonEncoder<W> {
    fn end_document(&mut self) -> Result<Flow> {
        self.out.flush()?;
        Ok(Flow::Continue)
    }

    fn begin_array(&mut self, _size_hint: Option<usize>, _tag: SemanticTag) -> Result<Flow> {
        self.before_value()?;
        self.frames.push(Frame {
            is_object: false,
            count: 0,
        });
        self.out.write_all(b"[")?;
        Ok(Flow::Continue)
    }

    fn end_array(&mut self) -> Result<Flow> {
        self.close_container(b"]")
    }

    fn begin_object(&mut self, _size_hint: Option<usize>, _tag: SemanticTag) -> Result<Flow> {
        self.before_value()?;
        self.frames.push(Frame {
            is_object: true,
            count: 0,
        });
        self.out.write_all(b"{")?;
        Ok(Flow::Continue)
    }

    fn end_object(&mut self) -> Result<Flow> {
        self.close_container(b"}")
    }

    fn key(&mut self, name: &str) -> Result<Flow> {
        self.before_item()?;
        self.write_string(name)?;
        self.out.write_all(b":")?;
        if self.options.indent == Indent::Pretty {
            self.out.write_all(b" ")?;
        }
        self.after_key = true;
        Ok(Flow::Continue)
    }

    fn string_value(&mut self, value: &str, tag: SemanticTag) -> Result<Flow> {
        self.before_value()?;
        match tag {
            SemanticTag::BigInt | SemanticTag::BigDec | SemanticTag::Float128 => {
                self.write_number_text(value)?;
            }
            SemanticTag::NoEsc => {
                self.out.write_all(b"\"")?;
                self.out.write_all(value.as_bytes())?;
                self.out.write_all(b"\"")?;
            }
            _ => self.write_string(value)?,
        }
        Ok(Flow::Continue)
    }

    fn byte_string_value(&mut self, value: &[u8], tag: SemanticTag) -> Result<Flow> {
        self.before_value()?;
        let format = match tag {
            SemanticTag::Base16 => ByteStringFormat::Base16,
            SemanticTag::Base64 => ByteStringFormat::Base64,
            SemanticTag::Base64Url => ByteStringFormat::Base64Url,
            _ => self.options.byte_string_format,
        };
        let encoded = match format {
            ByteStringFormat::Base16 => HEXUPPER.encode(value),
            ByteStringFormat::Base64 => BASE64.encode(value),
            ByteStringFormat::Base64Url => BASE64URL_NOPAD.encode(value),
        };
        self.out.write_all(b"\"")?;
        self.out.write_all(encoded.as_bytes())?;
        self.out.write_all(b"\"")?;
        Ok(Flow::Continue)
    }

    fn int_value(&mut self, value: i64, _tag: SemanticTag) -> Result<Flow> {
        self.before_value()?;
        self.out
            .write_all(itoa::Buffer::new().format(value).as_bytes())?;
        Ok(Flow::Continue)
    }

    fn uint_value(&mut self, value: u64, _tag: SemanticTag) -> Result<Flow> {
        self.before_value()?;
        self.out
            .write_all(itoa::Buffer::new().format(value).as_bytes())?;
        Ok(Flow::Continue)
    }

    fn double_value(&mut self, value: f64, precision: u8, _tag: SemanticTag) -> Result<Flow> {
        self.before_value()?;
        if value.is_finite() {
            self.out
                .write_all(format_double(value, precision).as_bytes())?;
        } else {
            // JSON has no NaN/Infinity
            self.out.write_all(b"null")?;
        }
        Ok(Flow::Continue)
    }

    fn bool_value(&mut self, value: bool) -> Result<Flow> {
        self.before_value()?;
        self.out
            .write_all(if value { b"true" } else { b"false" })?;
        Ok(Flow::Continue)
    }

    fn null_value(&mut self, _tag: SemanticTag) -> Result<Flow> {
        self.before_value()?;
        self.out.write_all(b"null")?;
        Ok(Flow::Continue)
    }
}

fn is_number_literal(text: &str) -> bool {
    let rest = text.strip_prefix('-').unwrap_or(text);
    !rest.is_empty()
        && rest.chars().any(|c| c.is_ascii_digit())
        && rest
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
}
