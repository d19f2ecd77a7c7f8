/// Reusable parse-time scratch storage.
///
/// Parsers accumulate partial tokens here (string contents across escape
/// sequences and chunk boundaries, number lexemes) and copy out only when a
/// token completes. This is the "temporary allocator" half of the storage
/// split: result values allocate independently, and the scratch capacity is
/// recycled across tokens — and, via [`JsonParser::reset`](
/// crate::json::JsonParser::reset) and friends, across whole documents.
#[derive(Debug, Default)]
pub struct Scratch {
    /// Raw string bytes; UTF-8 is validated when the token completes.
    pub(crate) bytes: Vec<u8>,
    /// Number lexeme under accumulation.
    pub(crate) lexeme: String,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        self.bytes.clear();
        self.lexeme.clear();
    }
}
