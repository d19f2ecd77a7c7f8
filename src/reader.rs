use bytes::{Buf, Bytes, BytesMut};

/// Chunked input buffer shared by every parser.
///
/// Chunks accumulate in a `BytesMut`; the state machines peek ahead, then
/// consume whole tokens, so a token split across chunk boundaries simply
/// stays in the buffer until the rest arrives.
pub(crate) struct InputBuffer {
    buf: BytesMut,
    offset: u64,
    eof: bool,
}

impl InputBuffer {
    pub(crate) fn new() -> Self {
        InputBuffer {
            buf: BytesMut::new(),
            offset: 0,
            eof: false,
        }
    }

    pub(crate) fn update(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    pub(crate) fn finish(&mut self) {
        self.eof = true;
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.eof
    }

    /// Bytes buffered but not yet consumed.
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Total bytes consumed so far.
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    pub(crate) fn peek(&self, index: usize) -> Option<u8> {
        self.buf.get(index).copied()
    }

    pub(crate) fn peek_slice(&self, len: usize) -> Option<&[u8]> {
        self.buf.get(..len)
    }

    /// Copies the next `N` bytes without consuming them.
    pub(crate) fn peek_array<const N: usize>(&self, start: usize) -> Option<[u8; N]> {
        let slice = self.buf.get(start..start + N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Some(out)
    }

    pub(crate) fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.buf.len());
        self.buf.advance(n);
        self.offset += n as u64;
    }

    /// Consumes `n` bytes as a shared buffer; O(1) for the common case of a
    /// payload fitting one chunk.
    pub(crate) fn take_bytes(&mut self, n: usize) -> Option<Bytes> {
        if self.buf.len() < n {
            return None;
        }
        let taken = self.buf.split_to(n).freeze();
        self.offset += n as u64;
        Some(taken)
    }
}
