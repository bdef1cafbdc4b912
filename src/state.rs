//! Per-write state shared by every writer in one serialization.

use crate::encoder::{EncodeStatus, JsonTextEncoder, TextEncoder, MAX_ESCAPED_CHAR_LEN};
use crate::sink::Sink;
use crate::stack::WriteStack;
use crate::{Error, Result, WriterOptions};
use std::fmt;
use std::io::Write as _;

// Scalar tokens up to this length are formatted on the stack.
const INLINE_TOKEN_LEN: usize = 64;

/// Everything one in-flight serialization needs.
///
/// A `WriterState` exclusively borrows its sink and serves exactly one value graph
/// at a time. Between resumed calls the caller may flush the sink but must not
/// start writing a different root value until the current one has completed or
/// [`reset`](Self::reset) has been called.
///
/// # Examples
///
/// ```rust
/// use chunked_json::{write_to_completion, BufferSink, WriterOptions, WriterState};
///
/// let mut sink = BufferSink::with_capacity(Vec::new(), 4);
/// let mut state = WriterState::new(&mut sink, WriterOptions::new());
/// write_to_completion(&vec!["a", "b"], &mut state).unwrap();
/// state.flush().unwrap();
/// drop(state);
/// assert_eq!(sink.into_inner(), br#"["a","b"]"#);
/// ```
pub struct WriterState<'s> {
    sink: &'s mut dyn Sink,
    encoder: Box<dyn TextEncoder>,
    options: WriterOptions,
    pub(crate) stack: WriteStack,
    /// Reused buffer for joining a held-back UTF-16 unit with the next slice.
    pub(crate) scratch: Vec<u16>,
}

impl<'s> WriterState<'s> {
    pub fn new(sink: &'s mut dyn Sink, options: WriterOptions) -> Self {
        let encoder = Box::new(JsonTextEncoder::from_options(&options));
        Self::with_encoder(sink, options, encoder)
    }

    /// Creates a state that escapes text with a custom encoder.
    pub fn with_encoder(
        sink: &'s mut dyn Sink,
        options: WriterOptions,
        encoder: Box<dyn TextEncoder>,
    ) -> Self {
        WriterState {
            sink,
            encoder,
            options,
            stack: WriteStack::new(),
            scratch: Vec::new(),
        }
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    pub fn encoder(&self) -> &dyn TextEncoder {
        self.encoder.as_ref()
    }

    pub fn stack(&self) -> &WriteStack {
        &self.stack
    }

    /// Returns `true` while a suspended value waits to be resumed.
    pub fn is_suspended(&self) -> bool {
        self.stack.is_suspended()
    }

    /// Abandons any suspended value so the state can start a new one.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.scratch.clear();
    }

    pub fn free_capacity(&self) -> usize {
        self.sink.free_capacity()
    }

    /// Drains the sink.
    ///
    /// # Errors
    ///
    /// Propagates the sink's I/O error.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    /// Writes a token that must not be split.
    pub(crate) fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let region = self.sink.reserve(bytes.len())?;
        region.copy_from_slice(bytes);
        self.sink.commit(bytes.len());
        Ok(())
    }

    /// Writes a whole scalar token, refusing it where a suspended value waits.
    pub(crate) fn write_leaf(&mut self, bytes: &[u8]) -> Result<()> {
        self.stack.expect_fresh()?;
        self.write_raw(bytes)
    }

    /// Writes the `Display` form of a scalar whose length is at most `max_len`.
    ///
    /// The token is formatted first so the sink is asked for exactly its length.
    pub(crate) fn write_display<T: fmt::Display>(
        &mut self,
        value: &T,
        max_len: usize,
        quoted: bool,
    ) -> Result<()> {
        self.stack.expect_fresh()?;
        let quote: &[u8] = if quoted { b"\"" } else { b"" };
        if max_len + 2 > INLINE_TOKEN_LEN {
            let text = value.to_string();
            let len = text.len() + 2 * quote.len();
            let region = self.sink.reserve(len)?;
            region[..quote.len()].copy_from_slice(quote);
            region[quote.len()..len - quote.len()].copy_from_slice(text.as_bytes());
            region[len - quote.len()..].copy_from_slice(quote);
            self.sink.commit(len);
            return Ok(());
        }

        let mut buf = [0u8; INLINE_TOKEN_LEN];
        let mut cursor = std::io::Cursor::new(&mut buf[..]);
        cursor.write_all(quote)?;
        write!(cursor, "{}", value)?;
        cursor.write_all(quote)?;
        let used = cursor.position() as usize;
        self.write_raw(&buf[..used])
    }

    /// Writes `text` as a complete, escaped string token followed by `trailing`.
    ///
    /// Only the exact escaped length is reserved.
    pub(crate) fn write_escaped(&mut self, text: &str, trailing: &[u8]) -> Result<()> {
        let bytes = text.as_bytes();
        if self.encoder.first_index_needing_escape(bytes).is_none() {
            let len = bytes.len() + 2 + trailing.len();
            let region = self.sink.reserve(len)?;
            region[0] = b'"';
            region[1..=bytes.len()].copy_from_slice(bytes);
            region[bytes.len() + 1] = b'"';
            region[bytes.len() + 2..].copy_from_slice(trailing);
            self.sink.commit(len);
            return Ok(());
        }

        let mut escaped = vec![0u8; bytes.len() * MAX_ESCAPED_CHAR_LEN];
        let result = self.encoder.encode(bytes, &mut escaped, true);
        if result.status != EncodeStatus::Done {
            return Err(Error::encoding(
                result.consumed,
                "text encoder rejected a short string",
            ));
        }
        let written = result.written;
        let len = written + 2 + trailing.len();
        let region = self.sink.reserve(len)?;
        region[0] = b'"';
        region[1..=written].copy_from_slice(&escaped[..written]);
        region[written + 1] = b'"';
        region[written + 2..].copy_from_slice(trailing);
        self.sink.commit(len);
        Ok(())
    }

    /// Reserves a region for the chunked writers.
    pub(crate) fn reserve(&mut self, min: usize) -> Result<&mut [u8]> {
        self.sink.reserve(min)
    }

    pub(crate) fn commit(&mut self, used: usize) {
        self.sink.commit(used);
    }

    /// Splits the borrow so a chunked writer can encode straight into the sink.
    pub(crate) fn encoder_and_region(
        &mut self,
        min: usize,
    ) -> Result<(&dyn TextEncoder, &mut [u8])> {
        let region = self.sink.reserve(min)?;
        Ok((self.encoder.as_ref(), region))
    }
}

impl fmt::Debug for WriterState<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterState")
            .field("options", &self.options)
            .field("stack", &self.stack)
            .field("free_capacity", &self.sink.free_capacity())
            .finish()
    }
}
