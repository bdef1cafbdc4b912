//! The flush controller.
//!
//! Flushing is the only suspension point of the engine. Writers consult
//! [`should_flush`] between tokens and return `Ok(false)` when it says so; the
//! driver loop [`write_to_completion`] then drains the sink and re-enters the
//! root writer, which walks back down the write stack to where it stopped.

use crate::{Error, JsonWrite, Result, WriterState};

/// Statistics about one driven write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Completion {
    /// Number of times the root writer was invoked.
    pub calls: usize,
    /// Number of flushes performed in between.
    pub flushes: usize,
}

/// Returns `true` once the sink's free capacity dropped below the low-water mark.
#[inline]
pub fn should_flush(state: &WriterState<'_>) -> bool {
    state.free_capacity() < state.options().flush_threshold
}

/// Drains the sink.
///
/// # Errors
///
/// Propagates the sink's I/O error.
pub fn flush(state: &mut WriterState<'_>) -> Result<()> {
    tracing::debug!(free = state.free_capacity(), "flushing sink");
    state.flush()
}

/// Writes `value` completely, flushing whenever a writer suspends for space.
///
/// Bytes still buffered when the value completes are left in the sink; call
/// [`WriterState::flush`] to drain them.
///
/// # Examples
///
/// ```rust
/// use chunked_json::{write_to_completion, BufferSink, WriterOptions, WriterState};
///
/// let items = vec![1, 2, 3];
/// let mut sink = BufferSink::with_capacity(Vec::new(), 1);
/// let mut state = WriterState::new(&mut sink, WriterOptions::new());
/// let completion = write_to_completion(&items, &mut state).unwrap();
/// assert!(completion.calls >= 3);
/// state.flush().unwrap();
/// drop(state);
/// assert_eq!(sink.into_inner(), b"[1,2,3]");
/// ```
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the state still holds a suspended write for a
/// different value, and any terminal error raised by the writers.
pub fn write_to_completion<T: JsonWrite + ?Sized>(
    value: &T,
    state: &mut WriterState<'_>,
) -> Result<Completion> {
    if state.stack.depth() != 0 {
        return Err(Error::protocol(
            "write_to_completion re-entered from inside a writer",
        ));
    }

    let mut completion = Completion::default();
    loop {
        completion.calls += 1;
        if value.write_json(state)? {
            break;
        }
        if should_flush(state) {
            flush(state)?;
            completion.flushes += 1;
        }
    }
    tracing::trace!(
        calls = completion.calls,
        flushes = completion.flushes,
        "value written"
    );
    Ok(completion)
}
