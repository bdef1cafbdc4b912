//! Composite writers: arrays and objects.
//!
//! A composite writer opens its bracket once, writes children one at a time and
//! consults the flush controller after the opening bracket, after each member
//! name and after each complete child. A child that returns `Ok(false)` is
//! incomplete, not skipped: the parent suspends without advancing its cursor and
//! resumes that same child on the next call.
//!
//! Indexable sources (`[T]`, `Vec<T>`, [`JsonObject`] implementations) keep a plain
//! integer cursor. Ordered maps (`BTreeMap`, `HashMap`) re-walk their entries up to
//! the cursor when resumed. One-pass sources ([`Streamed`], [`StreamedObject`])
//! keep their live iterator and the element in progress inside themselves; the
//! frame counts completed elements and the two are checked against each other on
//! every resumption.

use crate::flush::should_flush;
use crate::stack::{Frame, FrameKind, PropertyProgress, ValueProgress};
use crate::{Error, JsonWrite, Result, WriterState};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;

/// Writes one child one level deeper on the write stack.
#[inline]
pub(crate) fn write_child<T: JsonWrite + ?Sized>(
    child: &T,
    state: &mut WriterState<'_>,
) -> Result<bool> {
    state.stack.descend();
    let result = child.write_json(state);
    state.stack.ascend();
    result
}

/// Writes the opening token on the first call. Returns `false` when the sink
/// should be drained before the first child.
fn open(
    frame: &mut Frame,
    token: &[u8],
    has_children: bool,
    state: &mut WriterState<'_>,
) -> Result<bool> {
    if frame.value_progress == ValueProgress::NotStarted {
        state.write_raw(token)?;
        frame.value_progress = ValueProgress::Opened;
        return Ok(!(has_children && should_flush(state)));
    }
    Ok(true)
}

fn close(mut frame: Frame, token: &[u8], state: &mut WriterState<'_>) -> Result<bool> {
    state.write_raw(token)?;
    frame.value_progress = ValueProgress::Done;
    state.stack.complete();
    Ok(true)
}

fn resume_or_new(
    kind: FrameKind,
    identity: usize,
    len: usize,
    state: &mut WriterState<'_>,
) -> Result<Frame> {
    Ok(state
        .stack
        .resume(kind, identity, len)?
        .unwrap_or_else(|| Frame::new(kind, identity, len)))
}

/// Writes an array element, preceded by its comma the first time round.
///
/// The comma stands in for a member name in `property_progress`. Returns `false`
/// when the frame must be suspended, either because the element is incomplete
/// or because the sink wants draining.
fn write_element<T: JsonWrite + ?Sized>(
    frame: &mut Frame,
    item: &T,
    state: &mut WriterState<'_>,
) -> Result<bool> {
    if frame.property_progress == PropertyProgress::None {
        if frame.cursor > 0 {
            state.write_raw(b",")?;
        }
        frame.property_progress = PropertyProgress::NameWritten;
    }
    if !write_child(item, state)? {
        return Ok(false);
    }
    frame.cursor += 1;
    frame.property_progress = PropertyProgress::None;
    Ok(!should_flush(state))
}

/// Writes an object member as `"name":value`, preceded by its comma.
///
/// The comma and name are written once and recorded in the frame, so a value
/// resumed later is not preceded by its name twice. The flush controller is
/// consulted between name and value.
fn write_member<V: JsonWrite + ?Sized>(
    frame: &mut Frame,
    name: &str,
    value: &V,
    state: &mut WriterState<'_>,
) -> Result<bool> {
    if frame.property_progress == PropertyProgress::None {
        if frame.cursor > 0 {
            state.write_raw(b",")?;
        }
        state.write_escaped(name, b":")?;
        frame.property_progress = PropertyProgress::NameWritten;
        if should_flush(state) {
            return Ok(false);
        }
    }
    if !write_child(value, state)? {
        return Ok(false);
    }
    frame.cursor += 1;
    frame.property_progress = PropertyProgress::None;
    Ok(!should_flush(state))
}

/// Writes a slice as a JSON array, resumably.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if resumed with a different or resized slice.
pub fn write_array<T: JsonWrite>(items: &[T], state: &mut WriterState<'_>) -> Result<bool> {
    let identity = items.as_ptr() as usize;
    let mut frame = resume_or_new(FrameKind::Array, identity, items.len(), state)?;

    if !open(&mut frame, b"[", !items.is_empty(), state)? {
        state.stack.suspend(frame);
        return Ok(false);
    }
    while frame.cursor < items.len() {
        let item = &items[frame.cursor];
        if !write_element(&mut frame, item, state)? {
            state.stack.suspend(frame);
            return Ok(false);
        }
    }
    close(frame, b"]", state)
}

impl<T: JsonWrite> JsonWrite for [T] {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        write_array(self, state)
    }
}

impl<T: JsonWrite> JsonWrite for Vec<T> {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        write_array(self, state)
    }
}

impl<T: JsonWrite, const N: usize> JsonWrite for [T; N] {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        write_array(self, state)
    }
}

/// Live state of a one-pass source.
struct StreamSource<I: Iterator> {
    iter: I,
    /// Element pulled from `iter` and not yet completely written.
    current: Option<I::Item>,
    /// Elements completely written, mirrored by the frame's cursor.
    written: usize,
    started: bool,
    exhausted: bool,
}

impl<I: Iterator> StreamSource<I> {
    fn new(iter: I) -> Self {
        StreamSource {
            iter,
            current: None,
            written: 0,
            started: false,
            exhausted: false,
        }
    }

    /// Claims the source for a fresh write, or checks that a resumed frame
    /// matches how far the source has been written.
    fn attach(&mut self, resumed: Option<Frame>, kind: FrameKind, identity: usize) -> Result<Frame> {
        match resumed {
            Some(frame) if frame.cursor == self.written => Ok(frame),
            Some(frame) => Err(Error::Protocol(format!(
                "one-pass source wrote {} elements but the suspended frame expects {}",
                self.written, frame.cursor
            ))),
            None if self.started => Err(Error::protocol("one-pass source was already consumed")),
            None => {
                self.started = true;
                Ok(Frame::new(kind, identity, 0))
            }
        }
    }

    /// Element in progress, pulling the next one once the previous is done.
    fn current(&mut self) -> Option<&I::Item> {
        if self.current.is_none() && !self.exhausted {
            self.current = self.iter.next();
            self.exhausted = self.current.is_none();
        }
        self.current.as_ref()
    }

    fn advance(&mut self) {
        self.current = None;
        self.written += 1;
    }
}

fn borrow_source<I: Iterator>(
    source: &RefCell<StreamSource<I>>,
) -> Result<std::cell::RefMut<'_, StreamSource<I>>> {
    source
        .try_borrow_mut()
        .map_err(|_| Error::protocol("one-pass source is already being written"))
}

fn is_started<I: Iterator>(source: &RefCell<StreamSource<I>>) -> bool {
    source.try_borrow().map_or(true, |source| source.started)
}

/// A one-pass sequence written as a JSON array.
///
/// The iterator is created by the caller and consumed exactly once. It may
/// borrow from its surroundings. Between calls it stays here, together with an
/// element that is still being written, while the write stack records how many
/// elements are done.
///
/// # Examples
///
/// ```rust
/// use chunked_json::{to_string, Streamed};
///
/// let squares = Streamed::new((1..=4).map(|n| n * n));
/// assert_eq!(to_string(&squares).unwrap(), "[1,4,9,16]");
///
/// let names = vec!["ada".to_string(), "grace".to_string()];
/// assert_eq!(to_string(&Streamed::new(names.iter())).unwrap(), r#"["ada","grace"]"#);
/// ```
pub struct Streamed<I: Iterator> {
    source: RefCell<StreamSource<I>>,
}

impl<I: Iterator> Streamed<I> {
    pub fn new<S: IntoIterator<IntoIter = I>>(source: S) -> Self {
        Streamed {
            source: RefCell::new(StreamSource::new(source.into_iter())),
        }
    }

    /// Returns `true` once a writer has started on the iterator.
    pub fn is_consumed(&self) -> bool {
        is_started(&self.source)
    }
}

impl<I: Iterator> fmt::Debug for Streamed<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Streamed")
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

impl<I> JsonWrite for Streamed<I>
where
    I: Iterator,
    I::Item: JsonWrite,
{
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        let identity = self as *const Self as usize;
        let mut source = borrow_source(&self.source)?;
        let resumed = state.stack.resume(FrameKind::Stream, identity, 0)?;
        let mut frame = source.attach(resumed, FrameKind::Stream, identity)?;

        let has_items = source.current().is_some();
        if !open(&mut frame, b"[", has_items, state)? {
            state.stack.suspend(frame);
            return Ok(false);
        }
        while let Some(item) = source.current() {
            let before = frame.cursor;
            let proceed = write_element(&mut frame, item, state)?;
            if frame.cursor > before {
                source.advance();
            }
            if !proceed {
                state.stack.suspend(frame);
                return Ok(false);
            }
        }
        close(frame, b"]", state)
    }
}

/// A one-pass sequence of `(name, value)` pairs written as a JSON object.
///
/// Works like [`Streamed`]: the iterator is consumed once and may borrow, which
/// makes it the way to write maps without positional access.
///
/// # Examples
///
/// ```rust
/// use chunked_json::{to_string, StreamedObject};
///
/// let totals = [("apples", 3), ("pears", 5)];
/// let object = StreamedObject::new(totals.iter().copied());
/// assert_eq!(to_string(&object).unwrap(), r#"{"apples":3,"pears":5}"#);
/// ```
pub struct StreamedObject<I: Iterator> {
    source: RefCell<StreamSource<I>>,
}

impl<I: Iterator> StreamedObject<I> {
    pub fn new<S: IntoIterator<IntoIter = I>>(source: S) -> Self {
        StreamedObject {
            source: RefCell::new(StreamSource::new(source.into_iter())),
        }
    }

    /// Returns `true` once a writer has started on the iterator.
    pub fn is_consumed(&self) -> bool {
        is_started(&self.source)
    }
}

impl<I: Iterator> fmt::Debug for StreamedObject<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamedObject")
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

impl<I, K, V> JsonWrite for StreamedObject<I>
where
    I: Iterator<Item = (K, V)>,
    K: AsRef<str>,
    V: JsonWrite,
{
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        let identity = self as *const Self as usize;
        let mut source = borrow_source(&self.source)?;
        let resumed = state.stack.resume(FrameKind::ObjectStream, identity, 0)?;
        let mut frame = source.attach(resumed, FrameKind::ObjectStream, identity)?;

        let has_members = source.current().is_some();
        if !open(&mut frame, b"{", has_members, state)? {
            state.stack.suspend(frame);
            return Ok(false);
        }
        while let Some((name, value)) = source.current() {
            let before = frame.cursor;
            let proceed = write_member(&mut frame, name.as_ref(), value, state)?;
            if frame.cursor > before {
                source.advance();
            }
            if !proceed {
                state.stack.suspend(frame);
                return Ok(false);
            }
        }
        close(frame, b"}", state)
    }
}

/// A value written as a JSON object with members in a fixed order.
///
/// Members are addressed by index so a suspended write can resume at the member
/// it stopped in. Implement by hand or with [`json_object!`](crate::json_object).
pub trait JsonObject {
    fn member_count(&self) -> usize;

    /// Name and value of the member at `index`.
    fn member(&self, index: usize) -> Option<(&str, &dyn JsonWrite)>;
}

/// Writes an object as `{"name":value,...}`, resumably.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if resumed with a different object or if the
/// member count changed.
pub fn write_object<O: JsonObject + ?Sized>(object: &O, state: &mut WriterState<'_>) -> Result<bool> {
    let identity = object as *const O as *const () as usize;
    let len = object.member_count();
    let mut frame = resume_or_new(FrameKind::Object, identity, len, state)?;

    if !open(&mut frame, b"{", len > 0, state)? {
        state.stack.suspend(frame);
        return Ok(false);
    }
    while frame.cursor < len {
        let (name, value) = object
            .member(frame.cursor)
            .ok_or_else(|| Error::protocol("object member disappeared between resumptions"))?;
        if !write_member(&mut frame, name, value, state)? {
            state.stack.suspend(frame);
            return Ok(false);
        }
    }
    close(frame, b"}", state)
}

/// Writes map entries as an object. A resumed call walks the entries again and
/// skips the ones already written, so the map must iterate in the same order
/// every time, which holds for any map that is not modified.
fn write_entries<'a, K, V, E>(
    identity: usize,
    len: usize,
    entries: E,
    state: &mut WriterState<'_>,
) -> Result<bool>
where
    K: AsRef<str> + 'a,
    V: JsonWrite + 'a,
    E: Iterator<Item = (&'a K, &'a V)>,
{
    let mut frame = resume_or_new(FrameKind::Object, identity, len, state)?;

    if !open(&mut frame, b"{", len > 0, state)? {
        state.stack.suspend(frame);
        return Ok(false);
    }
    for (name, value) in entries.skip(frame.cursor) {
        if !write_member(&mut frame, name.as_ref(), value, state)? {
            state.stack.suspend(frame);
            return Ok(false);
        }
    }
    close(frame, b"}", state)
}

impl<T: JsonWrite> JsonObject for IndexMap<String, T> {
    fn member_count(&self) -> usize {
        self.len()
    }

    fn member(&self, index: usize) -> Option<(&str, &dyn JsonWrite)> {
        self.get_index(index)
            .map(|(name, value)| (name.as_str(), value as &dyn JsonWrite))
    }
}

impl<T: JsonWrite> JsonWrite for IndexMap<String, T> {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        write_object(self, state)
    }
}

impl<K: AsRef<str>, V: JsonWrite> JsonWrite for BTreeMap<K, V> {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        write_entries(self as *const Self as usize, self.len(), self.iter(), state)
    }
}

impl<K: AsRef<str>, V: JsonWrite, S: BuildHasher> JsonWrite for HashMap<K, V, S> {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        write_entries(self as *const Self as usize, self.len(), self.iter(), state)
    }
}
