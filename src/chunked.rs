//! Chunked writers for values too large to emit in one step.
//!
//! Text (UTF-8 from `str`, UTF-16 from [`Utf16`]) and binary ([`Bytes`]) values are
//! written as a single quoted token over as many calls as the sink requires. Each
//! step takes a bounded slice starting at the frame's cursor, encodes as much of it
//! as fits and advances the cursor by exactly the units consumed, so the
//! concatenated output of all calls equals a single-call write.
//!
//! Rules every step follows:
//!
//! - the opening quote is written once, gated by [`ValueProgress`], never by the
//!   cursor;
//! - no escape sequence, UTF-8 sequence, surrogate pair or base64 group is split
//!   across calls;
//! - a UTF-16 high surrogate ending a non-final slice is carried in
//!   [`Frame::pending_tail`] and joined with the next slice;
//! - each step asks the sink for its free capacity, or for the exact encoded length
//!   of the next character (one base64 group for binary) when less is free, so every
//!   call makes progress even with a one-byte sink and never reserves more than the
//!   next token needs;
//! - the flush controller is consulted after the opening quote and after every
//!   step, including the last one, so the closing quote may land in a later call.

use crate::encoder::{
    encode_base64_chunk, floor_char_boundary, EncodeStatus, Encoded, TextEncoder,
    BASE64_GROUP_LEN, MAX_ESCAPED_CHAR_LEN,
};
use std::ops::RangeInclusive;
use crate::flush::should_flush;
use crate::options::MIN_CHUNK_SIZE;
use crate::stack::{Frame, FrameKind, ValueProgress};
use crate::{Error, JsonWrite, Result, WriterState};

/// Binary data written as one base64 string.
///
/// # Examples
///
/// ```rust
/// use chunked_json::{to_string, Bytes};
///
/// assert_eq!(to_string(&Bytes(b"hello")).unwrap(), "\"aGVsbG8=\"");
/// assert_eq!(to_string(&Bytes(Vec::new())).unwrap(), "\"\"");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Bytes<B>(pub B);

/// UTF-16 text, written as a JSON string.
///
/// # Examples
///
/// ```rust
/// use chunked_json::{to_string, Utf16};
///
/// let units: Vec<u16> = "tab\there".encode_utf16().collect();
/// assert_eq!(to_string(&Utf16(units)).unwrap(), "\"tab\\there\"");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Utf16<B>(pub B);

impl From<&str> for Utf16<Vec<u16>> {
    fn from(text: &str) -> Self {
        Utf16(text.encode_utf16().collect())
    }
}

impl<B: AsRef<[u8]>> JsonWrite for Bytes<B> {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        write_binary(self.0.as_ref(), state)
    }
}

impl<B: AsRef<[u16]>> JsonWrite for Utf16<B> {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        write_utf16(self.0.as_ref(), state)
    }
}

impl JsonWrite for str {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        write_text(self, state)
    }
}

impl JsonWrite for String {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        write_text(self, state)
    }
}

/// Writes the opening quote on the first call. Returns `false` when the sink
/// should be drained before the first step.
fn open_quote(frame: &mut Frame, state: &mut WriterState<'_>) -> Result<bool> {
    if frame.value_progress == ValueProgress::NotStarted {
        state.write_raw(b"\"")?;
        frame.value_progress = ValueProgress::Opened;
        return Ok(!should_flush(state));
    }
    Ok(true)
}

fn close_quote(mut frame: Frame, state: &mut WriterState<'_>) -> Result<bool> {
    state.write_raw(b"\"")?;
    frame.value_progress = ValueProgress::Done;
    state.stack.complete();
    Ok(true)
}

fn no_progress(offset: usize) -> Error {
    Error::encoding(offset, "text encoder made no progress with a full escape of room")
}

/// Bytes to reserve for one step: the free capacity, but never less than the
/// next token.
fn step_room(state: &WriterState<'_>, next: usize) -> usize {
    state.free_capacity().max(next)
}

const HIGH_SURROGATES: RangeInclusive<u16> = 0xD800..=0xDBFF;
const LOW_SURROGATES: RangeInclusive<u16> = 0xDC00..=0xDFFF;

fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

/// Encoded length of the character starting `slice`, which begins on a char
/// boundary. Input the encoder rejects counts as one byte so the real step can
/// report it.
fn next_utf8_len(encoder: &dyn TextEncoder, slice: &[u8]) -> usize {
    let Some(&lead) = slice.first() else {
        return 0;
    };
    let width = utf8_width(lead).min(slice.len());
    let mut scratch = [0u8; MAX_ESCAPED_CHAR_LEN];
    encoder.encode(&slice[..width], &mut scratch, true).written.max(1)
}

/// Encoded length of the unit or surrogate pair starting `slice`. A high
/// surrogate ending a non-final slice is held back, which needs no room.
fn next_utf16_len(encoder: &dyn TextEncoder, slice: &[u16], is_final: bool) -> usize {
    let Some(&lead) = slice.first() else {
        return 0;
    };
    let paired = HIGH_SURROGATES.contains(&lead)
        && slice.get(1).map_or(false, |unit| LOW_SURROGATES.contains(unit));
    let width = if paired { 2 } else { 1 };
    let mut scratch = [0u8; MAX_ESCAPED_CHAR_LEN];
    let probe_final = is_final || slice.len() > width;
    encoder
        .encode_utf16(&slice[..width], &mut scratch, probe_final)
        .written
        .max(1)
}

/// Writes UTF-8 text as an escaped JSON string, resumably.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if resumed with a different string and
/// [`Error::Encoding`] if the encoder rejects the text.
pub fn write_text(text: &str, state: &mut WriterState<'_>) -> Result<bool> {
    let bytes = text.as_bytes();
    let identity = bytes.as_ptr() as usize;
    let mut frame = match state.stack.resume(FrameKind::Text, identity, bytes.len())? {
        Some(frame) => frame,
        None => {
            if bytes.is_empty() {
                state.write_raw(b"\"\"")?;
                return Ok(true);
            }
            if bytes.len() + 2 <= state.free_capacity()
                && state.encoder().first_index_needing_escape(bytes).is_none()
            {
                let region = state.reserve(bytes.len() + 2)?;
                region[0] = b'"';
                region[1..=bytes.len()].copy_from_slice(bytes);
                region[bytes.len() + 1] = b'"';
                state.commit(bytes.len() + 2);
                return Ok(true);
            }
            Frame::new(FrameKind::Text, identity, bytes.len())
        }
    };

    if !open_quote(&mut frame, state)? {
        state.stack.suspend(frame);
        return Ok(false);
    }
    let chunk_size = state.options().chunk_size.max(MIN_CHUNK_SIZE);
    while frame.cursor < bytes.len() {
        let mut end = floor_char_boundary(bytes, frame.cursor + chunk_size);
        if end <= frame.cursor {
            end = frame.cursor + 1;
            while end < bytes.len() && !text.is_char_boundary(end) {
                end += 1;
            }
        }
        let is_final = end == bytes.len();
        let slice = &bytes[frame.cursor..end];
        let room = step_room(state, next_utf8_len(state.encoder(), slice));
        let (encoder, region) = state.encoder_and_region(room)?;
        let result = encode_utf8_slice(encoder, slice, region, is_final);
        state.commit(result.written);
        let offset = frame.cursor + result.consumed;
        match result.status {
            EncodeStatus::Done => {}
            EncodeStatus::DestinationTooSmall if result.consumed == 0 => {
                return Err(no_progress(offset));
            }
            EncodeStatus::DestinationTooSmall => {}
            EncodeStatus::NeedMoreData => {
                return Err(Error::encoding(offset, "text slice ended inside a character"));
            }
            EncodeStatus::InvalidData => {
                return Err(Error::encoding(offset, "malformed UTF-8"));
            }
        }
        frame.cursor = offset;

        if should_flush(state) {
            state.stack.suspend(frame);
            return Ok(false);
        }
    }
    close_quote(frame, state)
}

/// First pass finds the verbatim prefix, second pass escapes from there.
fn encode_utf8_slice(
    encoder: &dyn TextEncoder,
    slice: &[u8],
    dst: &mut [u8],
    is_final: bool,
) -> Encoded {
    let verbatim = encoder
        .first_index_needing_escape(slice)
        .unwrap_or(slice.len());
    let copied = floor_char_boundary(slice, verbatim.min(dst.len()));
    dst[..copied].copy_from_slice(&slice[..copied]);
    if copied < verbatim {
        return Encoded {
            status: EncodeStatus::DestinationTooSmall,
            consumed: copied,
            written: copied,
        };
    }
    if copied == slice.len() {
        return Encoded {
            status: EncodeStatus::Done,
            consumed: copied,
            written: copied,
        };
    }
    let rest = encoder.encode(&slice[copied..], &mut dst[copied..], is_final);
    Encoded {
        status: rest.status,
        consumed: copied + rest.consumed,
        written: copied + rest.written,
    }
}

fn encode_utf16_slice(
    encoder: &dyn TextEncoder,
    slice: &[u16],
    dst: &mut [u8],
    is_final: bool,
) -> Encoded {
    let verbatim = encoder
        .first_index_needing_escape_utf16(slice)
        .unwrap_or(slice.len());
    let copied = verbatim.min(dst.len());
    for (out, unit) in dst[..copied].iter_mut().zip(&slice[..copied]) {
        *out = *unit as u8;
    }
    if copied < verbatim {
        return Encoded {
            status: EncodeStatus::DestinationTooSmall,
            consumed: copied,
            written: copied,
        };
    }
    if copied == slice.len() {
        return Encoded {
            status: EncodeStatus::Done,
            consumed: copied,
            written: copied,
        };
    }
    let rest = encoder.encode_utf16(&slice[copied..], &mut dst[copied..], is_final);
    Encoded {
        status: rest.status,
        consumed: copied + rest.consumed,
        written: copied + rest.written,
    }
}

/// Writes UTF-16 text as an escaped JSON string, resumably.
///
/// # Errors
///
/// Returns [`Error::Encoding`] for unpaired surrogates unless the writer allows
/// them, and [`Error::Protocol`] if resumed with different text.
pub fn write_utf16(units: &[u16], state: &mut WriterState<'_>) -> Result<bool> {
    let identity = units.as_ptr() as usize;
    let mut frame = match state.stack.resume(FrameKind::Utf16Text, identity, units.len())? {
        Some(frame) => frame,
        None => {
            if units.is_empty() {
                state.write_raw(b"\"\"")?;
                return Ok(true);
            }
            Frame::new(FrameKind::Utf16Text, identity, units.len())
        }
    };

    if !open_quote(&mut frame, state)? {
        state.stack.suspend(frame);
        return Ok(false);
    }
    let mut scratch = std::mem::take(&mut state.scratch);
    let finished = utf16_steps(units, &mut frame, &mut scratch, state);
    state.scratch = scratch;
    if finished? {
        close_quote(frame, state)
    } else {
        state.stack.suspend(frame);
        Ok(false)
    }
}

fn utf16_steps(
    units: &[u16],
    frame: &mut Frame,
    scratch: &mut Vec<u16>,
    state: &mut WriterState<'_>,
) -> Result<bool> {
    let chunk_size = state.options().chunk_size.max(MIN_CHUNK_SIZE);
    while frame.cursor < units.len() || frame.pending_tail.is_some() {
        let end = (frame.cursor + chunk_size).min(units.len());
        let is_final = end == units.len();
        let tail = frame.pending_tail.take();
        let tail_len = usize::from(tail.is_some());
        let base = frame.cursor - tail_len;
        let input: &[u16] = match tail {
            Some(unit) => {
                scratch.clear();
                scratch.push(unit);
                scratch.extend_from_slice(&units[frame.cursor..end]);
                scratch
            }
            None => &units[frame.cursor..end],
        };

        let room = step_room(state, next_utf16_len(state.encoder(), input, is_final));
        let (encoder, region) = state.encoder_and_region(room)?;
        let result = encode_utf16_slice(encoder, input, region, is_final);
        state.commit(result.written);
        match result.status {
            EncodeStatus::Done => frame.cursor = end,
            EncodeStatus::NeedMoreData => {
                if input.len() - result.consumed != 1 {
                    return Err(Error::encoding(
                        base + result.consumed,
                        "encoder held back more than one unit",
                    ));
                }
                frame.pending_tail = Some(input[result.consumed]);
                frame.cursor = end;
            }
            EncodeStatus::DestinationTooSmall => {
                if result.consumed == 0 {
                    return Err(no_progress(base));
                }
                if result.consumed < tail_len {
                    frame.pending_tail = tail;
                } else {
                    frame.cursor += result.consumed - tail_len;
                }
            }
            EncodeStatus::InvalidData => {
                return Err(Error::encoding(
                    base + result.consumed,
                    "unpaired UTF-16 surrogate",
                ));
            }
        }

        if should_flush(state) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Writes binary data as a base64 JSON string, resumably.
///
/// Only whole 4-character groups are emitted before the final block, and every
/// step reserves at least one group, so the frame's cursor is the only state
/// carried between calls.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if resumed with different data.
pub fn write_binary(bytes: &[u8], state: &mut WriterState<'_>) -> Result<bool> {
    let identity = bytes.as_ptr() as usize;
    let mut frame = match state.stack.resume(FrameKind::Binary, identity, bytes.len())? {
        Some(frame) => frame,
        None => {
            if bytes.is_empty() {
                state.write_raw(b"\"\"")?;
                return Ok(true);
            }
            Frame::new(FrameKind::Binary, identity, bytes.len())
        }
    };

    if !open_quote(&mut frame, state)? {
        state.stack.suspend(frame);
        return Ok(false);
    }
    let chunk_size = (state.options().chunk_size.max(MIN_CHUNK_SIZE) / 3) * 3;
    while frame.cursor < bytes.len() {
        let end = (frame.cursor + chunk_size).min(bytes.len());
        let is_final = end == bytes.len();
        let room = step_room(state, BASE64_GROUP_LEN);
        let region = state.reserve(room)?;
        let (consumed, written) = encode_base64_chunk(&bytes[frame.cursor..end], region, is_final)?;
        state.commit(written);
        frame.cursor += consumed;

        if should_flush(state) {
            state.stack.suspend(frame);
            return Ok(false);
        }
    }
    close_quote(frame, state)
}
