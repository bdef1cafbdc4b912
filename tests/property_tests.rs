//! Property-based tests for the resumable writer.
//!
//! The output must not depend on how often the sink is drained: every property
//! here drives the same value through several sink capacities (down to zero
//! bytes, and changing between flushes) and compares against an unconstrained
//! single call.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chunked_json::encoder::MAX_ESCAPED_CHAR_LEN;
use chunked_json::{
    to_vec, to_vec_with_options, write_to_completion, BufferSink, Bytes, EscapeMode, JsonWrite,
    Sink, Utf16, WriterOptions, WriterState,
};
use proptest::prelude::*;

/// A sink whose capacity changes after every flush, cycling through a list.
struct VaryingSink {
    capacities: Vec<usize>,
    turn: usize,
    buf: Vec<u8>,
    filled: usize,
    out: Vec<u8>,
    /// Largest number of bytes a flush carried beyond that turn's capacity.
    overshoot: usize,
}

impl VaryingSink {
    fn new(capacities: Vec<usize>) -> Self {
        VaryingSink {
            capacities,
            turn: 0,
            buf: Vec::new(),
            filled: 0,
            out: Vec::new(),
            overshoot: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.capacities[self.turn % self.capacities.len()]
    }
}

impl Sink for VaryingSink {
    fn reserve(&mut self, min: usize) -> chunked_json::Result<&mut [u8]> {
        let end = self.filled + min;
        if self.buf.len() < end {
            self.buf.resize(end, 0);
        }
        Ok(&mut self.buf[self.filled..end])
    }

    fn commit(&mut self, used: usize) {
        self.filled += used;
    }

    fn free_capacity(&self) -> usize {
        self.capacity().saturating_sub(self.filled)
    }

    fn flush(&mut self) -> chunked_json::Result<()> {
        self.overshoot = self.overshoot.max(self.filled.saturating_sub(self.capacity()));
        self.out.extend_from_slice(&self.buf[..self.filled]);
        self.filled = 0;
        self.turn += 1;
        Ok(())
    }
}

/// Returns the output and the largest overshoot of any flush.
fn drive_varying<T: JsonWrite + ?Sized>(
    value: &T,
    capacities: Vec<usize>,
    options: WriterOptions,
) -> (Vec<u8>, usize) {
    let mut sink = VaryingSink::new(capacities);
    let mut state = WriterState::new(&mut sink, options);
    write_to_completion(value, &mut state).unwrap();
    state.flush().unwrap();
    drop(state);
    (sink.out, sink.overshoot)
}

fn capacities() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(
        prop_oneof![Just(0usize), Just(1), 2usize..16, 16usize..400, Just(5000)],
        1..12,
    )
}

fn drive<T: JsonWrite + ?Sized>(value: &T, capacity: usize, options: WriterOptions) -> Vec<u8> {
    let mut sink = BufferSink::with_capacity(Vec::new(), capacity);
    let mut state = WriterState::new(&mut sink, options);
    write_to_completion(value, &mut state).unwrap();
    state.flush().unwrap();
    drop(state);
    sink.into_inner()
}

/// Flushes after every call, however little was written.
fn drive_per_call<T: JsonWrite + ?Sized>(value: &T, options: WriterOptions) -> Vec<u8> {
    let mut sink = BufferSink::with_capacity(Vec::new(), 1);
    let mut state = WriterState::new(&mut sink, options);
    while !value.write_json(&mut state).unwrap() {
        state.flush().unwrap();
    }
    state.flush().unwrap();
    drop(state);
    sink.into_inner()
}

fn escape_mode() -> impl Strategy<Value = EscapeMode> {
    prop_oneof![
        Just(EscapeMode::Minimal),
        Just(EscapeMode::Html),
        Just(EscapeMode::Ascii),
    ]
}

/// ASCII text dense in quotes, backslashes and control characters.
fn ascii_text() -> impl Strategy<Value = String> {
    prop::collection::vec(0u8..0x80, 0..200)
        .prop_map(|bytes| bytes.into_iter().map(char::from).collect())
}

proptest! {
    #[test]
    fn prop_text_chunk_invariance(
        text in "\\PC{0,300}",
        capacity in 1usize..64,
        chunk in 4usize..40,
        mode in escape_mode(),
    ) {
        let options = WriterOptions::new().with_chunk_size(chunk).with_escape_mode(mode);
        let unbounded = drive(text.as_str(), 1 << 20, options.clone());
        prop_assert_eq!(drive(text.as_str(), capacity, options), unbounded);
    }

    #[test]
    fn prop_text_parses_back(text in any::<String>(), chunk in 4usize..32) {
        let options = WriterOptions::new().with_chunk_size(chunk);
        let out = drive_per_call(text.as_str(), options);
        let parsed: String = serde_json::from_slice(&out).unwrap();
        prop_assert_eq!(parsed, text);
    }

    #[test]
    fn prop_control_characters_never_split(text in ascii_text(), mode in escape_mode()) {
        let options = WriterOptions::new().with_chunk_size(4).with_escape_mode(mode);
        let out = drive_per_call(text.as_str(), options);
        let parsed: String = serde_json::from_slice(&out).unwrap();
        prop_assert_eq!(parsed, text);
    }

    #[test]
    fn prop_utf16_matches_utf8(text in "\\PC{0,200}", capacity in 1usize..48, chunk in 4usize..16) {
        let options = WriterOptions::new().with_chunk_size(chunk);
        let units = Utf16::from(text.as_str());
        prop_assert_eq!(
            drive(&units, capacity, options.clone()),
            drive(text.as_str(), 1 << 20, options)
        );
    }

    #[test]
    fn prop_base64_round_trip(
        data in prop::collection::vec(any::<u8>(), 0..2000),
        capacity in 1usize..128,
        chunk in 4usize..300,
    ) {
        let options = WriterOptions::new().with_chunk_size(chunk);
        let out = drive(&Bytes(&data), capacity, options);
        prop_assert_eq!(out.first(), Some(&b'"'));
        prop_assert_eq!(out.last(), Some(&b'"'));
        prop_assert_eq!(STANDARD.decode(&out[1..out.len() - 1]).unwrap(), data.clone());
        prop_assert_eq!(out, to_vec(&Bytes(&data)).unwrap());
    }

    #[test]
    fn prop_nested_collections(
        rows in prop::collection::vec(prop::collection::vec("[a-z\"]{0,12}", 0..6), 0..20),
        capacity in 1usize..32,
    ) {
        let unbounded = to_vec(&rows).unwrap();
        prop_assert_eq!(drive(&rows, capacity, WriterOptions::new()), unbounded.clone());
        let parsed: Vec<Vec<String>> = serde_json::from_slice(&unbounded).unwrap();
        prop_assert_eq!(parsed, rows);
    }

    #[test]
    fn prop_integers(n in any::<i64>(), m in any::<u64>(), x in any::<i32>()) {
        prop_assert_eq!(to_vec(&n).unwrap(), n.to_string().into_bytes());
        prop_assert_eq!(to_vec(&m).unwrap(), m.to_string().into_bytes());
        prop_assert_eq!(to_vec(&x).unwrap(), x.to_string().into_bytes());
    }

    #[test]
    fn prop_text_with_varying_capacities(
        text in "\\PC{0,300}",
        caps in capacities(),
        chunk in 4usize..64,
        mode in escape_mode(),
    ) {
        let options = WriterOptions::new().with_chunk_size(chunk).with_escape_mode(mode);
        let (out, overshoot) = drive_varying(text.as_str(), caps, options.clone());
        prop_assert_eq!(out, to_vec_with_options(text.as_str(), options).unwrap());
        prop_assert!(overshoot <= MAX_ESCAPED_CHAR_LEN);
    }

    #[test]
    fn prop_utf16_with_varying_capacities(
        text in "\\PC{0,200}",
        caps in capacities(),
        chunk in 4usize..16,
    ) {
        let options = WriterOptions::new().with_chunk_size(chunk);
        let units = Utf16::from(text.as_str());
        let (out, overshoot) = drive_varying(&units, caps, options.clone());
        prop_assert_eq!(out, to_vec_with_options(text.as_str(), options).unwrap());
        prop_assert!(overshoot <= MAX_ESCAPED_CHAR_LEN);
    }

    #[test]
    fn prop_binary_with_varying_capacities(
        data in prop::collection::vec(any::<u8>(), 0..1500),
        caps in capacities(),
        chunk in 4usize..300,
    ) {
        let options = WriterOptions::new().with_chunk_size(chunk);
        let (out, overshoot) = drive_varying(&Bytes(&data), caps, options);
        prop_assert_eq!(out, to_vec(&Bytes(&data)).unwrap());
        prop_assert!(overshoot <= 4);
    }
}
