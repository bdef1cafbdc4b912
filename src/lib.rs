//! # chunked_json
//!
//! A resumable JSON writer that never needs the whole document in memory.
//!
//! ## How it works
//!
//! Values are written into a bounded [`Sink`]. Every writer follows one contract:
//! [`JsonWrite::write_json`] returns `Ok(true)` once its value is complete, or
//! `Ok(false)` when the sink should be flushed before it continues. Progress
//! lives on an explicit [`WriteStack`] inside the [`WriterState`], one frame per
//! nesting level, so a suspended write resumes exactly where it stopped:
//!
//! - collections remember the next element and whether its separator or member
//!   name is already out
//! - large strings, UTF-16 text and binary data are emitted in slices, so a
//!   multi-megabyte value never needs a buffer of its own size
//! - escape sequences and base64 groups are never split across flushes
//!
//! The output is byte-for-byte identical whatever the buffer size.
//!
//! ## Quick Start
//!
//! ```rust
//! use chunked_json::{json_object, to_string, to_string_with_options, WriterOptions};
//!
//! struct User {
//!     id: u32,
//!     name: String,
//!     tags: Vec<String>,
//! }
//!
//! json_object!(User { id, name, tags });
//!
//! let user = User {
//!     id: 123,
//!     name: "Alice \"Al\" Smith".to_string(),
//!     tags: vec!["admin".to_string()],
//! };
//!
//! let expected = r#"{"id":123,"name":"Alice \"Al\" Smith","tags":["admin"]}"#;
//! assert_eq!(to_string(&user).unwrap(), expected);
//!
//! // A 4-byte buffer produces the same bytes, one flush at a time.
//! let tiny = WriterOptions::new().with_buffer_capacity(4);
//! assert_eq!(to_string_with_options(&user, tiny).unwrap(), expected);
//! ```
//!
//! ### Driving the writer yourself
//!
//! ```rust
//! use chunked_json::{BufferSink, JsonWrite, WriterOptions, WriterState};
//!
//! let text = "x".repeat(10_000);
//! let mut sink = BufferSink::with_capacity(Vec::new(), 256);
//! let mut state = WriterState::new(&mut sink, WriterOptions::new());
//!
//! let mut calls = 1;
//! while !text.write_json(&mut state).unwrap() {
//!     state.flush().unwrap();
//!     calls += 1;
//! }
//! state.flush().unwrap();
//! drop(state);
//!
//! assert!(calls > 1);
//! assert_eq!(sink.into_inner().len(), 10_002);
//! ```
//!
//! ### Serde types
//!
//! Anything that implements `Serialize` can be converted to a [`Value`] first:
//!
//! ```rust
//! use chunked_json::{to_string, to_value};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Point { x: i32, y: i32 }
//!
//! let value = to_value(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(to_string(&value).unwrap(), r#"{"x":1,"y":2}"#);
//! ```

pub mod chunked;
pub mod composite;
pub mod encoder;
pub mod error;
pub mod flush;
pub mod macros;
pub mod map;
pub mod options;
pub mod registry;
pub mod scalar;
pub mod ser;
pub mod sink;
pub mod stack;
pub mod state;
pub mod value;
pub mod write;

pub use chunked::{write_binary, write_text, write_utf16, Bytes, Utf16};
pub use composite::{write_array, write_object, JsonObject, Streamed, StreamedObject};
pub use encoder::{EncodeStatus, Encoded, JsonTextEncoder, TextEncoder};
pub use error::{Error, Result};
pub use flush::{flush, should_flush, write_to_completion, Completion};
pub use map::Map;
pub use options::{EscapeMode, NonFiniteFloats, WriterOptions};
pub use registry::{Dynamic, Registry};
pub use scalar::{write_enum, JsonEnum};
pub use ser::{to_value, ValueSerializer};
pub use sink::{BufferSink, Sink};
pub use stack::{Frame, FrameKind, PropertyProgress, ValueProgress, WriteStack};
pub use state::WriterState;
pub use value::{Number, Value};
pub use write::JsonWrite;

use std::io;

fn write_buffered<W, T>(writer: W, value: &T, options: WriterOptions) -> Result<W>
where
    W: io::Write,
    T: ?Sized + JsonWrite,
{
    let mut sink = BufferSink::with_capacity(writer, options.buffer_capacity);
    if let Some(limit) = options.max_buffer {
        sink = sink.with_limit(limit);
    }
    {
        let mut state = WriterState::new(&mut sink, options);
        write_to_completion(value, &mut state)?;
        state.flush()?;
    }
    Ok(sink.into_inner())
}

/// Writes `value` to a JSON byte vector.
///
/// # Examples
///
/// ```rust
/// use chunked_json::{to_vec, Bytes};
///
/// assert_eq!(to_vec(&Bytes(b"hi")).unwrap(), b"\"aGk=\"");
/// ```
///
/// # Errors
///
/// Returns the first terminal error raised by a writer.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + JsonWrite,
{
    to_vec_with_options(value, WriterOptions::default())
}

#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec_with_options<T>(value: &T, options: WriterOptions) -> Result<Vec<u8>>
where
    T: ?Sized + JsonWrite,
{
    write_buffered(Vec::new(), value, options)
}

/// Writes `value` to a JSON string.
///
/// # Examples
///
/// ```rust
/// use chunked_json::to_string;
///
/// assert_eq!(to_string(&vec![Some(1), None]).unwrap(), "[1,null]");
/// assert_eq!(to_string("tab\there").unwrap(), r#""tab\there""#);
/// ```
///
/// # Errors
///
/// Returns the first terminal error raised by a writer.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + JsonWrite,
{
    to_string_with_options(value, WriterOptions::default())
}

#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: WriterOptions) -> Result<String>
where
    T: ?Sized + JsonWrite,
{
    let bytes = to_vec_with_options(value, options)?;
    String::from_utf8(bytes).map_err(Error::custom)
}

/// Writes `value` into `writer` through a bounded buffer.
///
/// At most `buffer_capacity` bytes (plus one token) are held before they are
/// handed to `writer`.
///
/// # Errors
///
/// Returns [`Error::Io`] if `writer` fails, or any terminal writer error.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + JsonWrite,
{
    to_writer_with_options(writer, value, WriterOptions::default())
}

#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(writer: W, value: &T, options: WriterOptions) -> Result<()>
where
    W: io::Write,
    T: ?Sized + JsonWrite,
{
    write_buffered(writer, value, options)?;
    Ok(())
}
