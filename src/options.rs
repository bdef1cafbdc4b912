//! Configuration options for JSON writing.
//!
//! This module provides types to customize the writer:
//!
//! - [`WriterOptions`]: Main configuration struct
//! - [`EscapeMode`]: Which characters the text encoder escapes beyond the mandatory set
//! - [`NonFiniteFloats`]: How NaN and infinities are written
//!
//! Options are read-only once a [`WriterState`](crate::WriterState) has been created.
//!
//! ## Examples
//!
//! ```rust
//! use chunked_json::{to_string_with_options, EscapeMode, WriterOptions};
//!
//! let options = WriterOptions::new().with_escape_mode(EscapeMode::Ascii);
//! let json = to_string_with_options("héllo", options).unwrap();
//! assert_eq!(json, "\"h\\u00e9llo\"");
//!
//! let options = WriterOptions::new().with_quote_large_integers(true);
//! let json = to_string_with_options(&42i64, options).unwrap();
//! assert_eq!(json, "\"42\"");
//! ```

/// Smallest slice the chunked encoders will take from a large value.
pub const MIN_CHUNK_SIZE: usize = 4;

/// Escaping policy for text.
///
/// Quotes, backslashes and control characters are always escaped:
///
/// - **Minimal**: Default, nothing else
/// - **Html**: Also `<`, `>`, `&`, `'`, `+`, backtick and the JavaScript line separators
/// - **Ascii**: Also every non-ASCII character, so the output is pure ASCII
///
/// # Examples
///
/// ```rust
/// use chunked_json::EscapeMode;
///
/// assert!(EscapeMode::Html.escapes_html());
/// assert!(!EscapeMode::Minimal.escapes_non_ascii());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EscapeMode {
    #[default]
    Minimal,
    Html,
    Ascii,
}

impl EscapeMode {
    #[must_use]
    pub const fn escapes_html(&self) -> bool {
        matches!(self, EscapeMode::Html)
    }

    #[must_use]
    pub const fn escapes_non_ascii(&self) -> bool {
        matches!(self, EscapeMode::Ascii)
    }
}

/// Policy for floating point values JSON cannot represent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NonFiniteFloats {
    /// Reject with [`Error::InvalidValue`](crate::Error::InvalidValue).
    #[default]
    Error,
    /// Write `null`.
    Null,
    /// Write `"NaN"`, `"INF"` or `"-INF"`.
    Quoted,
}

/// Configuration options for the writer.
///
/// # Examples
///
/// ```rust
/// use chunked_json::WriterOptions;
///
/// let options = WriterOptions::new()
///     .with_chunk_size(512)
///     .with_buffer_capacity(4096)
///     .with_flush_threshold(32);
/// assert_eq!(options.chunk_size, 512);
/// ```
#[derive(Clone, Debug)]
pub struct WriterOptions {
    /// Nominal number of source units taken per step when chunking large values.
    pub chunk_size: usize,
    /// Low-water mark: the sink is flushed once its free capacity drops below this.
    pub flush_threshold: usize,
    /// Soft capacity of the sink created by the convenience entry points.
    pub buffer_capacity: usize,
    /// Hard limit for the sink created by the convenience entry points.
    pub max_buffer: Option<usize>,
    /// Emit 64-bit and wider integers as quoted strings.
    pub quote_large_integers: bool,
    pub non_finite_floats: NonFiniteFloats,
    pub escape_mode: EscapeMode,
    /// Write unpaired UTF-16 surrogates as `\uXXXX` instead of failing.
    pub allow_lone_surrogates: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            chunk_size: 2048,
            flush_threshold: 16,
            buffer_capacity: 16 * 1024,
            max_buffer: None,
            quote_large_integers: false,
            non_finite_floats: NonFiniteFloats::default(),
            escape_mode: EscapeMode::default(),
            allow_lone_surrogates: false,
        }
    }
}

impl WriterOptions {
    /// Creates default options (2048-unit chunks, 16 KiB buffer, minimal escaping).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunked_json::WriterOptions;
    ///
    /// let options = WriterOptions::new();
    /// assert_eq!(options.chunk_size, 2048);
    /// assert!(!options.quote_large_integers);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the nominal chunk size. Values below [`MIN_CHUNK_SIZE`] are raised to it.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(MIN_CHUNK_SIZE);
        self
    }

    #[must_use]
    pub fn with_flush_threshold(mut self, threshold: usize) -> Self {
        self.flush_threshold = threshold;
        self
    }

    /// Sets the soft sink capacity used by [`to_vec_with_options`](crate::to_vec_with_options)
    /// and friends. A capacity of 1 forces a flush after every token.
    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_max_buffer(mut self, limit: usize) -> Self {
        self.max_buffer = Some(limit);
        self
    }

    /// Emits `i64`, `u64` and wider integers as quoted strings, for consumers that
    /// parse numbers as IEEE 754 doubles.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunked_json::WriterOptions;
    ///
    /// let options = WriterOptions::new().with_quote_large_integers(true);
    /// assert!(options.quote_large_integers);
    /// ```
    #[must_use]
    pub fn with_quote_large_integers(mut self, quote: bool) -> Self {
        self.quote_large_integers = quote;
        self
    }

    #[must_use]
    pub fn with_non_finite_floats(mut self, policy: NonFiniteFloats) -> Self {
        self.non_finite_floats = policy;
        self
    }

    #[must_use]
    pub fn with_escape_mode(mut self, mode: EscapeMode) -> Self {
        self.escape_mode = mode;
        self
    }

    #[must_use]
    pub fn with_allow_lone_surrogates(mut self, allow: bool) -> Self {
        self.allow_lone_surrogates = allow;
        self
    }
}
