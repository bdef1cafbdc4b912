//! Text and binary encoders used by the chunked writers.
//!
//! A [`TextEncoder`] escapes one slice of a larger text value at a time. It reports
//! how many input units it consumed and how many bytes it wrote, and it may stop
//! early in three cases:
//!
//! - the destination is full ([`EncodeStatus::DestinationTooSmall`]),
//! - the slice ends inside a sequence that more input could complete and the slice
//!   is not the last one ([`EncodeStatus::NeedMoreData`], at most one UTF-16 unit),
//! - the input is malformed ([`EncodeStatus::InvalidData`]).
//!
//! An encoder never writes a partial escape sequence.
//!
//! [`encode_base64_chunk`] is the binary counterpart: standard padded base64 that only
//! emits whole 4-character groups, padding only at the final block.

use crate::options::{EscapeMode, WriterOptions};
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Longest escape a single scalar can produce: `\uXXXX\uXXXX`.
pub const MAX_ESCAPED_CHAR_LEN: usize = 12;

/// Size of one base64 output group.
pub const BASE64_GROUP_LEN: usize = 4;

/// Why an encode call stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeStatus {
    /// All input was consumed.
    Done,
    /// The destination has no room for the next escape sequence.
    DestinationTooSmall,
    /// The trailing input units were held back until more input arrives.
    NeedMoreData,
    /// The unit at `consumed` is malformed.
    InvalidData,
}

/// Outcome of one encode call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Encoded {
    pub status: EncodeStatus,
    pub consumed: usize,
    pub written: usize,
}

impl Encoded {
    const fn new(status: EncodeStatus, consumed: usize, written: usize) -> Self {
        Encoded {
            status,
            consumed,
            written,
        }
    }
}

/// Escapes text into JSON string content (without the surrounding quotes).
///
/// UTF-8 input comes from `str` values, UTF-16 input from [`Utf16`](crate::Utf16)
/// values. Output is always UTF-8.
pub trait TextEncoder {
    /// Index of the first byte that cannot be copied through verbatim.
    fn first_index_needing_escape(&self, text: &[u8]) -> Option<usize>;

    /// Index of the first unit that is not a verbatim-safe ASCII character.
    fn first_index_needing_escape_utf16(&self, text: &[u16]) -> Option<usize>;

    fn encode(&self, src: &[u8], dst: &mut [u8], is_final: bool) -> Encoded;

    fn encode_utf16(&self, src: &[u16], dst: &mut [u8], is_final: bool) -> Encoded;
}

/// The standard JSON escaper.
///
/// # Examples
///
/// ```rust
/// use chunked_json::{EncodeStatus, JsonTextEncoder, TextEncoder};
///
/// let encoder = JsonTextEncoder::default();
/// let mut dst = [0u8; 16];
/// let result = encoder.encode(b"a\"b", &mut dst, true);
/// assert_eq!(result.status, EncodeStatus::Done);
/// assert_eq!(&dst[..result.written], b"a\\\"b");
/// ```
#[derive(Clone, Debug, Default)]
pub struct JsonTextEncoder {
    mode: EscapeMode,
    allow_lone_surrogates: bool,
}

impl JsonTextEncoder {
    pub fn new(mode: EscapeMode) -> Self {
        JsonTextEncoder {
            mode,
            allow_lone_surrogates: false,
        }
    }

    pub fn from_options(options: &WriterOptions) -> Self {
        JsonTextEncoder {
            mode: options.escape_mode,
            allow_lone_surrogates: options.allow_lone_surrogates,
        }
    }

    /// Writes unpaired surrogates as `\uXXXX` escapes instead of rejecting them.
    #[must_use]
    pub fn allow_lone_surrogates(mut self, allow: bool) -> Self {
        self.allow_lone_surrogates = allow;
        self
    }

    #[inline]
    fn ascii_needs_escape(&self, b: u8) -> bool {
        b < 0x20
            || b == b'"'
            || b == b'\\'
            || (self.mode.escapes_html()
                && matches!(b, b'<' | b'>' | b'&' | b'\'' | b'+' | b'`'))
    }

    #[inline]
    fn char_needs_escape(&self, ch: char) -> bool {
        if ch.is_ascii() {
            return self.ascii_needs_escape(ch as u8);
        }
        self.mode.escapes_non_ascii()
            || (self.mode.escapes_html() && matches!(ch, '\u{2028}' | '\u{2029}'))
    }

    /// Writes the JSON form of `ch` into `out` and returns its length.
    fn escape_char(&self, ch: char, out: &mut [u8; MAX_ESCAPED_CHAR_LEN]) -> usize {
        let short = match ch {
            '"' => Some(b'"'),
            '\\' => Some(b'\\'),
            '\u{0008}' => Some(b'b'),
            '\u{000C}' => Some(b'f'),
            '\n' => Some(b'n'),
            '\r' => Some(b'r'),
            '\t' => Some(b't'),
            _ => None,
        };
        if let Some(code) = short {
            out[0] = b'\\';
            out[1] = code;
            return 2;
        }
        if !self.char_needs_escape(ch) {
            return ch.encode_utf8(out).len();
        }
        let mut units = [0u16; 2];
        let mut len = 0;
        for unit in ch.encode_utf16(&mut units).iter() {
            len += write_unit_escape(*unit, &mut out[len..]);
        }
        len
    }
}

const HEX: &[u8; 16] = b"0123456789abcdef";

fn write_unit_escape(unit: u16, out: &mut [u8]) -> usize {
    out[0] = b'\\';
    out[1] = b'u';
    out[2] = HEX[(unit >> 12) as usize & 0xF];
    out[3] = HEX[(unit >> 8) as usize & 0xF];
    out[4] = HEX[(unit >> 4) as usize & 0xF];
    out[5] = HEX[unit as usize & 0xF];
    6
}

/// Largest `n <= limit` that does not split a UTF-8 sequence in `bytes`.
#[inline]
pub(crate) fn floor_char_boundary(bytes: &[u8], limit: usize) -> usize {
    let mut n = limit.min(bytes.len());
    while n > 0 && n < bytes.len() && (bytes[n] & 0xC0) == 0x80 {
        n -= 1;
    }
    n
}

impl TextEncoder for JsonTextEncoder {
    fn first_index_needing_escape(&self, text: &[u8]) -> Option<usize> {
        let mut i = 0;
        while i < text.len() {
            let b = text[i];
            if b < 0x80 {
                if self.ascii_needs_escape(b) {
                    return Some(i);
                }
            } else if self.mode.escapes_non_ascii() {
                return Some(i);
            } else if self.mode.escapes_html()
                && b == 0xE2
                && text.get(i + 1) == Some(&0x80)
                && matches!(text.get(i + 2), Some(0xA8) | Some(0xA9))
            {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    fn first_index_needing_escape_utf16(&self, text: &[u16]) -> Option<usize> {
        text.iter()
            .position(|&unit| unit >= 0x80 || self.ascii_needs_escape(unit as u8))
    }

    fn encode(&self, src: &[u8], dst: &mut [u8], is_final: bool) -> Encoded {
        let (valid_len, tail) = match std::str::from_utf8(src) {
            Ok(_) => (src.len(), EncodeStatus::Done),
            Err(e) if e.error_len().is_none() && !is_final => {
                (e.valid_up_to(), EncodeStatus::NeedMoreData)
            }
            Err(e) => (e.valid_up_to(), EncodeStatus::InvalidData),
        };
        let text = match std::str::from_utf8(&src[..valid_len]) {
            Ok(text) => text,
            Err(e) => return Encoded::new(EncodeStatus::InvalidData, e.valid_up_to(), 0),
        };

        let bytes = text.as_bytes();
        let mut read = 0;
        let mut written = 0;
        while read < bytes.len() {
            let run = self
                .first_index_needing_escape(&bytes[read..])
                .unwrap_or(bytes.len() - read);
            if run > 0 {
                let room = dst.len() - written;
                let n = floor_char_boundary(&bytes[read..], run.min(room));
                dst[written..written + n].copy_from_slice(&bytes[read..read + n]);
                read += n;
                written += n;
                if n < run {
                    return Encoded::new(EncodeStatus::DestinationTooSmall, read, written);
                }
                continue;
            }

            let Some(ch) = text[read..].chars().next() else {
                break;
            };
            let mut scratch = [0u8; MAX_ESCAPED_CHAR_LEN];
            let len = self.escape_char(ch, &mut scratch);
            if written + len > dst.len() {
                return Encoded::new(EncodeStatus::DestinationTooSmall, read, written);
            }
            dst[written..written + len].copy_from_slice(&scratch[..len]);
            read += ch.len_utf8();
            written += len;
        }
        Encoded::new(tail, read, written)
    }

    fn encode_utf16(&self, src: &[u16], dst: &mut [u8], is_final: bool) -> Encoded {
        let mut read = 0;
        let mut written = 0;
        while read < src.len() {
            let unit = src[read];
            if unit < 0x80 && !self.ascii_needs_escape(unit as u8) {
                if written == dst.len() {
                    return Encoded::new(EncodeStatus::DestinationTooSmall, read, written);
                }
                dst[written] = unit as u8;
                read += 1;
                written += 1;
                continue;
            }

            let (decoded, width) = match unit {
                0xD800..=0xDBFF => match src.get(read + 1) {
                    Some(&next) if (0xDC00..=0xDFFF).contains(&next) => {
                        let scalar =
                            0x10000 + (((unit as u32) - 0xD800) << 10) + ((next as u32) - 0xDC00);
                        (char::from_u32(scalar), 2)
                    }
                    Some(_) => (None, 1),
                    None if !is_final => {
                        return Encoded::new(EncodeStatus::NeedMoreData, read, written);
                    }
                    None => (None, 1),
                },
                _ => (char::from_u32(unit as u32), 1),
            };

            let mut scratch = [0u8; MAX_ESCAPED_CHAR_LEN];
            let len = match decoded {
                Some(ch) => self.escape_char(ch, &mut scratch),
                None if self.allow_lone_surrogates => write_unit_escape(unit, &mut scratch),
                None => return Encoded::new(EncodeStatus::InvalidData, read, written),
            };
            if written + len > dst.len() {
                return Encoded::new(EncodeStatus::DestinationTooSmall, read, written);
            }
            dst[written..written + len].copy_from_slice(&scratch[..len]);
            read += width;
            written += len;
        }
        Encoded::new(EncodeStatus::Done, read, written)
    }
}

/// Base64-encodes as much of `src` as fits into `dst` in whole groups.
///
/// Unless `is_final` is set and everything fits, only multiples of three input
/// bytes are consumed so no padding is produced mid-value. Returns
/// `(consumed, written)`.
///
/// # Examples
///
/// ```rust
/// use chunked_json::encoder::encode_base64_chunk;
///
/// let mut dst = [0u8; 8];
/// let (consumed, written) = encode_base64_chunk(b"hello", &mut dst, false).unwrap();
/// assert_eq!((consumed, written), (3, 4));
/// assert_eq!(&dst[..written], b"aGVs");
/// ```
///
/// # Errors
///
/// Returns [`Error::Encoding`] if the codec rejects the output region.
pub fn encode_base64_chunk(src: &[u8], dst: &mut [u8], is_final: bool) -> Result<(usize, usize)> {
    let max_input = dst.len() / BASE64_GROUP_LEN * 3;
    let take = if is_final && src.len() <= max_input {
        src.len()
    } else {
        src.len().min(max_input) / 3 * 3
    };
    let written = STANDARD
        .encode_slice(&src[..take], dst)
        .map_err(|e| Error::encoding(0, &e.to_string()))?;
    Ok((take, written))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_all(encoder: &JsonTextEncoder, text: &str) -> String {
        let mut dst = vec![0u8; text.len() * MAX_ESCAPED_CHAR_LEN];
        let result = encoder.encode(text.as_bytes(), &mut dst, true);
        assert_eq!(result.status, EncodeStatus::Done);
        String::from_utf8(dst[..result.written].to_vec()).unwrap()
    }

    #[test]
    fn test_minimal_escapes() {
        let encoder = JsonTextEncoder::default();
        assert_eq!(encode_all(&encoder, "plain"), "plain");
        assert_eq!(encode_all(&encoder, "a\"b\\c"), "a\\\"b\\\\c");
        assert_eq!(encode_all(&encoder, "\n\r\t\u{8}\u{c}"), "\\n\\r\\t\\b\\f");
        assert_eq!(encode_all(&encoder, "\u{1f}\u{0}"), "\\u001f\\u0000");
        assert_eq!(encode_all(&encoder, "日本<&>"), "日本<&>");
    }

    #[test]
    fn test_html_escapes() {
        let encoder = JsonTextEncoder::new(EscapeMode::Html);
        assert_eq!(
            encode_all(&encoder, "<a href='x'>&+`"),
            "\\u003ca href=\\u0027x\\u0027\\u003e\\u0026\\u002b\\u0060"
        );
        assert_eq!(encode_all(&encoder, "\u{2028}é"), "\\u2028é");
    }

    #[test]
    fn test_ascii_escapes_astral_as_surrogate_pair() {
        let encoder = JsonTextEncoder::new(EscapeMode::Ascii);
        assert_eq!(encode_all(&encoder, "é😀"), "\\u00e9\\ud83d\\ude00");
    }

    #[test]
    fn test_destination_too_small_never_splits_escape() {
        let encoder = JsonTextEncoder::default();
        let mut dst = [0u8; 3];
        let result = encoder.encode(b"a\"\"", &mut dst, true);
        assert_eq!(result.status, EncodeStatus::DestinationTooSmall);
        assert_eq!(result.consumed, 2);
        assert_eq!(&dst[..result.written], b"a\\\"");
    }

    #[test]
    fn test_destination_too_small_never_splits_utf8() {
        let encoder = JsonTextEncoder::default();
        let mut dst = [0u8; 4];
        let result = encoder.encode("ab日".as_bytes(), &mut dst, true);
        assert_eq!(result.status, EncodeStatus::DestinationTooSmall);
        assert_eq!(result.consumed, 2);
        assert_eq!(result.written, 2);
    }

    #[test]
    fn test_incomplete_utf8_tail() {
        let encoder = JsonTextEncoder::default();
        let bytes = "a日".as_bytes();
        let mut dst = [0u8; 16];
        let partial = encoder.encode(&bytes[..2], &mut dst, false);
        assert_eq!(partial.status, EncodeStatus::NeedMoreData);
        assert_eq!(partial.consumed, 1);

        let fin = encoder.encode(&bytes[..2], &mut dst, true);
        assert_eq!(fin.status, EncodeStatus::InvalidData);
        assert_eq!(fin.consumed, 1);
    }

    #[test]
    fn test_utf16_holds_back_high_surrogate() {
        let encoder = JsonTextEncoder::default();
        let units: Vec<u16> = "a😀".encode_utf16().collect();
        let mut dst = [0u8; 16];

        let partial = encoder.encode_utf16(&units[..2], &mut dst, false);
        assert_eq!(partial.status, EncodeStatus::NeedMoreData);
        assert_eq!(partial.consumed, 1);
        assert_eq!(&dst[..partial.written], b"a");

        let whole = encoder.encode_utf16(&units, &mut dst, true);
        assert_eq!(whole.status, EncodeStatus::Done);
        assert_eq!(&dst[..whole.written], "a😀".as_bytes());
    }

    #[test]
    fn test_utf16_lone_surrogates() {
        let strict = JsonTextEncoder::default();
        let mut dst = [0u8; 16];
        let result = strict.encode_utf16(&[0x61, 0xD800], &mut dst, true);
        assert_eq!(result.status, EncodeStatus::InvalidData);
        assert_eq!(result.consumed, 1);

        let result = strict.encode_utf16(&[0xDC00, 0x61], &mut dst, false);
        assert_eq!(result.status, EncodeStatus::InvalidData);
        assert_eq!(result.consumed, 0);

        let lenient = JsonTextEncoder::default().allow_lone_surrogates(true);
        let result = lenient.encode_utf16(&[0x61, 0xD800], &mut dst, true);
        assert_eq!(result.status, EncodeStatus::Done);
        assert_eq!(&dst[..result.written], b"a\\ud800");
    }

    #[test]
    fn test_first_index_needing_escape() {
        let encoder = JsonTextEncoder::default();
        assert_eq!(encoder.first_index_needing_escape(b"abc"), None);
        assert_eq!(encoder.first_index_needing_escape(b"ab\"c"), Some(2));
        assert_eq!(encoder.first_index_needing_escape_utf16(&[0x61, 0xE9]), Some(1));

        let html = JsonTextEncoder::new(EscapeMode::Html);
        assert_eq!(
            html.first_index_needing_escape("ab\u{2028}".as_bytes()),
            Some(2)
        );
        assert_eq!(html.first_index_needing_escape("é".as_bytes()), None);
    }

    #[test]
    fn test_base64_chunk_alignment() {
        let mut dst = [0u8; 6];
        let (consumed, written) = encode_base64_chunk(b"abcdefg", &mut dst, true).unwrap();
        assert_eq!((consumed, written), (3, 4));

        let mut dst = [0u8; 12];
        let (consumed, written) = encode_base64_chunk(b"abcdefg", &mut dst, true).unwrap();
        assert_eq!((consumed, written), (7, 12));
        assert_eq!(&dst[..written], b"YWJjZGVmZw==");

        let (consumed, written) = encode_base64_chunk(b"abcdefg", &mut dst, false).unwrap();
        assert_eq!((consumed, written), (6, 8));
    }
}
