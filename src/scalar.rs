//! Scalar encoders.
//!
//! Scalars are leaves: each one reserves exactly the space its token needs, writes
//! it in one pass and returns `Ok(true)`. They never suspend, so a scalar written
//! at a depth holding a suspended frame is refused as a protocol violation.

use crate::options::NonFiniteFloats;
use crate::{Error, JsonWrite, Result, WriterState};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use num_bigint::BigInt;
use uuid::Uuid;

// Longest decimal forms: i32::MIN is 11 bytes, i128::MIN is 40.
const SMALL_INT_LEN: usize = 11;
const LARGE_INT_LEN: usize = 40;

impl JsonWrite for bool {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        state.write_leaf(if *self { b"true" } else { b"false" })?;
        Ok(true)
    }
}

impl JsonWrite for () {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        state.write_leaf(b"null")?;
        Ok(true)
    }
}

macro_rules! impl_small_int {
    ($($ty:ty),*) => {
        $(
            impl JsonWrite for $ty {
                fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
                    state.write_display(self, SMALL_INT_LEN, false)?;
                    Ok(true)
                }
            }
        )*
    };
}

impl_small_int!(i8, i16, i32, u8, u16, u32);

// Wide integers lose precision in IEEE 754 consumers, so they can be quoted.
macro_rules! impl_large_int {
    ($($ty:ty),*) => {
        $(
            impl JsonWrite for $ty {
                fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
                    let quoted = state.options().quote_large_integers;
                    state.write_display(self, LARGE_INT_LEN, quoted)?;
                    Ok(true)
                }
            }
        )*
    };
}

impl_large_int!(i64, u64, i128, u128, isize, usize);

fn write_non_finite(label: &str, state: &mut WriterState<'_>) -> Result<bool> {
    match state.options().non_finite_floats {
        NonFiniteFloats::Error => Err(Error::InvalidValue(format!(
            "{} cannot be represented in JSON",
            label
        ))),
        NonFiniteFloats::Null => {
            state.write_leaf(b"null")?;
            Ok(true)
        }
        NonFiniteFloats::Quoted => {
            state.write_display(&label, label.len(), true)?;
            Ok(true)
        }
    }
}

fn non_finite_label(is_nan: bool, is_sign_negative: bool) -> &'static str {
    if is_nan {
        "NaN"
    } else if is_sign_negative {
        "-INF"
    } else {
        "INF"
    }
}

impl JsonWrite for f64 {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        if !self.is_finite() {
            let label = non_finite_label(self.is_nan(), self.is_sign_negative());
            return write_non_finite(label, state);
        }
        state.write_leaf(self.to_string().as_bytes())?;
        Ok(true)
    }
}

impl JsonWrite for f32 {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        if !self.is_finite() {
            let label = non_finite_label(self.is_nan(), self.is_sign_negative());
            return write_non_finite(label, state);
        }
        state.write_leaf(self.to_string().as_bytes())?;
        Ok(true)
    }
}

impl JsonWrite for char {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        let mut buf = [0u8; 4];
        state.stack.expect_fresh()?;
        state.write_escaped(self.encode_utf8(&mut buf), b"")?;
        Ok(true)
    }
}

impl JsonWrite for DateTime<Utc> {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        let text = self.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        state.write_display(&text, text.len(), true)?;
        Ok(true)
    }
}

impl JsonWrite for NaiveDate {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        state.write_display(self, 16, true)?;
        Ok(true)
    }
}

impl JsonWrite for NaiveDateTime {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        let text = self.format("%Y-%m-%dT%H:%M:%S%.f").to_string();
        state.write_display(&text, text.len(), true)?;
        Ok(true)
    }
}

impl JsonWrite for Uuid {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        state.write_display(&self.hyphenated(), uuid::fmt::Hyphenated::LENGTH, true)?;
        Ok(true)
    }
}

impl JsonWrite for BigInt {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        let digits = self.to_string();
        let quoted = state.options().quote_large_integers;
        state.write_display(&digits, digits.len(), quoted)?;
        Ok(true)
    }
}

/// A closed set of named members written as their quoted name.
///
/// Implement it by hand or with [`json_enum!`](crate::json_enum).
pub trait JsonEnum {
    fn member_name(&self) -> &str;
}

/// Writes an enum member as its quoted, escaped name.
///
/// # Errors
///
/// Fails if the text encoder rejects the name.
pub fn write_enum<E: JsonEnum + ?Sized>(value: &E, state: &mut WriterState<'_>) -> Result<bool> {
    state.stack.expect_fresh()?;
    state.write_escaped(value.member_name(), b"")?;
    Ok(true)
}
