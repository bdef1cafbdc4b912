//! The resumable write contract.
//!
//! Every value the engine can emit implements [`JsonWrite`]. A call either finishes
//! the value (`Ok(true)`) or leaves its progress on the write stack and asks to be
//! called again with the same value (`Ok(false)`). Between those calls the caller
//! is free to drain the sink; nothing else about the value may change.
//!
//! Dispatch is static: each concrete type's impl is the "registered writer" for
//! that type, resolved at compile time. See [`Registry`](crate::Registry) for
//! values only known at runtime.

use crate::{Result, WriterState};
use std::borrow::Cow;
use std::rc::Rc;
use std::sync::Arc;

/// A value that can be written as JSON, possibly across several calls.
pub trait JsonWrite {
    /// Writes as much of the value as the sink allows.
    ///
    /// Returns `Ok(true)` once the value is complete and `Ok(false)` if it must be
    /// called again (with this same value) to continue.
    ///
    /// # Errors
    ///
    /// Any error is terminal for the write in progress.
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool>;
}

impl<T: JsonWrite + ?Sized> JsonWrite for &T {
    #[inline]
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        (**self).write_json(state)
    }
}

impl<T: JsonWrite + ?Sized> JsonWrite for Box<T> {
    #[inline]
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        (**self).write_json(state)
    }
}

impl<T: JsonWrite + ?Sized> JsonWrite for Rc<T> {
    #[inline]
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        (**self).write_json(state)
    }
}

impl<T: JsonWrite + ?Sized> JsonWrite for Arc<T> {
    #[inline]
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        (**self).write_json(state)
    }
}

impl JsonWrite for Cow<'_, str> {
    #[inline]
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        self.as_ref().write_json(state)
    }
}

/// Nullable wrapper: `None` is `null`, `Some` forwards the inner result unchanged.
impl<T: JsonWrite> JsonWrite for Option<T> {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        match self {
            None => {
                state.write_leaf(b"null")?;
                Ok(true)
            }
            Some(value) => value.write_json(state),
        }
    }
}
