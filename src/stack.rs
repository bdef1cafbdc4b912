//! The write stack: resumable progress for every open nesting level.
//!
//! Frames live in one `Vec` indexed by nesting depth. Slots are reused across
//! values, so after the deepest level has been reached once, suspending and
//! resuming never allocates.
//!
//! Three counters describe the stack:
//!
//! - `depth` is the nesting level of the writer currently executing,
//! - `active` is the number of slots holding live progress from an earlier call,
//! - `frames.len()` is the number of slots ever allocated.
//!
//! A writer at depth `d` is resuming exactly when `d < active`.

use crate::{Error, Result};
use std::fmt;

/// Whether the opening token of a value has been emitted.
///
/// Progress is monotonic: `NotStarted -> Opened -> Done`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ValueProgress {
    #[default]
    NotStarted,
    Opened,
    Done,
}

/// Whether the current member's name (or, for arrays, its separating comma) has
/// been emitted ahead of its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PropertyProgress {
    #[default]
    None,
    NameWritten,
}

/// What kind of writer owns a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FrameKind {
    #[default]
    Array,
    Stream,
    Object,
    ObjectStream,
    Text,
    Utf16Text,
    Binary,
}

/// Resumable progress for one open value.
#[derive(Default)]
pub struct Frame {
    pub kind: FrameKind,
    /// Address of the value's backing storage, used to detect a different value.
    pub identity: usize,
    /// Element or unit count observed when the frame was opened.
    pub source_len: usize,
    /// Element index for collections, unit index for chunked values.
    pub cursor: usize,
    pub value_progress: ValueProgress,
    pub property_progress: PropertyProgress,
    /// Input unit read but not yet encoded.
    pub pending_tail: Option<u16>,
}

impl Frame {
    pub fn new(kind: FrameKind, identity: usize, source_len: usize) -> Self {
        Frame {
            kind,
            identity,
            source_len,
            ..Frame::default()
        }
    }

    /// Checks that a resumed frame belongs to the value being written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the kind, identity or length differ.
    pub fn expect(&self, kind: FrameKind, identity: usize, source_len: usize) -> Result<()> {
        if self.kind != kind {
            return Err(Error::Protocol(format!(
                "expected to resume a {:?} value, found a suspended {:?} frame",
                kind, self.kind
            )));
        }
        if self.identity != identity {
            return Err(Error::protocol(
                "a different value was supplied while a suspended write expects resumption",
            ));
        }
        if self.source_len != source_len {
            return Err(Error::Protocol(format!(
                "value length changed from {} to {} between resumptions",
                self.source_len, source_len
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("kind", &self.kind)
            .field("identity", &format_args!("{:#x}", self.identity))
            .field("source_len", &self.source_len)
            .field("cursor", &self.cursor)
            .field("value_progress", &self.value_progress)
            .field("property_progress", &self.property_progress)
            .field("pending_tail", &self.pending_tail)
            .finish()
    }
}

/// Index-addressed stack of [`Frame`]s.
#[derive(Debug, Default)]
pub struct WriteStack {
    frames: Vec<Frame>,
    active: usize,
    depth: usize,
}

impl WriteStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nesting level of the writer currently executing.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of levels holding suspended progress.
    pub fn active(&self) -> usize {
        self.active
    }

    pub fn is_suspended(&self) -> bool {
        self.active > 0
    }

    /// Suspended frame at `depth`, if any.
    pub fn frame(&self, depth: usize) -> Option<&Frame> {
        if depth < self.active {
            self.frames.get(depth)
        } else {
            None
        }
    }

    /// Takes the suspended frame for the current depth out of its slot.
    ///
    /// Returns `None` when the writer at this depth is starting fresh. The caller
    /// owns the frame until it calls [`suspend`](Self::suspend) or
    /// [`complete`](Self::complete).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the suspended frame belongs to another value.
    pub fn resume(
        &mut self,
        kind: FrameKind,
        identity: usize,
        source_len: usize,
    ) -> Result<Option<Frame>> {
        if self.depth >= self.active {
            return Ok(None);
        }
        let frame = std::mem::take(&mut self.frames[self.depth]);
        frame.expect(kind, identity, source_len)?;
        tracing::trace!(
            depth = self.depth,
            kind = ?frame.kind,
            cursor = frame.cursor,
            "resuming frame"
        );
        Ok(Some(frame))
    }

    /// Checks that no suspended frame waits at the current depth.
    ///
    /// Leaves never suspend, so a leaf written where a frame is waiting means the
    /// caller supplied a different value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] naming the waiting frame's kind.
    pub fn expect_fresh(&self) -> Result<()> {
        if self.depth < self.active {
            return Err(Error::Protocol(format!(
                "a scalar was supplied where a suspended {:?} value expects resumption",
                self.frames[self.depth].kind
            )));
        }
        Ok(())
    }

    /// Stores `frame` at the current depth for the next call.
    pub fn suspend(&mut self, frame: Frame) {
        tracing::trace!(
            depth = self.depth,
            kind = ?frame.kind,
            cursor = frame.cursor,
            "suspending frame"
        );
        while self.frames.len() <= self.depth {
            self.frames.push(Frame::default());
        }
        self.frames[self.depth] = frame;
        self.active = self.active.max(self.depth + 1);
    }

    /// Pops the current depth after its writer finished.
    pub fn complete(&mut self) {
        if self.active > self.depth {
            self.frames[self.depth] = Frame::default();
        }
        self.active = self.active.min(self.depth);
    }

    /// Enters a child value.
    pub fn descend(&mut self) {
        self.depth += 1;
    }

    pub fn ascend(&mut self) {
        debug_assert!(self.depth > 0);
        self.depth -= 1;
    }

    /// Drops all progress, keeping the allocated slots.
    pub fn clear(&mut self) {
        for frame in &mut self.frames[..self.active] {
            *frame = Frame::default();
        }
        self.active = 0;
        self.depth = 0;
    }
}
