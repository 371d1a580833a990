//! Per-value assembly state.

use smallvec::SmallVec;
use strata_core::{Maybe, PathSegment};
use strata_schema::TypeIx;

use crate::arena::{FrameId, Seg};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub(crate) struct FrameFlags: u8 {
        /// The value has been handed out and has not completed yet.
        const IN_PROGRESS = 1 << 0;
        /// Storage holds `Any` data that is converted to `resolve` on finish.
        const BUFFERED = 1 << 1;
    }
}

/// Where a frame is in the assembly protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Nothing assigned or begun yet.
    Unset,
    /// A map or list is open with no key or value in flight.
    Initial,
    /// A key assembler is out.
    MidKey,
    /// A key was accepted; its value has not been requested.
    ExpectValue,
    /// A value assembler is out.
    MidValue,
    Finished,
}

/// What the child handed out by a recursive frame is filling in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Pending {
    Nothing,
    /// A struct slot.
    Field(usize),
    /// A map value or list element.
    Entry,
    /// The single member of a union.
    Member,
}

pub(crate) struct Frame {
    pub(crate) parent: Option<FrameId>,
    segment: Option<PathSegment>,
    pub(crate) flags: FrameFlags,
    pub(crate) phase: Phase,
    /// Completion cell; written by this frame, read lazily by the parent.
    pub(crate) done: Maybe,
    /// Child frame per slot, `FrameId::NONE` until first used.
    pub(crate) children: SmallVec<FrameId, 4>,
    /// The child most recently handed out.
    pub(crate) active: FrameId,
    pub(crate) pending: Pending,
    /// Elements or members seen so far.
    pub(crate) cursor: usize,
    /// Representation string of the key most recently accepted.
    pub(crate) key: String,
    pub(crate) resolve: Option<TypeIx>,
}

impl Frame {
    pub(crate) fn new(parent: Option<FrameId>) -> Self {
        Frame {
            parent,
            segment: None,
            flags: FrameFlags::IN_PROGRESS,
            phase: Phase::Unset,
            done: Maybe::Absent,
            children: SmallVec::new(),
            active: FrameId::NONE,
            pending: Pending::Nothing,
            cursor: 0,
            key: String::new(),
            resolve: None,
        }
    }

    /// Prepare the frame for a new value. Children and buffers are kept.
    pub(crate) fn reset(&mut self, segment: Seg<'_>) {
        match (segment, &mut self.segment) {
            (Seg::Key(key), Some(PathSegment::Key(buf))) => {
                buf.clear();
                buf.push_str(key);
            }
            (segment, slot) => *slot = segment.into(),
        }
        self.flags = FrameFlags::IN_PROGRESS;
        self.phase = Phase::Unset;
        self.done = Maybe::Absent;
        self.active = FrameId::NONE;
        self.pending = Pending::Nothing;
        self.cursor = 0;
        self.key.clear();
        self.resolve = None;
    }

    pub(crate) fn segment(&self) -> Option<&PathSegment> {
        self.segment.as_ref()
    }

    /// Record completion and release the in-progress marker.
    pub(crate) fn complete(&mut self, done: Maybe) {
        self.phase = Phase::Finished;
        self.done = done;
        self.flags.remove(FrameFlags::IN_PROGRESS);
    }
}
