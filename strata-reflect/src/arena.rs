//! Arena of persistent assembler frames.
//!
//! Frames are addressed by [`FrameId`] rather than by reference, so a parent
//! frame can name its children while the caller holds a mutable borrow of the
//! arena through whichever assembler handle is active. Frames are never freed
//! while the builder lives: a child frame is reset and reused every time its
//! slot is assembled again.

use strata_core::{Path, PathSegment};

use crate::frame::Frame;

/// Index into the frame arena.
///
/// Slot 0 is reserved for the `NONE` sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FrameId(u32);

impl FrameId {
    /// Sentinel: no frame allocated for this slot yet.
    pub(crate) const NONE: FrameId = FrameId(0);

    #[inline]
    pub(crate) fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    fn index(self) -> usize {
        debug_assert!(!self.is_none(), "cannot get index of sentinel FrameId");
        self.0 as usize
    }
}

pub(crate) struct Arena {
    /// Slot 0 is always `None`.
    slots: Vec<Option<Frame>>,
}

impl Arena {
    pub(crate) fn new() -> Self {
        Arena { slots: vec![None] }
    }

    pub(crate) fn alloc(&mut self, frame: Frame) -> FrameId {
        let idx = self.slots.len();
        assert!(idx < u32::MAX as usize, "arena exceeded maximum capacity");
        self.slots.push(Some(frame));
        FrameId(idx as u32)
    }

    /// # Panics
    ///
    /// Panics if `id` is the sentinel.
    #[inline]
    pub(crate) fn get(&self, id: FrameId) -> &Frame {
        self.slots[id.index()]
            .as_ref()
            .expect("frame slot is empty")
    }

    /// # Panics
    ///
    /// Panics if `id` is the sentinel.
    #[inline]
    pub(crate) fn get_mut(&mut self, id: FrameId) -> &mut Frame {
        self.slots[id.index()]
            .as_mut()
            .expect("frame slot is empty")
    }

    /// The child frame of `parent` for `slot`, allocated on first use and
    /// reset for the new value every time.
    pub(crate) fn reuse_child(
        &mut self,
        parent: FrameId,
        slot: usize,
        segment: Seg<'_>,
    ) -> FrameId {
        let existing = self
            .get(parent)
            .children
            .get(slot)
            .copied()
            .filter(|id| !id.is_none());
        let id = match existing {
            Some(id) => {
                crate::trace!("reusing frame {id:?} for slot {slot} of {parent:?}");
                id
            }
            None => {
                let id = self.alloc(Frame::new(Some(parent)));
                let children = &mut self.get_mut(parent).children;
                while children.len() <= slot {
                    children.push(FrameId::NONE);
                }
                children[slot] = id;
                crate::trace!("allocated frame {id:?} for slot {slot} of {parent:?}");
                id
            }
        };
        self.get_mut(id).reset(segment);
        self.get_mut(parent).active = id;
        id
    }

    /// Like [`Arena::reuse_child`], naming the child after the key most
    /// recently accepted by `parent`.
    pub(crate) fn reuse_child_at_key(&mut self, parent: FrameId, slot: usize) -> FrameId {
        let key = core::mem::take(&mut self.get_mut(parent).key);
        let id = self.reuse_child(parent, slot, Seg::Key(&key));
        self.get_mut(parent).key = key;
        id
    }

    /// Path from the root to `id`.
    pub(crate) fn path(&self, id: FrameId) -> Path {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let frame = self.get(id);
            if let Some(segment) = frame.segment() {
                segments.push(segment.clone());
            }
            current = frame.parent;
        }
        segments.into_iter().rev().collect()
    }

    /// Number of frames allocated so far.
    #[cfg(test)]
    pub(crate) fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed form of a path segment, copied into a frame's reusable buffer.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Seg<'k> {
    Root,
    Key(&'k str),
    Index(usize),
}

impl From<Seg<'_>> for Option<PathSegment> {
    fn from(seg: Seg<'_>) -> Self {
        match seg {
            Seg::Root => None,
            Seg::Key(key) => Some(PathSegment::Key(key.to_owned())),
            Seg::Index(index) => Some(PathSegment::Index(index)),
        }
    }
}
