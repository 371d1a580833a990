//! Incremental, schema-checked value construction.
//!
//! A [`Builder`] owns the storage of one value and an arena of frames, one
//! per value being assembled. Assembler handles borrow the builder: a parent
//! hands out at most one child at a time, and the child's completion is
//! picked up lazily at the start of the parent's next call.

use core::fmt;

use strata_core::{Error, Maybe, Path};
use strata_schema::{Schema, Shape, TypeIx};

use crate::arena::{Arena, FrameId, Seg};
use crate::data::{Data, Place};
use crate::frame::{Frame, FrameFlags, Pending, Phase};
use crate::peek::{ReprNode, TypedNode};
use crate::view::View;

mod list;
mod map;
mod node;
mod replay;
mod resolve;

pub use list::ListAssembler;
pub use map::{KeyAssembler, MapAssembler};
pub use node::NodeAssembler;

/// Builds one value of a schema type.
///
/// ```
/// use strata_core::Node;
/// use strata_reflect::Builder;
/// use strata_schema::{StructField, StructRepresentation, TypeSystem};
///
/// let mut ts = TypeSystem::new();
/// ts.spawn_struct(
///     "Point",
///     [StructField::new("x", "Int"), StructField::new("y", "Int")],
///     StructRepresentation::map(),
/// );
/// let schema = ts.compile().unwrap();
/// let point = schema.type_by_name("Point").unwrap();
///
/// let mut builder = Builder::new(&schema, point);
/// let mut node = builder.assembler();
/// let mut map = node.begin_map(2).unwrap();
/// map.assemble_entry("x").unwrap().assign_int(1).unwrap();
/// map.assemble_entry("y").unwrap().assign_int(2).unwrap();
/// map.finish().unwrap();
///
/// let value = builder.build();
/// assert_eq!(value.node().lookup_by_string("y").unwrap().as_int().unwrap(), 2);
/// ```
pub struct Builder<'s> {
    schema: &'s Schema,
    ty: TypeIx,
    view: View,
    arena: Arena,
    root: FrameId,
    data: Data,
}

impl<'s> Builder<'s> {
    /// A builder assembling `ty` through its type-level shape.
    pub fn new(schema: &'s Schema, ty: TypeIx) -> Self {
        Self::with_view(schema, ty, View::Type)
    }

    /// A builder assembling `ty` from its representation.
    pub fn for_repr(schema: &'s Schema, ty: TypeIx) -> Self {
        Self::with_view(schema, ty, View::Repr)
    }

    /// A builder assembling `ty` through `view`.
    pub fn with_view(schema: &'s Schema, ty: TypeIx, view: View) -> Self {
        let mut arena = Arena::new();
        let root = arena.alloc(Frame::new(None));
        crate::debug!("builder for {} ({view:?})", schema.name(ty));
        Builder {
            schema,
            ty,
            view,
            arena,
            root,
            data: Data::Null,
        }
    }

    /// The assembler for the root value.
    ///
    /// # Panics
    ///
    /// Panics if assembly of the root has already started.
    pub fn assembler(&mut self) -> NodeAssembler<'_> {
        let phase = self.arena.get(self.root).phase;
        assert!(
            phase == Phase::Unset,
            "Builder::assembler called after assembly of {} started ({phase:?}); call reset first",
            self.schema.name(self.ty)
        );
        NodeAssembler::new(
            Handle {
                schema: self.schema,
                arena: &mut self.arena,
                frame: self.root,
                ty: self.ty,
                view: self.view,
                target: &mut self.data,
            },
            false,
        )
    }

    /// Discard whatever was assembled. Frames are kept for reuse.
    pub fn reset(&mut self) {
        self.arena.get_mut(self.root).reset(Seg::Root);
        self.data = Data::Null;
    }

    /// Returns true once the root value has been fully assembled.
    pub fn is_finished(&self) -> bool {
        self.arena.get(self.root).phase == Phase::Finished
    }

    /// Take the finished value.
    ///
    /// # Panics
    ///
    /// Panics if the root value is not finished.
    pub fn build(self) -> Value<'s> {
        assert!(
            self.is_finished(),
            "Builder::build called before the {} value was finished",
            self.schema.name(self.ty)
        );
        Value {
            schema: self.schema,
            ty: self.ty,
            data: self.data,
        }
    }
}

/// A finished value: owned storage plus the schema interpreting it.
pub struct Value<'s> {
    schema: &'s Schema,
    ty: TypeIx,
    data: Data,
}

impl<'s> Value<'s> {
    /// The type-level view.
    pub fn node(&self) -> TypedNode<'_> {
        TypedNode::new(self.schema, self.ty, &self.data)
    }

    /// The representation-level view of the same storage.
    pub fn repr(&self) -> ReprNode<'_> {
        ReprNode::new(self.schema, self.ty, &self.data)
    }

    /// The schema the value belongs to.
    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// The value's type.
    pub fn type_ix(&self) -> TypeIx {
        self.ty
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("type", &self.schema.name(self.ty))
            .field("data", &self.data)
            .finish()
    }
}

/// What every assembler handle points at: one frame, the type it assembles,
/// and the storage it writes.
pub(crate) struct Handle<'a> {
    pub(crate) schema: &'a Schema,
    pub(crate) arena: &'a mut Arena,
    pub(crate) frame: FrameId,
    pub(crate) ty: TypeIx,
    pub(crate) view: View,
    pub(crate) target: &'a mut Data,
}

impl Handle<'_> {
    pub(crate) fn name(&self) -> &str {
        self.schema.name(self.ty)
    }

    pub(crate) fn shape(&self) -> &Shape {
        self.schema.get(self.ty).shape()
    }

    pub(crate) fn path(&self) -> Path {
        self.arena.path(self.frame)
    }

    /// Attach this frame's path to an error raised here.
    pub(crate) fn fail(&self, err: Error) -> Error {
        err.at(self.path())
    }

    pub(crate) fn phase(&self) -> Phase {
        self.arena.get(self.frame).phase
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.arena.get_mut(self.frame).phase = phase;
    }

    pub(crate) fn complete(&mut self, done: Maybe) {
        crate::trace!("{} at {} complete ({done:?})", self.name(), self.path());
        self.arena.get_mut(self.frame).complete(done);
    }

    /// Pick up the completion of the child handed out last, if any, and
    /// return the frame to [`Phase::Initial`].
    ///
    /// # Panics
    ///
    /// Panics on misuse: a key assembler dropped without a key, a value
    /// assembler dropped before its value was complete, or any call after
    /// `finish`.
    pub(crate) fn settle(&mut self, method: &'static str) {
        let frame = self.arena.get(self.frame);
        match frame.phase {
            Phase::Initial | Phase::ExpectValue => {}
            Phase::MidKey => panic!(
                "{method} called on {} at {:?} while its key is unassigned",
                self.name(),
                self.path().to_string()
            ),
            Phase::MidValue => {
                let child = self.arena.get(frame.active);
                if child.flags.contains(FrameFlags::IN_PROGRESS) {
                    panic!(
                        "{method} called on {} while the value at {:?} is unfinished",
                        self.name(),
                        self.arena.path(frame.active).to_string()
                    );
                }
                let (pending, done) = (frame.pending, child.done);
                self.set_phase(Phase::Initial);
                if let (Pending::Field(index), Maybe::Null) = (pending, done) {
                    self.null_to_absent(index);
                }
            }
            Phase::Unset | Phase::Finished => panic!(
                "{method} called on {} after it was finished",
                self.name()
            ),
        }
    }

    /// Tuple slots of optional, non-nullable fields read null as absent.
    fn null_to_absent(&mut self, index: usize) {
        let Shape::Struct(st) = self.schema.get(self.ty).shape() else {
            return;
        };
        if !st.field(index).nullable() {
            crate::trace!("{}: null in optional field {index} read as absent", self.name());
            self.target.as_slots_mut()[index] = None;
        }
    }

    /// Hand out the assembler for child frame `child`, writing into `place`
    /// of this handle's storage.
    pub(crate) fn hand_out(
        &mut self,
        child: FrameId,
        ty: TypeIx,
        view: View,
        nullable: bool,
        place: Place,
    ) -> NodeAssembler<'_> {
        self.set_phase(Phase::MidValue);
        NodeAssembler::new(
            Handle {
                schema: self.schema,
                arena: &mut *self.arena,
                frame: child,
                ty,
                view,
                target: self.target.child_mut(place),
            },
            nullable,
        )
    }
}
