use strata_core::{Error, Kind, KindSet, Link, Maybe, Node};
use strata_schema::{Shape, StructRepr, TypeIx, UnionRepr};

use super::{Handle, ListAssembler, MapAssembler};
use crate::data::{Data, MapData};
use crate::frame::{FrameFlags, Phase};
use crate::repr::{Scalar, descend, prealloc, store, wrong_kind};
use crate::view::View;

/// Assembles one value: a scalar via one `assign_*` call, or a map or list
/// via [`NodeAssembler::begin_map`] / [`NodeAssembler::begin_list`].
///
/// Each assembler accepts exactly one successful call. A call whose kind the
/// target cannot take fails with `WrongKind` and leaves the assembler
/// usable.
pub struct NodeAssembler<'a> {
    pub(super) h: Handle<'a>,
    nullable: bool,
}

/// How storage of an opened map is organised.
enum OpenMap {
    Map,
    Struct(usize),
    Union,
    Buffered,
}

/// How storage of an opened list is organised.
enum OpenList {
    List,
    Tuple(usize),
    Buffered,
}

impl<'a> NodeAssembler<'a> {
    pub(crate) fn new(h: Handle<'a>, nullable: bool) -> Self {
        NodeAssembler { h, nullable }
    }

    /// Name of the type being assembled.
    pub fn type_name(&self) -> &str {
        self.h.name()
    }

    /// The type being assembled.
    pub fn type_ix(&self) -> TypeIx {
        self.h.ty
    }

    /// Whether this assembler works on the type or its representation.
    pub fn view(&self) -> View {
        self.h.view
    }

    /// Kinds this assembler accepts, null aside.
    pub fn kinds(&self) -> KindSet {
        self.h.view.kinds(self.h.schema, self.h.ty)
    }

    fn enter(&self, method: &'static str) {
        let phase = self.h.phase();
        if phase != Phase::Unset {
            panic!(
                "{method} called on {} at {:?}, which was already assigned ({phase:?})",
                self.h.name(),
                self.h.path().to_string()
            );
        }
    }

    /// Assign null. Only nullable slots and `Any` accept it.
    pub fn assign_null(&mut self) -> Result<(), Error> {
        self.enter("assign_null");
        let done = if self.nullable {
            Maybe::Null
        } else if matches!(self.h.shape(), Shape::Any) {
            Maybe::Value
        } else {
            let h = &self.h;
            let err = wrong_kind(h.schema, h.ty, h.view, "assign_null", KindSet::NULL);
            return Err(h.fail(err));
        };
        *self.h.target = Data::Null;
        self.h.complete(done);
        Ok(())
    }

    /// Assign a boolean.
    pub fn assign_bool(&mut self, value: bool) -> Result<(), Error> {
        self.assign(Scalar::Bool(value))
    }

    /// Assign an integer.
    pub fn assign_int(&mut self, value: i64) -> Result<(), Error> {
        self.assign(Scalar::Int(value))
    }

    /// Assign a float.
    pub fn assign_float(&mut self, value: f64) -> Result<(), Error> {
        self.assign(Scalar::Float(value))
    }

    /// Assign a string. Enums take member names at the type level; string
    /// representations (joined structs, prefixed unions) are parsed here.
    pub fn assign_string(&mut self, value: &str) -> Result<(), Error> {
        self.assign(Scalar::Str(value))
    }

    /// Assign bytes.
    pub fn assign_bytes(&mut self, value: &[u8]) -> Result<(), Error> {
        self.assign(Scalar::Bytes(value))
    }

    /// Assign a link.
    pub fn assign_link(&mut self, value: &Link) -> Result<(), Error> {
        self.assign(Scalar::Link(value))
    }

    fn assign(&mut self, value: Scalar<'_>) -> Result<(), Error> {
        self.enter(value.method());
        let h = &mut self.h;
        if let Err(err) = store(h.schema, h.ty, h.view, &mut *h.target, value) {
            return Err(h.fail(err));
        }
        h.complete(Maybe::Value);
        Ok(())
    }

    /// Start assembling a map. `size_hint` is the expected number of
    /// entries; zero or less means unknown.
    pub fn begin_map(&mut self, size_hint: i64) -> Result<MapAssembler<'_>, Error> {
        self.enter("begin_map");
        let h = &mut self.h;
        let schema = h.schema;
        let (ty, target) =
            match descend(schema, h.ty, h.view, &mut *h.target, Kind::Map, "begin_map") {
                Ok(found) => found,
                Err(err) => return Err(err.at(h.arena.path(h.frame))),
            };

        let open = match (schema.get(ty).shape(), h.view) {
            (Shape::Any | Shape::Map(_), _) => OpenMap::Map,
            (Shape::Struct(st), View::Type) => OpenMap::Struct(st.fields().len()),
            (Shape::Struct(st), View::Repr) if *st.repr() == StructRepr::Map => {
                OpenMap::Struct(st.fields().len())
            }
            (Shape::Union(_), View::Type) => OpenMap::Union,
            (Shape::Union(union), View::Repr) => match union.repr() {
                UnionRepr::Keyed(_) => OpenMap::Union,
                UnionRepr::Envelope { .. } | UnionRepr::Inline { .. } => OpenMap::Buffered,
                _ => {
                    return Err(wrong_kind(schema, ty, h.view, "begin_map", KindSet::MAP)
                        .at(h.arena.path(h.frame)));
                }
            },
            _ => {
                return Err(wrong_kind(schema, ty, h.view, "begin_map", KindSet::MAP)
                    .at(h.arena.path(h.frame)));
            }
        };

        let capacity = prealloc(size_hint);
        let mut effective = ty;
        match open {
            OpenMap::Map => *target = Data::Map(MapData::with_capacity(capacity)),
            OpenMap::Struct(fields) => *target = Data::Struct(vec![None; fields]),
            OpenMap::Union => *target = Data::Null,
            OpenMap::Buffered => {
                crate::trace!("{}: buffering map until the member is known", schema.name(ty));
                *target = Data::Map(MapData::with_capacity(capacity));
                let frame = h.arena.get_mut(h.frame);
                frame.flags |= FrameFlags::BUFFERED;
                frame.resolve = Some(ty);
                effective = schema.any();
            }
        }
        h.arena.get_mut(h.frame).phase = Phase::Initial;
        crate::trace!("begin_map {} at {}", schema.name(ty), h.arena.path(h.frame));

        Ok(MapAssembler::new(Handle {
            schema,
            arena: &mut *h.arena,
            frame: h.frame,
            ty: effective,
            view: h.view,
            target,
        }))
    }

    /// Start assembling a list. `size_hint` is the expected number of
    /// elements; zero or less means unknown.
    pub fn begin_list(&mut self, size_hint: i64) -> Result<ListAssembler<'_>, Error> {
        self.enter("begin_list");
        let h = &mut self.h;
        let schema = h.schema;
        let (ty, target) =
            match descend(schema, h.ty, h.view, &mut *h.target, Kind::List, "begin_list") {
                Ok(found) => found,
                Err(err) => return Err(err.at(h.arena.path(h.frame))),
            };

        let open = match (schema.get(ty).shape(), h.view) {
            (Shape::Any | Shape::List(_), _) => OpenList::List,
            (Shape::Struct(st), View::Repr) => match st.repr() {
                StructRepr::Tuple => OpenList::Tuple(st.fields().len()),
                StructRepr::ListPairs => OpenList::Buffered,
                _ => {
                    return Err(wrong_kind(schema, ty, h.view, "begin_list", KindSet::LIST)
                        .at(h.arena.path(h.frame)));
                }
            },
            _ => {
                return Err(wrong_kind(schema, ty, h.view, "begin_list", KindSet::LIST)
                    .at(h.arena.path(h.frame)));
            }
        };

        let mut effective = ty;
        match open {
            OpenList::List => *target = Data::List(Vec::with_capacity(prealloc(size_hint))),
            OpenList::Tuple(fields) => *target = Data::Struct(vec![None; fields]),
            OpenList::Buffered => {
                crate::trace!("{}: buffering pairs until finish", schema.name(ty));
                *target = Data::List(Vec::with_capacity(prealloc(size_hint)));
                let frame = h.arena.get_mut(h.frame);
                frame.flags |= FrameFlags::BUFFERED;
                frame.resolve = Some(ty);
                effective = schema.any();
            }
        }
        h.arena.get_mut(h.frame).phase = Phase::Initial;
        crate::trace!("begin_list {} at {}", schema.name(ty), h.arena.path(h.frame));

        Ok(ListAssembler::new(Handle {
            schema,
            arena: &mut *h.arena,
            frame: h.frame,
            ty: effective,
            view: h.view,
            target,
        }))
    }

    /// Assemble a copy of `node`.
    ///
    /// Nodes backed by storage of the same layout (same compiled schema,
    /// type and view) are copied wholesale; anything else is replayed
    /// through this assembler's own methods. Both paths produce equal
    /// values.
    pub fn assign_node<N: Node>(&mut self, node: &N) -> Result<(), Error> {
        if let Some(backing) = node.backing()
            && backing.layout == self.h.view.layout(self.h.schema, self.h.ty)
            && let Some(data) = backing.storage.downcast_ref::<Data>()
        {
            self.enter("assign_node");
            crate::trace!("assign_node: copying {} wholesale", self.h.name());
            *self.h.target = data.clone();
            self.h.complete(Maybe::Value);
            return Ok(());
        }
        crate::trace!("assign_node: replaying {} into {}", node.type_name(), self.h.name());
        super::replay::replay(self, node)
    }
}
