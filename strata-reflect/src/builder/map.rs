use strata_core::{Error, ErrorKind, Kind, KindSet, Maybe, Node};
use strata_schema::{MapShape, Shape, StructShape, UnionRepr, UnionShape};

use super::{Handle, NodeAssembler};
use crate::arena::Seg;
use crate::data::{Data, MapData, Place};
use crate::frame::{Pending, Phase};
use crate::repr::{missing_fields, parse_key, render};
use crate::view::View;

/// Child slot of map values.
const VALUE_SLOT: usize = 0;
/// Child slot of the scratch frame assembling non-string map keys.
const KEY_SLOT: usize = 1;

/// Assembles the entries of a map, a map-represented struct, or a
/// single-entry union.
///
/// Entries are added either as [`MapAssembler::assemble_key`] followed by
/// [`MapAssembler::assemble_value`], or in one step with
/// [`MapAssembler::assemble_entry`]. A key that is rejected (unknown field,
/// repeated key, unparseable) leaves the map as it was before the key.
pub struct MapAssembler<'a> {
    h: Handle<'a>,
}

/// What the keys of an open map address.
#[derive(Clone, Copy)]
enum Keys<'s> {
    Any,
    Map(&'s MapShape),
    Struct(&'s StructShape),
    Union(&'s UnionShape),
}

impl<'a> MapAssembler<'a> {
    pub(crate) fn new(h: Handle<'a>) -> Self {
        MapAssembler { h }
    }

    /// Name of the type being assembled.
    pub fn type_name(&self) -> &str {
        self.h.name()
    }

    fn keys(&self) -> Keys<'a> {
        match self.h.schema.get(self.h.ty).shape() {
            Shape::Any => Keys::Any,
            Shape::Map(map) => Keys::Map(map),
            Shape::Struct(st) => Keys::Struct(st),
            Shape::Union(union) => Keys::Union(union),
            _ => unreachable!("{} is not assembled as a map", self.h.name()),
        }
    }

    fn expect(&self, expected: Phase, method: &'static str) {
        let phase = self.h.phase();
        assert!(
            phase == expected,
            "{method} called on {} out of order: expected {expected:?}, found {phase:?}",
            self.h.name()
        );
    }

    /// Start the next entry's key.
    ///
    /// # Panics
    ///
    /// Panics if the previous key was never assigned, or a value is still
    /// expected or unfinished.
    pub fn assemble_key(&mut self) -> KeyAssembler<'_, 'a> {
        self.h.settle("assemble_key");
        self.expect(Phase::Initial, "assemble_key");
        self.h.set_phase(Phase::MidKey);
        KeyAssembler { map: self }
    }

    /// The assembler for the value of the key just accepted.
    ///
    /// # Panics
    ///
    /// Panics unless a key was accepted and its value not yet requested.
    pub fn assemble_value(&mut self) -> NodeAssembler<'_> {
        self.h.settle("assemble_value");
        self.expect(Phase::ExpectValue, "assemble_value");
        self.value_assembler()
    }

    /// Accept `key` and return the assembler for its value.
    pub fn assemble_entry(&mut self, key: &str) -> Result<NodeAssembler<'_>, Error> {
        self.h.settle("assemble_entry");
        self.expect(Phase::Initial, "assemble_entry");
        self.h.set_phase(Phase::MidKey);
        self.accept_key(key)?;
        Ok(self.value_assembler())
    }

    /// Close the map. Structs check their required fields here, and
    /// buffered unions pick their member.
    pub fn finish(&mut self) -> Result<(), Error> {
        self.h.settle("finish");
        self.expect(Phase::Initial, "finish");
        match self.keys() {
            Keys::Struct(st) => {
                let Data::Struct(slots) = &*self.h.target else {
                    unreachable!("struct storage")
                };
                if let Some(err) = missing_fields(st, slots, self.h.view) {
                    return Err(self.h.fail(err));
                }
            }
            Keys::Union(_) => {
                if self.h.arena.get(self.h.frame).cursor == 0 {
                    let err = Error::new(ErrorKind::NotUnionStructure {
                        type_name: self.h.name().to_owned(),
                        members: 0,
                    });
                    return Err(self.h.fail(err));
                }
            }
            Keys::Any | Keys::Map(_) => {}
        }
        self.h.resolve_buffered()?;
        self.h.complete(Maybe::Value);
        Ok(())
    }

    fn accept_key(&mut self, key: &str) -> Result<(), Error> {
        match self.insert_key(key) {
            Ok(()) => {
                self.h.set_phase(Phase::ExpectValue);
                Ok(())
            }
            Err(err) => {
                crate::trace!("{}: rejected key {key:?}", self.h.name());
                self.h.set_phase(Phase::Initial);
                Err(self.h.fail(err))
            }
        }
    }

    fn insert_key(&mut self, key: &str) -> Result<(), Error> {
        let keys = self.keys();
        let h = &mut self.h;
        match keys {
            Keys::Any => {
                push_key(h.target.as_map_mut(), Data::String(key.to_owned()), key)?;
                record(h, key, Pending::Entry);
            }
            Keys::Map(map) => {
                let (parsed, repr) = parse_key(h.schema, map.key, h.view, key)
                    .map_err(|err| invalid_key(h.name(), key, err.kind.to_string()))?;
                push_key(h.target.as_map_mut(), parsed, &repr)?;
                record(h, &repr, Pending::Entry);
            }
            Keys::Struct(st) => {
                let index = match h.view {
                    View::Type => st.field_index(key),
                    View::Repr => st.field_by_key(key),
                }
                .ok_or_else(|| invalid_key(h.name(), key, "no such field".into()))?;
                let slots = h.target.as_slots_mut();
                if slots[index].is_some() {
                    return Err(repeated(key));
                }
                slots[index] = Some(Data::Null);
                record(h, key, Pending::Field(index));
            }
            Keys::Union(union) => {
                let seen = h.arena.get(h.frame).cursor;
                if seen > 0 {
                    return Err(Error::new(ErrorKind::NotUnionStructure {
                        type_name: h.name().to_owned(),
                        members: seen + 1,
                    }));
                }
                let member = match (h.view, union.repr()) {
                    (View::Type, _) => union.member_by_name(key),
                    (View::Repr, UnionRepr::Keyed(table)) => table.member(key),
                    (View::Repr, _) => unreachable!("only keyed unions are assembled as maps"),
                }
                .ok_or_else(|| invalid_key(h.name(), key, "no such member".into()))?;
                *h.target = Data::union(member);
                h.arena.get_mut(h.frame).cursor += 1;
                record(h, key, Pending::Member);
            }
        }
        Ok(())
    }

    /// Keys of non-string kind: assemble into scratch storage, then insert
    /// under the key's representation string.
    fn accept_key_node<N: Node>(&mut self, key: &N) -> Result<(), Error> {
        let Keys::Map(map) = self.keys() else {
            self.h.set_phase(Phase::Initial);
            let err = Error::wrong_kind(self.h.name(), "assign_node", KindSet::STRING, key.kind());
            return Err(self.h.fail(err));
        };
        let h = &mut self.h;
        let mut scratch = Data::Null;
        let child = h.arena.reuse_child(h.frame, KEY_SLOT, Seg::Root);
        let assembled = NodeAssembler::new(
            Handle {
                schema: h.schema,
                arena: &mut *h.arena,
                frame: child,
                ty: map.key,
                view: h.view,
                target: &mut scratch,
            },
            false,
        )
        .assign_node(key);
        if let Err(err) = assembled {
            h.set_phase(Phase::Initial);
            return Err(err);
        }

        let repr = match render(h.schema, map.key, &scratch) {
            Ok(repr) => repr.into_owned(),
            Err(err) => {
                h.set_phase(Phase::Initial);
                return Err(h.fail(err));
            }
        };
        if let Err(err) = push_key(h.target.as_map_mut(), scratch, &repr) {
            h.set_phase(Phase::Initial);
            return Err(h.fail(err));
        }
        record(h, &repr, Pending::Entry);
        h.set_phase(Phase::ExpectValue);
        Ok(())
    }

    fn value_assembler(&mut self) -> NodeAssembler<'_> {
        let keys = self.keys();
        let h = &mut self.h;
        let pending = h.arena.get(h.frame).pending;
        let (slot, ty, nullable, place) = match (keys, pending) {
            (Keys::Any, _) => (VALUE_SLOT, h.schema.any(), false, Place::MapValue),
            (Keys::Map(map), _) => (VALUE_SLOT, map.value, map.nullable, Place::MapValue),
            (Keys::Struct(st), Pending::Field(index)) => {
                let field = st.field(index);
                (index, field.ty(), field.nullable(), Place::Field(index))
            }
            (Keys::Union(union), _) => {
                let Data::Union(chosen) = &*h.target else {
                    unreachable!("union member chosen by its key")
                };
                let member = chosen.member;
                (member, union.member(member), false, Place::Member)
            }
            (Keys::Struct(_), pending) => unreachable!("struct value for {pending:?}"),
        };
        let child = h.arena.reuse_child_at_key(h.frame, slot);
        let view = h.view;
        h.hand_out(child, ty, view, nullable, place)
    }
}

/// Assigns the key of one map entry. Consumed by the assignment; dropping
/// it unassigned leaves the map unusable.
pub struct KeyAssembler<'m, 'a> {
    map: &'m mut MapAssembler<'a>,
}

impl KeyAssembler<'_, '_> {
    /// Assign the key from its string form.
    pub fn assign_string(self, key: &str) -> Result<(), Error> {
        self.map.accept_key(key)
    }

    /// Assign the key from a node. String nodes go through
    /// [`KeyAssembler::assign_string`]; maps keyed by structured types also
    /// take the key type's own nodes.
    pub fn assign_node<N: Node>(self, key: &N) -> Result<(), Error> {
        if key.kind() != Kind::String {
            return self.map.accept_key_node(key);
        }
        match key.as_string() {
            Ok(text) => self.map.accept_key(&text),
            Err(err) => {
                self.map.h.set_phase(Phase::Initial);
                Err(err)
            }
        }
    }
}

fn record(h: &mut Handle<'_>, key: &str, pending: Pending) {
    crate::trace!("{}: accepted key {key:?}", h.name());
    let frame = h.arena.get_mut(h.frame);
    frame.key.clear();
    frame.key.push_str(key);
    frame.pending = pending;
}

fn push_key(map: &mut MapData, key: Data, repr: &str) -> Result<(), Error> {
    map.try_push(key, repr).map_err(|_| repeated(repr))
}

fn repeated(key: &str) -> Error {
    Error::new(ErrorKind::RepeatedMapKey {
        key: key.to_owned(),
    })
}

fn invalid_key(type_name: &str, key: &str, reason: String) -> Error {
    Error::new(ErrorKind::InvalidKey {
        type_name: type_name.to_owned(),
        key: key.to_owned(),
        reason,
    })
}
