use alloc::borrow::Cow;
use core::fmt;

use strata_core::{
    Backing, Error, Kind, KindSet, Link, ListIterator, MapIterator, Node, overread, wrong_kind,
};
use strata_schema::{EnumRepr, Schema, Shape, StructRepr, TypeIx, UnionRepr};

use super::index_not_exists;
use crate::data::Data;
use crate::repr::{key_identity, render, render_bytes};
use crate::view::View;

/// Representation-level view of a value.
///
/// Lookups and iteration yield representation-level nodes all the way
/// down. Kinded unions are transparent: the node behaves exactly like its
/// member.
#[derive(Clone, Copy)]
pub struct ReprNode<'a> {
    schema: &'a Schema,
    inner: Repr<'a>,
}

#[derive(Clone, Copy)]
enum Repr<'a> {
    Value {
        ty: TypeIx,
        data: &'a Data,
    },
    Absent,
    /// An absent tuple field before the last present one.
    Null,
    /// Synthesized text: renamed keys, discriminants.
    Text(&'a str),
    /// One `[key, value]` entry of a list-pairs struct.
    Pair {
        ty: TypeIx,
        slots: &'a [Option<Data>],
        index: usize,
    },
}

/// Length of a tuple: up to and including the last present field.
fn tuple_len(slots: &[Option<Data>]) -> usize {
    slots.iter().rposition(Option::is_some).map_or(0, |last| last + 1)
}

impl<'a> ReprNode<'a> {
    pub(crate) fn new(schema: &'a Schema, ty: TypeIx, data: &'a Data) -> Self {
        ReprNode {
            schema,
            inner: Repr::Value { ty, data },
        }
    }

    pub(crate) fn absent(schema: &'a Schema) -> Self {
        ReprNode {
            schema,
            inner: Repr::Absent,
        }
    }

    pub(crate) fn text(schema: &'a Schema, text: &'a str) -> Self {
        ReprNode {
            schema,
            inner: Repr::Text(text),
        }
    }

    fn value(&self, ty: TypeIx, data: &'a Data) -> Self {
        ReprNode::new(self.schema, ty, data)
    }

    fn with(&self, inner: Repr<'a>) -> Self {
        ReprNode {
            schema: self.schema,
            inner,
        }
    }

    /// The node's schema type; `None` for synthesized keys, discriminants and
    /// pair entries.
    pub fn type_ix(&self) -> Option<TypeIx> {
        match self.inner {
            Repr::Value { ty, .. } => Some(ty),
            _ => None,
        }
    }

    /// Kinded unions step aside for their member.
    fn through_kinded(self) -> Self {
        let mut node = self;
        loop {
            let Repr::Value { ty, data } = node.inner else {
                return node;
            };
            let (Shape::Union(union), Data::Union(chosen)) = (node.schema.get(ty).shape(), data)
            else {
                return node;
            };
            if !matches!(union.repr(), UnionRepr::Kinded(_)) {
                return node;
            }
            node = node.value(union.member(chosen.member), &chosen.value);
        }
    }

    /// Entry at raw position `raw`: `None` past the end, `Some(None)` for an
    /// absent field that iteration skips.
    fn map_entry(&self, raw: usize) -> Option<Option<(ReprNode<'a>, ReprNode<'a>)>> {
        let Repr::Value { ty, data } = self.inner else {
            return None;
        };
        match (self.schema.get(ty).shape(), data) {
            (Shape::Any, Data::Map(map)) => map
                .row(raw)
                .map(|(key, value)| Some((self.value(ty, key), self.value(ty, value)))),
            (Shape::Map(shape), Data::Map(map)) => map.row(raw).map(|(key, value)| {
                Some((self.value(shape.key, key), self.value(shape.value, value)))
            }),
            (Shape::Struct(st), Data::Struct(slots)) if *st.repr() == StructRepr::Map => {
                let field = st.fields().get(raw)?;
                let key = self.with(Repr::Text(field.key()));
                Some(
                    slots[raw]
                        .as_ref()
                        .map(|value| (key, self.value(field.ty(), value))),
                )
            }
            (Shape::Union(union), Data::Union(chosen)) => {
                let payload = self.value(union.member(chosen.member), &chosen.value);
                match union.repr() {
                    UnionRepr::Keyed(table) if raw == 0 => Some(Some((
                        self.with(Repr::Text(table.discriminant(chosen.member))),
                        payload,
                    ))),
                    UnionRepr::Envelope {
                        discriminant_key,
                        content_key,
                        table,
                    } => match raw {
                        0 => Some(Some((
                            self.with(Repr::Text(discriminant_key)),
                            self.with(Repr::Text(table.discriminant(chosen.member))),
                        ))),
                        1 => Some(Some((self.with(Repr::Text(content_key)), payload))),
                        _ => None,
                    },
                    UnionRepr::Inline {
                        discriminant_key,
                        table,
                    } => match raw {
                        0 => Some(Some((
                            self.with(Repr::Text(discriminant_key)),
                            self.with(Repr::Text(table.discriminant(chosen.member))),
                        ))),
                        _ => payload.map_entry(raw - 1),
                    },
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Element at raw position `raw`, with the same conventions as
    /// [`ReprNode::map_entry`].
    fn list_item(&self, raw: usize) -> Option<Option<ReprNode<'a>>> {
        match self.inner {
            Repr::Pair { ty, slots, index } => {
                let Shape::Struct(st) = self.schema.get(ty).shape() else {
                    return None;
                };
                let field = st.field(index);
                match raw {
                    0 => Some(Some(self.with(Repr::Text(field.key())))),
                    1 => Some(slots[index].as_ref().map(|value| self.value(field.ty(), value))),
                    _ => None,
                }
            }
            Repr::Value { ty, data } => match (self.schema.get(ty).shape(), data) {
                (Shape::Any, Data::List(items)) => {
                    items.get(raw).map(|item| Some(self.value(ty, item)))
                }
                (Shape::List(list), Data::List(items)) => {
                    items.get(raw).map(|item| Some(self.value(list.value, item)))
                }
                (Shape::Struct(st), Data::Struct(slots)) => match st.repr() {
                    StructRepr::Tuple => {
                        if raw >= tuple_len(slots) {
                            return None;
                        }
                        Some(Some(match &slots[raw] {
                            Some(value) => self.value(st.field(raw).ty(), value),
                            None => self.with(Repr::Null),
                        }))
                    }
                    StructRepr::ListPairs => {
                        let present = slots.get(raw)?.is_some();
                        Some(present.then(|| {
                            self.with(Repr::Pair {
                                ty,
                                slots,
                                index: raw,
                            })
                        }))
                    }
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        }
    }

    fn nth_item(&self, index: usize) -> Option<ReprNode<'a>> {
        let mut seen = 0;
        let mut raw = 0;
        loop {
            match self.list_item(raw)? {
                Some(item) if seen == index => return Some(item),
                Some(_) => seen += 1,
                None => {}
            }
            raw += 1;
        }
    }
}

impl<'a> Node for ReprNode<'a> {
    type MapIter = ReprMapIter<'a>;
    type ListIter = ReprListIter<'a>;

    fn kind(&self) -> Kind {
        let node = self.through_kinded();
        match node.inner {
            Repr::Absent | Repr::Null => Kind::Null,
            Repr::Text(_) => Kind::String,
            Repr::Pair { .. } => Kind::List,
            Repr::Value {
                data: Data::Null, ..
            } => Kind::Null,
            Repr::Value { ty, data } => match self.schema.get(ty).shape() {
                Shape::Any => data.model_kind(),
                Shape::Scalar(kind) => *kind,
                Shape::Enum(en) => match en.repr() {
                    EnumRepr::String(_) => Kind::String,
                    EnumRepr::Int(_) => Kind::Int,
                },
                Shape::List(_) => Kind::List,
                Shape::Map(_) => Kind::Map,
                Shape::Struct(st) => match st.repr() {
                    StructRepr::Map => Kind::Map,
                    StructRepr::Tuple | StructRepr::ListPairs => Kind::List,
                    StructRepr::StringJoin { .. } | StructRepr::StringPairs { .. } => {
                        Kind::String
                    }
                },
                Shape::Union(union) => match union.repr() {
                    UnionRepr::Keyed(_) | UnionRepr::Envelope { .. } | UnionRepr::Inline { .. } => {
                        Kind::Map
                    }
                    UnionRepr::BytePrefix(_) => Kind::Bytes,
                    UnionRepr::StringPrefix(_) => Kind::String,
                    UnionRepr::Kinded(_) => data.model_kind(),
                },
            },
        }
    }

    fn type_name(&self) -> &str {
        match self.through_kinded().inner {
            Repr::Value { ty, .. } => self.schema.name(ty),
            Repr::Absent => "Absent",
            Repr::Null => "Null",
            Repr::Text(_) => "String",
            Repr::Pair { .. } => "List",
        }
    }

    fn lookup_by_string(&self, key: &str) -> Result<Self, Error> {
        let node = self.through_kinded();
        let Repr::Value { ty, data } = node.inner else {
            return Err(wrong_kind(&node, "lookup_by_string", KindSet::MAP));
        };
        if node.kind() != Kind::Map {
            return Err(wrong_kind(&node, "lookup_by_string", KindSet::MAP));
        }
        let missing = || Error::not_exists(key);
        match (self.schema.get(ty).shape(), data) {
            (Shape::Any, Data::Map(map)) => map
                .get(key)
                .map(|value| node.value(ty, value))
                .ok_or_else(missing),
            (Shape::Map(shape), Data::Map(map)) => {
                let identity = key_identity(self.schema, shape.key, View::Repr, key)?;
                map.get(&identity)
                    .map(|value| node.value(shape.value, value))
                    .ok_or_else(missing)
            }
            (Shape::Struct(st), Data::Struct(slots)) => {
                let index = st.field_by_key(key).ok_or_else(missing)?;
                slots[index]
                    .as_ref()
                    .map(|value| node.value(st.field(index).ty(), value))
                    .ok_or_else(missing)
            }
            (Shape::Union(union), Data::Union(chosen)) => {
                let payload = node.value(union.member(chosen.member), &chosen.value);
                match union.repr() {
                    UnionRepr::Keyed(table) if table.discriminant(chosen.member) == key => {
                        Ok(payload)
                    }
                    UnionRepr::Envelope {
                        discriminant_key,
                        table,
                        ..
                    }
                    | UnionRepr::Inline {
                        discriminant_key,
                        table,
                    } if discriminant_key == key => {
                        Ok(node.with(Repr::Text(table.discriminant(chosen.member))))
                    }
                    UnionRepr::Envelope { content_key, .. } if content_key == key => Ok(payload),
                    UnionRepr::Inline { .. } => payload.lookup_by_string(key),
                    _ => Err(missing()),
                }
            }
            _ => Err(missing()),
        }
    }

    fn lookup_by_index(&self, index: i64) -> Result<Self, Error> {
        let node = self.through_kinded();
        if node.kind() != Kind::List {
            return Err(wrong_kind(&node, "lookup_by_index", KindSet::LIST));
        }
        usize::try_from(index)
            .ok()
            .and_then(|i| node.nth_item(i))
            .ok_or_else(|| index_not_exists(index))
    }

    fn map_iterator(&self) -> Result<Self::MapIter, Error> {
        let node = self.through_kinded();
        if node.kind() != Kind::Map {
            return Err(wrong_kind(&node, "map_iterator", KindSet::MAP));
        }
        Ok(ReprMapIter { node, raw: 0 })
    }

    fn list_iterator(&self) -> Result<Self::ListIter, Error> {
        let node = self.through_kinded();
        if node.kind() != Kind::List {
            return Err(wrong_kind(&node, "list_iterator", KindSet::LIST));
        }
        Ok(ReprListIter {
            node,
            raw: 0,
            index: 0,
        })
    }

    fn length(&self) -> i64 {
        let node = self.through_kinded();
        let Repr::Value { ty, data } = node.inner else {
            return match node.inner {
                Repr::Pair { .. } => 2,
                _ => -1,
            };
        };
        let len = match (self.schema.get(ty).shape(), data) {
            (_, Data::List(items)) => items.len(),
            (_, Data::Map(map)) => map.len(),
            (Shape::Struct(st), Data::Struct(slots)) => match st.repr() {
                StructRepr::Map | StructRepr::ListPairs => {
                    slots.iter().filter(|slot| slot.is_some()).count()
                }
                StructRepr::Tuple => tuple_len(slots),
                StructRepr::StringJoin { .. } | StructRepr::StringPairs { .. } => return -1,
            },
            (Shape::Union(union), Data::Union(chosen)) => match union.repr() {
                UnionRepr::Keyed(_) => 1,
                UnionRepr::Envelope { .. } => 2,
                UnionRepr::Inline { .. } => {
                    let payload = node.value(union.member(chosen.member), &chosen.value);
                    return 1 + payload.length().max(0);
                }
                _ => return -1,
            },
            _ => return -1,
        };
        len as i64
    }

    fn is_absent(&self) -> bool {
        matches!(self.inner, Repr::Absent)
    }

    fn as_bool(&self) -> Result<bool, Error> {
        let node = self.through_kinded();
        match node.inner {
            Repr::Value {
                data: Data::Bool(value),
                ..
            } => Ok(*value),
            _ => Err(wrong_kind(&node, "as_bool", KindSet::BOOL)),
        }
    }

    fn as_int(&self) -> Result<i64, Error> {
        let node = self.through_kinded();
        match node.inner {
            Repr::Value {
                data: Data::Int(value),
                ..
            } => Ok(*value),
            Repr::Value {
                ty,
                data: Data::Enum(member),
            } => match self.schema.get(ty).shape() {
                Shape::Enum(en) => match en.repr() {
                    EnumRepr::Int(table) => Ok(*table.discriminant(*member)),
                    EnumRepr::String(_) => Err(wrong_kind(&node, "as_int", KindSet::INT)),
                },
                _ => Err(wrong_kind(&node, "as_int", KindSet::INT)),
            },
            _ => Err(wrong_kind(&node, "as_int", KindSet::INT)),
        }
    }

    fn as_float(&self) -> Result<f64, Error> {
        let node = self.through_kinded();
        match node.inner {
            Repr::Value {
                data: Data::Float(value),
                ..
            } => Ok(*value),
            _ => Err(wrong_kind(&node, "as_float", KindSet::FLOAT)),
        }
    }

    fn as_string(&self) -> Result<Cow<'_, str>, Error> {
        let node = self.through_kinded();
        match node.inner {
            Repr::Text(text) => Ok(Cow::Borrowed(text)),
            Repr::Value { ty, data } if node.kind() == Kind::String => {
                render(self.schema, ty, data)
            }
            _ => Err(wrong_kind(&node, "as_string", KindSet::STRING)),
        }
    }

    fn as_bytes(&self) -> Result<Cow<'_, [u8]>, Error> {
        let node = self.through_kinded();
        match node.inner {
            Repr::Value { ty, data } if node.kind() == Kind::Bytes => {
                render_bytes(self.schema, ty, data)
            }
            _ => Err(wrong_kind(&node, "as_bytes", KindSet::BYTES)),
        }
    }

    fn as_link(&self) -> Result<Link, Error> {
        let node = self.through_kinded();
        match node.inner {
            Repr::Value {
                data: Data::Link(link),
                ..
            } => Ok(link.clone()),
            _ => Err(wrong_kind(&node, "as_link", KindSet::LINK)),
        }
    }

    fn backing(&self) -> Option<Backing<'_>> {
        match self.inner {
            Repr::Value { data: Data::Null, .. } => None,
            Repr::Value { ty, data } => Some(Backing {
                storage: data,
                layout: View::Repr.layout(self.schema, ty),
            }),
            _ => None,
        }
    }
}

impl fmt::Debug for ReprNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner {
            Repr::Value { data, .. } => f
                .debug_struct("ReprNode")
                .field("type", &self.type_name())
                .field("data", data)
                .finish(),
            Repr::Absent => f.write_str("ReprNode(absent)"),
            Repr::Null => f.write_str("ReprNode(null)"),
            Repr::Text(text) => write!(f, "ReprNode({text:?})"),
            Repr::Pair { index, .. } => write!(f, "ReprNode(pair {index})"),
        }
    }
}

/// Entries of a representation-level map.
pub struct ReprMapIter<'a> {
    node: ReprNode<'a>,
    raw: usize,
}

impl<'a> MapIterator for ReprMapIter<'a> {
    type Node = ReprNode<'a>;

    fn next_entry(&mut self) -> Result<(ReprNode<'a>, ReprNode<'a>), Error> {
        loop {
            let entry = self.node.map_entry(self.raw).ok_or_else(overread)?;
            self.raw += 1;
            if let Some(entry) = entry {
                return Ok(entry);
            }
        }
    }

    fn done(&self) -> bool {
        let mut raw = self.raw;
        loop {
            match self.node.map_entry(raw) {
                None => return true,
                Some(Some(_)) => return false,
                Some(None) => raw += 1,
            }
        }
    }
}

impl<'a> Iterator for ReprMapIter<'a> {
    type Item = (ReprNode<'a>, ReprNode<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().ok()
    }
}

/// Elements of a representation-level list.
pub struct ReprListIter<'a> {
    node: ReprNode<'a>,
    raw: usize,
    index: i64,
}

impl<'a> ListIterator for ReprListIter<'a> {
    type Node = ReprNode<'a>;

    fn next_item(&mut self) -> Result<(i64, ReprNode<'a>), Error> {
        loop {
            let item = self.node.list_item(self.raw).ok_or_else(overread)?;
            self.raw += 1;
            if let Some(item) = item {
                self.index += 1;
                return Ok((self.index - 1, item));
            }
        }
    }

    fn done(&self) -> bool {
        let mut raw = self.raw;
        loop {
            match self.node.list_item(raw) {
                None => return true,
                Some(Some(_)) => return false,
                Some(None) => raw += 1,
            }
        }
    }
}

impl<'a> Iterator for ReprListIter<'a> {
    type Item = ReprNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_item().ok().map(|(_, item)| item)
    }
}
