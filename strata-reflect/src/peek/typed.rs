use alloc::borrow::Cow;
use core::fmt;

use strata_core::{
    Backing, Error, Kind, KindSet, Link, ListIterator, MapIterator, Node, overread, wrong_kind,
};
use strata_schema::{Schema, Shape, TypeIx};

use super::{ReprNode, index_not_exists};
use crate::data::Data;
use crate::repr::{key_identity, render};
use crate::view::View;

/// Type-level view of a value.
///
/// Structs are maps keyed by field name and list every field, with unset
/// optional fields reported as absent. Unions are single-entry maps keyed by
/// the member's type name. Enums are strings naming their member.
#[derive(Clone, Copy)]
pub struct TypedNode<'a> {
    schema: &'a Schema,
    inner: Typed<'a>,
}

#[derive(Clone, Copy)]
enum Typed<'a> {
    Value { ty: TypeIx, data: &'a Data },
    Absent,
    /// Field or member name, as a map key.
    Name(&'a str),
}

impl<'a> TypedNode<'a> {
    pub(crate) fn new(schema: &'a Schema, ty: TypeIx, data: &'a Data) -> Self {
        TypedNode {
            schema,
            inner: Typed::Value { ty, data },
        }
    }

    fn value(&self, ty: TypeIx, data: &'a Data) -> Self {
        TypedNode::new(self.schema, ty, data)
    }

    fn absent(&self) -> Self {
        TypedNode {
            schema: self.schema,
            inner: Typed::Absent,
        }
    }

    fn name(&self, name: &'a str) -> Self {
        TypedNode {
            schema: self.schema,
            inner: Typed::Name(name),
        }
    }

    /// The node's schema type; `None` for absent fields and for the field or
    /// member names a struct or union yields as keys.
    pub fn type_ix(&self) -> Option<TypeIx> {
        match self.inner {
            Typed::Value { ty, .. } => Some(ty),
            Typed::Absent | Typed::Name(_) => None,
        }
    }

    /// The representation-level view of the same value.
    pub fn repr(&self) -> ReprNode<'a> {
        match self.inner {
            Typed::Value { ty, data } => ReprNode::new(self.schema, ty, data),
            Typed::Absent => ReprNode::absent(self.schema),
            Typed::Name(name) => ReprNode::text(self.schema, name),
        }
    }

    fn entry(&self, raw: usize) -> Option<(TypedNode<'a>, TypedNode<'a>)> {
        let Typed::Value { ty, data } = self.inner else {
            return None;
        };
        match (self.schema.get(ty).shape(), data) {
            (Shape::Any, Data::Map(map)) => map
                .row(raw)
                .map(|(key, value)| (self.value(ty, key), self.value(ty, value))),
            (Shape::Map(shape), Data::Map(map)) => map
                .row(raw)
                .map(|(key, value)| (self.value(shape.key, key), self.value(shape.value, value))),
            (Shape::Struct(st), Data::Struct(slots)) => {
                let field = st.fields().get(raw)?;
                let value = match &slots[raw] {
                    Some(value) => self.value(field.ty(), value),
                    None => self.absent(),
                };
                Some((self.name(field.name()), value))
            }
            (Shape::Union(union), Data::Union(chosen)) if raw == 0 => {
                let member = union.member(chosen.member);
                Some((
                    self.name(self.schema.name(member)),
                    self.value(member, &chosen.value),
                ))
            }
            _ => None,
        }
    }

    fn item(&self, index: usize) -> Option<TypedNode<'a>> {
        let Typed::Value { ty, data } = self.inner else {
            return None;
        };
        let Data::List(items) = data else {
            return None;
        };
        let element = match self.schema.get(ty).shape() {
            Shape::List(list) => list.value,
            _ => ty,
        };
        items.get(index).map(|item| self.value(element, item))
    }
}

impl<'a> Node for TypedNode<'a> {
    type MapIter = TypedMapIter<'a>;
    type ListIter = TypedListIter<'a>;

    fn kind(&self) -> Kind {
        match self.inner {
            Typed::Absent => Kind::Null,
            Typed::Name(_) => Kind::String,
            Typed::Value {
                data: Data::Null, ..
            } => Kind::Null,
            Typed::Value { ty, data } => match self.schema.get(ty).shape() {
                Shape::Any => data.model_kind(),
                Shape::Scalar(kind) => *kind,
                Shape::Enum(_) => Kind::String,
                Shape::List(_) => Kind::List,
                Shape::Map(_) | Shape::Struct(_) | Shape::Union(_) => Kind::Map,
            },
        }
    }

    fn type_name(&self) -> &str {
        match self.inner {
            Typed::Value { ty, .. } => self.schema.name(ty),
            Typed::Absent => "Absent",
            Typed::Name(_) => "String",
        }
    }

    fn lookup_by_string(&self, key: &str) -> Result<Self, Error> {
        let Typed::Value { ty, data } = self.inner else {
            return Err(wrong_kind(self, "lookup_by_string", KindSet::MAP));
        };
        let missing = || Error::not_exists(key);
        match (self.schema.get(ty).shape(), data) {
            (Shape::Any, Data::Map(map)) => map
                .get(key)
                .map(|value| self.value(ty, value))
                .ok_or_else(missing),
            (Shape::Map(shape), Data::Map(map)) => {
                let identity = key_identity(self.schema, shape.key, View::Type, key)?;
                map.get(&identity)
                    .map(|value| self.value(shape.value, value))
                    .ok_or_else(missing)
            }
            (Shape::Struct(st), Data::Struct(slots)) => {
                let index = st.field_index(key).ok_or_else(missing)?;
                Ok(match &slots[index] {
                    Some(value) => self.value(st.field(index).ty(), value),
                    None => self.absent(),
                })
            }
            (Shape::Union(union), Data::Union(chosen)) => {
                if union.member_by_name(key) == Some(chosen.member) {
                    Ok(self.value(union.member(chosen.member), &chosen.value))
                } else {
                    Err(missing())
                }
            }
            _ => Err(wrong_kind(self, "lookup_by_string", KindSet::MAP)),
        }
    }

    fn lookup_by_index(&self, index: i64) -> Result<Self, Error> {
        if self.kind() != Kind::List {
            return Err(wrong_kind(self, "lookup_by_index", KindSet::LIST));
        }
        usize::try_from(index)
            .ok()
            .and_then(|i| self.item(i))
            .ok_or_else(|| index_not_exists(index))
    }

    /// Maps keyed by a structured type are also looked up by a node of that
    /// key type.
    fn lookup_by_node(&self, key: &Self) -> Result<Self, Error> {
        if let (
            Typed::Value {
                ty,
                data: Data::Map(map),
            },
            Typed::Value {
                ty: key_ty,
                data: key_data,
            },
        ) = (self.inner, key.inner)
            && let Shape::Map(shape) = self.schema.get(ty).shape()
            && shape.key == key_ty
            && core::ptr::eq(self.schema, key.schema)
        {
            let identity = render(self.schema, key_ty, key_data)?;
            return map
                .get(&identity)
                .map(|value| self.value(shape.value, value))
                .ok_or_else(|| Error::not_exists(&*identity));
        }
        match self.kind() {
            Kind::Map => self.lookup_by_string(&key.as_string()?),
            Kind::List => self.lookup_by_index(key.as_int()?),
            _ => Err(wrong_kind(
                self,
                "lookup_by_node",
                KindSet::MAP | KindSet::LIST,
            )),
        }
    }

    fn map_iterator(&self) -> Result<Self::MapIter, Error> {
        if self.kind() != Kind::Map {
            return Err(wrong_kind(self, "map_iterator", KindSet::MAP));
        }
        Ok(TypedMapIter {
            node: *self,
            raw: 0,
        })
    }

    fn list_iterator(&self) -> Result<Self::ListIter, Error> {
        if self.kind() != Kind::List {
            return Err(wrong_kind(self, "list_iterator", KindSet::LIST));
        }
        Ok(TypedListIter {
            node: *self,
            index: 0,
        })
    }

    fn length(&self) -> i64 {
        let Typed::Value { ty, data } = self.inner else {
            return -1;
        };
        let len = match (self.schema.get(ty).shape(), data) {
            (_, Data::List(items)) => items.len(),
            (_, Data::Map(map)) => map.len(),
            (Shape::Struct(st), Data::Struct(_)) => st.fields().len(),
            (_, Data::Union(_)) => 1,
            _ => return -1,
        };
        len as i64
    }

    fn is_absent(&self) -> bool {
        matches!(self.inner, Typed::Absent)
    }

    fn as_bool(&self) -> Result<bool, Error> {
        match self.inner {
            Typed::Value {
                data: Data::Bool(value),
                ..
            } => Ok(*value),
            _ => Err(wrong_kind(self, "as_bool", KindSet::BOOL)),
        }
    }

    fn as_int(&self) -> Result<i64, Error> {
        match self.inner {
            Typed::Value {
                data: Data::Int(value),
                ..
            } => Ok(*value),
            _ => Err(wrong_kind(self, "as_int", KindSet::INT)),
        }
    }

    fn as_float(&self) -> Result<f64, Error> {
        match self.inner {
            Typed::Value {
                data: Data::Float(value),
                ..
            } => Ok(*value),
            _ => Err(wrong_kind(self, "as_float", KindSet::FLOAT)),
        }
    }

    fn as_string(&self) -> Result<Cow<'_, str>, Error> {
        match self.inner {
            Typed::Name(name) => Ok(Cow::Borrowed(name)),
            Typed::Value {
                data: Data::String(text),
                ..
            } => Ok(Cow::Borrowed(text)),
            Typed::Value {
                ty,
                data: Data::Enum(member),
            } => match self.schema.get(ty).shape() {
                Shape::Enum(en) => Ok(Cow::Borrowed(&en.members()[*member])),
                _ => Err(wrong_kind(self, "as_string", KindSet::STRING)),
            },
            _ => Err(wrong_kind(self, "as_string", KindSet::STRING)),
        }
    }

    fn as_bytes(&self) -> Result<Cow<'_, [u8]>, Error> {
        match self.inner {
            Typed::Value {
                data: Data::Bytes(bytes),
                ..
            } => Ok(Cow::Borrowed(bytes)),
            _ => Err(wrong_kind(self, "as_bytes", KindSet::BYTES)),
        }
    }

    fn as_link(&self) -> Result<Link, Error> {
        match self.inner {
            Typed::Value {
                data: Data::Link(link),
                ..
            } => Ok(link.clone()),
            _ => Err(wrong_kind(self, "as_link", KindSet::LINK)),
        }
    }

    fn backing(&self) -> Option<Backing<'_>> {
        match self.inner {
            Typed::Value { data: Data::Null, .. } => None,
            Typed::Value { ty, data } => Some(Backing {
                storage: data,
                layout: View::Type.layout(self.schema, ty),
            }),
            Typed::Absent | Typed::Name(_) => None,
        }
    }
}

impl fmt::Debug for TypedNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner {
            Typed::Value { data, .. } => f
                .debug_struct("TypedNode")
                .field("type", &self.type_name())
                .field("data", data)
                .finish(),
            Typed::Absent => f.write_str("TypedNode(absent)"),
            Typed::Name(name) => write!(f, "TypedNode({name:?})"),
        }
    }
}

/// Entries of a type-level map, struct or union.
pub struct TypedMapIter<'a> {
    node: TypedNode<'a>,
    raw: usize,
}

impl<'a> MapIterator for TypedMapIter<'a> {
    type Node = TypedNode<'a>;

    fn next_entry(&mut self) -> Result<(TypedNode<'a>, TypedNode<'a>), Error> {
        let entry = self.node.entry(self.raw).ok_or_else(overread)?;
        self.raw += 1;
        Ok(entry)
    }

    fn done(&self) -> bool {
        self.node.entry(self.raw).is_none()
    }
}

impl<'a> Iterator for TypedMapIter<'a> {
    type Item = (TypedNode<'a>, TypedNode<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().ok()
    }
}

/// Elements of a type-level list.
pub struct TypedListIter<'a> {
    node: TypedNode<'a>,
    index: usize,
}

impl<'a> ListIterator for TypedListIter<'a> {
    type Node = TypedNode<'a>;

    fn next_item(&mut self) -> Result<(i64, TypedNode<'a>), Error> {
        let item = self.node.item(self.index).ok_or_else(overread)?;
        self.index += 1;
        Ok((self.index as i64 - 1, item))
    }

    fn done(&self) -> bool {
        self.node.item(self.index).is_none()
    }
}

impl<'a> Iterator for TypedListIter<'a> {
    type Item = TypedNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_item().ok().map(|(_, item)| item)
    }
}
