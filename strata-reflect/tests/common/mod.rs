//! JSON stand-ins for a decoder and an encoder, plus a node wrapper that
//! hides its backing storage.

#![allow(dead_code)]

use std::borrow::Cow;

use serde_json::{Map, Value as Json, json};
use strata_core::{Error, Kind, Link, ListIterator, MapIterator, Node};
use strata_reflect::{Builder, NodeAssembler, Value, View};
use strata_schema::Schema;

/// Drive an assembler with the content of a JSON document.
pub fn assemble(na: &mut NodeAssembler<'_>, json: &Json) -> Result<(), Error> {
    match json {
        Json::Null => na.assign_null(),
        Json::Bool(value) => na.assign_bool(*value),
        Json::Number(number) => match number.as_i64() {
            Some(int) => na.assign_int(int),
            None => na.assign_float(number.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(text) => na.assign_string(text),
        Json::Array(items) => {
            let mut list = na.begin_list(items.len() as i64)?;
            for item in items {
                assemble(&mut list.assemble_value()?, item)?;
            }
            list.finish()
        }
        Json::Object(entries) => {
            let mut map = na.begin_map(entries.len() as i64)?;
            for (key, value) in entries {
                assemble(&mut map.assemble_entry(key)?, value)?;
            }
            map.finish()
        }
    }
}

/// Build a value of type `name` from JSON, through `view`.
pub fn build<'s>(
    schema: &'s Schema,
    name: &str,
    view: View,
    json: Json,
) -> Result<Value<'s>, Error> {
    let ty = schema
        .type_by_name(name)
        .unwrap_or_else(|| panic!("no type {name}"));
    let mut builder = Builder::with_view(schema, ty, view);
    assemble(&mut builder.assembler(), &json)?;
    Ok(builder.build())
}

/// Build from the type-level shape.
pub fn typed<'s>(schema: &'s Schema, name: &str, json: Json) -> Value<'s> {
    build(schema, name, View::Type, json).unwrap_or_else(|err| panic!("{name}: {err}"))
}

/// Build from the representation.
pub fn repr<'s>(schema: &'s Schema, name: &str, json: Json) -> Value<'s> {
    build(schema, name, View::Repr, json).unwrap_or_else(|err| panic!("{name}: {err}"))
}

/// Encode a node as JSON. Absent entries are left out; bytes become an
/// array of numbers and links `{"/": link}`.
pub fn encode<N: Node>(node: &N) -> Json {
    match node.kind() {
        Kind::Null => Json::Null,
        Kind::Bool => json!(node.as_bool().unwrap()),
        Kind::Int => json!(node.as_int().unwrap()),
        Kind::Float => json!(node.as_float().unwrap()),
        Kind::String => Json::String(node.as_string().unwrap().into_owned()),
        Kind::Bytes => json!(node.as_bytes().unwrap().to_vec()),
        Kind::Link => json!({ "/": node.as_link().unwrap().as_str() }),
        Kind::List => {
            let mut items = Vec::new();
            let mut iter = node.list_iterator().unwrap();
            while !iter.done() {
                let (_, item) = iter.next_item().unwrap();
                items.push(encode(&item));
            }
            Json::Array(items)
        }
        Kind::Map => {
            let mut entries = Map::new();
            let mut iter = node.map_iterator().unwrap();
            while !iter.done() {
                let (key, value) = iter.next_entry().unwrap();
                if value.is_absent() {
                    continue;
                }
                entries.insert(key.as_string().unwrap().into_owned(), encode(&value));
            }
            Json::Object(entries)
        }
    }
}

/// Forwards everything but [`Node::backing`], so assemblers have to copy it
/// entry by entry.
#[derive(Clone, Copy, Debug)]
pub struct Opaque<N>(pub N);

impl<N: Node> Node for Opaque<N> {
    type MapIter = Opaque<N::MapIter>;
    type ListIter = Opaque<N::ListIter>;

    fn kind(&self) -> Kind {
        self.0.kind()
    }

    fn type_name(&self) -> &str {
        self.0.type_name()
    }

    fn lookup_by_string(&self, key: &str) -> Result<Self, Error> {
        self.0.lookup_by_string(key).map(Opaque)
    }

    fn lookup_by_index(&self, index: i64) -> Result<Self, Error> {
        self.0.lookup_by_index(index).map(Opaque)
    }

    fn map_iterator(&self) -> Result<Self::MapIter, Error> {
        self.0.map_iterator().map(Opaque)
    }

    fn list_iterator(&self) -> Result<Self::ListIter, Error> {
        self.0.list_iterator().map(Opaque)
    }

    fn length(&self) -> i64 {
        self.0.length()
    }

    fn is_absent(&self) -> bool {
        self.0.is_absent()
    }

    fn as_bool(&self) -> Result<bool, Error> {
        self.0.as_bool()
    }

    fn as_int(&self) -> Result<i64, Error> {
        self.0.as_int()
    }

    fn as_float(&self) -> Result<f64, Error> {
        self.0.as_float()
    }

    fn as_string(&self) -> Result<Cow<'_, str>, Error> {
        self.0.as_string()
    }

    fn as_bytes(&self) -> Result<Cow<'_, [u8]>, Error> {
        self.0.as_bytes()
    }

    fn as_link(&self) -> Result<Link, Error> {
        self.0.as_link()
    }
}

impl<I: MapIterator> MapIterator for Opaque<I> {
    type Node = Opaque<I::Node>;

    fn next_entry(&mut self) -> Result<(Self::Node, Self::Node), Error> {
        let (key, value) = self.0.next_entry()?;
        Ok((Opaque(key), Opaque(value)))
    }

    fn done(&self) -> bool {
        self.0.done()
    }
}

impl<I: ListIterator> ListIterator for Opaque<I> {
    type Node = Opaque<I::Node>;

    fn next_item(&mut self) -> Result<(i64, Self::Node), Error> {
        let (index, item) = self.0.next_item()?;
        Ok((index, Opaque(item)))
    }

    fn done(&self) -> bool {
        self.0.done()
    }
}
