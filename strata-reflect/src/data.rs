//! Storage shared by both views of an assembled value.
//!
//! One `Data` tree backs a value; the type-level and representation-level
//! nodes interpret the same tree differently and never copy it.

use hashbrown::HashMap;
use strata_core::{Kind, Link};

/// Storage for one value.
///
/// Struct slots use `None` for an absent field and `Some(Data::Null)` for an
/// explicit null. `Null` is also the placeholder a slot holds while its value
/// is being assembled.
#[derive(Clone, Debug, PartialEq, Default)]
pub(crate) enum Data {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Link(Link),
    List(Vec<Data>),
    Map(MapData),
    Struct(Vec<Option<Data>>),
    Union(Box<UnionData>),
    Enum(usize),
}

impl Data {
    /// Data-model kind, for storage holding `Any` values.
    pub(crate) fn model_kind(&self) -> Kind {
        match self {
            Data::Null => Kind::Null,
            Data::Bool(_) => Kind::Bool,
            Data::Int(_) => Kind::Int,
            Data::Float(_) => Kind::Float,
            Data::String(_) => Kind::String,
            Data::Bytes(_) => Kind::Bytes,
            Data::Link(_) => Kind::Link,
            Data::List(_) => Kind::List,
            Data::Map(_) | Data::Struct(_) | Data::Union(_) => Kind::Map,
            Data::Enum(_) => Kind::String,
        }
    }

    pub(crate) fn union(member: usize) -> Data {
        Data::Union(Box::new(UnionData {
            member,
            value: Data::Null,
        }))
    }

    pub(crate) fn as_map_mut(&mut self) -> &mut MapData {
        match self {
            Data::Map(map) => map,
            other => panic!("storage is not a map: {other:?}"),
        }
    }

    pub(crate) fn as_list_mut(&mut self) -> &mut Vec<Data> {
        match self {
            Data::List(list) => list,
            other => panic!("storage is not a list: {other:?}"),
        }
    }

    pub(crate) fn as_slots_mut(&mut self) -> &mut Vec<Option<Data>> {
        match self {
            Data::Struct(slots) => slots,
            other => panic!("storage is not a struct: {other:?}"),
        }
    }

    /// The storage a child assembler writes into.
    pub(crate) fn child_mut(&mut self, place: Place) -> &mut Data {
        match (place, self) {
            (Place::MapValue, Data::Map(map)) => map.last_value_mut(),
            (Place::ListItem, Data::List(list)) => list
                .last_mut()
                .expect("list element requested before it was pushed"),
            (Place::Field(index), Data::Struct(slots)) => slots[index].get_or_insert(Data::Null),
            (Place::Member, Data::Union(chosen)) => &mut chosen.value,
            (place, other) => panic!("no {place:?} in storage {other:?}"),
        }
    }
}

/// Where inside its parent's storage a child value lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Place {
    /// Value of the most recently pushed map row.
    MapValue,
    /// Most recently pushed list element.
    ListItem,
    Field(usize),
    /// Payload of the chosen union member.
    Member,
}

/// The active member of a union and its value.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct UnionData {
    pub(crate) member: usize,
    pub(crate) value: Data,
}

/// Ordered map rows plus an index from each key's representation string to
/// its row.
#[derive(Clone, Debug, Default)]
pub(crate) struct MapData {
    keys: Vec<Data>,
    values: Vec<Data>,
    index: HashMap<String, usize>,
}

impl PartialEq for MapData {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys && self.values == other.values
    }
}

impl MapData {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        MapData {
            keys: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = (&Data, &Data)> {
        self.keys.iter().zip(&self.values)
    }

    pub(crate) fn row(&self, row: usize) -> Option<(&Data, &Data)> {
        Some((self.keys.get(row)?, self.values.get(row)?))
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Data> {
        self.index.get(key).map(|&row| &self.values[row])
    }

    /// Appends a row for `key`, whose representation string is `repr`.
    ///
    /// The row is appended before the duplicate check and popped again if
    /// `repr` is already present, leaving the map as it was.
    pub(crate) fn try_push(&mut self, key: Data, repr: &str) -> Result<(), Data> {
        self.keys.push(key);
        self.values.push(Data::Null);
        if self.index.contains_key(repr) {
            self.values.pop();
            return Err(self.keys.pop().unwrap_or_default());
        }
        self.index.insert(repr.to_owned(), self.keys.len() - 1);
        Ok(())
    }

    pub(crate) fn last_value_mut(&mut self) -> &mut Data {
        self.values
            .last_mut()
            .expect("value requested before any key was pushed")
    }
}
