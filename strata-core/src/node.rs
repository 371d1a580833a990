//! The read-only node contract.

use alloc::borrow::Cow;
use core::any::Any;

use crate::{Error, ErrorKind, Kind, KindSet, Link};

/// Read-only, polymorphic access to one assembled value.
///
/// Every query is partial: a method that is not meaningful for the node's
/// [`Kind`] fails with [`ErrorKind::WrongKind`] instead of panicking. The
/// default method bodies do exactly that; implementors override the ones that
/// apply to them.
///
/// Lookups and iterators hand out nodes of the same implementing type, which
/// keeps a representation-level view representation-level all the way down.
pub trait Node: Sized {
    /// Iterator returned by [`Node::map_iterator`].
    type MapIter: MapIterator<Node = Self>;
    /// Iterator returned by [`Node::list_iterator`].
    type ListIter: ListIterator<Node = Self>;

    /// The kind of this node.
    fn kind(&self) -> Kind;

    /// Name of the node's type, for diagnostics.
    fn type_name(&self) -> &str;

    /// Look up a map entry by its string key.
    fn lookup_by_string(&self, key: &str) -> Result<Self, Error> {
        let _ = key;
        Err(wrong_kind(self, "lookup_by_string", KindSet::MAP))
    }

    /// Look up a list element by position.
    fn lookup_by_index(&self, index: i64) -> Result<Self, Error> {
        let _ = index;
        Err(wrong_kind(self, "lookup_by_index", KindSet::LIST))
    }

    /// Look up by a key node: string keys for maps, int keys for lists.
    fn lookup_by_node(&self, key: &Self) -> Result<Self, Error> {
        match self.kind() {
            Kind::Map => {
                let key = key.as_string()?;
                self.lookup_by_string(&key)
            }
            Kind::List => self.lookup_by_index(key.as_int()?),
            _ => Err(wrong_kind(
                self,
                "lookup_by_node",
                KindSet::MAP | KindSet::LIST,
            )),
        }
    }

    /// A fresh single-pass iterator over the map's entries.
    fn map_iterator(&self) -> Result<Self::MapIter, Error> {
        Err(wrong_kind(self, "map_iterator", KindSet::MAP))
    }

    /// A fresh single-pass iterator over the list's elements.
    fn list_iterator(&self) -> Result<Self::ListIter, Error> {
        Err(wrong_kind(self, "list_iterator", KindSet::LIST))
    }

    /// Number of entries or elements, or `-1` for scalars.
    fn length(&self) -> i64 {
        -1
    }

    /// Returns true for the absent marker of an unset optional field.
    fn is_absent(&self) -> bool {
        false
    }

    /// Returns true for null.
    fn is_null(&self) -> bool {
        self.kind() == Kind::Null
    }

    /// The boolean value.
    fn as_bool(&self) -> Result<bool, Error> {
        Err(wrong_kind(self, "as_bool", KindSet::BOOL))
    }

    /// The integer value.
    fn as_int(&self) -> Result<i64, Error> {
        Err(wrong_kind(self, "as_int", KindSet::INT))
    }

    /// The float value.
    fn as_float(&self) -> Result<f64, Error> {
        Err(wrong_kind(self, "as_float", KindSet::FLOAT))
    }

    /// The string value. Representations that synthesize text (joined
    /// fields, prefixed discriminants) return an owned string.
    fn as_string(&self) -> Result<Cow<'_, str>, Error> {
        Err(wrong_kind(self, "as_string", KindSet::STRING))
    }

    /// The bytes value.
    fn as_bytes(&self) -> Result<Cow<'_, [u8]>, Error> {
        Err(wrong_kind(self, "as_bytes", KindSet::BYTES))
    }

    /// The link value.
    fn as_link(&self) -> Result<Link, Error> {
        Err(wrong_kind(self, "as_link", KindSet::LINK))
    }

    /// Exposes the node's backing storage, if it has one an assembler can
    /// copy wholesale. Nodes that answer `None` are always copied by
    /// iteration.
    fn backing(&self) -> Option<Backing<'_>> {
        None
    }
}

/// Builds the [`ErrorKind::WrongKind`] error for `method` called on `node`.
pub fn wrong_kind<N: Node>(node: &N, method: &'static str, appropriate: KindSet) -> Error {
    Error::wrong_kind(node.type_name(), method, appropriate, node.kind())
}

/// Single-pass iteration over map entries.
pub trait MapIterator {
    /// Node type of keys and values.
    type Node;

    /// The next `(key, value)` pair. Fails with
    /// [`ErrorKind::IteratorOverread`] once [`MapIterator::done`] is true.
    fn next_entry(&mut self) -> Result<(Self::Node, Self::Node), Error>;

    /// Returns true when no entries remain.
    fn done(&self) -> bool;
}

/// Single-pass iteration over list elements.
pub trait ListIterator {
    /// Node type of elements.
    type Node;

    /// The next `(index, element)` pair. Fails with
    /// [`ErrorKind::IteratorOverread`] once [`ListIterator::done`] is true.
    fn next_item(&mut self) -> Result<(i64, Self::Node), Error>;

    /// Returns true when no elements remain.
    fn done(&self) -> bool;
}

/// Identifies a storage layout: one type, in one view, of one compiled schema.
///
/// Two nodes whose layouts are equal are backed by storage an assembler may
/// copy directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayoutId {
    schema: u64,
    ty: u32,
    view: u8,
}

impl LayoutId {
    /// Create a layout id.
    pub const fn new(schema: u64, ty: u32, view: u8) -> Self {
        LayoutId { schema, ty, view }
    }
}

/// A node's backing storage, type-erased.
#[derive(Clone, Copy)]
pub struct Backing<'a> {
    /// The storage itself; the producer of the layout knows its concrete type.
    pub storage: &'a dyn Any,
    /// The layout of `storage`.
    pub layout: LayoutId,
}

/// Structural equality across any two node implementations.
///
/// Compares kinds, scalar values, list elements in order and map entries in
/// iteration order. Absent only equals absent.
pub fn deep_equal<A: Node, B: Node>(a: &A, b: &B) -> bool {
    if a.is_absent() || b.is_absent() {
        return a.is_absent() && b.is_absent();
    }
    if a.kind() != b.kind() {
        return false;
    }
    match a.kind() {
        Kind::Null => true,
        Kind::Bool => eq_ok(a.as_bool(), b.as_bool()),
        Kind::Int => eq_ok(a.as_int(), b.as_int()),
        Kind::Float => match (a.as_float(), b.as_float()) {
            (Ok(x), Ok(y)) => x.to_bits() == y.to_bits() || x == y,
            _ => false,
        },
        Kind::String => eq_ok(a.as_string(), b.as_string()),
        Kind::Bytes => eq_ok(a.as_bytes(), b.as_bytes()),
        Kind::Link => eq_ok(a.as_link(), b.as_link()),
        Kind::List => {
            if a.length() != b.length() {
                return false;
            }
            let (Ok(mut ia), Ok(mut ib)) = (a.list_iterator(), b.list_iterator()) else {
                return false;
            };
            while !ia.done() {
                match (ia.next_item(), ib.next_item()) {
                    (Ok((_, x)), Ok((_, y))) if deep_equal(&x, &y) => {}
                    _ => return false,
                }
            }
            ib.done()
        }
        Kind::Map => {
            if a.length() != b.length() {
                return false;
            }
            let (Ok(mut ia), Ok(mut ib)) = (a.map_iterator(), b.map_iterator()) else {
                return false;
            };
            while !ia.done() {
                match (ia.next_entry(), ib.next_entry()) {
                    (Ok((ka, va)), Ok((kb, vb))) => {
                        if !deep_equal(&ka, &kb) || !deep_equal(&va, &vb) {
                            return false;
                        }
                    }
                    _ => return false,
                }
            }
            ib.done()
        }
    }
}

fn eq_ok<T: PartialEq>(a: Result<T, Error>, b: Result<T, Error>) -> bool {
    matches!((a, b), (Ok(x), Ok(y)) if x == y)
}

/// Shorthand for the error every exhausted iterator returns.
pub fn overread() -> Error {
    Error::new(ErrorKind::IteratorOverread)
}
