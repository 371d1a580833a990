//! The compiled, immutable schema.
//!
//! Compiling a [`TypeSystem`](crate::TypeSystem) resolves every name to a
//! [`TypeIx`] and precomputes the lookup tables the engine needs (field index
//! by name and by representation key, union member by discriminant or kind,
//! enum member by string or int), so nothing is re-derived from declarations
//! while values are being assembled or read.

use core::borrow::Borrow;
use core::hash::Hash;

use hashbrown::HashMap;
use strata_core::{Kind, KindSet};

/// Index of a type within its [`Schema`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIx(u32);

impl TypeIx {
    /// Placeholder for references that failed to resolve. Never escapes a
    /// successfully compiled schema.
    pub(crate) const UNRESOLVED: TypeIx = TypeIx(u32::MAX);

    pub(crate) fn new(index: usize) -> Self {
        assert!(index < u32::MAX as usize, "too many types in one schema");
        TypeIx(index as u32)
    }

    /// Position of the type in [`Schema::types`].
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw value, for layout identifiers.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn is_resolved(self) -> bool {
        self != TypeIx::UNRESOLVED
    }
}

/// A validated set of types.
#[derive(Debug)]
pub struct Schema {
    pub(crate) id: u64,
    pub(crate) types: Vec<TypeDef>,
    pub(crate) by_name: HashMap<String, TypeIx>,
    pub(crate) any: TypeIx,
}

impl Schema {
    /// Identifier unique to this compiled schema within the process.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Find a type by name.
    pub fn type_by_name(&self, name: &str) -> Option<TypeIx> {
        self.by_name.get(name).copied()
    }

    /// The type at `ix`.
    ///
    /// # Panics
    ///
    /// Panics if `ix` comes from a different schema and is out of range.
    #[inline]
    pub fn get(&self, ix: TypeIx) -> &TypeDef {
        &self.types[ix.index()]
    }

    /// Name of the type at `ix`.
    #[inline]
    pub fn name(&self, ix: TypeIx) -> &str {
        &self.get(ix).name
    }

    /// The built-in `Any` type.
    pub fn any(&self) -> TypeIx {
        self.any
    }

    /// All types, in declaration order.
    pub fn types(&self) -> impl Iterator<Item = (TypeIx, &TypeDef)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, def)| (TypeIx::new(i), def))
    }
}

/// One compiled type.
#[derive(Debug)]
pub struct TypeDef {
    pub(crate) name: String,
    pub(crate) shape: Shape,
    pub(crate) type_kinds: KindSet,
    pub(crate) repr_kinds: KindSet,
}

impl TypeDef {
    /// The type's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type's shape and representation.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Kinds a type-level node of this type can have. A single kind for
    /// everything but `Any`.
    pub fn type_kinds(&self) -> KindSet {
        self.type_kinds
    }

    /// Kinds a representation-level node of this type can have. Kinded
    /// unions span the kinds of their members.
    pub fn repr_kinds(&self) -> KindSet {
        self.repr_kinds
    }
}

/// The shape of a compiled type.
#[derive(Debug)]
pub enum Shape {
    /// Any data-model value.
    Any,
    /// A scalar.
    Scalar(Kind),
    /// An enum.
    Enum(EnumShape),
    /// A list.
    List(ListShape),
    /// A map.
    Map(MapShape),
    /// A struct.
    Struct(StructShape),
    /// A union.
    Union(UnionShape),
}

/// Compiled list type.
#[derive(Debug)]
pub struct ListShape {
    /// Element type.
    pub value: TypeIx,
    /// Whether elements may be null.
    pub nullable: bool,
}

/// Compiled map type.
#[derive(Debug)]
pub struct MapShape {
    /// Key type; always string-represented.
    pub key: TypeIx,
    /// Value type.
    pub value: TypeIx,
    /// Whether values may be null.
    pub nullable: bool,
}

/// Compiled struct type.
#[derive(Debug)]
pub struct StructShape {
    pub(crate) fields: Vec<Field>,
    pub(crate) repr: StructRepr,
    pub(crate) by_name: HashMap<String, usize>,
    pub(crate) by_key: HashMap<String, usize>,
}

impl StructShape {
    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Field at position `index`.
    #[inline]
    pub fn field(&self, index: usize) -> &Field {
        &self.fields[index]
    }

    /// Position of the field called `name`.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Position of the field whose representation key is `key`.
    pub fn field_by_key(&self, key: &str) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    /// The representation strategy.
    pub fn repr(&self) -> &StructRepr {
        &self.repr
    }
}

/// Compiled struct field.
#[derive(Debug)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) key: String,
    pub(crate) ty: TypeIx,
    pub(crate) optional: bool,
    pub(crate) nullable: bool,
}

impl Field {
    /// Type-level name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Representation-level key (the rename, if any, for map representation).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The field's type.
    pub fn ty(&self) -> TypeIx {
        self.ty
    }

    /// Whether the field may be absent.
    pub fn optional(&self) -> bool {
        self.optional
    }

    /// Whether the field may be null.
    pub fn nullable(&self) -> bool {
        self.nullable
    }
}

/// Compiled struct representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructRepr {
    /// Map keyed by [`Field::key`].
    Map,
    /// Positional list.
    Tuple,
    /// Delimiter-joined string.
    StringJoin {
        /// The delimiter.
        join: String,
    },
    /// `key<inner>value<entry>...` string.
    StringPairs {
        /// Between a key and its value.
        inner: String,
        /// Between entries.
        entry: String,
    },
    /// List of `[key, value]` lists.
    ListPairs,
}

/// Bidirectional discriminant table: one discriminant per member.
#[derive(Debug, Clone)]
pub struct Table<D> {
    by_member: Vec<D>,
    lookup: HashMap<D, usize>,
}

impl<D: Eq + Hash + Clone> Table<D> {
    pub(crate) fn new(by_member: Vec<D>) -> Self {
        let lookup = by_member
            .iter()
            .enumerate()
            .map(|(i, d)| (d.clone(), i))
            .collect();
        Table { by_member, lookup }
    }

    /// Discriminant of member `member`.
    #[inline]
    pub fn discriminant(&self, member: usize) -> &D {
        &self.by_member[member]
    }

    /// Member selected by `discriminant`.
    pub fn member<Q>(&self, discriminant: &Q) -> Option<usize>
    where
        D: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup.get(discriminant).copied()
    }

    /// All discriminants, in member order.
    pub fn discriminants(&self) -> &[D] {
        &self.by_member
    }
}

/// Kinded-union dispatch table: member index per representation kind.
#[derive(Debug, Clone, Default)]
pub struct KindedTable {
    by_kind: [Option<usize>; 9],
}

impl KindedTable {
    pub(crate) fn set(&mut self, kind: Kind, member: usize) {
        self.by_kind[kind as usize] = Some(member);
    }

    /// Member whose representation has `kind`.
    #[inline]
    pub fn member(&self, kind: Kind) -> Option<usize> {
        self.by_kind[kind as usize]
    }
}

/// Compiled union type.
#[derive(Debug)]
pub struct UnionShape {
    pub(crate) members: Vec<TypeIx>,
    pub(crate) by_name: HashMap<String, usize>,
    pub(crate) repr: UnionRepr,
}

impl UnionShape {
    /// Member types in declaration order.
    pub fn members(&self) -> &[TypeIx] {
        &self.members
    }

    /// Type of member `index`.
    #[inline]
    pub fn member(&self, index: usize) -> TypeIx {
        self.members[index]
    }

    /// Position of the member whose type is called `name`.
    pub fn member_by_name(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// The representation strategy.
    pub fn repr(&self) -> &UnionRepr {
        &self.repr
    }
}

/// Compiled union representation.
#[derive(Debug)]
pub enum UnionRepr {
    /// `{key: member}`.
    Keyed(Table<String>),
    /// Member chosen by representation kind.
    Kinded(KindedTable),
    /// `{discriminant_key: d, content_key: member}`.
    Envelope {
        /// Key holding the discriminant.
        discriminant_key: String,
        /// Key holding the member.
        content_key: String,
        /// Discriminants.
        table: Table<String>,
    },
    /// Discriminant merged into the member's own map.
    Inline {
        /// Key holding the discriminant.
        discriminant_key: String,
        /// Discriminants.
        table: Table<String>,
    },
    /// Leading discriminant byte.
    BytePrefix(Table<u8>),
    /// Leading discriminant string; prefixes never overlap.
    StringPrefix(Table<String>),
}

impl UnionRepr {
    /// For string-prefix unions, the member whose prefix starts `text`, and
    /// the prefix length.
    pub fn member_by_prefix(&self, text: &str) -> Option<(usize, usize)> {
        let UnionRepr::StringPrefix(table) = self else {
            return None;
        };
        table
            .discriminants()
            .iter()
            .enumerate()
            .find(|(_, prefix)| text.starts_with(prefix.as_str()))
            .map(|(member, prefix)| (member, prefix.len()))
    }
}

/// Compiled enum type.
#[derive(Debug)]
pub struct EnumShape {
    pub(crate) members: Vec<String>,
    pub(crate) by_name: HashMap<String, usize>,
    pub(crate) repr: EnumRepr,
}

impl EnumShape {
    /// Member names in declaration order.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Position of the member called `name`.
    pub fn member_by_name(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// The representation strategy.
    pub fn repr(&self) -> &EnumRepr {
        &self.repr
    }
}

/// Compiled enum representation.
#[derive(Debug)]
pub enum EnumRepr {
    /// Members as strings.
    String(Table<String>),
    /// Members as integers.
    Int(Table<i64>),
}
