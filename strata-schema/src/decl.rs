//! Type declarations, as written by a schema author.
//!
//! Declarations refer to other types by name. Nothing is resolved until the
//! [`TypeSystem`](crate::TypeSystem) is validated or compiled, so declarations
//! may appear in any order and may refer to themselves.

use strata_core::Kind;

/// One declared type.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeDecl {
    /// Accepts any data-model value.
    Any,
    /// A scalar of the given kind (not `List`, `Map` or `Null`).
    Scalar(Kind),
    /// A closed set of named members.
    Enum {
        /// Member names, in declaration order.
        members: Vec<String>,
        /// How members are represented.
        repr: EnumRepresentation,
    },
    /// A homogeneous list.
    List {
        /// Element type name.
        value: String,
        /// Whether elements may be null.
        nullable: bool,
    },
    /// A homogeneous map.
    Map {
        /// Key type name. Must have a string representation.
        key: String,
        /// Value type name.
        value: String,
        /// Whether values may be null.
        nullable: bool,
    },
    /// A struct with named fields.
    Struct {
        /// Fields, in declaration order.
        fields: Vec<StructField>,
        /// How the struct is represented.
        repr: StructRepresentation,
    },
    /// A union over member types.
    Union {
        /// Member type names, in declaration order.
        members: Vec<String>,
        /// How the union is represented.
        repr: UnionRepresentation,
    },
}

/// A declared struct field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructField {
    /// Field name, as seen at the type level.
    pub name: String,
    /// Name of the field's type.
    pub ty: String,
    /// Whether the field may be absent.
    pub optional: bool,
    /// Whether the field may be null.
    pub nullable: bool,
}

impl StructField {
    /// A required, non-nullable field.
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        StructField {
            name: name.into(),
            ty: ty.into(),
            optional: false,
            nullable: false,
        }
    }

    /// Mark the field optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark the field nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Representation strategy of a struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StructRepresentation {
    /// A map keyed by field name, with optional per-field renames.
    Map {
        /// `(field name, representation key)` pairs.
        renames: Vec<(String, String)>,
    },
    /// A list of field values in declaration order.
    Tuple,
    /// Field string forms joined by a delimiter.
    StringJoin {
        /// The delimiter.
        join: String,
    },
    /// `key<inner>value` pairs joined by `entry`.
    StringPairs {
        /// Delimiter between a key and its value.
        inner: String,
        /// Delimiter between entries.
        entry: String,
    },
    /// A list of `[key, value]` lists.
    ListPairs,
}

impl StructRepresentation {
    /// Map representation without renames.
    pub fn map() -> Self {
        StructRepresentation::Map {
            renames: Vec::new(),
        }
    }

    /// Map representation with renames given as `(field, key)` pairs.
    pub fn map_renamed<I, F, K>(renames: I) -> Self
    where
        I: IntoIterator<Item = (F, K)>,
        F: Into<String>,
        K: Into<String>,
    {
        StructRepresentation::Map {
            renames: renames
                .into_iter()
                .map(|(f, k)| (f.into(), k.into()))
                .collect(),
        }
    }

    /// StringJoin representation.
    pub fn string_join(join: impl Into<String>) -> Self {
        StructRepresentation::StringJoin { join: join.into() }
    }

    /// StringPairs representation.
    pub fn string_pairs(inner: impl Into<String>, entry: impl Into<String>) -> Self {
        StructRepresentation::StringPairs {
            inner: inner.into(),
            entry: entry.into(),
        }
    }
}

/// Representation strategy of a union.
///
/// Tables map discriminants to member type names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnionRepresentation {
    /// A single-entry map `{discriminant: member}`.
    Keyed(Vec<(String, String)>),
    /// No wrapper; the member is picked by its representation kind.
    Kinded,
    /// `{discriminant_key: discriminant, content_key: member}`.
    Envelope {
        /// Key holding the discriminant.
        discriminant_key: String,
        /// Key holding the member.
        content_key: String,
        /// Discriminant to member table.
        table: Vec<(String, String)>,
    },
    /// The member's own map, with the discriminant key merged in.
    Inline {
        /// Key holding the discriminant.
        discriminant_key: String,
        /// Discriminant to member table.
        table: Vec<(String, String)>,
    },
    /// Bytes with a leading discriminant byte.
    BytePrefix(Vec<(u8, String)>),
    /// A string with a leading discriminant prefix.
    StringPrefix(Vec<(String, String)>),
}

/// Representation strategy of an enum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnumRepresentation {
    /// Members as strings; `(member, string)` renames, unlisted members use
    /// their own name.
    String(Vec<(String, String)>),
    /// Members as integers; every member needs an entry.
    Int(Vec<(String, i64)>),
}

pub(crate) fn table<D, M, I>(pairs: I) -> Vec<(D, String)>
where
    I: IntoIterator<Item = (D, M)>,
    M: Into<String>,
{
    pairs.into_iter().map(|(d, m)| (d, m.into())).collect()
}

impl UnionRepresentation {
    /// Keyed representation from `(key, member)` pairs.
    pub fn keyed<K: Into<String>, M: Into<String>>(
        pairs: impl IntoIterator<Item = (K, M)>,
    ) -> Self {
        UnionRepresentation::Keyed(table(pairs.into_iter().map(|(k, m)| (k.into(), m))))
    }

    /// Envelope representation.
    pub fn envelope<K: Into<String>, M: Into<String>>(
        discriminant_key: impl Into<String>,
        content_key: impl Into<String>,
        pairs: impl IntoIterator<Item = (K, M)>,
    ) -> Self {
        UnionRepresentation::Envelope {
            discriminant_key: discriminant_key.into(),
            content_key: content_key.into(),
            table: table(pairs.into_iter().map(|(k, m)| (k.into(), m))),
        }
    }

    /// Inline representation.
    pub fn inline<K: Into<String>, M: Into<String>>(
        discriminant_key: impl Into<String>,
        pairs: impl IntoIterator<Item = (K, M)>,
    ) -> Self {
        UnionRepresentation::Inline {
            discriminant_key: discriminant_key.into(),
            table: table(pairs.into_iter().map(|(k, m)| (k.into(), m))),
        }
    }

    /// BytePrefix representation.
    pub fn byte_prefix<M: Into<String>>(pairs: impl IntoIterator<Item = (u8, M)>) -> Self {
        UnionRepresentation::BytePrefix(table(pairs))
    }

    /// StringPrefix representation.
    pub fn string_prefix<P: Into<String>, M: Into<String>>(
        pairs: impl IntoIterator<Item = (P, M)>,
    ) -> Self {
        UnionRepresentation::StringPrefix(table(pairs.into_iter().map(|(p, m)| (p.into(), m))))
    }
}
