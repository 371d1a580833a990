use core::fmt;

/// The closed set of value shapes in the data model.
///
/// Every [`Node`](crate::Node) reports exactly one of these. Types declared in a
/// schema map onto a kind at the type level and (possibly a different one) at
/// the representation level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    /// The null value.
    Null,
    /// `true` or `false`.
    Bool,
    /// A signed 64-bit integer.
    Int,
    /// A 64-bit float.
    Float,
    /// UTF-8 text.
    String,
    /// Arbitrary bytes.
    Bytes,
    /// A content link.
    Link,
    /// An ordered sequence of values.
    List,
    /// An ordered collection of string-keyed entries.
    Map,
}

impl Kind {
    /// All kinds, in declaration order.
    pub const ALL: [Kind; 9] = [
        Kind::Null,
        Kind::Bool,
        Kind::Int,
        Kind::Float,
        Kind::String,
        Kind::Bytes,
        Kind::Link,
        Kind::List,
        Kind::Map,
    ];

    /// Lowercase name, as used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Link => "link",
            Kind::List => "list",
            Kind::Map => "map",
        }
    }

    /// Returns true for the two recursive kinds.
    pub const fn is_recursive(self) -> bool {
        matches!(self, Kind::List | Kind::Map)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags::bitflags! {
    /// A set of [`Kind`]s.
    ///
    /// Used to describe which kinds a method is meaningful for, and which
    /// representation kinds a type may take (a kinded union spans several).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct KindSet: u16 {
        /// [`Kind::Null`]
        const NULL = 1 << 0;
        /// [`Kind::Bool`]
        const BOOL = 1 << 1;
        /// [`Kind::Int`]
        const INT = 1 << 2;
        /// [`Kind::Float`]
        const FLOAT = 1 << 3;
        /// [`Kind::String`]
        const STRING = 1 << 4;
        /// [`Kind::Bytes`]
        const BYTES = 1 << 5;
        /// [`Kind::Link`]
        const LINK = 1 << 6;
        /// [`Kind::List`]
        const LIST = 1 << 7;
        /// [`Kind::Map`]
        const MAP = 1 << 8;

        /// Kinds that can be looked up by string key.
        const LOOKUP_STRING = Self::MAP.bits();
        /// Kinds that can be looked up by index.
        const LOOKUP_INDEX = Self::LIST.bits();
        /// Kinds that have a length.
        const HAS_LENGTH = Self::MAP.bits() | Self::LIST.bits();
    }
}

impl KindSet {
    /// Returns true if `kind` is part of this set.
    #[inline]
    pub fn has(self, kind: Kind) -> bool {
        self.contains(KindSet::from(kind))
    }

    /// Iterates over the kinds in this set, in declaration order.
    pub fn kinds(self) -> impl Iterator<Item = Kind> {
        Kind::ALL.into_iter().filter(move |k| self.has(*k))
    }
}

impl From<Kind> for KindSet {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Null => KindSet::NULL,
            Kind::Bool => KindSet::BOOL,
            Kind::Int => KindSet::INT,
            Kind::Float => KindSet::FLOAT,
            Kind::String => KindSet::STRING,
            Kind::Bytes => KindSet::BYTES,
            Kind::Link => KindSet::LINK,
            Kind::List => KindSet::LIST,
            Kind::Map => KindSet::MAP,
        }
    }
}

impl fmt::Display for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for kind in self.kinds() {
            if !first {
                f.write_str("|")?;
            }
            first = false;
            write!(f, "{kind}")?;
        }
        if first {
            f.write_str("(none)")?;
        }
        Ok(())
    }
}
