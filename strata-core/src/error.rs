//! Data-shape errors.
//!
//! These are always returned as values: they describe untrusted input, not
//! bugs. Protocol misuse (calling an assembler out of order) panics instead.

use core::fmt;

use crate::{Kind, KindSet, Path, PathSegment};

/// An error raised while assembling or reading a value.
pub struct Error {
    /// Where in the value the error happened.
    pub path: Path,
    /// What went wrong.
    pub kind: ErrorKind,
}

impl Error {
    /// Create an error at the root path.
    pub fn new(kind: ErrorKind) -> Self {
        Error {
            path: Path::root(),
            kind,
        }
    }

    /// Replace the path this error is reported at.
    pub fn at(mut self, path: Path) -> Self {
        self.path = path;
        self
    }

    /// Shorthand for a [`ErrorKind::WrongKind`] error.
    pub fn wrong_kind(
        type_name: impl Into<String>,
        method: &'static str,
        appropriate: KindSet,
        actual: Kind,
    ) -> Self {
        Error::new(ErrorKind::WrongKind {
            type_name: type_name.into(),
            method,
            appropriate,
            actual,
        })
    }

    /// Shorthand for a [`ErrorKind::NotExists`] error.
    pub fn not_exists(segment: impl Into<PathSegment>) -> Self {
        Error::new(ErrorKind::NotExists {
            segment: segment.into(),
        })
    }

    /// Shorthand for a [`ErrorKind::Unmatchable`] error.
    pub fn unmatchable(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::new(ErrorKind::Unmatchable {
            type_name: type_name.into(),
            reason: reason.into(),
        })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.path.is_empty() {
            write!(f, " (at {})", self.path)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl core::error::Error for Error {}

/// The kind of data-shape error.
#[derive(Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A method was called that does not make sense for the value's kind.
    WrongKind {
        /// Name of the type the method was called on.
        type_name: String,
        /// Name of the method.
        method: &'static str,
        /// Kinds the method would have been valid for.
        appropriate: KindSet,
        /// The kind the value actually has.
        actual: Kind,
    },
    /// A lookup named a key or index that is not present.
    NotExists {
        /// The missing key or index.
        segment: PathSegment,
    },
    /// A map key (or struct field) was assembled twice.
    RepeatedMapKey {
        /// The repeated key, in representation form.
        key: String,
    },
    /// A struct was finished without all of its required fields.
    MissingRequiredField {
        /// Every missing field, in declaration order.
        fields: Vec<String>,
    },
    /// A key could not be accepted for the target type.
    InvalidKey {
        /// Name of the type receiving the key.
        type_name: String,
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },
    /// `next()` was called on an exhausted iterator.
    IteratorOverread,
    /// A representation could not be parsed into its type.
    Unmatchable {
        /// Name of the type being assembled.
        type_name: String,
        /// What did not match.
        reason: String,
    },
    /// A union received no member, or more than one.
    NotUnionStructure {
        /// Name of the union type.
        type_name: String,
        /// How many members were supplied.
        members: usize,
    },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::WrongKind {
                type_name,
                method,
                appropriate,
                actual,
            } => write!(
                f,
                "func called on wrong kind: {method} called on a {type_name} node \
                 (kind: {actual}), but only makes sense on {appropriate}"
            ),
            ErrorKind::NotExists { segment } => write!(f, "key not found: {segment}"),
            ErrorKind::RepeatedMapKey { key } => write!(f, "cannot repeat map key {key:?}"),
            ErrorKind::MissingRequiredField { fields } => {
                write!(f, "missing required fields: {}", fields.join(","))
            }
            ErrorKind::InvalidKey {
                type_name,
                key,
                reason,
            } => write!(f, "invalid key {key:?} for {type_name}: {reason}"),
            ErrorKind::IteratorOverread => write!(f, "iterator overread"),
            ErrorKind::Unmatchable { type_name, reason } => {
                write!(f, "could not match representation of {type_name}: {reason}")
            }
            ErrorKind::NotUnionStructure { type_name, members } => write!(
                f,
                "union {type_name} requires exactly one member, got {members}"
            ),
        }
    }
}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
