use core::fmt;

use strata_core::KindSet;

/// One problem found while validating a [`TypeSystem`](crate::TypeSystem).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// Two declarations share a name.
    DuplicateType {
        /// The repeated name.
        name: String,
    },
    /// A declaration refers to a type that was never declared.
    UnresolvedType {
        /// The referring type.
        in_type: String,
        /// The missing name.
        name: String,
    },
    /// A scalar was declared with a recursive or null kind.
    NotAScalarKind {
        /// The scalar type.
        in_type: String,
    },
    /// A struct declares the same field twice.
    DuplicateField {
        /// The struct.
        in_type: String,
        /// The repeated field.
        field: String,
    },
    /// A rename or representation entry names a field the struct lacks.
    UnknownField {
        /// The struct.
        in_type: String,
        /// The unknown field.
        field: String,
    },
    /// Two entries of a representation table produce the same key or
    /// discriminant.
    DuplicateKey {
        /// The type owning the table.
        in_type: String,
        /// The repeated key or discriminant.
        key: String,
    },
    /// A union or enum lists the same member twice.
    DuplicateMember {
        /// The union or enum.
        in_type: String,
        /// The repeated member.
        member: String,
    },
    /// A union or enum has no members.
    NoMembers {
        /// The union or enum.
        in_type: String,
    },
    /// A declared member has no entry in the representation table.
    MemberMissingFromRepresentation {
        /// The union or enum.
        in_type: String,
        /// The member lacking an entry.
        member: String,
    },
    /// The representation table names something that is not a member.
    UnknownMember {
        /// The union or enum.
        in_type: String,
        /// The stray name.
        member: String,
    },
    /// Two kinded-union members can both be represented as the same kind.
    KindedMembersOverlap {
        /// The union.
        in_type: String,
        /// First member.
        first: String,
        /// Second member.
        second: String,
        /// The kinds they share.
        kinds: KindSet,
    },
    /// A kinded union has a kinded union as a member.
    NestedKindedUnion {
        /// The outer union.
        in_type: String,
        /// The inner union.
        member: String,
    },
    /// Something must be represented as a certain kind but isn't.
    RepresentationKindMismatch {
        /// The type imposing the requirement.
        in_type: String,
        /// The field, member or key whose type mismatches.
        item: String,
        /// Acceptable representation kinds.
        expected: KindSet,
        /// The kinds the item's type can be represented as.
        actual: KindSet,
    },
    /// An envelope union uses the same key for discriminant and content.
    EnvelopeKeysCollide {
        /// The union.
        in_type: String,
    },
    /// An inline union member is not a struct represented as a map.
    InlineMemberNotMapStruct {
        /// The union.
        in_type: String,
        /// The offending member.
        member: String,
    },
    /// An inline union member has a field keyed like the discriminant.
    InlineDiscriminantCollides {
        /// The union.
        in_type: String,
        /// The offending member.
        member: String,
    },
    /// One string-prefix discriminant is a prefix of another.
    AmbiguousPrefix {
        /// The union.
        in_type: String,
        /// The shorter prefix.
        first: String,
        /// The longer prefix.
        second: String,
    },
    /// A delimiter was empty.
    EmptyDelimiter {
        /// The struct.
        in_type: String,
    },
    /// A StringJoin struct declares an optional field.
    OptionalFieldInStringJoin {
        /// The struct.
        in_type: String,
        /// The optional field.
        field: String,
    },
    /// A tuple struct has an optional+nullable field before its last position.
    TupleOptionalNullableNotLast {
        /// The struct.
        in_type: String,
        /// The field.
        field: String,
    },
    /// Structs contain each other through required fields only, so no value
    /// of them can ever be finished.
    IllegalCycle {
        /// The types on the cycle, starting from the first declared one.
        cycle: Vec<String>,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::DuplicateType { name } => write!(f, "type {name} declared twice"),
            SchemaError::UnresolvedType { in_type, name } => {
                write!(f, "{in_type}: reference to undeclared type {name}")
            }
            SchemaError::NotAScalarKind { in_type } => {
                write!(f, "{in_type}: scalar kind must not be null, list or map")
            }
            SchemaError::DuplicateField { in_type, field } => {
                write!(f, "{in_type}: field {field} declared twice")
            }
            SchemaError::UnknownField { in_type, field } => {
                write!(f, "{in_type}: representation names unknown field {field}")
            }
            SchemaError::DuplicateKey { in_type, key } => {
                write!(f, "{in_type}: representation key {key:?} used twice")
            }
            SchemaError::DuplicateMember { in_type, member } => {
                write!(f, "{in_type}: member {member} listed twice")
            }
            SchemaError::NoMembers { in_type } => write!(f, "{in_type}: no members"),
            SchemaError::MemberMissingFromRepresentation { in_type, member } => write!(
                f,
                "{in_type}: member {member} has no entry in the representation"
            ),
            SchemaError::UnknownMember { in_type, member } => write!(
                f,
                "{in_type}: representation names {member}, which is not a member"
            ),
            SchemaError::KindedMembersOverlap {
                in_type,
                first,
                second,
                kinds,
            } => write!(
                f,
                "{in_type}: kinded members {first} and {second} both represent as {kinds}"
            ),
            SchemaError::NestedKindedUnion { in_type, member } => write!(
                f,
                "{in_type}: kinded union member {member} is itself a kinded union"
            ),
            SchemaError::RepresentationKindMismatch {
                in_type,
                item,
                expected,
                actual,
            } => write!(
                f,
                "{in_type}: {item} must be represented as {expected}, but is {actual}"
            ),
            SchemaError::EnvelopeKeysCollide { in_type } => write!(
                f,
                "{in_type}: envelope discriminant key and content key are the same"
            ),
            SchemaError::InlineMemberNotMapStruct { in_type, member } => write!(
                f,
                "{in_type}: inline member {member} must be a struct with map representation"
            ),
            SchemaError::InlineDiscriminantCollides { in_type, member } => write!(
                f,
                "{in_type}: inline member {member} has a field keyed like the discriminant"
            ),
            SchemaError::AmbiguousPrefix {
                in_type,
                first,
                second,
            } => write!(f, "{in_type}: prefix {first:?} is a prefix of {second:?}"),
            SchemaError::EmptyDelimiter { in_type } => {
                write!(f, "{in_type}: delimiter must not be empty")
            }
            SchemaError::OptionalFieldInStringJoin { in_type, field } => write!(
                f,
                "{in_type}: stringjoin field {field} must not be optional"
            ),
            SchemaError::TupleOptionalNullableNotLast { in_type, field } => write!(
                f,
                "{in_type}: optional nullable tuple field {field} must be the last field"
            ),
            SchemaError::IllegalCycle { cycle } => {
                write!(f, "required fields form a cycle: {}", cycle.join(" -> "))
            }
        }
    }
}

/// Returned by [`TypeSystem::compile`](crate::TypeSystem::compile) when
/// validation finds problems. Carries every problem, not just the first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidSchema {
    /// All problems found.
    pub errors: Vec<SchemaError>,
}

impl fmt::Display for InvalidSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid schema ({} errors)", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n  - {err}")?;
        }
        Ok(())
    }
}

impl core::error::Error for InvalidSchema {}
