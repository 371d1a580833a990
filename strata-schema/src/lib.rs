#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod decl;
pub use decl::{
    EnumRepresentation, StructField, StructRepresentation, TypeDecl, UnionRepresentation,
};

mod error;
pub use error::{InvalidSchema, SchemaError};

mod schema;
pub use schema::{
    EnumRepr, EnumShape, Field, KindedTable, ListShape, MapShape, Schema, Shape, StructRepr,
    StructShape, Table, TypeDef, TypeIx, UnionRepr, UnionShape,
};

mod typesystem;
pub use typesystem::{PRELUDE, TypeSystem};

mod compile;

#[cfg(feature = "tracing")]
#[allow(unused_imports)]
pub(crate) use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
#[macro_export]
/// Forwards to tracing::trace when the tracing feature is enabled
macro_rules! trace {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "tracing"))]
#[macro_export]
/// Forwards to tracing::debug when the tracing feature is enabled
macro_rules! debug {
    ($($tt:tt)*) => {};
}
