#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod arena;
mod data;
mod frame;
mod repr;

mod view;
pub use view::View;

mod builder;
pub use builder::{Builder, KeyAssembler, ListAssembler, MapAssembler, NodeAssembler, Value};

mod peek;
pub use peek::{ReprListIter, ReprMapIter, ReprNode, TypedListIter, TypedMapIter, TypedNode};

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
