//! Read-only views over assembled storage.
//!
//! [`TypedNode`] presents a value's logical shape; [`ReprNode`] presents the
//! same storage as its representation strategy lays it out. Neither copies:
//! both are small `Copy` handles pointing into the value.

use strata_core::{Error, PathSegment};

mod repr;
mod typed;

pub use repr::{ReprListIter, ReprMapIter, ReprNode};
pub use typed::{TypedListIter, TypedMapIter, TypedNode};

fn index_not_exists(index: i64) -> Error {
    match usize::try_from(index) {
        Ok(index) => Error::not_exists(index),
        Err(_) => Error::not_exists(PathSegment::Key(index.to_string())),
    }
}
