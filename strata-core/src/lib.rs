#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod kind;
pub use kind::{Kind, KindSet};

mod maybe;
pub use maybe::Maybe;

mod link;
pub use link::Link;

mod path;
pub use path::{Path, PathSegment};

mod error;
pub use error::{Error, ErrorKind};

mod node;
pub use node::{
    Backing, LayoutId, ListIterator, MapIterator, Node, deep_equal, overread, wrong_kind,
};
