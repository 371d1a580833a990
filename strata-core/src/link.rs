use core::fmt;

/// An opaque content link.
///
/// The engine never resolves links; it only stores and compares them. The
/// textual form is whatever the producing codec uses (typically a CID string).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link(Box<str>);

impl Link {
    /// Wraps a link in its textual form.
    pub fn new(text: impl Into<Box<str>>) -> Self {
        Link(text.into())
    }

    /// The textual form of this link.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Link {
    fn from(value: &str) -> Self {
        Link::new(value)
    }
}
