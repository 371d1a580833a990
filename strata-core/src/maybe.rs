/// Optionality marker carried by every optional or nullable slot.
///
/// A field that is both optional and nullable can be in any of the three
/// states; an optional-only field is never `Null` and a nullable-only field is
/// never `Absent`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Maybe {
    /// The slot was never given a value.
    #[default]
    Absent,
    /// The slot was explicitly set to null.
    Null,
    /// The slot holds a value.
    Value,
}

impl Maybe {
    /// Returns true unless the slot is absent.
    #[inline]
    pub fn exists(self) -> bool {
        !matches!(self, Maybe::Absent)
    }
}
