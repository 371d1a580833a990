use strata_core::{KindSet, LayoutId};
use strata_schema::{Schema, TypeIx};

/// Which face of a type an assembler or node works with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    /// Logical shape: field names, union members by type name, enum members
    /// by name.
    Type,
    /// Wire shape, as chosen by the type's representation strategy.
    Repr,
}

impl View {
    /// Layout of `ty` in this view, as reported by node backings.
    pub(crate) fn layout(self, schema: &Schema, ty: TypeIx) -> LayoutId {
        LayoutId::new(schema.id(), ty.raw(), self as u8)
    }

    /// Kinds a value of `ty` can have in this view.
    pub(crate) fn kinds(self, schema: &Schema, ty: TypeIx) -> KindSet {
        let def = schema.get(ty);
        match self {
            View::Type => def.type_kinds(),
            View::Repr => def.repr_kinds(),
        }
    }
}
