use strata_core::{Error, Maybe};
use strata_schema::{ListShape, Shape, StructShape};

use super::{Handle, NodeAssembler};
use crate::arena::Seg;
use crate::data::{Data, Place};
use crate::frame::{Pending, Phase};
use crate::repr::missing_fields;

/// Assembles the elements of a list or a tuple-represented struct.
pub struct ListAssembler<'a> {
    h: Handle<'a>,
}

#[derive(Clone, Copy)]
enum Items<'s> {
    Any,
    List(&'s ListShape),
    Tuple(&'s StructShape),
}

impl<'a> ListAssembler<'a> {
    pub(crate) fn new(h: Handle<'a>) -> Self {
        ListAssembler { h }
    }

    /// Name of the type being assembled.
    pub fn type_name(&self) -> &str {
        self.h.name()
    }

    fn items(&self) -> Items<'a> {
        match self.h.schema.get(self.h.ty).shape() {
            Shape::Any => Items::Any,
            Shape::List(list) => Items::List(list),
            Shape::Struct(st) => Items::Tuple(st),
            _ => unreachable!("{} is not assembled as a list", self.h.name()),
        }
    }

    /// The assembler for the next element.
    ///
    /// Fails with `Unmatchable` when a tuple already has all its fields.
    ///
    /// # Panics
    ///
    /// Panics if the previous element is unfinished.
    pub fn assemble_value(&mut self) -> Result<NodeAssembler<'_>, Error> {
        self.h.settle("assemble_value");
        let items = self.items();
        let h = &mut self.h;
        match items {
            Items::Any | Items::List(_) => {
                let (ty, nullable) = match items {
                    Items::List(list) => (list.value, list.nullable),
                    _ => (h.schema.any(), false),
                };
                let list = h.target.as_list_mut();
                list.push(Data::Null);
                let index = list.len() - 1;
                h.arena.get_mut(h.frame).pending = Pending::Entry;
                let child = h.arena.reuse_child(h.frame, 0, Seg::Index(index));
                let view = h.view;
                Ok(h.hand_out(child, ty, view, nullable, Place::ListItem))
            }
            Items::Tuple(st) => {
                let index = h.arena.get(h.frame).cursor;
                if index >= st.fields().len() {
                    return Err(h.fail(Error::unmatchable(
                        h.name(),
                        format!("expected at most {} elements", st.fields().len()),
                    )));
                }
                let field = st.field(index);
                h.target.as_slots_mut()[index] = Some(Data::Null);
                let frame = h.arena.get_mut(h.frame);
                frame.cursor += 1;
                frame.pending = Pending::Field(index);
                let child = h.arena.reuse_child(h.frame, index, Seg::Index(index));
                let view = h.view;
                // optional fields travel as null when an interior slot is absent
                let nullable = field.nullable() || field.optional();
                Ok(h.hand_out(child, field.ty(), view, nullable, Place::Field(index)))
            }
        }
    }

    /// Close the list. Tuples check their required fields here.
    pub fn finish(&mut self) -> Result<(), Error> {
        self.h.settle("finish");
        if let Items::Tuple(st) = self.items() {
            let Data::Struct(slots) = &*self.h.target else {
                unreachable!("tuple storage")
            };
            if let Some(err) = missing_fields(st, slots, self.h.view) {
                return Err(self.h.fail(err));
            }
        }
        self.h.resolve_buffered()?;
        self.h.complete(Maybe::Value);
        Ok(())
    }
}
