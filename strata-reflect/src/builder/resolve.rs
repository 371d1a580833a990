//! Finishing unions and structs whose representation had to be buffered.
//!
//! Envelope and inline unions may see their discriminant after the payload,
//! and list-pairs structs arrive as generic lists, so their input is first
//! assembled as `Any` data. On finish the buffered data is taken out of the
//! frame's storage and replayed into the real type.

use strata_core::{Error, ErrorKind};
use strata_schema::{Shape, StructRepr, StructShape, Table, TypeIx, UnionRepr, UnionShape};

use super::{Handle, NodeAssembler};
use crate::arena::Seg;
use crate::data::{Data, MapData, Place};
use crate::frame::FrameFlags;
use crate::peek::ReprNode;
use crate::repr::missing_fields;
use crate::view::View;

impl Handle<'_> {
    pub(crate) fn resolve_buffered(&mut self) -> Result<(), Error> {
        let frame = self.arena.get(self.frame);
        if !frame.flags.contains(FrameFlags::BUFFERED) {
            return Ok(());
        }
        let ty = frame.resolve.expect("buffered frame records its target type");
        let schema = self.schema;
        let buffered = core::mem::take(&mut *self.target);
        crate::trace!("resolving buffered {} at {}", schema.name(ty), self.path());

        match (schema.get(ty).shape(), buffered) {
            (Shape::Union(union), Data::Map(map)) => match union.repr() {
                UnionRepr::Envelope {
                    discriminant_key,
                    content_key,
                    table,
                } => self.envelope(ty, union, discriminant_key, content_key, table, &map),
                UnionRepr::Inline {
                    discriminant_key,
                    table,
                } => self.inline(ty, union, discriminant_key, table, &map),
                _ => unreachable!("only envelope and inline unions are buffered"),
            },
            (Shape::Struct(st), Data::List(pairs)) if *st.repr() == StructRepr::ListPairs => {
                self.list_pairs(ty, st, &pairs)
            }
            (_, other) => unreachable!("unexpected buffer {other:?}"),
        }
    }

    fn member_assembler(
        &mut self,
        union: &UnionShape,
        member: usize,
        seg: Seg<'_>,
    ) -> NodeAssembler<'_> {
        *self.target = Data::union(member);
        let child = self.arena.reuse_child(self.frame, member, seg);
        NodeAssembler::new(
            Handle {
                schema: self.schema,
                arena: &mut *self.arena,
                frame: child,
                ty: union.member(member),
                view: View::Repr,
                target: self.target.child_mut(Place::Member),
            },
            false,
        )
    }

    fn envelope(
        &mut self,
        ty: TypeIx,
        union: &UnionShape,
        discriminant_key: &str,
        content_key: &str,
        table: &Table<String>,
        map: &MapData,
    ) -> Result<(), Error> {
        let schema = self.schema;
        let name = schema.name(ty);
        let mut discriminant = None;
        let mut content = None;
        for (key, value) in map.rows() {
            let Data::String(key) = key else {
                unreachable!("buffered maps have string keys")
            };
            if key == discriminant_key {
                discriminant = Some(value);
            } else if key == content_key {
                content = Some(value);
            } else {
                return Err(self.fail(Error::unmatchable(
                    name,
                    format!("unexpected key {key:?} in envelope"),
                )));
            }
        }
        let member = self.discriminate(ty, discriminant_key, table, discriminant)?;
        let Some(content) = content else {
            return Err(self.fail(Error::unmatchable(
                name,
                format!("missing content key {content_key:?}"),
            )));
        };
        let any = schema.any();
        self.member_assembler(union, member, Seg::Key(content_key))
            .assign_node(&ReprNode::new(schema, any, content))
    }

    fn inline(
        &mut self,
        ty: TypeIx,
        union: &UnionShape,
        discriminant_key: &str,
        table: &Table<String>,
        map: &MapData,
    ) -> Result<(), Error> {
        let discriminant = map.get(discriminant_key);
        let member = self.discriminate(ty, discriminant_key, table, discriminant)?;
        let schema = self.schema;
        let any = schema.any();

        let mut node = self.member_assembler(union, member, Seg::Root);
        let mut fields = node.begin_map(map.len() as i64 - 1)?;
        for (key, value) in map.rows() {
            let Data::String(key) = key else {
                unreachable!("buffered maps have string keys")
            };
            if key == discriminant_key {
                continue;
            }
            fields
                .assemble_entry(key)?
                .assign_node(&ReprNode::new(schema, any, value))?;
        }
        fields.finish()
    }

    fn discriminate(
        &self,
        ty: TypeIx,
        discriminant_key: &str,
        table: &Table<String>,
        discriminant: Option<&Data>,
    ) -> Result<usize, Error> {
        let schema = self.schema;
        let name = schema.name(ty);
        let reason = match discriminant {
            None => format!("missing discriminant key {discriminant_key:?}"),
            Some(Data::String(text)) => match table.member(text.as_str()) {
                Some(member) => {
                    crate::trace!("{name}: discriminant {text:?} selects member {member}");
                    return Ok(member);
                }
                None => format!("unknown discriminant {text:?}"),
            },
            Some(other) => format!("discriminant must be a string, found {}", other.model_kind()),
        };
        Err(self.fail(Error::unmatchable(name, reason)))
    }

    fn list_pairs(&mut self, ty: TypeIx, st: &StructShape, pairs: &[Data]) -> Result<(), Error> {
        let schema = self.schema;
        let name = schema.name(ty);
        let any = schema.any();
        *self.target = Data::Struct(vec![None; st.fields().len()]);

        for (i, pair) in pairs.iter().enumerate() {
            let (key, value) = match pair {
                Data::List(items) => match items.as_slice() {
                    [Data::String(key), value] => (key.as_str(), value),
                    _ => {
                        return Err(self.fail(Error::unmatchable(
                            name,
                            format!("entry {i} is not a [key, value] pair"),
                        )));
                    }
                },
                _ => {
                    return Err(self.fail(Error::unmatchable(
                        name,
                        format!("entry {i} is not a list"),
                    )));
                }
            };
            let Some(index) = st.field_by_key(key) else {
                return Err(self.fail(Error::new(ErrorKind::InvalidKey {
                    type_name: name.to_owned(),
                    key: key.to_owned(),
                    reason: "no such field".into(),
                })));
            };
            let slots = self.target.as_slots_mut();
            if slots[index].is_some() {
                return Err(self.fail(Error::new(ErrorKind::RepeatedMapKey {
                    key: key.to_owned(),
                })));
            }
            slots[index] = Some(Data::Null);

            let field = st.field(index);
            let child = self.arena.reuse_child(self.frame, index, Seg::Key(key));
            let mut node = NodeAssembler::new(
                Handle {
                    schema,
                    arena: &mut *self.arena,
                    frame: child,
                    ty: field.ty(),
                    view: View::Repr,
                    target: self.target.child_mut(Place::Field(index)),
                },
                field.nullable(),
            );
            node.assign_node(&ReprNode::new(schema, any, value))?;
        }

        let Data::Struct(slots) = &*self.target else {
            unreachable!("struct storage was just written")
        };
        match missing_fields(st, slots, View::Repr) {
            Some(err) => Err(self.fail(err)),
            None => Ok(()),
        }
    }
}
