//! Resolution and validation of a type system into a [`Schema`].
//!
//! Runs in three passes so that every problem is reported, not just the
//! first: resolve names and build per-type tables, compute representation
//! kinds, then run the checks that need other types' kinds.

use core::sync::atomic::{AtomicU64, Ordering};

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use strata_core::{Kind, KindSet};

use crate::schema::{
    EnumRepr, EnumShape, Field, KindedTable, ListShape, MapShape, Schema, Shape, StructRepr,
    StructShape, Table, TypeDef, TypeIx, UnionRepr, UnionShape,
};
use crate::{
    EnumRepresentation, InvalidSchema, SchemaError, StructRepresentation, TypeDecl,
    UnionRepresentation,
};

static NEXT_SCHEMA_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct Compiler<'d> {
    decls: &'d IndexMap<String, TypeDecl>,
    duplicates: &'d [String],
    errors: Vec<SchemaError>,
}

impl<'d> Compiler<'d> {
    pub(crate) fn new(decls: &'d IndexMap<String, TypeDecl>, duplicates: &'d [String]) -> Self {
        Compiler {
            decls,
            duplicates,
            errors: Vec::new(),
        }
    }

    pub(crate) fn run(mut self) -> Result<Schema, InvalidSchema> {
        for name in self.duplicates {
            self.errors
                .push(SchemaError::DuplicateType { name: name.clone() });
        }

        let mut types: Vec<TypeDef> = Vec::with_capacity(self.decls.len());
        for (name, decl) in self.decls {
            let shape = self.shape(name, decl);
            types.push(TypeDef {
                name: name.clone(),
                shape,
                type_kinds: KindSet::empty(),
                repr_kinds: KindSet::empty(),
            });
        }

        for i in 0..types.len() {
            types[i].type_kinds = type_kinds(&types[i].shape);
            let mut visiting = HashSet::new();
            types[i].repr_kinds = repr_kinds(&types, TypeIx::new(i), &mut visiting);
        }

        for i in 0..types.len() {
            self.cross_check(&mut types, TypeIx::new(i));
        }
        self.check_cycles(&types);

        let any = types
            .iter()
            .position(|def| matches!(def.shape, Shape::Any))
            .map(TypeIx::new);

        if !self.errors.is_empty() {
            crate::debug!("schema rejected with {} errors", self.errors.len());
            return Err(InvalidSchema {
                errors: self.errors,
            });
        }
        let Some(any) = any else {
            return Err(InvalidSchema {
                errors: vec![SchemaError::UnresolvedType {
                    in_type: "(prelude)".into(),
                    name: "Any".into(),
                }],
            });
        };

        let by_name = types
            .iter()
            .enumerate()
            .map(|(i, def)| (def.name.clone(), TypeIx::new(i)))
            .collect();
        let id = NEXT_SCHEMA_ID.fetch_add(1, Ordering::Relaxed);
        crate::trace!("compiled schema #{id} with {} types", types.len());
        Ok(Schema {
            id,
            types,
            by_name,
            any,
        })
    }

    fn resolve(&mut self, in_type: &str, name: &str) -> TypeIx {
        match self.decls.get_index_of(name) {
            Some(i) => TypeIx::new(i),
            None => {
                self.errors.push(SchemaError::UnresolvedType {
                    in_type: in_type.to_owned(),
                    name: name.to_owned(),
                });
                TypeIx::UNRESOLVED
            }
        }
    }

    fn shape(&mut self, name: &str, decl: &TypeDecl) -> Shape {
        match decl {
            TypeDecl::Any => Shape::Any,
            TypeDecl::Scalar(kind) => {
                if matches!(kind, Kind::Null | Kind::List | Kind::Map) {
                    self.errors.push(SchemaError::NotAScalarKind {
                        in_type: name.to_owned(),
                    });
                }
                Shape::Scalar(*kind)
            }
            TypeDecl::List { value, nullable } => Shape::List(ListShape {
                value: self.resolve(name, value),
                nullable: *nullable,
            }),
            TypeDecl::Map {
                key,
                value,
                nullable,
            } => Shape::Map(MapShape {
                key: self.resolve(name, key),
                value: self.resolve(name, value),
                nullable: *nullable,
            }),
            TypeDecl::Enum { members, repr } => Shape::Enum(self.enum_shape(name, members, repr)),
            TypeDecl::Struct { fields, repr } => {
                Shape::Struct(self.struct_shape(name, fields, repr))
            }
            TypeDecl::Union { members, repr } => {
                Shape::Union(self.union_shape(name, members, repr))
            }
        }
    }

    fn member_index(&mut self, name: &str, members: &[String]) -> HashMap<String, usize> {
        if members.is_empty() {
            self.errors.push(SchemaError::NoMembers {
                in_type: name.to_owned(),
            });
        }
        let mut by_name = HashMap::with_capacity(members.len());
        for (i, member) in members.iter().enumerate() {
            if by_name.insert(member.clone(), i).is_some() {
                self.errors.push(SchemaError::DuplicateMember {
                    in_type: name.to_owned(),
                    member: member.clone(),
                });
            }
        }
        by_name
    }

    /// Turns `(discriminant, member)` pairs into one discriminant per member,
    /// reporting stray, missing and repeated entries.
    fn member_table<D>(
        &mut self,
        name: &str,
        members: &[String],
        by_name: &HashMap<String, usize>,
        pairs: impl IntoIterator<Item = (D, String)>,
        fallback: impl Fn(&str) -> Option<D>,
        show: impl Fn(&D) -> String,
    ) -> Table<D>
    where
        D: Eq + core::hash::Hash + Clone,
    {
        let mut slots: Vec<Option<D>> = vec![None; members.len()];
        let mut seen: HashSet<D> = HashSet::new();
        for (discriminant, member) in pairs {
            let Some(&i) = by_name.get(&member) else {
                self.errors.push(SchemaError::UnknownMember {
                    in_type: name.to_owned(),
                    member,
                });
                continue;
            };
            if slots[i].is_some() {
                self.errors.push(SchemaError::DuplicateMember {
                    in_type: name.to_owned(),
                    member,
                });
                continue;
            }
            if !seen.insert(discriminant.clone()) {
                self.errors.push(SchemaError::DuplicateKey {
                    in_type: name.to_owned(),
                    key: show(&discriminant),
                });
            }
            slots[i] = Some(discriminant);
        }
        let mut by_member = Vec::with_capacity(members.len());
        for (i, slot) in slots.into_iter().enumerate() {
            match slot.or_else(|| fallback(&members[i])) {
                Some(d) => {
                    by_member.push(d);
                }
                None => {
                    self.errors
                        .push(SchemaError::MemberMissingFromRepresentation {
                            in_type: name.to_owned(),
                            member: members[i].clone(),
                        });
                }
            }
        }
        Table::new(by_member)
    }

    fn enum_shape(
        &mut self,
        name: &str,
        members: &[String],
        repr: &EnumRepresentation,
    ) -> EnumShape {
        let by_name = self.member_index(name, members);
        let repr = match repr {
            EnumRepresentation::String(renames) => {
                let pairs = renames.iter().map(|(m, s)| (s.clone(), m.clone()));
                let reported = self.errors.len();
                let table = self.member_table(
                    name,
                    members,
                    &by_name,
                    pairs,
                    |m| Some(m.to_owned()),
                    |s| s.clone(),
                );
                if self.errors.len() == reported {
                    self.check_unique(name, table.discriminants().iter().cloned());
                }
                EnumRepr::String(table)
            }
            EnumRepresentation::Int(values) => {
                let pairs = values.iter().map(|(m, v)| (*v, m.clone()));
                EnumRepr::Int(self.member_table(
                    name,
                    members,
                    &by_name,
                    pairs,
                    |_| None,
                    |v| v.to_string(),
                ))
            }
        };
        EnumShape {
            members: members.to_vec(),
            by_name,
            repr,
        }
    }

    /// Reports the first repeat of every key that occurs more than once.
    fn check_unique(&mut self, name: &str, keys: impl Iterator<Item = String>) {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for key in keys {
            if !seen.insert(key.clone()) && reported.insert(key.clone()) {
                self.errors.push(SchemaError::DuplicateKey {
                    in_type: name.to_owned(),
                    key,
                });
            }
        }
    }

    fn struct_shape(
        &mut self,
        name: &str,
        decls: &[crate::StructField],
        repr: &StructRepresentation,
    ) -> StructShape {
        let reported = self.errors.len();
        let mut by_name = HashMap::with_capacity(decls.len());
        for (i, field) in decls.iter().enumerate() {
            if by_name.insert(field.name.clone(), i).is_some() {
                self.errors.push(SchemaError::DuplicateField {
                    in_type: name.to_owned(),
                    field: field.name.clone(),
                });
            }
        }

        let mut keys: Vec<String> = decls.iter().map(|f| f.name.clone()).collect();
        let compiled_repr = match repr {
            StructRepresentation::Map { renames } => {
                for (field, key) in renames {
                    match by_name.get(field) {
                        Some(&i) => keys[i] = key.clone(),
                        None => self.errors.push(SchemaError::UnknownField {
                            in_type: name.to_owned(),
                            field: field.clone(),
                        }),
                    }
                }
                if self.errors.len() == reported {
                    self.check_unique(name, keys.iter().cloned());
                }
                StructRepr::Map
            }
            StructRepresentation::Tuple => {
                let last = decls.len().saturating_sub(1);
                for (i, field) in decls.iter().enumerate() {
                    if field.optional && field.nullable && i != last {
                        self.errors.push(SchemaError::TupleOptionalNullableNotLast {
                            in_type: name.to_owned(),
                            field: field.name.clone(),
                        });
                    }
                }
                StructRepr::Tuple
            }
            StructRepresentation::StringJoin { join } => {
                if join.is_empty() {
                    self.errors.push(SchemaError::EmptyDelimiter {
                        in_type: name.to_owned(),
                    });
                }
                for field in decls.iter().filter(|f| f.optional) {
                    self.errors.push(SchemaError::OptionalFieldInStringJoin {
                        in_type: name.to_owned(),
                        field: field.name.clone(),
                    });
                }
                StructRepr::StringJoin { join: join.clone() }
            }
            StructRepresentation::StringPairs { inner, entry } => {
                if inner.is_empty() || entry.is_empty() {
                    self.errors.push(SchemaError::EmptyDelimiter {
                        in_type: name.to_owned(),
                    });
                }
                StructRepr::StringPairs {
                    inner: inner.clone(),
                    entry: entry.clone(),
                }
            }
            StructRepresentation::ListPairs => StructRepr::ListPairs,
        };

        let mut fields = Vec::with_capacity(decls.len());
        let mut by_key = HashMap::with_capacity(decls.len());
        for (i, (decl, key)) in decls.iter().zip(keys).enumerate() {
            by_key.entry(key.clone()).or_insert(i);
            fields.push(Field {
                name: decl.name.clone(),
                key,
                ty: self.resolve(name, &decl.ty),
                optional: decl.optional,
                nullable: decl.nullable,
            });
        }
        StructShape {
            fields,
            repr: compiled_repr,
            by_name,
            by_key,
        }
    }

    fn union_shape(
        &mut self,
        name: &str,
        members: &[String],
        repr: &UnionRepresentation,
    ) -> UnionShape {
        let by_name = self.member_index(name, members);
        let member_types = members.iter().map(|m| self.resolve(name, m)).collect();
        let show = |s: &String| s.clone();
        let repr = match repr {
            UnionRepresentation::Keyed(pairs) => UnionRepr::Keyed(self.member_table(
                name,
                members,
                &by_name,
                pairs.iter().cloned(),
                |_| None,
                show,
            )),
            UnionRepresentation::Kinded => UnionRepr::Kinded(KindedTable::default()),
            UnionRepresentation::Envelope {
                discriminant_key,
                content_key,
                table,
            } => {
                if discriminant_key == content_key {
                    self.errors.push(SchemaError::EnvelopeKeysCollide {
                        in_type: name.to_owned(),
                    });
                }
                UnionRepr::Envelope {
                    discriminant_key: discriminant_key.clone(),
                    content_key: content_key.clone(),
                    table: self.member_table(
                        name,
                        members,
                        &by_name,
                        table.iter().cloned(),
                        |_| None,
                        show,
                    ),
                }
            }
            UnionRepresentation::Inline {
                discriminant_key,
                table,
            } => UnionRepr::Inline {
                discriminant_key: discriminant_key.clone(),
                table: self.member_table(
                    name,
                    members,
                    &by_name,
                    table.iter().cloned(),
                    |_| None,
                    show,
                ),
            },
            UnionRepresentation::BytePrefix(pairs) => UnionRepr::BytePrefix(self.member_table(
                name,
                members,
                &by_name,
                pairs.iter().cloned(),
                |_| None,
                |b| format!("{b:#04x}"),
            )),
            UnionRepresentation::StringPrefix(pairs) => {
                let table = self.member_table(
                    name,
                    members,
                    &by_name,
                    pairs.iter().cloned(),
                    |_| None,
                    show,
                );
                let prefixes = table.discriminants();
                for (i, a) in prefixes.iter().enumerate() {
                    for (j, b) in prefixes.iter().enumerate() {
                        if i != j && a != b && b.starts_with(a.as_str()) {
                            self.errors.push(SchemaError::AmbiguousPrefix {
                                in_type: name.to_owned(),
                                first: a.clone(),
                                second: b.clone(),
                            });
                        }
                    }
                }
                UnionRepr::StringPrefix(table)
            }
        };
        UnionShape {
            members: member_types,
            by_name,
            repr,
        }
    }

    /// Checks that depend on the representation kinds of other types.
    fn cross_check(&mut self, types: &mut [TypeDef], ix: TypeIx) {
        let name = types[ix.index()].name.clone();
        let repr_of = |t: TypeIx| -> KindSet {
            if t.is_resolved() {
                types[t.index()].repr_kinds
            } else {
                // already reported as unresolved
                KindSet::all()
            }
        };
        let mut kinded: Option<KindedTable> = None;

        match &types[ix.index()].shape {
            Shape::Map(map) => {
                self.require_kinds(
                    &name,
                    "map key",
                    repr_of(map.key),
                    map.key,
                    KindSet::STRING,
                );
            }
            Shape::Struct(st) => {
                if matches!(
                    st.repr,
                    StructRepr::StringJoin { .. } | StructRepr::StringPairs { .. }
                ) {
                    for field in &st.fields {
                        let item = format!("field {}", field.name);
                        self.require_kinds(
                            &name,
                            &item,
                            repr_of(field.ty),
                            field.ty,
                            KindSet::STRING,
                        );
                    }
                }
            }
            Shape::Union(un) => match &un.repr {
                UnionRepr::Kinded(_) => {
                    let mut table = KindedTable::default();
                    let mut claimed = KindSet::empty();
                    let mut owners: Vec<(TypeIx, KindSet)> = Vec::new();
                    for (m, &member) in un.members.iter().enumerate() {
                        if !member.is_resolved() {
                            continue;
                        }
                        let member_def = &types[member.index()];
                        if let Shape::Union(inner) = &member_def.shape {
                            if matches!(inner.repr, UnionRepr::Kinded(_)) {
                                self.errors.push(SchemaError::NestedKindedUnion {
                                    in_type: name.clone(),
                                    member: member_def.name.clone(),
                                });
                                continue;
                            }
                        }
                        let kinds = member_def.repr_kinds;
                        let overlap = claimed & kinds;
                        if !overlap.is_empty() {
                            for (other, other_kinds) in &owners {
                                let shared = *other_kinds & kinds;
                                if !shared.is_empty() {
                                    self.errors.push(SchemaError::KindedMembersOverlap {
                                        in_type: name.clone(),
                                        first: types[other.index()].name.clone(),
                                        second: member_def.name.clone(),
                                        kinds: shared,
                                    });
                                }
                            }
                        }
                        for kind in kinds.kinds() {
                            if !claimed.has(kind) {
                                table.set(kind, m);
                            }
                        }
                        claimed |= kinds;
                        owners.push((member, kinds));
                    }
                    kinded = Some(table);
                }
                UnionRepr::Inline {
                    discriminant_key, ..
                } => {
                    for &member in &un.members {
                        if !member.is_resolved() {
                            continue;
                        }
                        let member_def = &types[member.index()];
                        match &member_def.shape {
                            Shape::Struct(st) if st.repr == StructRepr::Map => {
                                if st.field_by_key(discriminant_key).is_some() {
                                    self.errors.push(SchemaError::InlineDiscriminantCollides {
                                        in_type: name.clone(),
                                        member: member_def.name.clone(),
                                    });
                                }
                            }
                            _ => self.errors.push(SchemaError::InlineMemberNotMapStruct {
                                in_type: name.clone(),
                                member: member_def.name.clone(),
                            }),
                        }
                    }
                }
                UnionRepr::BytePrefix(_) => {
                    for &member in &un.members {
                        let item = format!("member {}", display_name(types, member));
                        self.require_kinds(
                            &name,
                            &item,
                            repr_of(member),
                            member,
                            KindSet::BYTES,
                        );
                    }
                }
                UnionRepr::StringPrefix(_) => {
                    for &member in &un.members {
                        let item = format!("member {}", display_name(types, member));
                        self.require_kinds(
                            &name,
                            &item,
                            repr_of(member),
                            member,
                            KindSet::STRING,
                        );
                    }
                }
                UnionRepr::Keyed(_) | UnionRepr::Envelope { .. } => {}
            },
            Shape::Any | Shape::Scalar(_) | Shape::Enum(_) | Shape::List(_) => {}
        }

        if let Some(table) = kinded {
            if let Shape::Union(un) = &mut types[ix.index()].shape {
                un.repr = UnionRepr::Kinded(table);
            }
        }
    }

    fn require_kinds(
        &mut self,
        name: &str,
        item: &str,
        actual: KindSet,
        ty: TypeIx,
        expected: KindSet,
    ) {
        if ty.is_resolved() && (actual.is_empty() || !expected.contains(actual)) {
            self.errors.push(SchemaError::RepresentationKindMismatch {
                in_type: name.to_owned(),
                item: item.to_owned(),
                expected,
                actual,
            });
        }
    }

    /// Rejects structs that contain themselves through required,
    /// non-nullable struct fields.
    fn check_cycles(&mut self, types: &[TypeDef]) {
        let edges: Vec<Vec<usize>> = types
            .iter()
            .map(|def| match &def.shape {
                Shape::Struct(st) => st
                    .fields
                    .iter()
                    .filter(|f| !f.optional && !f.nullable && f.ty.is_resolved())
                    .filter(|f| matches!(types[f.ty.index()].shape, Shape::Struct(_)))
                    .map(|f| f.ty.index())
                    .collect(),
                _ => Vec::new(),
            })
            .collect();

        let mut state = vec![Visit::New; types.len()];
        let mut stack = Vec::new();
        let mut found: HashSet<Vec<usize>> = HashSet::new();
        for start in 0..types.len() {
            if state[start] == Visit::New {
                find_cycles(start, &edges, &mut state, &mut stack, &mut found);
            }
        }

        let mut cycles: Vec<Vec<usize>> = found.into_iter().collect();
        cycles.sort();
        for cycle in cycles {
            self.errors.push(SchemaError::IllegalCycle {
                cycle: cycle.iter().map(|&i| types[i].name.clone()).collect(),
            });
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnStack,
    Done,
}

fn find_cycles(
    node: usize,
    edges: &[Vec<usize>],
    state: &mut [Visit],
    stack: &mut Vec<usize>,
    found: &mut HashSet<Vec<usize>>,
) {
    state[node] = Visit::OnStack;
    stack.push(node);
    for &next in &edges[node] {
        match state[next] {
            Visit::New => find_cycles(next, edges, state, stack, found),
            Visit::OnStack => {
                let Some(pos) = stack.iter().position(|&n| n == next) else {
                    continue;
                };
                let mut cycle = stack[pos..].to_vec();
                // rotate so the lowest index leads, making the cycle canonical
                if let Some(min_pos) = cycle
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, n)| **n)
                    .map(|(i, _)| i)
                {
                    cycle.rotate_left(min_pos);
                }
                found.insert(cycle);
            }
            Visit::Done => {}
        }
    }
    stack.pop();
    state[node] = Visit::Done;
}

fn display_name(types: &[TypeDef], ty: TypeIx) -> &str {
    if ty.is_resolved() {
        &types[ty.index()].name
    } else {
        "(unresolved)"
    }
}

fn type_kinds(shape: &Shape) -> KindSet {
    match shape {
        Shape::Any => KindSet::all(),
        Shape::Scalar(kind) => KindSet::from(*kind),
        Shape::Enum(_) => KindSet::STRING,
        Shape::List(_) => KindSet::LIST,
        Shape::Map(_) | Shape::Struct(_) | Shape::Union(_) => KindSet::MAP,
    }
}

fn repr_kinds(types: &[TypeDef], ix: TypeIx, visiting: &mut HashSet<TypeIx>) -> KindSet {
    if !ix.is_resolved() || !visiting.insert(ix) {
        return KindSet::empty();
    }
    let kinds = match &types[ix.index()].shape {
        Shape::Any => KindSet::all(),
        Shape::Scalar(kind) => KindSet::from(*kind),
        Shape::Enum(en) => match en.repr {
            EnumRepr::String(_) => KindSet::STRING,
            EnumRepr::Int(_) => KindSet::INT,
        },
        Shape::List(_) => KindSet::LIST,
        Shape::Map(_) => KindSet::MAP,
        Shape::Struct(st) => match st.repr {
            StructRepr::Map => KindSet::MAP,
            StructRepr::Tuple | StructRepr::ListPairs => KindSet::LIST,
            StructRepr::StringJoin { .. } | StructRepr::StringPairs { .. } => KindSet::STRING,
        },
        Shape::Union(un) => match un.repr {
            UnionRepr::Keyed(_) | UnionRepr::Envelope { .. } | UnionRepr::Inline { .. } => {
                KindSet::MAP
            }
            UnionRepr::BytePrefix(_) => KindSet::BYTES,
            UnionRepr::StringPrefix(_) => KindSet::STRING,
            UnionRepr::Kinded(_) => un
                .members
                .iter()
                .fold(KindSet::empty(), |acc, &m| acc | repr_kinds(types, m, visiting)),
        },
    };
    visiting.remove(&ix);
    kinds
}
