//! Representation strategies over scalar storage: storing assigned scalars,
//! parsing and rendering string and bytes representations, and the
//! dispatch that lets kinded unions delegate to a member.

use alloc::borrow::Cow;

use strata_core::{Error, ErrorKind, Kind, KindSet, Link};
use strata_schema::{EnumRepr, Schema, Shape, StructRepr, StructShape, TypeIx, UnionRepr};

use crate::data::Data;
use crate::view::View;

/// Upper bound on storage preallocated from a caller's size hint.
const MAX_PREALLOC: usize = 1 << 16;

/// Capacity to reserve for a size hint; `<= 0` means unknown.
pub(crate) fn prealloc(size_hint: i64) -> usize {
    usize::try_from(size_hint).unwrap_or(0).min(MAX_PREALLOC)
}

/// A scalar offered to an assembler.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Scalar<'v> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(&'v str),
    Bytes(&'v [u8]),
    Link(&'v Link),
}

impl Scalar<'_> {
    pub(crate) fn kind(&self) -> Kind {
        match self {
            Scalar::Bool(_) => Kind::Bool,
            Scalar::Int(_) => Kind::Int,
            Scalar::Float(_) => Kind::Float,
            Scalar::Str(_) => Kind::String,
            Scalar::Bytes(_) => Kind::Bytes,
            Scalar::Link(_) => Kind::Link,
        }
    }

    pub(crate) fn method(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "assign_bool",
            Scalar::Int(_) => "assign_int",
            Scalar::Float(_) => "assign_float",
            Scalar::Str(_) => "assign_string",
            Scalar::Bytes(_) => "assign_bytes",
            Scalar::Link(_) => "assign_link",
        }
    }

    fn into_data(self) -> Data {
        match self {
            Scalar::Bool(v) => Data::Bool(v),
            Scalar::Int(v) => Data::Int(v),
            Scalar::Float(v) => Data::Float(v),
            Scalar::Str(v) => Data::String(v.to_owned()),
            Scalar::Bytes(v) => Data::Bytes(v.to_vec()),
            Scalar::Link(v) => Data::Link(v.clone()),
        }
    }
}

/// `method` called on a value of `ty` that only makes sense on `appropriate`.
pub(crate) fn wrong_kind(
    schema: &Schema,
    ty: TypeIx,
    view: View,
    method: &'static str,
    appropriate: KindSet,
) -> Error {
    let actual = view.kinds(schema, ty).kinds().next().unwrap_or(Kind::Null);
    Error::wrong_kind(schema.name(ty), method, appropriate, actual)
}

/// Steps through kinded unions to the member represented as `kind`,
/// recording the member choice in `target` on the way.
pub(crate) fn descend<'t>(
    schema: &Schema,
    mut ty: TypeIx,
    view: View,
    mut target: &'t mut Data,
    kind: Kind,
    method: &'static str,
) -> Result<(TypeIx, &'t mut Data), Error> {
    loop {
        let Shape::Union(union) = schema.get(ty).shape() else {
            return Ok((ty, target));
        };
        let (View::Repr, UnionRepr::Kinded(table)) = (view, union.repr()) else {
            return Ok((ty, target));
        };
        let Some(member) = table.member(kind) else {
            return Err(Error::wrong_kind(
                schema.name(ty),
                method,
                schema.get(ty).repr_kinds(),
                kind,
            ));
        };
        crate::trace!(
            "{}: {kind} selects member {}",
            schema.name(ty),
            schema.name(union.member(member))
        );
        *target = Data::union(member);
        let Data::Union(chosen) = target else {
            unreachable!("union storage was just written")
        };
        target = &mut chosen.value;
        ty = union.member(member);
    }
}

/// Store a scalar into `target`, interpreting it through `ty` in `view`.
pub(crate) fn store(
    schema: &Schema,
    ty: TypeIx,
    view: View,
    target: &mut Data,
    value: Scalar<'_>,
) -> Result<(), Error> {
    let (ty, target) = descend(schema, ty, view, target, value.kind(), value.method())?;
    let name = schema.name(ty);
    let mismatch = || wrong_kind(schema, ty, view, value.method(), KindSet::from(value.kind()));

    match (schema.get(ty).shape(), view) {
        (Shape::Any, _) => *target = value.into_data(),
        (Shape::Scalar(kind), _) if *kind == value.kind() => *target = value.into_data(),
        (Shape::Enum(en), View::Type) => {
            let Scalar::Str(text) = value else {
                return Err(mismatch());
            };
            let member = en
                .member_by_name(text)
                .ok_or_else(|| Error::unmatchable(name, format!("no member named {text:?}")))?;
            *target = Data::Enum(member);
        }
        (Shape::Enum(en), View::Repr) => {
            let member = match (en.repr(), value) {
                (EnumRepr::String(table), Scalar::Str(text)) => table.member(text),
                (EnumRepr::Int(table), Scalar::Int(int)) => table.member(&int),
                _ => return Err(mismatch()),
            };
            let member = member.ok_or_else(|| {
                Error::unmatchable(name, format!("no member represented as {value:?}"))
            })?;
            *target = Data::Enum(member);
        }
        (Shape::Struct(st), View::Repr) => {
            *target = match (st.repr(), value) {
                (StructRepr::StringJoin { join }, Scalar::Str(text)) => {
                    parse_join(schema, ty, st, join, text)?
                }
                (StructRepr::StringPairs { inner, entry }, Scalar::Str(text)) => {
                    parse_pairs(schema, ty, st, inner, entry, text)?
                }
                _ => return Err(mismatch()),
            }
        }
        (Shape::Union(union), View::Repr) => {
            let (member, rest) = match (union.repr(), value) {
                (UnionRepr::BytePrefix(table), Scalar::Bytes(bytes)) => {
                    let (first, rest) = bytes
                        .split_first()
                        .ok_or_else(|| Error::unmatchable(name, "no discriminant byte"))?;
                    let member = table.member(first).ok_or_else(|| {
                        Error::unmatchable(name, format!("unknown discriminant byte {first:#04x}"))
                    })?;
                    (member, Scalar::Bytes(rest))
                }
                (UnionRepr::StringPrefix(_), Scalar::Str(text)) => {
                    let (member, len) = union.repr().member_by_prefix(text).ok_or_else(|| {
                        Error::unmatchable(name, format!("no member prefix matches {text:?}"))
                    })?;
                    (member, Scalar::Str(&text[len..]))
                }
                _ => return Err(mismatch()),
            };
            *target = Data::union(member);
            let Data::Union(chosen) = target else {
                unreachable!("union storage was just written")
            };
            store(schema, union.member(member), View::Repr, &mut chosen.value, rest)?;
        }
        _ => return Err(mismatch()),
    }
    Ok(())
}

fn parse_join(
    schema: &Schema,
    ty: TypeIx,
    st: &StructShape,
    join: &str,
    text: &str,
) -> Result<Data, Error> {
    let parts = text.split(join).count();
    if parts != st.fields().len() {
        return Err(Error::unmatchable(
            schema.name(ty),
            format!(
                "expected {} fields joined by {join:?}, found {parts}",
                st.fields().len()
            ),
        ));
    }
    let mut slots = Vec::with_capacity(parts);
    for (field, part) in st.fields().iter().zip(text.split(join)) {
        let mut slot = Data::Null;
        store(schema, field.ty(), View::Repr, &mut slot, Scalar::Str(part))?;
        slots.push(Some(slot));
    }
    Ok(Data::Struct(slots))
}

fn parse_pairs(
    schema: &Schema,
    ty: TypeIx,
    st: &StructShape,
    inner: &str,
    entry: &str,
    text: &str,
) -> Result<Data, Error> {
    let mut slots: Vec<Option<Data>> = vec![None; st.fields().len()];
    if !text.is_empty() {
        for pair in text.split(entry) {
            let Some((key, value)) = pair.split_once(inner) else {
                return Err(Error::unmatchable(
                    schema.name(ty),
                    format!("entry {pair:?} lacks {inner:?}"),
                ));
            };
            let Some(index) = st.field_by_key(key) else {
                return Err(Error::new(ErrorKind::InvalidKey {
                    type_name: schema.name(ty).to_owned(),
                    key: key.to_owned(),
                    reason: "no such field".into(),
                }));
            };
            if slots[index].is_some() {
                return Err(Error::new(ErrorKind::RepeatedMapKey {
                    key: key.to_owned(),
                }));
            }
            let mut slot = Data::Null;
            store(schema, st.field(index).ty(), View::Repr, &mut slot, Scalar::Str(value))?;
            slots[index] = Some(slot);
        }
    }
    if let Some(err) = missing_fields(st, &slots, View::Repr) {
        return Err(err);
    }
    Ok(Data::Struct(slots))
}

/// The error for required fields left unset, naming all of them.
pub(crate) fn missing_fields(
    st: &StructShape,
    slots: &[Option<Data>],
    view: View,
) -> Option<Error> {
    let fields: Vec<String> = st
        .fields()
        .iter()
        .zip(slots)
        .filter(|(field, slot)| slot.is_none() && !field.optional())
        .map(|(field, _)| match view {
            View::Type => field.name().to_owned(),
            View::Repr => field.key().to_owned(),
        })
        .collect();
    if fields.is_empty() {
        None
    } else {
        Some(Error::new(ErrorKind::MissingRequiredField { fields }))
    }
}

/// The string representation of a string-represented value.
pub(crate) fn render<'a>(
    schema: &'a Schema,
    ty: TypeIx,
    data: &'a Data,
) -> Result<Cow<'a, str>, Error> {
    let not_string = || wrong_kind(schema, ty, View::Repr, "as_string", KindSet::STRING);
    match (schema.get(ty).shape(), data) {
        (_, Data::String(text)) => Ok(Cow::Borrowed(text)),
        (Shape::Enum(en), Data::Enum(member)) => match en.repr() {
            EnumRepr::String(table) => Ok(Cow::Borrowed(table.discriminant(*member))),
            EnumRepr::Int(_) => Err(not_string()),
        },
        (Shape::Struct(st), Data::Struct(slots)) => match st.repr() {
            StructRepr::StringJoin { join } => {
                let mut out = String::new();
                for (i, slot) in slots.iter().enumerate() {
                    if i > 0 {
                        out.push_str(join);
                    }
                    if let Some(value) = slot {
                        out.push_str(&render(schema, st.field(i).ty(), value)?);
                    }
                }
                Ok(Cow::Owned(out))
            }
            StructRepr::StringPairs { inner, entry } => {
                let mut out = String::new();
                for (i, slot) in slots.iter().enumerate() {
                    let Some(value) = slot else { continue };
                    if !out.is_empty() {
                        out.push_str(entry);
                    }
                    out.push_str(st.field(i).key());
                    out.push_str(inner);
                    out.push_str(&render(schema, st.field(i).ty(), value)?);
                }
                Ok(Cow::Owned(out))
            }
            _ => Err(not_string()),
        },
        (Shape::Union(union), Data::Union(chosen)) => match union.repr() {
            UnionRepr::StringPrefix(table) => {
                let rest = render(schema, union.member(chosen.member), &chosen.value)?;
                Ok(Cow::Owned(format!("{}{rest}", table.discriminant(chosen.member))))
            }
            UnionRepr::Kinded(_) => render(schema, union.member(chosen.member), &chosen.value),
            _ => Err(not_string()),
        },
        _ => Err(not_string()),
    }
}

/// The bytes representation of a bytes-represented value.
pub(crate) fn render_bytes<'a>(
    schema: &'a Schema,
    ty: TypeIx,
    data: &'a Data,
) -> Result<Cow<'a, [u8]>, Error> {
    match (schema.get(ty).shape(), data) {
        (_, Data::Bytes(bytes)) => Ok(Cow::Borrowed(bytes)),
        (Shape::Union(union), Data::Union(chosen)) => match union.repr() {
            UnionRepr::BytePrefix(table) => {
                let rest = render_bytes(schema, union.member(chosen.member), &chosen.value)?;
                let mut out = Vec::with_capacity(rest.len() + 1);
                out.push(*table.discriminant(chosen.member));
                out.extend_from_slice(&rest);
                Ok(Cow::Owned(out))
            }
            UnionRepr::Kinded(_) => {
                render_bytes(schema, union.member(chosen.member), &chosen.value)
            }
            _ => Err(wrong_kind(schema, ty, View::Repr, "as_bytes", KindSet::BYTES)),
        },
        _ => Err(wrong_kind(schema, ty, View::Repr, "as_bytes", KindSet::BYTES)),
    }
}

/// View in which map keys of `key` are parsed from strings.
///
/// Keys whose type has no string form at the type level (structs and
/// unions) are always read through their representation.
pub(crate) fn key_view(schema: &Schema, key: TypeIx, view: View) -> View {
    if view.kinds(schema, key).has(Kind::String) {
        view
    } else {
        View::Repr
    }
}

/// Parse a map key from its string form, returning the stored key and its
/// canonical representation string.
pub(crate) fn parse_key(
    schema: &Schema,
    key: TypeIx,
    view: View,
    text: &str,
) -> Result<(Data, String), Error> {
    let mut parsed = Data::Null;
    store(schema, key, key_view(schema, key, view), &mut parsed, Scalar::Str(text))?;
    let repr = render(schema, key, &parsed)?.into_owned();
    Ok((parsed, repr))
}

/// Representation string identifying the key `text` of a map keyed by `key`.
pub(crate) fn key_identity<'t>(
    schema: &Schema,
    key: TypeIx,
    view: View,
    text: &'t str,
) -> Result<Cow<'t, str>, Error> {
    match schema.get(key).shape() {
        Shape::Any | Shape::Scalar(Kind::String) => Ok(Cow::Borrowed(text)),
        _ => Ok(Cow::Owned(parse_key(schema, key, view, text)?.1)),
    }
}
