use serde_json::json;
use strata_core::{ErrorKind, Kind, Node, PathSegment, deep_equal};
use strata_reflect::View;
use strata_schema::{Schema, StructField, StructRepresentation, TypeSystem};
use strata_testhelpers::{IPanic, test};

use crate::common::{build, encode, repr, typed};

fn schema() -> Schema {
    let mut ts = TypeSystem::new();
    ts.spawn_struct(
        "Pair",
        [StructField::new("foo", "String"), StructField::new("bar", "String")],
        StructRepresentation::string_join(":"),
    )
    .spawn_struct(
        "Tagged",
        [StructField::new("tag", "String"), StructField::new("pair", "Pair")],
        StructRepresentation::string_join("-"),
    )
    .spawn_struct(
        "Attrs",
        [
            StructField::new("a", "String"),
            StructField::new("b", "String").optional(),
        ],
        StructRepresentation::string_pairs("=", ","),
    )
    .spawn_struct(
        "Inner",
        [StructField::new("x", "Int")],
        StructRepresentation::map_renamed([("x", "X")]),
    )
    .spawn_struct(
        "Outer",
        [
            StructField::new("inner", "Inner"),
            StructField::new("attrs", "Attrs").optional(),
        ],
        StructRepresentation::map_renamed([("inner", "in")]),
    );
    ts.compile().unwrap()
}

#[test]
fn string_join() -> Result<(), IPanic> {
    let schema = schema();
    let from_type = typed(&schema, "Pair", json!({"foo": "v1", "bar": "v2"}));
    assert_eq!(from_type.repr().kind(), Kind::String);
    assert_eq!(from_type.repr().as_string()?, "v1:v2");

    let from_repr = repr(&schema, "Pair", json!("v1:v2"));
    assert_eq!(from_repr.node().lookup_by_string("bar")?.as_string()?, "v2");
    assert!(deep_equal(&from_type.node(), &from_repr.node()));

    let err = build(&schema, "Pair", View::Repr, json!("v1:v2:v3")).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @r#"could not match representation of Pair: expected 2 fields joined by ":", found 3"#
    );
    Ok(())
}

#[test]
fn string_join_nests() -> Result<(), IPanic> {
    let schema = schema();
    let value = repr(&schema, "Tagged", json!("t-1:2"));
    let pair = value.node().lookup_by_string("pair")?;
    assert_eq!(pair.lookup_by_string("foo")?.as_string()?, "1");
    assert_eq!(value.repr().as_string()?, "t-1:2");
    assert_eq!(
        encode(&value.node()),
        json!({"tag": "t", "pair": {"foo": "1", "bar": "2"}})
    );
    Ok(())
}

#[test]
fn string_pairs() -> Result<(), IPanic> {
    let schema = schema();
    let both = repr(&schema, "Attrs", json!("b=2,a=1"));
    assert_eq!(both.node().lookup_by_string("a")?.as_string()?, "1");
    assert_eq!(both.repr().as_string()?, "a=1,b=2");

    let one = typed(&schema, "Attrs", json!({"a": "1"}));
    assert_eq!(one.repr().as_string()?, "a=1");
    assert!(one.node().lookup_by_string("b")?.is_absent());
    Ok(())
}

#[test]
fn string_pairs_errors() {
    let schema = schema();

    let err = build(&schema, "Attrs", View::Repr, json!("b=2")).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::MissingRequiredField {
            fields: vec!["a".into()]
        }
    );
    let err = build(&schema, "Attrs", View::Repr, json!("")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingRequiredField { .. }));

    let err = build(&schema, "Attrs", View::Repr, json!("a")).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @r#"could not match representation of Attrs: entry "a" lacks "=""#
    );
    let err = build(&schema, "Attrs", View::Repr, json!("a=1,a=2")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RepeatedMapKey { key: "a".into() });
    let err = build(&schema, "Attrs", View::Repr, json!("a=1,c=2")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidKey { .. }));
}

#[test]
fn lookups_stay_at_the_representation_level() -> Result<(), IPanic> {
    let schema = schema();
    let value = typed(
        &schema,
        "Outer",
        json!({"inner": {"x": 4}, "attrs": {"a": "1"}}),
    );
    let outer = value.repr();

    let inner = outer.lookup_by_string("in")?;
    assert_eq!(inner.lookup_by_string("X")?.as_int()?, 4);
    assert_eq!(
        inner.lookup_by_string("x").unwrap_err().kind,
        ErrorKind::NotExists {
            segment: PathSegment::Key("x".into())
        }
    );
    assert_eq!(outer.lookup_by_string("attrs")?.as_string()?, "a=1");
    assert!(outer.lookup_by_string("inner").is_err());

    let keys: Vec<String> = outer
        .map_iterator()?
        .map(|(key, _)| key.as_string().unwrap().into_owned())
        .collect();
    assert_eq!(keys, ["in", "attrs"]);

    assert_eq!(encode(&outer), json!({"in": {"X": 4}, "attrs": "a=1"}));
    Ok(())
}

#[test]
fn repr_node_copies_into_the_other_level() -> Result<(), IPanic> {
    let schema = schema();
    let original = typed(
        &schema,
        "Outer",
        json!({"inner": {"x": 4}, "attrs": {"a": "1", "b": "2"}}),
    );
    let copied = repr(&schema, "Outer", encode(&original.repr()));
    assert!(deep_equal(&original.node(), &copied.node()));
    Ok(())
}

#[test]
fn unset_optional_fields_only_exist_at_the_type_level() -> Result<(), IPanic> {
    let schema = schema();
    let value = typed(&schema, "Outer", json!({"inner": {"x": 4}}));

    assert_eq!(value.node().length(), 2);
    assert!(value.node().lookup_by_string("attrs")?.is_absent());

    assert_eq!(value.repr().length(), 1);
    assert_eq!(value.repr().map_iterator()?.count(), 1);
    assert_eq!(
        value.repr().lookup_by_string("attrs").unwrap_err().kind,
        ErrorKind::NotExists {
            segment: PathSegment::Key("attrs".into())
        }
    );
    Ok(())
}
