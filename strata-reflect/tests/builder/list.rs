use serde_json::json;
use strata_core::{ErrorKind, Node, PathSegment, deep_equal};
use strata_reflect::{Builder, View};
use strata_schema::{Schema, StructField, StructRepresentation, TypeSystem};
use strata_testhelpers::{IPanic, test};

use crate::common::{build, encode, repr, typed};

fn schema() -> Schema {
    let mut ts = TypeSystem::new();
    ts.spawn_list("Names", "String", false)
        .spawn_list("Holes", "Int", true)
        .spawn_struct(
            "Row",
            [
                StructField::new("foo", "String"),
                StructField::new("bar", "String").nullable(),
                StructField::new("baz", "String").optional(),
                StructField::new("qux", "String").optional().nullable(),
            ],
            StructRepresentation::Tuple,
        )
        .spawn_struct(
            "Options",
            [
                StructField::new("depth", "Int"),
                StructField::new("label", "String").optional(),
                StructField::new("parent", "String").optional().nullable(),
            ],
            StructRepresentation::ListPairs,
        );
    ts.compile().unwrap()
}

#[test]
fn list_of_strings() -> Result<(), IPanic> {
    let schema = schema();
    let value = typed(&schema, "Names", json!(["a", "b", "c"]));
    let node = value.node();
    assert_eq!(node.length(), 3);
    assert_eq!(node.lookup_by_index(2)?.as_string()?, "c");
    assert_eq!(
        node.lookup_by_index(3).unwrap_err().kind,
        ErrorKind::NotExists {
            segment: PathSegment::Index(3)
        }
    );
    assert!(deep_equal(&value.node(), &value.repr()));
    Ok(())
}

#[test]
fn list_elements_are_checked() {
    let schema = schema();

    let err = build(&schema, "Names", View::Type, json!(["a", null])).unwrap_err();
    assert_eq!(err.path.to_string(), "1");

    let value = typed(&schema, "Holes", json!([1, null, 3]));
    assert_eq!(encode(&value.node()), json!([1, null, 3]));
}

#[test]
fn tuple_trailing_absent_fields_are_omitted() -> Result<(), IPanic> {
    let schema = schema();
    let from_type = typed(&schema, "Row", json!({"foo": "0", "bar": null}));
    assert_eq!(encode(&from_type.repr()), json!(["0", null]));
    assert_eq!(from_type.repr().length(), 2);

    let from_repr = repr(&schema, "Row", json!(["0", null]));
    let node = from_repr.node();
    assert!(node.lookup_by_string("bar")?.is_null());
    assert!(node.lookup_by_string("baz")?.is_absent());
    assert!(node.lookup_by_string("qux")?.is_absent());
    assert!(deep_equal(&from_type.node(), &from_repr.node()));
    Ok(())
}

#[test]
fn tuple_interior_absent_travels_as_null() -> Result<(), IPanic> {
    let schema = schema();
    let from_type = typed(
        &schema,
        "Row",
        json!({"foo": "0", "bar": "1", "qux": "q"}),
    );
    assert_eq!(encode(&from_type.repr()), json!(["0", "1", null, "q"]));
    assert!(from_type.repr().lookup_by_index(2)?.is_null());

    let from_repr = repr(&schema, "Row", json!(["0", "1", null, "q"]));
    assert!(from_repr.node().lookup_by_string("baz")?.is_absent());
    assert!(deep_equal(&from_type.node(), &from_repr.node()));

    let last_null = repr(&schema, "Row", json!(["0", "1", "2", null]));
    assert!(last_null.node().lookup_by_string("qux")?.is_null());
    assert_eq!(last_null.repr().length(), 4);
    Ok(())
}

#[test]
fn tuple_arity() {
    let schema = schema();

    let err = build(&schema, "Row", View::Repr, json!(["0"])).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"missing required fields: bar");

    let err = build(&schema, "Row", View::Repr, json!(["0", null, "a", "b", "c"])).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"could not match representation of Row: expected at most 4 elements"
    );
}

#[test]
fn tuple_is_a_map_at_the_type_level() {
    let schema = schema();
    let err = build(&schema, "Row", View::Type, json!(["0", null])).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::WrongKind {
            method: "begin_list",
            ..
        }
    ));
}

#[test]
fn list_pairs() -> Result<(), IPanic> {
    let schema = schema();
    let from_repr = repr(
        &schema,
        "Options",
        json!([["label", "x"], ["depth", 2]]),
    );
    let node = from_repr.node();
    assert_eq!(node.lookup_by_string("depth")?.as_int()?, 2);
    assert_eq!(node.lookup_by_string("label")?.as_string()?, "x");
    assert!(node.lookup_by_string("parent")?.is_absent());

    // pairs come out in field order, absent fields left out
    assert_eq!(
        encode(&from_repr.repr()),
        json!([["depth", 2], ["label", "x"]])
    );
    assert_eq!(from_repr.repr().length(), 2);

    let from_type = typed(&schema, "Options", json!({"depth": 2, "label": "x"}));
    assert!(deep_equal(&from_type.repr(), &from_repr.repr()));
    Ok(())
}

#[test]
fn list_pairs_null_value() -> Result<(), IPanic> {
    let schema = schema();
    let value = repr(&schema, "Options", json!([["depth", 1], ["parent", null]]));
    assert!(value.node().lookup_by_string("parent")?.is_null());
    assert_eq!(encode(&value.repr()), json!([["depth", 1], ["parent", null]]));
    Ok(())
}

#[test]
fn list_pairs_errors() {
    let schema = schema();

    let err = build(&schema, "Options", View::Repr, json!([["depth", 1], ["size", 2]]))
        .unwrap_err();
    insta::assert_snapshot!(err.to_string(), @r#"invalid key "size" for Options: no such field"#);

    let err =
        build(&schema, "Options", View::Repr, json!([["depth", 1], ["depth", 2]])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RepeatedMapKey { key: "depth".into() });

    let err = build(&schema, "Options", View::Repr, json!([["depth"]])).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"could not match representation of Options: entry 0 is not a [key, value] pair"
    );

    let err = build(&schema, "Options", View::Repr, json!([["label", "x"]])).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::MissingRequiredField {
            fields: vec!["depth".into()]
        }
    );
}

#[test]
fn size_hint_is_only_a_hint() -> Result<(), IPanic> {
    let schema = schema();
    let names = schema.type_by_name("Names").unwrap();
    for hint in [-1, 0, 1, 1 << 40] {
        let mut builder = Builder::new(&schema, names);
        let mut node = builder.assembler();
        let mut list = node.begin_list(hint)?;
        list.assemble_value()?.assign_string("a")?;
        list.assemble_value()?.assign_string("b")?;
        list.finish()?;
        assert_eq!(encode(&builder.build().node()), json!(["a", "b"]));
    }
    Ok(())
}
