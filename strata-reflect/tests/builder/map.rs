use serde_json::json;
use strata_core::{ErrorKind, Node, deep_equal};
use strata_reflect::{Builder, View};
use strata_schema::{Schema, StructField, StructRepresentation, TypeSystem};
use strata_testhelpers::{IPanic, test};

use crate::common::{build, encode, repr, typed};

fn people() -> Schema {
    let mut ts = TypeSystem::new();
    ts.spawn_struct(
        "Person",
        [
            StructField::new("name", "String"),
            StructField::new("age", "Int").optional(),
            StructField::new("nickname", "String").optional().nullable(),
            StructField::new("friends", "People").optional(),
        ],
        StructRepresentation::map_renamed([("nickname", "nick")]),
    )
    .spawn_list("People", "Person", false)
    .spawn_map("Scores", "String", "Int", true)
    .spawn_struct(
        "Triple",
        [
            StructField::new("a", "Int"),
            StructField::new("b", "Int"),
            StructField::new("c", "Int").optional(),
        ],
        StructRepresentation::map_renamed([("a", "alpha")]),
    );
    ts.compile().unwrap()
}

#[test]
fn type_and_repr_assembly_agree() {
    let schema = people();
    let from_type = typed(
        &schema,
        "Person",
        json!({"name": "Ann", "nickname": "A", "age": 31}),
    );
    let from_repr = repr(
        &schema,
        "Person",
        json!({"nick": "A", "age": 31, "name": "Ann"}),
    );

    assert!(deep_equal(&from_type.node(), &from_repr.node()));
    assert!(deep_equal(&from_type.repr(), &from_repr.repr()));
    assert_eq!(
        encode(&from_type.repr()),
        json!({"name": "Ann", "age": 31, "nick": "A"})
    );
}

#[test]
fn renamed_key_is_unknown_at_the_other_level() {
    let schema = people();

    let err = build(&schema, "Person", View::Type, json!({"name": "Ann", "nick": "A"}))
        .unwrap_err();
    insta::assert_snapshot!(err.to_string(), @r#"invalid key "nick" for Person: no such field"#);

    let err = build(&schema, "Person", View::Repr, json!({"name": "Ann", "nickname": "A"}))
        .unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @r#"invalid key "nickname" for Person: no such field"#
    );
}

#[test]
fn nested_values() -> Result<(), IPanic> {
    let schema = people();
    let value = typed(
        &schema,
        "Person",
        json!({
            "name": "Ann",
            "friends": [{"name": "Bob", "age": 7}, {"name": "Cy", "nickname": null}],
        }),
    );

    let friends = value.node().lookup_by_string("friends")?;
    assert_eq!(friends.length(), 2);
    let bob = friends.lookup_by_index(0)?;
    assert_eq!(bob.lookup_by_string("age")?.as_int()?, 7);
    assert!(friends.lookup_by_index(1)?.lookup_by_string("nickname")?.is_null());

    assert_eq!(
        encode(&value.repr()),
        json!({
            "name": "Ann",
            "friends": [{"name": "Bob", "age": 7}, {"name": "Cy", "nick": null}],
        })
    );
    Ok(())
}

#[test]
fn repeated_entry_keeps_first_value() -> Result<(), IPanic> {
    let schema = people();
    let scores = schema.type_by_name("Scores").unwrap();
    let mut builder = Builder::new(&schema, scores);
    let mut node = builder.assembler();
    let mut map = node.begin_map(2)?;
    map.assemble_entry("a")?.assign_int(1)?;

    let err = map.assemble_entry("a").err().unwrap();
    assert_eq!(err.kind, ErrorKind::RepeatedMapKey { key: "a".into() });

    map.assemble_entry("b")?.assign_int(2)?;
    map.finish()?;

    let value = builder.build();
    assert_eq!(value.node().lookup_by_string("a")?.as_int()?, 1);
    assert_eq!(value.node().length(), 2);
    Ok(())
}

#[test]
fn rejected_key_rolls_back() -> Result<(), IPanic> {
    let schema = people();
    let scores = schema.type_by_name("Scores").unwrap();
    let mut builder = Builder::new(&schema, scores);
    let mut node = builder.assembler();
    let mut map = node.begin_map(0)?;

    map.assemble_key().assign_string("a")?;
    map.assemble_value().assign_int(1)?;
    let err = map.assemble_key().assign_string("a").unwrap_err();
    insta::assert_snapshot!(err.to_string(), @r#"cannot repeat map key "a""#);

    map.assemble_key().assign_string("b")?;
    map.assemble_value().assign_null()?;
    map.finish()?;

    let value = builder.build();
    assert_eq!(encode(&value.node()), json!({"a": 1, "b": null}));
    Ok(())
}

#[test]
fn repeated_struct_field() -> Result<(), IPanic> {
    let schema = people();
    let person = schema.type_by_name("Person").unwrap();
    let mut builder = Builder::new(&schema, person);
    let mut node = builder.assembler();
    let mut map = node.begin_map(1)?;
    map.assemble_entry("name")?.assign_string("Ann")?;

    let err = map.assemble_entry("name").err().unwrap();
    assert_eq!(err.kind, ErrorKind::RepeatedMapKey { key: "name".into() });
    map.finish()?;

    let value = builder.build();
    assert_eq!(value.node().lookup_by_string("name")?.as_string()?, "Ann");
    Ok(())
}

#[test]
fn missing_fields_are_reported_together() {
    let schema = people();

    let err = build(&schema, "Triple", View::Type, json!({"c": 1})).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::MissingRequiredField {
            fields: vec!["a".into(), "b".into()]
        }
    );
    insta::assert_snapshot!(err.to_string(), @"missing required fields: a,b");

    let err = build(&schema, "Triple", View::Repr, json!({})).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"missing required fields: alpha,b");
}

#[test]
fn errors_name_the_failing_location() {
    let schema = people();

    let err = build(
        &schema,
        "Person",
        View::Type,
        json!({"name": "Ann", "friends": [{"name": "Bob"}, {"name": "Cy"}, {"age": 3}]}),
    )
    .unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"missing required fields: name (at friends/2)");

    let err = build(&schema, "Person", View::Type, json!({"name": 5})).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"func called on wrong kind: assign_int called on a String node (kind: string), but only makes sense on int (at name)"
    );

    let err = build(&schema, "Scores", View::Type, json!({"x": 1, "y": "two"})).unwrap_err();
    assert_eq!(err.path.to_string(), "y");
}

#[test]
fn null_only_where_admitted() {
    let schema = people();

    assert!(build(&schema, "Scores", View::Type, json!({"x": null})).is_ok());

    let err = build(&schema, "Person", View::Type, json!({"name": null})).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::WrongKind {
            method: "assign_null",
            ..
        }
    ));
    assert_eq!(err.path.to_string(), "name");
}

#[test]
fn failed_assignment_leaves_assembler_usable() -> Result<(), IPanic> {
    let schema = people();
    let person = schema.type_by_name("Person").unwrap();
    let mut builder = Builder::new(&schema, person);
    let mut node = builder.assembler();
    let mut map = node.begin_map(1)?;

    let mut name = map.assemble_entry("name")?;
    assert!(name.assign_int(1).is_err());
    assert!(name.begin_list(0).is_err());
    name.assign_string("Ann")?;
    map.finish()?;

    assert!(builder.is_finished());
    let value = builder.build();
    assert_eq!(encode(&value.repr()), json!({"name": "Ann"}));
    Ok(())
}

#[test]
fn builder_reset_discards_progress() -> Result<(), IPanic> {
    let schema = people();
    let person = schema.type_by_name("Person").unwrap();
    let mut builder = Builder::new(&schema, person);
    {
        let mut node = builder.assembler();
        let mut map = node.begin_map(1)?;
        map.assemble_entry("age")?.assign_int(3)?;
    }
    assert!(!builder.is_finished());

    builder.reset();
    {
        let mut node = builder.assembler();
        let mut map = node.begin_map(1)?;
        map.assemble_entry("name")?.assign_string("Dee")?;
        map.finish()?;
    }
    let value = builder.build();
    assert_eq!(encode(&value.repr()), json!({"name": "Dee"}));
    Ok(())
}
