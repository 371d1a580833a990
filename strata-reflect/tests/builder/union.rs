use serde_json::json;
use strata_core::{ErrorKind, Kind, KindSet, Node, deep_equal};
use strata_reflect::{Builder, View};
use strata_schema::{
    EnumRepresentation, Schema, StructField, StructRepresentation, TypeSystem,
    UnionRepresentation,
};
use strata_testhelpers::{IPanic, test};

use crate::common::{build, encode, repr, typed};

fn schema() -> Schema {
    let mut ts = TypeSystem::new();
    ts.spawn_struct(
        "Circle",
        [StructField::new("radius", "Int")],
        StructRepresentation::map(),
    )
    .spawn_struct(
        "Square",
        [
            StructField::new("side", "Int"),
            StructField::new("label", "String").optional(),
        ],
        StructRepresentation::map(),
    )
    .spawn_union(
        "Keyed",
        ["Circle", "Square"],
        UnionRepresentation::keyed([("circle", "Circle"), ("square", "Square")]),
    )
    .spawn_union(
        "Enveloped",
        ["Circle", "Square"],
        UnionRepresentation::envelope("tag", "content", [("c", "Circle"), ("s", "Square")]),
    )
    .spawn_union(
        "Inlined",
        ["Circle", "Square"],
        UnionRepresentation::inline("shape", [("circle", "Circle"), ("square", "Square")]),
    )
    .spawn_union("Loose", ["Text", "Circle", "Numbers"], UnionRepresentation::Kinded)
    .spawn_scalar("Text", Kind::String)
    .spawn_list("Numbers", "Int", false)
    .spawn_scalar("Sha", Kind::Bytes)
    .spawn_scalar("Blake", Kind::Bytes)
    .spawn_union(
        "Digest",
        ["Sha", "Blake"],
        UnionRepresentation::byte_prefix([(0x12, "Sha"), (0x1e, "Blake")]),
    )
    .spawn_scalar("User", Kind::String)
    .spawn_scalar("Group", Kind::String)
    .spawn_union(
        "Principal",
        ["User", "Group"],
        UnionRepresentation::string_prefix([("u:", "User"), ("g:", "Group")]),
    )
    .spawn_enum(
        "Color",
        ["Red", "Green"],
        EnumRepresentation::String(vec![("Red".into(), "r".into())]),
    )
    .spawn_int_enum("Level", [("Low", 1), ("High", 10)]);
    ts.compile().unwrap()
}

#[test]
fn keyed_union() -> Result<(), IPanic> {
    let schema = schema();
    let from_repr = repr(&schema, "Keyed", json!({"square": {"side": 2}}));
    let from_type = typed(&schema, "Keyed", json!({"Square": {"side": 2}}));
    assert!(deep_equal(&from_type.node(), &from_repr.node()));

    assert_eq!(encode(&from_repr.node()), json!({"Square": {"side": 2}}));
    assert_eq!(encode(&from_repr.repr()), json!({"square": {"side": 2}}));
    assert_eq!(
        from_repr
            .repr()
            .lookup_by_string("square")?
            .lookup_by_string("side")?
            .as_int()?,
        2
    );
    Ok(())
}

#[test]
fn union_takes_exactly_one_member() {
    let schema = schema();

    let err = build(&schema, "Keyed", View::Repr, json!({})).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"union Keyed requires exactly one member, got 0");

    let err = build(
        &schema,
        "Keyed",
        View::Repr,
        json!({"circle": {"radius": 1}, "square": {"side": 2}}),
    )
    .unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::NotUnionStructure {
            type_name: "Keyed".into(),
            members: 2
        }
    );

    let err = build(&schema, "Keyed", View::Repr, json!({"Circle": {"radius": 1}})).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @r#"invalid key "Circle" for Keyed: no such member"#);
}

#[test]
fn envelope_ignores_key_order() -> Result<(), IPanic> {
    let schema = schema();
    let first = repr(
        &schema,
        "Enveloped",
        json!({"tag": "c", "content": {"radius": 3}}),
    );
    let last = repr(
        &schema,
        "Enveloped",
        json!({"content": {"radius": 3}, "tag": "c"}),
    );
    assert!(deep_equal(&first.node(), &last.node()));
    assert!(deep_equal(&first.repr(), &last.repr()));

    assert_eq!(
        encode(&last.repr()),
        json!({"tag": "c", "content": {"radius": 3}})
    );
    assert_eq!(encode(&last.node()), json!({"Circle": {"radius": 3}}));
    assert_eq!(last.repr().lookup_by_string("tag")?.as_string()?, "c");
    assert_eq!(last.repr().length(), 2);
    Ok(())
}

#[test]
fn envelope_errors() {
    let schema = schema();

    let err = build(&schema, "Enveloped", View::Repr, json!({"tag": "x", "content": {}}))
        .unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @r#"could not match representation of Enveloped: unknown discriminant "x""#
    );

    let err = build(&schema, "Enveloped", View::Repr, json!({"tag": "c"})).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @r#"could not match representation of Enveloped: missing content key "content""#
    );

    let err = build(
        &schema,
        "Enveloped",
        View::Repr,
        json!({"tag": "c", "content": {"radius": 1}, "extra": 1}),
    )
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Unmatchable { .. }));

    let err = build(
        &schema,
        "Enveloped",
        View::Repr,
        json!({"content": {"side": 1}, "tag": "c"}),
    )
    .unwrap_err();
    assert_eq!(err.path.to_string(), "content");
}

#[test]
fn inline_ignores_key_order() -> Result<(), IPanic> {
    let schema = schema();
    let first = repr(
        &schema,
        "Inlined",
        json!({"shape": "square", "side": 4, "label": "x"}),
    );
    let last = repr(
        &schema,
        "Inlined",
        json!({"label": "x", "side": 4, "shape": "square"}),
    );
    assert!(deep_equal(&first.node(), &last.node()));

    assert_eq!(
        encode(&last.repr()),
        json!({"shape": "square", "side": 4, "label": "x"})
    );
    assert_eq!(last.repr().length(), 3);
    assert_eq!(last.repr().lookup_by_string("side")?.as_int()?, 4);
    assert_eq!(last.repr().lookup_by_string("shape")?.as_string()?, "square");

    let from_type = typed(
        &schema,
        "Inlined",
        json!({"Square": {"side": 4, "label": "x"}}),
    );
    assert!(deep_equal(&from_type.repr(), &first.repr()));
    Ok(())
}

#[test]
fn inline_errors() {
    let schema = schema();

    let err = build(&schema, "Inlined", View::Repr, json!({"side": 4})).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @r#"could not match representation of Inlined: missing discriminant key "shape""#
    );

    let err = build(&schema, "Inlined", View::Repr, json!({"shape": 1, "side": 4})).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"could not match representation of Inlined: discriminant must be a string, found int"
    );

    let err =
        build(&schema, "Inlined", View::Repr, json!({"shape": "circle", "side": 4})).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidKey { .. }));
}

#[test]
fn kinded_union_behaves_like_its_member() -> Result<(), IPanic> {
    let schema = schema();

    let map = repr(&schema, "Loose", json!({"radius": 5}));
    let circle = repr(&schema, "Circle", json!({"radius": 5}));
    assert_eq!(map.repr().kind(), Kind::Map);
    assert_eq!(map.repr().type_name(), "Circle");
    assert_eq!(map.repr().lookup_by_string("radius")?.as_int()?, 5);
    assert!(deep_equal(&map.repr(), &circle.repr()));
    assert_eq!(encode(&map.node()), json!({"Circle": {"radius": 5}}));

    let text = repr(&schema, "Loose", json!("hi"));
    assert_eq!(text.repr().as_string()?, "hi");
    assert_eq!(encode(&text.node()), json!({"Text": "hi"}));

    let list = repr(&schema, "Loose", json!([1, 2]));
    assert_eq!(list.repr().length(), 2);
    assert_eq!(list.repr().lookup_by_index(1)?.as_int()?, 2);

    let from_type = typed(&schema, "Loose", json!({"Numbers": [1, 2]}));
    assert!(deep_equal(&from_type.repr(), &list.repr()));
    Ok(())
}

#[test]
fn kinded_union_rejects_unrepresented_kinds() {
    let schema = schema();
    let err = build(&schema, "Loose", View::Repr, json!(true)).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::WrongKind {
            type_name: "Loose".into(),
            method: "assign_bool",
            appropriate: KindSet::STRING | KindSet::MAP | KindSet::LIST,
            actual: Kind::Bool,
        }
    );
}

#[test]
fn byte_prefix() -> Result<(), IPanic> {
    let schema = schema();
    let digest = schema.type_by_name("Digest").unwrap();
    let mut builder = Builder::for_repr(&schema, digest);
    builder.assembler().assign_bytes(&[0x1e, 0xaa, 0xbb])?;
    let value = builder.build();

    assert_eq!(value.repr().kind(), Kind::Bytes);
    assert_eq!(&*value.repr().as_bytes()?, &[0x1e, 0xaa, 0xbb]);
    assert_eq!(&*value.node().lookup_by_string("Blake")?.as_bytes()?, &[0xaa, 0xbb]);

    let mut builder = Builder::for_repr(&schema, digest);
    let err = builder.assembler().assign_bytes(&[]).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"could not match representation of Digest: no discriminant byte"
    );
    let err = builder.assembler().assign_bytes(&[0x00]).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"could not match representation of Digest: unknown discriminant byte 0x00"
    );
    Ok(())
}

#[test]
fn string_prefix() -> Result<(), IPanic> {
    let schema = schema();
    let value = repr(&schema, "Principal", json!("g:admins"));
    assert_eq!(value.repr().as_string()?, "g:admins");
    assert_eq!(encode(&value.node()), json!({"Group": "admins"}));

    let from_type = typed(&schema, "Principal", json!({"Group": "admins"}));
    assert!(deep_equal(&from_type.repr(), &value.repr()));

    let err = build(&schema, "Principal", View::Repr, json!("x:admins")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Unmatchable { .. }));
    Ok(())
}

#[test]
fn string_enum() -> Result<(), IPanic> {
    let schema = schema();
    let red = repr(&schema, "Color", json!("r"));
    assert_eq!(red.node().as_string()?, "Red");
    assert_eq!(red.repr().as_string()?, "r");

    let green = typed(&schema, "Color", json!("Green"));
    assert_eq!(green.repr().as_string()?, "Green");

    let err = build(&schema, "Color", View::Type, json!("r")).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @r#"could not match representation of Color: no member named "r""#
    );
    let err = build(&schema, "Color", View::Repr, json!("Red")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Unmatchable { .. }));
    Ok(())
}

#[test]
fn int_enum() -> Result<(), IPanic> {
    let schema = schema();
    let high = repr(&schema, "Level", json!(10));
    assert_eq!(high.node().as_string()?, "High");
    assert_eq!(high.repr().kind(), Kind::Int);
    assert_eq!(high.repr().as_int()?, 10);

    let low = typed(&schema, "Level", json!("Low"));
    assert_eq!(low.repr().as_int()?, 1);

    let err = build(&schema, "Level", View::Repr, json!(3)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Unmatchable { .. }));
    let err = build(&schema, "Level", View::Repr, json!("High")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::WrongKind { .. }));
    Ok(())
}
