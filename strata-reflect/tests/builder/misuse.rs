//! Calling assemblers out of order is a programming error and panics.

use strata_reflect::Builder;
use strata_schema::{Schema, TypeSystem};
use strata_testhelpers::test;

fn schema() -> Schema {
    let mut ts = TypeSystem::new();
    ts.spawn_map("Scores", "String", "Int", false)
        .spawn_list("Names", "String", false);
    ts.compile().unwrap()
}

#[test]
#[should_panic(expected = "while its key is unassigned")]
fn assemble_key_twice() {
    let schema = schema();
    let scores = schema.type_by_name("Scores").unwrap();
    let mut builder = Builder::new(&schema, scores);
    let mut node = builder.assembler();
    let mut map = node.begin_map(0).unwrap();
    let _ = map.assemble_key();
    let _ = map.assemble_key();
}

#[test]
#[should_panic(expected = "out of order")]
fn value_without_key() {
    let schema = schema();
    let scores = schema.type_by_name("Scores").unwrap();
    let mut builder = Builder::new(&schema, scores);
    let mut node = builder.assembler();
    let mut map = node.begin_map(0).unwrap();
    let _ = map.assemble_value();
}

#[test]
#[should_panic(expected = "is unfinished")]
fn finish_with_unfinished_value() {
    let schema = schema();
    let scores = schema.type_by_name("Scores").unwrap();
    let mut builder = Builder::new(&schema, scores);
    let mut node = builder.assembler();
    let mut map = node.begin_map(0).unwrap();
    let _ = map.assemble_entry("a").unwrap();
    let _ = map.finish();
}

#[test]
#[should_panic(expected = "after it was finished")]
fn list_used_after_finish() {
    let schema = schema();
    let names = schema.type_by_name("Names").unwrap();
    let mut builder = Builder::new(&schema, names);
    let mut node = builder.assembler();
    let mut list = node.begin_list(0).unwrap();
    list.finish().unwrap();
    let _ = list.assemble_value();
}

#[test]
#[should_panic(expected = "already assigned")]
fn scalar_assigned_twice() {
    let schema = schema();
    let names = schema.type_by_name("Names").unwrap();
    let mut builder = Builder::new(&schema, names);
    let mut node = builder.assembler();
    let mut list = node.begin_list(1).unwrap();
    let mut item = list.assemble_value().unwrap();
    item.assign_string("a").unwrap();
    let _ = item.assign_string("b");
}

#[test]
#[should_panic(expected = "before the Names value was finished")]
fn build_before_finish() {
    let schema = schema();
    let names = schema.type_by_name("Names").unwrap();
    let mut builder = Builder::new(&schema, names);
    {
        let mut node = builder.assembler();
        let _ = node.begin_list(0).unwrap();
    }
    let _ = builder.build();
}

#[test]
#[should_panic(expected = "call reset first")]
fn assembler_requested_twice() {
    let schema = schema();
    let names = schema.type_by_name("Names").unwrap();
    let mut builder = Builder::new(&schema, names);
    let _ = builder.assembler().begin_list(0).unwrap().finish();
    let _ = builder.assembler();
}
