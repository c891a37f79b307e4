use repoql::{
    core::{
        query::{Clock, QuerySpec},
        schema::{DataType, FieldCatalog},
    },
    error::{ErrorKind, ErrorOrigin, QueryErrorKind},
    prelude::*,
};
use std::{sync::Arc, thread};
use time::macros::datetime;

struct Car;
impl ContentHandler for Car {}

fn compiler() -> QueryCompiler {
    QueryCompiler::default()
        .with_type::<Car>("Car")
        .with_clock(Clock::Fixed(datetime!(2026-10-17 08:00 UTC)))
}

fn spec(query: QueryBuilder) -> QuerySpec {
    query.build()
}

#[test]
fn compiles_a_full_query() {
    let compiled = compiler()
        .compile_unscoped(&spec(
            QueryBuilder::new()
                .filter(field("Make").eq("Audi").or(field("Make").eq("BMW")))
                .of_type::<Car>()
                .order_by("Name")
                .take(20)
                .execution_mode(ExecutionMode::Quick),
        ))
        .map_err(|err| err.to_string());

    // `Make` is not a standard field
    assert_eq!(compiled.unwrap_err(), "Schema: unknown field 'Make'");

    let compiler = compiler();
    compiler.update_fields(|catalog| catalog.with_field("Make", DataType::Text));
    let compiled = compiler
        .compile_unscoped(&spec(
            QueryBuilder::new()
                .filter(field("Make").eq("Audi").or(field("Make").eq("BMW")))
                .of_type::<Car>()
                .order_by("Name")
                .take(20)
                .execution_mode(ExecutionMode::Quick),
        ))
        .unwrap();

    assert_eq!(
        compiled.text,
        "+TypeIs:car +(Make:audi Make:bmw) .SORT:Name .TOP:20 .QUICK"
    );
    assert_eq!(compiled.execution_mode, ExecutionMode::Quick);
}

#[test]
fn scope_descriptor_from_json() {
    let scope: ScopeDescriptor = serde_json::from_str(
        r#"{
            "path_usage": "in_folder_or",
            "base_path": "/Root/FakePath",
            "raw_query": "Id:>42",
            "skip_override": 18,
            "top_override": 15,
            "autofilter_override": "disabled"
        }"#,
    )
    .unwrap();
    let query = spec(
        QueryBuilder::new()
            .filter(field("IsFolder").eq(true))
            .skip(8)
            .take(5),
    );

    assert_eq!(
        compiler().compile(&query, &scope).unwrap().text,
        "(+IsFolder:yes +Id:>42) InFolder:/root/fakepath .TOP:15 .SKIP:18 .AUTOFILTERS:OFF"
    );
}

#[test]
fn toml_configuration() {
    let compiler = QueryCompiler::from_toml(
        r#"
        guard_field = "Index"
        unknown_fields = "reject"
        "#,
        r#"
        [fields.Color]
        type = "text"
        "#,
    )
    .unwrap();

    let compiled = compiler
        .compile_unscoped(&spec(QueryBuilder::new().filter(field("Color").ne("Red"))))
        .unwrap();
    assert_eq!(compiled.text, "-Color:red +Index:>0");

    let err = QueryCompiler::from_toml("guard_field = \"\"", "").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Config);

    let err = QueryCompiler::from_toml("", "[fields.X]\ntype = \"blob\"").unwrap_err();
    assert_eq!(err.origin, ErrorOrigin::Schema);
}

#[test]
fn compile_errors_surface_as_query_errors() {
    let err = compiler()
        .compile_unscoped(&spec(
            QueryBuilder::new().filter(field("Name").starts_with(field("DisplayName"))),
        ))
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Query(QueryErrorKind::Unsupported));
    assert_eq!(err.origin, ErrorOrigin::Compiler);
}

#[test]
fn concurrent_compilations_with_catalog_refresh() {
    let compiler = Arc::new(compiler());
    let query = Arc::new(spec(
        QueryBuilder::new().filter(field("Id").lte(4).and(field("Id").ne(2))),
    ));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let compiler = Arc::clone(&compiler);
            let query = Arc::clone(&query);
            thread::spawn(move || {
                for _ in 0..100 {
                    let text = compiler.compile_unscoped(&query).unwrap().text;
                    assert_eq!(text, "-Id:2 +Id:<=4");
                }
            })
        })
        .collect();

    for n in 0..20 {
        compiler.publish_fields(
            FieldCatalog::standard().with_field(&format!("Extra{n}"), DataType::Int),
        );
    }
    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
fn version_is_exported() {
    assert!(!repoql::VERSION.is_empty());
}
