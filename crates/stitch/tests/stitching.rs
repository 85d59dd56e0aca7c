//! Integration tests for composition, the generic node lookup, and joins.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use {
    async_trait::async_trait,
    serde_json::{Value, json},
};

use graphweld_stitch::{
    ComposeError, ExtensionField, Federation, FieldDef, Join, ObjectDef, ResolveResult, Subschema,
    SubschemaResolver, TypeExpr,
};

// ── Fixtures ────────────────────────────────────────────────────────────────

/// Records every resolver call so tests can assert on delegation traffic.
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<(String, Value)>>,
}

impl Recorder {
    fn record(&self, field: &str, args: &Value) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((field.to_string(), args.clone()));
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

struct BooksResolver {
    recorder: Arc<Recorder>,
    data: Vec<Value>,
}

#[async_trait]
impl SubschemaResolver for BooksResolver {
    async fn resolve_field(&self, field: &str, args: Value) -> ResolveResult {
        self.recorder.record(field, &args);
        match field {
            "books" => Ok(Value::Array(self.data.clone())),
            "node" => {
                let id = args.get("id").and_then(Value::as_str).unwrap_or_default();
                Ok(self
                    .data
                    .iter()
                    .find(|book| book["id"] == id)
                    .cloned()
                    .unwrap_or(Value::Null))
            },
            other => Err(format!("unknown field `{other}`")),
        }
    }

    fn node_type(&self, _node: &Value) -> Option<String> {
        Some("Book".to_string())
    }
}

struct AuthorsResolver {
    recorder: Arc<Recorder>,
}

const AUTHOR_NAMES: [&str; 4] = ["Author one", "Author two", "Author three", "Author four"];

fn author_dataset() -> Vec<Value> {
    AUTHOR_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let n = i + 1;
            json!({ "id": format!("Author/uuid-{n}"), "uuid": format!("uuid-{n}"), "name": name })
        })
        .collect()
}

#[async_trait]
impl SubschemaResolver for AuthorsResolver {
    async fn resolve_field(&self, field: &str, args: Value) -> ResolveResult {
        self.recorder.record(field, &args);
        match field {
            "authorsByUuids" => {
                let wanted: Vec<&str> = args
                    .get("uuids")
                    .and_then(Value::as_array)
                    .map(|uuids| uuids.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();
                Ok(Value::Array(
                    author_dataset()
                        .into_iter()
                        .filter(|a| a["uuid"].as_str().is_some_and(|u| wanted.contains(&u)))
                        .collect(),
                ))
            },
            "node" => {
                let id = args.get("id").and_then(Value::as_str).unwrap_or_default();
                Ok(author_dataset()
                    .into_iter()
                    .find(|a| a["id"] == id)
                    .unwrap_or(Value::Null))
            },
            other => Err(format!("unknown field `{other}`")),
        }
    }

    fn node_type(&self, _node: &Value) -> Option<String> {
        Some("Author".to_string())
    }
}

fn book_dataset() -> Vec<Value> {
    vec![
        json!({
            "id": "Book/uuid-1",
            "title": "First book",
            "authorUuids": ["uuid-1", "uuid-2", "uuid-4"],
        }),
        json!({
            "id": "Book/uuid-2",
            "title": "Second book",
            "authorUuids": ["uuid-3", "uuid-4"],
        }),
    ]
}

fn books_subschema_with(recorder: Arc<Recorder>, data: Vec<Value>) -> Subschema {
    Subschema::builder("books", "books", "Books")
        .object(
            ObjectDef::new("Book")
                .implements_node()
                .field("id", TypeExpr::named_nn(TypeExpr::ID))
                .field("title", TypeExpr::named_nn(TypeExpr::STRING))
                .field("authorUuids", TypeExpr::named_nn_list_nn(TypeExpr::STRING)),
        )
        .query_field(FieldDef::new("books", TypeExpr::named_nn_list_nn("Book")))
        .query_field(
            FieldDef::new("node", TypeExpr::named("Node"))
                .argument("id", TypeExpr::named_nn(TypeExpr::ID)),
        )
        // Declared by the provider, dropped by the transformer; composition
        // would fail with a duplicate root field if it survived.
        .query_field(
            FieldDef::new("nodes", TypeExpr::named_list_nn("Node"))
                .argument("ids", TypeExpr::named_nn_list_nn(TypeExpr::ID)),
        )
        .resolver(BooksResolver { recorder, data })
        .build()
        .expect("books subschema")
}

fn books_subschema(recorder: Arc<Recorder>) -> Subschema {
    books_subschema_with(recorder, book_dataset())
}

fn authors_subschema(recorder: Arc<Recorder>) -> Subschema {
    Subschema::builder("authors", "authors", "Authors")
        .object(
            ObjectDef::new("Author")
                .implements_node()
                .field("id", TypeExpr::named_nn(TypeExpr::ID))
                .field("name", TypeExpr::named_nn(TypeExpr::STRING)),
        )
        .query_field(
            FieldDef::new("authorsByUuids", TypeExpr::named_nn_list_nn("Author"))
                .argument("uuids", TypeExpr::named_nn_list_nn(TypeExpr::STRING)),
        )
        .query_field(
            FieldDef::new("node", TypeExpr::named("Node"))
                .argument("id", TypeExpr::named_nn(TypeExpr::ID)),
        )
        .resolver(AuthorsResolver { recorder })
        .build()
        .expect("authors subschema")
}

fn authors_extension() -> ExtensionField {
    ExtensionField::new(
        "books",
        "Book",
        "authors",
        TypeExpr::named_nn_list_nn("Author"),
        Join::new("authorUuids", "authors", "authorsByUuids", "uuids"),
    )
}

fn composed(recorder: &Arc<Recorder>) -> async_graphql::dynamic::Schema {
    Federation::new()
        .subschema(books_subschema(recorder.clone()))
        .subschema(authors_subschema(recorder.clone()))
        .extend(authors_extension())
        .compose()
        .expect("compose")
}

// ── Merged surface ──────────────────────────────────────────────────────────

#[tokio::test]
async fn merged_root_fields_resolve() {
    let recorder = Arc::new(Recorder::default());
    let schema = composed(&recorder);

    let resp = schema.execute(r#"{ books { title authorUuids } }"#).await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    let data = resp.data.into_json().unwrap();
    assert_eq!(data["books"][0]["title"], "First book");
    assert_eq!(data["books"][1]["authorUuids"], json!(["uuid-3", "uuid-4"]));

    let resp = schema
        .execute(r#"{ authorsByUuids(uuids: ["uuid-3"]) { id name } }"#)
        .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    let data = resp.data.into_json().unwrap();
    assert_eq!(data["authorsByUuids"][0]["name"], "Author three");
    // Identity rewrite applies no matter which root entry point was used.
    assert_eq!(
        data["authorsByUuids"][0]["id"],
        "urn:ORG_NAMESPACE:authors/Author/uuid-3"
    );
}

#[tokio::test]
async fn internal_node_fields_are_hidden() {
    let recorder = Arc::new(Recorder::default());
    let schema = composed(&recorder);

    let resp = schema
        .execute(r#"{ __schema { queryType { fields { name } } } }"#)
        .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    let data = resp.data.into_json().unwrap();
    let names: Vec<&str> = data["__schema"]["queryType"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();

    for expected in ["books", "authorsByUuids", "node", "nodes"] {
        assert!(names.contains(&expected), "missing root field {expected}");
    }
    assert!(
        !names.iter().any(|n| n.ends_with("Node")),
        "internal delegation targets leaked into the root: {names:?}"
    );
}

// ── Generic node lookup ─────────────────────────────────────────────────────

#[tokio::test]
async fn node_lookup_by_global_identifier() {
    let recorder = Arc::new(Recorder::default());
    let schema = composed(&recorder);

    let resp = schema
        .execute(
            r#"{ node(id: "urn:ORG_NAMESPACE:books/Book/uuid-1") {
                id
                ... on Books_Book { title authors { name } }
            } }"#,
        )
        .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    let data = resp.data.into_json().unwrap();
    // Local ids contain `/`; the round trip must keep them intact.
    assert_eq!(data["node"]["id"], "urn:ORG_NAMESPACE:books/Book/uuid-1");
    assert_eq!(data["node"]["title"], "First book");
    // Extension fields resolve on delegated values too.
    assert_eq!(
        data["node"]["authors"],
        json!([
            { "name": "Author one" },
            { "name": "Author two" },
            { "name": "Author four" },
        ])
    );
}

#[tokio::test]
async fn node_not_found_is_null_not_error() {
    let recorder = Arc::new(Recorder::default());
    let schema = composed(&recorder);

    let resp = schema
        .execute(r#"{ node(id: "urn:ORG_NAMESPACE:books/Book/uuid-99") { id } }"#)
        .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    assert_eq!(resp.data.into_json().unwrap()["node"], Value::Null);
}

#[tokio::test]
async fn malformed_identifier_is_a_field_error() {
    let recorder = Arc::new(Recorder::default());
    let schema = composed(&recorder);

    let resp = schema
        .execute(r#"{ node(id: "Book/uuid-1") { id } books { title } }"#)
        .await;
    assert_eq!(resp.errors.len(), 1);
    assert!(
        resp.errors[0].message.contains("invalid node identifier"),
        "{}",
        resp.errors[0].message
    );
    // Sibling fields keep resolving.
    let data = resp.data.into_json().unwrap();
    assert_eq!(data["books"][0]["title"], "First book");
}

#[tokio::test]
async fn unknown_namespace_is_an_error_not_null() {
    let recorder = Arc::new(Recorder::default());
    let schema = composed(&recorder);

    let resp = schema
        .execute(r#"{ node(id: "urn:ORG_NAMESPACE:movies/1") { id } }"#)
        .await;
    assert_eq!(resp.errors.len(), 1);
    assert!(
        resp.errors[0]
            .message
            .contains("no subschema registered for namespace `movies`"),
        "{}",
        resp.errors[0].message
    );
}

#[tokio::test]
async fn nodes_preserves_order_around_failed_positions() {
    let recorder = Arc::new(Recorder::default());
    let schema = composed(&recorder);

    let resp = schema
        .execute(
            r#"{ nodes(ids: [
                "bad-one",
                "urn:ORG_NAMESPACE:books/Book/uuid-1",
                "also-bad",
                "urn:ORG_NAMESPACE:authors/Author/uuid-9"
            ]) { id } }"#,
        )
        .await;

    let data = resp.data.into_json().unwrap();
    let nodes = data["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 4);
    assert_eq!(nodes[0], Value::Null);
    assert_eq!(nodes[1]["id"], "urn:ORG_NAMESPACE:books/Book/uuid-1");
    assert_eq!(nodes[2], Value::Null);
    // Decodes and routes, but nothing there: a plain not-found, no error.
    assert_eq!(nodes[3], Value::Null);

    assert_eq!(resp.errors.len(), 2);
    let positions: Vec<usize> = resp
        .errors
        .iter()
        .filter_map(|err| {
            err.path.iter().find_map(|seg| match seg {
                async_graphql::PathSegment::Index(i) => Some(*i),
                async_graphql::PathSegment::Field(_) => None,
            })
        })
        .collect();
    assert!(positions.contains(&0) && positions.contains(&2), "{positions:?}");
}

// ── Joins ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn join_delegates_the_exact_parent_keys() {
    let recorder = Arc::new(Recorder::default());
    let schema = composed(&recorder);

    let resp = schema.execute(r#"{ books { authors { id name } } }"#).await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    let data = resp.data.into_json().unwrap();
    assert_eq!(
        data["books"][0]["authors"][0]["id"],
        "urn:ORG_NAMESPACE:authors/Author/uuid-1"
    );
    assert_eq!(data["books"][0]["authors"][1]["name"], "Author two");
    assert_eq!(data["books"][1]["authors"].as_array().unwrap().len(), 2);

    let join_args: Vec<Value> = recorder
        .calls()
        .into_iter()
        .filter(|(field, _)| field == "authorsByUuids")
        .map(|(_, args)| args)
        .collect();
    assert_eq!(join_args.len(), 2);
    assert!(join_args.contains(&json!({ "uuids": ["uuid-1", "uuid-2", "uuid-4"] })));
    assert!(join_args.contains(&json!({ "uuids": ["uuid-3", "uuid-4"] })));
}

#[tokio::test]
async fn join_with_empty_keys_still_delegates() {
    let recorder = Arc::new(Recorder::default());
    let orphan = json!({ "id": "Book/uuid-3", "title": "Orphan book", "authorUuids": [] });
    let schema = Federation::new()
        .subschema(books_subschema_with(recorder.clone(), vec![orphan]))
        .subschema(authors_subschema(recorder.clone()))
        .extend(authors_extension())
        .compose()
        .expect("compose");

    let resp = schema.execute(r#"{ books { authors { name } } }"#).await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    let data = resp.data.into_json().unwrap();
    assert_eq!(data["books"][0]["authors"], json!([]));

    // The target subschema saw the lookup; its own empty semantics applied.
    let join_args: Vec<Value> = recorder
        .calls()
        .into_iter()
        .filter(|(field, _)| field == "authorsByUuids")
        .map(|(_, args)| args)
        .collect();
    assert_eq!(join_args, vec![json!({ "uuids": [] })]);
}

// ── Identity rewrite ────────────────────────────────────────────────────────

#[tokio::test]
async fn already_encoded_identifiers_pass_through() {
    struct LegacyResolver;

    #[async_trait]
    impl SubschemaResolver for LegacyResolver {
        async fn resolve_field(&self, field: &str, _args: Value) -> ResolveResult {
            match field {
                "things" => Ok(json!([
                    { "id": "urn:ORG_NAMESPACE:legacy/Thing/1" },
                ])),
                other => Err(format!("unknown field `{other}`")),
            }
        }

        fn node_type(&self, _node: &Value) -> Option<String> {
            Some("Thing".to_string())
        }
    }

    let legacy = Subschema::builder("legacy", "legacy", "Legacy")
        .object(
            ObjectDef::new("Thing")
                .implements_node()
                .field("id", TypeExpr::named_nn(TypeExpr::ID)),
        )
        .query_field(FieldDef::new("things", TypeExpr::named_nn_list_nn("Thing")))
        .resolver(LegacyResolver)
        .build()
        .expect("legacy subschema");

    let schema = Federation::new()
        .subschema(legacy)
        .compose()
        .expect("compose");
    let resp = schema.execute(r#"{ things { id } }"#).await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    let data = resp.data.into_json().unwrap();
    assert_eq!(data["things"][0]["id"], "urn:ORG_NAMESPACE:legacy/Thing/1");
}

// ── Failure modes ───────────────────────────────────────────────────────────

#[tokio::test]
async fn delegation_failure_is_scoped_to_the_field() {
    struct FlakyResolver;

    #[async_trait]
    impl SubschemaResolver for FlakyResolver {
        async fn resolve_field(&self, field: &str, _args: Value) -> ResolveResult {
            match field {
                "steady" => Ok(json!("ok")),
                _ => Err("backend unavailable".to_string()),
            }
        }

        fn node_type(&self, _node: &Value) -> Option<String> {
            None
        }
    }

    let flaky = Subschema::builder("flaky", "flaky", "Flaky")
        .query_field(FieldDef::new("steady", TypeExpr::named(TypeExpr::STRING)))
        .query_field(FieldDef::new("wobbly", TypeExpr::named(TypeExpr::STRING)))
        .resolver(FlakyResolver)
        .build()
        .expect("flaky subschema");

    let schema = Federation::new()
        .subschema(flaky)
        .compose()
        .expect("compose");
    let resp = schema.execute(r#"{ steady wobbly }"#).await;
    assert_eq!(resp.errors.len(), 1);
    assert!(
        resp.errors[0]
            .message
            .contains("delegation to `wobbly` failed: backend unavailable"),
        "{}",
        resp.errors[0].message
    );
    let data = resp.data.into_json().unwrap();
    assert_eq!(data["steady"], "ok");
}

#[test]
fn duplicate_configuration_is_fatal() {
    let recorder = Arc::new(Recorder::default());

    let err = Federation::new()
        .subschema(books_subschema(recorder.clone()))
        .subschema(books_subschema(recorder.clone()))
        .compose()
        .expect_err("duplicate name must not compose");
    assert!(matches!(err, ComposeError::DuplicateSubschema(name) if name == "books"));

    let clashing_types = Subschema::builder("shelves", "shelves", "Books")
        .resolver(AuthorsResolver {
            recorder: recorder.clone(),
        })
        .build()
        .expect("subschema");
    let err = Federation::new()
        .subschema(books_subschema(recorder.clone()))
        .subschema(clashing_types)
        .compose()
        .expect_err("duplicate type prefix must not compose");
    assert!(matches!(err, ComposeError::DuplicateTypePrefix(prefix) if prefix == "Books"));

    let clashing_fields = Subschema::builder("shelves", "books", "Shelves")
        .resolver(AuthorsResolver {
            recorder: recorder.clone(),
        })
        .build()
        .expect("subschema");
    let err = Federation::new()
        .subschema(books_subschema(recorder))
        .subschema(clashing_fields)
        .compose()
        .expect_err("duplicate field prefix must not compose");
    assert!(matches!(err, ComposeError::DuplicateFieldPrefix(prefix) if prefix == "books"));
}

#[test]
fn extensions_must_reference_registered_targets() {
    let recorder = Arc::new(Recorder::default());

    let err = Federation::new()
        .subschema(books_subschema(recorder.clone()))
        .subschema(authors_subschema(recorder.clone()))
        .extend(ExtensionField::new(
            "movies",
            "Movie",
            "actors",
            TypeExpr::named_nn_list_nn("Author"),
            Join::new("actorUuids", "authors", "authorsByUuids", "uuids"),
        ))
        .compose()
        .expect_err("unknown subschema must not compose");
    assert!(matches!(
        err,
        ComposeError::UnknownExtensionSubschema { subschema, .. } if subschema == "movies"
    ));

    let err = Federation::new()
        .subschema(books_subschema(recorder.clone()))
        .subschema(authors_subschema(recorder))
        .extend(ExtensionField::new(
            "books",
            "Book",
            "authors",
            TypeExpr::named_nn_list_nn("Author"),
            Join::new("authorUuids", "authors", "authorsByNames", "names"),
        ))
        .compose()
        .expect_err("unknown join field must not compose");
    assert!(matches!(
        err,
        ComposeError::UnknownJoinField { target_field, .. } if target_field == "authorsByNames"
    ));
}
