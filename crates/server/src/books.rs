//! Sample "books" subschema: an external data provider with an in-memory
//! dataset. Foreign author keys live on the book as plain local uuids; the
//! `authors` join is declared at composition time, not here.

use {
    async_trait::async_trait,
    serde_json::{Value, json},
};

use graphweld_stitch::{
    ComposeError, FieldDef, ObjectDef, ResolveResult, Subschema, SubschemaResolver, TypeExpr,
};

fn dataset() -> Vec<Value> {
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

struct BooksResolver;

#[async_trait]
impl SubschemaResolver for BooksResolver {
    async fn resolve_field(&self, field: &str, args: Value) -> ResolveResult {
        match field {
            "books" => Ok(Value::Array(dataset())),
            "node" => {
                let id = args.get("id").and_then(Value::as_str).unwrap_or_default();
                Ok(dataset()
                    .into_iter()
                    .find(|book| book["id"] == id)
                    .unwrap_or(Value::Null))
            },
            other => Err(format!("unknown field `{other}`")),
        }
    }

    fn node_type(&self, _node: &Value) -> Option<String> {
        Some("Book".to_string())
    }
}

pub fn subschema() -> Result<Subschema, ComposeError> {
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
        .resolver(BooksResolver)
        .build()
}
