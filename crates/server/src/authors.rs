//! Sample "authors" subschema: the join target for the books extension.

use {
    async_trait::async_trait,
    serde_json::{Value, json},
};

use graphweld_stitch::{
    ComposeError, FieldDef, ObjectDef, ResolveResult, Subschema, SubschemaResolver, TypeExpr,
};

fn dataset() -> Vec<Value> {
    vec![
        json!({ "id": "Author/uuid-1", "uuid": "uuid-1", "name": "Author one" }),
        json!({ "id": "Author/uuid-2", "uuid": "uuid-2", "name": "Author two" }),
        json!({ "id": "Author/uuid-3", "uuid": "uuid-3", "name": "Author three" }),
        json!({ "id": "Author/uuid-4", "uuid": "uuid-4", "name": "Author four" }),
    ]
}

struct AuthorsResolver;

#[async_trait]
impl SubschemaResolver for AuthorsResolver {
    async fn resolve_field(&self, field: &str, args: Value) -> ResolveResult {
        match field {
            "authorsByUuids" => {
                let wanted: Vec<&str> = args
                    .get("uuids")
                    .and_then(Value::as_array)
                    .map(|uuids| uuids.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();
                Ok(Value::Array(
                    dataset()
                        .into_iter()
                        .filter(|author| {
                            author["uuid"].as_str().is_some_and(|u| wanted.contains(&u))
                        })
                        .collect(),
                ))
            },
            "node" => {
                let id = args.get("id").and_then(Value::as_str).unwrap_or_default();
                Ok(dataset()
                    .into_iter()
                    .find(|author| author["id"] == id)
                    .unwrap_or(Value::Null))
            },
            other => Err(format!("unknown field `{other}`")),
        }
    }

    fn node_type(&self, _node: &Value) -> Option<String> {
        Some("Author".to_string())
    }
}

pub fn subschema() -> Result<Subschema, ComposeError> {
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
        .resolver(AuthorsResolver)
        .build()
}
