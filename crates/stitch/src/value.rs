//! Conversions between subschema JSON documents and GraphQL values.
//!
//! Subschema resolvers answer with `serde_json::Value` documents; the merger
//! turns those into `FieldValue`s according to the field's declared type.
//! Object-typed values stay as JSON documents (downcast again by the next
//! resolver), scalar values convert to `async_graphql::Value`.

use std::collections::BTreeSet;

use async_graphql::dynamic::FieldValue;

use crate::subschema::TypeExpr;

pub(crate) fn json_to_gql(v: &serde_json::Value) -> async_graphql::Value {
    match v {
        serde_json::Value::Null => async_graphql::Value::Null,
        serde_json::Value::Bool(b) => async_graphql::Value::Boolean(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                async_graphql::Value::Number(i.into())
            } else if let Some(f) = n.as_f64() {
                async_graphql::Value::Number(
                    async_graphql::Number::from_f64(f).unwrap_or_else(|| 0i32.into()),
                )
            } else {
                async_graphql::Value::Null
            }
        },
        serde_json::Value::String(s) => async_graphql::Value::String(s.clone()),
        serde_json::Value::Array(a) => {
            async_graphql::Value::List(a.iter().map(json_to_gql).collect())
        },
        serde_json::Value::Object(m) => {
            let map: async_graphql::indexmap::IndexMap<async_graphql::Name, async_graphql::Value> =
                m.iter()
                    .map(|(k, v)| (async_graphql::Name::new(k), json_to_gql(v)))
                    .collect();
            async_graphql::Value::Object(map)
        },
    }
}

/// Convert a resolver's JSON answer into a `FieldValue` for a field declared
/// as `ty`. `object_types` is the set of namespaced object type names in the
/// composed schema; anything else is emitted as a scalar value.
pub(crate) fn to_field_value<'a>(
    ty: &TypeExpr,
    object_types: &BTreeSet<String>,
    value: serde_json::Value,
) -> async_graphql::Result<Option<FieldValue<'a>>> {
    if value.is_null() {
        return Ok(None);
    }

    if ty.is_list() {
        let serde_json::Value::Array(items) = value else {
            return Err(async_graphql::Error::new(format!(
                "expected a list for field type [{}]",
                ty.name()
            )));
        };
        let items = items
            .into_iter()
            .map(|item| item_value(ty.name(), object_types, item));
        return Ok(Some(FieldValue::list(items)));
    }

    Ok(Some(item_value(ty.name(), object_types, value)))
}

fn item_value<'a>(
    type_name: &str,
    object_types: &BTreeSet<String>,
    item: serde_json::Value,
) -> FieldValue<'a> {
    if item.is_null() {
        FieldValue::NULL
    } else if object_types.contains(type_name) {
        FieldValue::owned_any(item)
    } else {
        FieldValue::value(json_to_gql(&item))
    }
}
