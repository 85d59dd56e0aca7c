//! Delegation into subschemas: the shared node-lookup routine and the
//! cross-schema join.
//!
//! Both the root `node` and `nodes` resolvers enter through
//! [`resolve_node`], so the two entry points cannot drift apart: routing,
//! error taxonomy, and type attribution live in exactly one place.

use {
    async_graphql::dynamic::FieldValue,
    serde_json::{Value, json},
};

use crate::{
    compose::Registry,
    error::ResolveError,
    subschema::{FieldDef, TypeExpr},
    transform::TransformedSubschema,
};

/// A node value routed back into the composed schema: the owning
/// subschema's JSON document plus its namespaced type name, so nested
/// fields, the identifier rewrite, and join extensions apply uniformly no
/// matter which entry point the client used.
pub(crate) struct NodeValue {
    pub(crate) type_name: String,
    pub(crate) value: Value,
}

impl NodeValue {
    pub(crate) fn into_field_value<'a>(self) -> FieldValue<'a> {
        FieldValue::owned_any(self.value).with_type(self.type_name)
    }
}

/// Decode a global identifier, route it to the owning subschema, and
/// delegate to that subschema's internal node target.
///
/// Absence is a legitimate not-found and resolves to `None`; every other
/// deviation is a field-scoped [`ResolveError`].
pub(crate) async fn resolve_node(
    registry: &Registry,
    id: &str,
) -> Result<Option<NodeValue>, ResolveError> {
    let decoded = registry.codec.decode(id)?;
    let subschema = registry.route(decoded.schema)?;
    let field = subschema
        .node_field
        .as_ref()
        // Registered but without a node lookup: it cannot answer, which is
        // indistinguishable from an unroutable namespace to the caller.
        .ok_or_else(|| ResolveError::UnknownNamespace(subschema.name.clone()))?;

    let value = delegate(subschema, field, json!({ "id": decoded.local_id })).await?;
    if value.is_null() {
        return Ok(None);
    }

    let concrete = subschema.resolver.node_type(&value).ok_or_else(|| {
        ResolveError::Delegation {
            field: field.name.clone(),
            message: format!("subschema `{}` could not type a node value", subschema.name),
        }
    })?;
    let type_name = subschema
        .rename_type(&concrete)
        .unwrap_or(concrete.as_str())
        .to_string();

    Ok(Some(NodeValue { type_name, value }))
}

/// Resolve a join extension field: extract the parent's key(s) and delegate
/// to the lookup field on the target subschema.
///
/// An empty or absent key list still delegates, so the target subschema's
/// own empty/not-found semantics apply uniformly.
pub(crate) async fn resolve_join(
    registry: &Registry,
    join: &Join,
    extension_field: &str,
    parent: &Value,
) -> Result<Value, ResolveError> {
    let target = registry.route(&join.target_subschema)?;
    let keys = parent
        .get(&join.parent_key)
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));

    let result = target
        .resolver
        .resolve_field(&join.target_field, json!({ join.target_arg.clone(): keys }))
        .await
        .map_err(|message| ResolveError::Delegation {
            field: extension_field.to_string(),
            message,
        });
    if let Err(err) = &result {
        tracing::warn!(field = extension_field, %err, "join delegation failed");
    }
    result
}

async fn delegate(
    subschema: &TransformedSubschema,
    field: &FieldDef,
    args: Value,
) -> Result<Value, ResolveError> {
    tracing::debug!(subschema = %subschema.name, field = %field.name, "delegating");
    subschema
        .resolver
        .resolve_field(&field.resolver_key, args)
        .await
        .map_err(|message| ResolveError::Delegation {
            field: field.name.clone(),
            message,
        })
}

/// How a join extension field fetches its data: keys extracted from the
/// parent document, passed as one argument to a lookup field on another
/// subschema.
#[derive(Debug, Clone)]
pub struct Join {
    pub(crate) parent_key: String,
    pub(crate) target_subschema: String,
    pub(crate) target_field: String,
    pub(crate) target_arg: String,
}

impl Join {
    pub fn new(
        parent_key: impl Into<String>,
        target_subschema: impl Into<String>,
        target_field: impl Into<String>,
        target_arg: impl Into<String>,
    ) -> Self {
        Self {
            parent_key: parent_key.into(),
            target_subschema: target_subschema.into(),
            target_field: target_field.into(),
            target_arg: target_arg.into(),
        }
    }
}

/// A field grafted onto a merged type at composition time, resolved by
/// joining into a different subschema per query.
#[derive(Debug, Clone)]
pub struct ExtensionField {
    pub(crate) on_subschema: String,
    pub(crate) on_type: String,
    pub(crate) name: String,
    pub(crate) ty: TypeExpr,
    pub(crate) join: Join,
}

impl ExtensionField {
    /// Declare `name: ty` on `on_type` (as the owning subschema named it,
    /// pre-namespacing). `ty` likewise names types in the join target's own
    /// vocabulary; the merger renames both sides.
    pub fn new(
        on_subschema: impl Into<String>,
        on_type: impl Into<String>,
        name: impl Into<String>,
        ty: TypeExpr,
        join: Join,
    ) -> Self {
        Self {
            on_subschema: on_subschema.into(),
            on_type: on_type.into(),
            name: name.into(),
            ty,
            join,
        }
    }
}
