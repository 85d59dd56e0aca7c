//! Subschema merger and the federation facade.
//!
//! `Federation` is the single externally consumed entry point: it collects
//! subschemas and extension declarations, runs the namespace transformer over
//! each, checks the configuration for collisions, and builds one executable
//! `dynamic::Schema`. Everything the per-query resolvers need is frozen into
//! an immutable [`Registry`] shared by reference; nothing is mutated after
//! composition.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use {
    async_graphql::dynamic::{
        Field, FieldFuture, FieldValue, InputValue, Interface, InterfaceField, Object, Schema,
        TypeRef,
    },
    futures::future,
    serde_json::Value,
};

use crate::{
    delegate::{ExtensionField, Join, NodeValue, resolve_join, resolve_node},
    error::{ComposeError, ResolveError},
    ident::{DEFAULT_NAMESPACE_TAG, IdCodec},
    subschema::{FieldDef, Subschema, TypeExpr},
    transform::{TransformedSubschema, transform},
    value::to_field_value,
};

/// The identity field every identifiable type exposes.
const ID_FIELD: &str = "id";

/// Reserved `Node` member carrying a per-position lookup failure in `nodes`.
/// Resolving its identity field yields the stored error, which surfaces as a
/// field error at that list position while sibling positions resolve.
const FAILED_NODE_TYPE: &str = "_FailedNode";

struct FailedNode(ResolveError);

/// Immutable composition-time configuration, shared by every resolver
/// closure in the composed schema.
pub(crate) struct Registry {
    pub(crate) codec: IdCodec,
    pub(crate) subschemas: BTreeMap<String, TransformedSubschema>,
    /// All namespaced object type names across subschemas.
    pub(crate) object_types: BTreeSet<String>,
}

impl Registry {
    pub(crate) fn route(&self, schema: &str) -> Result<&TransformedSubschema, ResolveError> {
        self.subschemas
            .get(schema)
            .ok_or_else(|| ResolveError::UnknownNamespace(schema.to_string()))
    }
}

/// An extension field after validation, keyed by namespaced parent type.
#[derive(Clone)]
struct ComposedExtension {
    on_type: String,
    name: String,
    ty: TypeExpr,
    join: Join,
}

/// Top-level assembly of subschemas into one composed schema.
pub struct Federation {
    tag: String,
    subschemas: Vec<Subschema>,
    extensions: Vec<ExtensionField>,
}

impl Federation {
    pub fn new() -> Self {
        Self {
            tag: DEFAULT_NAMESPACE_TAG.to_string(),
            subschemas: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Override the `<tag>` segment of `urn:<tag>:<schema>/<local-id>`.
    pub fn namespace_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn subschema(mut self, subschema: Subschema) -> Self {
        self.subschemas.push(subschema);
        self
    }

    pub fn extend(mut self, extension: ExtensionField) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Compose everything into one executable schema. Runs once,
    /// synchronously; any error here is fatal and no schema is produced.
    pub fn compose(self) -> Result<Schema, ComposeError> {
        let mut names = BTreeSet::new();
        let mut type_prefixes = BTreeSet::new();
        let mut field_prefixes = BTreeSet::new();
        for sub in &self.subschemas {
            if !names.insert(sub.name.clone()) {
                return Err(ComposeError::DuplicateSubschema(sub.name.clone()));
            }
            if !type_prefixes.insert(sub.type_prefix.clone()) {
                return Err(ComposeError::DuplicateTypePrefix(sub.type_prefix.clone()));
            }
            if !field_prefixes.insert(sub.field_prefix.clone()) {
                return Err(ComposeError::DuplicateFieldPrefix(sub.field_prefix.clone()));
            }
        }

        let subschemas: BTreeMap<String, TransformedSubschema> = self
            .subschemas
            .into_iter()
            .map(|sub| {
                let transformed = transform(sub);
                (transformed.name.clone(), transformed)
            })
            .collect();

        let extensions = validate_extensions(self.extensions, &subschemas)?;

        let object_types: BTreeSet<String> = subschemas
            .values()
            .flat_map(|sub| sub.objects.iter().map(|o| o.name.clone()))
            .collect();
        let registry = Arc::new(Registry {
            codec: IdCodec::new(self.tag),
            subschemas,
            object_types,
        });

        tracing::debug!(subschemas = registry.subschemas.len(), "composing schema");

        let mut builder = Schema::build("Query", None, None)
            .register(node_interface())
            .register(failed_node_object());

        for sub in registry.subschemas.values() {
            for object in &sub.objects {
                let mut obj = Object::new(object.name.clone());
                if object.node {
                    obj = obj.implement("Node");
                }
                for def in &object.fields {
                    obj = if object.node && def.name == ID_FIELD {
                        obj.field(identity_field(registry.clone(), sub.name.clone(), def.clone()))
                    } else {
                        obj.field(object_field(registry.clone(), def.clone()))
                    };
                }
                for ext in extensions.iter().filter(|e| e.on_type == object.name) {
                    obj = obj.field(extension_field(registry.clone(), ext.clone()));
                }
                builder = builder.register(obj);
            }
        }

        // Root field set: every transformed root field except the internal
        // `<prefix>Node` targets (those stay reachable only through the
        // delegation path), plus the generic node/nodes pair.
        let mut query = Object::new("Query");
        for sub in registry.subschemas.values() {
            for def in &sub.query_fields {
                query = query.field(root_field(registry.clone(), sub.name.clone(), def.clone()));
            }
        }
        query = query
            .field(node_root_field(registry.clone()))
            .field(nodes_root_field(registry.clone()));
        builder = builder.register(query);

        builder
            .finish()
            .map_err(|err| ComposeError::Schema(err.to_string()))
    }
}

impl Default for Federation {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_extensions(
    extensions: Vec<ExtensionField>,
    subschemas: &BTreeMap<String, TransformedSubschema>,
) -> Result<Vec<ComposedExtension>, ComposeError> {
    let mut composed = Vec::with_capacity(extensions.len());
    for ext in extensions {
        let owner = subschemas.get(&ext.on_subschema).ok_or_else(|| {
            ComposeError::UnknownExtensionSubschema {
                field: ext.name.clone(),
                subschema: ext.on_subschema.clone(),
            }
        })?;
        let on_type = owner
            .rename_type(&ext.on_type)
            .ok_or_else(|| ComposeError::UnknownExtensionType {
                field: ext.name.clone(),
                subschema: ext.on_subschema.clone(),
                type_name: ext.on_type.clone(),
            })?
            .to_string();

        let target = subschemas.get(&ext.join.target_subschema).ok_or_else(|| {
            ComposeError::UnknownExtensionSubschema {
                field: ext.name.clone(),
                subschema: ext.join.target_subschema.clone(),
            }
        })?;
        let target_has_field = target
            .query_fields
            .iter()
            .any(|f| f.resolver_key == ext.join.target_field);
        if !target_has_field {
            return Err(ComposeError::UnknownJoinField {
                field: ext.name.clone(),
                subschema: ext.join.target_subschema.clone(),
                target_field: ext.join.target_field.clone(),
            });
        }

        let ty = match target.rename_type(ext.ty.name()) {
            Some(renamed) => ext.ty.renamed(renamed),
            None => ext.ty.clone(),
        };
        composed.push(ComposedExtension {
            on_type,
            name: ext.name,
            ty,
            join: ext.join,
        });
    }
    Ok(composed)
}

fn node_interface() -> Interface {
    Interface::new("Node").field(InterfaceField::new(
        ID_FIELD,
        TypeRef::named_nn(TypeRef::ID),
    ))
}

fn failed_node_object() -> Object {
    Object::new(FAILED_NODE_TYPE)
        .description("Reserved Node member representing a failed lookup position in `nodes`.")
        .implement("Node")
        .field(Field::new(
            ID_FIELD,
            TypeRef::named_nn(TypeRef::ID),
            |ctx| {
                FieldFuture::new(async move {
                    let failed = ctx.parent_value.try_downcast_ref::<FailedNode>()?;
                    Err::<Option<FieldValue>, async_graphql::Error>(failed.0.clone().into())
                })
            },
        ))
}

/// A transformed root field, delegating to the owning subschema's resolver.
fn root_field(registry: Arc<Registry>, subschema: String, def: FieldDef) -> Field {
    let arg_defs = def.args.clone();
    let mut field = Field::new(def.name.clone(), def.ty.to_type_ref(), move |ctx| {
        let registry = registry.clone();
        let subschema = subschema.clone();
        let def = def.clone();
        FieldFuture::new(async move {
            let mut args = serde_json::Map::new();
            for arg in &def.args {
                if let Some(value) = ctx.args.get(&arg.name) {
                    args.insert(arg.name.clone(), value.deserialize::<Value>()?);
                }
            }
            let sub = registry.route(&subschema)?;
            let value = sub
                .resolver
                .resolve_field(&def.resolver_key, Value::Object(args))
                .await
                .map_err(|message| ResolveError::Delegation {
                    field: def.name.clone(),
                    message,
                })?;
            to_field_value(&def.ty, &registry.object_types, value)
        })
    });
    for arg in &arg_defs {
        field = field.argument(InputValue::new(arg.name.clone(), arg.ty.to_type_ref()));
    }
    field
}

/// A plain object field: property access on the parent JSON document.
fn object_field(registry: Arc<Registry>, def: FieldDef) -> Field {
    Field::new(def.name.clone(), def.ty.to_type_ref(), move |ctx| {
        let registry = registry.clone();
        let def = def.clone();
        FieldFuture::new(async move {
            let parent = ctx.parent_value.try_downcast_ref::<Value>()?;
            let value = parent.get(&def.name).cloned().unwrap_or(Value::Null);
            to_field_value(&def.ty, &registry.object_types, value)
        })
    })
}

/// The identifier rewrite: wraps the identity field of an identifiable type
/// so the value leaving the composed schema is always in global identifier
/// form. Already-encoded values pass through unchanged.
fn identity_field(registry: Arc<Registry>, subschema: String, def: FieldDef) -> Field {
    Field::new(def.name.clone(), def.ty.to_type_ref(), move |ctx| {
        let registry = registry.clone();
        let subschema = subschema.clone();
        let def = def.clone();
        FieldFuture::new(async move {
            let parent = ctx.parent_value.try_downcast_ref::<Value>()?;
            let Some(raw) = parent.get(&def.name).and_then(Value::as_str) else {
                return Ok(None);
            };
            let id = if registry.codec.is_encoded(raw) {
                raw.to_string()
            } else {
                registry.codec.encode(&subschema, raw)
            };
            Ok(Some(FieldValue::value(async_graphql::Value::String(id))))
        })
    })
}

/// A join extension field on a merged type.
fn extension_field(registry: Arc<Registry>, ext: ComposedExtension) -> Field {
    Field::new(ext.name.clone(), ext.ty.to_type_ref(), move |ctx| {
        let registry = registry.clone();
        let ext = ext.clone();
        FieldFuture::new(async move {
            let parent = ctx.parent_value.try_downcast_ref::<Value>()?;
            let value = resolve_join(&registry, &ext.join, &ext.name, parent).await?;
            to_field_value(&ext.ty, &registry.object_types, value)
        })
    })
}

fn node_root_field(registry: Arc<Registry>) -> Field {
    Field::new("node", TypeRef::named("Node"), move |ctx| {
        let registry = registry.clone();
        FieldFuture::new(async move {
            let id = ctx.args.try_get(ID_FIELD)?.string()?.to_string();
            let node = resolve_node(&registry, &id).await?;
            Ok(node.map(NodeValue::into_field_value))
        })
    })
    .argument(InputValue::new(ID_FIELD, TypeRef::named_nn(TypeRef::ID)))
    .description("Look up any identifiable object by its global identifier.")
}

fn nodes_root_field(registry: Arc<Registry>) -> Field {
    Field::new("nodes", TypeRef::named_list_nn("Node"), move |ctx| {
        let registry = registry.clone();
        FieldFuture::new(async move {
            let ids: Vec<String> = ctx
                .args
                .try_get("ids")?
                .list()?
                .iter()
                .map(|id| id.string().map(str::to_string))
                .collect::<async_graphql::Result<_>>()?;

            // Concurrent per-id resolution; join_all keeps output order
            // positionally matched to the input ids.
            let looked_up =
                future::join_all(ids.iter().map(|id| resolve_node(&registry, id))).await;
            let items = looked_up.into_iter().map(|result| match result {
                Ok(Some(node)) => node.into_field_value(),
                Ok(None) => FieldValue::NULL,
                Err(err) => FieldValue::owned_any(FailedNode(err)).with_type(FAILED_NODE_TYPE),
            });
            Ok(Some(FieldValue::list(items)))
        })
    })
    .argument(InputValue::new(
        "ids",
        TypeRef::named_nn_list_nn(TypeRef::ID),
    ))
    .description("Look up many identifiable objects; results match input order.")
}
