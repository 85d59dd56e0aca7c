//! Namespace transformation of a subschema.
//!
//! Runs once per subschema at composition time:
//!
//! 1. A root field literally named `nodes` is removed; the batch lookup is
//!    reintroduced only at the merged level.
//! 2. A root field literally named `node` is renamed `<field_prefix>Node`
//!    and recorded as the subschema's internal delegation target. Its
//!    resolver key stays `node`.
//! 3. Every type the subschema defines is renamed `<type_prefix>_<name>`,
//!    with references in field and argument types renamed in lockstep. `ID`,
//!    `Node`, and the built-in scalars are never subschema-defined, so they
//!    fall through untouched.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use crate::subschema::{FieldDef, ObjectDef, Subschema, SubschemaResolver, TypeExpr};

const NODE_FIELD: &str = "node";
const NODES_FIELD: &str = "nodes";

/// A subschema with its namespace prefixes applied. Owned exclusively by the
/// merger that produced it; delegation during joins and node lookups goes
/// through this, never back to the raw subschema.
pub(crate) struct TransformedSubschema {
    pub(crate) name: String,
    pub(crate) type_prefix: String,
    pub(crate) field_prefix: String,
    pub(crate) objects: Vec<ObjectDef>,
    /// Externally visible root fields (internal node target excluded).
    pub(crate) query_fields: Vec<FieldDef>,
    /// The renamed `node` lookup, if the subschema declared one. Kept out of
    /// `query_fields` so it never reaches the externally visible root.
    pub(crate) node_field: Option<FieldDef>,
    /// Original type name -> namespaced type name.
    pub(crate) renames: BTreeMap<String, String>,
    pub(crate) resolver: Arc<dyn SubschemaResolver>,
}

pub(crate) fn transform(subschema: Subschema) -> TransformedSubschema {
    let Subschema {
        name,
        field_prefix,
        type_prefix,
        objects,
        query_fields,
        resolver,
    } = subschema;

    let defined: BTreeSet<String> = objects.iter().map(|o| o.name.clone()).collect();
    let renames: BTreeMap<String, String> = defined
        .iter()
        .map(|n| (n.clone(), format!("{type_prefix}_{n}")))
        .collect();

    let rename_expr = |ty: &TypeExpr| match renames.get(ty.name()) {
        Some(renamed) => ty.renamed(renamed.clone()),
        None => ty.clone(),
    };
    let rename_field = |field: &FieldDef| FieldDef {
        name: field.name.clone(),
        ty: rename_expr(&field.ty),
        args: field
            .args
            .iter()
            .map(|arg| crate::subschema::ArgDef {
                name: arg.name.clone(),
                ty: rename_expr(&arg.ty),
            })
            .collect(),
        resolver_key: field.resolver_key.clone(),
    };

    let objects = objects
        .iter()
        .map(|object| ObjectDef {
            name: renames
                .get(&object.name)
                .cloned()
                .unwrap_or_else(|| object.name.clone()),
            fields: object.fields.iter().map(rename_field).collect(),
            node: object.node,
        })
        .collect();

    let mut node_field = None;
    let mut visible = Vec::new();
    for field in &query_fields {
        if field.name == NODES_FIELD {
            continue;
        }
        let mut field = rename_field(field);
        if field.name == NODE_FIELD {
            field.name = format!("{field_prefix}Node");
            node_field = Some(field);
        } else {
            visible.push(field);
        }
    }

    TransformedSubschema {
        name,
        type_prefix,
        field_prefix,
        objects,
        query_fields: visible,
        node_field,
        renames,
        resolver,
    }
}

impl TransformedSubschema {
    /// Namespaced name for one of this subschema's own types.
    pub(crate) fn rename_type(&self, original: &str) -> Option<&str> {
        self.renames.get(original).map(String::as_str)
    }
}
