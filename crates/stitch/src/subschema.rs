//! Declarative subschema model.
//!
//! A subschema is an independently authored graph-query definition: its own
//! object types, its own root fields, and a resolver that owns the data. The
//! federation layer only reads it. Type and field declarations use a small
//! structural representation so the namespace transformer can rename types as
//! a typed pass instead of rewriting SDL text.

use std::sync::Arc;

use {async_graphql::dynamic::TypeRef, async_trait::async_trait, serde_json::Value};

use crate::error::ComposeError;

/// Result shape for subschema resolver calls crossing the trait-object seam.
pub type ResolveResult = Result<Value, String>;

/// The resolution seam a subschema provides to the federation layer.
///
/// Root fields dispatch by name through [`resolve_field`], answering with
/// JSON documents; object fields without a dedicated resolver resolve by
/// property access on the parent document. [`node_type`] names the concrete
/// (pre-namespacing) type of a value returned by the subschema's `node`
/// lookup, so the merger can re-enter the composed schema with the right
/// type attribution.
///
/// [`resolve_field`]: SubschemaResolver::resolve_field
/// [`node_type`]: SubschemaResolver::node_type
#[async_trait]
pub trait SubschemaResolver: Send + Sync {
    async fn resolve_field(&self, field: &str, args: Value) -> ResolveResult;

    fn node_type(&self, node: &Value) -> Option<String>;
}

/// A named type reference plus its GraphQL list/nullability shape.
///
/// Constructors mirror the `dynamic::TypeRef` vocabulary (`named`,
/// `named_nn`, `named_nn_list_nn`, ...). Nested lists are not modeled; the
/// declarative layer has no use for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    name: String,
    list: bool,
    item_required: bool,
    required: bool,
}

impl TypeExpr {
    pub const BOOLEAN: &'static str = "Boolean";
    pub const FLOAT: &'static str = "Float";
    pub const ID: &'static str = "ID";
    pub const INT: &'static str = "Int";
    pub const STRING: &'static str = "String";

    /// `T`
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            list: false,
            item_required: false,
            required: false,
        }
    }

    /// `T!`
    pub fn named_nn(name: impl Into<String>) -> Self {
        Self {
            required: true,
            ..Self::named(name)
        }
    }

    /// `[T]`
    pub fn named_list(name: impl Into<String>) -> Self {
        Self {
            list: true,
            ..Self::named(name)
        }
    }

    /// `[T!]`
    pub fn named_nn_list(name: impl Into<String>) -> Self {
        Self {
            item_required: true,
            ..Self::named_list(name)
        }
    }

    /// `[T]!`
    pub fn named_list_nn(name: impl Into<String>) -> Self {
        Self {
            required: true,
            ..Self::named_list(name)
        }
    }

    /// `[T!]!`
    pub fn named_nn_list_nn(name: impl Into<String>) -> Self {
        Self {
            item_required: true,
            required: true,
            ..Self::named_list(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_list(&self) -> bool {
        self.list
    }

    /// Same shape, different named type. Used by the namespace transformer.
    pub(crate) fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub(crate) fn to_type_ref(&self) -> TypeRef {
        match (self.list, self.item_required, self.required) {
            (false, _, false) => TypeRef::named(self.name.clone()),
            (false, _, true) => TypeRef::named_nn(self.name.clone()),
            (true, false, false) => TypeRef::named_list(self.name.clone()),
            (true, true, false) => TypeRef::named_nn_list(self.name.clone()),
            (true, false, true) => TypeRef::named_list_nn(self.name.clone()),
            (true, true, true) => TypeRef::named_nn_list_nn(self.name.clone()),
        }
    }
}

/// A declared argument on a root field.
#[derive(Debug, Clone)]
pub struct ArgDef {
    pub(crate) name: String,
    pub(crate) ty: TypeExpr,
}

/// A declared field: on an object type, or at the query root.
///
/// `resolver_key` is the name under which the owning subschema's resolver
/// dispatches the field. Renaming a field (the namespace transformer does
/// this to `node`) never changes its resolver key.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub(crate) name: String,
    pub(crate) ty: TypeExpr,
    pub(crate) args: Vec<ArgDef>,
    pub(crate) resolver_key: String,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        let name = name.into();
        Self {
            resolver_key: name.clone(),
            name,
            ty,
            args: Vec::new(),
        }
    }

    pub fn argument(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.args.push(ArgDef {
            name: name.into(),
            ty,
        });
        self
    }
}

/// A declared object type.
#[derive(Debug, Clone)]
pub struct ObjectDef {
    pub(crate) name: String,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) node: bool,
}

impl ObjectDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            node: false,
        }
    }

    pub fn field(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.fields.push(FieldDef::new(name, ty));
        self
    }

    /// Mark this type identifiable: it implements `Node` and its `id` field
    /// is rewritten into the global identifier format by the merger.
    pub fn implements_node(mut self) -> Self {
        self.node = true;
        self
    }
}

/// An independently authored subschema, immutable once built.
#[derive(Clone)]
pub struct Subschema {
    pub(crate) name: String,
    pub(crate) field_prefix: String,
    pub(crate) type_prefix: String,
    pub(crate) objects: Vec<ObjectDef>,
    pub(crate) query_fields: Vec<FieldDef>,
    pub(crate) resolver: Arc<dyn SubschemaResolver>,
}

impl Subschema {
    /// Start declaring a subschema. `field_prefix` namespaces the internal
    /// `node` delegation target (`booksNode`); `type_prefix` namespaces every
    /// type the subschema defines (`Books_Book`).
    pub fn builder(
        name: impl Into<String>,
        field_prefix: impl Into<String>,
        type_prefix: impl Into<String>,
    ) -> SubschemaBuilder {
        SubschemaBuilder {
            name: name.into(),
            field_prefix: field_prefix.into(),
            type_prefix: type_prefix.into(),
            objects: Vec::new(),
            query_fields: Vec::new(),
            resolver: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

pub struct SubschemaBuilder {
    name: String,
    field_prefix: String,
    type_prefix: String,
    objects: Vec<ObjectDef>,
    query_fields: Vec<FieldDef>,
    resolver: Option<Arc<dyn SubschemaResolver>>,
}

impl SubschemaBuilder {
    pub fn object(mut self, object: ObjectDef) -> Self {
        self.objects.push(object);
        self
    }

    pub fn query_field(mut self, field: FieldDef) -> Self {
        self.query_fields.push(field);
        self
    }

    pub fn resolver(mut self, resolver: impl SubschemaResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn build(self) -> Result<Subschema, ComposeError> {
        let resolver = self
            .resolver
            .ok_or_else(|| ComposeError::MissingResolver(self.name.clone()))?;
        Ok(Subschema {
            name: self.name,
            field_prefix: self.field_prefix,
            type_prefix: self.type_prefix,
            objects: self.objects,
            query_fields: self.query_fields,
            resolver,
        })
    }
}
