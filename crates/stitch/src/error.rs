//! Error types for composition and per-query resolution.
//!
//! The two families deliberately do not mix: a [`ComposeError`] is fatal and
//! prevents the composed schema from being constructed at all, while a
//! [`ResolveError`] is scoped to the field that raised it and never aborts
//! sibling fields in the same request.

use thiserror::Error;

/// Fatal configuration or construction failure at composition time.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("subschema `{0}` is registered more than once")]
    DuplicateSubschema(String),

    #[error("type prefix `{0}` is used by more than one subschema")]
    DuplicateTypePrefix(String),

    #[error("field prefix `{0}` is used by more than one subschema")]
    DuplicateFieldPrefix(String),

    #[error("subschema `{0}` was built without a resolver")]
    MissingResolver(String),

    #[error("extension field `{field}` targets unknown subschema `{subschema}`")]
    UnknownExtensionSubschema { field: String, subschema: String },

    #[error("extension field `{field}` targets unknown type `{type_name}` in subschema `{subschema}`")]
    UnknownExtensionType {
        field: String,
        subschema: String,
        type_name: String,
    },

    #[error("extension field `{field}` joins through unknown field `{target_field}` on subschema `{subschema}`")]
    UnknownJoinField {
        field: String,
        subschema: String,
        target_field: String,
    },

    #[error("composed schema construction failed: {0}")]
    Schema(String),
}

/// Field-scoped failure while resolving a query against the composed schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The input to `node`/`nodes` does not match the global identifier wire
    /// format. A client error, never a "not found".
    #[error("invalid node identifier `{0}`")]
    MalformedIdentifier(String),

    /// The identifier's schema segment names no registered subschema.
    #[error("no subschema registered for namespace `{0}`")]
    UnknownNamespace(String),

    /// An underlying subschema resolver failed during delegation.
    #[error("delegation to `{field}` failed: {message}")]
    Delegation { field: String, message: String },
}

pub type Result<T, E = ComposeError> = std::result::Result<T, E>;
