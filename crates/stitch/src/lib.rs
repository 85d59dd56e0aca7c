//! Stitch independently authored graph-query subschemas into one executable
//! GraphQL schema with a single global identity space.
//!
//! Each subschema owns its types, root fields, and resolver. Composition
//! namespaces every subschema (so nothing collides), merges the results into
//! one `async_graphql::dynamic::Schema`, and installs:
//!
//! - a generic `node(id)` / `nodes(ids)` lookup routed by an opaque
//!   `urn:<tag>:<schema>/<local-id>` identifier,
//! - an identity rewrite so every `Node`-implementing type emits global
//!   identifiers, and
//! - declared join fields that let a type from one subschema fetch related
//!   data from another.
//!
//! Composition happens once at startup and the result is immutable; the
//! transport serving the schema is the caller's concern.
//!
//! ```no_run
//! # use graphweld_stitch::{ExtensionField, Federation, Join, TypeExpr};
//! # fn subschemas() -> (graphweld_stitch::Subschema, graphweld_stitch::Subschema) { unimplemented!() }
//! let (books, authors) = subschemas();
//! let schema = Federation::new()
//!     .subschema(books)
//!     .subschema(authors)
//!     .extend(ExtensionField::new(
//!         "books",
//!         "Book",
//!         "authors",
//!         TypeExpr::named_nn_list_nn("Author"),
//!         Join::new("authorUuids", "authors", "authorsByUuids", "uuids"),
//!     ))
//!     .compose()?;
//! # Ok::<(), graphweld_stitch::ComposeError>(())
//! ```

pub mod compose;
pub mod error;
pub mod ident;
pub mod subschema;

mod delegate;
mod transform;
mod value;

pub use {
    compose::Federation,
    delegate::{ExtensionField, Join},
    error::{ComposeError, ResolveError},
    ident::{DEFAULT_NAMESPACE_TAG, DecodedId, IdCodec},
    subschema::{
        ArgDef, FieldDef, ObjectDef, ResolveResult, Subschema, SubschemaBuilder,
        SubschemaResolver, TypeExpr,
    },
};
