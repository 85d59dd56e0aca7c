//! Global identifier codec.
//!
//! Every object in every subschema is addressable by an opaque string of the
//! fixed shape `urn:<tag>:<schema-name>/<local-id>`. The codec is pure string
//! parsing: an identifier is routable to the owning subschema without
//! consulting any subschema, which is what lets the generic `node` resolver
//! pick its delegation target up front.

use crate::error::ResolveError;

/// Default namespace tag, matching the historical wire format.
pub const DEFAULT_NAMESPACE_TAG: &str = "ORG_NAMESPACE";

/// A decoded global identifier, borrowing from the input string.
///
/// `local_id` is opaque to the federation layer and may itself contain `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedId<'a> {
    pub schema: &'a str,
    pub local_id: &'a str,
}

/// Encoder/decoder for the global identifier wire format.
#[derive(Debug, Clone)]
pub struct IdCodec {
    tag: String,
}

impl IdCodec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// Encode a subschema-local identifier into the global wire format.
    ///
    /// Callers must only pass raw local ids; encoding an already-encoded
    /// value is a contract violation (use [`IdCodec::is_encoded`] to guard).
    pub fn encode(&self, schema: &str, local_id: &str) -> String {
        format!("urn:{}:{schema}/{local_id}", self.tag)
    }

    /// Decode a global identifier, failing on anything that does not match
    /// the wire format. Whether the schema segment names a *registered*
    /// subschema is checked at routing time, not here.
    pub fn decode<'a>(&self, id: &'a str) -> Result<DecodedId<'a>, ResolveError> {
        let malformed = || ResolveError::MalformedIdentifier(id.to_string());

        let rest = id.strip_prefix("urn:").ok_or_else(malformed)?;
        let rest = rest.strip_prefix(self.tag.as_str()).ok_or_else(malformed)?;
        let rest = rest.strip_prefix(':').ok_or_else(malformed)?;
        let (schema, local_id) = rest.split_once('/').ok_or_else(malformed)?;

        let schema_ok =
            !schema.is_empty() && schema.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !schema_ok || local_id.is_empty() {
            return Err(malformed());
        }

        Ok(DecodedId { schema, local_id })
    }

    /// Whether a value is already in the global identifier format.
    ///
    /// Only a fully well-formed identifier counts: a value that merely starts
    /// with `urn` is treated as an opaque local id by the rewrite step.
    pub fn is_encoded(&self, value: &str) -> bool {
        self.decode(value).is_ok()
    }
}

impl Default for IdCodec {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE_TAG)
    }
}
