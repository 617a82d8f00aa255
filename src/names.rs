//! Name utilities
//!
//! ISO 20022 schemas declare everything in one target namespace, so the
//! registries key types and elements by local name. Type references in
//! schema attributes appear either unprefixed (same target namespace) or
//! with the `xs:` prefix for builtins.

use crate::error::{Result, SchemaError};
use once_cell::sync::Lazy;
use regex::Regex;

static NCNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-\.]*$").unwrap());

/// Strip a `prefix:` from a QName as written in schema attributes
pub fn strip_prefix(qname: &str) -> &str {
    match qname.split_once(':') {
        Some((_, local)) => local,
        None => qname,
    }
}

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    NCNAME.is_match(name)
}

/// Validate an NCName, returning a parse error on failure
pub fn validate_ncname(name: &str) -> Result<()> {
    if is_valid_ncname(name) {
        Ok(())
    } else {
        Err(SchemaError::Parse(format!("invalid NCName: '{}'", name)))
    }
}
