//! Error types for iso20022-xsd
//!
//! `SchemaError` covers everything that can go wrong while loading and
//! building a schema model. `GenerationError` is reserved for internal
//! invariant violations inside the instance generator: a well-formed model
//! must never legitimately fail generation.

use std::fmt;
use thiserror::Error;

/// Result type alias using SchemaError
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Build-time schema error
///
/// Fatal variants abort the build. The only degraded condition, a missing
/// external code set, is not raised as an error at all: it is accumulated as
/// a [`ModelWarning`] on the returned model so the rest of the schema stays
/// usable.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A type or element reference does not resolve to any registered node
    #[error("unresolved reference: '{name}'")]
    UnresolvedReference {
        /// The qualified name that failed to resolve
        name: String,
    },

    /// Type inheritance forms a cycle
    #[error("cyclic inheritance: {}", chain.join(" -> "))]
    CyclicInheritance {
        /// The chain of type names forming the cycle, ending at the repeat
        chain: Vec<String>,
    },

    /// A derived restriction is looser than its base, or its facets are
    /// mutually unsatisfiable
    #[error("invalid restriction on type '{type_name}': {reason}")]
    InvalidRestriction {
        /// The offending type
        type_name: String,
        /// What made the restriction invalid
        reason: String,
    },

    /// minOccurs/maxOccurs are malformed (min > max, unparsable)
    #[error("invalid occurrence bounds on '{name}': {reason}")]
    InvalidOccurrence {
        /// Element or particle the bounds were declared on
        name: String,
        /// What made the bounds invalid
        reason: String,
    },

    /// The XSD text is not well-formed XML or is structurally not a schema
    #[error("schema parse error: {0}")]
    Parse(String),

    /// An imported/included schema could not be fetched
    #[error("resource error: {0}")]
    Resource(String),

    /// A resource limit was exceeded (size, import depth, component count)
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// The requested root element is not declared in the schema
    #[error("no such root element: '{0}'")]
    NoSuchRoot(String),
}

/// Internal generator failure
///
/// The generator assumes the builder only hands it satisfiable models; any
/// construction failure here indicates a bug, not bad user input.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The requested root element is not declared in the model
    #[error("no such root element: '{0}'")]
    UnknownRoot(String),

    /// A leaf could not be synthesized despite build-time validation
    #[error("internal invariant violated at '{path}': {reason}")]
    Invariant {
        /// Document path to the node being generated
        path: String,
        /// Description of the violated invariant
        reason: String,
    },

    /// Mandatory recursion exceeded the configured depth ceiling
    #[error("generation depth limit ({limit}) exceeded at '{path}'")]
    DepthExceeded {
        /// Document path where the limit was hit
        path: String,
        /// The configured ceiling
        limit: usize,
    },
}

/// Non-fatal condition recorded during a model build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelWarning {
    /// An externally referenced code set could not be resolved; the affected
    /// enumeration is left empty and the type flagged incomplete
    MissingCodeSet {
        /// Code set identifier (the external code type's local name)
        id: String,
        /// Qualified name of the type whose enumeration stays empty
        type_name: String,
    },
}

impl fmt::Display for ModelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelWarning::MissingCodeSet { id, type_name } => {
                write!(f, "missing code set '{}' for type '{}'", id, type_name)
            }
        }
    }
}
