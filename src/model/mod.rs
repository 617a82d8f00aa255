//! The schema constraint model
//!
//! A [`SchemaModel`] is the canonical, type-complete representation of one
//! schema version: a registry of [`TypeNode`]s and top-level
//! [`ElementNode`]s with fully resolved facets, occurrence bounds and
//! inheritance chains. It is built once, is immutable afterwards, and owns
//! every node; references between nodes go through name lookup, never
//! through owning pointers, so recursive content models cannot create
//! ownership cycles.

pub mod facets;
pub mod occurs;
pub mod particles;

pub use facets::{FacetKind, FacetSet, PatternFacet, WhiteSpace};
pub use occurs::Occurs;
pub use particles::Particle;

use crate::error::{ModelWarning, Result, SchemaError};
use indexmap::IndexMap;
use serde::Serialize;

/// Primitive value space at the root of a simple type's derivation chain
///
/// ISO 20022 schemas derive everything from a handful of XSD builtins; the
/// generator keys its leaf synthesis off this category when no facet pins
/// the value down further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinType {
    /// xs:string and its derivations
    String,
    /// xs:decimal
    Decimal,
    /// xs:integer, xs:int, xs:long, xs:short, xs:nonNegativeInteger
    Integer,
    /// xs:boolean
    Boolean,
    /// xs:date
    Date,
    /// xs:dateTime
    DateTime,
    /// xs:time
    Time,
    /// xs:gYear
    Year,
    /// xs:gYearMonth
    YearMonth,
    /// xs:base64Binary
    Base64Binary,
    /// xs:anyURI
    AnyUri,
}

impl BuiltinType {
    /// Map an XSD builtin local name to its category
    ///
    /// Returns None for names that are not XSD builtins (user-defined type
    /// references).
    pub fn from_xsd_name(local: &str) -> Option<Self> {
        match local {
            "string" | "normalizedString" | "token" | "NMTOKEN" | "Name" | "NCName" | "ID"
            | "IDREF" => Some(BuiltinType::String),
            "decimal" => Some(BuiltinType::Decimal),
            "integer" | "int" | "long" | "short" | "byte" | "nonNegativeInteger"
            | "positiveInteger" | "nonPositiveInteger" | "negativeInteger" | "unsignedInt"
            | "unsignedLong" | "unsignedShort" | "unsignedByte" => Some(BuiltinType::Integer),
            "boolean" => Some(BuiltinType::Boolean),
            "date" => Some(BuiltinType::Date),
            "dateTime" => Some(BuiltinType::DateTime),
            "time" => Some(BuiltinType::Time),
            "gYear" => Some(BuiltinType::Year),
            "gYearMonth" => Some(BuiltinType::YearMonth),
            "base64Binary" => Some(BuiltinType::Base64Binary),
            "anyURI" => Some(BuiltinType::AnyUri),
            _ => None,
        }
    }
}

/// Reference to a type: either an XSD builtin or a named node in the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// Direct reference to an XSD builtin
    Builtin(BuiltinType),
    /// Reference to a named type registered in the same model
    Named(String),
}

/// Whether a type derives from its base by restriction or extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// Facets tighten; content model must be a subset
    Restriction,
    /// Content model appends to the base's
    Extension,
}

/// Kind discriminant for type nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TypeKind {
    /// Simple type: carries facets, no content model
    Simple,
    /// Complex type: carries a content model
    Complex,
}

/// One type definition, fully resolved
#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    /// Name the type is registered under
    pub name: String,
    /// Simple or complex
    pub kind: TypeKind,
    /// Base type of the derivation chain, if derived
    pub base: Option<TypeRef>,
    /// How this type derives from its base
    pub derivation: Option<Derivation>,
    /// Effective facet set: local facets merged through the base chain
    pub facets: FacetSet,
    /// Primitive category at the root of the chain (simple types)
    pub builtin: BuiltinType,
    /// Content model with extension bases prepended (complex types)
    pub content: Option<Particle>,
    /// Set when an external code set lookup failed; the enumeration stays
    /// empty and generation falls back to the other facets
    pub missing_code_set: Option<String>,
}

/// One element declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    /// Local element name as it appears in instance documents
    pub name: String,
    /// The element's type
    pub type_ref: TypeRef,
    /// Occurrence bounds
    pub occurs: Occurs,
    /// Whether xsi:nil="true" is permitted
    pub nillable: bool,
    /// Fixed value, emitted verbatim
    pub fixed: Option<String>,
    /// Default value, emitted verbatim when present
    pub default: Option<String>,
}

/// Counts and identifiers describing a built model
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    /// Target namespace of the schema
    pub target_namespace: Option<String>,
    /// Names of the top-level elements
    pub root_elements: Vec<String>,
    /// Number of simple types
    pub simple_types: usize,
    /// Number of complex types
    pub complex_types: usize,
    /// Warnings accumulated during the build
    pub warnings: Vec<String>,
}

/// The canonical constraint model for one schema version
///
/// Immutable once built; owned exclusively by the request that built it.
#[derive(Debug, Clone)]
pub struct SchemaModel {
    /// Target namespace declared by the schema
    pub target_namespace: Option<String>,
    /// All named types, in declaration order
    pub types: IndexMap<String, TypeNode>,
    /// All top-level elements, in declaration order
    pub elements: IndexMap<String, ElementNode>,
    /// Degraded conditions recorded during the build
    pub warnings: Vec<ModelWarning>,
}

impl SchemaModel {
    /// Resolve a type reference against this model
    ///
    /// Builtin references resolve to None (they have no node); named
    /// references must resolve, the builder guarantees it.
    pub fn type_node(&self, type_ref: &TypeRef) -> Option<&TypeNode> {
        match type_ref {
            TypeRef::Builtin(_) => None,
            TypeRef::Named(name) => self.types.get(name),
        }
    }

    /// Look up the root element to start generation or diffing from
    ///
    /// With `None`, the schema's first top-level element is used — ISO 20022
    /// message schemas declare exactly one (`Document`).
    pub fn root_element(&self, name: Option<&str>) -> Result<&ElementNode> {
        match name {
            Some(name) => self
                .elements
                .get(name)
                .ok_or_else(|| SchemaError::NoSuchRoot(name.to_string())),
            None => self
                .elements
                .values()
                .next()
                .ok_or_else(|| SchemaError::NoSuchRoot("<first element>".to_string())),
        }
    }

    /// The effective facet set of a type reference
    ///
    /// Builtins have an empty facet set; named types carry their merged set.
    pub fn effective_facets(&self, type_ref: &TypeRef) -> FacetSet {
        match self.type_node(type_ref) {
            Some(node) => node.facets.clone(),
            None => FacetSet::default(),
        }
    }

    /// The builtin category a type reference bottoms out in
    pub fn builtin_of(&self, type_ref: &TypeRef) -> BuiltinType {
        match type_ref {
            TypeRef::Builtin(b) => *b,
            TypeRef::Named(name) => self
                .types
                .get(name)
                .map(|t| t.builtin)
                .unwrap_or(BuiltinType::String),
        }
    }

    /// Summarize the model for reports and the CLI
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            target_namespace: self.target_namespace.clone(),
            root_elements: self.elements.keys().cloned().collect(),
            simple_types: self
                .types
                .values()
                .filter(|t| t.kind == TypeKind::Simple)
                .count(),
            complex_types: self
                .types
                .values()
                .filter(|t| t.kind == TypeKind::Complex)
                .count(),
            warnings: self.warnings.iter().map(|w| w.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_mapping() {
        assert_eq!(BuiltinType::from_xsd_name("string"), Some(BuiltinType::String));
        assert_eq!(BuiltinType::from_xsd_name("decimal"), Some(BuiltinType::Decimal));
        assert_eq!(BuiltinType::from_xsd_name("gYear"), Some(BuiltinType::Year));
        assert_eq!(BuiltinType::from_xsd_name("Max35Text"), None);
    }

    #[test]
    fn test_root_element_lookup() {
        let mut elements = IndexMap::new();
        elements.insert(
            "Document".to_string(),
            ElementNode {
                name: "Document".to_string(),
                type_ref: TypeRef::Builtin(BuiltinType::String),
                occurs: Occurs::once(),
                nillable: false,
                fixed: None,
                default: None,
            },
        );
        let model = SchemaModel {
            target_namespace: None,
            types: IndexMap::new(),
            elements,
            warnings: Vec::new(),
        };

        assert_eq!(model.root_element(None).unwrap().name, "Document");
        assert_eq!(model.root_element(Some("Document")).unwrap().name, "Document");
        assert!(matches!(
            model.root_element(Some("Missing")),
            Err(SchemaError::NoSuchRoot(_))
        ));
    }
}
