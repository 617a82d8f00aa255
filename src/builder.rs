//! Constraint model builder
//!
//! Two-pass resolution over the merged schema tree. Pass 1 registers every
//! named type and top-level element without resolving anything, which breaks
//! forward-reference ordering issues. Pass 2 resolves base-type chains and
//! content models against the pass-1 registry and computes each type's
//! effective facet set.
//!
//! Inheritance chains are resolved recursively with an explicit in-progress
//! stack for cycle detection. Content-model type references are only
//! *validated* against the registry, never resolved recursively, so
//! recursive content models are fine while cyclic inheritance is a build
//! error.

use crate::error::{ModelWarning, Result, SchemaError};
use crate::generator::patterns::synthesize_where;
use crate::limits::Limits;
use crate::model::{
    BuiltinType, Derivation, ElementNode, FacetSet, Occurs, Particle, PatternFacet, SchemaModel,
    TypeKind, TypeNode, TypeRef, WhiteSpace,
};
use crate::names::strip_prefix;
use crate::tree::{load_merged, ImportResolver, TreeNode};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

/// Capability for resolving ISO 20022 external code sets
///
/// `External*Code` simple types carry no inline enumeration; their permitted
/// values live in an externally maintained list keyed by the type's local
/// name (e.g. `ExternalServiceLevel1Code`).
pub trait CodeSetResolver {
    /// Return the ordered code values for a code set identifier
    fn resolve(&self, id: &str) -> Option<Vec<String>>;
}

/// Resolver with no code sets; every external lookup degrades with a warning
#[derive(Debug, Default)]
pub struct NoCodeSets;

impl CodeSetResolver for NoCodeSets {
    fn resolve(&self, _id: &str) -> Option<Vec<String>> {
        None
    }
}

/// In-memory code set table, loadable from the published JSON format
#[derive(Debug, Default)]
pub struct StaticCodeSets {
    sets: HashMap<String, Vec<String>>,
}

#[derive(Deserialize)]
struct CodeSetFile {
    definitions: HashMap<String, CodeSetEntry>,
}

#[derive(Deserialize)]
struct CodeSetEntry {
    #[serde(default, rename = "enum")]
    values: Vec<String>,
}

impl StaticCodeSets {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one code set
    pub fn insert(&mut self, id: impl Into<String>, values: Vec<String>) {
        self.sets.insert(id.into(), values);
    }

    /// Load from the `{"definitions": {id: {"enum": [...]}}}` JSON format
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CodeSetFile = serde_json::from_str(json)
            .map_err(|e| SchemaError::Resource(format!("invalid code set JSON: {}", e)))?;
        let sets = file
            .definitions
            .into_iter()
            .map(|(id, entry)| (id, entry.values))
            .collect();
        Ok(Self { sets })
    }
}

impl CodeSetResolver for StaticCodeSets {
    fn resolve(&self, id: &str) -> Option<Vec<String>> {
        self.sets.get(id).cloned()
    }
}

/// Build a [`SchemaModel`] from raw XSD text
///
/// `imports` supplies the text of imported/included schemas; `codes`
/// supplies external code lists. Fatal schema defects abort the build;
/// missing code sets degrade into warnings on the returned model.
pub fn build_model(
    xsd: &str,
    imports: &dyn ImportResolver,
    codes: &dyn CodeSetResolver,
    limits: &Limits,
) -> Result<SchemaModel> {
    let tree = load_merged(xsd, imports, limits)?;
    Builder::new(codes, limits).build(&tree)
}

struct Builder<'a> {
    codes: &'a dyn CodeSetResolver,
    limits: &'a Limits,
    raw_types: IndexMap<String, TreeNode>,
    raw_elements: IndexMap<String, TreeNode>,
    resolved: IndexMap<String, TypeNode>,
    in_progress: Vec<String>,
    warnings: Vec<ModelWarning>,
    anon_counter: usize,
}

impl<'a> Builder<'a> {
    fn new(codes: &'a dyn CodeSetResolver, limits: &'a Limits) -> Self {
        Self {
            codes,
            limits,
            raw_types: IndexMap::new(),
            raw_elements: IndexMap::new(),
            resolved: IndexMap::new(),
            in_progress: Vec::new(),
            warnings: Vec::new(),
            anon_counter: 0,
        }
    }

    fn build(mut self, schema: &TreeNode) -> Result<SchemaModel> {
        self.register(schema)?;
        tracing::debug!(
            types = self.raw_types.len(),
            elements = self.raw_elements.len(),
            "registered global declarations"
        );

        let type_names: Vec<String> = self.raw_types.keys().cloned().collect();
        for name in &type_names {
            self.ensure_type(name)?;
        }

        let element_names: Vec<String> = self.raw_elements.keys().cloned().collect();
        let mut elements = IndexMap::new();
        for name in element_names {
            let node = self.raw_elements[&name].clone();
            let element = self.resolve_element(&node)?;
            elements.insert(name, element);
        }

        Ok(SchemaModel {
            target_namespace: schema.attr("targetNamespace").map(|s| s.to_string()),
            types: self.resolved,
            elements,
            warnings: self.warnings,
        })
    }

    /// Pass 1: register named global declarations without resolving
    fn register(&mut self, schema: &TreeNode) -> Result<()> {
        for child in &schema.children {
            match child.name.as_str() {
                "simpleType" | "complexType" => {
                    if let Some(name) = child.attr("name") {
                        crate::names::validate_ncname(name)?;
                        self.raw_types.insert(name.to_string(), child.clone());
                    }
                }
                "element" => {
                    if let Some(name) = child.attr("name") {
                        crate::names::validate_ncname(name)?;
                        self.raw_elements.insert(name.to_string(), child.clone());
                    }
                }
                "annotation" => {}
                other => {
                    tracing::debug!(construct = other, "skipping unsupported global construct");
                }
            }
        }
        self.limits
            .check_components(self.raw_types.len() + self.raw_elements.len())?;
        Ok(())
    }

    /// Pass 2 entry point: resolve one named type, memoized
    fn ensure_type(&mut self, name: &str) -> Result<()> {
        if self.resolved.contains_key(name) {
            return Ok(());
        }
        if let Some(pos) = self.in_progress.iter().position(|n| n == name) {
            let mut chain: Vec<String> = self.in_progress[pos..].to_vec();
            chain.push(name.to_string());
            return Err(SchemaError::CyclicInheritance { chain });
        }

        let node = self
            .raw_types
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnresolvedReference {
                name: name.to_string(),
            })?;

        self.in_progress.push(name.to_string());
        let result = match node.name.as_str() {
            "simpleType" => self.resolve_simple(name, &node),
            "complexType" => self.resolve_complex(name, &node),
            other => Err(SchemaError::Parse(format!(
                "'{}' registered as a type but is a '{}'",
                name, other
            ))),
        };
        self.in_progress.pop();

        let type_node = result?;
        self.resolved.insert(name.to_string(), type_node);
        Ok(())
    }

    fn resolve_simple(&mut self, name: &str, node: &TreeNode) -> Result<TypeNode> {
        let restriction = match node.find_child("restriction") {
            Some(r) => r,
            None => {
                // union/list are outside the ISO 20022 subset; a bare
                // simpleType degrades to an unconstrained string
                return Ok(TypeNode {
                    name: name.to_string(),
                    kind: TypeKind::Simple,
                    base: None,
                    derivation: None,
                    facets: FacetSet::default(),
                    builtin: BuiltinType::String,
                    content: None,
                    missing_code_set: None,
                });
            }
        };

        let (base_ref, builtin, base_facets) = self.resolve_simple_base(name, restriction)?;
        let declared = extract_facets(restriction, name)?;
        let mut facets = declared.merge_restriction(&base_facets, name)?;

        let mut missing_code_set = None;
        if facets.enumeration.is_none() && is_external_code_name(name) {
            match self.codes.resolve(name) {
                Some(values) => {
                    tracing::debug!(code_set = name, count = values.len(), "expanded code set");
                    facets.enumeration = Some(values);
                }
                None => {
                    tracing::warn!(code_set = name, "external code set not found");
                    self.warnings.push(ModelWarning::MissingCodeSet {
                        id: name.to_string(),
                        type_name: name.to_string(),
                    });
                    missing_code_set = Some(name.to_string());
                }
            }
        }

        validate_enumeration(&mut facets, name)?;
        validate_pattern_satisfiability(&facets, name)?;

        Ok(TypeNode {
            name: name.to_string(),
            kind: TypeKind::Simple,
            base: Some(base_ref),
            derivation: Some(Derivation::Restriction),
            facets,
            builtin,
            content: None,
            missing_code_set,
        })
    }

    /// Resolve the `base` attribute of a simple restriction into the
    /// (reference, builtin category, inherited facets) triple
    fn resolve_simple_base(
        &mut self,
        name: &str,
        restriction: &TreeNode,
    ) -> Result<(TypeRef, BuiltinType, FacetSet)> {
        let base_name = strip_prefix(restriction.attr("base").unwrap_or("string")).to_string();

        if let Some(builtin) = BuiltinType::from_xsd_name(&base_name) {
            return Ok((TypeRef::Builtin(builtin), builtin, FacetSet::default()));
        }

        self.ensure_type(&base_name)?;
        let base = &self.resolved[&base_name];
        if base.kind != TypeKind::Simple {
            return Err(SchemaError::InvalidRestriction {
                type_name: name.to_string(),
                reason: format!("base type '{}' is not a simple type", base_name),
            });
        }
        Ok((
            TypeRef::Named(base_name),
            base.builtin,
            base.facets.clone(),
        ))
    }

    fn resolve_complex(&mut self, name: &str, node: &TreeNode) -> Result<TypeNode> {
        if let Some(simple_content) = node.find_child("simpleContent") {
            return self.resolve_simple_content(name, simple_content);
        }

        if let Some(complex_content) = node.find_child("complexContent") {
            return self.resolve_complex_content(name, complex_content);
        }

        let content = match find_compositor(node) {
            Some(compositor) => Some(self.build_particle(compositor, name)?),
            None => None,
        };

        Ok(TypeNode {
            name: name.to_string(),
            kind: TypeKind::Complex,
            base: None,
            derivation: None,
            facets: FacetSet::default(),
            builtin: BuiltinType::String,
            content,
            missing_code_set: None,
        })
    }

    /// simpleContent types carry text plus attributes (e.g. ISO 20022
    /// amount-with-currency). Attributes are outside the modeled subset, so
    /// the node reduces to a simple type with the base chain's facets.
    fn resolve_simple_content(&mut self, name: &str, simple_content: &TreeNode) -> Result<TypeNode> {
        let (derivation, inner) = match (
            simple_content.find_child("extension"),
            simple_content.find_child("restriction"),
        ) {
            (Some(e), _) => (Derivation::Extension, e),
            (None, Some(r)) => (Derivation::Restriction, r),
            (None, None) => {
                return Err(SchemaError::Parse(format!(
                    "simpleContent of '{}' has neither extension nor restriction",
                    name
                )))
            }
        };

        let (base_ref, builtin, base_facets) = self.resolve_simple_base(name, inner)?;
        let facets = match derivation {
            Derivation::Extension => base_facets,
            Derivation::Restriction => {
                let declared = extract_facets(inner, name)?;
                declared.merge_restriction(&base_facets, name)?
            }
        };
        validate_pattern_satisfiability(&facets, name)?;

        Ok(TypeNode {
            name: name.to_string(),
            kind: TypeKind::Simple,
            base: Some(base_ref),
            derivation: Some(derivation),
            facets,
            builtin,
            content: None,
            missing_code_set: None,
        })
    }

    fn resolve_complex_content(
        &mut self,
        name: &str,
        complex_content: &TreeNode,
    ) -> Result<TypeNode> {
        let (derivation, inner) = match (
            complex_content.find_child("extension"),
            complex_content.find_child("restriction"),
        ) {
            (Some(e), _) => (Derivation::Extension, e),
            (None, Some(r)) => (Derivation::Restriction, r),
            (None, None) => {
                return Err(SchemaError::Parse(format!(
                    "complexContent of '{}' has neither extension nor restriction",
                    name
                )))
            }
        };

        let base_name = strip_prefix(inner.attr("base").unwrap_or("")).to_string();
        if base_name.is_empty() {
            return Err(SchemaError::Parse(format!(
                "complexContent of '{}' has no base",
                name
            )));
        }
        self.ensure_type(&base_name)?;
        let base = self.resolved[&base_name].clone();
        if base.kind != TypeKind::Complex {
            return Err(SchemaError::InvalidRestriction {
                type_name: name.to_string(),
                reason: format!("complexContent base '{}' is not a complex type", base_name),
            });
        }

        let own_content = match find_compositor(inner) {
            Some(compositor) => Some(self.build_particle(compositor, name)?),
            None => None,
        };

        // Extension appends to the base's content model; restriction
        // redeclares it wholesale.
        let content = match derivation {
            Derivation::Extension => match (base.content.clone(), own_content) {
                (Some(base_part), Some(own_part)) => Some(Particle::Sequence {
                    occurs: Occurs::once(),
                    particles: vec![base_part, own_part],
                }),
                (Some(base_part), None) => Some(base_part),
                (None, own) => own,
            },
            Derivation::Restriction => own_content.or(base.content.clone()),
        };

        Ok(TypeNode {
            name: name.to_string(),
            kind: TypeKind::Complex,
            base: Some(TypeRef::Named(base_name)),
            derivation: Some(derivation),
            facets: FacetSet::default(),
            builtin: BuiltinType::String,
            content,
            missing_code_set: None,
        })
    }

    fn build_particle(&mut self, node: &TreeNode, ctx: &str) -> Result<Particle> {
        let occurs = Occurs::parse(node.attr("minOccurs"), node.attr("maxOccurs"), ctx)?;
        let mut particles = Vec::new();
        for child in &node.children {
            match child.name.as_str() {
                "element" => particles.push(Particle::Element(self.resolve_element(child)?)),
                "sequence" | "choice" => particles.push(self.build_particle(child, ctx)?),
                "annotation" => {}
                other => {
                    return Err(SchemaError::Parse(format!(
                        "unsupported content-model construct '{}' in '{}'",
                        other, ctx
                    )))
                }
            }
        }
        match node.name.as_str() {
            "sequence" => Ok(Particle::Sequence { occurs, particles }),
            "choice" => Ok(Particle::Choice { occurs, particles }),
            other => Err(SchemaError::Parse(format!(
                "unsupported compositor '{}' in '{}'",
                other, ctx
            ))),
        }
    }

    fn resolve_element(&mut self, node: &TreeNode) -> Result<ElementNode> {
        // ref= points at a top-level declaration; local occurrence bounds win
        if let Some(reference) = node.attr("ref") {
            let ref_name = strip_prefix(reference).to_string();
            let referenced = self.raw_elements.get(&ref_name).cloned().ok_or_else(|| {
                SchemaError::UnresolvedReference {
                    name: ref_name.clone(),
                }
            })?;
            let mut element = self.resolve_element(&referenced)?;
            element.occurs =
                Occurs::parse(node.attr("minOccurs"), node.attr("maxOccurs"), &ref_name)?;
            return Ok(element);
        }

        let name = node
            .attr("name")
            .ok_or_else(|| SchemaError::Parse("element without name or ref".into()))?
            .to_string();
        let occurs = Occurs::parse(node.attr("minOccurs"), node.attr("maxOccurs"), &name)?;
        let nillable = node.attr("nillable") == Some("true");
        let fixed = node.attr("fixed").map(|s| s.to_string());
        let default = node.attr("default").map(|s| s.to_string());

        let type_ref = if let Some(type_attr) = node.attr("type") {
            let type_name = strip_prefix(type_attr).to_string();
            match BuiltinType::from_xsd_name(&type_name) {
                Some(builtin) => TypeRef::Builtin(builtin),
                None => {
                    // existence check only; the main pass resolves every
                    // named type, and recursing here would misreport
                    // recursive content models as inheritance cycles
                    if !self.raw_types.contains_key(&type_name) {
                        return Err(SchemaError::UnresolvedReference { name: type_name });
                    }
                    TypeRef::Named(type_name)
                }
            }
        } else if let Some(inline) = node
            .find_child("simpleType")
            .or_else(|| node.find_child("complexType"))
        {
            // anonymous type: registered under a synthesized unique name so
            // every reference in the model resolves by lookup
            self.anon_counter += 1;
            let anon_name = format!("{}__anon{}", name, self.anon_counter);
            let type_node = match inline.name.as_str() {
                "simpleType" => self.resolve_simple(&anon_name, inline)?,
                _ => self.resolve_complex(&anon_name, inline)?,
            };
            self.resolved.insert(anon_name.clone(), type_node);
            TypeRef::Named(anon_name)
        } else {
            // untyped element (xs:anyType); treat as unconstrained text
            TypeRef::Builtin(BuiltinType::String)
        };

        Ok(ElementNode {
            name,
            type_ref,
            occurs,
            nillable,
            fixed,
            default,
        })
    }
}

fn find_compositor(node: &TreeNode) -> Option<&TreeNode> {
    node.children
        .iter()
        .find(|c| c.name == "sequence" || c.name == "choice")
}

fn is_external_code_name(name: &str) -> bool {
    name.starts_with("External") && name.ends_with("Code")
}

/// Pre-validate the enumeration against the other facets: every retained
/// literal must satisfy them, and at least one must survive.
fn validate_enumeration(facets: &mut FacetSet, type_name: &str) -> Result<()> {
    let Some(values) = facets.enumeration.take() else {
        return Ok(());
    };
    let mut check = facets.clone();
    check.enumeration = None;
    let kept: Vec<String> = values
        .into_iter()
        .filter(|v| check.satisfied_by(v))
        .collect();
    if kept.is_empty() {
        return Err(SchemaError::InvalidRestriction {
            type_name: type_name.to_string(),
            reason: "enumeration and pattern facets have an empty intersection".into(),
        });
    }
    facets.enumeration = Some(kept);
    Ok(())
}

/// The pattern facets of a merged set must admit at least one value that
/// also passes the length and digit facets. Checked here with the same
/// bounded, seeded search the generator uses, so an unsatisfiable leaf is
/// a build error and never a lazy generation failure.
fn validate_pattern_satisfiability(facets: &FacetSet, type_name: &str) -> Result<()> {
    if facets.patterns.is_empty() || facets.enumeration.is_some() {
        return Ok(());
    }
    let sources: Vec<&str> = facets
        .patterns
        .iter()
        .rev()
        .map(|p| p.source.as_str())
        .collect();
    let mut rng = StdRng::seed_from_u64(0);
    if synthesize_where(&sources, |v| facets.satisfied_by(v), &mut rng).is_none() {
        return Err(SchemaError::InvalidRestriction {
            type_name: type_name.to_string(),
            reason: "pattern facets admit no value that satisfies the other facets".into(),
        });
    }
    Ok(())
}

fn extract_facets(restriction: &TreeNode, type_name: &str) -> Result<FacetSet> {
    let mut facets = FacetSet::default();
    let mut patterns: Vec<String> = Vec::new();
    let mut enumeration: Vec<String> = Vec::new();

    let parse_u32 = |node: &TreeNode| -> Result<u32> {
        let value = node.attr("value").unwrap_or("");
        value.parse::<u32>().map_err(|_| SchemaError::InvalidRestriction {
            type_name: type_name.to_string(),
            reason: format!("{} value '{}' is not a non-negative integer", node.name, value),
        })
    };
    let parse_decimal = |node: &TreeNode| -> Result<Decimal> {
        let value = node.attr("value").unwrap_or("");
        value.parse::<Decimal>().map_err(|_| SchemaError::InvalidRestriction {
            type_name: type_name.to_string(),
            reason: format!("{} value '{}' is not a decimal", node.name, value),
        })
    };

    for child in &restriction.children {
        match child.name.as_str() {
            "pattern" => {
                if let Some(value) = child.attr("value") {
                    patterns.push(value.to_string());
                }
            }
            "enumeration" => {
                if let Some(value) = child.attr("value") {
                    enumeration.push(value.to_string());
                }
            }
            "length" => facets.length = Some(parse_u32(child)?),
            "minLength" => facets.min_length = Some(parse_u32(child)?),
            "maxLength" => facets.max_length = Some(parse_u32(child)?),
            "minInclusive" => facets.min_inclusive = Some(parse_decimal(child)?),
            "maxInclusive" => facets.max_inclusive = Some(parse_decimal(child)?),
            "minExclusive" => facets.min_exclusive = Some(parse_decimal(child)?),
            "maxExclusive" => facets.max_exclusive = Some(parse_decimal(child)?),
            "totalDigits" => facets.total_digits = Some(parse_u32(child)?),
            "fractionDigits" => facets.fraction_digits = Some(parse_u32(child)?),
            "whiteSpace" => {
                facets.white_space =
                    Some(WhiteSpace::parse(child.attr("value").unwrap_or(""), type_name)?)
            }
            "annotation" => {}
            _ => {}
        }
    }

    // Multiple pattern facets in one restriction step are alternatives per
    // the XSD spec; fold them into a single branch pattern. Patterns from
    // different derivation steps stay separate and must all match.
    match patterns.len() {
        0 => {}
        1 => facets.patterns.push(PatternFacet::new(&patterns[0], type_name)?),
        _ => {
            let combined = patterns
                .iter()
                .map(|p| format!("({})", p))
                .collect::<Vec<_>>()
                .join("|");
            facets.patterns.push(PatternFacet::new(&combined, type_name)?);
        }
    }
    if !enumeration.is_empty() {
        facets.enumeration = Some(enumeration);
    }

    Ok(facets)
}
