//! Structural schema differ
//!
//! Compares two [`SchemaModel`]s by walking their content models in
//! parallel from a common root. Alignment is by element name first, then
//! by position, so an insertion mid-sequence does not cascade into
//! spurious changes for everything after it. Type identity is judged by
//! the effective facet set, never by the declared type name: a cosmetic
//! type rename with identical resolved constraints reports nothing.

use crate::model::{
    BuiltinType, ElementNode, FacetKind, FacetSet, Occurs, Particle, SchemaModel, TypeKind,
    TypeRef,
};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// What changed at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffKind {
    /// Element exists only in the new model
    Added,
    /// Element exists only in the old model
    Removed,
    /// The primitive category or simple/complex kind changed
    TypeChanged,
    /// One facet kind's value changed
    FacetChanged,
    /// Occurrence bounds changed incomparably (neither pure widening nor
    /// pure narrowing)
    OccursChanged,
    /// Occurrence bounds admit strictly more than before
    CardinalityRelaxed,
    /// Occurrence bounds admit strictly less than before
    CardinalityTightened,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiffKind::Added => "added",
            DiffKind::Removed => "removed",
            DiffKind::TypeChanged => "type-changed",
            DiffKind::FacetChanged => "facet-changed",
            DiffKind::OccursChanged => "occurs-changed",
            DiffKind::CardinalityRelaxed => "cardinality-relaxed",
            DiffKind::CardinalityTightened => "cardinality-tightened",
        };
        write!(f, "{}", s)
    }
}

/// Whether instances valid under the old schema can break under the new
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    /// Old-valid instances may be rejected by the new schema
    Breaking,
    /// Every old-valid instance stays valid
    NonBreaking,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Breaking => write!(f, "breaking"),
            Severity::NonBreaking => write!(f, "non-breaking"),
        }
    }
}

/// One detected difference
///
/// Facet changes yield one record per changed facet kind, so a report can
/// name exactly which constraint moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRecord {
    /// The change kind
    pub kind: DiffKind,
    /// Element names from the document root to the differing node
    pub path: Vec<String>,
    /// The facet kind that changed, for facet-changed records
    pub facet: Option<FacetKind>,
    /// Old-side representation of the changed value
    pub old: Option<String>,
    /// New-side representation of the changed value
    pub new: Option<String>,
    /// Derived from the kind and the direction of the change
    pub severity: Severity,
}

/// Diff two models from a root element
///
/// `root` of `None` uses each model's first top-level element. Total: a
/// root missing on either side becomes an added/removed record instead of
/// an error. Output is deterministic, ordered by path then kind.
pub fn diff(old: &SchemaModel, new: &SchemaModel, root: Option<&str>) -> Vec<DiffRecord> {
    let mut differ = Differ {
        old,
        new,
        records: Vec::new(),
        visiting: HashSet::new(),
    };

    let old_root = old.root_element(root).ok();
    let new_root = new.root_element(root).ok();
    match (old_root, new_root) {
        (Some(a), Some(b)) if a.name == b.name => {
            let path = vec![a.name.clone()];
            differ.compare_elements(a, b, a.occurs, b.occurs, &path);
        }
        (old_root, new_root) => {
            if let Some(a) = old_root {
                differ.removed(a, &[]);
            }
            if let Some(b) = new_root {
                differ.added(b, &[]);
            }
        }
    }

    differ.records.sort_by(|a, b| {
        (&a.path, a.kind, a.facet).cmp(&(&b.path, b.kind, b.facet))
    });
    differ.records
}

struct Differ<'m> {
    old: &'m SchemaModel,
    new: &'m SchemaModel,
    records: Vec<DiffRecord>,
    /// Named-type pairs currently on the comparison stack, so recursive
    /// content models terminate
    visiting: HashSet<(String, String)>,
}

/// A flattened child slot: the element plus its occurrence bounds composed
/// with every enclosing group's
struct Slot<'m> {
    occurs: Occurs,
    element: &'m ElementNode,
}

impl<'m> Differ<'m> {
    fn compare_elements(
        &mut self,
        old_el: &ElementNode,
        new_el: &ElementNode,
        old_occurs: Occurs,
        new_occurs: Occurs,
        path: &[String],
    ) {
        self.compare_occurs(old_occurs, new_occurs, path);

        let old_builtin = self.old.builtin_of(&old_el.type_ref);
        let new_builtin = self.new.builtin_of(&new_el.type_ref);
        let old_kind = self.type_kind(self.old, &old_el.type_ref);
        let new_kind = self.type_kind(self.new, &new_el.type_ref);

        if old_kind != new_kind || (old_kind == TypeKind::Simple && old_builtin != new_builtin) {
            self.records.push(DiffRecord {
                kind: DiffKind::TypeChanged,
                path: path.to_vec(),
                facet: None,
                old: Some(type_label(old_kind, old_builtin)),
                new: Some(type_label(new_kind, new_builtin)),
                severity: Severity::Breaking,
            });
            return;
        }

        match old_kind {
            TypeKind::Simple => {
                let old_facets = self.old.effective_facets(&old_el.type_ref);
                let new_facets = self.new.effective_facets(&new_el.type_ref);
                self.compare_facets(&old_facets, &new_facets, path);
            }
            TypeKind::Complex => self.compare_content(old_el, new_el, path),
        }
    }

    fn type_kind(&self, model: &SchemaModel, type_ref: &TypeRef) -> TypeKind {
        model
            .type_node(type_ref)
            .map(|t| t.kind)
            .unwrap_or(TypeKind::Simple)
    }

    fn compare_content(&mut self, old_el: &ElementNode, new_el: &ElementNode, path: &[String]) {
        // guard recursive content models; an already-visiting pair has its
        // differences reported at the outermost occurrence
        let key = match (&old_el.type_ref, &new_el.type_ref) {
            (TypeRef::Named(a), TypeRef::Named(b)) => Some((a.clone(), b.clone())),
            _ => None,
        };
        if let Some(key) = &key {
            if !self.visiting.insert(key.clone()) {
                return;
            }
        }

        let old_children = self.children(self.old, &old_el.type_ref);
        let new_children = self.children(self.new, &new_el.type_ref);
        self.align(&old_children, &new_children, path);

        if let Some(key) = key {
            self.visiting.remove(&key);
        }
    }

    fn children(&self, model: &'m SchemaModel, type_ref: &TypeRef) -> Vec<Slot<'m>> {
        let mut slots = Vec::new();
        if let Some(content) = model.type_node(type_ref).and_then(|t| t.content.as_ref()) {
            flatten(content, Occurs::once(), &mut slots);
        }
        slots
    }

    /// Name-then-position alignment: each old slot claims the first
    /// unclaimed new slot with the same name. Duplicate names pair up in
    /// order; everything unclaimed is an addition or removal.
    fn align(&mut self, old_children: &[Slot<'m>], new_children: &[Slot<'m>], path: &[String]) {
        let mut claimed = vec![false; new_children.len()];
        let mut pairs = Vec::new();

        for old_slot in old_children {
            let matched = new_children.iter().enumerate().position(|(i, new_slot)| {
                !claimed[i] && new_slot.element.name == old_slot.element.name
            });
            match matched {
                Some(i) => {
                    claimed[i] = true;
                    pairs.push((old_slot, &new_children[i]));
                }
                None => self.removed(old_slot.element, path),
            }
        }
        for (i, new_slot) in new_children.iter().enumerate() {
            if !claimed[i] {
                self.added(new_slot.element, path);
            }
        }

        for (old_slot, new_slot) in pairs {
            let mut child_path = path.to_vec();
            child_path.push(old_slot.element.name.clone());
            self.compare_elements(
                old_slot.element,
                new_slot.element,
                old_slot.occurs,
                new_slot.occurs,
                &child_path,
            );
        }
    }

    fn compare_occurs(&mut self, old: Occurs, new: Occurs, path: &[String]) {
        if old == new {
            return;
        }
        let (kind, severity) = if new.is_relaxation_of(&old) {
            (DiffKind::CardinalityRelaxed, Severity::NonBreaking)
        } else if new.is_restriction_of(&old) {
            (DiffKind::CardinalityTightened, Severity::Breaking)
        } else {
            (DiffKind::OccursChanged, Severity::Breaking)
        };
        self.records.push(DiffRecord {
            kind,
            path: path.to_vec(),
            facet: None,
            old: Some(old.to_string()),
            new: Some(new.to_string()),
            severity,
        });
    }

    fn compare_facets(&mut self, old: &FacetSet, new: &FacetSet, path: &[String]) {
        for kind in FacetKind::ALL {
            let old_value = old.value_of(kind);
            let new_value = new.value_of(kind);
            if old_value == new_value {
                continue;
            }
            self.records.push(DiffRecord {
                kind: DiffKind::FacetChanged,
                path: path.to_vec(),
                facet: Some(kind),
                old: old_value,
                new: new_value,
                severity: facet_severity(kind, old, new),
            });
        }
    }

    fn removed(&mut self, element: &ElementNode, path: &[String]) {
        let mut path = path.to_vec();
        path.push(element.name.clone());
        self.records.push(DiffRecord {
            kind: DiffKind::Removed,
            path,
            facet: None,
            old: Some(element.name.clone()),
            new: None,
            severity: Severity::Breaking,
        });
    }

    fn added(&mut self, element: &ElementNode, path: &[String]) {
        let mut path = path.to_vec();
        path.push(element.name.clone());
        // a new mandatory element invalidates every old instance; a new
        // optional one invalidates none
        let severity = if element.occurs.min > 0 {
            Severity::Breaking
        } else {
            Severity::NonBreaking
        };
        self.records.push(DiffRecord {
            kind: DiffKind::Added,
            path,
            facet: None,
            old: None,
            new: Some(element.name.clone()),
            severity,
        });
    }
}

fn type_label(kind: TypeKind, builtin: BuiltinType) -> String {
    match kind {
        TypeKind::Simple => format!("simple({:?})", builtin),
        TypeKind::Complex => "complex".to_string(),
    }
}

/// Flatten a content model into element slots, composing occurrence bounds
/// through the enclosing groups. A child of a multi-branch choice gets
/// `min = 0`: the other branch may be picked instead.
fn flatten<'m>(particle: &'m Particle, outer: Occurs, out: &mut Vec<Slot<'m>>) {
    match particle {
        Particle::Element(element) => out.push(Slot {
            occurs: compose(outer, element.occurs),
            element,
        }),
        Particle::Sequence { occurs, particles } => {
            let composed = compose(outer, *occurs);
            for particle in particles {
                flatten(particle, composed, out);
            }
        }
        Particle::Choice { occurs, particles } => {
            let mut composed = compose(outer, *occurs);
            if particles.len() > 1 {
                composed.min = 0;
            }
            for particle in particles {
                flatten(particle, composed, out);
            }
        }
    }
}

fn compose(outer: Occurs, inner: Occurs) -> Occurs {
    Occurs {
        min: outer.min.saturating_mul(inner.min),
        max: match (outer.max, inner.max) {
            (Some(a), Some(b)) => Some(a.saturating_mul(b)),
            _ => None,
        },
    }
}

/// Breaking when the change can reject a previously valid value
fn facet_severity(kind: FacetKind, old: &FacetSet, new: &FacetSet) -> Severity {
    fn upper<T: PartialOrd + Copy>(old: Option<T>, new: Option<T>) -> Severity {
        match (old, new) {
            (_, None) => Severity::NonBreaking,
            (None, Some(_)) => Severity::Breaking,
            (Some(o), Some(n)) => {
                if n < o {
                    Severity::Breaking
                } else {
                    Severity::NonBreaking
                }
            }
        }
    }
    fn lower<T: PartialOrd + Copy>(old: Option<T>, new: Option<T>) -> Severity {
        match (old, new) {
            (_, None) => Severity::NonBreaking,
            (None, Some(_)) => Severity::Breaking,
            (Some(o), Some(n)) => {
                if n > o {
                    Severity::Breaking
                } else {
                    Severity::NonBreaking
                }
            }
        }
    }

    match kind {
        FacetKind::MaxLength => upper(old.max_length, new.max_length),
        FacetKind::MaxInclusive => upper(old.max_inclusive, new.max_inclusive),
        FacetKind::MaxExclusive => upper(old.max_exclusive, new.max_exclusive),
        FacetKind::TotalDigits => upper(old.total_digits, new.total_digits),
        FacetKind::FractionDigits => upper(old.fraction_digits, new.fraction_digits),
        FacetKind::MinLength => lower(old.min_length, new.min_length),
        FacetKind::MinInclusive => lower(old.min_inclusive, new.min_inclusive),
        FacetKind::MinExclusive => lower(old.min_exclusive, new.min_exclusive),
        FacetKind::Enumeration => match (&old.enumeration, &new.enumeration) {
            (_, None) => Severity::NonBreaking,
            (None, Some(_)) => Severity::Breaking,
            (Some(old_values), Some(new_values)) => {
                if old_values.iter().all(|v| new_values.contains(v)) {
                    Severity::NonBreaking
                } else {
                    Severity::Breaking
                }
            }
        },
        // pattern languages are not comparable; any change may exclude
        // previously valid values unless the pattern went away entirely
        FacetKind::Pattern | FacetKind::Length => {
            if new.value_of(kind).is_none() {
                Severity::NonBreaking
            } else {
                Severity::Breaking
            }
        }
        FacetKind::WhiteSpace => Severity::NonBreaking,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_model, NoCodeSets};
    use crate::limits::Limits;
    use crate::tree::NoImports;

    fn model(xsd: &str) -> SchemaModel {
        build_model(xsd, &NoImports, &NoCodeSets, &Limits::default()).unwrap()
    }

    fn schema(body: &str) -> String {
        format!(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">{}</xs:schema>"#,
            body
        )
    }

    const DOC_V1: &str = r#"
  <xs:element name="Document" type="Document"/>
  <xs:complexType name="Document">
    <xs:sequence>
      <xs:element name="MsgId" type="Max35Text"/>
      <xs:element name="Amt" type="Amount"/>
    </xs:sequence>
  </xs:complexType>
  <xs:simpleType name="Max35Text">
    <xs:restriction base="xs:string"><xs:minLength value="1"/><xs:maxLength value="35"/></xs:restriction>
  </xs:simpleType>
  <xs:simpleType name="Amount">
    <xs:restriction base="xs:decimal"><xs:fractionDigits value="2"/></xs:restriction>
  </xs:simpleType>"#;

    #[test]
    fn test_equal_models_yield_no_records() {
        let a = model(&schema(DOC_V1));
        let b = model(&schema(DOC_V1));
        assert!(diff(&a, &b, None).is_empty());
    }

    #[test]
    fn test_cosmetic_type_rename_reports_nothing() {
        let renamed = DOC_V1.replace("Max35Text", "RestrictedText");
        let a = model(&schema(DOC_V1));
        let b = model(&schema(&renamed));
        assert!(diff(&a, &b, None).is_empty());
    }

    #[test]
    fn test_added_optional_is_non_breaking() {
        let v2 = DOC_V1.replace(
            r#"<xs:element name="Amt" type="Amount"/>"#,
            r#"<xs:element name="Amt" type="Amount"/><xs:element name="Ustrd" type="Max35Text" minOccurs="0"/>"#,
        );
        let records = diff(&model(&schema(DOC_V1)), &model(&schema(&v2)), None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, DiffKind::Added);
        assert_eq!(records[0].severity, Severity::NonBreaking);
        assert_eq!(records[0].path, vec!["Document", "Ustrd"]);
    }

    #[test]
    fn test_added_mandatory_is_breaking() {
        let v2 = DOC_V1.replace(
            r#"<xs:element name="Amt" type="Amount"/>"#,
            r#"<xs:element name="Amt" type="Amount"/><xs:element name="Ccy" type="Max35Text"/>"#,
        );
        let records = diff(&model(&schema(DOC_V1)), &model(&schema(&v2)), None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, DiffKind::Added);
        assert_eq!(records[0].severity, Severity::Breaking);
    }

    #[test]
    fn test_symmetry_of_kind() {
        let v2 = DOC_V1.replace(
            r#"<xs:element name="MsgId" type="Max35Text"/>"#,
            r#"<xs:element name="MsgId" type="Max35Text"/><xs:element name="CreDtTm" type="xs:dateTime"/>"#,
        );
        let a = model(&schema(DOC_V1));
        let b = model(&schema(&v2));

        let forward = diff(&a, &b, None);
        let backward = diff(&b, &a, None);
        let added: Vec<_> = forward
            .iter()
            .filter(|r| r.kind == DiffKind::Added)
            .map(|r| r.path.clone())
            .collect();
        let removed: Vec<_> = backward
            .iter()
            .filter(|r| r.kind == DiffKind::Removed)
            .map(|r| r.path.clone())
            .collect();
        assert_eq!(added, removed);
        assert_eq!(added, vec![vec!["Document".to_string(), "CreDtTm".to_string()]]);
    }

    #[test]
    fn test_insertion_does_not_misalign_later_fields() {
        let v2 = DOC_V1.replace(
            r#"<xs:element name="MsgId" type="Max35Text"/>"#,
            r#"<xs:element name="MsgId" type="Max35Text"/><xs:element name="NbOfTxs" type="Max35Text"/>"#,
        );
        let records = diff(&model(&schema(DOC_V1)), &model(&schema(&v2)), None);
        // only the insertion itself; Amt still aligns by name
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, vec!["Document", "NbOfTxs"]);
    }

    #[test]
    fn test_facet_tightened_is_breaking() {
        let v2 = DOC_V1.replace(
            r#"<xs:maxLength value="35"/>"#,
            r#"<xs:maxLength value="10"/>"#,
        );
        let records = diff(&model(&schema(DOC_V1)), &model(&schema(&v2)), None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, DiffKind::FacetChanged);
        assert_eq!(records[0].facet, Some(FacetKind::MaxLength));
        assert_eq!(records[0].severity, Severity::Breaking);
        assert_eq!(records[0].old.as_deref(), Some("35"));
        assert_eq!(records[0].new.as_deref(), Some("10"));
    }

    #[test]
    fn test_facet_loosened_is_non_breaking() {
        let v2 = DOC_V1.replace(
            r#"<xs:maxLength value="35"/>"#,
            r#"<xs:maxLength value="70"/>"#,
        );
        let records = diff(&model(&schema(DOC_V1)), &model(&schema(&v2)), None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::NonBreaking);
    }

    #[test]
    fn test_new_numeric_bound_is_breaking() {
        let v2 = DOC_V1.replace(
            r#"<xs:fractionDigits value="2"/>"#,
            r#"<xs:fractionDigits value="2"/><xs:maxInclusive value="999999.99"/>"#,
        );
        let records = diff(&model(&schema(DOC_V1)), &model(&schema(&v2)), None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, DiffKind::FacetChanged);
        assert_eq!(records[0].facet, Some(FacetKind::MaxInclusive));
        assert_eq!(records[0].severity, Severity::Breaking);
        assert_eq!(records[0].path, vec!["Document", "Amt"]);
    }

    #[test]
    fn test_enumeration_shrunk_vs_grown() {
        let v1 = r#"
  <xs:element name="Doc" type="Doc"/>
  <xs:complexType name="Doc">
    <xs:sequence><xs:element name="SvcLvl" type="Code"/></xs:sequence>
  </xs:complexType>
  <xs:simpleType name="Code">
    <xs:restriction base="xs:string">
      <xs:enumeration value="SEPA"/><xs:enumeration value="URGP"/>
    </xs:restriction>
  </xs:simpleType>"#;
        let shrunk = v1.replace(r#"<xs:enumeration value="URGP"/>"#, "");
        let grown = v1.replace(
            r#"<xs:enumeration value="URGP"/>"#,
            r#"<xs:enumeration value="URGP"/><xs:enumeration value="NURG"/>"#,
        );

        let base = model(&schema(v1));
        let records = diff(&base, &model(&schema(&shrunk)), None);
        assert_eq!(records[0].severity, Severity::Breaking);

        let records = diff(&base, &model(&schema(&grown)), None);
        assert_eq!(records[0].severity, Severity::NonBreaking);
    }

    #[test]
    fn test_cardinality_relaxed_and_tightened() {
        let relaxed = DOC_V1.replace(
            r#"<xs:element name="Amt" type="Amount"/>"#,
            r#"<xs:element name="Amt" type="Amount" maxOccurs="unbounded"/>"#,
        );
        let records = diff(&model(&schema(DOC_V1)), &model(&schema(&relaxed)), None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, DiffKind::CardinalityRelaxed);
        assert_eq!(records[0].severity, Severity::NonBreaking);

        let records = diff(&model(&schema(&relaxed)), &model(&schema(DOC_V1)), None);
        assert_eq!(records[0].kind, DiffKind::CardinalityTightened);
        assert_eq!(records[0].severity, Severity::Breaking);
    }

    #[test]
    fn test_type_change_is_breaking_and_terminal() {
        let v2 = DOC_V1.replace(
            r#"<xs:element name="Amt" type="Amount"/>"#,
            r#"<xs:element name="Amt" type="Max35Text"/>"#,
        );
        let records = diff(&model(&schema(DOC_V1)), &model(&schema(&v2)), None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, DiffKind::TypeChanged);
        assert_eq!(records[0].severity, Severity::Breaking);
    }

    #[test]
    fn test_mismatched_roots_are_total() {
        let a = model(&schema(DOC_V1));
        let other = r#"
  <xs:element name="Report" type="xs:string"/>"#;
        let b = model(&schema(other));
        let records = diff(&a, &b, None);
        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .any(|r| r.kind == DiffKind::Added && r.path == vec!["Report"]));
        assert!(records
            .iter()
            .any(|r| r.kind == DiffKind::Removed && r.path == vec!["Document"]));
    }

    #[test]
    fn test_records_serialize_to_kebab_case_json() {
        let v2 = DOC_V1.replace(
            r#"<xs:maxLength value="35"/>"#,
            r#"<xs:maxLength value="10"/>"#,
        );
        let records = diff(&model(&schema(DOC_V1)), &model(&schema(&v2)), None);
        let json = serde_json::to_string(&records[0]).unwrap();
        assert!(json.contains("\"facet-changed\""));
        assert!(json.contains("\"breaking\""));
    }
}
