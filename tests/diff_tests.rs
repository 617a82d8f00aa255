//! End-to-end diff tests across realistic schema version pairs

use iso20022_xsd::builder::NoCodeSets;
use iso20022_xsd::{
    build_model, diff, DiffKind, FacetKind, Limits, NoImports, SchemaModel, Severity,
};
use pretty_assertions::assert_eq;

fn model(xsd: &str) -> SchemaModel {
    build_model(xsd, &NoImports, &NoCodeSets, &Limits::default()).unwrap()
}

const V1: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Document" type="Document"/>
  <xs:complexType name="Document">
    <xs:sequence>
      <xs:element name="GrpHdr" type="GroupHeader"/>
      <xs:element name="CdtTrfTxInf" type="Transaction" maxOccurs="unbounded"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="GroupHeader">
    <xs:sequence>
      <xs:element name="MsgId" type="Max35Text"/>
      <xs:element name="CreDtTm" type="xs:dateTime"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="Transaction">
    <xs:sequence>
      <xs:element name="Amt" type="AmountType"/>
      <xs:element name="SvcLvl" type="ServiceLevelCode" minOccurs="0"/>
    </xs:sequence>
  </xs:complexType>
  <xs:simpleType name="Max35Text">
    <xs:restriction base="xs:string">
      <xs:minLength value="1"/><xs:maxLength value="35"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:simpleType name="AmountType">
    <xs:restriction base="xs:decimal">
      <xs:fractionDigits value="2"/><xs:minInclusive value="0.01"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:simpleType name="ServiceLevelCode">
    <xs:restriction base="xs:string">
      <xs:enumeration value="SEPA"/><xs:enumeration value="URGP"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

#[test]
fn identical_models_diff_empty() {
    let records = diff(&model(V1), &model(V1), None);
    assert_eq!(records, vec![]);
}

#[test]
fn self_diff_is_empty_even_with_recursion_risk() {
    // nested complex types exercised through two independently built models
    let a = model(V1);
    let b = model(V1);
    assert!(diff(&a, &b, Some("Document")).is_empty());
    assert!(diff(&b, &a, Some("Document")).is_empty());
}

#[test]
fn amount_bound_tightened_reports_breaking_facet_change() {
    let v2 = V1.replace(
        r#"<xs:fractionDigits value="2"/><xs:minInclusive value="0.01"/>"#,
        r#"<xs:fractionDigits value="2"/><xs:minInclusive value="0.01"/><xs:maxInclusive value="999999.99"/>"#,
    );
    let records = diff(&model(V1), &model(&v2), None);

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.kind, DiffKind::FacetChanged);
    assert_eq!(record.facet, Some(FacetKind::MaxInclusive));
    assert_eq!(record.severity, Severity::Breaking);
    assert_eq!(record.path, vec!["Document", "CdtTrfTxInf", "Amt"]);
    assert_eq!(record.old, None);
    assert_eq!(record.new.as_deref(), Some("999999.99"));
}

#[test]
fn amount_bound_loosened_reports_non_breaking() {
    let bounded = V1.replace(
        r#"<xs:minInclusive value="0.01"/>"#,
        r#"<xs:minInclusive value="0.01"/><xs:maxInclusive value="1000.00"/>"#,
    );
    let loosened = bounded.replace(
        r#"<xs:maxInclusive value="1000.00"/>"#,
        r#"<xs:maxInclusive value="999999.99"/>"#,
    );
    let records = diff(&model(&bounded), &model(&loosened), None);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].severity, Severity::NonBreaking);
}

#[test]
fn added_and_removed_are_symmetric_across_direction() {
    let v2 = V1.replace(
        r#"<xs:element name="CreDtTm" type="xs:dateTime"/>"#,
        r#"<xs:element name="CreDtTm" type="xs:dateTime"/><xs:element name="InitgPty" type="Max35Text" minOccurs="0"/>"#,
    );
    let a = model(V1);
    let b = model(&v2);

    let forward = diff(&a, &b, None);
    let backward = diff(&b, &a, None);

    let added: Vec<_> = forward
        .iter()
        .filter(|r| r.kind == DiffKind::Added)
        .map(|r| &r.path)
        .collect();
    let removed: Vec<_> = backward
        .iter()
        .filter(|r| r.kind == DiffKind::Removed)
        .map(|r| &r.path)
        .collect();
    assert_eq!(added, removed);
}

#[test]
fn output_order_is_stable_by_path_then_kind() {
    let v2 = V1
        .replace(
            r#"<xs:element name="SvcLvl" type="ServiceLevelCode" minOccurs="0"/>"#,
            r#"<xs:element name="SvcLvl" type="ServiceLevelCode"/><xs:element name="Purp" type="Max35Text" minOccurs="0"/>"#,
        )
        .replace(
            r#"<xs:maxLength value="35"/>"#,
            r#"<xs:maxLength value="20"/>"#,
        );
    let first = diff(&model(V1), &model(&v2), None);
    let second = diff(&model(V1), &model(&v2), None);
    assert_eq!(first, second);

    let paths: Vec<String> = first.iter().map(|r| r.path.join("/")).collect();
    let mut sorted = paths.clone();
    sorted.sort();
    assert_eq!(paths, sorted);
}

#[test]
fn occurrence_change_on_group_member_is_detected() {
    let v2 = V1.replace(
        r#"<xs:element name="CdtTrfTxInf" type="Transaction" maxOccurs="unbounded"/>"#,
        r#"<xs:element name="CdtTrfTxInf" type="Transaction" maxOccurs="10"/>"#,
    );
    let records = diff(&model(V1), &model(&v2), None);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, DiffKind::CardinalityTightened);
    assert_eq!(records[0].severity, Severity::Breaking);
    assert_eq!(records[0].old.as_deref(), Some("[1..unbounded]"));
    assert_eq!(records[0].new.as_deref(), Some("[1..10]"));
}

#[test]
fn optional_made_mandatory_is_tightening() {
    let v2 = V1.replace(
        r#"<xs:element name="SvcLvl" type="ServiceLevelCode" minOccurs="0"/>"#,
        r#"<xs:element name="SvcLvl" type="ServiceLevelCode"/>"#,
    );
    let records = diff(&model(V1), &model(&v2), None);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, DiffKind::CardinalityTightened);
}

#[test]
fn renamed_type_with_same_constraints_is_silent() {
    let v2 = V1.replace("\"Max35Text\"", "\"RestrictedShortText\"");
    let records = diff(&model(V1), &model(&v2), None);
    assert_eq!(records, vec![]);
}

#[test]
fn primitive_category_change_is_type_changed() {
    let v2 = V1.replace(
        r#"<xs:restriction base="xs:decimal">
      <xs:fractionDigits value="2"/><xs:minInclusive value="0.01"/>
    </xs:restriction>"#,
        r#"<xs:restriction base="xs:string">
      <xs:pattern value="[0-9]+\.[0-9]{2}"/>
    </xs:restriction>"#,
    );
    let records = diff(&model(V1), &model(&v2), None);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, DiffKind::TypeChanged);
    assert_eq!(records[0].severity, Severity::Breaking);
}

#[test]
fn diff_records_serialize_for_report_adapters() {
    let v2 = V1.replace(
        r#"<xs:enumeration value="URGP"/>"#,
        "",
    );
    let records = diff(&model(V1), &model(&v2), None);
    let json = serde_json::to_value(&records).unwrap();

    let array = json.as_array().unwrap();
    assert_eq!(array.len(), 1);
    assert_eq!(array[0]["kind"], "facet-changed");
    assert_eq!(array[0]["severity"], "breaking");
    assert_eq!(array[0]["path"][0], "Document");
}
