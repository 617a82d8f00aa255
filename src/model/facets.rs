//! Constraining facets for simple types
//!
//! A [`FacetSet`] holds every validation-relevant constraint of one type.
//! The builder merges facet sets along the restriction chain into the
//! *effective* facet set the generator and differ both consume.

use crate::error::{Result, SchemaError};
use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;

/// White space handling modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpace {
    /// Preserve all white space
    Preserve,
    /// Replace tabs and newlines with spaces
    Replace,
    /// Replace and collapse multiple spaces
    Collapse,
}

impl WhiteSpace {
    /// Parse from an attribute value
    pub fn parse(s: &str, type_name: &str) -> Result<Self> {
        match s {
            "preserve" => Ok(WhiteSpace::Preserve),
            "replace" => Ok(WhiteSpace::Replace),
            "collapse" => Ok(WhiteSpace::Collapse),
            _ => Err(SchemaError::InvalidRestriction {
                type_name: type_name.to_string(),
                reason: format!("invalid whiteSpace value '{}'", s),
            }),
        }
    }
}

impl fmt::Display for WhiteSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhiteSpace::Preserve => write!(f, "preserve"),
            WhiteSpace::Replace => write!(f, "replace"),
            WhiteSpace::Collapse => write!(f, "collapse"),
        }
    }
}

/// A pattern facet: literal regex source plus its compiled matcher
///
/// XSD patterns are implicitly anchored, so the matcher is compiled as
/// `^(?:source)$`.
#[derive(Debug, Clone)]
pub struct PatternFacet {
    /// The pattern exactly as written in the schema
    pub source: String,
    regex: Regex,
}

impl PatternFacet {
    /// Compile a pattern facet from its schema source
    pub fn new(source: &str, type_name: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{})$", source)).map_err(|e| {
            SchemaError::InvalidRestriction {
                type_name: type_name.to_string(),
                reason: format!("invalid pattern '{}': {}", source, e),
            }
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Check whether a value matches this pattern
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for PatternFacet {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for PatternFacet {}

/// Facet kind discriminant, used by the differ to report which constraint
/// changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum FacetKind {
    /// Pattern facet(s)
    Pattern,
    /// Enumeration facet
    Enumeration,
    /// Exact length
    Length,
    /// Minimum length
    MinLength,
    /// Maximum length
    MaxLength,
    /// Inclusive lower bound
    MinInclusive,
    /// Inclusive upper bound
    MaxInclusive,
    /// Exclusive lower bound
    MinExclusive,
    /// Exclusive upper bound
    MaxExclusive,
    /// Maximum total digits
    TotalDigits,
    /// Maximum fraction digits
    FractionDigits,
    /// White space policy
    WhiteSpace,
}

impl FacetKind {
    /// All facet kinds in stable reporting order
    pub const ALL: [FacetKind; 12] = [
        FacetKind::Pattern,
        FacetKind::Enumeration,
        FacetKind::Length,
        FacetKind::MinLength,
        FacetKind::MaxLength,
        FacetKind::MinInclusive,
        FacetKind::MaxInclusive,
        FacetKind::MinExclusive,
        FacetKind::MaxExclusive,
        FacetKind::TotalDigits,
        FacetKind::FractionDigits,
        FacetKind::WhiteSpace,
    ];
}

impl fmt::Display for FacetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FacetKind::Pattern => "pattern",
            FacetKind::Enumeration => "enumeration",
            FacetKind::Length => "length",
            FacetKind::MinLength => "minLength",
            FacetKind::MaxLength => "maxLength",
            FacetKind::MinInclusive => "minInclusive",
            FacetKind::MaxInclusive => "maxInclusive",
            FacetKind::MinExclusive => "minExclusive",
            FacetKind::MaxExclusive => "maxExclusive",
            FacetKind::TotalDigits => "totalDigits",
            FacetKind::FractionDigits => "fractionDigits",
            FacetKind::WhiteSpace => "whiteSpace",
        };
        write!(f, "{}", s)
    }
}

/// The full constraint set of one simple type
///
/// Enumerations keep declaration order; generation picks from them
/// deterministically under a fixed seed. Multiple patterns all have to
/// match (restriction chains intersect patterns).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetSet {
    /// Patterns, outermost restriction last
    pub patterns: Vec<PatternFacet>,
    /// Ordered enumeration literals, if restricted to a set
    pub enumeration: Option<Vec<String>>,
    /// Exact length
    pub length: Option<u32>,
    /// Minimum length
    pub min_length: Option<u32>,
    /// Maximum length
    pub max_length: Option<u32>,
    /// Inclusive lower bound
    pub min_inclusive: Option<Decimal>,
    /// Inclusive upper bound
    pub max_inclusive: Option<Decimal>,
    /// Exclusive lower bound
    pub min_exclusive: Option<Decimal>,
    /// Exclusive upper bound
    pub max_exclusive: Option<Decimal>,
    /// Maximum total digits
    pub total_digits: Option<u32>,
    /// Maximum fraction digits
    pub fraction_digits: Option<u32>,
    /// White space policy
    pub white_space: Option<WhiteSpace>,
}

impl FacetSet {
    /// True if no facet is set
    pub fn is_empty(&self) -> bool {
        self == &FacetSet::default()
    }

    /// Check a string value against every facet in this set
    pub fn satisfied_by(&self, value: &str) -> bool {
        if let Some(enumeration) = &self.enumeration {
            if !enumeration.iter().any(|v| v == value) {
                return false;
            }
        }
        if !self.patterns.iter().all(|p| p.matches(value)) {
            return false;
        }
        let len = value.chars().count() as u32;
        if self.length.is_some_and(|l| len != l) {
            return false;
        }
        if self.min_length.is_some_and(|l| len < l) {
            return false;
        }
        if self.max_length.is_some_and(|l| len > l) {
            return false;
        }
        if self.has_numeric_bounds() || self.total_digits.is_some() || self.fraction_digits.is_some()
        {
            let number = match value.parse::<Decimal>() {
                Ok(n) => n,
                Err(_) => return false,
            };
            if self.min_inclusive.is_some_and(|b| number < b) {
                return false;
            }
            if self.max_inclusive.is_some_and(|b| number > b) {
                return false;
            }
            if self.min_exclusive.is_some_and(|b| number <= b) {
                return false;
            }
            if self.max_exclusive.is_some_and(|b| number >= b) {
                return false;
            }
            if let Some(total) = self.total_digits {
                let digits = number
                    .normalize()
                    .to_string()
                    .chars()
                    .filter(|c| c.is_ascii_digit())
                    .count() as u32;
                if digits > total {
                    return false;
                }
            }
            if self.fraction_digits.is_some_and(|f| number.scale() > f) {
                return false;
            }
        }
        true
    }

    /// True if any numeric bound facet is set
    pub fn has_numeric_bounds(&self) -> bool {
        self.min_inclusive.is_some()
            || self.max_inclusive.is_some()
            || self.min_exclusive.is_some()
            || self.max_exclusive.is_some()
    }

    /// Merge this locally declared facet set over an inherited base set,
    /// enforcing XSD restriction semantics: the result may only be tighter.
    ///
    /// Patterns accumulate (a value must match all of them); every other
    /// facet is overridden by the local declaration after checking it does
    /// not widen the base.
    pub fn merge_restriction(&self, base: &FacetSet, type_name: &str) -> Result<FacetSet> {
        let looser = |facet: &str, local: &dyn fmt::Display, inherited: &dyn fmt::Display| {
            Err(SchemaError::InvalidRestriction {
                type_name: type_name.to_string(),
                reason: format!(
                    "{} {} is looser than inherited {}",
                    facet, local, inherited
                ),
            })
        };

        let mut merged = base.clone();
        merged.patterns.extend(self.patterns.iter().cloned());

        if let Some(local) = &self.enumeration {
            if let Some(inherited) = &base.enumeration {
                if let Some(extra) = local.iter().find(|v| !inherited.contains(v)) {
                    return Err(SchemaError::InvalidRestriction {
                        type_name: type_name.to_string(),
                        reason: format!(
                            "enumeration value '{}' is not in the base enumeration",
                            extra
                        ),
                    });
                }
            }
            merged.enumeration = Some(local.clone());
        }

        if let Some(local) = self.length {
            merged.length = Some(local);
        }
        if let Some(local) = self.min_length {
            if base.min_length.is_some_and(|b| local < b) {
                return looser("minLength", &local, &base.min_length.unwrap());
            }
            merged.min_length = Some(local);
        }
        if let Some(local) = self.max_length {
            if base.max_length.is_some_and(|b| local > b) {
                return looser("maxLength", &local, &base.max_length.unwrap());
            }
            merged.max_length = Some(local);
        }
        if let Some(local) = self.min_inclusive {
            if base.min_inclusive.is_some_and(|b| local < b) {
                return looser("minInclusive", &local, &base.min_inclusive.unwrap());
            }
            merged.min_inclusive = Some(local);
        }
        if let Some(local) = self.max_inclusive {
            if base.max_inclusive.is_some_and(|b| local > b) {
                return looser("maxInclusive", &local, &base.max_inclusive.unwrap());
            }
            merged.max_inclusive = Some(local);
        }
        if let Some(local) = self.min_exclusive {
            if base.min_exclusive.is_some_and(|b| local < b) {
                return looser("minExclusive", &local, &base.min_exclusive.unwrap());
            }
            merged.min_exclusive = Some(local);
        }
        if let Some(local) = self.max_exclusive {
            if base.max_exclusive.is_some_and(|b| local > b) {
                return looser("maxExclusive", &local, &base.max_exclusive.unwrap());
            }
            merged.max_exclusive = Some(local);
        }
        if let Some(local) = self.total_digits {
            if base.total_digits.is_some_and(|b| local > b) {
                return looser("totalDigits", &local, &base.total_digits.unwrap());
            }
            merged.total_digits = Some(local);
        }
        if let Some(local) = self.fraction_digits {
            if base.fraction_digits.is_some_and(|b| local > b) {
                return looser("fractionDigits", &local, &base.fraction_digits.unwrap());
            }
            merged.fraction_digits = Some(local);
        }
        if let Some(local) = self.white_space {
            merged.white_space = Some(local);
        }

        Ok(merged)
    }

    /// String representation of one facet kind's value, for diff records
    pub fn value_of(&self, kind: FacetKind) -> Option<String> {
        match kind {
            FacetKind::Pattern => {
                if self.patterns.is_empty() {
                    None
                } else {
                    Some(
                        self.patterns
                            .iter()
                            .map(|p| p.source.clone())
                            .collect::<Vec<_>>()
                            .join(" & "),
                    )
                }
            }
            FacetKind::Enumeration => self.enumeration.as_ref().map(|v| v.join(", ")),
            FacetKind::Length => self.length.map(|v| v.to_string()),
            FacetKind::MinLength => self.min_length.map(|v| v.to_string()),
            FacetKind::MaxLength => self.max_length.map(|v| v.to_string()),
            FacetKind::MinInclusive => self.min_inclusive.map(|v| v.to_string()),
            FacetKind::MaxInclusive => self.max_inclusive.map(|v| v.to_string()),
            FacetKind::MinExclusive => self.min_exclusive.map(|v| v.to_string()),
            FacetKind::MaxExclusive => self.max_exclusive.map(|v| v.to_string()),
            FacetKind::TotalDigits => self.total_digits.map(|v| v.to_string()),
            FacetKind::FractionDigits => self.fraction_digits.map(|v| v.to_string()),
            FacetKind::WhiteSpace => self.white_space.map(|v| v.to_string()),
        }
    }
}
