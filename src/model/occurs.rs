//! Occurrence bounds for particles and elements
//!
//! `maxOccurs` of `None` means unbounded. Bounds are validated at build
//! time: `min <= max` whenever `max` is bounded.

use crate::error::{Result, SchemaError};
use serde::{Deserialize, Serialize};

/// Occurrence bounds `(minOccurs, maxOccurs)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurs {
    /// Minimum number of occurrences
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new bounds, failing on `min > max`
    pub fn new(min: u32, max: Option<u32>, declared_on: &str) -> Result<Self> {
        if let Some(max) = max {
            if min > max {
                return Err(SchemaError::InvalidOccurrence {
                    name: declared_on.to_string(),
                    reason: format!("minOccurs {} > maxOccurs {}", min, max),
                });
            }
        }
        Ok(Self { min, max })
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Check if this particle may be absent
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if maxOccurs is unbounded
    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }

    /// Check whether these bounds admit every occurrence count `other` admits
    pub fn is_relaxation_of(&self, other: &Occurs) -> bool {
        if self.min > other.min {
            return false;
        }
        match (self.max, other.max) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a >= b,
        }
    }

    /// Check whether these bounds admit no count `other` rejects
    pub fn is_restriction_of(&self, other: &Occurs) -> bool {
        other.is_relaxation_of(self)
    }

    /// Parse `minOccurs`/`maxOccurs` attribute strings (absent = 1)
    pub fn parse(
        min_occurs: Option<&str>,
        max_occurs: Option<&str>,
        declared_on: &str,
    ) -> Result<Self> {
        let min = match min_occurs {
            Some(s) => s.parse::<u32>().map_err(|_| SchemaError::InvalidOccurrence {
                name: declared_on.to_string(),
                reason: format!("minOccurs '{}' is not a non-negative integer", s),
            })?,
            None => 1,
        };
        let max = match max_occurs {
            Some("unbounded") => None,
            Some(s) => Some(s.parse::<u32>().map_err(|_| {
                SchemaError::InvalidOccurrence {
                    name: declared_on.to_string(),
                    reason: format!("maxOccurs '{}' is not a non-negative integer", s),
                }
            })?),
            None => Some(1),
        };
        Self::new(min, max, declared_on)
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

impl std::fmt::Display for Occurs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}..{}]", self.min, max),
            None => write!(f, "[{}..unbounded]", self.min),
        }
    }
}
