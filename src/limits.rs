//! Limits for schema processing
//!
//! Ceilings that keep schema loading bounded: imported schemas can nest, and
//! a hostile or broken schema should not exhaust memory before the builder
//! gets a chance to reject it.

use crate::error::{Result, SchemaError};

/// Resource limits applied while loading and building a schema
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum size of a single schema document in bytes
    pub max_schema_size: usize,

    /// Maximum nesting depth of import/include resolution
    pub max_import_depth: usize,

    /// Maximum number of registered types plus elements in one model
    pub max_components: usize,

    /// Maximum element nesting depth in the generic tree
    pub max_tree_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_schema_size: 50 * 1024 * 1024, // 50 MB
            max_import_depth: 20,
            max_components: 100_000,
            max_tree_depth: 500,
        }
    }
}

impl Limits {
    /// Create limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict limits for untrusted input
    pub fn strict() -> Self {
        Self {
            max_schema_size: 5 * 1024 * 1024, // 5 MB
            max_import_depth: 5,
            max_components: 10_000,
            max_tree_depth: 100,
        }
    }

    /// Check a schema document size against the limit
    pub fn check_schema_size(&self, size: usize) -> Result<()> {
        if size > self.max_schema_size {
            Err(SchemaError::LimitExceeded(format!(
                "schema size {} exceeds maximum {}",
                size, self.max_schema_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check import nesting depth against the limit
    pub fn check_import_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_import_depth {
            Err(SchemaError::LimitExceeded(format!(
                "import depth {} exceeds maximum {}",
                depth, self.max_import_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check the registered component count against the limit
    pub fn check_components(&self, count: usize) -> Result<()> {
        if count > self.max_components {
            Err(SchemaError::LimitExceeded(format!(
                "component count {} exceeds maximum {}",
                count, self.max_components
            )))
        } else {
            Ok(())
        }
    }

    /// Check element nesting depth against the limit
    pub fn check_tree_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_tree_depth {
            Err(SchemaError::LimitExceeded(format!(
                "tree depth {} exceeds maximum {}",
                depth, self.max_tree_depth
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_accept_normal_schema() {
        let limits = Limits::default();
        assert!(limits.check_schema_size(1024).is_ok());
        assert!(limits.check_import_depth(3).is_ok());
        assert!(limits.check_components(500).is_ok());
    }

    #[test]
    fn test_strict_limits_reject_oversized() {
        let limits = Limits::strict();
        assert!(limits.check_schema_size(6 * 1024 * 1024).is_err());
        assert!(limits.check_import_depth(6).is_err());
    }
}
