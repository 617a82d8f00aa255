//! Lexical/tree loader
//!
//! Parses raw XSD text into a generic element tree and resolves
//! `xs:import`/`xs:include` into one merged document tree. This is the input
//! boundary of the constraint model builder: everything after this module
//! works on [`TreeNode`]s, never on raw XML.

use crate::error::{Result, SchemaError};
use crate::limits::Limits;
use indexmap::IndexMap;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

/// One node of the generic schema tree
///
/// Element names are stored without their namespace prefix; every structural
/// element of an XSD document lives in the XML Schema namespace, so the
/// local name is sufficient. Attribute keys are kept exactly as written.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Local element name (`schema`, `element`, `complexType`, ...)
    pub name: String,
    /// Attributes in document order
    pub attributes: IndexMap<String, String>,
    /// Child elements in document order
    pub children: Vec<TreeNode>,
    /// Text content, if any
    pub text: Option<String>,
}

impl TreeNode {
    /// Create a new node with the given local name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Get an attribute value by exact key
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }

    /// Find the first child with the given local name
    pub fn find_child(&self, name: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Find all children with the given local name
    pub fn find_children(&self, name: &str) -> Vec<&TreeNode> {
        self.children.iter().filter(|c| c.name == name).collect()
    }
}

/// Capability for fetching the text of an imported or included schema
///
/// Supplied by the caller; the loader never touches the network or the file
/// system on its own.
pub trait ImportResolver {
    /// Fetch the schema text for a `schemaLocation` string
    fn resolve(&self, location: &str) -> Result<String>;
}

/// Resolver that rejects every import
///
/// The common case: ISO 20022 message schemas are self-contained.
#[derive(Debug, Default)]
pub struct NoImports;

impl ImportResolver for NoImports {
    fn resolve(&self, location: &str) -> Result<String> {
        Err(SchemaError::Resource(format!(
            "imports are not allowed, cannot resolve '{}'",
            location
        )))
    }
}

/// Resolver that loads imports from files relative to a base directory
#[derive(Debug)]
pub struct FileImportResolver {
    base_dir: PathBuf,
}

impl FileImportResolver {
    /// Create a resolver rooted at the given directory
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl ImportResolver for FileImportResolver {
    fn resolve(&self, location: &str) -> Result<String> {
        let path = self.base_dir.join(location);
        fs::read_to_string(&path).map_err(|e| {
            SchemaError::Resource(format!(
                "failed to read imported schema '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

/// Parse raw XSD text into a generic tree rooted at the document element
pub fn parse_tree(xsd: &str, limits: &Limits) -> Result<TreeNode> {
    limits.check_schema_size(xsd.len())?;

    let mut reader = Reader::from_str(xsd);
    reader.trim_text(true);

    let mut stack: Vec<TreeNode> = Vec::new();
    let mut root: Option<TreeNode> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                limits.check_tree_depth(stack.len() + 1)?;
                let mut node = TreeNode::new(local_name_of(e.name().as_ref()));
                read_attributes(&e, &mut node)?;
                stack.push(node);
            }
            Ok(Event::Empty(e)) => {
                limits.check_tree_depth(stack.len() + 1)?;
                let mut node = TreeNode::new(local_name_of(e.name().as_ref()));
                read_attributes(&e, &mut node)?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| SchemaError::Parse(e.to_string()))?;
                if let Some(parent) = stack.last_mut() {
                    if !text.trim().is_empty() {
                        parent.text = Some(text.trim().to_string());
                    }
                }
            }
            Ok(Event::End(_)) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| SchemaError::Parse("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {} // declarations, comments, processing instructions
            Err(e) => return Err(SchemaError::Parse(e.to_string())),
        }
    }

    root.ok_or_else(|| SchemaError::Parse("empty document".into()))
}

/// Load a schema and merge its imports/includes into one tree
///
/// The merged tree keeps the primary schema's root node (and therefore its
/// `targetNamespace`); the global declarations of every resolved import are
/// spliced into it in document order. Locations already visited are skipped,
/// so mutually-including schemas terminate.
pub fn load_merged(
    xsd: &str,
    resolver: &dyn ImportResolver,
    limits: &Limits,
) -> Result<TreeNode> {
    let mut visited = HashSet::new();
    load_merged_inner(xsd, resolver, limits, &mut visited, 0)
}

fn load_merged_inner(
    xsd: &str,
    resolver: &dyn ImportResolver,
    limits: &Limits,
    visited: &mut HashSet<String>,
    depth: usize,
) -> Result<TreeNode> {
    limits.check_import_depth(depth)?;

    let tree = parse_tree(xsd, limits)?;
    if tree.name != "schema" {
        return Err(SchemaError::Parse(format!(
            "expected document element 'schema', found '{}'",
            tree.name
        )));
    }

    let mut merged = TreeNode::new("schema");
    merged.attributes = tree.attributes.clone();

    for child in tree.children {
        if child.name == "import" || child.name == "include" {
            let location = match child.attr("schemaLocation") {
                Some(loc) => loc.to_string(),
                None => continue, // namespace-only import, nothing to fetch
            };
            if !visited.insert(location.clone()) {
                continue;
            }
            tracing::debug!(location = %location, "resolving schema import");
            let text = resolver.resolve(&location)?;
            let imported = load_merged_inner(&text, resolver, limits, visited, depth + 1)?;
            merged.children.extend(imported.children);
        } else {
            merged.children.push(child);
        }
    }

    Ok(merged)
}

fn local_name_of(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.into_owned(),
    }
}

fn read_attributes(
    e: &quick_xml::events::BytesStart<'_>,
    node: &mut TreeNode,
) -> Result<()> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| SchemaError::Parse(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| SchemaError::Parse(e.to_string()))?
            .into_owned();
        node.attributes.insert(key, value);
    }
    Ok(())
}

fn attach(
    stack: &mut [TreeNode],
    root: &mut Option<TreeNode>,
    node: TreeNode,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if root.is_none() {
        *root = Some(node);
    } else {
        return Err(SchemaError::Parse(
            "multiple document elements".into(),
        ));
    }
    Ok(())
}
