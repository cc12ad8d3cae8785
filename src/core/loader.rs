//! XML configuration loading
//!
//! Reads configuration, provider and statement documents into a [`StatementPool`].
//!
//! ```xml
//! <statements>
//!   <select id="search">select * from users where name like {term}</select>
//!   <fragments>
//!     <fragment id="order">order by name</fragment>
//!   </fragments>
//!   <include file="admin/statements.xml"/>
//! </statements>
//! ```

use super::error::{MapperError, Result};
use super::pool::StatementPool;
use roxmltree::{Document, Node};
use std::fs;
use std::path::{Path, PathBuf};

const STATEMENT_ELEMENTS: &[&str] = &["statement", "select", "insert", "update", "delete", "fragment"];
const CATEGORY_ELEMENTS: &[&str] = &["selects", "inserts", "updates", "deletes", "fragments"];

/// Loads XML documents into a statement pool
pub struct XmlLoader<'a> {
    pool: &'a mut StatementPool,
    /// Canonical paths of the documents currently being loaded
    stack: Vec<PathBuf>,
}

impl<'a> XmlLoader<'a> {
    pub fn new(pool: &'a mut StatementPool) -> Self {
        Self {
            pool,
            stack: Vec::new(),
        }
    }

    /// Load a `<configuration>` document from disk
    pub fn configure(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.with_file(path.as_ref(), |loader, text, base| loader.configure_str(text, base))
    }

    /// Load a `<configuration>` document; relative paths resolve against `base_dir`
    pub fn configure_str(&mut self, xml: &str, base_dir: &Path) -> Result<()> {
        let doc = Document::parse(xml)?;
        let root = expect_root(&doc, "configuration")?;

        for node in elements(root) {
            match node.tag_name().name() {
                "provider" => {
                    let file = required_attribute(node, "file")?;
                    self.load_providers(base_dir.join(file))?;
                }
                "connection" => {
                    if let Some(provider) = node.attribute("provider") {
                        self.pool.set_default_provider(provider.trim());
                    }
                    if let Some(connection_string) = node.attribute("connectionString") {
                        self.pool
                            .set_default_connection_string(connection_string.trim());
                    }
                }
                "statements" => self.read_statements(node, base_dir)?,
                other => return Err(unexpected_element(node, other)),
            }
        }

        tracing::info!(
            statements = self.pool.statement_count(),
            providers = self.pool.provider_ids().len(),
            "configuration loaded"
        );
        Ok(())
    }

    /// Load a `<providers>` document from disk
    pub fn load_providers(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.with_file(path.as_ref(), |loader, text, _| loader.load_providers_str(text))
    }

    /// Load a `<providers>` document
    pub fn load_providers_str(&mut self, xml: &str) -> Result<()> {
        let doc = Document::parse(xml)?;
        let root = expect_root(&doc, "providers")?;

        for node in elements(root) {
            if node.tag_name().name() != "provider" {
                return Err(unexpected_element(node, node.tag_name().name()));
            }
            let id = required_attribute(node, "id")?;
            let driver = required_attribute(node, "driver")?;
            let connection_class = required_attribute(node, "connectionClass")?;
            self.pool.add_provider(id, driver, connection_class)?;
        }
        Ok(())
    }

    /// Load a `<statements>` document from disk
    pub fn load_statements(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.with_file(path.as_ref(), |loader, text, base| {
            loader.load_statements_str(text, base)
        })
    }

    /// Load a `<statements>` document; relative includes resolve against `base_dir`
    pub fn load_statements_str(&mut self, xml: &str, base_dir: &Path) -> Result<()> {
        let doc = Document::parse(xml)?;
        let root = expect_root(&doc, "statements")?;
        self.read_statements(root, base_dir)
    }

    fn read_statements(&mut self, root: Node<'_, '_>, base_dir: &Path) -> Result<()> {
        let mut includes = Vec::new();

        for node in elements(root) {
            let name = node.tag_name().name();
            if STATEMENT_ELEMENTS.contains(&name) {
                self.register(node)?;
            } else if CATEGORY_ELEMENTS.contains(&name) {
                for child in elements(node) {
                    let child_name = child.tag_name().name();
                    if !STATEMENT_ELEMENTS.contains(&child_name) {
                        return Err(unexpected_element(child, child_name));
                    }
                    self.register(child)?;
                }
            } else if name == "include" {
                includes.push(base_dir.join(required_attribute(node, "file")?));
            } else {
                return Err(unexpected_element(node, name));
            }
        }

        // Includes go after the document's own statements.
        for include in includes {
            self.load_statements(include)?;
        }
        Ok(())
    }

    fn register(&mut self, node: Node<'_, '_>) -> Result<()> {
        let id = required_attribute(node, "id")?;
        let sql: String = node
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect();
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(MapperError::configuration(format!(
                "statement '{}' at {} has no sql text",
                id,
                position(node)
            )));
        }
        self.pool.add_statement(id, sql)
    }

    fn with_file<F>(&mut self, path: &Path, load: F) -> Result<()>
    where
        F: FnOnce(&mut Self, &str, &Path) -> Result<()>,
    {
        let canonical = fs::canonicalize(path).map_err(|e| {
            MapperError::configuration(format!("cannot open '{}': {}", path.display(), e))
        })?;

        if self.stack.contains(&canonical) {
            let chain: Vec<String> = self
                .stack
                .iter()
                .chain(std::iter::once(&canonical))
                .map(|p| p.display().to_string())
                .collect();
            return Err(MapperError::configuration(format!(
                "include cycle: {}",
                chain.join(" -> ")
            )));
        }

        let text = fs::read_to_string(&canonical).map_err(|e| {
            MapperError::configuration(format!("cannot read '{}': {}", canonical.display(), e))
        })?;
        let base_dir = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        tracing::debug!(file = %canonical.display(), "loading xml document");

        self.stack.push(canonical);
        let result = load(self, &text, &base_dir);
        self.stack.pop();
        result
    }
}

impl StatementPool {
    /// Build a pool from a `<configuration>` document on disk
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut pool = Self::new();
        XmlLoader::new(&mut pool).configure(path)?;
        Ok(pool)
    }
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

fn expect_root<'a, 'input>(doc: &'a Document<'input>, name: &str) -> Result<Node<'a, 'input>> {
    let root = doc.root_element();
    if root.tag_name().name() != name {
        return Err(MapperError::configuration(format!(
            "expected <{}> root element, found <{}>",
            name,
            root.tag_name().name()
        )));
    }
    Ok(root)
}

fn required_attribute<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    match node.attribute(name).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(MapperError::configuration(format!(
            "<{}> at {} is missing the '{}' attribute",
            node.tag_name().name(),
            position(node),
            name
        ))),
    }
}

fn unexpected_element(node: Node<'_, '_>, name: &str) -> MapperError {
    MapperError::configuration(format!("unexpected element <{}> at {}", name, position(node)))
}

fn position(node: Node<'_, '_>) -> String {
    let pos = node.document().text_pos_at(node.range().start);
    format!("{}:{}", pos.row, pos.col)
}
