use std::collections::BTreeMap;
use std::path::Path;

use crate::parser::{self, Parsed};
use crate::{List, LoadError, ParseError};

/// A named, parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: String,
    root: List,
}

impl Template {
    /// The name the template is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The template body.
    pub fn root(&self) -> &List {
        &self.root
    }
}

/// A collection of templates that can invoke each other by name.
///
/// Every source added to the set contributes its own body under the name it
/// was added with, plus one template per `{{define}}` or `{{block}}` it
/// contains. A definition whose body is empty (only whitespace and comments)
/// never replaces an existing non-empty one.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: BTreeMap<String, Template>,
}

impl TemplateSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding a single source parsed under `name`.
    pub fn parse(name: impl Into<String>, source: &str) -> Result<Self, ParseError> {
        let mut set = Self::new();
        set.add(name, source)?;
        Ok(set)
    }

    /// Parse `source` and register its body under `name`, along with every
    /// template it defines.
    pub fn add(&mut self, name: impl Into<String>, source: &str) -> Result<&mut Self, ParseError> {
        let name = name.into();
        let Parsed { body, defines } = parser::parse(source)
            .map_err(|error| error.with_source(source).with_template(name.as_str()))?;

        debug!(
            "parsed template {name:?}: {} nodes, {} definitions",
            body.nodes.len(),
            defines.len()
        );
        self.associate(name, body);
        for definition in defines {
            self.associate(definition.name, definition.body);
        }
        Ok(self)
    }

    /// Read a file and add it under its file name (e.g. `page.tmpl`).
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, LoadError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| LoadError::BadFileName(path.to_path_buf()))?
            .to_string();
        let source = std::fs::read_to_string(path).map_err(|error| LoadError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        self.add(name, &source)?;
        Ok(self)
    }

    /// Build a set from several files, each named after its file name.
    pub fn parse_files<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Result<Self, LoadError> {
        let mut set = Self::new();
        for path in paths {
            set.add_file(path)?;
        }
        Ok(set)
    }

    fn associate(&mut self, name: String, root: List) {
        if let Some(existing) = self.templates.get(&name) {
            if root.is_empty_body() && !existing.root.is_empty_body() {
                trace!("keeping existing body of {name:?} over an empty redefinition");
                return;
            }
        }
        self.templates.insert(name.clone(), Template { name, root });
    }

    /// The template registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Names of all templates, in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Number of templates in the set.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the set holds no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
