//! Collects the field paths a template references.
//!
//! Scopes are tracked as paths from the root rather than node references, so
//! the walker can keep registering into the one tree it owns while descending
//! through included templates.

use facet_gotmpl::{Arg, List, Node, Pipe, TemplateSet};

use crate::{CompareOptions, FieldTree, TempleError};

/// Build the tree of every field path reachable from the template `name`.
///
/// The root is named after [`CompareOptions::root_name`]. Only field
/// arguments (`.A.B`) are registered unless
/// [`CompareOptions::follow_expressions`] is on.
///
/// Fails only if `name` itself is not in the set; unresolvable nested
/// inclusions are skipped.
pub fn template_tree(
    set: &TemplateSet,
    name: &str,
    options: &CompareOptions,
) -> Result<FieldTree, TempleError> {
    let template = set
        .lookup(name)
        .ok_or_else(|| TempleError::template_not_found(name))?;

    let mut walker = TemplateWalker {
        set,
        tree: FieldTree::new(options.root_name.as_str()),
        including: vec![template.name()],
        follow_expressions: options.follow_expressions,
    };
    let scope = Scope::default();
    walker.walk_list(template.root(), &scope);
    Ok(walker.tree)
}

/// Where `.` and `$` point, as paths from the root.
#[derive(Debug, Clone, Default)]
struct Scope {
    dot: Vec<String>,
    /// `$`: the dot the current template body was entered with.
    root: Vec<String>,
}

impl Scope {
    fn entering(dot: Vec<String>) -> Self {
        Scope {
            root: dot.clone(),
            dot,
        }
    }
}

struct TemplateWalker<'a> {
    set: &'a TemplateSet,
    tree: FieldTree,
    /// Templates currently being expanded, outermost first.
    including: Vec<&'a str>,
    follow_expressions: bool,
}

impl<'a> TemplateWalker<'a> {
    fn walk_list(&mut self, list: &'a List, scope: &Scope) {
        for node in &list.nodes {
            self.walk_node(node, scope);
        }
    }

    fn walk_node(&mut self, node: &'a Node, scope: &Scope) {
        match node {
            Node::Action { pipe, .. } => self.walk_pipe(pipe, scope),
            Node::If(branch) => {
                self.walk_list(&branch.list, scope);
                if let Some(else_list) = &branch.else_list {
                    self.walk_list(else_list, scope);
                }
            }
            Node::Range(branch) => self.walk_pipe(&branch.pipe, scope),
            Node::With(branch) => self.walk_list(&branch.list, scope),
            Node::List(list) => self.walk_list(list, scope),
            Node::Template { name, pipe, .. } => self.walk_inclusion(name, pipe.as_ref(), scope),
            Node::Text { .. } | Node::Comment { .. } | Node::Break { .. } | Node::Continue { .. } => {}
        }
    }

    fn walk_pipe(&mut self, pipe: &Pipe, scope: &Scope) {
        for arg in pipe.args() {
            self.register(arg, scope);
        }
    }

    /// Register the fields `arg` refers to; returns the path it resolves to,
    /// if it names a node of the tree.
    fn register(&mut self, arg: &Arg, scope: &Scope) -> Option<Vec<String>> {
        let base = match arg {
            Arg::Field { ident, .. } => Some((&scope.dot, &ident[..])),
            _ if !self.follow_expressions => None,
            Arg::Variable { ident, .. } if ident.first().is_some_and(|v| v == "$") => {
                Some((&scope.root, &ident[1..]))
            }
            Arg::Pipe(pipe) => {
                self.walk_pipe(pipe, scope);
                None
            }
            Arg::Chain { node, .. } => {
                self.register(node, scope);
                None
            }
            _ => None,
        };
        let (from, ident) = base?;

        let path: Vec<String> = from.iter().chain(ident).cloned().collect();
        if !ident.is_empty() {
            trace!("registered {}", path.join("."));
        }
        self.tree.insert_path(path.iter().map(String::as_str));
        Some(path)
    }

    fn walk_inclusion(&mut self, name: &'a str, pipe: Option<&Pipe>, scope: &Scope) {
        let template = self.set.lookup(name);
        if template.is_none() {
            debug!("skipping inclusion of unknown template {name:?}");
        }
        if self.including.contains(&name) {
            debug!("not re-entering {name:?}, it is already being expanded");
        }
        let template = template.filter(|_| !self.including.contains(&name));

        let Some(pipe) = pipe else {
            if let Some(template) = template {
                self.include(template.name(), template.root(), scope.dot.clone());
            }
            return;
        };

        // Each field or dot argument makes the included body run against that scope.
        for arg in pipe.args() {
            let dot = match arg {
                Arg::Dot { .. } => Some(scope.dot.clone()),
                _ => self.register(arg, scope),
            };
            if let (Some(dot), Some(template)) = (dot, template) {
                self.include(template.name(), template.root(), dot);
            }
        }
    }

    fn include(&mut self, name: &'a str, body: &'a List, dot: Vec<String>) {
        debug!(
            "including {name:?} with dot at {:?}",
            if dot.is_empty() { ".".to_string() } else { dot.join(".") }
        );
        self.including.push(name);
        self.walk_list(body, &Scope::entering(dot));
        self.including.pop();
    }
}
