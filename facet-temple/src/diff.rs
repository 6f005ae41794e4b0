use crate::FieldTree;

/// Outcome of comparing a template's field tree with a data type's.
///
/// Labels read `Parent->Child`. A missing field is labelled with the name of
/// the data node that lacks it; an extra field with the name of the template
/// node that never uses it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    /// Fields the template references that the data does not have.
    pub missing: Vec<String>,
    /// Fields the data offers that the template never references.
    pub extra: Vec<String>,
}

impl Comparison {
    /// Whether template and data agree exactly.
    pub fn is_match(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Diff a template tree against a data tree, recursing into shared children.
pub fn diff_trees(template: &FieldTree, data: &FieldTree) -> Comparison {
    let mut comparison = Comparison::default();
    diff_into(template, data, &mut comparison);
    comparison
}

fn diff_into(template: &FieldTree, data: &FieldTree, out: &mut Comparison) {
    for child in template.children() {
        match data.child(child.name()) {
            Some(data_child) => diff_into(child, data_child, out),
            None => out.missing.push(format!("{}->{}", data.name(), child.name())),
        }
    }
    for child in data.children() {
        if template.child(child.name()).is_none() {
            out.extra.push(format!("{}->{}", template.name(), child.name()));
        }
    }
}
