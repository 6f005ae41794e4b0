//! Collects the field paths a data type exposes, from its facet [`Shape`].

use facet_core::{ConstTypeId, Def, Field, Shape, StructKind, Type, UserType};

use crate::{CompareOptions, FieldTree};

/// Build the tree of every visible field path of `shape`.
///
/// Named-field structs contribute their fields; everything else is a leaf.
/// `Option` and pointer wrappers are looked through, both at the top and on
/// every field. A struct already being walked higher up is not entered again,
/// so recursive types produce finite trees.
///
/// Looking through wrappers on fields goes further than Go's `reflect`-based
/// checkers, which only descend into fields whose kind is a struct: there an
/// `Option<Address>` or `Box<Address>` field (a `*Address` in Go) would be a
/// leaf, while here its `Address` fields are listed too.
pub fn shape_tree(shape: &'static Shape, options: &CompareOptions) -> FieldTree {
    let mut root = FieldTree::new(options.root_name.as_str());
    let mut ancestors = Vec::new();
    collect_fields(shape, &mut root, options, &mut ancestors);
    root
}

/// Strip `Option` and pointer layers until something else shows up.
fn peel(mut shape: &'static Shape) -> &'static Shape {
    loop {
        shape = match shape.def {
            Def::Option(od) => od.t(),
            Def::Pointer(pd) => match pd.pointee() {
                Some(pointee) => pointee,
                None => return shape,
            },
            _ => return shape,
        };
    }
}

fn is_hidden(field: &Field, options: &CompareOptions) -> bool {
    field.has_builtin_attr("skip")
        || field.has_builtin_attr("skip_serializing")
        || (options.hide_sensitive && field.is_sensitive())
}

fn collect_fields(
    shape: &'static Shape,
    node: &mut FieldTree,
    options: &CompareOptions,
    ancestors: &mut Vec<ConstTypeId>,
) {
    let shape = peel(shape);
    let Type::User(UserType::Struct(st)) = shape.ty else {
        return;
    };
    if st.kind != StructKind::Struct {
        return;
    }
    if ancestors.contains(&shape.id) {
        debug!("{} is already being walked, treating it as a leaf", shape.type_identifier);
        return;
    }

    ancestors.push(shape.id);
    for field in st.fields {
        if is_hidden(field, options) {
            trace!("hiding {}.{}", shape.type_identifier, field.name);
            continue;
        }
        if field.is_flattened() {
            collect_fields(field.shape(), node, options, ancestors);
            continue;
        }
        let child = node.child_or_insert(field.name);
        collect_fields(field.shape(), child, options, ancestors);
    }
    ancestors.pop();
}
