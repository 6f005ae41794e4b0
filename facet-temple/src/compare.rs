//! Entry points: compare a data type with a template, or validate that they fit.

use facet_core::{Facet, Shape};
use facet_gotmpl::TemplateSet;

use crate::{
    CompareOptions, Comparison, TempleError, TempleErrorKind, diff_trees, shape_tree,
    template_tree,
};

/// Compare the fields of `data`'s type with the fields the template `name`
/// references.
///
/// Only the type of `data` matters; its values are never read. Fails with
/// [`TempleErrorKind::TemplateNotFound`] if `name` is not in `set`.
pub fn compare<'f, T: Facet<'f>>(
    data: &T,
    set: &TemplateSet,
    name: &str,
) -> Result<Comparison, TempleError> {
    compare_with(data, set, name, CompareOptions::default())
}

/// Like [`compare`], with custom [`CompareOptions`].
pub fn compare_with<'f, T: Facet<'f>>(
    _data: &T,
    set: &TemplateSet,
    name: &str,
    options: CompareOptions,
) -> Result<Comparison, TempleError> {
    compare_shape(T::SHAPE, set, name, &options)
}

/// Compare a [`Shape`] directly, for when no value is at hand.
pub fn compare_shape(
    shape: &'static Shape,
    set: &TemplateSet,
    name: &str,
    options: &CompareOptions,
) -> Result<Comparison, TempleError> {
    let template = template_tree(set, name, options)?;
    let data = shape_tree(shape, options);
    let comparison = diff_trees(&template, &data);
    debug!(
        "{} against {name:?}: {} missing, {} extra",
        shape.type_identifier,
        comparison.missing.len(),
        comparison.extra.len()
    );
    Ok(comparison)
}

/// Check that `data`'s type and the template `name` use exactly the same fields.
///
/// A disagreement is reported as [`TempleErrorKind::Mismatch`], whose message
/// reads `extra fields [...] missing fields [...]`.
pub fn validate<'f, T: Facet<'f>>(
    data: &T,
    set: &TemplateSet,
    name: &str,
) -> Result<(), TempleError> {
    validate_with(data, set, name, CompareOptions::default())
}

/// Like [`validate`], with custom [`CompareOptions`].
pub fn validate_with<'f, T: Facet<'f>>(
    data: &T,
    set: &TemplateSet,
    name: &str,
    options: CompareOptions,
) -> Result<(), TempleError> {
    let comparison = compare_with(data, set, name, options)?;
    if comparison.is_match() {
        Ok(())
    } else {
        Err(TempleErrorKind::Mismatch(comparison).into())
    }
}
