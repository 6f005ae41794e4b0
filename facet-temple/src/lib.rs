#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod tracing_macros;

mod compare;
mod diff;
mod error;
mod field_tree;
mod options;
mod report;
mod shape_walk;
mod template_walk;

pub use compare::{compare, compare_shape, compare_with, validate, validate_with};
pub use diff::{Comparison, diff_trees};
pub use error::{TempleError, TempleErrorKind};
pub use facet_gotmpl::TemplateSet;
pub use field_tree::FieldTree;
pub use options::CompareOptions;
pub use report::{AnsiReporter, PlainReporter, Reporter};
pub use shape_walk::shape_tree;
pub use template_walk::template_tree;

/// Asserts that a data value's type uses exactly the fields a template does.
///
/// # Panics
///
/// Panics with a line per missing and extra field if they disagree, or with
/// the error if the template is not in the set.
///
/// # Example
///
/// ```
/// use facet::Facet;
/// use facet_temple::{TemplateSet, assert_fits_template};
///
/// #[derive(Facet)]
/// #[facet(rename_all = "PascalCase")]
/// struct Greeting {
///     name: String,
/// }
///
/// let set = TemplateSet::parse("hello", "Hello, {{ .Name }}!").unwrap();
/// assert_fits_template!(Greeting { name: "Ferris".into() }, set, "hello");
/// ```
#[macro_export]
macro_rules! assert_fits_template {
    ($data:expr, $set:expr, $name:expr $(,)?) => {
        $crate::assert_fits_template_with!($data, $set, $name, $crate::CompareOptions::default())
    };
    ($data:expr, $set:expr, $name:expr, $($arg:tt)+) => {
        $crate::assert_fits_template_with!(
            $data,
            $set,
            $name,
            $crate::CompareOptions::default(),
            $($arg)+
        )
    };
}

/// Asserts that a data value's type fits a template, with custom options.
///
/// Like [`assert_fits_template!`], but takes [`CompareOptions`].
///
/// # Panics
///
/// Panics if the fields disagree or the template is not in the set.
#[macro_export]
macro_rules! assert_fits_template_with {
    ($data:expr, $set:expr, $name:expr, $options:expr $(,)?) => {{
        let name: &str = $name;
        match $crate::compare_with(&$data, &$set, name, $options) {
            Ok(comparison) if comparison.is_match() => {}
            Ok(comparison) => {
                panic!(
                    "assertion `assert_fits_template!(data, set, {name:?})` failed\n\n{}\n",
                    $crate::Reporter::report(&$crate::AnsiReporter::new(), &comparison)
                );
            }
            Err(error) => {
                panic!("assertion `assert_fits_template!(data, set, {name:?})` failed: {error}");
            }
        }
    }};
    ($data:expr, $set:expr, $name:expr, $options:expr, $($arg:tt)+) => {{
        let name: &str = $name;
        match $crate::compare_with(&$data, &$set, name, $options) {
            Ok(comparison) if comparison.is_match() => {}
            Ok(comparison) => {
                panic!(
                    "assertion `assert_fits_template!(data, set, {name:?})` failed: {}\n\n{}\n",
                    format_args!($($arg)+),
                    $crate::Reporter::report(&$crate::AnsiReporter::new(), &comparison)
                );
            }
            Err(error) => {
                panic!(
                    "assertion `assert_fits_template!(data, set, {name:?})` failed: {}: {error}",
                    format_args!($($arg)+)
                );
            }
        }
    }};
}
