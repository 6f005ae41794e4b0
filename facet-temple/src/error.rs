//! Error types for comparison and validation.

use std::{
    error::Error,
    fmt::{self, Display},
};

use facet_gotmpl::{LoadError, ParseError};
use miette::Diagnostic;

use crate::{Comparison, PlainReporter, Reporter};

/// Error returned by [`compare`](crate::compare) and [`validate`](crate::validate).
#[derive(Debug)]
pub struct TempleError {
    kind: TempleErrorKind,
}

impl TempleError {
    pub(crate) fn template_not_found(name: &str) -> Self {
        TempleErrorKind::TemplateNotFound(name.to_string()).into()
    }

    /// Returns a reference to the error kind for detailed error inspection.
    pub fn kind(&self) -> &TempleErrorKind {
        &self.kind
    }

    /// Consumes the error, returning its kind.
    pub fn into_kind(self) -> TempleErrorKind {
        self.kind
    }

    /// The comparison, if this error is a validation mismatch.
    pub fn comparison(&self) -> Option<&Comparison> {
        match &self.kind {
            TempleErrorKind::Mismatch(comparison) => Some(comparison),
            _ => None,
        }
    }
}

/// Detailed classification of errors.
#[derive(Debug)]
#[non_exhaustive]
pub enum TempleErrorKind {
    /// The template to compare against is not in the set.
    TemplateNotFound(String),
    /// Template and data disagree; returned by [`validate`](crate::validate).
    Mismatch(Comparison),
    /// A template source does not parse.
    Parse(ParseError),
    /// Template files could not be loaded.
    Load(LoadError),
}

impl TempleErrorKind {
    /// Returns an error code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            TempleErrorKind::TemplateNotFound(_) => "temple::template_not_found",
            TempleErrorKind::Mismatch(_) => "temple::mismatch",
            TempleErrorKind::Parse(_) => "temple::parse",
            TempleErrorKind::Load(_) => "temple::load",
        }
    }
}

impl Display for TempleErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TempleErrorKind::TemplateNotFound(name) => write!(f, "template {name:?} not found"),
            TempleErrorKind::Mismatch(comparison) => {
                f.write_str(&PlainReporter.report(comparison))
            }
            TempleErrorKind::Parse(error) => write!(f, "{error}"),
            TempleErrorKind::Load(error) => write!(f, "{error}"),
        }
    }
}

impl Display for TempleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl Error for TempleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            TempleErrorKind::Parse(error) => Some(error),
            TempleErrorKind::Load(error) => Some(error),
            _ => None,
        }
    }
}

impl From<TempleErrorKind> for TempleError {
    fn from(kind: TempleErrorKind) -> Self {
        TempleError { kind }
    }
}

impl From<ParseError> for TempleError {
    fn from(error: ParseError) -> Self {
        TempleErrorKind::Parse(error).into()
    }
}

impl From<LoadError> for TempleError {
    fn from(error: LoadError) -> Self {
        match error {
            LoadError::Parse(error) => TempleErrorKind::Parse(error).into(),
            other => TempleErrorKind::Load(other).into(),
        }
    }
}

impl Diagnostic for TempleError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        match &self.kind {
            TempleErrorKind::Parse(error) => error.code(),
            TempleErrorKind::Load(error) => error.code(),
            kind => Some(Box::new(kind.code())),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match &self.kind {
            TempleErrorKind::Parse(error) => error.source_code(),
            TempleErrorKind::Load(error) => error.source_code(),
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        match &self.kind {
            TempleErrorKind::Parse(error) => error.labels(),
            TempleErrorKind::Load(error) => error.labels(),
            _ => None,
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        match &self.kind {
            TempleErrorKind::TemplateNotFound(_) => Some(Box::new(
                "templates are registered under the name they were parsed with, or by {{define}}/{{block}}",
            )),
            TempleErrorKind::Mismatch(comparison) if !comparison.missing.is_empty() => Some(
                Box::new("a missing field is referenced by the template but absent from the data type"),
            ),
            TempleErrorKind::Parse(error) => error.help(),
            _ => None,
        }
    }
}
