//! Errors produced while lexing, parsing and loading templates.

use std::{
    error::Error,
    fmt::{self, Display},
    path::PathBuf,
};

use miette::Diagnostic;

use crate::Span;

/// A syntax error in a template source.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// The specific kind of error
    pub(crate) kind: ParseErrorKind,
    /// Where the error occurred
    pub(crate) span: Span,
    /// Source code for diagnostics
    pub(crate) source_code: Option<String>,
    /// Name of the template being parsed
    pub(crate) template: Option<String>,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, span: Span) -> Self {
        ParseError {
            kind,
            span,
            source_code: None,
            template: None,
        }
    }

    /// Attach the full template source for diagnostics.
    pub(crate) fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_code = Some(source.into());
        self
    }

    /// Record the name the source was being parsed under.
    pub(crate) fn with_template(mut self, name: impl Into<String>) -> Self {
        self.template = Some(name.into());
        self
    }

    /// Returns a reference to the error kind for detailed error inspection.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// Byte span of the offending input.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Name of the template that failed to parse, if known.
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// 1-based line of the error start, if the source is attached.
    pub fn line(&self) -> Option<usize> {
        let source = self.source_code.as_deref()?;
        let upto = self.span.start.min(source.len());
        Some(source[..upto].matches('\n').count() + 1)
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.template, self.line()) {
            (Some(name), Some(line)) => write!(f, "template: {name}:{line}: {}", self.kind),
            (Some(name), None) => write!(f, "template: {name}: {}", self.kind),
            (None, _) => write!(f, "{}", self.kind),
        }
    }
}

impl Error for ParseError {}

/// Detailed classification of template syntax errors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// Input ended inside `{{ ... }}`.
    UnclosedAction,
    /// Input ended inside `/* ... */`.
    UnclosedComment,
    /// A comment was followed by something other than the closing delimiter.
    CommentNotClosed,
    /// A quoted string was not terminated before the end of the line.
    UnterminatedString,
    /// A raw string was not terminated.
    UnterminatedRawString,
    /// A character constant was not terminated.
    UnterminatedChar,
    /// An escape sequence that is not valid in a quoted literal.
    BadEscape(String),
    /// A malformed numeric constant.
    BadNumber(String),
    /// A character that cannot start any token.
    UnexpectedChar(char),
    /// `:` not followed by `=`.
    ExpectedDeclare,
    /// `(` without a matching `)`.
    UnclosedParen,
    /// `)` without a matching `(`.
    UnexpectedRightParen,
    /// A token that is not valid in this position.
    UnexpectedToken {
        /// What was found.
        found: String,
        /// What was being parsed.
        context: &'static str,
    },
    /// Input ended before a control structure was closed.
    UnexpectedEof {
        /// The unclosed construct.
        context: &'static str,
    },
    /// `{{end}}` without an open control structure.
    UnexpectedEnd,
    /// `{{else}}` without an open control structure.
    UnexpectedElse,
    /// `{{else}}` where `{{end}}` was required.
    ExpectedEnd {
        /// The construct that needs closing.
        context: &'static str,
    },
    /// A pipeline with no command.
    MissingValue {
        /// What was being parsed.
        context: &'static str,
    },
    /// A command with no operands.
    EmptyCommand,
    /// A `.Field` chained onto a literal.
    UnexpectedChain(String),
    /// A template name was required.
    ExpectedTemplateName {
        /// The keyword needing the name.
        context: &'static str,
    },
    /// Use of a variable that was never declared.
    UndefinedVariable(String),
    /// `{{break}}` outside `{{range}}`.
    BreakOutsideRange,
    /// `{{continue}}` outside `{{range}}`.
    ContinueOutsideRange,
    /// More than two variables declared in a `range`.
    TooManyDeclarations,
}

impl ParseErrorKind {
    /// Returns an error code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ParseErrorKind::UnclosedAction => "gotmpl::unclosed_action",
            ParseErrorKind::UnclosedComment => "gotmpl::unclosed_comment",
            ParseErrorKind::CommentNotClosed => "gotmpl::comment_not_closed",
            ParseErrorKind::UnterminatedString => "gotmpl::unterminated_string",
            ParseErrorKind::UnterminatedRawString => "gotmpl::unterminated_raw_string",
            ParseErrorKind::UnterminatedChar => "gotmpl::unterminated_char",
            ParseErrorKind::BadEscape(_) => "gotmpl::bad_escape",
            ParseErrorKind::BadNumber(_) => "gotmpl::bad_number",
            ParseErrorKind::UnexpectedChar(_) => "gotmpl::unexpected_char",
            ParseErrorKind::ExpectedDeclare => "gotmpl::expected_declare",
            ParseErrorKind::UnclosedParen => "gotmpl::unclosed_paren",
            ParseErrorKind::UnexpectedRightParen => "gotmpl::unexpected_right_paren",
            ParseErrorKind::UnexpectedToken { .. } => "gotmpl::unexpected_token",
            ParseErrorKind::UnexpectedEof { .. } => "gotmpl::unexpected_eof",
            ParseErrorKind::UnexpectedEnd => "gotmpl::unexpected_end",
            ParseErrorKind::UnexpectedElse => "gotmpl::unexpected_else",
            ParseErrorKind::ExpectedEnd { .. } => "gotmpl::expected_end",
            ParseErrorKind::MissingValue { .. } => "gotmpl::missing_value",
            ParseErrorKind::EmptyCommand => "gotmpl::empty_command",
            ParseErrorKind::UnexpectedChain(_) => "gotmpl::unexpected_chain",
            ParseErrorKind::ExpectedTemplateName { .. } => "gotmpl::expected_template_name",
            ParseErrorKind::UndefinedVariable(_) => "gotmpl::undefined_variable",
            ParseErrorKind::BreakOutsideRange => "gotmpl::break_outside_range",
            ParseErrorKind::ContinueOutsideRange => "gotmpl::continue_outside_range",
            ParseErrorKind::TooManyDeclarations => "gotmpl::too_many_declarations",
        }
    }
}

impl Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnclosedAction => write!(f, "unclosed action"),
            ParseErrorKind::UnclosedComment => write!(f, "unclosed comment"),
            ParseErrorKind::CommentNotClosed => {
                write!(f, "comment ends before closing delimiter")
            }
            ParseErrorKind::UnterminatedString => write!(f, "unterminated quoted string"),
            ParseErrorKind::UnterminatedRawString => write!(f, "unterminated raw quoted string"),
            ParseErrorKind::UnterminatedChar => write!(f, "unterminated character constant"),
            ParseErrorKind::BadEscape(seq) => write!(f, "invalid escape sequence `{seq}`"),
            ParseErrorKind::BadNumber(text) => write!(f, "bad number syntax: {text:?}"),
            ParseErrorKind::UnexpectedChar(c) => write!(f, "unrecognized character in action: {c:?}"),
            ParseErrorKind::ExpectedDeclare => write!(f, "expected :="),
            ParseErrorKind::UnclosedParen => write!(f, "unclosed left paren"),
            ParseErrorKind::UnexpectedRightParen => write!(f, "unexpected right paren"),
            ParseErrorKind::UnexpectedToken { found, context } => {
                write!(f, "unexpected {found} in {context}")
            }
            ParseErrorKind::UnexpectedEof { context } => {
                write!(f, "unexpected EOF: missing {{{{end}}}} for {context}")
            }
            ParseErrorKind::UnexpectedEnd => write!(f, "unexpected {{{{end}}}}"),
            ParseErrorKind::UnexpectedElse => write!(f, "unexpected {{{{else}}}}"),
            ParseErrorKind::ExpectedEnd { context } => {
                write!(f, "expected end; found {{{{else}}}} in {context}")
            }
            ParseErrorKind::MissingValue { context } => write!(f, "missing value for {context}"),
            ParseErrorKind::EmptyCommand => write!(f, "empty command"),
            ParseErrorKind::UnexpectedChain(term) => write!(f, "unexpected . after term {term:?}"),
            ParseErrorKind::ExpectedTemplateName { context } => {
                write!(f, "expected quoted template name in {context}")
            }
            ParseErrorKind::UndefinedVariable(name) => write!(f, "undefined variable {name:?}"),
            ParseErrorKind::BreakOutsideRange => write!(f, "{{{{break}}}} outside {{{{range}}}}"),
            ParseErrorKind::ContinueOutsideRange => {
                write!(f, "{{{{continue}}}} outside {{{{range}}}}")
            }
            ParseErrorKind::TooManyDeclarations => write!(f, "too many declarations in range"),
        }
    }
}

impl Diagnostic for ParseError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_code
            .as_ref()
            .map(|s| s as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        self.source_code.as_ref()?;
        let label = match &self.kind {
            ParseErrorKind::UnexpectedToken { found, .. } => format!("unexpected {found}"),
            ParseErrorKind::UndefinedVariable(name) => format!("`{name}` is not declared"),
            ParseErrorKind::UnexpectedEof { context } => format!("{context} opened here"),
            _ => "error occurred here".to_string(),
        };
        Some(Box::new(std::iter::once(miette::LabeledSpan::at(
            self.span, label,
        ))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        match &self.kind {
            ParseErrorKind::UndefinedVariable(_) => Some(Box::new(
                "declare it first with `{{ $name := ... }}`; declarations end with the enclosing {{end}}",
            )),
            ParseErrorKind::CommentNotClosed => {
                Some(Box::new("a comment must be the only thing in its action"))
            }
            _ => None,
        }
    }
}

/// Failure while loading templates from disk.
#[derive(Debug)]
pub enum LoadError {
    /// The file could not be read.
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        error: std::io::Error,
    },
    /// The file name is not valid UTF-8, so it cannot name a template.
    BadFileName(PathBuf),
    /// The file was read but does not parse.
    Parse(ParseError),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, error } => write!(f, "reading {}: {error}", path.display()),
            LoadError::BadFileName(path) => {
                write!(f, "template file name is not valid UTF-8: {}", path.display())
            }
            LoadError::Parse(error) => write!(f, "{error}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Io { error, .. } => Some(error),
            LoadError::BadFileName(_) => None,
            LoadError::Parse(error) => Some(error),
        }
    }
}

impl From<ParseError> for LoadError {
    fn from(value: ParseError) -> Self {
        LoadError::Parse(value)
    }
}

impl Diagnostic for LoadError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        match self {
            LoadError::Io { .. } => Some(Box::new("gotmpl::io")),
            LoadError::BadFileName(_) => Some(Box::new("gotmpl::bad_file_name")),
            LoadError::Parse(error) => error.code(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            LoadError::Parse(error) => error.source_code(),
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        match self {
            LoadError::Parse(error) => error.labels(),
            _ => None,
        }
    }
}
