//! Syntax tree for Go `text/template` sources.
//!
//! The node set is closed: every construct the parser understands is a variant
//! of [`Node`] or [`Arg`], so consumers match exhaustively and adding a kind is
//! a compile-time-checked change.

use core::fmt;

/// A byte range into the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Offset of the first byte.
    pub start: usize,
    /// Offset one past the last byte.
    pub end: usize,
}

impl Span {
    /// Create a span covering `start..end`.
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of bytes covered.
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no bytes.
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn join(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.len()).into()
    }
}

/// A sequence of nodes, e.g. a template body or the branch of an `if`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct List {
    /// The nodes, in source order.
    pub nodes: Vec<Node>,
    /// Where the list sits in the source.
    pub span: Span,
}

impl List {
    /// True if the list only holds whitespace text and comments.
    ///
    /// An empty body never replaces an existing definition in a [`TemplateSet`](crate::TemplateSet).
    pub fn is_empty_body(&self) -> bool {
        self.nodes.iter().all(|node| match node {
            Node::Text { text, .. } => text.trim().is_empty(),
            Node::Comment { .. } => true,
            Node::List(list) => list.is_empty_body(),
            _ => false,
        })
    }
}

/// A control structure with a pipeline, a body and an optional else branch.
///
/// Shared by `if`, `range` and `with`.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// The controlling pipeline.
    pub pipe: Pipe,
    /// Body executed when the pipeline is non-empty.
    pub list: List,
    /// Body of the `{{else}}` clause; `else if` / `else with` chains nest here.
    pub else_list: Option<List>,
    /// Span from the opening `{{` to the closing `}}` of `{{end}}`.
    pub span: Span,
}

/// A node of the template body.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text copied to the output.
    Text {
        /// The text, after trim markers were applied.
        text: String,
        /// Source location.
        span: Span,
    },
    /// `{{/* ... */}}`
    Comment {
        /// Comment body, including the `/*` and `*/` markers.
        text: String,
        /// Source location.
        span: Span,
    },
    /// `{{ pipeline }}`
    Action {
        /// The evaluated pipeline.
        pipe: Pipe,
        /// Source location.
        span: Span,
    },
    /// `{{if pipeline}} ... {{else}} ... {{end}}`
    If(Branch),
    /// `{{range pipeline}} ... {{else}} ... {{end}}`
    Range(Branch),
    /// `{{with pipeline}} ... {{else}} ... {{end}}`
    With(Branch),
    /// `{{template "name" pipeline}}`, also produced by `{{block}}`.
    Template {
        /// Name of the invoked template.
        name: String,
        /// Argument passed as dot, if any.
        pipe: Option<Pipe>,
        /// Source location.
        span: Span,
    },
    /// A nested sequence of nodes.
    List(List),
    /// `{{break}}`
    Break {
        /// Source location.
        span: Span,
    },
    /// `{{continue}}`
    Continue {
        /// Source location.
        span: Span,
    },
}

impl Node {
    /// Source location of the node.
    pub fn span(&self) -> Span {
        match self {
            Node::Text { span, .. }
            | Node::Comment { span, .. }
            | Node::Action { span, .. }
            | Node::Template { span, .. }
            | Node::Break { span }
            | Node::Continue { span } => *span,
            Node::If(branch) | Node::Range(branch) | Node::With(branch) => branch.span,
            Node::List(list) => list.span,
        }
    }
}

/// A pipeline: optional variable declarations followed by `|`-separated commands.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipe {
    /// Declared or assigned variables, e.g. `["$i", "$e"]` for `$i, $e := ...`.
    pub decl: Vec<String>,
    /// `=` rather than `:=`.
    pub is_assign: bool,
    /// The commands, in order.
    pub cmds: Vec<Command>,
    /// Source location.
    pub span: Span,
}

impl Pipe {
    /// Every argument of every command, in source order.
    pub fn args(&self) -> impl Iterator<Item = &Arg> {
        self.cmds.iter().flat_map(|cmd| cmd.args.iter())
    }
}

impl fmt::Display for Pipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.decl.is_empty() {
            write!(f, "{}", self.decl.join(", "))?;
            f.write_str(if self.is_assign { " = " } else { " := " })?;
        }
        for (i, cmd) in self.cmds.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{cmd}")?;
        }
        Ok(())
    }
}

/// A single command: a function or value followed by its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Operands, in order. The first one is the function for calls.
    pub args: Vec<Arg>,
    /// Source location.
    pub span: Span,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{arg}")?;
        }
        Ok(())
    }
}

/// An operand inside a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A field access on dot: `.A.B.C` has ident `["A", "B", "C"]`.
    Field {
        /// Identifier chain, without dots.
        ident: Vec<String>,
        /// Source location.
        span: Span,
    },
    /// `.` itself.
    Dot {
        /// Source location.
        span: Span,
    },
    /// A variable with optional field chain: `$x.A` has ident `["$x", "A"]`.
    Variable {
        /// Variable name (with `$`) followed by field names.
        ident: Vec<String>,
        /// Source location.
        span: Span,
    },
    /// A function name such as `printf`.
    Identifier {
        /// The name.
        name: String,
        /// Source location.
        span: Span,
    },
    /// Field access on a non-field operand: `(pipeline).A.B`.
    Chain {
        /// The operand the fields are taken from.
        node: Box<Arg>,
        /// Field names, without dots.
        field: Vec<String>,
        /// Source location.
        span: Span,
    },
    /// A parenthesized pipeline.
    Pipe(Box<Pipe>),
    /// A quoted or raw string constant.
    String {
        /// The literal as written, quotes included.
        quoted: String,
        /// The unquoted value.
        text: String,
        /// Source location.
        span: Span,
    },
    /// A character constant such as `'a'`.
    Char {
        /// The literal as written.
        text: String,
        /// Source location.
        span: Span,
    },
    /// A numeric constant, kept as written.
    Number {
        /// The literal as written.
        text: String,
        /// Source location.
        span: Span,
    },
    /// `true` or `false`.
    Bool {
        /// The value.
        value: bool,
        /// Source location.
        span: Span,
    },
    /// `nil`
    Nil {
        /// Source location.
        span: Span,
    },
}

impl Arg {
    /// Source location of the operand.
    pub fn span(&self) -> Span {
        match self {
            Arg::Field { span, .. }
            | Arg::Dot { span }
            | Arg::Variable { span, .. }
            | Arg::Identifier { span, .. }
            | Arg::Chain { span, .. }
            | Arg::String { span, .. }
            | Arg::Char { span, .. }
            | Arg::Number { span, .. }
            | Arg::Bool { span, .. }
            | Arg::Nil { span } => *span,
            Arg::Pipe(pipe) => pipe.span,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Field { ident, .. } => {
                for part in ident {
                    write!(f, ".{part}")?;
                }
                Ok(())
            }
            Arg::Dot { .. } => f.write_str("."),
            Arg::Variable { ident, .. } => f.write_str(&ident.join(".")),
            Arg::Identifier { name, .. } => f.write_str(name),
            Arg::Chain { node, field, .. } => {
                if matches!(**node, Arg::Pipe(_)) {
                    write!(f, "{node}")?;
                } else {
                    write!(f, "({node})")?;
                }
                for part in field {
                    write!(f, ".{part}")?;
                }
                Ok(())
            }
            Arg::Pipe(pipe) => write!(f, "({pipe})"),
            Arg::String { quoted, .. } => f.write_str(quoted),
            Arg::Char { text, .. } | Arg::Number { text, .. } => f.write_str(text),
            Arg::Bool { value, .. } => write!(f, "{value}"),
            Arg::Nil { .. } => f.write_str("nil"),
        }
    }
}
