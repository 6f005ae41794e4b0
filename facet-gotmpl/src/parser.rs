//! Recursive-descent parser from tokens to [`List`] trees.

use crate::lexer::{Keyword, Lexer, Token, TokenKind};
use crate::{Arg, Branch, Command, List, Node, ParseError, ParseErrorKind, Pipe, Span};

/// Output of parsing one source: its own body and the templates it defines.
#[derive(Debug)]
pub(crate) struct Parsed {
    pub(crate) body: List,
    pub(crate) defines: Vec<Definition>,
}

/// A `{{define}}` or `{{block}}` body.
#[derive(Debug)]
pub(crate) struct Definition {
    pub(crate) name: String,
    pub(crate) body: List,
}

pub(crate) fn parse(input: &str) -> Result<Parsed, ParseError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        vars: vec!["$".to_string()],
        range_depth: 0,
        defines: Vec::new(),
    };
    let body = parser.parse_top(input.len())?;
    Ok(Parsed {
        body,
        defines: parser.defines,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    If,
    Range,
    With,
}

impl Control {
    fn context(self) -> &'static str {
        match self {
            Control::If => "if",
            Control::Range => "range",
            Control::With => "with",
        }
    }
}

/// Which token closes a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Close {
    Delim,
    Paren,
}

/// What a single step of item parsing produced.
enum Step {
    Node(Node),
    /// `{{end}}`
    End(Span),
    /// `{{else}}`; `chained` leaves an `if`/`with` keyword pending.
    Else { span: Span, chained: bool },
}

/// Why an item list stopped.
enum Stop {
    End(Span),
    Else { span: Span, chained: bool },
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Variables in scope, innermost last.
    vars: Vec<String>,
    range_depth: usize,
    defines: Vec<Definition>,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    /// The token `n` ahead, clamped to the trailing EOF.
    fn peek_at(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn unexpected(token: &Token, context: &'static str) -> ParseError {
        ParseError::new(
            ParseErrorKind::UnexpectedToken {
                found: token.kind.to_string(),
                context,
            },
            token.span,
        )
    }

    /// Consume the `}}` ending an action.
    fn expect_close(&mut self, context: &'static str) -> Result<Span, ParseError> {
        let token = self.next();
        match token.kind {
            TokenKind::RightDelim => Ok(token.span),
            _ => Err(Self::unexpected(&token, context)),
        }
    }

    fn parse_top(&mut self, len: usize) -> Result<List, ParseError> {
        let mut nodes = Vec::new();
        loop {
            if self.peek().kind == TokenKind::Eof {
                break;
            }
            if self.peek().kind == TokenKind::LeftDelim
                && self.peek_at(1).kind == TokenKind::Keyword(Keyword::Define)
            {
                let open = self.next().span;
                self.next();
                self.parse_definition(open)?;
                continue;
            }
            match self.text_or_action()? {
                Step::Node(node) => nodes.push(node),
                Step::End(span) => return Err(ParseError::new(ParseErrorKind::UnexpectedEnd, span)),
                Step::Else { span, .. } => {
                    return Err(ParseError::new(ParseErrorKind::UnexpectedElse, span));
                }
            }
        }
        Ok(List {
            nodes,
            span: Span::new(0, len),
        })
    }

    fn parse_definition(&mut self, open: Span) -> Result<(), ParseError> {
        const CONTEXT: &str = "define clause";
        let name = self.template_name(CONTEXT)?;
        self.expect_close(CONTEXT)?;
        let body = self.detached_body(CONTEXT, open)?;
        trace!("parsed definition {name:?} with {} nodes", body.nodes.len());
        self.defines.push(Definition { name, body });
        Ok(())
    }

    /// Parse a `define`/`block` body with a fresh variable scope.
    fn detached_body(&mut self, context: &'static str, open: Span) -> Result<List, ParseError> {
        let vars = core::mem::replace(&mut self.vars, vec!["$".to_string()]);
        let range_depth = core::mem::take(&mut self.range_depth);
        let (body, stop) = self.item_list(context, open)?;
        self.vars = vars;
        self.range_depth = range_depth;
        match stop {
            Stop::End(_) => Ok(body),
            Stop::Else { span, .. } => Err(ParseError::new(
                ParseErrorKind::UnexpectedToken {
                    found: "{{else}}".to_string(),
                    context,
                },
                span,
            )),
        }
    }

    fn template_name(&mut self, context: &'static str) -> Result<String, ParseError> {
        let token = self.next();
        match token.kind {
            TokenKind::String { text, .. } => Ok(text),
            _ => Err(ParseError::new(
                ParseErrorKind::ExpectedTemplateName { context },
                token.span,
            )),
        }
    }

    /// Items up to the `{{end}}` or `{{else}}` that closes `context`.
    fn item_list(&mut self, context: &'static str, open: Span) -> Result<(List, Stop), ParseError> {
        let start = self.peek().span.start;
        let mut nodes = Vec::new();
        loop {
            if self.peek().kind == TokenKind::Eof {
                return Err(ParseError::new(ParseErrorKind::UnexpectedEof { context }, open));
            }
            let stop = match self.text_or_action()? {
                Step::Node(node) => {
                    nodes.push(node);
                    continue;
                }
                Step::End(span) => Stop::End(span),
                Step::Else { span, chained } => Stop::Else { span, chained },
            };
            let end = nodes.last().map_or(start, |node| node.span().end);
            let list = List {
                nodes,
                span: Span::new(start, end.max(start)),
            };
            return Ok((list, stop));
        }
    }

    fn text_or_action(&mut self) -> Result<Step, ParseError> {
        let token = self.next();
        match token.kind {
            TokenKind::Text(text) => Ok(Step::Node(Node::Text {
                text,
                span: token.span,
            })),
            TokenKind::Comment(text) => Ok(Step::Node(Node::Comment {
                text,
                span: token.span,
            })),
            TokenKind::LeftDelim => self.action(token.span),
            _ => Err(Self::unexpected(&token, "input")),
        }
    }

    fn action(&mut self, open: Span) -> Result<Step, ParseError> {
        let keyword = match &self.peek().kind {
            TokenKind::Keyword(keyword) => Some(*keyword),
            _ => None,
        };
        let Some(keyword) = keyword else {
            let (pipe, close) = self.pipeline("command", Close::Delim)?;
            return Ok(Step::Node(Node::Action {
                pipe,
                span: open.join(close),
            }));
        };

        let token = self.next();
        match keyword {
            Keyword::Block => self.block_control(open).map(Step::Node),
            Keyword::Break => {
                let close = self.expect_close("{{break}}")?;
                let span = open.join(close);
                if self.range_depth == 0 {
                    return Err(ParseError::new(ParseErrorKind::BreakOutsideRange, span));
                }
                Ok(Step::Node(Node::Break { span }))
            }
            Keyword::Continue => {
                let close = self.expect_close("{{continue}}")?;
                let span = open.join(close);
                if self.range_depth == 0 {
                    return Err(ParseError::new(ParseErrorKind::ContinueOutsideRange, span));
                }
                Ok(Step::Node(Node::Continue { span }))
            }
            Keyword::Else => {
                if matches!(
                    self.peek().kind,
                    TokenKind::Keyword(Keyword::If | Keyword::With)
                ) {
                    return Ok(Step::Else {
                        span: open,
                        chained: true,
                    });
                }
                let close = self.expect_close("else")?;
                Ok(Step::Else {
                    span: open.join(close),
                    chained: false,
                })
            }
            Keyword::End => {
                let close = self.expect_close("end")?;
                Ok(Step::End(open.join(close)))
            }
            Keyword::If => self.parse_control(Control::If, open).map(Step::Node),
            Keyword::Range => self.parse_control(Control::Range, open).map(Step::Node),
            Keyword::With => self.parse_control(Control::With, open).map(Step::Node),
            Keyword::Template => self.template_control(open).map(Step::Node),
            Keyword::Define => Err(Self::unexpected(&token, "command")),
        }
    }

    fn parse_control(&mut self, control: Control, open: Span) -> Result<Node, ParseError> {
        let context = control.context();
        let scope = self.vars.len();
        let (pipe, _) = self.pipeline(context, Close::Delim)?;

        if control == Control::Range {
            self.range_depth += 1;
        }
        let (list, stop) = self.item_list(context, open)?;
        if control == Control::Range {
            self.range_depth -= 1;
        }

        let (else_list, end) = match stop {
            Stop::End(span) => (None, span),
            Stop::Else {
                span,
                chained: true,
            } => {
                // `{{else if x}}` is `{{else}}{{if x}}...{{end}}` sharing one `{{end}}`.
                let keyword = self.next();
                let nested = match (control, &keyword.kind) {
                    (Control::If, TokenKind::Keyword(Keyword::If)) => {
                        self.parse_control(Control::If, span)?
                    }
                    (Control::With, TokenKind::Keyword(Keyword::With)) => {
                        self.parse_control(Control::With, span)?
                    }
                    _ => return Err(Self::unexpected(&keyword, "input")),
                };
                let nested_span = nested.span();
                let list = List {
                    nodes: vec![nested],
                    span: nested_span,
                };
                (Some(list), nested_span)
            }
            Stop::Else {
                span: else_span,
                chained: false,
            } => {
                let (list, stop) = self.item_list(context, else_span)?;
                match stop {
                    Stop::End(span) => (Some(list), span),
                    Stop::Else { span, .. } => {
                        return Err(ParseError::new(ParseErrorKind::ExpectedEnd { context }, span));
                    }
                }
            }
        };
        self.vars.truncate(scope);

        let branch = Branch {
            pipe,
            list,
            else_list,
            span: open.join(end),
        };
        Ok(match control {
            Control::If => Node::If(branch),
            Control::Range => Node::Range(branch),
            Control::With => Node::With(branch),
        })
    }

    fn template_control(&mut self, open: Span) -> Result<Node, ParseError> {
        const CONTEXT: &str = "template clause";
        let name = self.template_name(CONTEXT)?;
        let (pipe, close) = if self.peek().kind == TokenKind::RightDelim {
            (None, self.next().span)
        } else {
            let (pipe, close) = self.pipeline(CONTEXT, Close::Delim)?;
            (Some(pipe), close)
        };
        Ok(Node::Template {
            name,
            pipe,
            span: open.join(close),
        })
    }

    /// `{{block "name" pipe}} body {{end}}` defines `name` and invokes it in place.
    fn block_control(&mut self, open: Span) -> Result<Node, ParseError> {
        const CONTEXT: &str = "block clause";
        let name = self.template_name(CONTEXT)?;
        let (pipe, close) = self.pipeline(CONTEXT, Close::Delim)?;
        let body = self.detached_body(CONTEXT, open)?;
        trace!("parsed block {name:?} with {} nodes", body.nodes.len());
        self.defines.push(Definition {
            name: name.clone(),
            body,
        });
        Ok(Node::Template {
            name,
            pipe: Some(pipe),
            span: open.join(close),
        })
    }

    fn pipeline(&mut self, context: &'static str, close: Close) -> Result<(Pipe, Span), ParseError> {
        let start = self.peek().span.start;
        let mut pipe = Pipe::default();
        self.declarations(&mut pipe, context)?;

        let mut after_bar = false;
        loop {
            let token = self.peek().clone();
            let closes = match (&token.kind, close) {
                (TokenKind::RightDelim, Close::Delim) | (TokenKind::RightParen, Close::Paren) => true,
                _ => false,
            };
            if closes || token.kind == TokenKind::Pipe {
                if after_bar || (token.kind == TokenKind::Pipe && pipe.cmds.is_empty()) {
                    return Err(ParseError::new(ParseErrorKind::EmptyCommand, token.span));
                }
                if token.kind == TokenKind::Pipe {
                    self.next();
                    after_bar = true;
                    continue;
                }
                self.next();
                if pipe.cmds.is_empty() {
                    return Err(ParseError::new(ParseErrorKind::MissingValue { context }, token.span));
                }
                let end = pipe.cmds.last().map_or(start, |cmd| cmd.span.end);
                pipe.span = Span::new(start, end);
                return Ok((pipe, token.span));
            }
            if !starts_operand(&token.kind) {
                return Err(Self::unexpected(&token, context));
            }
            pipe.cmds.push(self.command()?);
            after_bar = false;
        }
    }

    /// `$x :=`, `$x =`, or `$i, $e :=` at the start of a pipeline.
    fn declarations(&mut self, pipe: &mut Pipe, context: &'static str) -> Result<(), ParseError> {
        loop {
            let TokenKind::Variable(name) = &self.peek().kind else {
                return Ok(());
            };
            let name = name.clone();
            let span = self.peek().span;
            let next = self.peek_at(1).kind.clone();
            match next {
                TokenKind::Declare | TokenKind::Assign => {
                    let is_assign = next == TokenKind::Assign;
                    if is_assign && !self.vars.contains(&name) {
                        return Err(ParseError::new(ParseErrorKind::UndefinedVariable(name), span));
                    }
                    self.pos += 2;
                    pipe.is_assign = is_assign;
                    pipe.decl.push(name.clone());
                    self.vars.push(name);
                    return Ok(());
                }
                TokenKind::Comma => {
                    self.pos += 2;
                    pipe.decl.push(name.clone());
                    self.vars.push(name);
                    if context != "range" || pipe.decl.len() >= 2 {
                        return Err(ParseError::new(ParseErrorKind::TooManyDeclarations, span));
                    }
                    match self.peek().kind {
                        TokenKind::Variable(_) => continue,
                        _ => return Err(Self::unexpected(self.peek(), "range declaration")),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn command(&mut self) -> Result<Command, ParseError> {
        let start = self.peek().span.start;
        let mut args = Vec::new();
        while starts_operand(&self.peek().kind) {
            args.push(self.operand()?);
        }
        match self.peek().kind {
            TokenKind::Pipe | TokenKind::RightDelim | TokenKind::RightParen => {}
            _ => return Err(Self::unexpected(self.peek(), "operand")),
        }
        let end = args.last().map_or(start, |arg: &Arg| arg.span().end);
        if args.is_empty() {
            return Err(ParseError::new(ParseErrorKind::EmptyCommand, Span::new(start, end)));
        }
        Ok(Command {
            args,
            span: Span::new(start, end),
        })
    }

    /// A term followed by any directly adjacent `.Field` tokens.
    fn operand(&mut self) -> Result<Arg, ParseError> {
        let (term, mut end) = self.term()?;
        let start = term.span().start;

        let mut fields = Vec::new();
        while let TokenKind::Field(name) = &self.peek().kind {
            if self.peek().span.start != end {
                break;
            }
            fields.push(name.clone());
            end = self.peek().span.end;
            self.pos += 1;
        }
        // `.A.` leaves a bare dot glued to the operand.
        if matches!(self.peek().kind, TokenKind::Dot) && self.peek().span.start == end {
            return Err(Self::unexpected(self.peek(), "operand"));
        }
        if fields.is_empty() {
            return Ok(term);
        }

        let span = Span::new(start, end);
        if matches!(
            term,
            Arg::Bool { .. }
                | Arg::String { .. }
                | Arg::Number { .. }
                | Arg::Char { .. }
                | Arg::Nil { .. }
                | Arg::Dot { .. }
        ) {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedChain(term.to_string()),
                span,
            ));
        }
        match term {
            Arg::Field { mut ident, .. } => {
                ident.extend(fields);
                Ok(Arg::Field { ident, span })
            }
            Arg::Variable { mut ident, .. } => {
                ident.extend(fields);
                Ok(Arg::Variable { ident, span })
            }
            node => Ok(Arg::Chain {
                node: Box::new(node),
                field: fields,
                span,
            }),
        }
    }

    /// A single operand and the offset just past it.
    fn term(&mut self) -> Result<(Arg, usize), ParseError> {
        let token = self.next();
        let span = token.span;
        let arg = match token.kind {
            TokenKind::Dot => Arg::Dot { span },
            TokenKind::Field(name) => Arg::Field {
                ident: vec![name],
                span,
            },
            TokenKind::Variable(name) => {
                if !self.vars.contains(&name) {
                    return Err(ParseError::new(ParseErrorKind::UndefinedVariable(name), span));
                }
                Arg::Variable {
                    ident: vec![name],
                    span,
                }
            }
            TokenKind::Identifier(name) => Arg::Identifier { name, span },
            TokenKind::Bool(value) => Arg::Bool { value, span },
            TokenKind::Nil => Arg::Nil { span },
            TokenKind::Number(text) => Arg::Number { text, span },
            TokenKind::Char(text) => Arg::Char { text, span },
            TokenKind::String { quoted, text } => Arg::String { quoted, text, span },
            TokenKind::LeftParen => {
                let (pipe, close) = self.pipeline("parenthesized pipeline", Close::Paren)?;
                return Ok((Arg::Pipe(Box::new(pipe)), close.end));
            }
            _ => return Err(Self::unexpected(&token, "operand")),
        };
        Ok((arg, span.end))
    }
}

fn starts_operand(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Bool(_)
            | TokenKind::Char(_)
            | TokenKind::Dot
            | TokenKind::Field(_)
            | TokenKind::Identifier(_)
            | TokenKind::Number(_)
            | TokenKind::Nil
            | TokenKind::String { .. }
            | TokenKind::Variable(_)
            | TokenKind::LeftParen
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(input: &str) -> Vec<Node> {
        parse(input).unwrap().body.nodes
    }

    fn error(input: &str) -> ParseErrorKind {
        parse(input).unwrap_err().kind().clone()
    }

    #[test]
    fn action_with_field_chain() {
        let nodes = body("{{ .A.B }}");
        let Node::Action { pipe, .. } = &nodes[0] else {
            panic!("expected action, got {:?}", nodes[0]);
        };
        let Arg::Field { ident, .. } = &pipe.cmds[0].args[0] else {
            panic!("expected field");
        };
        assert_eq!(ident, &["A", "B"]);
    }

    #[test]
    fn separated_fields_are_separate_args() {
        let nodes = body("{{ printf .A .B }}");
        let Node::Action { pipe, .. } = &nodes[0] else {
            panic!("expected action");
        };
        assert_eq!(pipe.cmds[0].args.len(), 3);
    }

    #[test]
    fn variable_chain_and_paren_chain() {
        let nodes = body("{{ $x := .A }}{{ $x.B }}{{ (index .M 1).C }}");
        let Node::Action { pipe, .. } = &nodes[1] else {
            panic!("expected action");
        };
        assert_eq!(pipe.to_string(), "$x.B");
        let Node::Action { pipe, .. } = &nodes[2] else {
            panic!("expected action");
        };
        assert!(matches!(pipe.cmds[0].args[0], Arg::Chain { .. }));
        assert_eq!(pipe.to_string(), "(index .M 1).C");
    }

    #[test]
    fn else_if_nests_in_else_list() {
        let nodes = body("{{if .A}}a{{else if .B}}b{{else}}c{{end}}");
        let Node::If(outer) = &nodes[0] else {
            panic!("expected if");
        };
        let else_list = outer.else_list.as_ref().unwrap();
        let Node::If(inner) = &else_list.nodes[0] else {
            panic!("expected nested if");
        };
        assert!(inner.else_list.is_some());
    }

    #[test]
    fn define_is_lifted_out_of_the_body() {
        let parsed = parse(r#"a{{define "x"}}{{.X}}{{end}}b"#).unwrap();
        assert_eq!(parsed.body.nodes.len(), 2);
        assert_eq!(parsed.defines.len(), 1);
        assert_eq!(parsed.defines[0].name, "x");
    }

    #[test]
    fn block_defines_and_invokes() {
        let parsed = parse(r#"{{block "b" .Inner}}{{.Y}}{{end}}"#).unwrap();
        assert!(matches!(&parsed.body.nodes[0], Node::Template { name, pipe: Some(_), .. } if name == "b"));
        assert_eq!(parsed.defines[0].name, "b");
    }

    #[test]
    fn variable_scope_ends_with_control() {
        assert_eq!(
            error("{{with $x := .A}}{{$x}}{{end}}{{$x}}"),
            ParseErrorKind::UndefinedVariable("$x".into())
        );
    }

    #[test]
    fn range_declares_two_variables() {
        let nodes = body("{{range $i, $e := .Items}}{{$i}}{{$e}}{{end}}");
        let Node::Range(branch) = &nodes[0] else {
            panic!("expected range");
        };
        assert_eq!(branch.pipe.decl, ["$i", "$e"]);
    }

    #[test]
    fn structural_errors() {
        assert_eq!(error("{{end}}"), ParseErrorKind::UnexpectedEnd);
        assert_eq!(error("{{else}}"), ParseErrorKind::UnexpectedElse);
        assert_eq!(error("{{break}}"), ParseErrorKind::BreakOutsideRange);
        assert_eq!(
            error("{{if .A}}"),
            ParseErrorKind::UnexpectedEof { context: "if" }
        );
        assert_eq!(
            error("{{if .A}}{{else}}{{else}}{{end}}"),
            ParseErrorKind::ExpectedEnd { context: "if" }
        );
        assert_eq!(error("{{}}"), ParseErrorKind::MissingValue { context: "command" });
        assert_eq!(error("{{.A | | .B}}"), ParseErrorKind::EmptyCommand);
        assert_eq!(error(r#"{{"s".A}}"#), ParseErrorKind::UnexpectedChain("\"s\"".into()));
        assert_eq!(error("{{$a, $b := .X}}"), ParseErrorKind::TooManyDeclarations);
    }

    #[test]
    fn trailing_dot_after_operand_is_rejected() {
        for input in ["{{ .A.}}", "{{ .A.B. }}", "{{ $.A.}}", "{{ (.A).}}"] {
            assert!(
                matches!(
                    error(input),
                    ParseErrorKind::UnexpectedToken { context: "operand", .. }
                ),
                "{input}"
            );
        }
        assert!(parse("{{ .A . }}").is_ok());
    }
}
