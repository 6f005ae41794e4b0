//! Turns template source into a flat token stream.
//!
//! Text outside `{{ }}` becomes [`TokenKind::Text`] with trim markers already
//! applied; comments become a single [`TokenKind::Comment`]; everything else
//! is lexed inside the action. Adjacent field tokens (`.A.B`, `$x.A`,
//! `(pipe).A`) are emitted separately and joined by the parser using spans.

use core::fmt;

use crate::{ParseError, ParseErrorKind, Span};

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";
const LEFT_COMMENT: &str = "/*";
const RIGHT_COMMENT: &str = "*/";

/// Reserved words inside actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    Block,
    Break,
    Continue,
    Define,
    Else,
    End,
    If,
    Range,
    Template,
    With,
}

impl Keyword {
    fn from_ident(word: &str) -> Option<Self> {
        Some(match word {
            "block" => Keyword::Block,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "define" => Keyword::Define,
            "else" => Keyword::Else,
            "end" => Keyword::End,
            "if" => Keyword::If,
            "range" => Keyword::Range,
            "template" => Keyword::Template,
            "with" => Keyword::With,
            _ => return None,
        })
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Keyword::Block => "block",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::Define => "define",
            Keyword::Else => "else",
            Keyword::End => "end",
            Keyword::If => "if",
            Keyword::Range => "range",
            Keyword::Template => "template",
            Keyword::With => "with",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Text(String),
    Comment(String),
    LeftDelim,
    RightDelim,
    LeftParen,
    RightParen,
    Pipe,
    Comma,
    Declare,
    Assign,
    Dot,
    /// `.Name`, stored without the dot
    Field(String),
    /// `$` or `$name`, stored with the dollar
    Variable(String),
    Identifier(String),
    Keyword(Keyword),
    Bool(bool),
    Nil,
    String {
        quoted: String,
        text: String,
    },
    Char(String),
    Number(String),
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Text(text) => write!(f, "text {text:?}"),
            TokenKind::Comment(_) => f.write_str("comment"),
            TokenKind::LeftDelim => f.write_str(LEFT_DELIM),
            TokenKind::RightDelim => f.write_str(RIGHT_DELIM),
            TokenKind::LeftParen => f.write_str("\"(\""),
            TokenKind::RightParen => f.write_str("\")\""),
            TokenKind::Pipe => f.write_str("\"|\""),
            TokenKind::Comma => f.write_str("\",\""),
            TokenKind::Declare => f.write_str("\":=\""),
            TokenKind::Assign => f.write_str("\"=\""),
            TokenKind::Dot => f.write_str("<.>"),
            TokenKind::Field(name) => write!(f, "<.{name}>"),
            TokenKind::Variable(name) => write!(f, "<{name}>"),
            TokenKind::Identifier(name) => write!(f, "<{name}>"),
            TokenKind::Keyword(keyword) => write!(f, "<{}>", keyword.as_str()),
            TokenKind::Bool(value) => write!(f, "<{value}>"),
            TokenKind::Nil => f.write_str("<nil>"),
            TokenKind::String { quoted, .. } => f.write_str(quoted),
            TokenKind::Char(text) | TokenKind::Number(text) => f.write_str(text),
            TokenKind::Eof => f.write_str("EOF"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// `{{- ` : a dash right after the delimiter, followed by whitespace.
fn has_left_trim(after_delim: &str) -> bool {
    let mut chars = after_delim.chars();
    chars.next() == Some('-') && chars.next().is_some_and(is_space)
}

/// Length of the closing delimiter at the start of `rest`, and whether it trims.
fn right_delim_at(rest: &str) -> Option<(usize, bool)> {
    if rest.starts_with(RIGHT_DELIM) {
        return Some((RIGHT_DELIM.len(), false));
    }
    let mut chars = rest.chars();
    if chars.next().is_some_and(is_space) && rest[1..].starts_with("-}}") {
        return Some((1 + 1 + RIGHT_DELIM.len(), true));
    }
    None
}

pub(crate) struct Lexer<'input> {
    input: &'input str,
    pos: usize,
    tokens: Vec<Token>,
    /// The previous action ended with ` -}}`.
    trim_next: bool,
    paren_depth: usize,
}

impl<'input> Lexer<'input> {
    pub(crate) fn new(input: &'input str) -> Self {
        Lexer {
            input,
            pos: 0,
            tokens: Vec::new(),
            trim_next: false,
            paren_depth: 0,
        }
    }

    pub(crate) fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        while self.lex_text() {
            self.lex_action()?;
        }
        let end = self.input.len();
        self.push(TokenKind::Eof, end, end);
        Ok(self.tokens)
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, end),
        });
    }

    fn error(&self, kind: ParseErrorKind, start: usize, end: usize) -> ParseError {
        ParseError::new(kind, Span::new(start, end))
    }

    /// Emit the text up to the next `{{`. Returns false at end of input.
    fn lex_text(&mut self) -> bool {
        let (end, found) = match self.input[self.pos..].find(LEFT_DELIM) {
            Some(offset) => (self.pos + offset, true),
            None => (self.input.len(), false),
        };

        let raw = &self.input[self.pos..end];
        let lead = if core::mem::take(&mut self.trim_next) {
            raw.len() - raw.trim_start_matches(is_space).len()
        } else {
            0
        };
        let mut body = &raw[lead..];
        if found && has_left_trim(&self.input[end + LEFT_DELIM.len()..]) {
            body = body.trim_end_matches(is_space);
        }

        if !body.is_empty() {
            let start = self.pos + lead;
            self.push(TokenKind::Text(body.to_string()), start, start + body.len());
        }
        self.pos = end;
        found
    }

    fn lex_action(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += LEFT_DELIM.len();

        let trimmed = has_left_trim(&self.input[self.pos..]);
        if trimmed {
            self.pos += 1;
        }

        // A comment may only follow the delimiter directly, or "- " when trimming.
        let comment_start = if trimmed { self.pos + 1 } else { self.pos };
        if self.input[comment_start..].starts_with(LEFT_COMMENT) {
            return self.lex_comment(start, comment_start);
        }

        self.push(TokenKind::LeftDelim, start, self.pos);
        self.paren_depth = 0;

        loop {
            let rest = &self.input[self.pos..];
            if let Some((len, trim)) = right_delim_at(rest) {
                if self.paren_depth > 0 {
                    return Err(self.error(ParseErrorKind::UnclosedParen, self.pos, self.pos + len));
                }
                self.push(TokenKind::RightDelim, self.pos, self.pos + len);
                self.pos += len;
                self.trim_next = trim;
                return Ok(());
            }

            let Some(c) = rest.chars().next() else {
                return Err(self.error(ParseErrorKind::UnclosedAction, start, self.input.len()));
            };
            let next = rest[c.len_utf8()..].chars().next();

            match c {
                c if is_space(c) => self.pos += 1,
                '|' => self.single(TokenKind::Pipe),
                ',' => self.single(TokenKind::Comma),
                '=' => self.single(TokenKind::Assign),
                ':' => {
                    if next != Some('=') {
                        return Err(self.error(ParseErrorKind::ExpectedDeclare, self.pos, self.pos + 1));
                    }
                    self.push(TokenKind::Declare, self.pos, self.pos + 2);
                    self.pos += 2;
                }
                '(' => {
                    self.paren_depth += 1;
                    self.single(TokenKind::LeftParen);
                }
                ')' => {
                    if self.paren_depth == 0 {
                        return Err(self.error(
                            ParseErrorKind::UnexpectedRightParen,
                            self.pos,
                            self.pos + 1,
                        ));
                    }
                    self.paren_depth -= 1;
                    self.single(TokenKind::RightParen);
                }
                '"' => self.lex_quote()?,
                '`' => self.lex_raw_quote()?,
                '\'' => self.lex_char()?,
                '$' => self.lex_variable(),
                '.' => match next {
                    Some(n) if n.is_ascii_digit() => self.lex_number()?,
                    Some(n) if is_ident_start(n) => self.lex_field(),
                    _ => self.single(TokenKind::Dot),
                },
                '0'..='9' => self.lex_number()?,
                '+' | '-' if next.is_some_and(|n| n.is_ascii_digit() || n == '.') => {
                    self.lex_number()?
                }
                c if is_ident_start(c) => self.lex_identifier(),
                other => {
                    return Err(self.error(
                        ParseErrorKind::UnexpectedChar(other),
                        self.pos,
                        self.pos + other.len_utf8(),
                    ));
                }
            }
        }
    }

    fn lex_comment(&mut self, start: usize, comment_start: usize) -> Result<(), ParseError> {
        let body_start = comment_start + LEFT_COMMENT.len();
        let Some(offset) = self.input[body_start..].find(RIGHT_COMMENT) else {
            return Err(self.error(ParseErrorKind::UnclosedComment, start, self.input.len()));
        };
        let comment_end = body_start + offset + RIGHT_COMMENT.len();
        let Some((len, trim)) = right_delim_at(&self.input[comment_end..]) else {
            return Err(self.error(ParseErrorKind::CommentNotClosed, comment_start, comment_end));
        };

        let text = self.input[comment_start..comment_end].to_string();
        self.push(TokenKind::Comment(text), start, comment_end + len);
        self.pos = comment_end + len;
        self.trim_next = trim;
        Ok(())
    }

    fn single(&mut self, kind: TokenKind) {
        self.push(kind, self.pos, self.pos + 1);
        self.pos += 1;
    }

    /// Length in bytes of the identifier run starting at `from`.
    fn ident_len(&self, from: usize) -> usize {
        self.input[from..]
            .char_indices()
            .find(|&(_, c)| !is_ident_continue(c))
            .map(|(i, _)| i)
            .unwrap_or(self.input.len() - from)
    }

    fn lex_field(&mut self) {
        let start = self.pos;
        let len = self.ident_len(start + 1);
        let name = self.input[start + 1..start + 1 + len].to_string();
        self.push(TokenKind::Field(name), start, start + 1 + len);
        self.pos = start + 1 + len;
    }

    fn lex_variable(&mut self) {
        let start = self.pos;
        let len = self.ident_len(start + 1);
        let name = self.input[start..start + 1 + len].to_string();
        self.push(TokenKind::Variable(name), start, start + 1 + len);
        self.pos = start + 1 + len;
    }

    fn lex_identifier(&mut self) {
        let start = self.pos;
        let len = self.ident_len(start);
        let word = &self.input[start..start + len];
        let kind = match word {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            "nil" => TokenKind::Nil,
            _ => match Keyword::from_ident(word) {
                Some(keyword) => TokenKind::Keyword(keyword),
                None => TokenKind::Identifier(word.to_string()),
            },
        };
        self.push(kind, start, start + len);
        self.pos = start + len;
    }

    fn lex_number(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let mut end = start;
        let mut prev = '\0';
        for (i, c) in self.input[start..].char_indices() {
            let sign = c == '+' || c == '-';
            let accepted = if i == 0 {
                sign || c == '.' || c.is_ascii_digit()
            } else {
                c.is_alphanumeric()
                    || c == '.'
                    || c == '_'
                    || (sign && matches!(prev, 'e' | 'E' | 'p' | 'P'))
            };
            if !accepted {
                break;
            }
            prev = c;
            end = start + i + c.len_utf8();
        }

        let text = &self.input[start..end];
        let digits = text.trim_start_matches(['+', '-']);
        let well_formed = digits
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
            && digits.chars().all(|c| {
                c.is_ascii_hexdigit()
                    || matches!(c, '.' | '_' | '+' | '-' | 'x' | 'X' | 'o' | 'O' | 'p' | 'P' | 'i')
            });
        if !well_formed {
            return Err(self.error(ParseErrorKind::BadNumber(text.to_string()), start, end));
        }

        self.push(TokenKind::Number(text.to_string()), start, end);
        self.pos = end;
        Ok(())
    }

    /// Scan a quoted literal closed by `quote`; returns the end offset (past the quote).
    fn scan_quoted(&self, quote: char, unterminated: ParseErrorKind) -> Result<usize, ParseError> {
        let start = self.pos;
        let mut chars = self.input[start + 1..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, '\n')) | None => break,
                    Some(_) => {}
                },
                '\n' => break,
                c if c == quote => return Ok(start + 1 + i + 1),
                _ => {}
            }
        }
        Err(self.error(unterminated, start, self.input.len().min(start + 1)))
    }

    fn lex_quote(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let end = self.scan_quoted('"', ParseErrorKind::UnterminatedString)?;
        let quoted = &self.input[start..end];
        let text = unquote(&quoted[1..quoted.len() - 1])
            .map_err(|kind| self.error(kind, start, end))?;
        self.push(
            TokenKind::String {
                quoted: quoted.to_string(),
                text,
            },
            start,
            end,
        );
        self.pos = end;
        Ok(())
    }

    fn lex_raw_quote(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let Some(offset) = self.input[start + 1..].find('`') else {
            return Err(self.error(ParseErrorKind::UnterminatedRawString, start, start + 1));
        };
        let end = start + 1 + offset + 1;
        let quoted = &self.input[start..end];
        self.push(
            TokenKind::String {
                quoted: quoted.to_string(),
                text: quoted[1..quoted.len() - 1].to_string(),
            },
            start,
            end,
        );
        self.pos = end;
        Ok(())
    }

    fn lex_char(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let end = self.scan_quoted('\'', ParseErrorKind::UnterminatedChar)?;
        let text = &self.input[start..end];
        self.push(TokenKind::Char(text.to_string()), start, end);
        self.pos = end;
        Ok(())
    }
}

/// Resolve the escape sequences of a double-quoted literal body.
fn unquote(body: &str) -> Result<String, ParseErrorKind> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            return Err(ParseErrorKind::BadEscape("\\".to_string()));
        };
        let resolved = match esc {
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0b}',
            '\\' | '"' | '\'' => esc,
            'x' | 'u' | 'U' => {
                let width = match esc {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.by_ref().take(width).collect();
                u32::from_str_radix(&digits, 16)
                    .ok()
                    .filter(|_| digits.len() == width)
                    .and_then(char::from_u32)
                    .ok_or_else(|| ParseErrorKind::BadEscape(format!("\\{esc}{digits}")))?
            }
            '0'..='7' => {
                let rest: String = chars.by_ref().take(2).collect();
                let digits = format!("{esc}{rest}");
                u32::from_str_radix(&digits, 8)
                    .ok()
                    .filter(|_| digits.len() == 3)
                    .and_then(char::from_u32)
                    .ok_or_else(|| ParseErrorKind::BadEscape(format!("\\{digits}")))?
            }
            other => return Err(ParseErrorKind::BadEscape(format!("\\{other}"))),
        };
        out.push(resolved);
    }
    Ok(out)
}
