#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod tracing_macros;

pub mod ast;
mod error;
mod lexer;
mod parser;
mod set;

pub use ast::{Arg, Branch, Command, List, Node, Pipe, Span};
pub use error::{LoadError, ParseError, ParseErrorKind};
pub use set::{Template, TemplateSet};
