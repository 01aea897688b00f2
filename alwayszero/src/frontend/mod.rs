//! Front end for the textual IR
//!
//! Source text is tokenized, parsed into a syntax tree and lowered into a
//! [`Model`](common::ir::Model) whose functions are already in SSA form.
//! Attributes are resolved through the session's [`AttributeRegistry`].

use crate::frontend::lexer::Span;

pub mod attributes;
pub mod lexer;
pub mod parser;

pub use {attributes::AttributeRegistry, parser::parse};

/// {line}:{column}: {message}
#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl ParseError {
    pub fn new<S: Into<String>>(span: Span, message: S) -> Self {
        Self {
            line: span.line,
            column: span.column,
            message: message.into(),
        }
    }
}
