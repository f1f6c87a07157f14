//! SPARQL query templates
//!
//! Templates use `{{...}}` replacement fields so that single braces remain
//! SPARQL group syntax. Processing runs in two separate phases:
//! - lexing into text and field tokens ([`lexer`])
//! - parsing each field's `name!conversion:spec` grammar ([`field`])
//!
//! The [`formatter`] then substitutes values, re-indents multi-line values
//! to the column of their field and prepends the prefix header.

pub mod field;
pub mod formatter;
pub mod lexer;

// Re-exports
pub use field::{Align, Conversion, Field, FieldName, FormatSpec};
pub use formatter::{ascii_escape, dedent, format, Arguments, QueryFormatter};
pub use lexer::{tokenize, Token};

// Error types
use hato_core::escape::EscapeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Not terminated field starting at byte {position}")]
    UnterminatedField { position: usize },

    #[error("Cannot parse field {field:?}: {reason}")]
    FieldParse { field: String, reason: String },

    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error(transparent)]
    Escape(#[from] EscapeError),

    #[error("Value could not be rendered")]
    Render,
}
