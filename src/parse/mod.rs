mod error;
mod parser;
mod scanner;

pub use error::ParseError;

use crate::types::Expr;

/// Keyword handling for the tokenizer. The canonical connectives are
/// lowercase `and` / `or` / `not`; the case-insensitive mode also accepts
/// `AND`, `Not`, and any other casing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    pub case_insensitive_keywords: bool,
}

/// Parse one DSL expression into an [`Expr`] tree.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid expression.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    parse_with(input, ParserOptions::default())
}

/// [`parse`] with explicit [`ParserOptions`].
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid expression.
pub fn parse_with(input: &str, options: ParserOptions) -> Result<Expr, ParseError> {
    parser::Parser::new(input, options).parse()
}
