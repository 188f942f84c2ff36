use thiserror::Error;

/// Errors produced while lexing or parsing DSL input.
///
/// The language is small and inputs are short, so errors carry the
/// offending fragment rather than source positions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    // -- lexical ------------------------------------------------------------
    #[error("unterminated tag literal near `{fragment}`")]
    UnterminatedLiteral { fragment: String },

    #[error("unexpected character `{ch}`")]
    UnexpectedCharacter { ch: char },

    #[error("unknown keyword `{word}`")]
    UnknownKeyword { word: String },

    // -- structural ---------------------------------------------------------
    #[error("no left operand was found for {operator}")]
    MissingLeftOperand { operator: &'static str },

    #[error("unexpected token after NOT: {token}")]
    InvalidNotOperand { token: String },

    #[error("incomplete expression: {operator} is missing its right operand")]
    IncompleteExpression { operator: &'static str },

    #[error("empty expression")]
    EmptyExpression,

    #[error("unexpected end of expression: {extra} extra closing parenthesis(es)")]
    ExtraCloseParen { extra: usize },

    #[error("unexpected '(': expression ended before the closing parenthesis")]
    UnclosedParen,

    #[error("unexpected tag `{found}`: literal already has tag `{existing}`")]
    ConflictingTag { found: String, existing: String },

    #[error("unexpected field path `{found}`: literal already scoped to `{existing}`")]
    ConflictingFieldPath { found: String, existing: String },

    #[error("unexpected token {token}")]
    UnexpectedToken { token: String },
}
