use std::fmt;

use winnow::combinator::alt;
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{any, take_while};

use super::error::ParseError;
use super::ParserOptions;

/// One lexical token of the tag DSL.
///
/// A quoted literal `"name:dotted.path"` produces `Tag("name")` followed by
/// `FieldPath("dotted.path")`; the scanner buffers the field-path half and
/// hands it out on the next scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    And,
    Or,
    Not,
    OpenParen,
    CloseParen,
    Tag(String),
    FieldPath(String),
    Whitespace,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Not => write!(f, "NOT"),
            Token::OpenParen => write!(f, "'('"),
            Token::CloseParen => write!(f, "')'"),
            Token::Tag(name) => write!(f, "tag `{name}`"),
            Token::FieldPath(path) => write!(f, "field path `{path}`"),
            Token::Whitespace => write!(f, "whitespace"),
            Token::Eof => write!(f, "end of expression"),
        }
    }
}

// -- Lexical rules (winnow combinators) -------------------------------------

#[derive(Clone)]
enum RawToken<'i> {
    Whitespace,
    Open,
    Close,
    Quoted(String),
    Word(&'i str),
}

fn whitespace<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., char::is_whitespace).parse_next(input)
}

fn word<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)
}

fn quoted(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn raw_token<'i>(input: &mut &'i str) -> ModalResult<RawToken<'i>> {
    alt((
        whitespace.value(RawToken::Whitespace),
        '('.value(RawToken::Open),
        ')'.value(RawToken::Close),
        quoted.map(RawToken::Quoted),
        word.map(RawToken::Word),
    ))
    .parse_next(input)
}

/// Lazy tokenizer over one DSL input string.
///
/// Finite: once the input is exhausted every further scan yields
/// [`Token::Eof`].
pub(crate) struct Scanner<'i> {
    input: &'i str,
    options: ParserOptions,
    /// Field-path half of a quoted literal, pending after its tag half.
    pending: Option<Token>,
}

impl<'i> Scanner<'i> {
    pub(crate) fn new(input: &'i str, options: ParserOptions) -> Self {
        Self {
            input,
            options,
            pending: None,
        }
    }

    /// Produce the next token.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] on malformed input: an unterminated quoted
    /// literal, a bareword that is not a keyword, or a stray character.
    pub(crate) fn scan(&mut self) -> Result<Token, ParseError> {
        if let Some(token) = self.pending.take() {
            return Ok(token);
        }
        if self.input.is_empty() {
            return Ok(Token::Eof);
        }

        let mut rest = self.input;
        match raw_token(&mut rest) {
            Ok(raw) => {
                self.input = rest;
                self.convert(raw)
            }
            Err(_) => Err(self.lex_error()),
        }
    }

    fn convert(&mut self, raw: RawToken<'_>) -> Result<Token, ParseError> {
        match raw {
            RawToken::Whitespace => Ok(Token::Whitespace),
            RawToken::Open => Ok(Token::OpenParen),
            RawToken::Close => Ok(Token::CloseParen),
            RawToken::Quoted(content) => {
                // Content after the first ':' is a field-path scope.
                match content.split_once(':') {
                    Some((tag, path)) => {
                        self.pending = Some(Token::FieldPath(path.to_owned()));
                        Ok(Token::Tag(tag.to_owned()))
                    }
                    None => Ok(Token::Tag(content)),
                }
            }
            RawToken::Word(word) => self.keyword(word),
        }
    }

    fn keyword(&self, word: &str) -> Result<Token, ParseError> {
        let token = if self.options.case_insensitive_keywords {
            match word.to_ascii_lowercase().as_str() {
                "and" => Some(Token::And),
                "or" => Some(Token::Or),
                "not" => Some(Token::Not),
                _ => None,
            }
        } else {
            match word {
                "and" => Some(Token::And),
                "or" => Some(Token::Or),
                "not" => Some(Token::Not),
                _ => None,
            }
        };
        token.ok_or_else(|| ParseError::UnknownKeyword {
            word: word.to_owned(),
        })
    }

    fn lex_error(&self) -> ParseError {
        if self.input.starts_with('"') {
            ParseError::UnterminatedLiteral {
                fragment: self.input.to_owned(),
            }
        } else {
            ParseError::UnexpectedCharacter {
                ch: self.input.chars().next().unwrap_or('\0'),
            }
        }
    }
}
