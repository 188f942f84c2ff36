use crate::types::{Expr, TagReference};

use super::error::ParseError;
use super::scanner::{Scanner, Token};
use super::ParserOptions;

/// Binary connective pending on a partially built node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingOp {
    None,
    And,
    Or,
}

impl PendingOp {
    fn name(self) -> &'static str {
        match self {
            PendingOp::None => "UNSET",
            PendingOp::And => "AND",
            PendingOp::Or => "OR",
        }
    }
}

impl Default for PendingOp {
    fn default() -> Self {
        PendingOp::None
    }
}

/// Partially built expression node. Completed children are real [`Expr`]
/// values; the public tree cannot represent a missing operand, so the
/// half-built state lives only here.
#[derive(Debug, Default)]
struct Partial {
    op: PendingOp,
    left: Option<Expr>,
    right: Option<Expr>,
}

impl Partial {
    fn new() -> Self {
        Self::default()
    }

    /// A bare literal or parenthesized group fills the left slot if empty,
    /// else the right slot.
    fn attach(&mut self, expr: Expr) {
        if self.left.is_none() {
            self.left = Some(expr);
        } else {
            self.right = Some(expr);
        }
    }

    /// Close out the node at ')' or end of input.
    fn finalize(self) -> Result<Expr, ParseError> {
        match (self.op, self.left, self.right) {
            (PendingOp::None, Some(left), _) => Ok(left),
            (PendingOp::None, None, Some(right)) => Ok(right),
            (PendingOp::None, None, None) => Err(ParseError::EmptyExpression),
            (PendingOp::And, Some(left), Some(right)) => {
                Ok(Expr::And(Box::new(left), Box::new(right)))
            }
            (PendingOp::Or, Some(left), Some(right)) => {
                Ok(Expr::Or(Box::new(left), Box::new(right)))
            }
            (other, _, _) => Err(ParseError::IncompleteExpression {
                operator: other.name(),
            }),
        }
    }
}

/// Recursive-descent parser over the token stream, with one-token pushback.
pub(crate) struct Parser<'i> {
    scanner: Scanner<'i>,
    buffered: Option<Token>,
    par_depth: i32,
}

impl<'i> Parser<'i> {
    pub(crate) fn new(input: &'i str, options: ParserOptions) -> Self {
        Self {
            scanner: Scanner::new(input, options),
            buffered: None,
            par_depth: 0,
        }
    }

    pub(crate) fn parse(&mut self) -> Result<Expr, ParseError> {
        self.parse_expr()
    }

    /// One production, re-entered recursively for parenthesized groups.
    ///
    /// AND and OR share a single precedence level: each additional binary
    /// operator nests the expression built so far as its left child, so an
    /// unparenthesized chain evaluates strictly left to right. NOT binds to
    /// exactly the next literal or group.
    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut partial = Partial::new();
        loop {
            let token = self.scan_skip_whitespace()?;
            match token {
                Token::OpenParen => {
                    let group = self.parse_group()?;
                    partial.attach(group);
                }
                Token::Tag(_) => {
                    self.unscan(token);
                    let literal = self.parse_literal()?;
                    partial.attach(Expr::Unit(literal));
                }
                Token::And => self.handle_binary(&mut partial, PendingOp::And)?,
                Token::Or => self.handle_binary(&mut partial, PendingOp::Or)?,
                Token::Not => {
                    let operand = self.parse_not_operand()?;
                    partial.attach(Expr::Not(Box::new(operand)));
                }
                Token::CloseParen => {
                    self.par_depth -= 1;
                    if self.par_depth < 0 {
                        return Err(ParseError::ExtraCloseParen {
                            extra: (-self.par_depth) as usize,
                        });
                    }
                    return partial.finalize();
                }
                Token::Eof => return partial.finalize(),
                Token::FieldPath(_) | Token::Whitespace => {
                    return Err(ParseError::UnexpectedToken {
                        token: token.to_string(),
                    })
                }
            }
        }
    }

    /// Fold a binary operator into the node under construction.
    ///
    /// No left operand yet is a syntax error. With only a left operand the
    /// current node is promoted to the operator. With both slots occupied a
    /// new node takes the finished one as its left child.
    fn handle_binary(&mut self, partial: &mut Partial, op: PendingOp) -> Result<(), ParseError> {
        if partial.left.is_none() {
            return Err(ParseError::MissingLeftOperand {
                operator: op.name(),
            });
        }
        if partial.right.is_none() {
            partial.op = op;
            return Ok(());
        }

        let left = std::mem::take(partial).finalize()?;
        *partial = Partial {
            op,
            left: Some(left),
            right: None,
        };

        // A parenthesized group directly after the operator becomes its
        // right operand now; anything else is handled by the main loop.
        let next = self.scan_skip_whitespace()?;
        if next == Token::OpenParen {
            let group = self.parse_group()?;
            partial.right = Some(group);
        } else {
            self.unscan(next);
        }
        Ok(())
    }

    fn parse_not_operand(&mut self) -> Result<Expr, ParseError> {
        let token = self.scan_skip_whitespace()?;
        match token {
            Token::Tag(_) => {
                self.unscan(token);
                Ok(Expr::Unit(self.parse_literal()?))
            }
            Token::OpenParen => self.parse_group(),
            other => Err(ParseError::InvalidNotOperand {
                token: other.to_string(),
            }),
        }
    }

    /// Parse the expression inside parentheses. The recursive call returns
    /// after consuming the matching ')'; if the depth did not come back to
    /// this level the input ran out first.
    fn parse_group(&mut self) -> Result<Expr, ParseError> {
        let level = self.par_depth;
        self.par_depth += 1;
        let expr = self.parse_expr()?;
        if self.par_depth != level {
            return Err(ParseError::UnclosedParen);
        }
        Ok(expr)
    }

    /// Consume the tag/field-path tokens of one literal into a
    /// [`TagReference`]. Repeated tags or field paths are syntax errors.
    fn parse_literal(&mut self) -> Result<TagReference, ParseError> {
        let mut tag: Option<String> = None;
        let mut field_path: Option<String> = None;
        loop {
            let token = self.scan_skip_whitespace()?;
            match token {
                Token::Tag(name) => {
                    if let Some(existing) = tag {
                        return Err(ParseError::ConflictingTag {
                            found: name,
                            existing,
                        });
                    }
                    tag = Some(name);
                }
                Token::FieldPath(path) => {
                    if let Some(existing) = field_path {
                        return Err(ParseError::ConflictingFieldPath {
                            found: path,
                            existing,
                        });
                    }
                    field_path = Some(path);
                }
                other => {
                    self.unscan(other);
                    break;
                }
            }
        }

        // parse_literal is only entered on a Tag token.
        let name = tag.ok_or(ParseError::EmptyExpression)?;
        Ok(TagReference { name, field_path })
    }

    fn scan(&mut self) -> Result<Token, ParseError> {
        match self.buffered.take() {
            Some(token) => Ok(token),
            None => self.scanner.scan(),
        }
    }

    fn unscan(&mut self, token: Token) {
        self.buffered = Some(token);
    }

    fn scan_skip_whitespace(&mut self) -> Result<Token, ParseError> {
        loop {
            let token = self.scan()?;
            if token != Token::Whitespace {
                return Ok(token);
            }
        }
    }
}
