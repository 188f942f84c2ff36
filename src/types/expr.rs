use std::fmt;
use std::fmt::Write as _;
use std::ops::Not;

use super::solver::SolverOrder;
use super::tag_index::TagIndex;

/// The scope of a single DSL literal: match `name`, optionally only when
/// the tag was recorded against a field path starting with `field_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagReference {
    pub name: String,
    pub field_path: Option<String>,
}

impl TagReference {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_path: None,
        }
    }

    #[must_use]
    pub fn scoped(name: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_path: Some(field_path.into()),
        }
    }

    /// True when the tag is present in the index and, if this reference is
    /// scoped, some recorded field path starts with the scope.
    ///
    /// A tag absent from the index is "not matched", never an error; callers
    /// may supply partial indices.
    #[must_use]
    pub fn matches(&self, index: &TagIndex) -> bool {
        match index.field_paths(&self.name) {
            None => false,
            Some(paths) => match &self.field_path {
                None => true,
                Some(scope) => paths.iter().any(|p| p.starts_with(scope.as_str())),
            },
        }
    }
}

impl fmt::Display for TagReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field_path {
            Some(path) => write!(f, "\"{}:{}\"", self.name, path),
            None => write!(f, "\"{}\"", self.name),
        }
    }
}

/// Expression AST for the tag DSL. A node is a literal condition (`Unit`)
/// or a connective over one or two sub-expressions.
///
/// Trees are immutable after parsing and safe to evaluate concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Unit(TagReference),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// Evaluate recursively against a tag index. Both operands of a binary
    /// node are always evaluated; lookups are cheap map reads and the result
    /// is deterministic, so there is nothing to gain from short-circuiting.
    #[must_use]
    pub fn solve(&self, index: &TagIndex) -> bool {
        match self {
            Expr::Unit(reference) => reference.matches(index),
            Expr::And(a, b) => {
                let lval = a.solve(index);
                let rval = b.solve(index);
                lval && rval
            }
            Expr::Or(a, b) => {
                let lval = a.solve(index);
                let rval = b.solve(index);
                lval || rval
            }
            Expr::Not(inner) => !inner.solve(index),
        }
    }

    /// Linearize this tree in preorder for repeated cached evaluation.
    /// See [`SolverOrder`].
    #[must_use]
    pub fn solver_order(&self) -> SolverOrder {
        SolverOrder::from_expr(self)
    }

    /// Visit every tag literal in the tree.
    pub fn for_each_reference(&self, f: &mut impl FnMut(&TagReference)) {
        match self {
            Expr::Unit(reference) => f(reference),
            Expr::And(a, b) | Expr::Or(a, b) => {
                a.for_each_reference(f);
                b.for_each_reference(f);
            }
            Expr::Not(inner) => inner.for_each_reference(f),
        }
    }

    /// Render the tree as indented lines, one node per line. Diagnostic
    /// output only, not a protocol.
    ///
    /// ```text
    /// OR
    ///     AND
    ///         a
    ///         b
    ///     c
    /// ```
    #[must_use]
    pub fn pretty_format(&self) -> String {
        let mut out = String::new();
        self.pretty_into(0, &mut out);
        out
    }

    fn pretty_into(&self, level: usize, out: &mut String) {
        for _ in 0..level {
            out.push_str("    ");
        }
        match self {
            Expr::Unit(reference) => {
                match &reference.field_path {
                    Some(path) => {
                        let _ = write!(out, "{}[{}]", reference.name, path);
                    }
                    None => out.push_str(&reference.name),
                }
                out.push('\n');
            }
            Expr::And(a, b) => {
                out.push_str("AND\n");
                a.pretty_into(level + 1, out);
                b.pretty_into(level + 1, out);
            }
            Expr::Or(a, b) => {
                out.push_str("OR\n");
                a.pretty_into(level + 1, out);
                b.pretty_into(level + 1, out);
            }
            Expr::Not(inner) => {
                out.push_str("NOT\n");
                inner.pretty_into(level + 1, out);
            }
        }
    }

    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(other))
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

impl From<TagReference> for Expr {
    fn from(reference: TagReference) -> Self {
        Expr::Unit(reference)
    }
}

/// Leaf expression matching a bare tag.
#[must_use]
pub fn tag(name: &str) -> Expr {
    Expr::Unit(TagReference::new(name))
}

/// Leaf expression matching a tag scoped to a field-path prefix.
#[must_use]
pub fn scoped_tag(name: &str, field_path: &str) -> Expr {
    Expr::Unit(TagReference::scoped(name, field_path))
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Unit(reference) => write!(f, "{reference}"),
            Expr::And(a, b) => write!(f, "({a} and {b})"),
            Expr::Or(a, b) => write!(f, "({a} or {b})"),
            Expr::Not(inner) => write!(f, "(not {inner})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_matches_unscoped() {
        let index = TagIndex::new().with_tag("a", &["field1"]);
        assert!(TagReference::new("a").matches(&index));
        assert!(!TagReference::new("b").matches(&index));
    }

    #[test]
    fn reference_matches_scope_prefix() {
        let index = TagIndex::new().with_tag("tag", &["field1.sub.deeper"]);
        assert!(TagReference::scoped("tag", "field1.sub").matches(&index));
        assert!(!TagReference::scoped("tag", "field2").matches(&index));
    }

    #[test]
    fn reference_scope_against_pathless_tag() {
        // Text tagging records tags with no field paths; a scoped literal
        // cannot match them but a bare one can.
        let index = TagIndex::new().with_tag("a", &[]);
        assert!(TagReference::new("a").matches(&index));
        assert!(!TagReference::scoped("a", "field").matches(&index));
    }

    #[test]
    fn solve_and_or_not() {
        let index = TagIndex::new().with_tag("a", &[]).with_tag("c", &[]);

        assert!(tag("a").and(tag("c")).solve(&index));
        assert!(!tag("a").and(tag("b")).solve(&index));
        assert!(tag("a").and(tag("b").or(tag("c"))).solve(&index));
        assert!(!tag("a").not().solve(&index));
        assert!(tag("b").not().solve(&index));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let expr = tag("a").and(tag("b").or(scoped_tag("c", "sub.field")).not());
        assert_eq!(
            expr.to_string(),
            r#"("a" and (not ("b" or "c:sub.field")))"#
        );
        let reparsed = crate::parse(&expr.to_string()).unwrap();
        assert_eq!(reparsed, expr);
    }

    #[test]
    fn pretty_format_shape() {
        let expr = tag("a").and(tag("b")).or(scoped_tag("c", "f.g"));
        assert_eq!(
            expr.pretty_format(),
            "OR\n    AND\n        a\n        b\n    c[f.g]\n"
        );
    }

    #[test]
    fn pretty_format_is_stable() {
        let expr = tag("a").and(tag("b")).not();
        assert_eq!(expr.pretty_format(), expr.pretty_format());
    }

    #[test]
    fn for_each_reference_visits_all_leaves() {
        let expr = tag("a").and(scoped_tag("b", "x").or(tag("a")).not());
        let mut seen = Vec::new();
        expr.for_each_reference(&mut |r| seen.push(r.name.clone()));
        assert_eq!(seen, vec!["a", "b", "a"]);
    }
}
