use proptest::prelude::*;
use tagsift::{scoped_tag, tag, Expr, TagIndex};

const TAG_NAMES: [&str; 4] = ["a", "b", "c", "d"];
const FIELD_PATHS: [&str; 3] = ["x", "x.y", "z"];

/// Generate a leaf over a small alphabet to force collisions between the
/// expression and the index.
fn arb_leaf() -> impl Strategy<Value = Expr> {
    prop_oneof![
        prop::sample::select(&TAG_NAMES[..]).prop_map(tag),
        (
            prop::sample::select(&TAG_NAMES[..]),
            prop::sample::select(&FIELD_PATHS[..])
        )
            .prop_map(|(name, path)| scoped_tag(name, path)),
    ]
}

fn arb_expr() -> impl Strategy<Value = Expr> {
    arb_leaf().prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.and(b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.or(b)),
            inner.prop_map(|a| !a),
        ]
    })
}

/// Generate an index recording a random subset of the tag alphabet at
/// random field paths.
fn arb_index() -> impl Strategy<Value = TagIndex> {
    prop::collection::vec(
        (
            prop::sample::select(&TAG_NAMES[..]),
            prop::collection::vec(prop::sample::select(&FIELD_PATHS[..]), 0..3),
        ),
        0..6,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(tag, paths)| {
                (
                    tag.to_owned(),
                    paths.into_iter().map(str::to_owned).collect::<Vec<_>>(),
                )
            })
            .collect::<TagIndex>()
    })
}

proptest! {
    /// The linearized order and the recursive walk agree on every tree and
    /// every index.
    #[test]
    fn solver_order_matches_recursive_solve(expr in arb_expr(), index in arb_index()) {
        let order = expr.solver_order();
        prop_assert_eq!(order.solve(&index).unwrap(), expr.solve(&index));
    }

    /// One compiled order reused across many indices keeps agreeing with
    /// the recursive walk; evaluation leaves no state behind.
    #[test]
    fn solver_order_is_reusable(expr in arb_expr(), indices in prop::collection::vec(arb_index(), 1..5)) {
        let order = expr.solver_order();
        for index in &indices {
            prop_assert_eq!(order.solve(index).unwrap(), expr.solve(index));
        }
        // Same result when revisited after other inputs.
        prop_assert_eq!(order.solve(&indices[0]).unwrap(), expr.solve(&indices[0]));
    }

    /// NOT(NOT(x)) == x for any evaluation.
    #[test]
    fn double_negation(expr in arb_expr(), index in arb_index()) {
        let double_neg = !!expr.clone();
        prop_assert_eq!(double_neg.solve(&index), expr.solve(&index));
        prop_assert_eq!(
            double_neg.solver_order().solve(&index).unwrap(),
            expr.solver_order().solve(&index).unwrap()
        );
    }

    /// Parsing never panics on arbitrary input.
    #[test]
    fn parse_never_panics(input in "\\PC{0,64}") {
        let _ = tagsift::parse(&input);
    }

    /// Rendered trees reparse to the same tree.
    #[test]
    fn display_round_trips(expr in arb_expr()) {
        let reparsed = tagsift::parse(&expr.to_string()).unwrap();
        prop_assert_eq!(reparsed, expr);
    }
}
