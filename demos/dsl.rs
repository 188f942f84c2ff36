use tagsift::{parse, TagIndex};

fn main() {
    let expr = parse(r#""urgency" and ("outage:Body" or not "resolved")"#)
        .expect("failed to parse expression");

    println!("{expr}");
    println!("{}", expr.pretty_format());

    let index = TagIndex::new()
        .with_tag("urgency", &["Title"])
        .with_tag("outage", &["Body.Text"]);

    println!("matches: {}", expr.solve(&index));

    // The linearized form gives the same answer and is what the engine
    // caches per rule.
    let order = expr.solver_order();
    println!("ordered: {}", order.solve(&index).expect("inconsistent order"));
}
