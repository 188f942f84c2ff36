use tagsift::{KeywordExtractor, Tagger, Value};

fn main() {
    // Configure extractors and rules
    let mut tagger = Tagger::builder()
        .string_extractor(
            KeywordExtractor::new(
                [
                    ("urgency", &["urgent", "asap"][..]),
                    ("outage", &["server down", "offline"][..]),
                ],
                true,
            )
            .expect("failed to build keyword extractor"),
        )
        .build()
        .expect("failed to build tagger");

    tagger
        .add_rule("incident", &[r#""urgency" and "outage""#])
        .expect("failed to compile rule");
    tagger
        .add_rule("title_flag", &[r#""urgency:Title""#])
        .expect("failed to compile rule");

    // Tag and evaluate a structured document
    let document = Value::record([
        ("Title", Value::from("URGENT: eu-west is down")),
        (
            "Body",
            Value::record([("Text", Value::from("the server down alarm fired, fix asap"))]),
        ),
    ]);

    let matched = tagger
        .process_value(&document, &[], &[])
        .expect("processing failed");

    for (rule, expressions) in &matched {
        println!("{rule} matched via {expressions:?}");
    }
    if matched.is_empty() {
        println!("No rule matched.");
    }
}
