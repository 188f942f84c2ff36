use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use regex::{Regex, RegexSet};

use crate::types::RunData;

/// Failure reported by an extractor. Propagated verbatim through the
/// traversal, which aborts rather than yield partial tags.
pub type ExtractorError = Box<dyn std::error::Error + Send + Sync>;

/// Result of one extractor run on one leaf value.
pub struct Extraction {
    pub tags: Vec<String>,
    pub run_data: Option<RunData>,
}

impl Extraction {
    #[must_use]
    pub fn from_tags(tags: Vec<String>) -> Self {
        Self {
            tags,
            run_data: None,
        }
    }

    #[must_use]
    pub fn with_run_data(tags: Vec<String>, run_data: RunData) -> Self {
        Self {
            tags,
            run_data: Some(run_data),
        }
    }
}

/// Classifier for string leaves. Implementations must be safe for
/// concurrent invocation; the traversal calls `is_valid` before `extract`
/// and skips extractors that decline.
pub trait StringExtractor: Send + Sync {
    /// Aggregation key for this extractor's results.
    fn name(&self) -> &str;

    fn is_valid(&self, data: &str) -> bool;

    /// Classify one value into zero or more tags.
    ///
    /// # Errors
    ///
    /// Any error aborts the traversal that invoked it.
    fn extract(&self, data: &str) -> Result<Extraction, ExtractorError>;
}

/// Classifier for integer leaves.
pub trait IntExtractor: Send + Sync {
    fn name(&self) -> &str;

    fn is_valid(&self, data: i64) -> bool;

    /// Classify one value into zero or more tags.
    ///
    /// # Errors
    ///
    /// Any error aborts the traversal that invoked it.
    fn extract(&self, data: i64) -> Result<Extraction, ExtractorError>;
}

/// Classifier for floating-point leaves.
pub trait FloatExtractor: Send + Sync {
    fn name(&self) -> &str;

    fn is_valid(&self, data: f64) -> bool;

    /// Classify one value into zero or more tags.
    ///
    /// # Errors
    ///
    /// Any error aborts the traversal that invoked it.
    fn extract(&self, data: f64) -> Result<Extraction, ExtractorError>;
}

// -- Provided extractors ----------------------------------------------------

/// Multi-pattern keyword matcher over tagged keyword groups, backed by
/// Aho-Corasick. Emits a tag when any of its keywords occurs as a
/// substring; `run_data` is a `BTreeMap<String, Vec<String>>` of the
/// keywords that hit, per tag.
pub struct KeywordExtractor {
    automaton: AhoCorasick,
    /// Tag and keyword for each pattern, parallel to the automaton's
    /// pattern ids.
    patterns: Vec<(String, String)>,
}

impl KeywordExtractor {
    /// Build from `tag -> keywords` groups.
    ///
    /// # Errors
    ///
    /// Fails if the automaton cannot be built from the keywords.
    pub fn new<'a>(
        keywords_by_tag: impl IntoIterator<Item = (&'a str, &'a [&'a str])>,
        case_insensitive: bool,
    ) -> Result<Self, ExtractorError> {
        let mut patterns = Vec::new();
        for (tag, keywords) in keywords_by_tag {
            for keyword in keywords {
                patterns.push((tag.to_owned(), (*keyword).to_owned()));
            }
        }

        let automaton = AhoCorasickBuilder::new()
            .ascii_case_insensitive(case_insensitive)
            .match_kind(MatchKind::Standard)
            .build(patterns.iter().map(|(_, keyword)| keyword.as_str()))?;

        Ok(Self {
            automaton,
            patterns,
        })
    }
}

impl StringExtractor for KeywordExtractor {
    fn name(&self) -> &str {
        "keyword"
    }

    fn is_valid(&self, data: &str) -> bool {
        !data.is_empty()
    }

    fn extract(&self, data: &str) -> Result<Extraction, ExtractorError> {
        let mut hits: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for m in self.automaton.find_overlapping_iter(data) {
            let (tag, keyword) = &self.patterns[m.pattern().as_usize()];
            let keywords = hits.entry(tag.clone()).or_default();
            if !keywords.contains(keyword) {
                keywords.push(keyword.clone());
            }
        }

        let tags = hits.keys().cloned().collect();
        Ok(Extraction::with_run_data(tags, Box::new(hits)))
    }
}

/// Regex matcher over tagged patterns, backed by a single `RegexSet` pass.
pub struct RegexExtractor {
    set: RegexSet,
    tags: Vec<String>,
}

impl RegexExtractor {
    /// Build from `tag -> patterns` groups.
    ///
    /// # Errors
    ///
    /// Fails if any pattern is not a valid regex.
    pub fn new<'a>(
        patterns_by_tag: impl IntoIterator<Item = (&'a str, &'a [&'a str])>,
    ) -> Result<Self, ExtractorError> {
        let mut tags = Vec::new();
        let mut patterns = Vec::new();
        for (tag, exprs) in patterns_by_tag {
            for expr in exprs {
                // Validate individually for a precise error message.
                Regex::new(expr)?;
                tags.push(tag.to_owned());
                patterns.push(*expr);
            }
        }

        let set = RegexSet::new(&patterns)?;
        Ok(Self { set, tags })
    }
}

impl StringExtractor for RegexExtractor {
    fn name(&self) -> &str {
        "regex"
    }

    fn is_valid(&self, data: &str) -> bool {
        !data.is_empty()
    }

    fn extract(&self, data: &str) -> Result<Extraction, ExtractorError> {
        let mut tags: Vec<String> = Vec::new();
        for index in self.set.matches(data) {
            let tag = &self.tags[index];
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        Ok(Extraction::from_tags(tags))
    }
}

/// Tags integers that fall inside tagged inclusive ranges.
pub struct IntRangeExtractor {
    ranges: Vec<(RangeInclusive<i64>, String)>,
}

impl IntRangeExtractor {
    #[must_use]
    pub fn new<'a>(ranges: impl IntoIterator<Item = (RangeInclusive<i64>, &'a str)>) -> Self {
        Self {
            ranges: ranges
                .into_iter()
                .map(|(range, tag)| (range, tag.to_owned()))
                .collect(),
        }
    }
}

impl IntExtractor for IntRangeExtractor {
    fn name(&self) -> &str {
        "int_range"
    }

    fn is_valid(&self, _data: i64) -> bool {
        true
    }

    fn extract(&self, data: i64) -> Result<Extraction, ExtractorError> {
        let tags = self
            .ranges
            .iter()
            .filter(|(range, _)| range.contains(&data))
            .map(|(_, tag)| tag.clone())
            .collect();
        Ok(Extraction::from_tags(tags))
    }
}

/// Tags floats that fall inside tagged inclusive ranges.
pub struct FloatRangeExtractor {
    ranges: Vec<(RangeInclusive<f64>, String)>,
}

impl FloatRangeExtractor {
    #[must_use]
    pub fn new<'a>(ranges: impl IntoIterator<Item = (RangeInclusive<f64>, &'a str)>) -> Self {
        Self {
            ranges: ranges
                .into_iter()
                .map(|(range, tag)| (range, tag.to_owned()))
                .collect(),
        }
    }
}

impl FloatExtractor for FloatRangeExtractor {
    fn name(&self) -> &str {
        "float_range"
    }

    fn is_valid(&self, data: f64) -> bool {
        data.is_finite()
    }

    fn extract(&self, data: f64) -> Result<Extraction, ExtractorError> {
        let tags = self
            .ranges
            .iter()
            .filter(|(range, _)| range.contains(&data))
            .map(|(_, tag)| tag.clone())
            .collect();
        Ok(Extraction::from_tags(tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_extractor_tags_and_run_data() {
        let extractor = KeywordExtractor::new(
            [
                ("greeting", &["hello", "hi"][..]),
                ("farewell", &["bye"][..]),
            ],
            false,
        )
        .unwrap();

        let result = extractor.extract("hello there, hello and bye").unwrap();
        assert_eq!(result.tags, vec!["farewell", "greeting"]);

        let hits = result
            .run_data
            .unwrap()
            .downcast::<BTreeMap<String, Vec<String>>>()
            .unwrap();
        assert_eq!(hits["greeting"], vec!["hello"]);
        assert_eq!(hits["farewell"], vec!["bye"]);
    }

    #[test]
    fn keyword_extractor_case_insensitive() {
        let extractor = KeywordExtractor::new([("greeting", &["hello"][..])], true).unwrap();
        let result = extractor.extract("well HELLO there").unwrap();
        assert_eq!(result.tags, vec!["greeting"]);
    }

    #[test]
    fn keyword_extractor_rejects_empty_input() {
        let extractor = KeywordExtractor::new([("t", &["x"][..])], false).unwrap();
        assert!(!extractor.is_valid(""));
        assert!(extractor.is_valid("x"));
    }

    #[test]
    fn regex_extractor_matches_tagged_patterns() {
        let extractor = RegexExtractor::new([
            ("number", &[r"\d+"][..]),
            ("shout", &[r"[A-Z]{3,}"][..]),
        ])
        .unwrap();

        let result = extractor.extract("WARN code 42").unwrap();
        assert_eq!(result.tags, vec!["number", "shout"]);

        let result = extractor.extract("quiet words").unwrap();
        assert!(result.tags.is_empty());
    }

    #[test]
    fn regex_extractor_bad_pattern_fails() {
        assert!(RegexExtractor::new([("t", &["("][..])]).is_err());
    }

    #[test]
    fn int_range_extractor() {
        let extractor = IntRangeExtractor::new([(0..=17, "minor"), (18..=i64::MAX, "adult")]);
        assert_eq!(extractor.extract(12).unwrap().tags, vec!["minor"]);
        assert_eq!(extractor.extract(30).unwrap().tags, vec!["adult"]);
        assert!(extractor.extract(-1).unwrap().tags.is_empty());
    }

    #[test]
    fn float_range_extractor_rejects_non_finite() {
        let extractor = FloatRangeExtractor::new([(0.0..=1.0, "ratio")]);
        assert!(extractor.is_valid(0.5));
        assert!(!extractor.is_valid(f64::NAN));
        assert_eq!(extractor.extract(0.25).unwrap().tags, vec!["ratio"]);
    }
}
