mod engine;
mod error;
mod extract;
mod parse;
mod types;

pub use engine::{Tagger, TaggerBuilder};
pub use error::TagsiftError;
pub use extract::{
    Extraction, ExtractorError, FloatExtractor, FloatRangeExtractor, IntExtractor,
    IntRangeExtractor, KeywordExtractor, RegexExtractor, StringExtractor,
};
pub use parse::{parse, parse_with, ParseError, ParserOptions};
pub use types::{
    scoped_tag, tag, EvalError, Expr, ExtractorInfo, FieldInfo, RunData, SolverOrder, TagIndex,
    TagReference, Value,
};
