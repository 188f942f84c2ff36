use thiserror::Error;

use crate::extract::ExtractorError;
use crate::parse::ParseError;
use crate::types::EvalError;

/// Any failure the tagging engine can surface.
#[derive(Debug, Error)]
pub enum TagsiftError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("extractor '{name}' failed")]
    Extractor {
        name: String,
        #[source]
        source: ExtractorError,
    },

    #[cfg(feature = "json")]
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
