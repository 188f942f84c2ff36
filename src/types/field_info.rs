use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// Opaque extractor-defined payload attached to an extraction result.
/// Callers that know the concrete type downcast it back.
pub type RunData = Box<dyn Any + Send + Sync>;

/// What one extractor reported for one field: the tags it emitted and an
/// optional opaque payload describing the run.
pub struct ExtractorInfo {
    pub tags: Vec<String>,
    pub run_data: Option<RunData>,
}

impl ExtractorInfo {
    #[must_use]
    pub fn from_tags(tags: &[&str]) -> Self {
        Self {
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            run_data: None,
        }
    }
}

impl fmt::Debug for ExtractorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // RunData is opaque; report only its presence.
        f.debug_struct("ExtractorInfo")
            .field("tags", &self.tags)
            .field("run_data", &self.run_data.is_some())
            .finish()
    }
}

/// Extraction results for one scalar leaf visited during a traversal,
/// keyed by extractor name. The root leaf of a bare scalar has an empty
/// `name`.
#[derive(Debug, Default)]
pub struct FieldInfo {
    pub name: String,
    pub extractors: BTreeMap<String, ExtractorInfo>,
}

impl FieldInfo {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extractors: BTreeMap::new(),
        }
    }

    /// Shorthand for a field with one extractor's tags and no run data.
    #[must_use]
    pub fn with_tags(name: &str, extractor: &str, tags: &[&str]) -> Self {
        let mut field = Self::new(name);
        field
            .extractors
            .insert(extractor.to_owned(), ExtractorInfo::from_tags(tags));
        field
    }

    /// All tags reported for this field, across extractors.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.extractors
            .values()
            .flat_map(|info| info.tags.iter().map(String::as_str))
            .collect()
    }
}
