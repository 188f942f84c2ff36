use std::collections::BTreeMap;

use super::field_info::FieldInfo;

/// Evidence map consumed by rule evaluation: tag name to the field paths
/// where the tag was observed.
///
/// Derived from a traversal's [`FieldInfo`] list, or built directly when
/// tagging raw text (every tag maps to no field paths). An index may be
/// partial; tags absent from it evaluate as unmatched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    fields_by_tag: BTreeMap<String, Vec<String>>,
}

impl TagIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tag occurrence at the given field path.
    pub fn insert(&mut self, tag: impl Into<String>, field_path: impl Into<String>) {
        self.fields_by_tag
            .entry(tag.into())
            .or_default()
            .push(field_path.into());
    }

    /// Record a tag with no associated field path (raw text tagging).
    pub fn insert_pathless(&mut self, tag: impl Into<String>) {
        self.fields_by_tag.entry(tag.into()).or_default();
    }

    /// Builder-style variant of [`insert`](Self::insert) for tests and
    /// hand-assembled indices.
    #[must_use]
    pub fn with_tag(mut self, tag: &str, field_paths: &[&str]) -> Self {
        let entry = self.fields_by_tag.entry(tag.to_owned()).or_default();
        entry.extend(field_paths.iter().map(|p| (*p).to_owned()));
        self
    }

    #[must_use]
    pub fn contains_tag(&self, tag: &str) -> bool {
        self.fields_by_tag.contains_key(tag)
    }

    /// The field paths recorded for a tag, or `None` if the tag was never
    /// observed. An empty slice means the tag was observed without paths.
    #[must_use]
    pub fn field_paths(&self, tag: &str) -> Option<&[String]> {
        self.fields_by_tag.get(tag).map(Vec::as_slice)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields_by_tag.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields_by_tag.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields_by_tag
            .iter()
            .map(|(tag, paths)| (tag.as_str(), paths.as_slice()))
    }
}

impl From<&[FieldInfo]> for TagIndex {
    /// Invert a traversal result into tag-to-fields form: every tag reported
    /// by any extractor maps to the list of field paths where it occurred.
    fn from(fields: &[FieldInfo]) -> Self {
        let mut index = TagIndex::new();
        for field in fields {
            for info in field.extractors.values() {
                for tag in &info.tags {
                    index.insert(tag.clone(), field.name.clone());
                }
            }
        }
        index
    }
}

impl FromIterator<(String, Vec<String>)> for TagIndex {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut index = TagIndex::new();
        for (tag, paths) in iter {
            let entry = index.fields_by_tag.entry(tag).or_default();
            entry.extend(paths);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup() {
        let mut index = TagIndex::new();
        index.insert("a", "f1");
        index.insert("a", "f2");
        index.insert("b", "f1");

        assert_eq!(
            index.field_paths("a"),
            Some(&["f1".to_owned(), "f2".to_owned()][..])
        );
        assert!(index.contains_tag("b"));
        assert_eq!(index.field_paths("missing"), None);
    }

    #[test]
    fn pathless_tag_is_present_with_no_paths() {
        let mut index = TagIndex::new();
        index.insert_pathless("a");
        assert!(index.contains_tag("a"));
        assert_eq!(index.field_paths("a"), Some(&[][..]));
    }

    #[test]
    fn from_fields_info_inverts_per_tag() {
        let fields = vec![
            FieldInfo::with_tags("StrField", "words", &["strTag"]),
            FieldInfo::with_tags("StrArray.index(0)", "words", &["strTag"]),
            FieldInfo::with_tags("Obj.Field1", "ints", &["intTag"]),
        ];
        let index = TagIndex::from(fields.as_slice());

        assert_eq!(
            index.field_paths("strTag"),
            Some(&["StrField".to_owned(), "StrArray.index(0)".to_owned()][..])
        );
        assert_eq!(
            index.field_paths("intTag"),
            Some(&["Obj.Field1".to_owned()][..])
        );
    }

    #[test]
    fn fields_with_no_extractor_output_contribute_nothing() {
        let field = FieldInfo {
            name: "empty".to_owned(),
            extractors: std::collections::BTreeMap::new(),
        };
        let index = TagIndex::from(std::slice::from_ref(&field));
        assert!(index.is_empty());
    }
}
