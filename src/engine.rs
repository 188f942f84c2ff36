use std::collections::{BTreeMap, BTreeSet};

use crate::error::TagsiftError;
use crate::extract::{FloatExtractor, IntExtractor, StringExtractor};
use crate::parse::{parse_with, ParserOptions};
use crate::types::{
    EvalError, Expr, ExtractorInfo, FieldInfo, SolverOrder, TagIndex, Value,
};

/// One compiled rule expression: its source text, the parsed tree, and the
/// linearized order used for evaluation.
#[derive(Debug, Clone)]
struct RuleExpr {
    source: String,
    expr: Expr,
    order: SolverOrder,
}

impl RuleExpr {
    fn compile(source: &str, options: ParserOptions) -> Result<Self, TagsiftError> {
        let expr = parse_with(source, options)?;
        let order = expr.solver_order();
        Ok(Self {
            source: source.to_owned(),
            expr,
            order,
        })
    }
}

/// Tagging and rule-matching engine.
///
/// A `Tagger` owns a set of extractors and a set of named rules. Data flows
/// through it in two stages: a tagging stage walks a [`Value`] tree (or raw
/// text) and runs extractors over the scalar leaves, and an evaluation stage
/// checks the resulting [`TagIndex`] against every rule. The `process_*`
/// methods compose the two.
///
/// Rule expressions are compiled once, when added; evaluation never touches
/// shared mutable state, so a `Tagger` behind an `Arc` can serve many threads.
pub struct Tagger {
    string_extractors: Vec<Box<dyn StringExtractor>>,
    int_extractors: Vec<Box<dyn IntExtractor>>,
    float_extractors: Vec<Box<dyn FloatExtractor>>,
    rules: BTreeMap<String, Vec<RuleExpr>>,
    referenced_tags: BTreeSet<String>,
    referenced_scopes: BTreeSet<String>,
    options: ParserOptions,
}

impl Tagger {
    #[must_use]
    pub fn builder() -> TaggerBuilder {
        TaggerBuilder::new()
    }

    /// Register a named rule from one or more expression sources. The rule
    /// matches when any of its expressions matches.
    ///
    /// All sources are compiled before any is stored, so a failure leaves
    /// the rule set exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParseError`](crate::ParseError) among the sources.
    pub fn add_rule(&mut self, name: &str, sources: &[&str]) -> Result<(), TagsiftError> {
        let compiled = sources
            .iter()
            .map(|source| RuleExpr::compile(source, self.options))
            .collect::<Result<Vec<_>, _>>()?;

        for rule in &compiled {
            rule.expr.for_each_reference(&mut |reference| {
                self.referenced_tags.insert(reference.name.clone());
                if let Some(scope) = &reference.field_path {
                    self.referenced_scopes.insert(scope.clone());
                }
            });
        }
        self.rules.entry(name.to_owned()).or_default().extend(compiled);
        Ok(())
    }

    /// [`add_rule`](Self::add_rule) over a batch. Rules are added in order;
    /// on failure the earlier rules of the batch remain registered.
    ///
    /// # Errors
    ///
    /// Returns the first compilation failure.
    pub fn add_rules<'a>(
        &mut self,
        rules: impl IntoIterator<Item = (&'a str, &'a [&'a str])>,
    ) -> Result<(), TagsiftError> {
        for (name, sources) in rules {
            self.add_rule(name, sources)?;
        }
        Ok(())
    }

    /// Tag names referenced by at least one registered rule. Useful for
    /// deciding which extractors a deployment actually needs.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.referenced_tags.iter().map(String::as_str)
    }

    /// Field-path scopes referenced by at least one registered rule.
    pub fn field_scopes(&self) -> impl Iterator<Item = &str> {
        self.referenced_scopes.iter().map(String::as_str)
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    // -- tagging -------------------------------------------------------------

    /// Walk a value tree and run the extractors over every scalar leaf whose
    /// dotted path passes the include/exclude filters.
    ///
    /// Returns one [`FieldInfo`] per visited leaf, in traversal order,
    /// including leaves no extractor tagged. Field paths join nested keys
    /// with `.`; list elements appear as `index(i)`. `Null` and `Bool`
    /// leaves are not extractable and are skipped.
    ///
    /// An empty `include` list admits every path. `exclude` wins over
    /// `include`; both compare by path prefix.
    ///
    /// # Errors
    ///
    /// Stops at the first extractor failure.
    pub fn tag_value(
        &self,
        value: &Value,
        include: &[&str],
        exclude: &[&str],
    ) -> Result<Vec<FieldInfo>, TagsiftError> {
        let mut fields = Vec::new();
        self.walk(value, String::new(), include, exclude, &mut fields)?;
        Ok(fields)
    }

    /// Run the string extractors over one piece of raw text, outside any
    /// field structure. Results are keyed by extractor name.
    ///
    /// # Errors
    ///
    /// Stops at the first extractor failure.
    pub fn tag_text(&self, text: &str) -> Result<BTreeMap<String, ExtractorInfo>, TagsiftError> {
        let field = self.tag_string_leaf(String::new(), text)?;
        Ok(field.extractors)
    }

    /// Parse a JSON document and tag it like [`tag_value`](Self::tag_value).
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or the first extractor failure.
    #[cfg(feature = "json")]
    pub fn tag_json(
        &self,
        json: &str,
        include: &[&str],
        exclude: &[&str],
    ) -> Result<Vec<FieldInfo>, TagsiftError> {
        let value = Value::from(serde_json::from_str::<serde_json::Value>(json)?);
        self.tag_value(&value, include, exclude)
    }

    fn walk(
        &self,
        value: &Value,
        path: String,
        include: &[&str],
        exclude: &[&str],
        fields: &mut Vec<FieldInfo>,
    ) -> Result<(), TagsiftError> {
        match value {
            Value::Null | Value::Bool(_) => Ok(()),
            Value::String(text) => {
                if path_admitted(&path, include, exclude) {
                    fields.push(self.tag_string_leaf(path, text)?);
                }
                Ok(())
            }
            Value::Int(number) => {
                if path_admitted(&path, include, exclude) {
                    fields.push(self.tag_int_leaf(path, *number)?);
                }
                Ok(())
            }
            Value::Float(number) => {
                if path_admitted(&path, include, exclude) {
                    fields.push(self.tag_float_leaf(path, *number)?);
                }
                Ok(())
            }
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    let child = join_path(&path, &format!("index({i})"));
                    self.walk(item, child, include, exclude, fields)?;
                }
                Ok(())
            }
            Value::Record(entries) => {
                for (key, child_value) in entries {
                    let child = join_path(&path, key);
                    self.walk(child_value, child, include, exclude, fields)?;
                }
                Ok(())
            }
            Value::Map(entries) => {
                for (key, child_value) in entries {
                    let child = join_path(&path, key);
                    self.walk(child_value, child, include, exclude, fields)?;
                }
                Ok(())
            }
        }
    }

    fn tag_string_leaf(&self, path: String, text: &str) -> Result<FieldInfo, TagsiftError> {
        let mut field = FieldInfo::new(path);
        for extractor in &self.string_extractors {
            if !extractor.is_valid(text) {
                continue;
            }
            let extraction =
                extractor
                    .extract(text)
                    .map_err(|source| TagsiftError::Extractor {
                        name: extractor.name().to_owned(),
                        source,
                    })?;
            field.extractors.insert(
                extractor.name().to_owned(),
                ExtractorInfo {
                    tags: extraction.tags,
                    run_data: extraction.run_data,
                },
            );
        }
        Ok(field)
    }

    fn tag_int_leaf(&self, path: String, number: i64) -> Result<FieldInfo, TagsiftError> {
        let mut field = FieldInfo::new(path);
        for extractor in &self.int_extractors {
            if !extractor.is_valid(number) {
                continue;
            }
            let extraction =
                extractor
                    .extract(number)
                    .map_err(|source| TagsiftError::Extractor {
                        name: extractor.name().to_owned(),
                        source,
                    })?;
            field.extractors.insert(
                extractor.name().to_owned(),
                ExtractorInfo {
                    tags: extraction.tags,
                    run_data: extraction.run_data,
                },
            );
        }
        Ok(field)
    }

    fn tag_float_leaf(&self, path: String, number: f64) -> Result<FieldInfo, TagsiftError> {
        let mut field = FieldInfo::new(path);
        for extractor in &self.float_extractors {
            if !extractor.is_valid(number) {
                continue;
            }
            let extraction =
                extractor
                    .extract(number)
                    .map_err(|source| TagsiftError::Extractor {
                        name: extractor.name().to_owned(),
                        source,
                    })?;
            field.extractors.insert(
                extractor.name().to_owned(),
                ExtractorInfo {
                    tags: extraction.tags,
                    run_data: extraction.run_data,
                },
            );
        }
        Ok(field)
    }

    // -- evaluation ----------------------------------------------------------

    /// Check every registered rule against a tag index.
    ///
    /// Returns rule name to the source texts of its expressions that
    /// matched. Rules with no matching expression are absent from the map.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if a compiled order is internally inconsistent.
    pub fn evaluate(&self, index: &TagIndex) -> Result<BTreeMap<String, Vec<String>>, EvalError> {
        let mut matched = BTreeMap::new();
        for (name, exprs) in &self.rules {
            let mut sources = Vec::new();
            for rule in exprs {
                if rule.order.solve(index)? {
                    sources.push(rule.source.clone());
                }
            }
            if !sources.is_empty() {
                matched.insert(name.clone(), sources);
            }
        }
        Ok(matched)
    }

    /// Tag a value tree and evaluate the rules over the result.
    ///
    /// # Errors
    ///
    /// Fails on the first extractor failure or an inconsistent rule order.
    pub fn process_value(
        &self,
        value: &Value,
        include: &[&str],
        exclude: &[&str],
    ) -> Result<BTreeMap<String, Vec<String>>, TagsiftError> {
        let fields = self.tag_value(value, include, exclude)?;
        Ok(self.evaluate(&TagIndex::from(fields.as_slice()))?)
    }

    /// Tag raw text and evaluate the rules over the result. Tags observed in
    /// text carry no field paths, so field-scoped literals never match here.
    ///
    /// # Errors
    ///
    /// Fails on the first extractor failure or an inconsistent rule order.
    pub fn process_text(
        &self,
        text: &str,
    ) -> Result<BTreeMap<String, Vec<String>>, TagsiftError> {
        let extractors = self.tag_text(text)?;
        let mut index = TagIndex::new();
        for info in extractors.values() {
            for tag in &info.tags {
                index.insert_pathless(tag.clone());
            }
        }
        Ok(self.evaluate(&index)?)
    }

    /// Parse, tag, and evaluate a JSON document in one call.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, the first extractor failure, or an
    /// inconsistent rule order.
    #[cfg(feature = "json")]
    pub fn process_json(
        &self,
        json: &str,
        include: &[&str],
        exclude: &[&str],
    ) -> Result<BTreeMap<String, Vec<String>>, TagsiftError> {
        let fields = self.tag_json(json, include, exclude)?;
        Ok(self.evaluate(&TagIndex::from(fields.as_slice()))?)
    }
}

/// Exclusions win over inclusions; an empty include list admits everything.
/// Both sides match on path prefix, so excluding `Obj` also excludes
/// `Obj.Field1`.
fn path_admitted(path: &str, include: &[&str], exclude: &[&str]) -> bool {
    if exclude.iter().any(|prefix| path.starts_with(prefix)) {
        return false;
    }
    include.is_empty() || include.iter().any(|prefix| path.starts_with(prefix))
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_owned()
    } else {
        format!("{parent}.{key}")
    }
}

/// Builder for [`Tagger`]. Extractors and rules can also be added to a
/// built `Tagger`; the builder exists so a fully configured engine can be
/// assembled in one expression.
#[derive(Default)]
pub struct TaggerBuilder {
    string_extractors: Vec<Box<dyn StringExtractor>>,
    int_extractors: Vec<Box<dyn IntExtractor>>,
    float_extractors: Vec<Box<dyn FloatExtractor>>,
    rules: Vec<(String, Vec<String>)>,
    options: ParserOptions,
}

impl TaggerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn string_extractor(mut self, extractor: impl StringExtractor + 'static) -> Self {
        self.string_extractors.push(Box::new(extractor));
        self
    }

    #[must_use]
    pub fn int_extractor(mut self, extractor: impl IntExtractor + 'static) -> Self {
        self.int_extractors.push(Box::new(extractor));
        self
    }

    #[must_use]
    pub fn float_extractor(mut self, extractor: impl FloatExtractor + 'static) -> Self {
        self.float_extractors.push(Box::new(extractor));
        self
    }

    #[must_use]
    pub fn rule(mut self, name: &str, sources: &[&str]) -> Self {
        self.rules.push((
            name.to_owned(),
            sources.iter().map(|s| (*s).to_owned()).collect(),
        ));
        self
    }

    /// Accept `AND` / `Or` / `nOt` in rule expressions alongside the
    /// canonical lowercase keywords.
    #[must_use]
    pub fn case_insensitive_keywords(mut self, enabled: bool) -> Self {
        self.options.case_insensitive_keywords = enabled;
        self
    }

    /// Compile the queued rules and produce the engine.
    ///
    /// # Errors
    ///
    /// Returns the first rule compilation failure.
    pub fn build(self) -> Result<Tagger, TagsiftError> {
        let mut tagger = Tagger {
            string_extractors: self.string_extractors,
            int_extractors: self.int_extractors,
            float_extractors: self.float_extractors,
            rules: BTreeMap::new(),
            referenced_tags: BTreeSet::new(),
            referenced_scopes: BTreeSet::new(),
            options: self.options,
        };
        for (name, sources) in &self.rules {
            let sources: Vec<&str> = sources.iter().map(String::as_str).collect();
            tagger.add_rule(name, &sources)?;
        }
        Ok(tagger)
    }
}
