//! Filters and field filter sets
//!
//! A [`Filter`] is a conjunction of field-level clauses. Two clause kinds
//! exist and they are deliberately different:
//!
//! - [`Clause::Eq`] matches a field by exact equality (single-field lookups);
//! - [`Clause::Regex`] matches a field against an unanchored regular
//!   expression, so `"ana"` matches both `"ana"` and `"anabella"`
//!   (multi-field searches).
//!
//! Since every filter is a pure AND, the documents it selects do not depend
//! on the order its clauses were added in.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::error::{DbError, DbResult};

/// A JSON document as seen by store-agnostic code
pub type Document = Map<String, Value>;

/// A single field-level condition
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Exact equality against a value
    Eq { field: String, value: Value },
    /// Regular expression match against string values.
    ///
    /// The pattern is kept as written and handed to the store unchanged, so
    /// the store's own regex dialect decides what it means.
    Regex { field: String, pattern: String },
}

impl Clause {
    /// Field this clause applies to
    pub fn field(&self) -> &str {
        match self {
            Clause::Eq { field, .. } | Clause::Regex { field, .. } => field,
        }
    }
}

/// A clause ready for local evaluation
#[derive(Debug)]
enum Compiled<'a> {
    Eq { field: &'a str, value: &'a Value },
    Regex { field: &'a str, pattern: Regex },
}

impl Compiled<'_> {
    fn field(&self) -> &str {
        match self {
            Compiled::Eq { field, .. } | Compiled::Regex { field, .. } => field,
        }
    }

    fn matches(&self, document: &Document) -> bool {
        let Some(actual) = lookup(document, self.field()) else {
            return false;
        };
        match self {
            Compiled::Eq { value, .. } => match actual {
                Value::Array(items) if !value.is_array() => items.contains(value),
                _ => actual == *value,
            },
            Compiled::Regex { pattern, .. } => match actual {
                Value::String(s) => pattern.is_match(s),
                Value::Array(items) => items
                    .iter()
                    .any(|item| item.as_str().is_some_and(|s| pattern.is_match(s))),
                _ => false,
            },
        }
    }
}

/// A [`Filter`] compiled for evaluation against in-process documents
#[derive(Debug)]
pub struct Matcher<'a> {
    clauses: Vec<Compiled<'a>>,
}

impl Matcher<'_> {
    /// True when the document satisfies every clause
    pub fn matches(&self, document: &Document) -> bool {
        self.clauses.iter().all(|clause| clause.matches(document))
    }
}

/// Walk a dotted field path through nested objects
fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// AND-composed query filter
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// Filter matching every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter with a single equality clause
    pub fn eq<V: Serialize + ?Sized>(field: &str, value: &V) -> DbResult<Self> {
        Self::all().and_eq(field, value)
    }

    /// Filter with a single regex clause
    pub fn regex(field: &str, pattern: &str) -> DbResult<Self> {
        Self::all().and_regex(field, pattern)
    }

    /// Extend the filter with an equality clause
    pub fn and_eq<V: Serialize + ?Sized>(mut self, field: &str, value: &V) -> DbResult<Self> {
        let field = checked_field(field)?;
        let value = serde_json::to_value(value)?;
        self.clauses.push(Clause::Eq { field, value });
        Ok(self)
    }

    /// Extend the filter with a regex clause.
    ///
    /// Only the field name is checked. The pattern belongs to the store and
    /// is validated by whichever store evaluates it.
    pub fn and_regex(mut self, field: &str, pattern: &str) -> DbResult<Self> {
        let field = checked_field(field)?;
        self.clauses.push(Clause::Regex {
            field,
            pattern: pattern.to_string(),
        });
        Ok(self)
    }

    /// Clauses in construction order
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// True when the filter has no clauses
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Compile the filter for local evaluation.
    ///
    /// Patterns are compiled with the `regex` crate. A pattern it cannot
    /// compile (look-around, backreferences) is a failure of the evaluating
    /// store, not of the caller, and is reported as `StoreOperationFailed`.
    pub fn matcher(&self) -> DbResult<Matcher<'_>> {
        let clauses = self
            .clauses
            .iter()
            .map(|clause| match clause {
                Clause::Eq { field, value } => Ok(Compiled::Eq { field, value }),
                Clause::Regex { field, pattern } => Regex::new(pattern)
                    .map(|pattern| Compiled::Regex { field, pattern })
                    .map_err(|e| {
                        DbError::operation(format!(
                            "pattern for field '{}' is not supported by the in-memory store: {}",
                            field, e
                        ))
                    }),
            })
            .collect::<DbResult<Vec<_>>>()?;
        Ok(Matcher { clauses })
    }

    /// Render the filter as a BSON query document
    #[cfg(feature = "storage-documentdb")]
    pub fn to_document(&self) -> DbResult<mongodb::bson::Document> {
        use mongodb::bson::{doc, Bson, Document as BsonDocument};

        fn clause_document(clause: &Clause) -> DbResult<BsonDocument> {
            let mut rendered = BsonDocument::new();
            match clause {
                Clause::Eq { field, value } => {
                    let value = Bson::try_from(value.clone())
                        .map_err(|e| DbError::Serialization(e.to_string()))?;
                    rendered.insert(field.clone(), value);
                }
                Clause::Regex { field, pattern } => {
                    rendered.insert(field.clone(), doc! { "$regex": pattern.clone() });
                }
            }
            Ok(rendered)
        }

        match self.clauses.as_slice() {
            [] => Ok(BsonDocument::new()),
            [single] => clause_document(single),
            many => {
                let parts = many
                    .iter()
                    .map(|clause| clause_document(clause).map(Bson::Document))
                    .collect::<DbResult<Vec<_>>>()?;
                Ok(doc! { "$and": parts })
            }
        }
    }
}

fn checked_field(field: &str) -> DbResult<String> {
    if field.trim().is_empty() {
        return Err(DbError::invalid_argument("field name must not be empty"));
    }
    Ok(field.to_string())
}

/// A single `(field, value)` equality pair
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    /// Create a field filter from any serializable value
    pub fn new<V: Serialize + ?Sized>(field: &str, value: &V) -> DbResult<Self> {
        Ok(Self {
            field: checked_field(field)?,
            value: serde_json::to_value(value)?,
        })
    }

    /// Equality filter for this pair
    pub fn to_filter(&self) -> DbResult<Filter> {
        Filter::eq(&self.field, &self.value)
    }
}

/// Ordered mapping from field name to regex pattern.
///
/// Iteration follows insertion order. Inserting a field that is already
/// present replaces its pattern without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFilterSet {
    entries: Vec<(String, String)>,
}

impl FieldFilterSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with<F: Into<String>, P: Into<String>>(mut self, field: F, pattern: P) -> Self {
        self.insert(field, pattern);
        self
    }

    /// Insert or replace the pattern for a field
    pub fn insert<F: Into<String>, P: Into<String>>(&mut self, field: F, pattern: P) {
        let field = field.into();
        let pattern = pattern.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == field) {
            Some(entry) => entry.1 = pattern,
            None => self.entries.push((field, pattern)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(f, p)| (f.as_str(), p.as_str()))
    }

    /// Compose the conjunctive regex filter for this set.
    ///
    /// The first entry seeds the filter and each following entry is AND-ed
    /// on in order. An empty set is rejected.
    pub fn to_filter(&self) -> DbResult<Filter> {
        let mut entries = self.iter();
        let Some((field, pattern)) = entries.next() else {
            return Err(DbError::invalid_argument(
                "field filter set must not be empty",
            ));
        };

        let mut filter = Filter::regex(field, pattern)?;
        for (field, pattern) in entries {
            filter = filter.and_regex(field, pattern)?;
        }
        Ok(filter)
    }
}

impl<F: Into<String>, P: Into<String>> FromIterator<(F, P)> for FieldFilterSet {
    fn from_iter<I: IntoIterator<Item = (F, P)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (field, pattern) in iter {
            set.insert(field, pattern);
        }
        set
    }
}

impl From<HashMap<String, String>> for FieldFilterSet {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<BTreeMap<String, String>> for FieldFilterSet {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}
