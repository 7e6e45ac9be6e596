//! Data model shared by the menu composer and the template engine.
//!
//! A `Catalog` is an ordered set of named `Category` values, each holding an ordered list of
//! `QueryDefinition`s. A query definition carries a raw SQL template with `{slug}` placeholders
//! and, optionally, typed variable declarations (`Variables`).
//!
//! Mappings in this module keep their insertion order: the order variables appear in the
//! catalog file is the order their inputs are displayed and substituted, and the order of
//! categories is the order of the submenus. For that reason the map-shaped types are backed by
//! `Vec`s and deserialize through order-preserving `serde` visitors instead of `HashMap`.

use serde::{
    Deserialize, Deserializer,
    de::{self, MapAccess, Visitor},
};
use std::{fmt, marker::PhantomData};

// --- Variable Kinds ---

/// The closed set of variable types a query can declare.
///
/// Each kind decides which input control is offered and how the entered value is coerced
/// (see `template::coerce`). Adding a kind forces every `match` on it to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Rendered as a checkbox, substituted as `1` or `0`.
    Boolean,
    /// Free text, substituted verbatim.
    String,
    /// Numeric input with step `1`, substituted as the raw entered text.
    Integer,
    /// Numeric input with step `0.01`, substituted as the raw entered text.
    Float,
}

impl VariableKind {
    /// The step hint of the numeric input, if this kind is numeric.
    ///
    /// This only affects the input affordance; no numeric parsing happens anywhere.
    pub fn step(&self) -> Option<&'static str> {
        match self {
            VariableKind::Integer => Some("1"),
            VariableKind::Float => Some("0.01"),
            VariableKind::Boolean | VariableKind::String => None,
        }
    }

    /// Name of the kind as written in catalog files.
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Boolean => "boolean",
            VariableKind::String => "string",
            VariableKind::Integer => "integer",
            VariableKind::Float => "float",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Variable Defaults ---

/// A default value as written in the catalog.
///
/// Catalog files are not required to give a default of the declared kind (`default: 1` on a
/// boolean is common), so the value is kept as written and interpreted on demand through
/// `is_checked` and `as_text`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VariableDefault {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl VariableDefault {
    /// Truthiness of the default, used to pre-check boolean inputs.
    ///
    /// `false`, `0`, `0.0`, `NaN` and `""` are unchecked; everything else is checked.
    /// YAML 1.1 boolean words (`yes`, `no`, `on`, `off`) count as the boolean they spell.
    pub fn is_checked(&self) -> bool {
        match self {
            VariableDefault::Bool(b) => *b,
            VariableDefault::Integer(i) => *i != 0,
            VariableDefault::Float(f) => *f != 0.0 && !f.is_nan(),
            VariableDefault::Text(s) => yaml11_bool(s).unwrap_or(!s.is_empty()),
        }
    }

    /// Textual form of the default, used to pre-fill text and numeric inputs.
    ///
    /// Floats use the shortest representation (`2.0` becomes `"2"`, `0.5` stays `"0.5"`).
    pub fn as_text(&self) -> String {
        match self {
            VariableDefault::Bool(b) => b.to_string(),
            VariableDefault::Integer(i) => i.to_string(),
            VariableDefault::Float(f) => f.to_string(),
            VariableDefault::Text(s) => match yaml11_bool(s) {
                Some(b) => b.to_string(),
                None => s.clone(),
            },
        }
    }
}

/// Reads a YAML 1.1 boolean scalar that YAML 1.2 parsers keep as a string.
///
/// Accepts the lowercase, capitalized and uppercase spellings only (`no`, `No`, `NO`).
fn yaml11_bool(s: &str) -> Option<bool> {
    match s {
        "yes" | "Yes" | "YES" | "on" | "On" | "ON" | "true" | "True" | "TRUE" => Some(true),
        "no" | "No" | "NO" | "off" | "Off" | "OFF" | "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

impl From<bool> for VariableDefault {
    fn from(value: bool) -> Self {
        VariableDefault::Bool(value)
    }
}

impl From<i32> for VariableDefault {
    fn from(value: i32) -> Self {
        VariableDefault::Integer(i64::from(value))
    }
}

impl From<i64> for VariableDefault {
    fn from(value: i64) -> Self {
        VariableDefault::Integer(value)
    }
}

impl From<f64> for VariableDefault {
    fn from(value: f64) -> Self {
        VariableDefault::Float(value)
    }
}

impl From<&str> for VariableDefault {
    fn from(value: &str) -> Self {
        VariableDefault::Text(value.to_string())
    }
}

// --- VariableSpec ---

/// Declaration of a single typed placeholder variable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VariableSpec {
    /// Text shown next to the input control.
    pub label: String,
    /// The variable kind (`type` in catalog files).
    #[serde(rename = "type")]
    pub kind: VariableKind,
    /// Optional default. Missing means unchecked / empty text.
    #[serde(default)]
    pub default: Option<VariableDefault>,
}

impl VariableSpec {
    pub fn new(label: impl Into<String>, kind: VariableKind) -> Self {
        VariableSpec {
            label: label.into(),
            kind,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<VariableDefault>) -> Self {
        self.default = Some(default.into());
        self
    }
}

// --- Variables ---

/// Ordered mapping from slug to `VariableSpec`. Slugs are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    entries: Vec<(String, VariableSpec)>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a variable. An existing slug keeps its position and gets the new spec.
    pub fn insert(&mut self, slug: impl Into<String>, spec: VariableSpec) {
        let slug = slug.into();
        match self.entries.iter_mut().find(|(s, _)| *s == slug) {
            Some((_, existing)) => *existing = spec,
            None => self.entries.push((slug, spec)),
        }
    }

    pub fn get(&self, slug: &str) -> Option<&VariableSpec> {
        self.entries
            .iter()
            .find(|(s, _)| s == slug)
            .map(|(_, spec)| spec)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.get(slug).is_some()
    }

    /// Iterates `(slug, spec)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariableSpec)> {
        self.entries.iter().map(|(s, spec)| (s.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for Variables {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = deserializer.deserialize_map(OrderedMapVisitor::<VariableSpec>::new(
            "a mapping of variable slugs to variable declarations",
        ))?;
        Ok(Variables { entries })
    }
}

// --- QueryDefinition ---

/// A predefined (or ad hoc) SQL template.
///
/// Absent `variables` and an empty mapping mean the same thing: no variable inputs and a
/// directly editable SQL text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryDefinition {
    /// SQL template containing zero or more `{slug}` placeholders.
    pub sql: String,
    /// Display title of the menu leaf.
    #[serde(default)]
    pub title: Option<String>,
    /// Informational text shown next to the editor when non-empty.
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub variables: Variables,
}

impl QueryDefinition {
    pub fn new(sql: impl Into<String>) -> Self {
        QueryDefinition {
            sql: sql.into(),
            ..Default::default()
        }
    }

    /// The definition behind the "Custom SQL" entry: empty SQL, no title, no info, no variables.
    pub fn custom() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn with_variable(mut self, slug: impl Into<String>, spec: VariableSpec) -> Self {
        self.variables.insert(slug, spec);
        self
    }

    pub fn has_variables(&self) -> bool {
        !self.variables.is_empty()
    }
}

// --- Category & Catalog ---

/// A named, ordered group of queries shown as one submenu.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub queries: Vec<QueryDefinition>,
}

impl Category {
    pub fn new(name: impl Into<String>, queries: Vec<QueryDefinition>) -> Self {
        Category {
            name: name.into(),
            queries,
        }
    }
}

/// Ordered mapping from category name to `Category`. Names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a category at the end. A category with the same name is replaced in place.
    pub fn push(&mut self, category: Category) {
        match self.categories.iter_mut().find(|c| c.name == category.name) {
            Some(existing) => *existing = category,
            None => self.categories.push(category),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.push(category);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Iterates categories in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// Reorders categories alphabetically by name (stable).
    pub fn sort_by_name(&mut self) {
        self.categories.sort_by(|a, b| a.name.cmp(&b.name));
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = deserializer.deserialize_map(OrderedMapVisitor::<Vec<QueryDefinition>>::new(
            "a mapping of category names to lists of queries",
        ))?;

        let categories = entries
            .into_iter()
            .map(|(name, queries)| Category { name, queries })
            .collect();

        Ok(Catalog { categories })
    }
}

// --- HistoryList ---

/// Previously executed raw SQL strings, in the order supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryList {
    entries: Vec<String>,
}

impl HistoryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an executed statement the way the session history does:
    /// `\r\n` sequences are removed, blank and already-recorded statements are skipped.
    ///
    /// Returns `true` if the statement was added.
    pub fn record(&mut self, sql: &str) -> bool {
        let normalized = sql.replace("\r\n", "");

        if normalized.trim().is_empty() || self.entries.contains(&normalized) {
            return false;
        }

        self.entries.push(normalized);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<String>> for HistoryList {
    fn from(entries: Vec<String>) -> Self {
        HistoryList { entries }
    }
}

impl<S: Into<String>> FromIterator<S> for HistoryList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        HistoryList {
            entries: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// --- Order-preserving map visitor ---

/// Collects a serialized map into a `Vec` of pairs, keeping the source order.
/// Rejects duplicate keys.
struct OrderedMapVisitor<V> {
    expecting: &'static str,
    marker: PhantomData<V>,
}

impl<V> OrderedMapVisitor<V> {
    fn new(expecting: &'static str) -> Self {
        OrderedMapVisitor {
            expecting,
            marker: PhantomData,
        }
    }
}

impl<'de, V> Visitor<'de> for OrderedMapVisitor<V>
where
    V: Deserialize<'de>,
{
    type Value = Vec<(String, V)>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(self.expecting)
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries: Vec<(String, V)> = Vec::with_capacity(access.size_hint().unwrap_or(0));

        while let Some((key, value)) = access.next_entry::<String, V>()? {
            if entries.iter().any(|(k, _)| *k == key) {
                return Err(de::Error::custom(format!("duplicate key `{key}`")));
            }
            entries.push((key, value));
        }

        Ok(entries)
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
