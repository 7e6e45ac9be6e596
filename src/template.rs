//! The query template engine.
//!
//! Selecting a query produces an `EditorState`; applying the user's raw inputs produces the next
//! one. States are values: every transition returns a new `EditorState` and the previous one is
//! simply dropped, so nothing typed for one query can leak into the next selection.
//!
//! ```text
//! select_query(no vars)  -> Selected   (editable, rendered_sql = template)
//! select_query(has vars) -> Selected   (locked,   rendered_sql = template)
//! apply_variables        -> Substituted (locked), repeatable
//! ```

use crate::{QueryDefinition, VariableKind, VariableSpec};
use regex::Regex;
use std::{fmt, sync::LazyLock};
use tracing::debug;

/// Matches `{slug}` tokens. Only used to report what is left after substitution.
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}\s]+)\}").expect("placeholder regex is valid"));

// --- Values ---

/// A coerced variable value, ready to be substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableValue {
    /// Boolean variables: `1` when checked, `0` otherwise.
    Flag(u8),
    /// String, integer and float variables: the text as entered.
    Text(String),
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Flag(flag) => write!(f, "{flag}"),
            VariableValue::Text(text) => f.write_str(text),
        }
    }
}

/// What an input control holds before coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    /// State of a checkbox.
    Checked(bool),
    /// Content of a text or numeric field.
    Text(String),
}

/// Coerces a raw input according to the variable kind.
///
/// Integer and float inputs are deliberately left as text: parsing them here would change what
/// gets substituted (`"1.50"` would become `"1.5"`).
pub fn coerce(kind: VariableKind, raw: &RawInput) -> VariableValue {
    match kind {
        VariableKind::Boolean => {
            let checked = match raw {
                RawInput::Checked(checked) => *checked,
                RawInput::Text(text) => !text.is_empty(),
            };
            VariableValue::Flag(u8::from(checked))
        }
        VariableKind::String | VariableKind::Integer | VariableKind::Float => match raw {
            RawInput::Text(text) => VariableValue::Text(text.clone()),
            RawInput::Checked(checked) => VariableValue::Text(checked.to_string()),
        },
    }
}

/// The raw input a freshly rendered control holds for `spec`.
pub fn default_input(spec: &VariableSpec) -> RawInput {
    match spec.kind {
        VariableKind::Boolean => {
            RawInput::Checked(spec.default.as_ref().is_some_and(|d| d.is_checked()))
        }
        VariableKind::String | VariableKind::Integer | VariableKind::Float => RawInput::Text(
            spec.default
                .as_ref()
                .map(|d| d.as_text())
                .unwrap_or_default(),
        ),
    }
}

/// Ordered `slug -> T` pairs with unique slugs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for SlugMap<T> {
    fn default() -> Self {
        SlugMap {
            entries: Vec::new(),
        }
    }
}

impl<T> SlugMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of `slug`, keeping its position if it is already present.
    pub fn set(&mut self, slug: impl Into<String>, value: T) {
        let slug = slug.into();
        match self.entries.iter_mut().find(|(s, _)| *s == slug) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((slug, value)),
        }
    }

    pub fn with(mut self, slug: impl Into<String>, value: T) -> Self {
        self.set(slug, value);
        self
    }

    pub fn get(&self, slug: &str) -> Option<&T> {
        self.entries.iter().find(|(s, _)| s == slug).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, slug: &str) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|(s, _)| s == slug)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(s, v)| (s.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// User-entered values keyed by slug, as collected from the input controls.
pub type RawInputs = SlugMap<RawInput>;

/// Coerced values keyed by slug, in substitution order.
pub type VariableValues = SlugMap<VariableValue>;

// --- Input controls ---

/// The kind of input control offered for a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputControl {
    Checkbox { checked: bool },
    Text { value: String },
    Number { value: String, step: &'static str },
}

/// Everything the host needs to draw one variable input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableControl {
    pub slug: String,
    /// Element id, `variable-{slug}`.
    pub id: String,
    pub label: String,
    pub control: InputControl,
}

// --- EditorState ---

/// The single live editing session: selected query, its applied values and the SQL text.
///
/// Invariant: `rendered_sql` is the template of `current_query` with `variable_values`
/// substituted by the last `apply_variables` (or the bare template right after selection,
/// possibly hand-edited when `editable`).
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    current_query: QueryDefinition,
    variable_values: VariableValues,
    rendered_sql: String,
    editable: bool,
}

impl EditorState {
    pub fn current_query(&self) -> &QueryDefinition {
        &self.current_query
    }

    pub fn variable_values(&self) -> &VariableValues {
        &self.variable_values
    }

    pub fn rendered_sql(&self) -> &str {
        &self.rendered_sql
    }

    /// `true` when the SQL text may be edited directly (the query declares no variables).
    pub fn editable(&self) -> bool {
        self.editable
    }

    /// Informational text, visible iff the query has a non-empty `info`.
    pub fn info(&self) -> Option<&str> {
        self.current_query
            .info
            .as_deref()
            .filter(|info| !info.is_empty())
    }

    /// The input controls to render, in variable order, pre-filled with the defaults.
    pub fn controls(&self) -> Vec<VariableControl> {
        self.current_query
            .variables
            .iter()
            .map(|(slug, spec)| {
                let control = match (default_input(spec), spec.kind.step()) {
                    (RawInput::Checked(checked), _) => InputControl::Checkbox { checked },
                    (RawInput::Text(value), Some(step)) => InputControl::Number { value, step },
                    (RawInput::Text(value), None) => InputControl::Text { value },
                };

                VariableControl {
                    slug: slug.to_string(),
                    id: format!("variable-{slug}"),
                    label: spec.label.clone(),
                    control,
                }
            })
            .collect()
    }

    /// Raw inputs of a freshly rendered form: one entry per variable, holding its default.
    pub fn default_inputs(&self) -> RawInputs {
        self.current_query
            .variables
            .iter()
            .fold(RawInputs::new(), |inputs, (slug, spec)| {
                inputs.with(slug, default_input(spec))
            })
    }

    /// Replaces the SQL text with a hand edit. Ignored unless the state is `editable`.
    pub fn with_edited_sql(mut self, sql: impl Into<String>) -> Self {
        if self.editable {
            self.rendered_sql = sql.into();
        }
        self
    }
}

/// Starts a new editing session for `query`.
///
/// Values start from the declared defaults (booleans as `1`/`0`), the SQL text is the bare
/// template, and direct editing is allowed only when no variables are declared.
pub fn select_query(query: QueryDefinition) -> EditorState {
    let variable_values = query
        .variables
        .iter()
        .fold(VariableValues::new(), |values, (slug, spec)| {
            values.with(slug, coerce(spec.kind, &default_input(spec)))
        });

    debug!(
        "select_query(): title: {:?}, variables: {}",
        query.title,
        query.variables.len()
    );

    EditorState {
        rendered_sql: query.sql.clone(),
        editable: !query.has_variables(),
        variable_values,
        current_query: query,
    }
}

/// Starts a "Custom SQL" session: empty, editable text.
pub fn select_custom_sql() -> EditorState {
    select_query(QueryDefinition::custom())
}

/// Coerces `raw_inputs` and substitutes them into the template of the current query.
///
/// ### Logic
/// 1. For each declared variable, in declaration order, coerce its raw input if one was given.
///    Slugs missing from `raw_inputs` are omitted (not defaulted); undeclared slugs are ignored.
/// 2. Substitute the coerced values into the stored template (`substitute`).
/// 3. Return a new state with the new values and text. `editable` is unchanged.
pub fn apply_variables(state: &EditorState, raw_inputs: &RawInputs) -> EditorState {
    // 1. Coerce.
    let variable_values = state
        .current_query
        .variables
        .iter()
        .filter_map(|(slug, spec)| {
            raw_inputs
                .get(slug)
                .map(|raw| (slug, coerce(spec.kind, raw)))
        })
        .fold(VariableValues::new(), |values, (slug, value)| {
            values.with(slug, value)
        });

    // 2. Substitute.
    let rendered_sql = substitute(&state.current_query.sql, &variable_values);

    let unresolved = placeholders(&rendered_sql);
    if !unresolved.is_empty() {
        debug!("apply_variables(): placeholders left in SQL: {unresolved:?}");
    }

    // 3. New state.
    EditorState {
        current_query: state.current_query.clone(),
        variable_values,
        rendered_sql,
        editable: state.editable,
    }
}

/// Replaces the **first** occurrence of `{slug}` for every value, in the values' order.
///
/// A placeholder repeated in the template keeps its later occurrences; placeholders without a
/// value and values without a placeholder are left alone.
pub fn substitute(template: &str, values: &VariableValues) -> String {
    values
        .iter()
        .fold(template.to_string(), |sql, (slug, value)| {
            sql.replacen(&format!("{{{slug}}}"), &value.to_string(), 1)
        })
}

/// Slugs of the `{slug}` placeholders present in `sql`, in order of appearance.
pub fn placeholders(sql: &str) -> Vec<String> {
    PLACEHOLDER_REGEX
        .captures_iter(sql)
        .map(|caps| caps[1].to_string())
        .collect()
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// cargo test -- --show-output tests_template
#[cfg(test)]
mod tests_template {
    use super::*;

    fn digest_query() -> QueryDefinition {
        QueryDefinition::new(
            "SELECT * FROM stats_mysql_query_digest WHERE count_star > {min} AND sum_time > {avg} {active} LIMIT {limit}",
        )
        .with_title("Digests")
        .with_info("Most frequent digests")
        .with_variable("min", VariableSpec::new("Min count", VariableKind::Integer).with_default(100))
        .with_variable("avg", VariableSpec::new("Avg time", VariableKind::Float).with_default(0.5))
        .with_variable("active", VariableSpec::new("Active", VariableKind::Boolean).with_default(true))
        .with_variable("limit", VariableSpec::new("Limit", VariableKind::String))
    }

    #[test]
    fn test_select_without_variables_is_editable() {
        let query = QueryDefinition::new("SELECT {x} FROM t");
        let state = select_query(query.clone());

        assert!(state.editable());
        assert_eq!(state.rendered_sql(), query.sql);
        assert!(state.variable_values().is_empty());
        assert!(state.controls().is_empty());
    }

    #[test]
    fn test_select_with_variables_is_locked() {
        let state = select_query(digest_query());

        assert!(!state.editable());
        assert_eq!(state.rendered_sql(), digest_query().sql); // no substitution yet
    }

    #[test]
    fn test_select_initializes_values_from_defaults() {
        let state = select_query(digest_query());
        let values = state.variable_values();

        assert_eq!(values.get("min"), Some(&VariableValue::Text("100".into())));
        assert_eq!(values.get("avg"), Some(&VariableValue::Text("0.5".into())));
        assert_eq!(values.get("active"), Some(&VariableValue::Flag(1)));
        assert_eq!(values.get("limit"), Some(&VariableValue::Text(String::new())));
    }

    #[test]
    fn test_custom_sql() {
        let state = select_custom_sql();
        assert!(state.editable());
        assert_eq!(state.rendered_sql(), "");
        assert_eq!(state.info(), None);
    }

    #[test]
    fn test_info_visibility() {
        assert_eq!(select_query(digest_query()).info(), Some("Most frequent digests"));
        assert_eq!(
            select_query(QueryDefinition::new("SELECT 1").with_info("")).info(),
            None
        );
        assert_eq!(select_query(QueryDefinition::new("SELECT 1")).info(), None);
    }

    #[test]
    fn test_boolean_coercion() {
        assert_eq!(
            coerce(VariableKind::Boolean, &RawInput::Checked(false)),
            VariableValue::Flag(0)
        );
        assert_eq!(
            coerce(VariableKind::Boolean, &RawInput::Checked(true)),
            VariableValue::Flag(1)
        );

        let query = QueryDefinition::new("SELECT {flag}")
            .with_variable("flag", VariableSpec::new("Flag", VariableKind::Boolean).with_default(true));
        let state = select_query(query);

        let unchecked = apply_variables(&state, &RawInputs::new().with("flag", RawInput::Checked(false)));
        assert_eq!(unchecked.variable_values().get("flag"), Some(&VariableValue::Flag(0)));
        assert_eq!(unchecked.rendered_sql(), "SELECT 0");

        let checked = apply_variables(&state, &RawInputs::new().with("flag", RawInput::Checked(true)));
        assert_eq!(checked.rendered_sql(), "SELECT 1");
    }

    #[test]
    fn test_numeric_inputs_stay_raw_text() {
        assert_eq!(
            coerce(VariableKind::Float, &RawInput::Text("1.50".into())),
            VariableValue::Text("1.50".into())
        );
        assert_eq!(
            coerce(VariableKind::Integer, &RawInput::Text("abc".into())),
            VariableValue::Text("abc".into())
        );
    }

    #[test]
    fn test_apply_variables_substitutes_in_order() {
        let state = select_query(digest_query());
        let inputs = RawInputs::new()
            .with("limit", RawInput::Text("5".into()))
            .with("min", RawInput::Text("10".into()))
            .with("avg", RawInput::Text("1.50".into()))
            .with("active", RawInput::Checked(false));

        let applied = apply_variables(&state, &inputs);

        assert_eq!(
            applied.rendered_sql(),
            "SELECT * FROM stats_mysql_query_digest WHERE count_star > 10 AND sum_time > 1.50 0 LIMIT 5"
        );
        assert!(!applied.editable());

        // Values follow declaration order, not input order.
        let slugs: Vec<&str> = applied.variable_values().iter().map(|(s, _)| s).collect();
        assert_eq!(slugs, vec!["min", "avg", "active", "limit"]);
    }

    #[test]
    fn test_missing_inputs_are_omitted() {
        let state = select_query(digest_query());
        let applied = apply_variables(&state, &RawInputs::new().with("min", RawInput::Text("1".into())));

        assert_eq!(applied.variable_values().len(), 1);
        assert_eq!(
            applied.rendered_sql(),
            "SELECT * FROM stats_mysql_query_digest WHERE count_star > 1 AND sum_time > {avg} {active} LIMIT {limit}"
        );
        assert_eq!(placeholders(applied.rendered_sql()), vec!["avg", "active", "limit"]);
    }

    #[test]
    fn test_undeclared_inputs_are_ignored() {
        let state = select_query(digest_query());
        let applied = apply_variables(&state, &RawInputs::new().with("nope", RawInput::Text("X".into())));
        assert!(applied.variable_values().is_empty());
        assert_eq!(applied.rendered_sql(), digest_query().sql);
    }

    #[test]
    fn test_substitute_first_occurrence_only() {
        let values = VariableValues::new().with("a", VariableValue::Text("X".into()));
        assert_eq!(substitute("{a} {a}", &values), "X {a}");
    }

    #[test]
    fn test_substitute_unmatched_slug() {
        let values = VariableValues::new().with("b", VariableValue::Text("Y".into()));
        assert_eq!(substitute("SELECT {a}", &values), "SELECT {a}");
    }

    #[test]
    fn test_apply_is_repeatable_from_template() {
        let query = QueryDefinition::new("SELECT {a}")
            .with_variable("a", VariableSpec::new("A", VariableKind::String));
        let state = select_query(query);

        let first = apply_variables(&state, &RawInputs::new().with("a", RawInput::Text("1".into())));
        let second = apply_variables(&first, &RawInputs::new().with("a", RawInput::Text("2".into())));
        assert_eq!(second.rendered_sql(), "SELECT 2");
    }

    #[test]
    fn test_new_selection_discards_previous_values() {
        let state = select_query(digest_query());
        let applied = apply_variables(&state, &RawInputs::new().with("min", RawInput::Text("999".into())));
        assert_eq!(applied.variable_values().get("min"), Some(&VariableValue::Text("999".into())));

        let reselected = select_query(digest_query());
        assert_eq!(reselected.variable_values().get("min"), Some(&VariableValue::Text("100".into())));
        assert_eq!(reselected, state);
    }

    #[test]
    fn test_controls() {
        let controls = select_query(digest_query()).controls();
        let kinds: Vec<&InputControl> = controls.iter().map(|c| &c.control).collect();

        assert_eq!(
            kinds,
            vec![
                &InputControl::Number { value: "100".into(), step: "1" },
                &InputControl::Number { value: "0.5".into(), step: "0.01" },
                &InputControl::Checkbox { checked: true },
                &InputControl::Text { value: String::new() },
            ]
        );
        assert_eq!(controls[0].id, "variable-min");
        assert_eq!(controls[0].label, "Min count");
    }

    #[test]
    fn test_default_inputs() {
        let inputs = select_query(digest_query()).default_inputs();
        assert_eq!(inputs.len(), 4);
        assert_eq!(inputs.get("active"), Some(&RawInput::Checked(true)));
        assert_eq!(inputs.get("avg"), Some(&RawInput::Text("0.5".into())));
    }

    #[test]
    fn test_edited_sql_only_when_editable() {
        let free = select_custom_sql().with_edited_sql("SELECT 42");
        assert_eq!(free.rendered_sql(), "SELECT 42");

        let locked = select_query(digest_query()).with_edited_sql("DROP TABLE x");
        assert_eq!(locked.rendered_sql(), digest_query().sql);
    }
}
