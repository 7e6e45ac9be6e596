//! Loading of the catalog and history files.
//!
//! A catalog file maps category names to lists of queries. It may be a standalone mapping or the
//! `misc` section of a larger application config; other top-level sections are ignored:
//!
//! ```yaml
//! misc:
//!   Stats:
//!     - title: Top digests
//!       info: Most frequent query digests
//!       sql: SELECT * FROM stats_mysql_query_digest LIMIT {limit}
//!       variables:
//!         limit:
//!           type: integer
//!           label: Limit
//!           default: 10
//! ```
//!
//! A history file holds one SQL statement per non-empty line.

use crate::{Catalog, CatalogFormat, HistoryList, QueryMenuError, QueryMenuResult};

use serde::Deserialize;
use std::{fs, path::Path};
use tracing::debug;

/// Application config carrying the catalog in its `misc` section.
#[derive(Deserialize)]
struct ConfigFile {
    misc: Catalog,
}

/// Reads, validates and normalizes the catalog at `path`.
///
/// ### Logic
/// 1. Check the file exists and pick the parser from the extension (`CatalogFormat`).
/// 2. Parse, unwrapping the `misc` section when present. An empty file is an empty catalog.
/// 3. Validate and normalize (`normalize_catalog`).
pub fn load_catalog(path: &Path) -> QueryMenuResult<Catalog> {
    // 1. Locate and identify.
    if !path.is_file() {
        return Err(QueryMenuError::FileNotFound(path.to_path_buf()));
    }

    let format = CatalogFormat::from_path(path);
    let content = fs::read_to_string(path)?;

    // 2. Parse.
    let catalog = parse_catalog(&content, &format)?;

    // 3. Validate.
    let catalog = normalize_catalog(catalog)?;

    debug!(
        "load_catalog(): {:?}: {} categories, {} queries",
        path,
        catalog.len(),
        catalog.iter().map(|c| c.queries.len()).sum::<usize>()
    );

    Ok(catalog)
}

/// Parses catalog text in the given format.
///
/// A top-level `misc` key is the config wrapper only when it holds a mapping. A list under
/// `misc` is an ordinary category of a bare catalog.
pub fn parse_catalog(content: &str, format: &CatalogFormat) -> QueryMenuResult<Catalog> {
    if content.trim().is_empty() {
        return Ok(Catalog::new());
    }

    match format {
        CatalogFormat::Yaml => {
            let value: serde_yaml::Value = serde_yaml::from_str(content)?;
            if value.get("misc").is_some_and(serde_yaml::Value::is_mapping) {
                Ok(serde_yaml::from_str::<ConfigFile>(content)?.misc)
            } else {
                Ok(serde_yaml::from_str(content)?)
            }
        }
        CatalogFormat::Json => {
            let value: serde_json::Value = serde_json::from_str(content)?;
            if value.get("misc").is_some_and(serde_json::Value::is_object) {
                Ok(serde_json::from_str::<ConfigFile>(content)?.misc)
            } else {
                Ok(serde_json::from_str(content)?)
            }
        }
        CatalogFormat::Unknown(ext) => Err(QueryMenuError::UnsupportedFileType(format!(
            "`.{ext}`: expected a .yaml, .yml or .json catalog"
        ))),
        CatalogFormat::Missing => Err(QueryMenuError::UnsupportedFileType(
            "missing extension: expected a .yaml, .yml or .json catalog".to_string(),
        )),
    }
}

/// Enforces catalog rules and normalizes the values.
///
/// - Every catalog query needs a title, since it is the text of its menu entry.
/// - An empty `info` is the same as no `info`.
/// - Categories are ordered by name.
pub fn normalize_catalog(catalog: Catalog) -> QueryMenuResult<Catalog> {
    let mut normalized = Catalog::new();

    for category in catalog.iter() {
        let mut category = category.clone();

        for (index, query) in category.queries.iter_mut().enumerate() {
            if query.title.is_none() {
                return Err(QueryMenuError::InvalidCatalog(format!(
                    "category '{}', query #{}: missing `title`",
                    category.name,
                    index + 1
                )));
            }

            if query.info.as_deref().is_some_and(str::is_empty) {
                query.info = None;
            }
        }

        normalized.push(category);
    }

    normalized.sort_by_name();

    Ok(normalized)
}

/// Reads the history file at `path`: one statement per non-empty line, in file order.
pub fn load_history(path: &Path) -> QueryMenuResult<HistoryList> {
    if !path.is_file() {
        return Err(QueryMenuError::FileNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;

    let history: HistoryList = content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect();

    debug!("load_history(): {:?}: {} statements", path, history.len());

    Ok(history)
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// cargo test -- --show-output tests_config
#[cfg(test)]
mod tests_config {
    use super::*;
    use crate::{VariableDefault, VariableKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PROXYWEB_CONFIG: &str = "\
global:
  default_server: proxysql
  read_only: false
servers:
  proxysql:
    dsn:
      host: 127.0.0.1
      port: 6032
misc:
  Stats:
    - title: Top digests
      info: ''
      sql: SELECT * FROM stats_mysql_query_digest LIMIT {limit}
      variables:
        limit:
          type: integer
          label: Limit
          default: 10
  Rules:
    - title: Active rules
      info: Only rules with active = 1
      sql: SELECT * FROM mysql_query_rules WHERE active = {active}
      variables:
        active:
          type: boolean
          label: Active
          default: true
";

    // Helper: writes `content` to a temp file with the given suffix.
    fn temp_file_with(content: &str, suffix: &str) -> QueryMenuResult<NamedTempFile> {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile()?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_load_wrapped_yaml_catalog() -> QueryMenuResult<()> {
        let file = temp_file_with(PROXYWEB_CONFIG, ".yml")?;
        let catalog = load_catalog(file.path())?;

        // Sorted by name.
        let names: Vec<&str> = catalog.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Rules", "Stats"]);

        let stats = &catalog.get("Stats").expect("Stats category").queries[0];
        assert_eq!(stats.info, None); // empty info normalized away
        let limit = stats.variables.get("limit").expect("limit variable");
        assert_eq!(limit.kind, VariableKind::Integer);
        assert_eq!(limit.default, Some(VariableDefault::Integer(10)));

        let rules = &catalog.get("Rules").expect("Rules category").queries[0];
        assert_eq!(rules.info.as_deref(), Some("Only rules with active = 1"));
        Ok(())
    }

    #[test]
    fn test_load_bare_json_catalog() -> QueryMenuResult<()> {
        let json = r#"{
            "b": [{"title": "B", "sql": "SELECT 'b'"}],
            "a": [{"title": "A", "sql": "SELECT {x}", "variables": {"x": {"type": "string", "label": "X", "default": "hi"}}}]
        }"#;
        let file = temp_file_with(json, ".json")?;
        let catalog = load_catalog(file.path())?;

        let names: Vec<&str> = catalog.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        Ok(())
    }

    #[test]
    fn test_bare_catalog_with_misc_category() -> QueryMenuResult<()> {
        let yaml = "\
misc:
  - title: T
    sql: SELECT 1
Stats:
  - title: S
    sql: SELECT 2
";
        let catalog = normalize_catalog(parse_catalog(yaml, &CatalogFormat::Yaml)?)?;
        let names: Vec<&str> = catalog.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Stats", "misc"]);

        let json = r#"{"misc": [{"title": "T", "sql": "SELECT 1"}]}"#;
        let catalog = parse_catalog(json, &CatalogFormat::Json)?;
        assert_eq!(catalog.get("misc").map(|c| c.queries.len()), Some(1));

        // A mapping under `misc` is still the wrapper.
        let wrapped = r#"{"global": {}, "misc": {"Stats": [{"title": "S", "sql": "SELECT 2"}]}}"#;
        let catalog = parse_catalog(wrapped, &CatalogFormat::Json)?;
        assert!(catalog.get("Stats").is_some() && catalog.get("misc").is_none());
        Ok(())
    }

    #[test]
    fn test_missing_title_is_rejected() -> QueryMenuResult<()> {
        let file = temp_file_with("Stats:\n  - sql: SELECT 1\n", ".yaml")?;
        let result = load_catalog(file.path());
        assert!(matches!(result, Err(QueryMenuError::InvalidCatalog(_))));
        Ok(())
    }

    #[test]
    fn test_unknown_kind_is_a_yaml_error() -> QueryMenuResult<()> {
        let yaml = "\
Stats:
  - title: T
    sql: SELECT {d}
    variables:
      d:
        type: date
        label: Day
";
        let file = temp_file_with(yaml, ".yaml")?;
        assert!(matches!(load_catalog(file.path()), Err(QueryMenuError::Yaml(_))));
        Ok(())
    }

    #[test]
    fn test_unsupported_extension() -> QueryMenuResult<()> {
        let file = temp_file_with("Stats: []\n", ".toml")?;
        assert!(matches!(
            load_catalog(file.path()),
            Err(QueryMenuError::UnsupportedFileType(_))
        ));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let result = load_catalog(Path::new("/definitely/not/here.yaml"));
        assert!(matches!(result, Err(QueryMenuError::FileNotFound(_))));
    }

    #[test]
    fn test_empty_file_is_empty_catalog() -> QueryMenuResult<()> {
        let file = temp_file_with("\n", ".yaml")?;
        assert!(load_catalog(file.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_history() -> QueryMenuResult<()> {
        let file = temp_file_with("SELECT 1\r\n\nSELECT * FROM t\n", ".sql")?;
        let history = load_history(file.path())?;

        let entries: Vec<&str> = history.iter().collect();
        assert_eq!(entries, vec!["SELECT 1", "SELECT * FROM t"]);
        Ok(())
    }
}
