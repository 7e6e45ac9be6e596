use crate::PathExtension;
use std::path::Path;

/// Represents the format of a catalog file, as told by its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogFormat {
    /// `.yaml` or `.yml` catalog file.
    Yaml,
    /// `.json` catalog file.
    Json,
    /// Unknown file extension, storing the extension as a string.
    Unknown(String),
    /// Missing file extension, when no extension is present in the path.
    Missing,
}

impl CatalogFormat {
    /// Determines the catalog format from a given path.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension_as_lowercase()
            .as_deref() // Converts `Option<String>` to `Option<&str>` for matching.
        {
            Some("yaml" | "yml") => CatalogFormat::Yaml,
            Some("json") => CatalogFormat::Json,
            Some(ext) => CatalogFormat::Unknown(ext.to_owned()),
            None => CatalogFormat::Missing,
        }
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// cargo test -- --show-output tests_catalog_format
#[cfg(test)]
mod tests_catalog_format {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path() {
        assert_eq!(CatalogFormat::from_path(&PathBuf::from("config.YML")), CatalogFormat::Yaml);
        assert_eq!(CatalogFormat::from_path(&PathBuf::from("a/b.yaml")), CatalogFormat::Yaml);
        assert_eq!(CatalogFormat::from_path(&PathBuf::from("queries.json")), CatalogFormat::Json);
        assert_eq!(
            CatalogFormat::from_path(&PathBuf::from("queries.toml")),
            CatalogFormat::Unknown("toml".to_string())
        );
        assert_eq!(CatalogFormat::from_path(&PathBuf::from("queries")), CatalogFormat::Missing);
    }
}
