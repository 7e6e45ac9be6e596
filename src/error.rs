use std::{io, path::PathBuf};
use thiserror::Error;

/**
Result type to simplify function signatures.

This is a custom result type that uses our custom `QueryMenuError` for the error type.

Functions can return `QueryMenuResult<T>` and then use `?` to automatically propagate errors.
*/
pub type QueryMenuResult<T> = Result<T, QueryMenuError>;

/**
Custom error type for Query Menu.

The menu composer and the template engine never fail; these variants cover
everything around them: reading catalog/history files, parsing the command line
and resolving headless selections.

We use the `thiserror` crate to derive the `Error` trait and automatically
implement `Display` using the `#[error(...)]` attribute.
*/
#[derive(Error, Debug)]
pub enum QueryMenuError {
    // Wrapper for standard IO errors.
    // The #[from] attribute automatically converts io::Error to QueryMenuError::Io.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // Syntax or shape errors found while reading a YAML catalog.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // Syntax or shape errors found while reading a JSON catalog.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Indicates that a specified file could not be found, storing the attempted path.
    #[error("File not found: {0:#?}")]
    FileNotFound(PathBuf),

    // Indicates that a provided file extension or file type are not supported.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// The catalog parsed but breaks a rule of the catalog format.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// A headless `--select` path did not resolve to a leaf of the menu.
    #[error("Menu entry not found: '{0}'")]
    MenuEntryNotFound(String),

    /// A `--var` names a slug the selected query does not declare.
    #[error("Unknown variable '{0}' for the selected query")]
    UnknownVariable(String),

    #[error("Invalid value for command-line argument '{arg_name}': {reason}")]
    InvalidArgument {
        arg_name: String, // Context about *which* argument failed
        reason: String,   // The specific error reason
    },

    // A catch-all for other, less specific errors not covered by specific variants.
    #[error("Other error: {0}")]
    Other(String),
}

// Implementation of the From trait to convert a String into a QueryMenuError.
impl From<String> for QueryMenuError {
    fn from(err: String) -> QueryMenuError {
        QueryMenuError::Other(err)
    }
}
