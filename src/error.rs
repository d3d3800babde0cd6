use std::path::PathBuf;

use thiserror::Error;

use crate::value::Kind;

/// Boxed error returned by decoders and custom loaders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to turn a string into a value of the requested [`Kind`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("Cannot parse '{input}' as {kind}: {reason}")]
    Parse {
        input: String,
        kind: Kind,
        reason: String,
    },

    #[error("Value '{input}' is out of range for {kind}")]
    OutOfRange { input: String, kind: Kind },

    #[error("Malformed map entry '{entry}': expected exactly one '{delimiter}'")]
    MalformedEntry { entry: String, delimiter: String },

    #[error("Cannot parse '{input}' as {kind}: {reason}")]
    CompositeParse {
        input: String,
        kind: Kind,
        reason: String,
    },

    #[error("Cannot decode '{input}' as {encoding}: {reason}")]
    Encoding {
        input: String,
        encoding: &'static str,
        reason: String,
    },

    #[error("Unsupported conversion target: {0}")]
    UnsupportedType(Kind),
}

#[derive(Debug, Error)]
pub enum CopreError {
    #[error("Invalid destination: {reason}")]
    InvalidDestination { reason: String },

    #[error("No config file found (looked for {})", list_paths(.candidates))]
    NotFound { candidates: Vec<PathBuf> },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {source}")]
    Decode { path: PathBuf, source: BoxError },

    #[error("Invalid value for '{path}': {source}")]
    Convert {
        path: String,
        source: ConvertError,
    },

    #[error("Failed to set value at path '.{path}': expected type '{expected}', got '{actual}'")]
    FieldTypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Unsupported option '{option}' for '{path}' of type {kind}")]
    UnsupportedOption {
        path: String,
        option: String,
        kind: Kind,
    },

    #[error("Unknown key '{key}' (line {line})")]
    UnknownKey { key: String, line: usize },

    #[error("Unknown keys in config file: {}", list_keys(.0))]
    UnknownKeys(Vec<CopreError>),

    #[error("Loader failed: {0}")]
    Loader(BoxError),
}

fn list_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn list_keys(errors: &[CopreError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
