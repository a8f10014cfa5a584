//! Error types for image creation and inspection

use std::path::{Path, PathBuf};

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors produced while building, encoding or decoding boot images
#[derive(thiserror::Error, Debug)]
pub enum ImageError {
    #[error("Failed to read '{}': {source}", .path.display())]
    InputIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{}': {source}", .path.display())]
    OutputIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid header length: {actual} bytes (expected {expected})")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Image truncated: header declares {expected} payload bytes, found {actual}")]
    TruncatedImage { expected: usize, actual: usize },

    #[error("Value 0x{value:x} does not fit the {bits}-bit field '{field}'")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        bits: u32,
    },

    #[error("Unknown image variant '{0}' (expected 'bootblock' or 'uboot')")]
    UnknownVariant(String),

    #[error("Invalid value '{value}' for '{key}': {reason}")]
    ConfigParse {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load config file '{}': {reason}", .path.display())]
    ConfigFile { path: PathBuf, reason: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImageError {
    pub fn input_io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::InputIo {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn output_io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::OutputIo {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn field_overflow(field: &'static str, value: u64, bits: u32) -> Self {
        Self::FieldOverflow { field, value, bits }
    }

    pub fn config_parse(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ConfigParse {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn config_file(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::ConfigFile {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
