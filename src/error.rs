use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by diffing, merging and writing configuration trees.
#[derive(Debug, Error)]
pub enum Error {
    /// A label is malformed or an input cannot be resolved to a mapping.
    #[error("type kind error: {0}")]
    TypeKind(String),

    /// The label was already folded into the accumulator.
    #[error("label already used: {label}")]
    DuplicateLabel { label: String },

    /// Every backup slot for the destination is taken.
    #[error("too many backups of {path:?} (checked {checked} names)")]
    TooManyBackups { path: PathBuf, checked: usize },

    /// A scalar and a nested mapping collide at the same path.
    #[error("conflict at {path}: {reason}")]
    Conflict { path: String, reason: String },

    /// The original text cannot be patched in place.
    #[error("format error: {0}")]
    Format(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] yaml_rust2::ScanError),

    #[error("yaml emit error: {0}")]
    Emit(#[from] yaml_rust2::EmitError),

    #[cfg(feature = "export")]
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn conflict(path: &[String], reason: impl Into<String>) -> Self {
        Error::Conflict {
            path: path.join("/"),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
