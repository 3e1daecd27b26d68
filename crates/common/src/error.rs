//! Error types shared across FieldMerge crates.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Width, height, and channel count of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RasterShape {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl fmt::Display for RasterShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels)
    }
}

/// Top-level error type for FieldMerge operations.
#[derive(Debug, thiserror::Error)]
pub enum FieldMergeError {
    #[error("Failed to load image {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error(
        "Field images must be the same size and have the same number of channels \
         (field A is {field_a}, field B is {field_b})"
    )]
    DimensionMismatch {
        field_a: RasterShape,
        field_b: RasterShape,
    },

    #[error("Failed to save image {path}: {message}")]
    Save { path: PathBuf, message: String },

    #[error("Deinterlace filter failed: {message}")]
    ExternalFilter { message: String, diagnostics: String },

    #[error("Missing input: {message}")]
    MissingInput { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using FieldMergeError.
pub type FieldMergeResult<T> = Result<T, FieldMergeError>;

/// Coarse error category, stable enough to match on from a UI shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Load,
    DimensionMismatch,
    Save,
    ExternalFilter,
    MissingInput,
    Config,
    Unsupported,
    Io,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Load => "load_error",
            ErrorKind::DimensionMismatch => "dimension_mismatch",
            ErrorKind::Save => "save_error",
            ErrorKind::ExternalFilter => "external_filter_error",
            ErrorKind::MissingInput => "missing_input",
            ErrorKind::Config => "config_error",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Io => "io_error",
            ErrorKind::Internal => "internal_error",
        };
        f.write_str(name)
    }
}

/// Structured failure handed back to the caller instead of aborting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    /// Diagnostic output from an external process, when there is any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl FieldMergeError {
    pub fn load(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn save(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Save {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn external_filter(msg: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self::ExternalFilter {
            message: msg.into(),
            diagnostics: diagnostics.into(),
        }
    }

    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Load { .. } => ErrorKind::Load,
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::Save { .. } => ErrorKind::Save,
            Self::ExternalFilter { .. } => ErrorKind::ExternalFilter,
            Self::MissingInput { .. } => ErrorKind::MissingInput,
            Self::Config { .. } => ErrorKind::Config,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) | Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// Flatten into a kind + message pair for the calling shell.
    pub fn report(&self) -> ErrorReport {
        let diagnostics = match self {
            Self::ExternalFilter { diagnostics, .. } if !diagnostics.is_empty() => {
                Some(diagnostics.clone())
            }
            _ => None,
        };
        let message = match &diagnostics {
            Some(text) => format!("{self}: {text}"),
            None => self.to_string(),
        };
        ErrorReport {
            kind: self.kind(),
            message,
            diagnostics,
        }
    }
}
