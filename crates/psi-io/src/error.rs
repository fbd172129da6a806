//! Error types for PSI file access.

use std::path::PathBuf;

use thiserror::Error;

use crate::format::FileFormat;

/// Errors raised by a format backend.
///
/// Backends report these without knowing which container format they were
/// opened for; the caller wraps them in [`PsiIoError::Legacy`] or
/// [`PsiIoError::Modern`] so that the native error kind of each format stays
/// distinguishable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The requested dataset or scale does not exist in the file.
    #[error("not found: {0}")]
    NotFound(String),

    /// The file could not be opened or read.
    #[error("I/O error: {0}")]
    Io(String),
}

impl BackendError {
    /// Create a NotFound error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create an Io error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Whether this error reports a missing dataset or scale.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors that can occur while reading or interpolating PSI data files.
#[derive(Error, Debug)]
pub enum PsiIoError {
    /// The file extension matches neither the legacy nor the modern format.
    #[error("unsupported file format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// No backend for this format was compiled into the crate.
    #[error("no backend available for {0} files")]
    BackendUnavailable(FileFormat),

    /// Error reported by the legacy (HDF4) backend.
    #[error("legacy backend: {0}")]
    Legacy(#[source] BackendError),

    /// Error reported by the modern (HDF5) backend.
    #[error("modern backend: {0}")]
    Modern(#[source] BackendError),

    /// The dataset rank differs from the rank the operation requires.
    #[error("expected a {expected}-dimensional dataset, found {actual} dimensions")]
    DimensionMismatch { expected: usize, actual: usize },

    /// An index or index range lies outside `[imin, imax]`.
    #[error("index {requested} out of bounds for axis {axis} (valid range {imin}..={imax})")]
    IndexOutOfBounds {
        axis: usize,
        requested: String,
        imin: usize,
        imax: usize,
    },

    /// A physical value lies outside the scale range of an axis.
    #[error("value {value} outside the domain of axis {axis} ([{min}, {max}])")]
    OutOfDomain {
        axis: usize,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A value-based operation was requested on a dataset without scales.
    #[error("dataset {0} has no scales")]
    MissingScales(String),

    /// The request itself is malformed (wrong argument count, etc.).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The file metadata is inconsistent.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PsiIoError {
    /// Wrap a backend error in the variant belonging to `format`.
    pub fn backend(format: FileFormat, err: BackendError) -> Self {
        match format {
            FileFormat::Legacy => Self::Legacy(err),
            FileFormat::Modern => Self::Modern(err),
        }
    }

    /// Create an InvalidRequest error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// Create an IndexOutOfBounds error.
    pub fn out_of_bounds(axis: usize, requested: impl Into<String>, imin: usize, imax: usize) -> Self {
        Self::IndexOutOfBounds {
            axis,
            requested: requested.into(),
            imin,
            imax,
        }
    }

    /// The backend error carried by this error, if any.
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            Self::Legacy(e) | Self::Modern(e) => Some(e),
            _ => None,
        }
    }

    /// Whether this error reports a missing dataset or scale.
    pub fn is_not_found(&self) -> bool {
        self.backend_error().is_some_and(BackendError::is_not_found)
    }
}

/// Result type for PSI I/O operations.
pub type Result<T> = std::result::Result<T, PsiIoError>;
