//! Format backends and the driver interface they implement.
//!
//! A [`Backend`] opens files of one container format and hands back a
//! [`Driver`] handle. Everything above this module talks to files only
//! through [`Source`], which ties a driver handle to its format so that
//! backend errors surface as the matching [`PsiIoError`] variant.
//!
//! The handle is released when the [`Source`] is dropped, on every exit path.

pub mod memory;

#[cfg(feature = "hdf5")]
pub mod h5;

#[cfg(feature = "netcdf")]
pub mod hdf4;

use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::{Array1, ArrayD};

use crate::config::FormatIds;
use crate::error::{BackendError, PsiIoError, Result};
use crate::format::FileFormat;
use crate::types::DataType;

pub use memory::{MemoryBackend, MemoryDataset, MemoryFile, MemoryScale, ReadStats};

#[cfg(feature = "hdf5")]
pub use h5::Hdf5Backend;

#[cfg(feature = "netcdf")]
pub use hdf4::Hdf4Backend;

/// Result type for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Half-open index range `[start, stop)` along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisRange {
    pub start: usize,
    pub stop: usize,
}

impl AxisRange {
    /// Create a new range.
    pub fn new(start: usize, stop: usize) -> Self {
        Self { start, stop }
    }

    /// The whole axis of `len` elements.
    pub fn full(len: usize) -> Self {
        Self { start: 0, stop: len }
    }

    /// Number of indices covered.
    pub fn len(&self) -> usize {
        self.stop.saturating_sub(self.start)
    }

    /// Whether the range covers no index.
    pub fn is_empty(&self) -> bool {
        self.stop <= self.start
    }
}

impl fmt::Display for AxisRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.stop)
    }
}

/// Name, length and element kind of a scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleInfo {
    pub name: String,
    pub len: usize,
    pub dtype: DataType,
}

/// Opens files of one container format.
pub trait Backend: Send + Sync {
    /// Open `path` read-only.
    ///
    /// `ids` carries the naming convention of the format, which drivers use
    /// to locate scale datasets.
    fn open(&self, path: &Path, ids: &FormatIds) -> BackendResult<Box<dyn Driver>>;
}

/// An open, read-only file handle.
///
/// Axes are always numbered in on-disk order.
pub trait Driver {
    /// Names of the top-level datasets, in file order.
    fn list_datasets(&self) -> BackendResult<Vec<String>>;

    /// Shape (on-disk order) and element kind of a dataset.
    fn shape_and_type(&self, id: &str) -> BackendResult<(Vec<usize>, DataType)>;

    /// The scale attached to `axis` of a dataset, if any.
    fn scale(&self, id: &str, axis: usize) -> BackendResult<Option<ScaleInfo>>;

    /// Read one hyperslab, one range per axis.
    fn read_hyperslab(&self, id: &str, selection: &[AxisRange]) -> BackendResult<ArrayD<f64>>;

    /// Read a sub-range of the scale attached to `axis`.
    fn read_scale_range(&self, id: &str, axis: usize, range: AxisRange)
        -> BackendResult<Array1<f64>>;
}

/// An open file together with its format.
pub struct Source {
    format: FileFormat,
    path: PathBuf,
    driver: Box<dyn Driver>,
}

impl Source {
    /// Open `path` with `backend`.
    pub fn open(
        backend: &dyn Backend,
        format: FileFormat,
        path: &Path,
        ids: &FormatIds,
    ) -> Result<Self> {
        tracing::debug!(path = %path.display(), format = %format, "Opening file");

        let driver = backend
            .open(path, ids)
            .map_err(|e| PsiIoError::backend(format, e))?;

        Ok(Self {
            format,
            path: path.to_path_buf(),
            driver,
        })
    }

    /// Container format of the file.
    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list_datasets(&self) -> Result<Vec<String>> {
        self.driver.list_datasets().map_err(|e| self.wrap(e))
    }

    pub fn shape_and_type(&self, id: &str) -> Result<(Vec<usize>, DataType)> {
        self.driver.shape_and_type(id).map_err(|e| self.wrap(e))
    }

    pub fn scale(&self, id: &str, axis: usize) -> Result<Option<ScaleInfo>> {
        self.driver.scale(id, axis).map_err(|e| self.wrap(e))
    }

    pub fn read_hyperslab(&self, id: &str, selection: &[AxisRange]) -> Result<ArrayD<f64>> {
        tracing::debug!(
            path = %self.path.display(),
            dataset = id,
            selection = ?selection,
            "Reading hyperslab"
        );
        self.driver
            .read_hyperslab(id, selection)
            .map_err(|e| self.wrap(e))
    }

    pub fn read_scale_range(&self, id: &str, axis: usize, range: AxisRange) -> Result<Array1<f64>> {
        tracing::debug!(
            path = %self.path.display(),
            dataset = id,
            axis,
            range = %range,
            "Reading scale range"
        );
        self.driver
            .read_scale_range(id, axis, range)
            .map_err(|e| self.wrap(e))
    }

    fn wrap(&self, err: BackendError) -> PsiIoError {
        PsiIoError::backend(self.format, err)
    }
}

impl Drop for Source {
    fn drop(&mut self) {
        tracing::trace!(path = %self.path.display(), "Closing file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_range() {
        let range = AxisRange::new(5, 7);
        assert_eq!(range.len(), 2);
        assert!(!range.is_empty());
        assert_eq!(range.to_string(), "5..7");

        assert_eq!(AxisRange::full(11), AxisRange::new(0, 11));
        assert!(AxisRange::new(3, 3).is_empty());
    }
}
