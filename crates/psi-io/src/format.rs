//! Format dispatch by file extension.
//!
//! PSI data products come in two containers: the legacy HDF4 scientific
//! dataset files (`.hdf`) and the modern HDF5 files (`.h5`). The format is
//! chosen from the file extension alone; the file is never opened here.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PsiIoError, Result};

/// Extension of legacy (HDF4) files.
pub const LEGACY_EXTENSION: &str = "hdf";

/// Extension of modern (HDF5) files.
pub const MODERN_EXTENSION: &str = "h5";

/// Container format of a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileFormat {
    /// Record-based HDF4 scientific dataset container.
    Legacy,
    /// Hierarchical HDF5 container.
    Modern,
}

impl FileFormat {
    /// Determine the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some(LEGACY_EXTENSION) => Ok(Self::Legacy),
            Some(MODERN_EXTENSION) => Ok(Self::Modern),
            _ => Err(PsiIoError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// The file extension (without the dot) of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Legacy => LEGACY_EXTENSION,
            Self::Modern => MODERN_EXTENSION,
        }
    }

    /// Get the format name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "hdf4",
            Self::Modern => "hdf5",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Call `legacy` or `modern` with `path` depending on its extension.
///
/// Arguments other than the path are forwarded by capturing them in the
/// closures. The result of the selected closure is returned unchanged.
pub fn dispatch<R>(
    path: &Path,
    legacy: impl FnOnce(&Path) -> R,
    modern: impl FnOnce(&Path) -> R,
) -> Result<R> {
    match FileFormat::from_path(path)? {
        FileFormat::Legacy => Ok(legacy(path)),
        FileFormat::Modern => Ok(modern(path)),
    }
}
