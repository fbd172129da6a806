//! Per-format naming conventions for datasets and scales.

use serde::{Deserialize, Serialize};

use crate::error::{PsiIoError, Result};
use crate::format::FileFormat;

/// Order in which a format lists the scales of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleOrder {
    /// Scales follow the on-disk axis order (slowest-varying axis first).
    Storage,
    /// Scales follow the reverse of the on-disk axis order.
    Reversed,
}

impl ScaleOrder {
    /// Map a storage axis to its position in a scale listing of `ndim` axes.
    pub fn listing_position(&self, storage_axis: usize, ndim: usize) -> usize {
        match self {
            Self::Storage => storage_axis,
            Self::Reversed => ndim - 1 - storage_axis,
        }
    }

    /// Reorder a scale listing into physical order (fastest-varying axis first).
    pub fn to_physical<T: Clone>(&self, listed: &[T]) -> Vec<T> {
        match self {
            Self::Storage => listed.iter().rev().cloned().collect(),
            Self::Reversed => listed.to_vec(),
        }
    }
}

/// Naming convention of one container format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatIds {
    /// Name of the primary dataset.
    pub dataset_id: String,
    /// Prefix of scale names; the ordinal follows it.
    pub scale_prefix: String,
    /// Order in which scales are listed in metadata.
    pub scale_order: ScaleOrder,
}

impl FormatIds {
    /// Whether `name` follows this format's scale naming convention.
    pub fn is_scale_name(&self, name: &str) -> bool {
        name.strip_prefix(self.scale_prefix.as_str())
            .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
    }
}

/// Default identifiers for both formats.
///
/// The table is immutable once built and is handed to the reader explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierTable {
    /// Legacy (HDF4) conventions.
    pub legacy: FormatIds,
    /// Modern (HDF5) conventions.
    pub modern: FormatIds,
}

impl Default for IdentifierTable {
    fn default() -> Self {
        Self {
            legacy: FormatIds {
                dataset_id: "Data-Set-2".to_string(),
                scale_prefix: "fakeDim".to_string(),
                scale_order: ScaleOrder::Storage,
            },
            modern: FormatIds {
                dataset_id: "Data".to_string(),
                scale_prefix: "dim".to_string(),
                scale_order: ScaleOrder::Reversed,
            },
        }
    }
}

impl IdentifierTable {
    /// Load the table from environment variables, falling back to the defaults.
    pub fn from_env() -> Self {
        let mut table = Self::default();

        if let Ok(val) = std::env::var("PSI_IO_LEGACY_DATASET_ID") {
            table.legacy.dataset_id = val;
        }

        if let Ok(val) = std::env::var("PSI_IO_LEGACY_SCALE_PREFIX") {
            table.legacy.scale_prefix = val;
        }

        if let Ok(val) = std::env::var("PSI_IO_MODERN_DATASET_ID") {
            table.modern.dataset_id = val;
        }

        if let Ok(val) = std::env::var("PSI_IO_MODERN_SCALE_PREFIX") {
            table.modern.scale_prefix = val;
        }

        table
    }

    /// Validate the table.
    pub fn validate(&self) -> Result<()> {
        for (format, ids) in [
            (FileFormat::Legacy, &self.legacy),
            (FileFormat::Modern, &self.modern),
        ] {
            if ids.dataset_id.is_empty() {
                return Err(PsiIoError::Config(format!(
                    "{format} dataset id must not be empty"
                )));
            }
            if ids.scale_prefix.is_empty() {
                return Err(PsiIoError::Config(format!(
                    "{format} scale prefix must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Conventions for `format`.
    pub fn get(&self, format: FileFormat) -> &FormatIds {
        match format {
            FileFormat::Legacy => &self.legacy,
            FileFormat::Modern => &self.modern,
        }
    }
}
