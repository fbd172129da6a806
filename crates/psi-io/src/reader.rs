//! Public reader.
//!
//! [`HdfReader`] owns the identifier table and one backend per container
//! format. Every operation opens its own handle, which is released before the
//! call returns, on success and on error alike.

use std::path::Path;
use std::sync::Arc;

use ndarray::{Array1, Array2, Array3, ArrayD, Dimension, Ix1, Ix2, Ix3};

use crate::backend::{Backend, Source};
use crate::config::{FormatIds, IdentifierTable};
use crate::error::{PsiIoError, Result};
use crate::format::{self, FileFormat};
use crate::select::{IndexSpec, ValueSpec};
use crate::slab::{self, Layout};
use crate::types::{DatasetMeta, RtpMeta, Slab};
use crate::{interp, meta, rtp};

/// Scales and data of a 1-D dataset.
pub type Data1d = (Array1<f64>, Array1<f64>);
/// Scales and data of a 2-D dataset.
pub type Data2d = (Array1<f64>, Array1<f64>, Array2<f64>);
/// Scales and data of a 3-D dataset.
pub type Data3d = (Array1<f64>, Array1<f64>, Array1<f64>, Array3<f64>);

/// Reader for PSI data files in either container format.
#[derive(Clone)]
pub struct HdfReader {
    ids: IdentifierTable,
    legacy: Option<Arc<dyn Backend>>,
    modern: Option<Arc<dyn Backend>>,
}

impl Default for HdfReader {
    fn default() -> Self {
        Self::new(IdentifierTable::default())
    }
}

impl std::fmt::Debug for HdfReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HdfReader")
            .field("ids", &self.ids)
            .field("legacy", &self.legacy.is_some())
            .field("modern", &self.modern.is_some())
            .finish()
    }
}

impl HdfReader {
    /// Create a reader using the backends compiled into the crate.
    pub fn new(ids: IdentifierTable) -> Self {
        Self {
            ids,
            legacy: compiled_legacy_backend(),
            modern: compiled_modern_backend(),
        }
    }

    /// Create a reader with the identifier table loaded from the environment.
    pub fn from_env() -> Result<Self> {
        let ids = IdentifierTable::from_env();
        ids.validate()?;
        Ok(Self::new(ids))
    }

    /// Create a reader with explicit backends.
    pub fn with_backends(
        ids: IdentifierTable,
        legacy: Option<Arc<dyn Backend>>,
        modern: Option<Arc<dyn Backend>>,
    ) -> Self {
        Self {
            ids,
            legacy,
            modern,
        }
    }

    /// Create a reader serving both formats from one backend.
    pub fn with_backend(ids: IdentifierTable, backend: Arc<dyn Backend>) -> Self {
        Self::with_backends(ids, Some(backend.clone()), Some(backend))
    }

    /// The identifier table in use.
    pub fn ids(&self) -> &IdentifierTable {
        &self.ids
    }

    /// Read dataset metadata.
    ///
    /// With `dataset_id = None` every top-level dataset is described, primary
    /// dataset first.
    pub fn read_meta(
        &self,
        path: impl AsRef<Path>,
        dataset_id: Option<&str>,
    ) -> Result<Vec<DatasetMeta>> {
        let (source, ids) = self.open(path.as_ref())?;
        meta::read_meta(&source, ids, dataset_id)
    }

    /// Read a whole dataset with its scales.
    pub fn read_data(&self, path: impl AsRef<Path>, dataset_id: Option<&str>) -> Result<Slab> {
        self.with_layout(path.as_ref(), dataset_id, |source, layout| {
            let selections = slab::select_by_index(layout, &vec![IndexSpec::All; layout.ndim()])?;
            slab::read_slab(source, layout, &selections)
        })
    }

    /// Read a whole dataset without touching its scales.
    pub fn read_data_no_scales(
        &self,
        path: impl AsRef<Path>,
        dataset_id: Option<&str>,
    ) -> Result<ArrayD<f64>> {
        self.with_layout(path.as_ref(), dataset_id, |source, layout| {
            let full = Layout {
                scaled: false,
                ..layout.clone()
            };
            let selections = slab::select_by_index(&full, &vec![IndexSpec::All; full.ndim()])?;
            Ok(slab::read_slab(source, &full, &selections)?.data)
        })
    }

    /// Read a 1-D primary dataset as `(x, f)`.
    pub fn read_1d(&self, path: impl AsRef<Path>) -> Result<Data1d> {
        let (scales, data) = self.read_ranked::<Ix1>(path.as_ref(), 1)?;
        let [x] = take_scales(scales)?;
        Ok((x, data))
    }

    /// Read a 2-D primary dataset as `(x, y, f)`.
    pub fn read_2d(&self, path: impl AsRef<Path>) -> Result<Data2d> {
        let (scales, data) = self.read_ranked::<Ix2>(path.as_ref(), 2)?;
        let [x, y] = take_scales(scales)?;
        Ok((x, y, data))
    }

    /// Read a 3-D primary dataset as `(x, y, z, f)`.
    pub fn read_3d(&self, path: impl AsRef<Path>) -> Result<Data3d> {
        let (scales, data) = self.read_ranked::<Ix3>(path.as_ref(), 3)?;
        let [x, y, z] = take_scales(scales)?;
        Ok((x, y, z, data))
    }

    /// Read the scale of a 1-D primary dataset.
    pub fn read_scales_1d(&self, path: impl AsRef<Path>) -> Result<Array1<f64>> {
        let [x] = take_scales(self.read_ranked_scales(path.as_ref(), 1)?)?;
        Ok(x)
    }

    /// Read the scales of a 2-D primary dataset.
    pub fn read_scales_2d(&self, path: impl AsRef<Path>) -> Result<(Array1<f64>, Array1<f64>)> {
        let [x, y] = take_scales(self.read_ranked_scales(path.as_ref(), 2)?)?;
        Ok((x, y))
    }

    /// Read the scales of a 3-D primary dataset.
    pub fn read_scales_3d(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<(Array1<f64>, Array1<f64>, Array1<f64>)> {
        let [x, y, z] = take_scales(self.read_ranked_scales(path.as_ref(), 3)?)?;
        Ok((x, y, z))
    }

    /// Read a slab by per-axis index requests given in physical order.
    pub fn read_by_index(
        &self,
        path: impl AsRef<Path>,
        dataset_id: Option<&str>,
        specs: &[IndexSpec],
    ) -> Result<Slab> {
        self.with_layout(path.as_ref(), dataset_id, |source, layout| {
            let selections = slab::select_by_index(layout, specs)?;
            slab::read_slab(source, layout, &selections)
        })
    }

    /// Read the slab bracketing per-axis scale values given in physical order.
    ///
    /// Each axis takes anything convertible to a [`ValueSpec`]: `None` for the
    /// whole axis, a value, or a `(min, max)` interval.
    pub fn read_by_value<V>(
        &self,
        path: impl AsRef<Path>,
        dataset_id: Option<&str>,
        values: &[V],
    ) -> Result<Slab>
    where
        V: Into<ValueSpec> + Copy,
    {
        let values: Vec<ValueSpec> = values.iter().map(|&v| v.into()).collect();
        self.with_layout(path.as_ref(), dataset_id, |source, layout| {
            let selections = slab::select_by_value(source, layout, &values)?;
            slab::read_slab(source, layout, &selections)
        })
    }

    /// Read the slab `[floor(v), ceil(v)]` for per-axis fractional indices.
    pub fn read_by_ivalue(
        &self,
        path: impl AsRef<Path>,
        dataset_id: Option<&str>,
        values: &[Option<f64>],
    ) -> Result<Slab> {
        self.with_layout(path.as_ref(), dataset_id, |source, layout| {
            let selections = slab::select_by_ivalue(layout, values)?;
            slab::read_slab(source, layout, &selections)
        })
    }

    /// Axis extents of a 3-D radius / co-latitude / longitude dataset.
    pub fn read_rtp_meta(&self, path: impl AsRef<Path>, dataset_id: Option<&str>) -> Result<RtpMeta> {
        let (source, ids) = self.open(path.as_ref())?;
        let id = dataset_id.unwrap_or(&ids.dataset_id);
        rtp::read_rtp_meta(&source, ids, id)
    }

    /// Interpolate a slice at a value on exactly one axis.
    pub fn interpolate_slice(
        &self,
        path: impl AsRef<Path>,
        dataset_id: Option<&str>,
        values: &[Option<f64>],
    ) -> Result<Slab> {
        self.with_layout(path.as_ref(), dataset_id, |source, layout| {
            interp::interpolate_slice(source, layout, values)
        })
    }

    /// Interpolate at scattered positions, one coordinate sequence per axis.
    pub fn interpolate_positions(
        &self,
        path: impl AsRef<Path>,
        dataset_id: Option<&str>,
        positions: &[&[f64]],
    ) -> Result<Vec<f64>> {
        self.with_layout(path.as_ref(), dataset_id, |source, layout| {
            interp::interpolate_positions(source, layout, positions)
        })
    }

    /// Interpolate a 3-D RTP dataset at `(r, t, p)` positions.
    pub fn interpolate_rtp(
        &self,
        path: impl AsRef<Path>,
        r: &[f64],
        t: &[f64],
        p: &[f64],
    ) -> Result<Vec<f64>> {
        self.with_layout(path.as_ref(), None, |source, layout| {
            if layout.ndim() != 3 {
                return Err(PsiIoError::DimensionMismatch {
                    expected: 3,
                    actual: layout.ndim(),
                });
            }
            interp::interpolate_positions(source, layout, &[r, t, p])
        })
    }

    fn open(&self, path: &Path) -> Result<(Source, &FormatIds)> {
        format::dispatch(
            path,
            |p| self.open_as(FileFormat::Legacy, p),
            |p| self.open_as(FileFormat::Modern, p),
        )?
    }

    fn open_as(&self, format: FileFormat, path: &Path) -> Result<(Source, &FormatIds)> {
        let backend = match format {
            FileFormat::Legacy => self.legacy.as_ref(),
            FileFormat::Modern => self.modern.as_ref(),
        }
        .ok_or(PsiIoError::BackendUnavailable(format))?;

        let ids = self.ids.get(format);
        let source = Source::open(backend.as_ref(), format, path, ids)?;
        Ok((source, ids))
    }

    fn with_layout<T>(
        &self,
        path: &Path,
        dataset_id: Option<&str>,
        f: impl FnOnce(&Source, &Layout) -> Result<T>,
    ) -> Result<T> {
        let (source, ids) = self.open(path)?;
        let id = dataset_id.unwrap_or(&ids.dataset_id);
        let layout = Layout::load(&source, ids, id)?;
        f(&source, &layout)
    }

    fn ranked_layout<T>(
        &self,
        path: &Path,
        rank: usize,
        f: impl FnOnce(&Source, &Layout) -> Result<T>,
    ) -> Result<T> {
        self.with_layout(path, None, |source, layout| {
            if layout.ndim() != rank {
                return Err(PsiIoError::DimensionMismatch {
                    expected: rank,
                    actual: layout.ndim(),
                });
            }
            f(source, layout)
        })
    }

    /// Scales (empty arrays when absent) and data of a dataset of `rank` dimensions.
    fn read_ranked<D: Dimension>(
        &self,
        path: &Path,
        rank: usize,
    ) -> Result<(Vec<Array1<f64>>, ndarray::Array<f64, D>)> {
        self.ranked_layout(path, rank, |source, layout| {
            let selections = slab::select_by_index(layout, &vec![IndexSpec::All; rank])?;
            let (data, mut scales) = slab::read_slab(source, layout, &selections)?.into_parts();
            if scales.is_empty() {
                scales = vec![Array1::zeros(0); rank];
            }
            let data = data
                .into_dimensionality::<D>()
                .map_err(|e| PsiIoError::invalid_metadata(e.to_string()))?;
            Ok((scales, data))
        })
    }

    fn read_ranked_scales(&self, path: &Path, rank: usize) -> Result<Vec<Array1<f64>>> {
        self.ranked_layout(path, rank, |source, layout| {
            let scales = slab::read_scales(source, layout)?;
            Ok(if scales.is_empty() {
                vec![Array1::zeros(0); rank]
            } else {
                scales
            })
        })
    }
}

fn take_scales<const N: usize>(scales: Vec<Array1<f64>>) -> Result<[Array1<f64>; N]> {
    scales
        .try_into()
        .map_err(|s: Vec<Array1<f64>>| {
            PsiIoError::invalid_metadata(format!("expected {N} scales, found {}", s.len()))
        })
}

#[cfg(feature = "netcdf")]
fn compiled_legacy_backend() -> Option<Arc<dyn Backend>> {
    Some(Arc::new(crate::backend::Hdf4Backend::new()))
}

#[cfg(not(feature = "netcdf"))]
fn compiled_legacy_backend() -> Option<Arc<dyn Backend>> {
    None
}

#[cfg(feature = "hdf5")]
fn compiled_modern_backend() -> Option<Arc<dyn Backend>> {
    Some(Arc::new(crate::backend::Hdf5Backend::new()))
}

#[cfg(not(feature = "hdf5"))]
fn compiled_modern_backend() -> Option<Arc<dyn Backend>> {
    None
}

// =============================================================================
// Free functions
// =============================================================================

/// Read metadata with the default reader.
pub fn read_hdf_meta(path: impl AsRef<Path>, dataset_id: Option<&str>) -> Result<Vec<DatasetMeta>> {
    HdfReader::default().read_meta(path, dataset_id)
}

/// Read a whole dataset with the default reader.
pub fn read_hdf_data(path: impl AsRef<Path>, dataset_id: Option<&str>) -> Result<Slab> {
    HdfReader::default().read_data(path, dataset_id)
}

/// Read by index with the default reader.
pub fn read_hdf_by_index(
    path: impl AsRef<Path>,
    dataset_id: Option<&str>,
    specs: &[IndexSpec],
) -> Result<Slab> {
    HdfReader::default().read_by_index(path, dataset_id, specs)
}

/// Read by value with the default reader.
pub fn read_hdf_by_value<V>(
    path: impl AsRef<Path>,
    dataset_id: Option<&str>,
    values: &[V],
) -> Result<Slab>
where
    V: Into<ValueSpec> + Copy,
{
    HdfReader::default().read_by_value(path, dataset_id, values)
}

/// Read by fractional index with the default reader.
pub fn read_hdf_by_ivalue(
    path: impl AsRef<Path>,
    dataset_id: Option<&str>,
    values: &[Option<f64>],
) -> Result<Slab> {
    HdfReader::default().read_by_ivalue(path, dataset_id, values)
}

/// Read RTP axis extents with the default reader.
pub fn read_rtp_meta(path: impl AsRef<Path>) -> Result<RtpMeta> {
    HdfReader::default().read_rtp_meta(path, None)
}

/// Interpolate a slice with the default reader.
pub fn interpolate_slice_from_hdf(
    path: impl AsRef<Path>,
    dataset_id: Option<&str>,
    values: &[Option<f64>],
) -> Result<Slab> {
    HdfReader::default().interpolate_slice(path, dataset_id, values)
}

/// Interpolate at scattered positions with the default reader.
pub fn interpolate_positions_from_hdf(
    path: impl AsRef<Path>,
    dataset_id: Option<&str>,
    positions: &[&[f64]],
) -> Result<Vec<f64>> {
    HdfReader::default().interpolate_positions(path, dataset_id, positions)
}
