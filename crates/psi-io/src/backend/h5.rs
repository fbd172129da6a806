//! Modern (HDF5) backend.
//!
//! Scales are stored as 1-D datasets next to the primary dataset and named
//! `<prefix><ordinal>`, where ordinal 1 belongs to the fastest-varying axis.

use std::path::Path;

use hdf5::types::{FloatSize, IntSize, TypeDescriptor};
use ndarray::{Array1, ArrayD, IxDyn, SliceInfo, SliceInfoElem};

use super::{AxisRange, Backend, BackendResult, Driver, ScaleInfo};
use crate::config::FormatIds;
use crate::error::BackendError;
use crate::types::DataType;

/// Backend reading `.h5` files through libhdf5.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hdf5Backend;

impl Hdf5Backend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for Hdf5Backend {
    fn open(&self, path: &Path, ids: &FormatIds) -> BackendResult<Box<dyn Driver>> {
        let file = hdf5::File::open(path)
            .map_err(|e| BackendError::io(format!("failed to open {}: {e}", path.display())))?;

        Ok(Box::new(Hdf5Handle {
            file,
            scale_prefix: ids.scale_prefix.clone(),
        }))
    }
}

struct Hdf5Handle {
    file: hdf5::File,
    scale_prefix: String,
}

impl Hdf5Handle {
    fn dataset(&self, id: &str) -> BackendResult<hdf5::Dataset> {
        if !self.file.link_exists(id) {
            return Err(BackendError::not_found(format!("dataset {id}")));
        }
        self.file
            .dataset(id)
            .map_err(|e| BackendError::io(format!("failed to open dataset {id}: {e}")))
    }

    /// Name of the scale dataset belonging to storage `axis` of a rank-`ndim` dataset.
    fn scale_name(&self, axis: usize, ndim: usize) -> String {
        format!("{}{}", self.scale_prefix, ndim - axis)
    }

    fn scale_dataset(&self, id: &str, axis: usize) -> BackendResult<Option<hdf5::Dataset>> {
        let ndim = self.dataset(id)?.ndim();
        if axis >= ndim {
            return Err(BackendError::io(format!(
                "axis {axis} out of range for {ndim}-dimensional dataset {id}"
            )));
        }

        let name = self.scale_name(axis, ndim);
        if !self.file.link_exists(&name) {
            return Ok(None);
        }
        let scale = self
            .file
            .dataset(&name)
            .map_err(|e| BackendError::io(format!("failed to open scale {name}: {e}")))?;
        if scale.ndim() != 1 {
            return Ok(None);
        }
        Ok(Some(scale))
    }
}

impl Driver for Hdf5Handle {
    fn list_datasets(&self) -> BackendResult<Vec<String>> {
        let names = self
            .file
            .member_names()
            .map_err(|e| BackendError::io(format!("failed to list members: {e}")))?;

        Ok(names
            .into_iter()
            .filter(|name| self.file.dataset(name).is_ok())
            .collect())
    }

    fn shape_and_type(&self, id: &str) -> BackendResult<(Vec<usize>, DataType)> {
        let ds = self.dataset(id)?;
        Ok((ds.shape(), element_type(&ds)?))
    }

    fn scale(&self, id: &str, axis: usize) -> BackendResult<Option<ScaleInfo>> {
        let ndim = self.dataset(id)?.ndim();
        match self.scale_dataset(id, axis)? {
            Some(scale) => Ok(Some(ScaleInfo {
                name: self.scale_name(axis, ndim),
                len: scale.size(),
                dtype: element_type(&scale)?,
            })),
            None => Ok(None),
        }
    }

    fn read_hyperslab(&self, id: &str, selection: &[AxisRange]) -> BackendResult<ArrayD<f64>> {
        let ds = self.dataset(id)?;
        let elems: Vec<SliceInfoElem> = selection
            .iter()
            .map(|r| SliceInfoElem::from(r.start..r.stop))
            .collect();
        let info = SliceInfo::<_, IxDyn, IxDyn>::try_from(elems)
            .map_err(|e| BackendError::io(format!("invalid selection for {id}: {e}")))?;

        ds.read_slice::<f64, _, IxDyn>(info)
            .map_err(|e| BackendError::io(format!("failed to read {id}: {e}")))
    }

    fn read_scale_range(
        &self,
        id: &str,
        axis: usize,
        range: AxisRange,
    ) -> BackendResult<Array1<f64>> {
        let scale = self
            .scale_dataset(id, axis)?
            .ok_or_else(|| BackendError::not_found(format!("scale {axis} of dataset {id}")))?;

        scale
            .read_slice_1d::<f64, _>(ndarray::s![range.start..range.stop])
            .map_err(|e| BackendError::io(format!("failed to read scale {axis} of {id}: {e}")))
    }
}

fn element_type(ds: &hdf5::Dataset) -> BackendResult<DataType> {
    let descriptor = ds
        .dtype()
        .and_then(|t| t.to_descriptor())
        .map_err(|e| BackendError::io(format!("failed to read element type: {e}")))?;

    match descriptor {
        TypeDescriptor::Integer(IntSize::U1) => Ok(DataType::Int8),
        TypeDescriptor::Integer(IntSize::U2) => Ok(DataType::Int16),
        TypeDescriptor::Integer(IntSize::U4) => Ok(DataType::Int32),
        TypeDescriptor::Integer(IntSize::U8) => Ok(DataType::Int64),
        TypeDescriptor::Unsigned(IntSize::U1) => Ok(DataType::UInt8),
        TypeDescriptor::Unsigned(IntSize::U2) => Ok(DataType::UInt16),
        TypeDescriptor::Unsigned(IntSize::U4) => Ok(DataType::UInt32),
        TypeDescriptor::Unsigned(IntSize::U8) => Ok(DataType::UInt64),
        TypeDescriptor::Float(FloatSize::U4) => Ok(DataType::Float32),
        TypeDescriptor::Float(FloatSize::U8) => Ok(DataType::Float64),
        other => Err(BackendError::io(format!(
            "unsupported element type {other:?}"
        ))),
    }
}
