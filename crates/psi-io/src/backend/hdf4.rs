//! Legacy (HDF4 SD) backend.
//!
//! libnetcdf built with HDF4 support exposes the scientific datasets of an
//! HDF4 file as variables. The dimension scale of an axis, when present, is
//! the 1-D coordinate variable named after that axis's dimension. Only
//! dimensions named `<scale prefix><ordinal>` (`fakeDim0`, `fakeDim1`, ... in
//! on-disk order by default) are considered.
//!
//! System requirements: libnetcdf configured with `--enable-hdf4`.

use std::path::Path;

use ndarray::{Array1, ArrayD, IxDyn};
use netcdf::types::{FloatType, IntType, NcVariableType};

use super::{AxisRange, Backend, BackendResult, Driver, ScaleInfo};
use crate::config::FormatIds;
use crate::error::BackendError;
use crate::types::DataType;

/// Backend reading `.hdf` files through libnetcdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hdf4Backend;

impl Hdf4Backend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for Hdf4Backend {
    fn open(&self, path: &Path, ids: &FormatIds) -> BackendResult<Box<dyn Driver>> {
        let file = netcdf::open(path)
            .map_err(|e| BackendError::io(format!("failed to open {}: {e}", path.display())))?;

        Ok(Box::new(Hdf4Handle {
            file,
            ids: ids.clone(),
        }))
    }
}

struct Hdf4Handle {
    file: netcdf::File,
    ids: FormatIds,
}

impl Hdf4Handle {
    fn variable(&self, id: &str) -> BackendResult<netcdf::Variable<'_>> {
        self.file
            .variable(id)
            .ok_or_else(|| BackendError::not_found(format!("dataset {id}")))
    }

    /// The coordinate variable of storage `axis`, if the file has one.
    fn scale_variable(&self, id: &str, axis: usize) -> BackendResult<Option<netcdf::Variable<'_>>> {
        let var = self.variable(id)?;
        let dims = var.dimensions();
        let dim = dims.get(axis).ok_or_else(|| {
            BackendError::io(format!(
                "axis {axis} out of range for {}-dimensional dataset {id}",
                dims.len()
            ))
        })?;

        let name = dim.name();
        if !self.ids.is_scale_name(&name) {
            return Ok(None);
        }
        Ok(self
            .file
            .variable(&name)
            .filter(|scale| scale.dimensions().len() == 1))
    }
}

impl Driver for Hdf4Handle {
    fn list_datasets(&self) -> BackendResult<Vec<String>> {
        Ok(self.file.variables().map(|v| v.name()).collect())
    }

    fn shape_and_type(&self, id: &str) -> BackendResult<(Vec<usize>, DataType)> {
        let var = self.variable(id)?;
        let shape = var.dimensions().iter().map(|d| d.len()).collect();
        Ok((shape, element_type(&var)?))
    }

    fn scale(&self, id: &str, axis: usize) -> BackendResult<Option<ScaleInfo>> {
        match self.scale_variable(id, axis)? {
            Some(scale) => Ok(Some(ScaleInfo {
                name: scale.name(),
                len: scale.len(),
                dtype: element_type(&scale)?,
            })),
            None => Ok(None),
        }
    }

    fn read_hyperslab(&self, id: &str, selection: &[AxisRange]) -> BackendResult<ArrayD<f64>> {
        let var = self.variable(id)?;
        let extents: Vec<netcdf::Extent> = selection
            .iter()
            .map(|r| (r.start..r.stop).into())
            .collect();
        let shape: Vec<usize> = selection.iter().map(AxisRange::len).collect();

        let values: Vec<f64> = var
            .get_values(extents)
            .map_err(|e| BackendError::io(format!("failed to read {id}: {e}")))?;

        ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map_err(|e| BackendError::io(format!("unexpected slab size for {id}: {e}")))
    }

    fn read_scale_range(
        &self,
        id: &str,
        axis: usize,
        range: AxisRange,
    ) -> BackendResult<Array1<f64>> {
        let scale = self
            .scale_variable(id, axis)?
            .ok_or_else(|| BackendError::not_found(format!("scale {axis} of dataset {id}")))?;

        let values: Vec<f64> = scale
            .get_values(range.start..range.stop)
            .map_err(|e| BackendError::io(format!("failed to read scale {axis} of {id}: {e}")))?;

        Ok(Array1::from(values))
    }
}

fn element_type(var: &netcdf::Variable<'_>) -> BackendResult<DataType> {
    match var.vartype() {
        NcVariableType::Int(IntType::I8) => Ok(DataType::Int8),
        NcVariableType::Int(IntType::U8) => Ok(DataType::UInt8),
        NcVariableType::Int(IntType::I16) => Ok(DataType::Int16),
        NcVariableType::Int(IntType::U16) => Ok(DataType::UInt16),
        NcVariableType::Int(IntType::I32) => Ok(DataType::Int32),
        NcVariableType::Int(IntType::U32) => Ok(DataType::UInt32),
        NcVariableType::Int(IntType::I64) => Ok(DataType::Int64),
        NcVariableType::Int(IntType::U64) => Ok(DataType::UInt64),
        NcVariableType::Float(FloatType::F32) => Ok(DataType::Float32),
        NcVariableType::Float(FloatType::F64) => Ok(DataType::Float64),
        other => Err(BackendError::io(format!(
            "unsupported element type {other:?} of {}",
            var.name()
        ))),
    }
}
