//! Mock PSI files for psi-io tests.
//!
//! Every mock file is registered in a [`MemoryBackend`] under a path with the
//! extension of its format, laid out the way real files of that format are:
//!
//! - legacy (`.hdf`): primary dataset `Data-Set-2`, scale `fakeDim{k}` on
//!   on-disk axis `k`
//! - modern (`.h5`): primary dataset `Data`, scale `dim{n - k}` on on-disk
//!   axis `k`, each scale also stored as a top-level dataset

use std::path::PathBuf;
use std::sync::Arc;

use psi_io::{
    DataType, FileFormat, HdfReader, IdentifierTable, MemoryBackend, MemoryDataset, MemoryFile,
    MemoryScale,
};

use crate::generators::{
    create_mock_data, create_mock_scales, create_rtp_field, create_rtp_scales,
};

/// Element types covered by the mock files.
pub const DATATYPES: [DataType; 4] = [
    DataType::Float32,
    DataType::Float64,
    DataType::Int16,
    DataType::Int32,
];

/// Dimensionalities covered by the mock files.
pub const DIMENSIONALITIES: [usize; 3] = [1, 2, 3];

/// Both container formats.
pub const FORMATS: [FileFormat; 2] = [FileFormat::Legacy, FileFormat::Modern];

/// Path of a mock file, e.g. `mock/mock_float32_3d_withscales.hdf`.
pub fn mock_path(format: FileFormat, dtype: DataType, ndim: usize, scales: bool) -> PathBuf {
    let kind = if scales { "withscales" } else { "noscales" };
    PathBuf::from("mock").join(format!(
        "mock_{dtype}_{ndim}d_{kind}.{}",
        format.extension()
    ))
}

/// Path of the RTP mock file of `format`.
pub fn rtp_path(format: FileFormat) -> PathBuf {
    PathBuf::from("mock").join(format!("br_rtp.{}", format.extension()))
}

/// Name of the scale on on-disk `axis` of a rank-`ndim` dataset.
pub fn scale_name(format: FileFormat, axis: usize, ndim: usize) -> String {
    let ids = IdentifierTable::default();
    match format {
        FileFormat::Legacy => format!("{}{}", ids.legacy.scale_prefix, axis),
        FileFormat::Modern => format!("{}{}", ids.modern.scale_prefix, ndim - axis),
    }
}

/// Build a mock file holding `data` with optional physical-order `scales`.
pub fn build_mock_file(
    format: FileFormat,
    dtype: DataType,
    data: ndarray::ArrayD<f64>,
    scales: Option<Vec<ndarray::Array1<f64>>>,
) -> MemoryFile {
    let ids = IdentifierTable::default();
    let ndim = data.ndim();
    let mut dataset = MemoryDataset::new(dtype, data);
    let mut scale_datasets = Vec::new();

    if let Some(scales) = scales {
        for (physical, values) in scales.into_iter().enumerate() {
            let axis = ndim - 1 - physical;
            let name = scale_name(format, axis, ndim);
            if format == FileFormat::Modern {
                scale_datasets.push((
                    name.clone(),
                    MemoryDataset::new(dtype, values.clone().into_dyn()),
                ));
            }
            dataset = dataset.with_scale(axis, MemoryScale::new(name, dtype, values));
        }
    }

    let mut file = MemoryFile::new().with_dataset(ids.get(format).dataset_id.clone(), dataset);
    scale_datasets.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, ds) in scale_datasets {
        file = file.with_dataset(name, ds);
    }
    file
}

/// Mock file of index-sum data with prime-sized axes.
pub fn mock_file(format: FileFormat, dtype: DataType, ndim: usize, scales: bool) -> MemoryFile {
    let scales = scales.then(|| create_mock_scales(ndim));
    build_mock_file(format, dtype, create_mock_data(ndim), scales)
}

/// RTP mock file: on-disk shape (181, 100, 151) with a linear field.
pub fn rtp_file(format: FileFormat) -> MemoryFile {
    build_mock_file(
        format,
        DataType::Float32,
        create_rtp_field(),
        Some(create_rtp_scales().to_vec()),
    )
}

/// Backend holding every mock file of both formats plus the RTP files.
pub fn mock_backend() -> Arc<MemoryBackend> {
    let backend = MemoryBackend::new();
    for format in FORMATS {
        for dtype in DATATYPES {
            for ndim in DIMENSIONALITIES {
                for scales in [true, false] {
                    backend.insert(
                        mock_path(format, dtype, ndim, scales),
                        mock_file(format, dtype, ndim, scales),
                    );
                }
            }
        }
        backend.insert(rtp_path(format), rtp_file(format));
    }
    Arc::new(backend)
}

/// Reader serving both formats from `backend` with the default identifiers.
pub fn mock_reader(backend: &Arc<MemoryBackend>) -> HdfReader {
    HdfReader::with_backend(IdentifierTable::default(), backend.clone())
}
