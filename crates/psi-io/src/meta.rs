//! Metadata reader.
//!
//! Builds [`DatasetMeta`] from shape, element type and scale information
//! without reading any element data.

use tracing::{debug, warn};

use crate::backend::{ScaleInfo, Source};
use crate::config::FormatIds;
use crate::error::Result;
use crate::types::{DatasetMeta, ScaleMeta};

/// Describe one dataset.
///
/// Scales are listed in the format's listing order. A scale that is empty or
/// whose length differs from its axis is treated as absent, and a dataset
/// whose axes carry scales only partially is reported without scales.
pub fn describe(source: &Source, ids: &FormatIds, id: &str) -> Result<DatasetMeta> {
    let (shape, dtype) = source.shape_and_type(id)?;
    let ndim = shape.len();

    let mut found: Vec<Option<ScaleInfo>> = Vec::with_capacity(ndim);
    for (axis, &len) in shape.iter().enumerate() {
        let scale = source.scale(id, axis)?.filter(|info| {
            let fits = info.len == len && len > 0;
            if !fits {
                warn!(
                    path = %source.path().display(),
                    dataset = id,
                    axis,
                    scale = %info.name,
                    scale_len = info.len,
                    axis_len = len,
                    "Scale does not match its axis, ignoring it"
                );
            }
            fits
        });
        found.push(scale);
    }

    let present = found.iter().filter(|s| s.is_some()).count();
    let scales = if present == ndim && ndim > 0 {
        let mut listed: Vec<Option<ScaleMeta>> = vec![None; ndim];
        for (axis, info) in found.into_iter().enumerate() {
            if let Some(info) = info {
                let pos = ids.scale_order.listing_position(axis, ndim);
                listed[pos] = Some(ScaleMeta::new(info.name, info.len, info.dtype));
            }
        }
        listed.into_iter().flatten().collect()
    } else {
        if present > 0 {
            warn!(
                path = %source.path().display(),
                dataset = id,
                present,
                ndim,
                "Dataset has scales on only some axes, ignoring them"
            );
        }
        Vec::new()
    };

    debug!(
        path = %source.path().display(),
        dataset = id,
        shape = ?shape,
        dtype = %dtype,
        scales = scales.len(),
        "Read dataset metadata"
    );

    Ok(DatasetMeta {
        name: id.to_string(),
        shape,
        dtype,
        scales,
    })
}

/// Read metadata for `dataset_id`, or for every top-level dataset when `None`.
///
/// Without an explicit id the primary dataset comes first, followed by the
/// remaining datasets that are not scales. With an explicit id only that
/// dataset is described; a missing id surfaces as the backend's not-found
/// error.
pub fn read_meta(
    source: &Source,
    ids: &FormatIds,
    dataset_id: Option<&str>,
) -> Result<Vec<DatasetMeta>> {
    if let Some(id) = dataset_id {
        return Ok(vec![describe(source, ids, id)?]);
    }

    let primary = describe(source, ids, &ids.dataset_id)?;
    let mut metas = Vec::new();

    for name in source.list_datasets()? {
        if name == primary.name
            || ids.is_scale_name(&name)
            || primary.scales.iter().any(|s| s.name == name)
        {
            continue;
        }
        metas.push(describe(source, ids, &name)?);
    }

    metas.insert(0, primary);
    Ok(metas)
}

/// Scales of `meta` in physical order (fastest-varying axis first).
pub fn physical_scales(meta: &DatasetMeta, ids: &FormatIds) -> Vec<ScaleMeta> {
    ids.scale_order.to_physical(&meta.scales)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, MemoryDataset, MemoryFile, MemoryScale};
    use crate::config::IdentifierTable;
    use crate::format::FileFormat;
    use crate::types::DataType;
    use ndarray::{Array1, ArrayD, IxDyn};
    use std::path::Path;

    fn grid(shape: &[usize]) -> ArrayD<f64> {
        ArrayD::zeros(IxDyn(shape))
    }

    fn scale(name: &str, len: usize) -> MemoryScale {
        MemoryScale::new(name, DataType::Float32, Array1::range(0.0, len as f64, 1.0))
    }

    #[test]
    fn test_modern_scales_are_reversed() {
        let ids = IdentifierTable::default();
        let ds = MemoryDataset::new(DataType::Float64, grid(&[13, 11]))
            .with_scale(0, scale("dim2", 13))
            .with_scale(1, scale("dim1", 11));
        let backend = MemoryBackend::new();
        backend.insert("f.h5", MemoryFile::new().with_dataset("Data", ds));

        let source =
            Source::open(&backend, FileFormat::Modern, Path::new("f.h5"), &ids.modern).unwrap();
        let metas = read_meta(&source, &ids.modern, None).unwrap();

        assert_eq!(metas.len(), 1);
        let names: Vec<_> = metas[0].scales.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["dim1", "dim2"]);
        assert_eq!(metas[0].scales[0].shape, [11]);
        assert_eq!(metas[0].shape, vec![13, 11]);
    }

    #[test]
    fn test_legacy_scales_follow_storage() {
        let ids = IdentifierTable::default();
        let ds = MemoryDataset::new(DataType::Float32, grid(&[13, 11]))
            .with_scale(0, scale("fakeDim0", 13))
            .with_scale(1, scale("fakeDim1", 11));
        let backend = MemoryBackend::new();
        backend.insert("f.hdf", MemoryFile::new().with_dataset("Data-Set-2", ds));

        let source =
            Source::open(&backend, FileFormat::Legacy, Path::new("f.hdf"), &ids.legacy).unwrap();
        let metas = read_meta(&source, &ids.legacy, None).unwrap();

        let names: Vec<_> = metas[0].scales.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["fakeDim0", "fakeDim1"]);

        let physical: Vec<_> = physical_scales(&metas[0], &ids.legacy)
            .into_iter()
            .map(|s| s.len())
            .collect();
        assert_eq!(physical, [11, 13]);
    }

    #[test]
    fn test_partial_scales_are_dropped() {
        let ids = IdentifierTable::default();
        let ds = MemoryDataset::new(DataType::Float64, grid(&[13, 11]))
            .with_scale(1, scale("dim1", 11));
        let backend = MemoryBackend::new();
        backend.insert("f.h5", MemoryFile::new().with_dataset("Data", ds));

        let source =
            Source::open(&backend, FileFormat::Modern, Path::new("f.h5"), &ids.modern).unwrap();
        let metas = read_meta(&source, &ids.modern, None).unwrap();
        assert!(metas[0].scales.is_empty());
    }

    #[test]
    fn test_mismatched_scale_is_dropped() {
        let ids = IdentifierTable::default();
        let ds = MemoryDataset::new(DataType::Float64, grid(&[13, 11]))
            .with_scale(0, scale("dim2", 13))
            .with_scale(1, scale("dim1", 20));
        let backend = MemoryBackend::new();
        backend.insert("f.h5", MemoryFile::new().with_dataset("Data", ds));

        let source =
            Source::open(&backend, FileFormat::Modern, Path::new("f.h5"), &ids.modern).unwrap();
        let meta = describe(&source, &ids.modern, "Data").unwrap();
        assert_eq!(meta.shape, vec![13, 11]);
        assert!(meta.scales.is_empty());
    }

    #[test]
    fn test_empty_scale_is_dropped() {
        let ids = IdentifierTable::default();
        let ds = MemoryDataset::new(DataType::Float64, grid(&[0]))
            .with_scale(0, scale("fakeDim0", 0));
        let backend = MemoryBackend::new();
        backend.insert("f.hdf", MemoryFile::new().with_dataset("Data-Set-2", ds));

        let source =
            Source::open(&backend, FileFormat::Legacy, Path::new("f.hdf"), &ids.legacy).unwrap();
        let meta = describe(&source, &ids.legacy, "Data-Set-2").unwrap();
        assert_eq!(meta.shape, vec![0]);
        assert!(meta.scales.is_empty());
    }

    #[test]
    fn test_listing_skips_scale_datasets() {
        let ids = IdentifierTable::default();
        let file = MemoryFile::new()
            .with_dataset("dim1", MemoryDataset::new(DataType::Float32, grid(&[11])))
            .with_dataset("Extra", MemoryDataset::new(DataType::Int16, grid(&[5, 3])))
            .with_dataset("Data", MemoryDataset::new(DataType::Float32, grid(&[11])));
        let backend = MemoryBackend::new();
        backend.insert("f.h5", file);

        let source =
            Source::open(&backend, FileFormat::Modern, Path::new("f.h5"), &ids.modern).unwrap();

        let names: Vec<_> = read_meta(&source, &ids.modern, None)
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["Data", "Extra"]);

        let only = read_meta(&source, &ids.modern, Some("Extra")).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].dtype, DataType::Int16);

        let err = read_meta(&source, &ids.modern, Some("NULL")).unwrap_err();
        assert!(err.is_not_found());
    }
}
