//! Radius / co-latitude / longitude metadata.

use crate::backend::{AxisRange, Source};
use crate::config::FormatIds;
use crate::error::{PsiIoError, Result};
use crate::meta;
use crate::types::{AxisExtent, RtpMeta};

/// Axis extents of the primary dataset of an RTP grid.
///
/// Lengths come from the scales when the dataset has them and from the
/// reversed on-disk shape otherwise, so `r` is always the fastest-varying
/// axis regardless of the container format. With scales, the physical bounds
/// of each axis are read from its two end samples.
pub(crate) fn read_rtp_meta(source: &Source, ids: &FormatIds, dataset_id: &str) -> Result<RtpMeta> {
    let (shape, _) = source.shape_and_type(dataset_id)?;
    if shape.len() != 3 {
        return Err(PsiIoError::DimensionMismatch {
            expected: 3,
            actual: shape.len(),
        });
    }

    let described = meta::describe(source, ids, dataset_id)?;
    let mut extents = Vec::with_capacity(3);
    if described.has_scales() {
        for (physical, scale) in meta::physical_scales(&described, ids).iter().enumerate() {
            let axis = shape.len() - 1 - physical;
            let n = scale.len();
            let first = source.read_scale_range(dataset_id, axis, AxisRange::new(0, 1))?;
            let last = source.read_scale_range(dataset_id, axis, AxisRange::new(n - 1, n))?;
            let extent = match (first.first(), last.first()) {
                (Some(&a), Some(&b)) => AxisExtent::new(n).with_scale_ends(a, b),
                _ => {
                    return Err(PsiIoError::invalid_metadata(format!(
                        "scale {} of {dataset_id} returned no samples",
                        scale.name
                    )))
                }
            };
            extents.push(extent);
        }
    } else {
        extents.extend(shape.iter().rev().map(|&n| AxisExtent::new(n)));
    }

    Ok(RtpMeta {
        r: extents[0],
        t: extents[1],
        p: extents[2],
    })
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

    fn rtp_dataset(names: [&str; 3], scaled: bool) -> MemoryDataset {
        let shape = [181, 100, 151];
        let mut ds = MemoryDataset::new(DataType::Float32, ArrayD::zeros(IxDyn(&shape)));
        if scaled {
            // p, t, r in on-disk order
            let ends = [(0.0, 6.2832), (0.0157, 3.1259), (0.99956, 30.5116)];
            for (axis, ((&len, name), (a, b))) in shape.iter().zip(names).zip(ends).enumerate() {
                let values = Array1::linspace(a, b, len);
                ds = ds.with_scale(axis, MemoryScale::new(name, DataType::Float32, values));
            }
        }
        ds
    }

    #[test]
    fn test_rtp_meta_both_formats() {
        let ids = IdentifierTable::default();
        let backend = MemoryBackend::new();
        backend.insert(
            "br.hdf",
            MemoryFile::new().with_dataset(
                "Data-Set-2",
                rtp_dataset(["fakeDim0", "fakeDim1", "fakeDim2"], true),
            ),
        );
        backend.insert(
            "br.h5",
            MemoryFile::new().with_dataset("Data", rtp_dataset(["dim3", "dim2", "dim1"], true)),
        );

        for (format, name) in [(FileFormat::Legacy, "br.hdf"), (FileFormat::Modern, "br.h5")] {
            let fids = ids.get(format);
            let source = Source::open(&backend, format, Path::new(name), fids).unwrap();
            let rtp = read_rtp_meta(&source, fids, &fids.dataset_id).unwrap();
            assert_eq!(rtp.r.as_tuple(), (151, 0, 150), "{name}");
            assert_eq!(rtp.t.as_tuple(), (100, 0, 99), "{name}");
            assert_eq!(rtp.p.as_tuple(), (181, 0, 180), "{name}");

            for (extent, (min, max)) in [
                (rtp.r, (0.99956, 30.5116)),
                (rtp.t, (0.0157, 3.1259)),
                (rtp.p, (0.0, 6.2832)),
            ] {
                let (lo, hi) = extent.bounds().unwrap();
                assert!((lo - min).abs() < 1e-9 && (hi - max).abs() < 1e-9, "{name}");
            }
        }

        // two one-sample reads per axis, no element data
        let stats = backend.stats();
        assert_eq!(stats.scale_reads, 2 * 3 * 2);
        assert_eq!(stats.scale_elements_read, 2 * 3 * 2);
        assert_eq!(stats.hyperslab_reads, 0);
    }

    #[test]
    fn test_rtp_meta_without_scales() {
        let ids = IdentifierTable::default();
        let backend = MemoryBackend::new();
        backend.insert(
            "br.h5",
            MemoryFile::new().with_dataset("Data", rtp_dataset(["", "", ""], false)),
        );

        let source =
            Source::open(&backend, FileFormat::Modern, Path::new("br.h5"), &ids.modern).unwrap();
        let rtp = read_rtp_meta(&source, &ids.modern, "Data").unwrap();
        assert_eq!(rtp.r.n, 151);
        assert_eq!(rtp.p.n, 181);
        assert_eq!(rtp.r.bounds(), None);
        assert_eq!(backend.stats().scale_reads, 0);
    }

    #[test]
    fn test_rtp_meta_rejects_other_ranks() {
        let ids = IdentifierTable::default();
        let backend = MemoryBackend::new();
        backend.insert(
            "br.h5",
            MemoryFile::new().with_dataset(
                "Data",
                MemoryDataset::new(DataType::Float32, ArrayD::zeros(IxDyn(&[13, 11]))),
            ),
        );

        let source =
            Source::open(&backend, FileFormat::Modern, Path::new("br.h5"), &ids.modern).unwrap();
        let err = read_rtp_meta(&source, &ids.modern, "Data").unwrap_err();
        assert!(matches!(
            err,
            PsiIoError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(backend.stats().hyperslab_reads, 0);
    }
}
