//! Partial read tests: by index, by value and by fractional index.

use ndarray::{Axis, Ix3};
use psi_io::{DataType, FileFormat, IndexSpec, PsiIoError, ValueSpec};
use test_utils::{
    create_mock_data, create_mock_scales, mock_backend, mock_path, mock_reader, DATATYPES,
    DIMENSIONALITIES, FORMATS,
};

#[test]
fn test_read_data_matches_mock() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    for format in FORMATS {
        for dtype in DATATYPES {
            for ndim in DIMENSIONALITIES {
                let path = mock_path(format, dtype, ndim, true);
                let slab = reader.read_data(&path, None).unwrap();
                assert_eq!(slab.data, create_mock_data(ndim), "{path:?}");
                assert_eq!(slab.scales, create_mock_scales(ndim), "{path:?}");

                let path = mock_path(format, dtype, ndim, false);
                let slab = reader.read_data(&path, None).unwrap();
                assert_eq!(slab.data, create_mock_data(ndim));
                assert!(slab.scales.is_empty());
            }
        }
    }
}

#[test]
fn test_with_and_without_scales_agree() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    for format in FORMATS {
        let path = mock_path(format, DataType::Float64, 3, true);
        let with_scales = reader.read_data(&path, None).unwrap();
        let no_scales = reader.read_data_no_scales(&path, None).unwrap();
        assert_eq!(with_scales.data, no_scales);
    }
}

#[test]
fn test_read_data_no_scales_skips_scale_reads() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    reader
        .read_data_no_scales(mock_path(FileFormat::Modern, DataType::Float32, 3, true), None)
        .unwrap();
    let stats = backend.stats();
    assert_eq!(stats.hyperslab_reads, 1);
    assert_eq!(stats.scale_reads, 0);
}

#[test]
fn test_index_keeps_axis() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    for format in FORMATS {
        let path = mock_path(format, DataType::Int32, 3, true);
        let slab = reader
            .read_by_index(&path, None, &[IndexSpec::At(4), IndexSpec::All, IndexSpec::All])
            .unwrap();

        assert_eq!(slab.data.shape(), &[17, 13, 1]);
        assert_eq!(slab.data[[2, 3, 0]], 9.0);
        assert_eq!(slab.scales[0].to_vec(), vec![4.0]);
        assert_eq!(slab.scales[1].len(), 13);
        assert_eq!(slab.scales[2].len(), 17);
    }
}

#[test]
fn test_index_range_is_half_open() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    let path = mock_path(FileFormat::Legacy, DataType::Float32, 3, true);
    let slab = reader
        .read_by_index(&path, None, &[IndexSpec::All, IndexSpec::All, IndexSpec::Range(0, 5)])
        .unwrap();
    assert_eq!(slab.data.shape(), &[5, 13, 11]);
    assert_eq!(slab.scales[2].to_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_composed_index_reads_equal_full_read() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    for format in FORMATS {
        let path = mock_path(format, DataType::Float64, 3, true);
        let full = reader.read_data(&path, None).unwrap();

        for k in 0..11 {
            let slab = reader
                .read_by_index(&path, None, &[IndexSpec::At(k), IndexSpec::All, IndexSpec::All])
                .unwrap();
            assert_eq!(
                slab.data.index_axis(Axis(2), 0),
                full.data.index_axis(Axis(2), k)
            );
        }
    }
}

#[test]
fn test_index_out_of_bounds() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    for format in FORMATS {
        let path = mock_path(format, DataType::Float64, 2, true);
        for specs in [
            [IndexSpec::At(11), IndexSpec::All],
            [IndexSpec::All, IndexSpec::Range(10, 14)],
        ] {
            let err = reader.read_by_index(&path, None, &specs).unwrap_err();
            assert!(matches!(err, PsiIoError::IndexOutOfBounds { .. }));
        }

        let err = reader
            .read_by_index(&path, None, &[IndexSpec::All])
            .unwrap_err();
        assert!(matches!(err, PsiIoError::InvalidRequest(_)));
    }
    assert_eq!(backend.stats().hyperslab_reads, 0);
    assert_eq!(backend.stats().open_handles(), 0);
}

#[test]
fn test_value_brackets_between_samples() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    for format in FORMATS {
        let path = mock_path(format, DataType::Float32, 3, true);
        let by_value = reader
            .read_by_value(&path, None, &[Some(5.5), None, None])
            .unwrap();
        let by_index = reader
            .read_by_index(&path, None, &[IndexSpec::Range(5, 7), IndexSpec::All, IndexSpec::All])
            .unwrap();
        let by_ivalue = reader
            .read_by_ivalue(&path, None, &[Some(5.5), None, None])
            .unwrap();

        assert_eq!(by_value.scales[0].to_vec(), vec![5.0, 6.0]);
        assert_eq!(by_value, by_index);
        assert_eq!(by_value, by_ivalue);
    }
}

#[test]
fn test_value_on_sample_edges() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);
    let path = mock_path(FileFormat::Modern, DataType::Float64, 1, true);

    let first = reader.read_by_value(&path, None, &[Some(0.0)]).unwrap();
    assert_eq!(first.scales[0].to_vec(), vec![0.0, 1.0]);

    let inner = reader.read_by_value(&path, None, &[Some(4.0)]).unwrap();
    assert_eq!(inner.scales[0].to_vec(), vec![4.0, 5.0]);

    let last = reader.read_by_value(&path, None, &[Some(10.0)]).unwrap();
    assert_eq!(last.scales[0].to_vec(), vec![9.0, 10.0]);
}

#[test]
fn test_value_out_of_domain() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    for format in FORMATS {
        let path = mock_path(format, DataType::Float64, 3, true);
        let err = reader
            .read_by_value(&path, None, &[None, None, Some(16.5)])
            .unwrap_err();
        assert!(matches!(
            err,
            PsiIoError::OutOfDomain {
                axis: 2,
                value,
                ..
            } if value == 16.5
        ));

        let err = reader
            .read_by_value(&path, None, &[Some(-1.0), None, None])
            .unwrap_err();
        assert!(matches!(err, PsiIoError::OutOfDomain { axis: 0, .. }));
    }
    assert_eq!(backend.stats().hyperslab_reads, 0);
    assert_eq!(backend.stats().open_handles(), 0);
}

#[test]
fn test_value_requires_scales() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    let path = mock_path(FileFormat::Legacy, DataType::Float64, 2, false);
    let err = reader
        .read_by_value(&path, None, &[Some(1.0), None])
        .unwrap_err();
    assert!(matches!(err, PsiIoError::MissingScales(_)));
}

#[test]
fn test_value_interval_inside_one_cell() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    for format in FORMATS {
        let path = mock_path(format, DataType::Float64, 3, true);
        let by_interval = reader
            .read_by_value(&path, None, &[Some((5.2, 5.8)), None, None])
            .unwrap();
        let by_value = reader
            .read_by_value(&path, None, &[Some(5.5), None, None])
            .unwrap();
        assert_eq!(by_interval, by_value);
        assert_eq!(by_interval.scales[0].to_vec(), vec![5.0, 6.0]);
    }
}

#[test]
fn test_value_interval_spans_cells() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    for format in FORMATS {
        let path = mock_path(format, DataType::Float32, 3, true);
        let slab = reader
            .read_by_value(
                &path,
                None,
                &[ValueSpec::All, ValueSpec::Between(2.01234567, 9.7654321), ValueSpec::At(3.5)],
            )
            .unwrap();
        let by_index = reader
            .read_by_index(
                &path,
                None,
                &[IndexSpec::All, IndexSpec::Range(2, 11), IndexSpec::Range(3, 5)],
            )
            .unwrap();
        assert_eq!(slab, by_index);
        assert_eq!(slab.data.shape(), &[2, 9, 11]);

        // interval ends may come in either order
        let reversed = reader
            .read_by_value(
                &path,
                None,
                &[ValueSpec::All, ValueSpec::Between(9.7654321, 2.01234567), ValueSpec::At(3.5)],
            )
            .unwrap();
        assert_eq!(reversed, slab);
    }
}

#[test]
fn test_value_interval_out_of_domain() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    for format in FORMATS {
        let path = mock_path(format, DataType::Float64, 2, true);
        let err = reader
            .read_by_value(&path, None, &[Some((2.0, 10.5)), None])
            .unwrap_err();
        assert!(matches!(
            err,
            PsiIoError::OutOfDomain { axis: 0, value, .. } if value == 10.5
        ));
    }
    assert_eq!(backend.stats().hyperslab_reads, 0);
}

#[test]
fn test_integral_ivalue_equals_index() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    for format in FORMATS {
        for scales in [true, false] {
            let path = mock_path(format, DataType::Int16, 2, scales);
            for v in [0usize, 6, 10] {
                let by_ivalue = reader
                    .read_by_ivalue(&path, None, &[Some(v as f64), None])
                    .unwrap();
                let by_index = reader
                    .read_by_index(&path, None, &[IndexSpec::At(v), IndexSpec::All])
                    .unwrap();
                assert_eq!(by_ivalue, by_index);
            }
        }
    }
}

#[test]
fn test_ivalue_out_of_bounds() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);
    let path = mock_path(FileFormat::Modern, DataType::Int16, 1, true);

    for v in [-0.5, 10.5] {
        let err = reader.read_by_ivalue(&path, None, &[Some(v)]).unwrap_err();
        assert!(matches!(err, PsiIoError::IndexOutOfBounds { .. }));
    }
}

#[test]
fn test_single_hyperslab_read_per_request() {
    test_utils::init_test_tracing();
    let backend = mock_backend();
    let reader = mock_reader(&backend);
    let path = mock_path(FileFormat::Modern, DataType::Float64, 3, true);

    reader
        .read_by_index(&path, None, &[IndexSpec::At(3), IndexSpec::At(4), IndexSpec::All])
        .unwrap();
    let stats = backend.stats();
    assert_eq!(stats.opens, 1);
    assert_eq!(stats.hyperslab_reads, 1);
    assert_eq!(stats.elements_read, 17);
    assert_eq!(stats.scale_reads, 3);
    assert_eq!(stats.scale_elements_read, 1 + 1 + 17);
    assert_eq!(stats.open_handles(), 0);

    backend.reset_stats();
    reader
        .read_by_value(&path, None, &[Some(2.5), None, Some(8.5)])
        .unwrap();
    let stats = backend.stats();
    assert_eq!(stats.hyperslab_reads, 1);
    assert_eq!(stats.elements_read, 2 * 13 * 2);
    // one full read per valued axis, then one sliced read per axis
    assert_eq!(stats.scale_reads, 2 + 3);
    assert_eq!(stats.scale_elements_read, (11 + 17) + (2 + 13 + 2));
}

#[test]
fn test_rank_specific_readers() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    for format in FORMATS {
        let (x, f) = reader
            .read_1d(mock_path(format, DataType::Float32, 1, true))
            .unwrap();
        assert_eq!(x.len(), 11);
        assert_eq!(f.len(), 11);

        let (x, y, f) = reader
            .read_2d(mock_path(format, DataType::Float32, 2, true))
            .unwrap();
        assert_eq!((x.len(), y.len()), (11, 13));
        assert_eq!(f.dim(), (13, 11));

        let path = mock_path(format, DataType::Float32, 3, true);
        let (x, y, z, f) = reader.read_3d(&path).unwrap();
        let full = reader.read_data(&path, None).unwrap();
        assert_eq!(vec![x, y, z], full.scales);
        assert_eq!(f, full.data.into_dimensionality::<Ix3>().unwrap());

        let (x, y, z) = reader.read_scales_3d(&path).unwrap();
        assert_eq!((x.len(), y.len(), z.len()), (11, 13, 17));
    }
}

#[test]
fn test_rank_specific_reader_mismatch() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    for format in FORMATS {
        let err = reader
            .read_2d(mock_path(format, DataType::Float32, 3, true))
            .unwrap_err();
        assert!(matches!(
            err,
            PsiIoError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));

        let err = reader
            .read_scales_1d(mock_path(format, DataType::Float32, 2, true))
            .unwrap_err();
        assert!(matches!(err, PsiIoError::DimensionMismatch { .. }));
    }
    assert_eq!(backend.stats().hyperslab_reads, 0);
}

#[test]
fn test_rank_specific_reader_without_scales() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    let (x, y, f) = reader
        .read_2d(mock_path(FileFormat::Legacy, DataType::Int32, 2, false))
        .unwrap();
    assert!(x.is_empty());
    assert!(y.is_empty());
    assert_eq!(f.dim(), (13, 11));
}

#[test]
fn test_cross_format_data_equivalence() {
    let backend = mock_backend();
    let reader = mock_reader(&backend);

    for dtype in DATATYPES {
        let legacy = reader
            .read_by_value(
                mock_path(FileFormat::Legacy, dtype, 3, true),
                None,
                &[None, Some(7.25), None],
            )
            .unwrap();
        let modern = reader
            .read_by_value(
                mock_path(FileFormat::Modern, dtype, 3, true),
                None,
                &[None, Some(7.25), None],
            )
            .unwrap();
        assert_eq!(legacy, modern);
    }
}
