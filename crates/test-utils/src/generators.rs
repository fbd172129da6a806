//! Test data generators for creating synthetic PSI-like grids.
//!
//! These generators create predictable, verifiable data patterns that can be
//! used across the test suite.

use ndarray::{Array1, ArrayD, Dimension, IxDyn};

/// Axis lengths used for mock datasets, fastest-varying axis first.
///
/// Distinct primes make every axis length unique, so a transposed or
/// misrouted axis shows up as a shape mismatch.
pub const PRIMES: [usize; 8] = [11, 13, 17, 19, 23, 29, 31, 37];

/// On-disk shape of an `ndim`-dimensional mock dataset.
///
/// The shape is the reverse of the first `ndim` primes, e.g. `[17, 13, 11]`
/// for three dimensions.
///
/// # Example
///
/// ```
/// use test_utils::mock_shape;
///
/// assert_eq!(mock_shape(3), vec![17, 13, 11]);
/// ```
pub fn mock_shape(ndim: usize) -> Vec<usize> {
    PRIMES[..ndim].iter().rev().copied().collect()
}

/// Creates a mock dataset with predictable values.
///
/// Each element is the sum of its indices, so `data[[i, j, k]] == i + j + k`.
///
/// # Example
///
/// ```
/// use test_utils::create_mock_data;
///
/// let data = create_mock_data(2);
/// assert_eq!(data.shape(), &[13, 11]);
/// assert_eq!(data[[3, 4]], 7.0);
/// ```
pub fn create_mock_data(ndim: usize) -> ArrayD<f64> {
    ArrayD::from_shape_fn(IxDyn(&mock_shape(ndim)), |ix| {
        ix.slice().iter().sum::<usize>() as f64
    })
}

/// Creates the scales of a mock dataset in physical order.
///
/// Scale `i` is `0, 1, ..., PRIMES[i] - 1`, so a scale value equals its
/// index.
pub fn create_mock_scales(ndim: usize) -> Vec<Array1<f64>> {
    PRIMES[..ndim]
        .iter()
        .map(|&n| Array1::range(0.0, n as f64, 1.0))
        .collect()
}

/// On-disk shape of the RTP mock grid: (phi, theta, radius).
pub const RTP_SHAPE: [usize; 3] = [181, 100, 151];

/// Creates RTP scales in physical order: radius, co-latitude, longitude.
///
/// Radius spans 1 to 30 solar radii, co-latitude 0 to pi and longitude
/// 0 to 2 pi.
pub fn create_rtp_scales() -> [Array1<f64>; 3] {
    [
        Array1::linspace(1.0, 30.0, RTP_SHAPE[2]),
        Array1::linspace(0.0, std::f64::consts::PI, RTP_SHAPE[1]),
        Array1::linspace(0.0, 2.0 * std::f64::consts::PI, RTP_SHAPE[0]),
    ]
}

/// Creates an RTP field that is linear in each coordinate.
///
/// `f(r, t, p) = r + 10 t + 100 p`, so multilinear interpolation reproduces
/// it exactly anywhere inside the grid.
pub fn create_rtp_field() -> ArrayD<f64> {
    let [r, t, p] = create_rtp_scales();
    ArrayD::from_shape_fn(IxDyn(&RTP_SHAPE), |ix| {
        rtp_field_value(r[ix[2]], t[ix[1]], p[ix[0]])
    })
}

/// Value of [`create_rtp_field`] at a physical position.
pub fn rtp_field_value(r: f64, t: f64, p: f64) -> f64 {
    r + 10.0 * t + 100.0 * p
}
