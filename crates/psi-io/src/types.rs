//! Core types for PSI dataset access.

use std::fmt;

use ndarray::{Array1, ArrayD};
use serde::{Deserialize, Serialize};

/// Numeric kind of the elements stored on disk.
///
/// Names follow numpy conventions (`float32`, `int16`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl DataType {
    /// Get the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata of one coordinate axis attached to a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleMeta {
    /// Backend-native scale name (e.g. `dim1`, `fakeDim0`).
    pub name: String,
    /// Element count, as a 1-tuple.
    pub shape: [usize; 1],
    /// Element kind.
    #[serde(rename = "type")]
    pub dtype: DataType,
    /// First valid index (always 0).
    pub imin: usize,
    /// Last valid index (always `len - 1`).
    pub imax: usize,
}

impl ScaleMeta {
    /// Create scale metadata for an axis of `len` elements.
    pub fn new(name: impl Into<String>, len: usize, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            shape: [len],
            dtype,
            imin: 0,
            imax: len.saturating_sub(1),
        }
    }

    /// Number of samples along the axis.
    pub fn len(&self) -> usize {
        self.shape[0]
    }

    /// Whether the axis has no samples.
    pub fn is_empty(&self) -> bool {
        self.shape[0] == 0
    }
}

/// Metadata of one numeric dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    /// Dataset name.
    pub name: String,
    /// Shape in on-disk axis order.
    pub shape: Vec<usize>,
    /// Element kind.
    #[serde(rename = "type")]
    pub dtype: DataType,
    /// Scales in the listing order of the container format; either empty or
    /// one per dimension.
    pub scales: Vec<ScaleMeta>,
}

impl DatasetMeta {
    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Whether every axis carries a scale.
    pub fn has_scales(&self) -> bool {
        !self.scales.is_empty()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether the dataset has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A block of data read from a dataset together with its scales.
#[derive(Debug, Clone, PartialEq)]
pub struct Slab {
    /// Values in on-disk axis order.
    pub data: ArrayD<f64>,
    /// Scale samples matching `data`, in physical order (reverse of the
    /// on-disk order). Empty when the dataset has no scales.
    pub scales: Vec<Array1<f64>>,
}

impl Slab {
    /// Create a new slab.
    pub fn new(data: ArrayD<f64>, scales: Vec<Array1<f64>>) -> Self {
        Self { data, scales }
    }

    /// Number of dimensions of the data.
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Split into data and scales.
    pub fn into_parts(self) -> (ArrayD<f64>, Vec<Array1<f64>>) {
        (self.data, self.scales)
    }
}

/// Size, index bounds and scale bounds of one physical axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisExtent {
    /// Number of samples.
    pub n: usize,
    /// First index.
    pub min_index: usize,
    /// Last index.
    pub max_index: usize,
    /// Smallest scale value, when the axis has a scale.
    pub min: Option<f64>,
    /// Largest scale value, when the axis has a scale.
    pub max: Option<f64>,
}

impl AxisExtent {
    /// Extent of an axis with `n` samples and no scale.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            min_index: 0,
            max_index: n.saturating_sub(1),
            min: None,
            max: None,
        }
    }

    /// Attach the scale values of the two end samples, in either order.
    pub fn with_scale_ends(mut self, first: f64, last: f64) -> Self {
        self.min = Some(first.min(last));
        self.max = Some(first.max(last));
        self
    }

    /// As an `(n, min_index, max_index)` tuple.
    pub fn as_tuple(&self) -> (usize, usize, usize) {
        (self.n, self.min_index, self.max_index)
    }

    /// Physical `(min, max)` of the axis, when it has a scale.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.min.zip(self.max)
    }
}

/// Axis extents of a radius / co-latitude / longitude grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RtpMeta {
    /// Radius.
    pub r: AxisExtent,
    /// Co-latitude (theta).
    pub t: AxisExtent,
    /// Longitude (phi).
    pub p: AxisExtent,
}

impl RtpMeta {
    /// Look up an axis by its key (`'r'`, `'t'` or `'p'`).
    pub fn get(&self, key: char) -> Option<AxisExtent> {
        match key {
            'r' => Some(self.r),
            't' => Some(self.t),
            'p' => Some(self.p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_names() {
        assert_eq!(DataType::Float32.to_string(), "float32");
        assert_eq!(DataType::UInt16.as_str(), "uint16");
        let json = serde_json::to_value(DataType::Int64).unwrap();
        assert_eq!(json, "int64");
    }

    #[test]
    fn test_scale_meta_bounds() {
        for len in [1, 11, 151] {
            let scale = ScaleMeta::new("dim1", len, DataType::Float32);
            assert_eq!(scale.imax - scale.imin + 1, scale.shape[0]);
            assert_eq!(scale.len(), len);
        }
    }

    #[test]
    fn test_dataset_meta_serializes_type_key() {
        let meta = DatasetMeta {
            name: "Data".to_string(),
            shape: vec![13, 11],
            dtype: DataType::Float64,
            scales: vec![],
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "float64");
        assert_eq!(meta.ndim(), 2);
        assert_eq!(meta.len(), 143);
        assert!(!meta.has_scales());
    }

    #[test]
    fn test_rtp_lookup() {
        let meta = RtpMeta {
            r: AxisExtent::new(151),
            t: AxisExtent::new(100),
            p: AxisExtent::new(181),
        };
        assert_eq!(meta.get('r').map(|e| e.as_tuple()), Some((151, 0, 150)));
        assert_eq!(meta.get('p').map(|e| e.as_tuple()), Some((181, 0, 180)));
        assert_eq!(meta.get('x'), None);
        assert_eq!(meta.r.bounds(), None);
    }

    #[test]
    fn test_axis_extent_scale_ends() {
        let extent = AxisExtent::new(100).with_scale_ends(3.1, 0.02);
        assert_eq!(extent.as_tuple(), (100, 0, 99));
        assert_eq!(extent.bounds(), Some((0.02, 3.1)));
    }
}
