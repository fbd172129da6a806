//! Index and value resolution.
//!
//! Every request is turned into one [`AxisSelection`] per axis before any
//! element data is read. The functions here are pure: the scale samples a
//! value lookup needs are passed in by the caller.

use std::fmt;

use ndarray::ArrayView1;

use crate::backend::AxisRange;
use crate::error::{PsiIoError, Result};

/// Per-axis index request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexSpec {
    /// The whole axis.
    #[default]
    All,
    /// Exactly this index; the axis is kept with length 1.
    At(usize),
    /// Half-open range `[start, stop)`.
    Range(usize, usize),
}

impl From<usize> for IndexSpec {
    fn from(index: usize) -> Self {
        Self::At(index)
    }
}

impl From<(usize, usize)> for IndexSpec {
    fn from((start, stop): (usize, usize)) -> Self {
        Self::Range(start, stop)
    }
}

impl From<std::ops::Range<usize>> for IndexSpec {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::Range(range.start, range.end)
    }
}

impl<T: Into<IndexSpec>> From<Option<T>> for IndexSpec {
    fn from(spec: Option<T>) -> Self {
        spec.map_or(Self::All, Into::into)
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, ".."),
            Self::At(i) => write!(f, "{i}"),
            Self::Range(start, stop) => write!(f, "{start}..{stop}"),
        }
    }
}

/// Per-axis scale value request.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ValueSpec {
    /// The whole axis.
    #[default]
    All,
    /// The samples bracketing this value.
    At(f64),
    /// The samples bracketing both ends of a closed interval, and all in between.
    Between(f64, f64),
}

impl ValueSpec {
    /// Interval ends, smaller first. `None` for the whole axis.
    pub(crate) fn bounds(self) -> Option<(f64, f64)> {
        match self {
            Self::All => None,
            Self::At(v) => Some((v, v)),
            Self::Between(a, b) if a <= b => Some((a, b)),
            Self::Between(a, b) => Some((b, a)),
        }
    }
}

impl From<f64> for ValueSpec {
    fn from(value: f64) -> Self {
        Self::At(value)
    }
}

impl From<(f64, f64)> for ValueSpec {
    fn from((a, b): (f64, f64)) -> Self {
        Self::Between(a, b)
    }
}

impl<T: Into<ValueSpec>> From<Option<T>> for ValueSpec {
    fn from(spec: Option<T>) -> Self {
        spec.map_or(Self::All, Into::into)
    }
}

impl fmt::Display for ValueSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, ".."),
            Self::At(v) => write!(f, "{v}"),
            Self::Between(a, b) => write!(f, "[{a}, {b}]"),
        }
    }
}

/// Canonical selection along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AxisSelection {
    All,
    Index(usize),
    /// Inclusive `[lo, hi]`.
    Range { lo: usize, hi: usize },
}

impl AxisSelection {
    /// Half-open range to read from an axis of `len` elements.
    pub(crate) fn to_range(self, len: usize) -> AxisRange {
        match self {
            Self::All => AxisRange::full(len),
            Self::Index(i) => AxisRange::new(i, i + 1),
            Self::Range { lo, hi } => AxisRange::new(lo, hi + 1),
        }
    }
}

/// Validate an index request against an axis of `len` elements.
pub(crate) fn resolve_index(axis: usize, spec: IndexSpec, len: usize) -> Result<AxisSelection> {
    let imax = len.saturating_sub(1);
    match spec {
        IndexSpec::All => Ok(AxisSelection::All),
        IndexSpec::At(i) if i < len => Ok(AxisSelection::Index(i)),
        IndexSpec::Range(start, stop) if start < stop && stop <= len => Ok(AxisSelection::Range {
            lo: start,
            hi: stop - 1,
        }),
        _ => Err(PsiIoError::out_of_bounds(axis, spec.to_string(), 0, imax)),
    }
}

/// Minimal bracket `[lo, hi]` of `value` on a monotonic scale.
///
/// A value on a sample pairs it with the next sample; the last sample pairs
/// with its predecessor. A single-sample scale yields `[0, 0]`.
pub(crate) fn bracket(axis: usize, scale: ArrayView1<'_, f64>, value: f64) -> Result<(usize, usize)> {
    let n = scale.len();
    if n == 0 {
        return Err(PsiIoError::invalid_metadata(format!(
            "scale of axis {axis} is empty"
        )));
    }

    let first = scale[0];
    let last = scale[n - 1];
    let increasing = last >= first;
    let (min, max) = if increasing { (first, last) } else { (last, first) };

    if !(value >= min && value <= max) {
        return Err(PsiIoError::OutOfDomain {
            axis,
            value,
            min,
            max,
        });
    }
    if n == 1 {
        return Ok((0, 0));
    }

    let past = scale
        .iter()
        .position(|&s| if increasing { s > value } else { s < value })
        .unwrap_or(n);
    let hi = past.clamp(1, n - 1);
    Ok((hi - 1, hi))
}

/// Union of the brackets of `min` and `max`.
pub(crate) fn bracket_span(
    axis: usize,
    scale: ArrayView1<'_, f64>,
    min: f64,
    max: f64,
) -> Result<AxisSelection> {
    let (lo_a, hi_a) = bracket(axis, scale, min)?;
    let (lo_b, hi_b) = bracket(axis, scale, max)?;
    let (lo, hi) = (lo_a.min(lo_b), hi_a.max(hi_b));
    Ok(if lo == hi {
        AxisSelection::Index(lo)
    } else {
        AxisSelection::Range { lo, hi }
    })
}

/// Treat `value` as a fractional index: `[floor(value), ceil(value)]`.
pub(crate) fn resolve_ivalue(axis: usize, value: f64, len: usize) -> Result<AxisSelection> {
    let imax = len.saturating_sub(1);
    if !(value >= 0.0) || len == 0 || value.ceil() > imax as f64 {
        return Err(PsiIoError::out_of_bounds(axis, value.to_string(), 0, imax));
    }

    let lo = value.floor() as usize;
    let hi = value.ceil() as usize;
    if lo == hi {
        Ok(AxisSelection::Index(lo))
    } else {
        Ok(AxisSelection::Range { lo, hi })
    }
}
