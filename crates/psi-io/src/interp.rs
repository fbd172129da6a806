//! Interpolation engine.
//!
//! Both entry points read the smallest slab that brackets the requested
//! values and interpolate linearly inside it. Nothing is extrapolated.

use ndarray::{Array1, ArrayViewD, Axis};
use tracing::debug;

use crate::backend::Source;
use crate::error::{PsiIoError, Result};
use crate::select::{self, AxisSelection};
use crate::slab::{self, Layout};
use crate::types::Slab;

/// Interpolate along the single axis that carries a value.
///
/// Returns the reduced array (on-disk order, interpolation axis removed) and
/// the scales of the remaining axes in physical order.
pub(crate) fn interpolate_slice(
    source: &Source,
    layout: &Layout,
    values: &[Option<f64>],
) -> Result<Slab> {
    layout.check_args(values.len())?;

    let mut given = values
        .iter()
        .enumerate()
        .filter_map(|(axis, v)| v.map(|v| (axis, v)));
    let (axis, value) = match (given.next(), given.next()) {
        (Some(found), None) => found,
        _ => {
            return Err(PsiIoError::invalid_request(
                "slice interpolation needs a value on exactly one axis",
            ))
        }
    };
    layout.require_scales()?;

    let scale = slab::read_scale(source, layout, axis)?;
    let (lo, hi) = select::bracket(axis, scale.view(), value)?;

    let mut selections = vec![AxisSelection::All; layout.ndim()];
    selections[axis] = if lo == hi {
        AxisSelection::Index(lo)
    } else {
        AxisSelection::Range { lo, hi }
    };
    let Slab { data, mut scales } = slab::read_slab(source, layout, &selections)?;

    let storage = Axis(layout.storage_axis(axis));
    let reduced = if lo == hi {
        data.index_axis(storage, 0).to_owned()
    } else {
        let w = (value - scale[lo]) / (scale[hi] - scale[lo]);
        let below = data.index_axis(storage, 0);
        let above = data.index_axis(storage, 1);
        &below * (1.0 - w) + &above * w
    };

    debug!(
        path = %source.path().display(),
        dataset = %layout.id,
        axis,
        value,
        lo,
        hi,
        "Interpolated slice"
    );

    scales.remove(axis);
    Ok(Slab::new(reduced, scales))
}

/// Interpolate at scattered positions, one coordinate sequence per physical axis.
pub(crate) fn interpolate_positions(
    source: &Source,
    layout: &Layout,
    positions: &[&[f64]],
) -> Result<Vec<f64>> {
    layout.check_args(positions.len())?;

    let count = positions.first().map_or(0, |p| p.len());
    if positions.iter().any(|p| p.len() != count) {
        return Err(PsiIoError::invalid_request(
            "position sequences must all have the same length",
        ));
    }
    layout.require_scales()?;
    if count == 0 {
        return Ok(Vec::new());
    }

    // Bounding box: union of the brackets of each axis' extreme positions.
    let mut selections = Vec::with_capacity(layout.ndim());
    for (axis, coords) in positions.iter().enumerate() {
        let scale = slab::read_scale(source, layout, axis)?;
        let (min, max) = extremes(axis, coords, &scale)?;
        selections.push(select::bracket_span(axis, scale.view(), min, max)?);
    }

    let Slab { data, scales } = slab::read_slab(source, layout, &selections)?;
    let physical = data.reversed_axes();
    let grid = Rectilinear::new(&scales, physical.view())?;

    let mut point = vec![0.0; layout.ndim()];
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        for (axis, coords) in positions.iter().enumerate() {
            point[axis] = coords[i];
        }
        out.push(grid.interp_one(&point)?);
    }

    debug!(
        path = %source.path().display(),
        dataset = %layout.id,
        count,
        box_shape = ?physical.shape(),
        "Interpolated positions"
    );

    Ok(out)
}

/// Smallest and largest coordinate, rejecting NaN.
fn extremes(axis: usize, coords: &[f64], scale: &Array1<f64>) -> Result<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &c in coords {
        if c.is_nan() {
            let (a, b) = (scale[0], scale[scale.len() - 1]);
            return Err(PsiIoError::OutOfDomain {
                axis,
                value: c,
                min: a.min(b),
                max: a.max(b),
            });
        }
        min = min.min(c);
        max = max.max(c);
    }
    Ok((min, max))
}

/// Multilinear interpolator over a rectilinear grid, axes in physical order.
struct Rectilinear<'a> {
    grids: &'a [Array1<f64>],
    vals: ArrayViewD<'a, f64>,
}

impl<'a> Rectilinear<'a> {
    fn new(grids: &'a [Array1<f64>], vals: ArrayViewD<'a, f64>) -> Result<Self> {
        let dims_match = grids.len() == vals.ndim()
            && grids.iter().zip(vals.shape()).all(|(g, &n)| g.len() == n);
        if !dims_match {
            return Err(PsiIoError::invalid_metadata(
                "scale lengths do not match the data slab",
            ));
        }
        Ok(Self { grids, vals })
    }

    fn interp_one(&self, x: &[f64]) -> Result<f64> {
        let ndim = self.grids.len();
        let mut origin = Vec::with_capacity(ndim);
        let mut weight = Vec::with_capacity(ndim);

        for (axis, (grid, &v)) in self.grids.iter().zip(x).enumerate() {
            let (lo, hi) = select::bracket(axis, grid.view(), v)?;
            let t = if lo == hi {
                0.0
            } else {
                (v - grid[lo]) / (grid[hi] - grid[lo])
            };
            origin.push((lo, hi));
            weight.push(t);
        }

        // Sum over the 2^n corners of the enclosing cell.
        let mut loc = vec![0_usize; ndim];
        let mut acc = 0.0;
        for corner in 0..(1_usize << ndim) {
            let mut w = 1.0;
            for k in 0..ndim {
                let upper = corner & (1 << k) != 0;
                loc[k] = if upper { origin[k].1 } else { origin[k].0 };
                w *= if upper { weight[k] } else { 1.0 - weight[k] };
            }
            if w != 0.0 {
                acc += w * self.vals[loc.as_slice()];
            }
        }
        Ok(acc)
    }
}
