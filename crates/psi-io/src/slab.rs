//! Partial reader.
//!
//! Requests arrive in physical axis order (fastest-varying on-disk axis
//! first). Physical axis `i` of a rank-`n` dataset is storage axis `n - 1 - i`
//! for both container formats, so nothing here depends on the format.

use ndarray::Array1;

use crate::backend::{AxisRange, Source};
use crate::config::FormatIds;
use crate::error::{PsiIoError, Result};
use crate::meta;
use crate::select::{self, AxisSelection, IndexSpec, ValueSpec};
use crate::types::Slab;

/// Shape and scale availability of the dataset a request targets.
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    pub id: String,
    /// Shape in on-disk order.
    pub shape: Vec<usize>,
    pub scaled: bool,
}

impl Layout {
    pub fn load(source: &Source, ids: &FormatIds, id: &str) -> Result<Self> {
        let meta = meta::describe(source, ids, id)?;
        Ok(Self {
            scaled: meta.has_scales(),
            id: meta.name,
            shape: meta.shape,
        })
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn storage_axis(&self, physical: usize) -> usize {
        self.ndim() - 1 - physical
    }

    /// Length of physical axis `physical`.
    pub fn len(&self, physical: usize) -> usize {
        self.shape[self.storage_axis(physical)]
    }

    /// Fail unless one argument per axis was given.
    pub fn check_args(&self, given: usize) -> Result<()> {
        if given != self.ndim() {
            return Err(PsiIoError::invalid_request(format!(
                "dataset {} has {} dimensions but {given} per-axis arguments were given",
                self.id,
                self.ndim()
            )));
        }
        Ok(())
    }

    /// Fail unless every axis carries a scale.
    pub fn require_scales(&self) -> Result<()> {
        if !self.scaled {
            return Err(PsiIoError::MissingScales(self.id.clone()));
        }
        Ok(())
    }
}

/// Read the whole scale of physical axis `physical`.
pub(crate) fn read_scale(source: &Source, layout: &Layout, physical: usize) -> Result<Array1<f64>> {
    let axis = layout.storage_axis(physical);
    source.read_scale_range(&layout.id, axis, AxisRange::full(layout.shape[axis]))
}

/// Read every scale in physical order, without touching element data.
pub(crate) fn read_scales(source: &Source, layout: &Layout) -> Result<Vec<Array1<f64>>> {
    if !layout.scaled {
        return Ok(Vec::new());
    }
    (0..layout.ndim())
        .map(|physical| read_scale(source, layout, physical))
        .collect()
}

pub(crate) fn select_by_index(layout: &Layout, specs: &[IndexSpec]) -> Result<Vec<AxisSelection>> {
    layout.check_args(specs.len())?;
    specs
        .iter()
        .enumerate()
        .map(|(axis, &spec)| select::resolve_index(axis, spec, layout.len(axis)))
        .collect()
}

/// Bracket each requested value or interval on its axis, reading only the
/// scales of those axes.
pub(crate) fn select_by_value(
    source: &Source,
    layout: &Layout,
    values: &[ValueSpec],
) -> Result<Vec<AxisSelection>> {
    layout.check_args(values.len())?;
    if values.iter().any(|v| v.bounds().is_some()) {
        layout.require_scales()?;
    }

    values
        .iter()
        .enumerate()
        .map(|(axis, value)| match value.bounds() {
            None => Ok(AxisSelection::All),
            Some((min, max)) => {
                let scale = read_scale(source, layout, axis)?;
                select::bracket_span(axis, scale.view(), min, max)
            }
        })
        .collect()
}

pub(crate) fn select_by_ivalue(layout: &Layout, values: &[Option<f64>]) -> Result<Vec<AxisSelection>> {
    layout.check_args(values.len())?;
    values
        .iter()
        .enumerate()
        .map(|(axis, value)| match *value {
            None => Ok(AxisSelection::All),
            Some(v) => select::resolve_ivalue(axis, v, layout.len(axis)),
        })
        .collect()
}

/// One hyperslab read plus one scale range read per scaled axis.
///
/// `selections` are in physical order. The returned data keeps on-disk order;
/// the returned scales are in physical order.
pub(crate) fn read_slab(
    source: &Source,
    layout: &Layout,
    selections: &[AxisSelection],
) -> Result<Slab> {
    layout.check_args(selections.len())?;

    let ranges: Vec<AxisRange> = (0..layout.ndim())
        .map(|axis| {
            let physical = layout.ndim() - 1 - axis;
            selections[physical].to_range(layout.shape[axis])
        })
        .collect();

    let data = source.read_hyperslab(&layout.id, &ranges)?;

    let scales = if layout.scaled {
        (0..layout.ndim())
            .map(|physical| {
                let axis = layout.storage_axis(physical);
                source.read_scale_range(&layout.id, axis, ranges[axis])
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        Vec::new()
    };

    Ok(Slab::new(data, scales))
}
