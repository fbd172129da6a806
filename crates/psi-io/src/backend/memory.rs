//! In-memory backend.
//!
//! Files are registered under a path and served by extension like real files,
//! so a [`MemoryBackend`] can stand in for either container format. Every
//! open, close and read is counted in [`ReadStats`], which lets callers check
//! how much data an operation actually touched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use ndarray::{Array1, ArrayD, Slice};

use super::{AxisRange, Backend, BackendResult, Driver, ScaleInfo};
use crate::config::FormatIds;
use crate::error::BackendError;
use crate::types::DataType;

/// Scale samples attached to one axis of a [`MemoryDataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryScale {
    pub name: String,
    pub dtype: DataType,
    pub values: Array1<f64>,
}

impl MemoryScale {
    /// Create a new scale.
    pub fn new(name: impl Into<String>, dtype: DataType, values: Array1<f64>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }
}

/// A dataset held in memory, in on-disk axis order.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryDataset {
    pub dtype: DataType,
    pub data: ArrayD<f64>,
    /// One slot per axis (on-disk order).
    pub scales: Vec<Option<MemoryScale>>,
}

impl MemoryDataset {
    /// Create a dataset without scales.
    pub fn new(dtype: DataType, data: ArrayD<f64>) -> Self {
        let ndim = data.ndim();
        Self {
            dtype,
            data,
            scales: vec![None; ndim],
        }
    }

    /// Attach a scale to `axis` (on-disk order).
    pub fn with_scale(mut self, axis: usize, scale: MemoryScale) -> Self {
        if axis < self.scales.len() {
            self.scales[axis] = Some(scale);
        }
        self
    }
}

/// A file held in memory: named datasets in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryFile {
    datasets: Vec<(String, MemoryDataset)>,
}

impl MemoryFile {
    /// Create an empty file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dataset, replacing any dataset of the same name.
    pub fn with_dataset(mut self, name: impl Into<String>, dataset: MemoryDataset) -> Self {
        let name = name.into();
        self.datasets.retain(|(n, _)| *n != name);
        self.datasets.push((name, dataset));
        self
    }

    /// Look up a dataset by name.
    pub fn dataset(&self, name: &str) -> Option<&MemoryDataset> {
        self.datasets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ds)| ds)
    }

    /// Dataset names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.datasets.iter().map(|(n, _)| n.as_str())
    }
}

/// Counters of backend activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Files opened.
    pub opens: u64,
    /// Handles released.
    pub closes: u64,
    /// Hyperslab reads issued.
    pub hyperslab_reads: u64,
    /// Data elements returned by hyperslab reads.
    pub elements_read: u64,
    /// Scale range reads issued.
    pub scale_reads: u64,
    /// Scale elements returned by scale range reads.
    pub scale_elements_read: u64,
}

impl ReadStats {
    /// Handles opened and not yet released.
    pub fn open_handles(&self) -> u64 {
        self.opens.saturating_sub(self.closes)
    }
}

#[derive(Debug, Default)]
struct Counters {
    opens: AtomicU64,
    closes: AtomicU64,
    hyperslab_reads: AtomicU64,
    elements_read: AtomicU64,
    scale_reads: AtomicU64,
    scale_elements_read: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> ReadStats {
        ReadStats {
            opens: self.opens.load(Ordering::Relaxed),
            closes: self.closes.load(Ordering::Relaxed),
            hyperslab_reads: self.hyperslab_reads.load(Ordering::Relaxed),
            elements_read: self.elements_read.load(Ordering::Relaxed),
            scale_reads: self.scale_reads.load(Ordering::Relaxed),
            scale_elements_read: self.scale_elements_read.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        for counter in [
            &self.opens,
            &self.closes,
            &self.hyperslab_reads,
            &self.elements_read,
            &self.scale_reads,
            &self.scale_elements_read,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Backend serving [`MemoryFile`]s registered by path.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    files: RwLock<HashMap<PathBuf, Arc<MemoryFile>>>,
    counters: Arc<Counters>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `file` under `path`, replacing any previous file.
    pub fn insert(&self, path: impl Into<PathBuf>, file: MemoryFile) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(path.into(), Arc::new(file));
    }

    /// Whether a file is registered under `path`.
    pub fn contains(&self, path: &Path) -> bool {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.contains_key(path)
    }

    /// Snapshot of the activity counters.
    pub fn stats(&self) -> ReadStats {
        self.counters.snapshot()
    }

    /// Reset all activity counters to zero.
    pub fn reset_stats(&self) {
        self.counters.reset();
    }
}

impl Backend for MemoryBackend {
    fn open(&self, path: &Path, _ids: &FormatIds) -> BackendResult<Box<dyn Driver>> {
        let file = {
            let files = self.files.read().unwrap_or_else(|e| e.into_inner());
            files.get(path).cloned()
        }
        .ok_or_else(|| BackendError::io(format!("cannot open {}", path.display())))?;

        self.counters.opens.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(MemoryHandle {
            file,
            counters: self.counters.clone(),
        }))
    }
}

struct MemoryHandle {
    file: Arc<MemoryFile>,
    counters: Arc<Counters>,
}

impl MemoryHandle {
    fn dataset(&self, id: &str) -> BackendResult<&MemoryDataset> {
        self.file
            .dataset(id)
            .ok_or_else(|| BackendError::not_found(format!("dataset {id}")))
    }

    fn scale_of(&self, id: &str, axis: usize) -> BackendResult<&MemoryScale> {
        self.dataset(id)?
            .scales
            .get(axis)
            .and_then(Option::as_ref)
            .ok_or_else(|| BackendError::not_found(format!("scale {axis} of dataset {id}")))
    }
}

impl Driver for MemoryHandle {
    fn list_datasets(&self) -> BackendResult<Vec<String>> {
        Ok(self.file.names().map(str::to_string).collect())
    }

    fn shape_and_type(&self, id: &str) -> BackendResult<(Vec<usize>, DataType)> {
        let ds = self.dataset(id)?;
        Ok((ds.data.shape().to_vec(), ds.dtype))
    }

    fn scale(&self, id: &str, axis: usize) -> BackendResult<Option<ScaleInfo>> {
        let ds = self.dataset(id)?;
        Ok(ds.scales.get(axis).and_then(Option::as_ref).map(|s| ScaleInfo {
            name: s.name.clone(),
            len: s.values.len(),
            dtype: s.dtype,
        }))
    }

    fn read_hyperslab(&self, id: &str, selection: &[AxisRange]) -> BackendResult<ArrayD<f64>> {
        let ds = self.dataset(id)?;
        let shape = ds.data.shape();

        if selection.len() != shape.len() {
            return Err(BackendError::io(format!(
                "selection has {} axes, dataset {id} has {}",
                selection.len(),
                shape.len()
            )));
        }
        for (range, &len) in selection.iter().zip(shape) {
            if range.stop > len || range.start > range.stop {
                return Err(BackendError::io(format!(
                    "selection {range} exceeds axis length {len} of dataset {id}"
                )));
            }
        }

        let slab = ds
            .data
            .slice_each_axis(|ax| {
                let range = selection[ax.axis.index()];
                Slice::from(range.start..range.stop)
            })
            .to_owned();

        self.counters.hyperslab_reads.fetch_add(1, Ordering::Relaxed);
        self.counters
            .elements_read
            .fetch_add(slab.len() as u64, Ordering::Relaxed);

        Ok(slab)
    }

    fn read_scale_range(
        &self,
        id: &str,
        axis: usize,
        range: AxisRange,
    ) -> BackendResult<Array1<f64>> {
        let scale = self.scale_of(id, axis)?;
        if range.stop > scale.values.len() || range.start > range.stop {
            return Err(BackendError::io(format!(
                "range {range} exceeds scale length {} of dataset {id}",
                scale.values.len()
            )));
        }

        let values = scale
            .values
            .slice(ndarray::s![range.start..range.stop])
            .to_owned();

        self.counters.scale_reads.fetch_add(1, Ordering::Relaxed);
        self.counters
            .scale_elements_read
            .fetch_add(values.len() as u64, Ordering::Relaxed);

        Ok(values)
    }
}

impl Drop for MemoryHandle {
    fn drop(&mut self) {
        self.counters.closes.fetch_add(1, Ordering::Relaxed);
    }
}
