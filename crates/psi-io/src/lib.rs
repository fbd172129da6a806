//! Partial reads and interpolation over PSI data files
//!
//! PSI data products are gridded arrays (typically radius / co-latitude /
//! longitude) stored either in legacy HDF4 scientific dataset files (`.hdf`)
//! or in modern HDF5 files (`.h5`). This crate reads them without ever
//! loading more than a request needs:
//!
//! - **Metadata only**: shapes, element types and scales without element data
//! - **Partial reads**: one hyperslab read per request, by index, by scale
//!   value or by fractional index
//! - **Interpolation**: linear slices along one axis and multilinear
//!   interpolation at scattered positions, over the smallest bracketing box
//!
//! # Architecture
//!
//! ```text
//! HdfReader::read_by_value(path, values)
//!      │
//!      ├─► dispatch on extension (.hdf / .h5)
//!      │
//!      ├─► Backend::open ─► Driver handle (released on return)
//!      │
//!      ├─► metadata: shape, type, scales
//!      │
//!      ├─► resolve each axis: index, bracket or floor/ceil
//!      │
//!      └─► one hyperslab read + sliced scales
//!               │
//!               ▼
//!          Slab { data, scales }
//! ```
//!
//! Per-axis arguments and returned scales use physical order (fastest-varying
//! on-disk axis first, i.e. `r, t, p` for RTP grids). Returned data keeps the
//! on-disk order.
//!
//! # Backends
//!
//! - `hdf5` feature: `.h5` files through libhdf5
//! - `netcdf` feature: `.hdf` files through libnetcdf built with HDF4 support
//! - [`MemoryBackend`]: in-memory files for either format, with read counters
//!
//! # Example
//!
//! ```ignore
//! use psi_io::{HdfReader, IndexSpec};
//!
//! let reader = HdfReader::default();
//!
//! // Radial field at r = 30, all latitudes and longitudes
//! let slice = reader.interpolate_slice("br002.h5", None, &[Some(30.0), None, None])?;
//!
//! // First five longitudes
//! let slab = reader.read_by_index(
//!     "br002.h5",
//!     None,
//!     &[IndexSpec::All, IndexSpec::All, IndexSpec::Range(0, 5)],
//! )?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod format;
pub mod meta;
pub mod reader;
pub mod select;
pub mod types;

mod interp;
mod rtp;
mod slab;

// Re-export commonly used types at crate root
pub use backend::{
    AxisRange, Backend, Driver, MemoryBackend, MemoryDataset, MemoryFile, MemoryScale, ReadStats,
    ScaleInfo,
};
pub use config::{FormatIds, IdentifierTable, ScaleOrder};
pub use error::{BackendError, PsiIoError, Result};
pub use format::{dispatch, FileFormat};
pub use reader::{
    interpolate_positions_from_hdf, interpolate_slice_from_hdf, read_hdf_by_index,
    read_hdf_by_ivalue, read_hdf_by_value, read_hdf_data, read_hdf_meta, read_rtp_meta, Data1d,
    Data2d, Data3d, HdfReader,
};
pub use select::{IndexSpec, ValueSpec};
pub use types::{AxisExtent, DataType, DatasetMeta, RtpMeta, ScaleMeta, Slab};

#[cfg(feature = "hdf5")]
pub use backend::Hdf5Backend;

#[cfg(feature = "netcdf")]
pub use backend::Hdf4Backend;
