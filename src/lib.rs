//! Safe bindings to the GMT (Generic Mapping Tools) C API with runtime
//! library loading.
//!
//! The GMT shared library (`libgmt`) is located and opened at runtime with
//! `libloading` instead of being linked at build time, so the crate builds
//! without a GMT installation and picks up whatever installation the host
//! provides (the `GMT_LIBRARY_PATH` environment variable overrides
//! discovery).
//!
//! Everything happens through an explicit [`Session`]:
//!
//! ```ignore
//! use gmt_ffi::{Gmt, Session};
//!
//! let gmt = Gmt::load()?;
//! let session = Session::create(&gmt, "my-session")?;
//! session.call_module("info", "some-data-file.txt")?;
//! ```
//!
//! Host-side numeric arrays (`ndarray` views over the supported element
//! types) are marshalled into native containers and handed to modules as
//! in-memory "virtual files":
//!
//! ```ignore
//! let x = [1.0f64, 2.0, 3.0];
//! let y = [4.0f64, 5.0, 6.0];
//! session.vectors_to_vfile(&[(&x[..]).into(), (&y[..]).into()], |vfile| {
//!     session.call_module("info", &format!("{vfile} ->bounds.txt"))
//! })?;
//! ```
//!
//! # Concurrency
//!
//! A [`Session`] is a single mutual-exclusion domain: it is neither `Send`
//! nor `Sync`, all native calls are synchronous, and callers wanting
//! parallelism create independent sessions (which may share one loaded
//! [`Gmt`]). Scoped acquisitions (log redirection, virtual files) are
//! closure-based so release runs on every exit path.

pub mod constants;
pub mod data;
mod error;
pub mod loader;
pub mod session;
pub mod sys;
mod vfile;

pub use constants::{
    DATA_FAMILIES, DATA_GEOMETRIES, DATA_MODES, DATA_VIAS, DIRECTIONS, GRID_REGISTRATIONS,
};
pub use data::{DataRef, DataShape, MatrixView, VectorView};
pub use error::{GmtError, Result};
pub use loader::{Gmt, GMT_LIBRARY_PATH_ENV};
pub use session::{Session, SessionInfo, REQUIRED_VERSION};
pub use sys::{GmtApi, NativeApi};
