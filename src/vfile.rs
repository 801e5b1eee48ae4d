//! Virtual files: passing containers to module calls in place of file paths.
//!
//! A virtual file is a transient name generated by libgmt, valid only
//! between open and close. The scoped closure API guarantees the close runs
//! on every exit path and that close failures surface instead of being
//! swallowed in cleanup.

use std::ffi::CStr;
use std::os::raw::c_uint;

use crate::constants::{to_cstring, DATA_FAMILIES, DATA_GEOMETRIES, DATA_VIAS, DIRECTIONS};
use crate::data::{DataRef, DataShape, MatrixView, VectorView};
use crate::error::{GmtError, Result};
use crate::session::Session;

impl Session {
    /// Open a container as a named pseudo-file for the duration of a closure.
    ///
    /// `direction` must be `"GMT_IN"` or `"GMT_OUT"`; anything else is
    /// rejected before any native call. The closure receives the generated
    /// name, which must not be used after it returns. If the closure
    /// succeeds but the close reports a non-zero status, the close failure
    /// is returned; a closure error takes precedence (the close is still
    /// attempted).
    pub fn open_virtual_file<T>(
        &self,
        family: &str,
        geometry: &str,
        direction: &str,
        data: DataRef,
        f: impl FnOnce(&str) -> Result<T>,
    ) -> Result<T> {
        let session = self.handle()?;
        let family_int = self.gmt.parse_constant(family, DATA_FAMILIES, DATA_VIAS)?;
        let geometry_int = self.gmt.parse_constant(geometry, DATA_GEOMETRIES, &[])?;
        let direction_int = self.gmt.parse_constant(direction, DIRECTIONS, &[])?;

        // GMT_STR16 is the length of the name buffer GMT writes into.
        let buf_len = self.gmt.get_constant("GMT_STR16")?.max(16) as usize;
        let mut buf = vec![0u8; buf_len];
        let status = self.gmt.api.open_virtualfile(
            session,
            family_int as c_uint,
            geometry_int as c_uint,
            direction_int as c_uint,
            data.as_ptr(),
            &mut buf,
        );
        if status != 0 {
            return Err(GmtError::VirtualFileOpen { status });
        }
        let name = CStr::from_bytes_until_nul(&buf)
            .map_err(|_| GmtError::VirtualFileOpen { status })?
            .to_string_lossy()
            .into_owned();

        let result = f(&name);

        let c_name = to_cstring(&name)?;
        let close_status = self.gmt.api.close_virtualfile(session, &c_name);
        match (result, close_status) {
            (Ok(value), 0) => Ok(value),
            (Ok(_), status) => Err(GmtError::VirtualFileClose { name, status }),
            (Err(e), _) => Err(e),
        }
    }

    /// Build a vector-backed dataset from same-length 1-D arrays (columns in
    /// argument order) and open it as an input virtual file, in one scoped
    /// step.
    pub fn vectors_to_vfile<T>(
        &self,
        vectors: &[VectorView<'_>],
        f: impl FnOnce(&str) -> Result<T>,
    ) -> Result<T> {
        let first = vectors.first().ok_or_else(|| {
            GmtError::InvalidInput("at least one vector is required".to_string())
        })?;
        let rows = first.len();
        if vectors.iter().any(|v| v.len() != rows) {
            let lengths: Vec<usize> = vectors.iter().map(VectorView::len).collect();
            return Err(GmtError::InvalidInput(format!(
                "all vectors must have the same length, got lengths {lengths:?}"
            )));
        }

        let family = "GMT_IS_DATASET|GMT_VIA_VECTOR";
        let geometry = "GMT_IS_POINT";
        let dataset = self.create_data(
            family,
            geometry,
            "GMT_CONTAINER_ONLY",
            DataShape::Dim([vectors.len() as u64, rows as u64, 1, 0]),
        )?;
        for (column, vector) in vectors.iter().enumerate() {
            self.put_vector(dataset, column as u32, vector)?;
        }
        self.open_virtual_file(family, geometry, "GMT_IN", dataset, f)
    }

    /// Build a matrix-backed dataset from a single 2-D array (sized to the
    /// view's own shape, even for slices of larger arrays) and open it as an
    /// input virtual file, in one scoped step.
    pub fn matrix_to_vfile<T>(
        &self,
        matrix: &MatrixView<'_>,
        f: impl FnOnce(&str) -> Result<T>,
    ) -> Result<T> {
        let (rows, columns) = matrix.shape();
        let family = "GMT_IS_DATASET|GMT_VIA_MATRIX";
        let geometry = "GMT_IS_POINT";
        let dataset = self.create_data(
            family,
            geometry,
            "GMT_CONTAINER_ONLY",
            DataShape::Dim([columns as u64, rows as u64, 1, 0]),
        )?;
        self.put_matrix(dataset, matrix, 0)?;
        self.open_virtual_file(family, geometry, "GMT_IN", dataset, f)
    }
}
