//! Native data containers and host-array marshalling.
//!
//! Host arrays enter GMT through two container shapes: vector-backed
//! (column-oriented, one typed array per column) and matrix-backed (a single
//! 2-D block). The supported element types are a closed set of 32/64-bit
//! signed and unsigned integers and 32/64-bit floats, modelled as the
//! tagged views [`VectorView`] and [`MatrixView`] with one conversion path
//! per variant. Anything else is unrepresentable rather than checked at
//! runtime.
//!
//! Containers are owned by the session on the native side and released at
//! session destruction; [`DataRef`] is therefore a plain non-owning handle.

use std::os::raw::{c_uint, c_void};
use std::ptr::NonNull;

use ndarray::{ArrayView1, ArrayView2, ArrayViewD, Ix1, Ix2};

use crate::constants::{DATA_FAMILIES, DATA_GEOMETRIES, DATA_MODES, DATA_VIAS, GRID_REGISTRATIONS};
use crate::error::{GmtError, Result};
use crate::session::Session;

/// Non-owning handle to a native data container.
///
/// The session owns the container; this value is only valid while the
/// session that created it is alive.
#[derive(Clone, Copy, Debug)]
pub struct DataRef(NonNull<c_void>);

impl DataRef {
    pub(crate) fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// How to size a new container: explicit counts, or a spatial extent and
/// step from which GMT derives the counts.
#[derive(Clone, Copy, Debug)]
pub enum DataShape<'a> {
    /// `[columns, rows, layers, dtype]`, used as-is.
    Dim([u64; 4]),
    /// Spatial extent (`[w, e, s, n]`, optionally with z limits) and
    /// per-dimension increments. `registration` defaults to node
    /// registration when omitted.
    Range {
        ranges: &'a [f64],
        inc: &'a [f64],
        registration: Option<&'a str>,
    },
}

macro_rules! element_types {
    ($callback:ident) => {
        $callback! {
            I32 => i32, "GMT_INT";
            I64 => i64, "GMT_LONG";
            U32 => u32, "GMT_UINT";
            U64 => u64, "GMT_ULONG";
            F32 => f32, "GMT_FLOAT";
            F64 => f64, "GMT_DOUBLE";
        }
    };
}

macro_rules! define_vector_view {
    ($($variant:ident => $ty:ty, $name:literal;)*) => {
        /// A 1-D host array of one of the supported element types.
        #[derive(Clone, Debug)]
        pub enum VectorView<'a> {
            $($variant(ArrayView1<'a, $ty>),)*
        }

        impl VectorView<'_> {
            pub fn len(&self) -> usize {
                match self {
                    $(Self::$variant(v) => v.len(),)*
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// The GMT type constant name for this element type.
            pub(crate) fn type_name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $name,)*
                }
            }

            /// Hand a C-contiguous pointer to the data to `f`, compacting a
            /// strided view first if needed. The backing buffer lives for
            /// the duration of the call only.
            pub(crate) fn with_ptr<R>(&self, f: impl FnOnce(*const c_void) -> R) -> R {
                match self {
                    $(Self::$variant(v) => {
                        let compact = v.as_standard_layout();
                        f(compact.as_ptr().cast())
                    })*
                }
            }
        }

        $(
            impl<'a> From<&'a [$ty]> for VectorView<'a> {
                fn from(slice: &'a [$ty]) -> Self {
                    Self::$variant(ArrayView1::from(slice))
                }
            }

            impl<'a> From<ArrayView1<'a, $ty>> for VectorView<'a> {
                fn from(view: ArrayView1<'a, $ty>) -> Self {
                    Self::$variant(view)
                }
            }

            impl<'a> TryFrom<ArrayViewD<'a, $ty>> for VectorView<'a> {
                type Error = GmtError;

                fn try_from(view: ArrayViewD<'a, $ty>) -> Result<Self> {
                    let ndim = view.ndim();
                    view.into_dimensionality::<Ix1>()
                        .map(Self::$variant)
                        .map_err(|_| GmtError::InvalidInput(format!(
                            "expected a 1-D array, got {ndim} dimension(s)"
                        )))
                }
            }
        )*
    };
}

macro_rules! define_matrix_view {
    ($($variant:ident => $ty:ty, $name:literal;)*) => {
        /// A 2-D host array of one of the supported element types.
        ///
        /// The view may be a non-contiguous slice of a larger array; only
        /// the slice's values are marshalled, sized to the slice's shape.
        #[derive(Clone, Debug)]
        pub enum MatrixView<'a> {
            $($variant(ArrayView2<'a, $ty>),)*
        }

        impl MatrixView<'_> {
            /// `(rows, columns)` of the view itself.
            pub fn shape(&self) -> (usize, usize) {
                match self {
                    $(Self::$variant(v) => (v.nrows(), v.ncols()),)*
                }
            }

            pub(crate) fn type_name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $name,)*
                }
            }

            pub(crate) fn with_ptr<R>(&self, f: impl FnOnce(*const c_void) -> R) -> R {
                match self {
                    $(Self::$variant(v) => {
                        let compact = v.as_standard_layout();
                        f(compact.as_ptr().cast())
                    })*
                }
            }
        }

        $(
            impl<'a> From<ArrayView2<'a, $ty>> for MatrixView<'a> {
                fn from(view: ArrayView2<'a, $ty>) -> Self {
                    Self::$variant(view)
                }
            }

            impl<'a> TryFrom<ArrayViewD<'a, $ty>> for MatrixView<'a> {
                type Error = GmtError;

                fn try_from(view: ArrayViewD<'a, $ty>) -> Result<Self> {
                    let ndim = view.ndim();
                    view.into_dimensionality::<Ix2>()
                        .map(Self::$variant)
                        .map_err(|_| GmtError::InvalidInput(format!(
                            "expected a 2-D array, got {ndim} dimension(s)"
                        )))
                }
            }
        )*
    };
}

element_types!(define_vector_view);
element_types!(define_matrix_view);

impl Session {
    /// Create an empty native container (dataset or grid).
    ///
    /// `family` may carry a `via` modifier selecting the backing
    /// representation (for example `"GMT_IS_DATASET|GMT_VIA_VECTOR"`). All
    /// symbolic arguments are validated before any native call; a null
    /// handle from the library is [`GmtError::DataCreate`].
    pub fn create_data(
        &self,
        family: &str,
        geometry: &str,
        mode: &str,
        shape: DataShape<'_>,
    ) -> Result<DataRef> {
        let session = self.handle()?;
        let family_int = self.gmt.parse_constant(family, DATA_FAMILIES, DATA_VIAS)?;
        let geometry_int = self.gmt.parse_constant(geometry, DATA_GEOMETRIES, &[])?;
        let mode_int = self.gmt.parse_constant(mode, DATA_MODES, &[])?;
        let pad = self.gmt.get_constant("GMT_PAD_DEFAULT")?;

        let (dim, ranges, inc, registration) = match shape {
            DataShape::Dim(dim) => {
                let reg = self.gmt.get_constant("GMT_GRID_NODE_REG")?;
                (Some(dim), None, None, reg)
            }
            DataShape::Range {
                ranges,
                inc,
                registration,
            } => {
                // The native call reads fixed-size blocks from these slices;
                // a wrong length must never reach it.
                if !matches!(ranges.len(), 4 | 6) {
                    return Err(GmtError::InvalidInput(format!(
                        "ranges must have 4 (or 6, with z limits) values, got {}",
                        ranges.len()
                    )));
                }
                if !matches!(inc.len(), 2 | 3) {
                    return Err(GmtError::InvalidInput(format!(
                        "inc must have 2 (or 3, with a z step) values, got {}",
                        inc.len()
                    )));
                }
                let reg_name = registration.unwrap_or("GMT_GRID_NODE_REG");
                let reg = self
                    .gmt
                    .parse_constant(reg_name, GRID_REGISTRATIONS, &[])?;
                (None, Some(ranges), Some(inc), reg)
            }
        };

        let ptr = self.gmt.api.create_data(
            session,
            family_int as c_uint,
            geometry_int as c_uint,
            mode_int as c_uint,
            dim.as_ref(),
            ranges,
            inc,
            registration as c_uint,
            pad,
        );
        NonNull::new(ptr).map(DataRef).ok_or(GmtError::DataCreate)
    }

    /// Attach a 1-D array to one column of a vector-backed container.
    ///
    /// A non-zero native status (for example a column index beyond the
    /// container's declared column count) is [`GmtError::PutVector`].
    pub fn put_vector(&self, data: DataRef, column: u32, vector: &VectorView<'_>) -> Result<()> {
        let session = self.handle()?;
        let type_code = self.gmt.get_constant(vector.type_name())? as c_uint;
        let status = vector.with_ptr(|ptr| unsafe {
            self.gmt
                .api
                .put_vector(session, data.as_ptr(), column, type_code, ptr)
        });
        if status != 0 {
            return Err(GmtError::PutVector { column, status });
        }
        Ok(())
    }

    /// Attach a 2-D array to a matrix-backed container.
    pub fn put_matrix(&self, data: DataRef, matrix: &MatrixView<'_>, pad: i32) -> Result<()> {
        let session = self.handle()?;
        let type_code = self.gmt.get_constant(matrix.type_name())? as c_uint;
        let status = matrix.with_ptr(|ptr| unsafe {
            self.gmt
                .api
                .put_matrix(session, data.as_ptr(), type_code, pad, ptr)
        });
        if status != 0 {
            return Err(GmtError::PutMatrix { status });
        }
        Ok(())
    }

    /// Write a container to a file path through the native library.
    pub fn write_data(
        &self,
        family: &str,
        geometry: &str,
        mode: &str,
        wesn: &[f64; 6],
        output: &str,
        data: DataRef,
    ) -> Result<()> {
        let session = self.handle()?;
        let family_int = self.gmt.parse_constant(family, DATA_FAMILIES, DATA_VIAS)?;
        let geometry_int = self.gmt.parse_constant(geometry, DATA_GEOMETRIES, &[])?;
        let mode_int = self.gmt.get_constant(mode)?;
        let method = self.gmt.get_constant("GMT_IS_FILE")? as c_uint;
        let c_output = crate::constants::to_cstring(output)?;
        let status = self.gmt.api.write_data(
            session,
            family_int as c_uint,
            method,
            geometry_int as c_uint,
            mode_int as c_uint,
            wesn,
            &c_output,
            data.as_ptr(),
        );
        if status != 0 {
            return Err(GmtError::WriteData {
                output: output.to_string(),
                status,
            });
        }
        Ok(())
    }
}
