//! Low-level GMT wire contract.
//!
//! The GMT C API is consumed through the [`GmtApi`] trait: one method per
//! native entry point, using the C calling conventions verbatim (null handle
//! or non-zero status signals failure). [`NativeApi`] is the production
//! implementation, holding a function-pointer table resolved at runtime with
//! `libloading`. Tests substitute their own implementation to exercise the
//! status-check paths without a GMT installation.

#![allow(non_snake_case)]

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_uint, c_void};
use std::path::Path;

use libloading::{Library, Symbol};

use crate::error::{GmtError, Result};

/// Sentinel returned by `GMT_Get_Enum` for unknown names.
pub const GMT_NOTSET: c_int = -1;

/// The native entry points this binding layer consumes.
///
/// Methods that accept raw data pointers are `unsafe`: the caller must keep
/// the pointed-to buffer alive and correctly sized for the duration of the
/// call, since libgmt performs no validation of its own.
pub trait GmtApi: Send + Sync {
    fn create_session(&self, name: &CStr, pad: c_uint, mode: c_uint) -> *mut c_void;

    fn destroy_session(&self, session: *mut c_void) -> c_int;

    /// Resolve a symbolic constant. The session may be null; the name table
    /// does not depend on session state.
    fn get_enum(&self, session: *mut c_void, name: &CStr) -> c_int;

    /// Query the defaults table, writing a zero-terminated string into `value`.
    fn get_default(&self, session: *mut c_void, keyword: &CStr, value: &mut [u8]) -> c_int;

    /// Create an empty data container. Exactly one of `dim` and
    /// `ranges`/`inc` is expected by libgmt; the other side is passed null.
    #[allow(clippy::too_many_arguments)]
    fn create_data(
        &self,
        session: *mut c_void,
        family: c_uint,
        geometry: c_uint,
        mode: c_uint,
        dim: Option<&[u64; 4]>,
        ranges: Option<&[f64]>,
        inc: Option<&[f64]>,
        registration: c_uint,
        pad: c_int,
    ) -> *mut c_void;

    /// # Safety
    /// `vector` must point to at least as many elements of the type named by
    /// `type_code` as the container declares rows.
    unsafe fn put_vector(
        &self,
        session: *mut c_void,
        data: *mut c_void,
        column: c_uint,
        type_code: c_uint,
        vector: *const c_void,
    ) -> c_int;

    /// # Safety
    /// `matrix` must point to a C-contiguous block matching the container's
    /// declared rows and columns in the type named by `type_code`.
    unsafe fn put_matrix(
        &self,
        session: *mut c_void,
        data: *mut c_void,
        type_code: c_uint,
        pad: c_int,
        matrix: *const c_void,
    ) -> c_int;

    #[allow(clippy::too_many_arguments)]
    fn write_data(
        &self,
        session: *mut c_void,
        family: c_uint,
        method: c_uint,
        geometry: c_uint,
        mode: c_uint,
        wesn: &[f64; 6],
        output: &CStr,
        data: *mut c_void,
    ) -> c_int;

    /// Open a container as a named pseudo-file, writing the generated
    /// zero-terminated name into `name`.
    fn open_virtualfile(
        &self,
        session: *mut c_void,
        family: c_uint,
        geometry: c_uint,
        direction: c_uint,
        data: *mut c_void,
        name: &mut [u8],
    ) -> c_int;

    fn close_virtualfile(&self, session: *mut c_void, name: &CStr) -> c_int;

    fn call_module(&self, session: *mut c_void, module: &CStr, mode: c_int, args: &CStr) -> c_int;

    /// Redirect the session error stream (`GMT_Handle_Messages`).
    fn handle_messages(
        &self,
        session: *mut c_void,
        mode: c_uint,
        method: c_uint,
        dest: &CStr,
    ) -> c_int;

    /// Read the bounding region of the currently active figure into `wesn`.
    fn extract_region(&self, session: *mut c_void, wesn: &mut [f64; 6]) -> c_int;
}

/// GMT function pointers resolved from the loaded shared library.
struct Functions {
    GMT_Create_Session:
        unsafe extern "C" fn(*const c_char, c_uint, c_uint, *const c_void) -> *mut c_void,
    GMT_Destroy_Session: unsafe extern "C" fn(*mut c_void) -> c_int,
    GMT_Get_Enum: unsafe extern "C" fn(*mut c_void, *const c_char) -> c_int,
    GMT_Get_Default: unsafe extern "C" fn(*mut c_void, *const c_char, *mut c_char) -> c_int,
    #[allow(clippy::type_complexity)]
    GMT_Create_Data: unsafe extern "C" fn(
        *mut c_void,
        c_uint,
        c_uint,
        c_uint,
        *const u64,
        *const f64,
        *const f64,
        c_uint,
        c_int,
        *mut c_void,
    ) -> *mut c_void,
    GMT_Put_Vector:
        unsafe extern "C" fn(*mut c_void, *mut c_void, c_uint, c_uint, *const c_void) -> c_int,
    GMT_Put_Matrix:
        unsafe extern "C" fn(*mut c_void, *mut c_void, c_uint, c_int, *const c_void) -> c_int,
    #[allow(clippy::type_complexity)]
    GMT_Write_Data: unsafe extern "C" fn(
        *mut c_void,
        c_uint,
        c_uint,
        c_uint,
        c_uint,
        *const f64,
        *const c_char,
        *mut c_void,
    ) -> c_int,
    GMT_Open_VirtualFile: unsafe extern "C" fn(
        *mut c_void,
        c_uint,
        c_uint,
        c_uint,
        *mut c_void,
        *mut c_char,
    ) -> c_int,
    GMT_Close_VirtualFile: unsafe extern "C" fn(*mut c_void, *const c_char) -> c_int,
    GMT_Call_Module:
        unsafe extern "C" fn(*mut c_void, *const c_char, c_int, *const c_void) -> c_int,
    GMT_Handle_Messages:
        unsafe extern "C" fn(*mut c_void, c_uint, c_uint, *const c_char) -> c_int,
    GMT_Extract_Region: unsafe extern "C" fn(*mut c_void, *const c_char, *mut f64) -> c_int,
}

impl Functions {
    unsafe fn load(lib: &Library, path: &Path) -> Result<Self> {
        macro_rules! load_func {
            ($name:ident) => {{
                let sym: Symbol<unsafe extern "C" fn()> = lib
                    .get(stringify!($name).as_bytes())
                    .map_err(|e| GmtError::InvalidLibrary {
                        path: path.to_path_buf(),
                        reason: format!("missing symbol {}: {e}", stringify!($name)),
                    })?;
                std::mem::transmute(*sym)
            }};
        }

        Ok(Self {
            GMT_Create_Session: load_func!(GMT_Create_Session),
            GMT_Destroy_Session: load_func!(GMT_Destroy_Session),
            GMT_Get_Enum: load_func!(GMT_Get_Enum),
            GMT_Get_Default: load_func!(GMT_Get_Default),
            GMT_Create_Data: load_func!(GMT_Create_Data),
            GMT_Put_Vector: load_func!(GMT_Put_Vector),
            GMT_Put_Matrix: load_func!(GMT_Put_Matrix),
            GMT_Write_Data: load_func!(GMT_Write_Data),
            GMT_Open_VirtualFile: load_func!(GMT_Open_VirtualFile),
            GMT_Close_VirtualFile: load_func!(GMT_Close_VirtualFile),
            GMT_Call_Module: load_func!(GMT_Call_Module),
            GMT_Handle_Messages: load_func!(GMT_Handle_Messages),
            GMT_Extract_Region: load_func!(GMT_Extract_Region),
        })
    }
}

/// [`GmtApi`] backed by a shared library loaded at runtime.
pub struct NativeApi {
    // Keeps the library mapped for as long as the function table is alive.
    _lib: Library,
    funcs: Functions,
}

// SAFETY: the table holds only extern "C" function pointers.
unsafe impl Send for NativeApi {}
unsafe impl Sync for NativeApi {}

impl NativeApi {
    /// Resolve the full function table from an already-opened library.
    ///
    /// Fails with [`GmtError::InvalidLibrary`] if any required entry point is
    /// missing.
    pub(crate) fn from_library(lib: Library, path: &Path) -> Result<Self> {
        let funcs = unsafe { Functions::load(&lib, path)? };
        Ok(Self { _lib: lib, funcs })
    }
}

impl GmtApi for NativeApi {
    fn create_session(&self, name: &CStr, pad: c_uint, mode: c_uint) -> *mut c_void {
        unsafe { (self.funcs.GMT_Create_Session)(name.as_ptr(), pad, mode, std::ptr::null()) }
    }

    fn destroy_session(&self, session: *mut c_void) -> c_int {
        unsafe { (self.funcs.GMT_Destroy_Session)(session) }
    }

    fn get_enum(&self, session: *mut c_void, name: &CStr) -> c_int {
        unsafe { (self.funcs.GMT_Get_Enum)(session, name.as_ptr()) }
    }

    fn get_default(&self, session: *mut c_void, keyword: &CStr, value: &mut [u8]) -> c_int {
        unsafe {
            (self.funcs.GMT_Get_Default)(session, keyword.as_ptr(), value.as_mut_ptr().cast())
        }
    }

    fn create_data(
        &self,
        session: *mut c_void,
        family: c_uint,
        geometry: c_uint,
        mode: c_uint,
        dim: Option<&[u64; 4]>,
        ranges: Option<&[f64]>,
        inc: Option<&[f64]>,
        registration: c_uint,
        pad: c_int,
    ) -> *mut c_void {
        let dim_ptr = dim.map_or(std::ptr::null(), |d| d.as_ptr());
        let ranges_ptr = ranges.map_or(std::ptr::null(), <[f64]>::as_ptr);
        let inc_ptr = inc.map_or(std::ptr::null(), <[f64]>::as_ptr);
        unsafe {
            (self.funcs.GMT_Create_Data)(
                session,
                family,
                geometry,
                mode,
                dim_ptr,
                ranges_ptr,
                inc_ptr,
                registration,
                pad,
                std::ptr::null_mut(),
            )
        }
    }

    unsafe fn put_vector(
        &self,
        session: *mut c_void,
        data: *mut c_void,
        column: c_uint,
        type_code: c_uint,
        vector: *const c_void,
    ) -> c_int {
        (self.funcs.GMT_Put_Vector)(session, data, column, type_code, vector)
    }

    unsafe fn put_matrix(
        &self,
        session: *mut c_void,
        data: *mut c_void,
        type_code: c_uint,
        pad: c_int,
        matrix: *const c_void,
    ) -> c_int {
        (self.funcs.GMT_Put_Matrix)(session, data, type_code, pad, matrix)
    }

    fn write_data(
        &self,
        session: *mut c_void,
        family: c_uint,
        method: c_uint,
        geometry: c_uint,
        mode: c_uint,
        wesn: &[f64; 6],
        output: &CStr,
        data: *mut c_void,
    ) -> c_int {
        unsafe {
            (self.funcs.GMT_Write_Data)(
                session,
                family,
                method,
                geometry,
                mode,
                wesn.as_ptr(),
                output.as_ptr(),
                data,
            )
        }
    }

    fn open_virtualfile(
        &self,
        session: *mut c_void,
        family: c_uint,
        geometry: c_uint,
        direction: c_uint,
        data: *mut c_void,
        name: &mut [u8],
    ) -> c_int {
        unsafe {
            (self.funcs.GMT_Open_VirtualFile)(
                session,
                family,
                geometry,
                direction,
                data,
                name.as_mut_ptr().cast(),
            )
        }
    }

    fn close_virtualfile(&self, session: *mut c_void, name: &CStr) -> c_int {
        unsafe { (self.funcs.GMT_Close_VirtualFile)(session, name.as_ptr()) }
    }

    fn call_module(&self, session: *mut c_void, module: &CStr, mode: c_int, args: &CStr) -> c_int {
        unsafe {
            (self.funcs.GMT_Call_Module)(session, module.as_ptr(), mode, args.as_ptr().cast())
        }
    }

    fn handle_messages(
        &self,
        session: *mut c_void,
        mode: c_uint,
        method: c_uint,
        dest: &CStr,
    ) -> c_int {
        unsafe { (self.funcs.GMT_Handle_Messages)(session, mode, method, dest.as_ptr()) }
    }

    fn extract_region(&self, session: *mut c_void, wesn: &mut [f64; 6]) -> c_int {
        unsafe {
            (self.funcs.GMT_Extract_Region)(session, std::ptr::null(), wesn.as_mut_ptr())
        }
    }
}
