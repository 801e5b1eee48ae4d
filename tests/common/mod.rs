//! A scripted [`GmtApi`] implementation for exercising the binding layer
//! without a GMT installation.
//!
//! The mock keeps a symbolic constant table, tracks sessions, containers and
//! virtual files, and can be told to fail any single entry point to exercise
//! the status-check paths. `write_data` renders attached columns or matrix
//! blocks as plain text so round-trip tests can re-read what they wrote.

use std::collections::{HashMap, HashSet};
use std::ffi::CStr;
use std::os::raw::{c_int, c_uint, c_void};
use std::path::PathBuf;
use std::sync::Mutex;

use gmt_ffi::GmtApi;

const FAMILY_DATASET: i32 = 0;
const FAMILY_GRID: i32 = 2;
const FAMILY_PALETTE: i32 = 4;
const FAMILY_MATRIX: i32 = 6;
const FAMILY_VECTOR: i32 = 8;
const VIA_VECTOR: i32 = 100;
const VIA_MATRIX: i32 = 200;

const TYPE_INT: i32 = 11;
const TYPE_LONG: i32 = 12;
const TYPE_UINT: i32 = 13;
const TYPE_ULONG: i32 = 14;
const TYPE_FLOAT: i32 = 15;
const TYPE_DOUBLE: i32 = 16;

const LOG_OFF: i32 = 30;
const LOG_SET: i32 = 32;

#[derive(Default)]
struct Container {
    dim: [u64; 4],
    columns: HashMap<u32, Vec<f64>>,
    matrix: Option<(usize, usize, Vec<f64>)>,
}

#[derive(Default)]
struct Inner {
    next_handle: usize,
    sessions: HashSet<usize>,
    destroyed_sessions: Vec<usize>,
    containers: HashMap<usize, Container>,
    open_vfiles: HashMap<String, usize>,
    closed_vfiles: Vec<String>,
    log_dest: Option<PathBuf>,
    calls: HashMap<&'static str, usize>,
    fail: HashSet<&'static str>,
}

pub struct MockApi {
    constants: HashMap<&'static str, i32>,
    defaults: HashMap<&'static str, String>,
    region: [f64; 6],
    inner: Mutex<Inner>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self::with_version("6.4.0")
    }

    pub fn with_version(version: &str) -> Self {
        let constants = HashMap::from([
            ("GMT_SESSION_EXTERNAL", 16),
            ("GMT_PAD_DEFAULT", 2),
            ("GMT_MODULE_CMD", 0),
            ("GMT_STR16", 16),
            ("GMT_IS_FILE", 40),
            ("GMT_LOG_OFF", LOG_OFF),
            ("GMT_LOG_SET", LOG_SET),
            ("GMT_IS_DATASET", FAMILY_DATASET),
            ("GMT_IS_GRID", FAMILY_GRID),
            ("GMT_IS_PALETTE", FAMILY_PALETTE),
            ("GMT_IS_MATRIX", FAMILY_MATRIX),
            ("GMT_IS_VECTOR", FAMILY_VECTOR),
            ("GMT_VIA_VECTOR", VIA_VECTOR),
            ("GMT_VIA_MATRIX", VIA_MATRIX),
            ("GMT_IS_NONE", 50),
            ("GMT_IS_POINT", 51),
            ("GMT_IS_LINE", 52),
            ("GMT_IS_POLYGON", 53),
            ("GMT_IS_PLP", 54),
            ("GMT_IS_SURFACE", 55),
            ("GMT_CONTAINER_ONLY", 60),
            ("GMT_OUTPUT_DATA", 61),
            ("GMT_WRITE_SET", 62),
            ("GMT_CONTAINER_AND_DATA", 63),
            ("GMT_GRID_NODE_REG", 70),
            ("GMT_GRID_PIXEL_REG", 71),
            ("GMT_IN", 80),
            ("GMT_OUT", 81),
            ("GMT_X", 0),
            ("GMT_Y", 1),
            ("GMT_Z", 2),
            ("GMT_INT", TYPE_INT),
            ("GMT_LONG", TYPE_LONG),
            ("GMT_UINT", TYPE_UINT),
            ("GMT_ULONG", TYPE_ULONG),
            ("GMT_FLOAT", TYPE_FLOAT),
            ("GMT_DOUBLE", TYPE_DOUBLE),
        ]);
        let defaults = HashMap::from([
            ("API_VERSION", version.to_string()),
            ("API_PAD", "2".to_string()),
            ("API_BINDIR", "/opt/gmt/bin".to_string()),
            ("API_PLUGINDIR", "/opt/gmt/lib/plugins".to_string()),
            ("API_LIBRARY", "/opt/gmt/lib/libgmt.so".to_string()),
            ("API_CORES", "4".to_string()),
            ("API_IMAGE_LAYOUT", "TRPa".to_string()),
            ("API_GRID_LAYOUT", "rows".to_string()),
        ]);
        Self {
            constants,
            defaults,
            region: [0.0, 10.0, -20.0, -10.0, 0.0, 0.0],
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Force the named entry point to fail from now on.
    pub fn fail(&self, entry_point: &'static str) {
        self.inner.lock().unwrap().fail.insert(entry_point);
    }

    pub fn call_count(&self, entry_point: &'static str) -> usize {
        *self
            .inner
            .lock()
            .unwrap()
            .calls
            .get(entry_point)
            .unwrap_or(&0)
    }

    pub fn destroyed_session_count(&self) -> usize {
        self.inner.lock().unwrap().destroyed_sessions.len()
    }

    pub fn live_session_count(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }

    pub fn is_vfile_open(&self, name: &str) -> bool {
        self.inner.lock().unwrap().open_vfiles.contains_key(name)
    }

    pub fn closed_vfiles(&self) -> Vec<String> {
        self.inner.lock().unwrap().closed_vfiles.clone()
    }

    pub fn log_destination(&self) -> Option<PathBuf> {
        self.inner.lock().unwrap().log_dest.clone()
    }

    fn record(inner: &mut Inner, entry_point: &'static str) -> bool {
        *inner.calls.entry(entry_point).or_insert(0) += 1;
        inner.fail.contains(entry_point)
    }

    /// Read `count` native elements of the given type code as f64.
    unsafe fn read_values(ptr: *const c_void, type_code: i32, count: usize) -> Vec<f64> {
        match type_code {
            TYPE_INT => std::slice::from_raw_parts(ptr as *const i32, count)
                .iter()
                .map(|&v| v as f64)
                .collect(),
            TYPE_LONG => std::slice::from_raw_parts(ptr as *const i64, count)
                .iter()
                .map(|&v| v as f64)
                .collect(),
            TYPE_UINT => std::slice::from_raw_parts(ptr as *const u32, count)
                .iter()
                .map(|&v| v as f64)
                .collect(),
            TYPE_ULONG => std::slice::from_raw_parts(ptr as *const u64, count)
                .iter()
                .map(|&v| v as f64)
                .collect(),
            TYPE_FLOAT => std::slice::from_raw_parts(ptr as *const f32, count)
                .iter()
                .map(|&v| v as f64)
                .collect(),
            TYPE_DOUBLE => std::slice::from_raw_parts(ptr as *const f64, count).to_vec(),
            _ => panic!("unknown type code {type_code}"),
        }
    }
}

impl GmtApi for MockApi {
    fn create_session(&self, _name: &CStr, _pad: c_uint, _mode: c_uint) -> *mut c_void {
        let mut inner = self.inner.lock().unwrap();
        if Self::record(&mut inner, "GMT_Create_Session") {
            return std::ptr::null_mut();
        }
        inner.next_handle += 1;
        let handle = 0x1000 + inner.next_handle;
        inner.sessions.insert(handle);
        handle as *mut c_void
    }

    fn destroy_session(&self, session: *mut c_void) -> c_int {
        let mut inner = self.inner.lock().unwrap();
        if Self::record(&mut inner, "GMT_Destroy_Session") {
            return 1;
        }
        let handle = session as usize;
        if inner.sessions.remove(&handle) {
            inner.destroyed_sessions.push(handle);
            0
        } else {
            1
        }
    }

    fn get_enum(&self, _session: *mut c_void, name: &CStr) -> c_int {
        let mut inner = self.inner.lock().unwrap();
        if Self::record(&mut inner, "GMT_Get_Enum") {
            return -1;
        }
        let name = name.to_str().unwrap_or_default();
        *self.constants.get(name).unwrap_or(&-1)
    }

    fn get_default(&self, _session: *mut c_void, keyword: &CStr, value: &mut [u8]) -> c_int {
        let mut inner = self.inner.lock().unwrap();
        if Self::record(&mut inner, "GMT_Get_Default") {
            return 1;
        }
        let keyword = keyword.to_str().unwrap_or_default();
        match self.defaults.get(keyword) {
            Some(text) => {
                let bytes = text.as_bytes();
                let n = bytes.len().min(value.len() - 1);
                value[..n].copy_from_slice(&bytes[..n]);
                value[n] = 0;
                0
            }
            None => 1,
        }
    }

    fn create_data(
        &self,
        _session: *mut c_void,
        _family: c_uint,
        _geometry: c_uint,
        _mode: c_uint,
        dim: Option<&[u64; 4]>,
        ranges: Option<&[f64]>,
        inc: Option<&[f64]>,
        _registration: c_uint,
        _pad: c_int,
    ) -> *mut c_void {
        let mut inner = self.inner.lock().unwrap();
        if Self::record(&mut inner, "GMT_Create_Data") {
            return std::ptr::null_mut();
        }
        let dim = match (dim, ranges, inc) {
            (Some(dim), _, _) => *dim,
            (None, Some(ranges), Some(inc)) if ranges.len() >= 4 && inc.len() >= 2 => {
                // Node registration: inclusive endpoints.
                let columns = ((ranges[1] - ranges[0]) / inc[0]).round() as u64 + 1;
                let rows = ((ranges[3] - ranges[2]) / inc[1]).round() as u64 + 1;
                [columns, rows, 1, 0]
            }
            _ => return std::ptr::null_mut(),
        };
        inner.next_handle += 1;
        let handle = 0x2000 + inner.next_handle;
        inner.containers.insert(
            handle,
            Container {
                dim,
                ..Container::default()
            },
        );
        handle as *mut c_void
    }

    unsafe fn put_vector(
        &self,
        _session: *mut c_void,
        data: *mut c_void,
        column: c_uint,
        type_code: c_uint,
        vector: *const c_void,
    ) -> c_int {
        let mut inner = self.inner.lock().unwrap();
        if Self::record(&mut inner, "GMT_Put_Vector") {
            return 1;
        }
        let Some(container) = inner.containers.get_mut(&(data as usize)) else {
            return 1;
        };
        if u64::from(column) >= container.dim[0] {
            return 1;
        }
        let rows = container.dim[1] as usize;
        let values = Self::read_values(vector, type_code as i32, rows);
        container.columns.insert(column, values);
        0
    }

    unsafe fn put_matrix(
        &self,
        _session: *mut c_void,
        data: *mut c_void,
        type_code: c_uint,
        _pad: c_int,
        matrix: *const c_void,
    ) -> c_int {
        let mut inner = self.inner.lock().unwrap();
        if Self::record(&mut inner, "GMT_Put_Matrix") {
            return 1;
        }
        let Some(container) = inner.containers.get_mut(&(data as usize)) else {
            return 1;
        };
        let (columns, rows) = (container.dim[0] as usize, container.dim[1] as usize);
        let values = Self::read_values(matrix, type_code as i32, rows * columns);
        container.matrix = Some((rows, columns, values));
        0
    }

    fn write_data(
        &self,
        _session: *mut c_void,
        _family: c_uint,
        _method: c_uint,
        _geometry: c_uint,
        _mode: c_uint,
        _wesn: &[f64; 6],
        output: &CStr,
        data: *mut c_void,
    ) -> c_int {
        let mut inner = self.inner.lock().unwrap();
        if Self::record(&mut inner, "GMT_Write_Data") {
            return 1;
        }
        let Some(container) = inner.containers.get(&(data as usize)) else {
            return 1;
        };
        let mut text = String::new();
        if let Some((rows, columns, values)) = &container.matrix {
            for r in 0..*rows {
                let row: Vec<String> = (0..*columns)
                    .map(|c| format!("{}", values[r * columns + c]))
                    .collect();
                text.push_str(&row.join("\t"));
                text.push('\n');
            }
        } else {
            let rows = container.dim[1] as usize;
            let columns = container.dim[0] as usize;
            for r in 0..rows {
                let row: Vec<String> = (0..columns)
                    .map(|c| {
                        container
                            .columns
                            .get(&(c as u32))
                            .map_or("nan".to_string(), |v| format!("{}", v[r]))
                    })
                    .collect();
                text.push_str(&row.join("\t"));
                text.push('\n');
            }
        }
        let path = output.to_str().unwrap_or_default();
        if std::fs::write(path, text).is_err() {
            return 1;
        }
        0
    }

    fn open_virtualfile(
        &self,
        _session: *mut c_void,
        _family: c_uint,
        _geometry: c_uint,
        _direction: c_uint,
        data: *mut c_void,
        name: &mut [u8],
    ) -> c_int {
        let mut inner = self.inner.lock().unwrap();
        if Self::record(&mut inner, "GMT_Open_VirtualFile") {
            return 1;
        }
        inner.next_handle += 1;
        let generated = format!("@GMTAPI@-{:06}", inner.next_handle);
        let bytes = generated.as_bytes();
        if bytes.len() + 1 > name.len() {
            return 1;
        }
        name[..bytes.len()].copy_from_slice(bytes);
        name[bytes.len()] = 0;
        inner.open_vfiles.insert(generated, data as usize);
        0
    }

    fn close_virtualfile(&self, _session: *mut c_void, name: &CStr) -> c_int {
        let mut inner = self.inner.lock().unwrap();
        if Self::record(&mut inner, "GMT_Close_VirtualFile") {
            return 1;
        }
        let name = name.to_str().unwrap_or_default().to_string();
        if inner.open_vfiles.remove(&name).is_none() {
            // Unknown or already-closed name.
            return 1;
        }
        inner.closed_vfiles.push(name);
        0
    }

    fn call_module(&self, _session: *mut c_void, module: &CStr, _mode: c_int, args: &CStr) -> c_int {
        let mut inner = self.inner.lock().unwrap();
        if Self::record(&mut inner, "GMT_Call_Module") {
            let module = module.to_str().unwrap_or_default();
            let args = args.to_str().unwrap_or_default();
            if let Some(dest) = &inner.log_dest {
                let line = format!(
                    "gmt{module} [ERROR]: Error for input file: No such file ({args})\n"
                );
                let _ = std::fs::write(dest, line);
            }
            return 1;
        }
        0
    }

    fn handle_messages(
        &self,
        _session: *mut c_void,
        mode: c_uint,
        _method: c_uint,
        dest: &CStr,
    ) -> c_int {
        let mut inner = self.inner.lock().unwrap();
        if Self::record(&mut inner, "GMT_Handle_Messages") {
            return 1;
        }
        if mode as i32 == LOG_OFF {
            inner.log_dest = None;
            return 0;
        }
        let dest = dest.to_str().unwrap_or_default();
        if dest.is_empty() {
            return 1;
        }
        inner.log_dest = Some(PathBuf::from(dest));
        0
    }

    fn extract_region(&self, _session: *mut c_void, wesn: &mut [f64; 6]) -> c_int {
        let mut inner = self.inner.lock().unwrap();
        if Self::record(&mut inner, "GMT_Extract_Region") {
            return 1;
        }
        wesn.copy_from_slice(&self.region);
        0
    }
}
