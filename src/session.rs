//! GMT sessions: the unit of native state every other operation needs.
//!
//! There is no hidden "current session" global. A [`Session`] is an explicit
//! value created from a loaded [`Gmt`] and threaded through every call; the
//! native handle lives inside it and is destroyed when the session is
//! destroyed or dropped. A `Session` holds a raw native pointer and is
//! deliberately neither `Send` nor `Sync`, since libgmt is not reentrant
//! per session; parallel callers must create independent sessions.

use std::cell::Cell;
use std::ffi::CStr;
use std::fs;
use std::os::raw::{c_uint, c_void};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::constants::to_cstring;
use crate::error::{GmtError, Result};
use crate::loader::Gmt;

/// Oldest GMT release this binding layer supports.
pub const REQUIRED_VERSION: &str = "6.0.0";

/// Read-only facts about a session's GMT installation, queried from the
/// native defaults table at session creation.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub version: String,
    pub padding: String,
    pub binary_dir: String,
    pub plugin_dir: String,
    pub library_path: String,
    pub cores: String,
    pub image_layout: String,
    pub grid_layout: String,
}

impl SessionInfo {
    fn query(gmt: &Gmt, session: *mut c_void) -> Result<Self> {
        let get = |keyword| get_default_raw(gmt, session, keyword);
        Ok(Self {
            version: get("API_VERSION")?,
            padding: get("API_PAD")?,
            binary_dir: get("API_BINDIR")?,
            plugin_dir: get("API_PLUGINDIR")?,
            library_path: get("API_LIBRARY")?,
            cores: get("API_CORES")?,
            image_layout: get("API_IMAGE_LAYOUT")?,
            grid_layout: get("API_GRID_LAYOUT")?,
        })
    }
}

/// An active GMT session.
pub struct Session {
    pub(crate) gmt: Gmt,
    handle: Option<NonNull<c_void>>,
    name: String,
    info: SessionInfo,
    // At most one log redirection per session; see `with_log_output`.
    log_active: Cell<bool>,
}

impl Session {
    /// Create a named session.
    ///
    /// Fails with [`GmtError::SessionCreate`] if the native call yields a
    /// null handle, and with [`GmtError::VersionTooOld`] if the library
    /// reports a version below [`REQUIRED_VERSION`]. In the latter case the
    /// native session is fully torn down before the error propagates, so no
    /// dangling session survives a failed creation.
    pub fn create(gmt: &Gmt, name: &str) -> Result<Self> {
        let c_name = to_cstring(name)?;
        let pad = gmt.get_constant("GMT_PAD_DEFAULT")? as c_uint;
        let mode = gmt.get_constant("GMT_SESSION_EXTERNAL")? as c_uint;
        let ptr = gmt.api.create_session(&c_name, pad, mode);
        let handle =
            NonNull::new(ptr).ok_or_else(|| GmtError::SessionCreate(name.to_string()))?;
        debug!(name, "created GMT session");

        let teardown = |err| {
            let status = gmt.api.destroy_session(handle.as_ptr());
            if status != 0 {
                warn!(name, status, "failed to destroy session during aborted creation");
            }
            err
        };
        let info = match SessionInfo::query(gmt, handle.as_ptr()) {
            Ok(info) => info,
            Err(e) => return Err(teardown(e)),
        };
        if let Err(e) = check_version(&info.version) {
            return Err(teardown(e));
        }

        Ok(Self {
            gmt: gmt.clone(),
            handle: Some(handle),
            name: name.to_string(),
            info,
            log_active: Cell::new(false),
        })
    }

    /// The session name given at creation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Facts about the GMT installation backing this session.
    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    /// Whether the native handle is still live.
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// The library this session was created from.
    pub fn gmt(&self) -> &Gmt {
        &self.gmt
    }

    /// The live native handle, or [`GmtError::NoSession`] after `destroy`.
    ///
    /// This is the guard every operation goes through before any native call.
    pub(crate) fn handle(&self) -> Result<*mut c_void> {
        self.handle
            .map(NonNull::as_ptr)
            .ok_or(GmtError::NoSession)
    }

    /// Destroy the native session explicitly.
    ///
    /// After this, every operation on the session fails with
    /// [`GmtError::NoSession`]. Destroying twice is also `NoSession`; a
    /// non-zero native status is [`GmtError::SessionDestroy`].
    pub fn destroy(&mut self) -> Result<()> {
        let handle = self.handle.take().ok_or(GmtError::NoSession)?;
        let status = self.gmt.api.destroy_session(handle.as_ptr());
        if status != 0 {
            return Err(GmtError::SessionDestroy { status });
        }
        debug!(name = %self.name, "destroyed GMT session");
        Ok(())
    }

    /// Query a single entry of the native defaults table.
    pub fn get_default(&self, keyword: &str) -> Result<String> {
        let session = self.handle()?;
        get_default_raw(&self.gmt, session, keyword)
    }

    /// Redirect the session's error stream to a file for the duration of a
    /// closure.
    ///
    /// With `logfile: None` a temporary file is created and deleted on every
    /// exit path; a caller-supplied path is used as-is and preserved. The
    /// closure receives the log path while the redirection is active.
    ///
    /// Redirections do not nest: establishing a second one while the first
    /// is active fails fast with [`GmtError::LogRedirect`]. Sequential
    /// redirections on the same session are fine.
    pub fn with_log_output<T>(
        &self,
        logfile: Option<&Path>,
        f: impl FnOnce(&Path) -> Result<T>,
    ) -> Result<T> {
        let session = self.handle()?;
        if self.log_active.get() {
            return Err(GmtError::LogRedirect(
                "a log redirection is already active for this session".to_string(),
            ));
        }

        // The temp file is deleted on drop, i.e. on every exit path of this
        // function; caller-supplied paths are left in place.
        let (_temp, path): (Option<NamedTempFile>, PathBuf) = match logfile {
            Some(p) => (None, p.to_path_buf()),
            None => {
                let file = tempfile::Builder::new()
                    .prefix("gmt-")
                    .suffix(".log")
                    .tempfile()?;
                let path = file.path().to_path_buf();
                (Some(file), path)
            }
        };

        let log_set = self.gmt.get_constant("GMT_LOG_SET")? as c_uint;
        let log_off = self.gmt.get_constant("GMT_LOG_OFF")? as c_uint;
        let is_file = self.gmt.get_constant("GMT_IS_FILE")? as c_uint;
        let c_path = to_cstring(&path.to_string_lossy())?;
        let status = self.gmt.api.handle_messages(session, log_set, is_file, &c_path);
        if status != 0 {
            return Err(GmtError::LogRedirect(format!(
                "failed to set log destination to '{}' (status {status})",
                path.display()
            )));
        }

        self.log_active.set(true);
        let flag = ResetFlag(&self.log_active);
        let result = f(&path);
        drop(flag);

        let empty = to_cstring("")?;
        let restore_status = self.gmt.api.handle_messages(session, log_off, is_file, &empty);
        match (result, restore_status) {
            (Ok(value), 0) => Ok(value),
            (Ok(_), status) => Err(GmtError::LogRedirect(format!(
                "failed to restore log destination (status {status})"
            ))),
            // The guarded block's own error wins; restoration was attempted.
            (Err(e), _) => Err(e),
        }
    }

    /// Invoke a named GMT module with a single argument string.
    ///
    /// The call runs inside a temporary log redirection; on a non-zero
    /// status the captured diagnostic text is embedded verbatim in the
    /// returned [`GmtError::Module`].
    pub fn call_module(&self, module: &str, args: &str) -> Result<()> {
        self.handle()?;
        let mode = self.gmt.get_constant("GMT_MODULE_CMD")?;
        let c_module = to_cstring(module)?;
        let c_args = to_cstring(args)?;
        debug!(module, args, "calling GMT module");
        self.with_log_output(None, |logfile| {
            // Re-read the handle inside the redirection scope.
            let session = self.handle()?;
            let status = self.gmt.api.call_module(session, &c_module, mode, &c_args);
            if status == 0 {
                return Ok(());
            }
            let log = read_log(logfile);
            Err(GmtError::Module {
                module: module.to_string(),
                log: log.trim().to_string(),
            })
        })
    }

    /// Bounding region of the currently active figure, as
    /// `[west, east, south, north, zmin, zmax]`.
    ///
    /// Reads the state of the *active* figure, not merely the most recently
    /// created one. Fails with [`GmtError::ExtractRegion`] when nothing has
    /// been plotted in this session yet.
    pub fn extract_region(&self) -> Result<[f64; 6]> {
        let session = self.handle()?;
        let mut wesn = [0.0f64; 6];
        let status = self.gmt.api.extract_region(session, &mut wesn);
        if status != 0 {
            return Err(GmtError::ExtractRegion { status });
        }
        Ok(wesn)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let status = self.gmt.api.destroy_session(handle.as_ptr());
            if status != 0 {
                warn!(name = %self.name, status, "failed to destroy GMT session on drop");
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("active", &self.handle.is_some())
            .field("version", &self.info.version)
            .finish()
    }
}

/// Clears the redirection flag even if the guarded closure panics.
struct ResetFlag<'a>(&'a Cell<bool>);

impl Drop for ResetFlag<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Read a captured log file. An unreadable file yields a placeholder
/// instead of silently dropping the diagnostic.
fn read_log(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| format!("log could not be read: {e}"))
}

fn get_default_raw(gmt: &Gmt, session: *mut c_void, keyword: &str) -> Result<String> {
    let c_keyword = to_cstring(keyword)?;
    let mut buf = [0u8; 256];
    let status = gmt.api.get_default(session, &c_keyword, &mut buf);
    if status != 0 {
        return Err(GmtError::GetDefault(keyword.to_string()));
    }
    let value = CStr::from_bytes_until_nul(&buf)
        .map_err(|_| GmtError::GetDefault(keyword.to_string()))?;
    Ok(value.to_string_lossy().into_owned())
}

/// Compare a reported `API_VERSION` string against [`REQUIRED_VERSION`].
fn check_version(found: &str) -> Result<()> {
    let too_old = || GmtError::VersionTooOld {
        found: found.to_string(),
        required: REQUIRED_VERSION.to_string(),
    };
    let found_triple = parse_version(found).ok_or_else(too_old)?;
    let required_triple =
        parse_version(REQUIRED_VERSION).expect("required version literal is well formed");
    if found_triple < required_triple {
        return Err(too_old());
    }
    Ok(())
}

/// Parse the leading `major.minor.patch` triple of a version string,
/// tolerating suffixes like `6.1.1_rc1`.
fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
    let numeric: &str = version
        .split(|c: char| !c.is_ascii_digit() && c != '.')
        .next()?;
    let mut parts = numeric.split('.').filter(|p| !p.is_empty());
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Some((major, minor, patch))
}
