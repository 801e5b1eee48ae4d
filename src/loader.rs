//! Locating and loading the GMT shared library.
//!
//! Resolution order: the `GMT_LIBRARY_PATH` environment variable (a direct
//! file path, or a directory searched for the platform library name), then
//! the dynamic loader's own search path. No session is created here; the
//! result is a [`Gmt`] value holding the resolved function table.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use tracing::debug;

use crate::error::{GmtError, Result};
use crate::sys::{GmtApi, NativeApi};

/// Environment variable consulted for library discovery.
pub const GMT_LIBRARY_PATH_ENV: &str = "GMT_LIBRARY_PATH";

/// A loaded, validated GMT shared library.
///
/// Cloning is cheap; clones share the same function table. Sessions created
/// from any clone are independent of each other.
#[derive(Clone)]
pub struct Gmt {
    pub(crate) api: Arc<dyn GmtApi>,
    path: PathBuf,
}

impl std::fmt::Debug for Gmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gmt").field("path", &self.path).finish()
    }
}

impl Gmt {
    /// Load libgmt, honoring `GMT_LIBRARY_PATH` if set.
    pub fn load() -> Result<Self> {
        Self::load_with_override(env::var_os(GMT_LIBRARY_PATH_ENV).map(PathBuf::from))
    }

    /// Load libgmt with an explicit override path (a library file or a
    /// directory containing one), bypassing the environment variable.
    pub fn load_with_override(override_path: Option<PathBuf>) -> Result<Self> {
        let candidates = clib_candidates(override_path.as_deref(), env::consts::OS)?;
        let mut tried = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            match unsafe { Library::new(candidate) } {
                Ok(lib) => {
                    debug!(path = %candidate.display(), "loaded GMT shared library");
                    let api = NativeApi::from_library(lib, candidate)?;
                    return Ok(Self {
                        api: Arc::new(api),
                        path: candidate.clone(),
                    });
                }
                Err(e) => tried.push(format!("{}: {e}", candidate.display())),
            }
        }
        Err(GmtError::NotFound {
            tried: tried.join("; "),
        })
    }

    /// Build a `Gmt` from an alternate [`GmtApi`] implementation.
    ///
    /// This is the seam used by the test suite to exercise the binding layer
    /// against a scripted API instead of a real libgmt.
    pub fn with_api(api: Arc<dyn GmtApi>) -> Self {
        Self {
            api,
            path: PathBuf::new(),
        }
    }

    /// Path of the shared library this instance was loaded from.
    ///
    /// Empty for instances built with [`Gmt::with_api`].
    pub fn library_path(&self) -> &Path {
        &self.path
    }
}

/// Shared-library file extension for the given OS name.
pub(crate) fn clib_extension(os: &str) -> Result<&'static str> {
    if os.starts_with("linux") {
        Ok("so")
    } else if os == "macos" || os == "darwin" {
        Ok("dylib")
    } else {
        Err(GmtError::UnsupportedOs(os.to_string()))
    }
}

/// Platform file name of the GMT shared library.
pub(crate) fn clib_name(os: &str) -> Result<String> {
    Ok(format!("libgmt.{}", clib_extension(os)?))
}

/// Candidate paths to try, in order.
pub(crate) fn clib_candidates(override_path: Option<&Path>, os: &str) -> Result<Vec<PathBuf>> {
    let name = clib_name(os)?;
    match override_path {
        // An explicit override is authoritative: no silent fallback to some
        // other installation when it turns out to be broken.
        Some(path) if path.is_dir() => Ok(vec![path.join(&name)]),
        Some(path) => Ok(vec![path.to_path_buf()]),
        // Bare name: resolved through the dynamic loader's search path.
        None => Ok(vec![PathBuf::from(name)]),
    }
}
