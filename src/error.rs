//! Error types for gmt-ffi.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the GMT binding layer.
///
/// Every C-style failure convention of libgmt (null handles, non-zero status
/// codes) is translated into one of these variants; this crate is the only
/// place that translation happens.
#[derive(Debug, Error)]
pub enum GmtError {
    /// No candidate shared library could be loaded.
    #[error("could not find a GMT shared library to load (tried: {tried})")]
    NotFound { tried: String },

    /// The host OS has no known shared-library convention for GMT.
    #[error("operating system '{0}' is not supported")]
    UnsupportedOs(String),

    /// A library loaded but is not a usable libgmt.
    #[error("'{path}' is not a valid GMT shared library: {reason}")]
    InvalidLibrary { path: PathBuf, reason: String },

    /// The loaded GMT is older than the supported floor.
    #[error("GMT version {found} is too old; version {required} or newer is required")]
    VersionTooOld { found: String, required: String },

    /// An operation that needs a live session was called on a destroyed one.
    #[error("no active GMT session; the session has been destroyed")]
    NoSession,

    /// `GMT_Create_Session` returned a null handle.
    #[error("failed to create GMT session '{0}'")]
    SessionCreate(String),

    /// `GMT_Destroy_Session` reported a non-zero status.
    #[error("failed to destroy GMT session (status {status})")]
    SessionDestroy { status: i32 },

    /// Input rejected before any native call was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// `GMT_Get_Enum` does not know the given name.
    #[error("constant '{0}' not found in the GMT shared library")]
    ConstantNotFound(String),

    /// `GMT_Get_Default` rejected the given keyword.
    #[error("failed to get GMT default value for '{0}'")]
    GetDefault(String),

    /// Redirecting the session error stream failed.
    #[error("log redirection failed: {0}")]
    LogRedirect(String),

    /// `GMT_Create_Data` returned a null handle.
    #[error("failed to create an empty GMT data container")]
    DataCreate,

    /// `GMT_Put_Vector` reported a non-zero status.
    #[error("container rejected vector for column {column} (status {status})")]
    PutVector { column: u32, status: i32 },

    /// `GMT_Put_Matrix` reported a non-zero status.
    #[error("container rejected matrix (status {status})")]
    PutMatrix { status: i32 },

    /// `GMT_Write_Data` reported a non-zero status.
    #[error("failed to write data to '{output}' (status {status})")]
    WriteData { output: String, status: i32 },

    /// `GMT_Open_VirtualFile` reported a non-zero status.
    #[error("failed to open virtual file (status {status})")]
    VirtualFileOpen { status: i32 },

    /// `GMT_Close_VirtualFile` reported a non-zero status.
    #[error("failed to close virtual file '{name}' (status {status})")]
    VirtualFileClose { name: String, status: i32 },

    /// A module call failed; the message carries the captured error log.
    #[error(
        "Command '{module}' failed:\n\
         ---------- Error log ----------\n\
         {log}\n\
         -------------------------------"
    )]
    Module { module: String, log: String },

    /// `GMT_Extract_Region` reported a non-zero status.
    #[error("failed to extract region from the current figure (status {status})")]
    ExtractRegion { status: i32 },

    /// File I/O around the captured log file failed.
    #[error("log file I/O failed: {0}")]
    LogIo(#[from] std::io::Error),
}

/// Result type for GMT binding operations.
pub type Result<T> = std::result::Result<T, GmtError>;
