//! Symbolic GMT constants and composite constant expressions.
//!
//! The shared library's own name table (`GMT_Get_Enum`) is the source of
//! truth for values; this module only adds the namespace validation on top.

use std::ffi::CString;

use crate::error::{GmtError, Result};
use crate::loader::Gmt;
use crate::sys::GMT_NOTSET;

/// Valid data family names for container creation.
pub const DATA_FAMILIES: &[&str] = &[
    "GMT_IS_DATASET",
    "GMT_IS_GRID",
    "GMT_IS_PALETTE",
    "GMT_IS_MATRIX",
    "GMT_IS_VECTOR",
];

/// Valid `via` modifiers selecting the backing representation.
pub const DATA_VIAS: &[&str] = &["GMT_VIA_MATRIX", "GMT_VIA_VECTOR"];

/// Valid geometry names for container creation.
pub const DATA_GEOMETRIES: &[&str] = &[
    "GMT_IS_NONE",
    "GMT_IS_POINT",
    "GMT_IS_LINE",
    "GMT_IS_POLYGON",
    "GMT_IS_PLP",
    "GMT_IS_SURFACE",
];

/// Valid container creation modes.
pub const DATA_MODES: &[&str] = &["GMT_CONTAINER_ONLY", "GMT_OUTPUT_DATA"];

/// Valid grid registration names.
pub const GRID_REGISTRATIONS: &[&str] = &["GMT_GRID_PIXEL_REG", "GMT_GRID_NODE_REG"];

/// Valid virtual file directions.
pub const DIRECTIONS: &[&str] = &["GMT_IN", "GMT_OUT"];

impl Gmt {
    /// Look up a symbolic constant in the shared library.
    ///
    /// Fails with [`GmtError::ConstantNotFound`] for names the library does
    /// not know.
    pub fn get_constant(&self, name: &str) -> Result<i32> {
        let c_name = to_cstring(name)?;
        // The name table is session independent; a null session is fine.
        let value = self.api.get_enum(std::ptr::null_mut(), &c_name);
        if value == GMT_NOTSET || value < 0 {
            return Err(GmtError::ConstantNotFound(name.to_string()));
        }
        Ok(value)
    }

    /// Resolve a possibly composite constant expression like
    /// `"GMT_IS_DATASET|GMT_VIA_VECTOR"`.
    ///
    /// The first `|`-separated token must be a member of `valid`; every
    /// remaining token must be a member of `valid_modifiers` (pass an empty
    /// slice to reject modifiers entirely). The result is the sum of the
    /// resolved values, so `parse("A|B")` equals `get(A) + get(B)`.
    pub fn parse_constant(
        &self,
        expression: &str,
        valid: &[&str],
        valid_modifiers: &[&str],
    ) -> Result<i32> {
        let tokens = validate_expression(expression, valid, valid_modifiers)?;
        let mut total = 0;
        for token in tokens {
            total += self.get_constant(token)?;
        }
        Ok(total)
    }
}

/// Split a composite expression and validate each token against its
/// namespace, without touching the native library.
fn validate_expression<'a>(
    expression: &'a str,
    valid: &[&str],
    valid_modifiers: &[&str],
) -> Result<Vec<&'a str>> {
    let mut parts = expression.split('|');
    let primary = parts.next().unwrap_or_default();
    if !valid.contains(&primary) {
        return Err(GmtError::InvalidInput(format!(
            "'{primary}' is not a valid name in {valid:?} (expression '{expression}')"
        )));
    }
    let mut tokens = vec![primary];
    for modifier in parts {
        if valid_modifiers.is_empty() {
            return Err(GmtError::InvalidInput(format!(
                "modifiers not allowed since valid_modifiers were not given (expression \
                 '{expression}')"
            )));
        }
        if !valid_modifiers.contains(&modifier) {
            return Err(GmtError::InvalidInput(format!(
                "'{modifier}' is not a valid modifier in {valid_modifiers:?} (expression \
                 '{expression}')"
            )));
        }
        tokens.push(modifier);
    }
    Ok(tokens)
}

pub(crate) fn to_cstring(s: &str) -> Result<CString> {
    CString::new(s).map_err(|_| GmtError::InvalidInput(format!("null byte in string: {s:?}")))
}
