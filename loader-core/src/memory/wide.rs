//! UTF-16 encoding helpers for paths and command lines.

use std::path::Path;

/// Encode text as a NUL-terminated UTF-16 buffer.
pub fn to_wide(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Encode a path as a NUL-terminated UTF-16 buffer.
#[cfg(windows)]
pub fn path_to_wide(path: &Path) -> Vec<u16> {
    use std::os::windows::ffi::OsStrExt;

    path.as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

/// Encode a path as a NUL-terminated UTF-16 buffer.
#[cfg(not(windows))]
pub fn path_to_wide(path: &Path) -> Vec<u16> {
    to_wide(&path.to_string_lossy())
}

/// View a UTF-16 buffer as the bytes the target process will read.
pub fn wide_bytes(wide: &[u16]) -> Vec<u8> {
    wide.iter().flat_map(|unit| unit.to_ne_bytes()).collect()
}
