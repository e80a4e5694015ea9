//! Writing data to remote process memory.

use crate::injection::{RemoteAddress, RemoteProcess};
use crate::memory::wide::wide_bytes;

/// Write a NUL-terminated UTF-16 string to remote memory.
///
/// # Errors
/// Returns the OS error from the write, or an error of kind `Other` when
/// fewer bytes than requested were written.
pub fn write_wide_string<P: RemoteProcess + ?Sized>(
    process: &P,
    address: RemoteAddress,
    wide: &[u16],
) -> std::io::Result<()> {
    let bytes = wide_bytes(wide);
    let bytes_written = process.write(address, &bytes)?;

    if bytes_written != bytes.len() {
        log::warn!(
            "Partial write: {} of {} bytes written",
            bytes_written,
            bytes.len()
        );
        return Err(std::io::Error::other("Incomplete write operation"));
    }

    log::debug!(
        "Wrote {} bytes to {} in process {}",
        bytes_written,
        address,
        process.pid()
    );

    Ok(())
}
