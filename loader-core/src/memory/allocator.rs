//! Remote memory allocation with scoped cleanup.

use crate::injection::{RemoteAddress, RemoteProcess};

/// Scoped allocation inside a target process.
///
/// Callers release the buffer with [`RemoteBuffer::release`] so a failed
/// free can be reported. A buffer dropped without being released is freed
/// on drop and a failure is only logged.
pub struct RemoteBuffer<'a, P: RemoteProcess + ?Sized> {
    process: &'a P,
    address: RemoteAddress,
    size: usize,
    released: bool,
}

impl<'a, P: RemoteProcess + ?Sized> RemoteBuffer<'a, P> {
    /// Allocate `size` bytes in the target process.
    ///
    /// # Errors
    /// Returns the OS error unchanged so the caller can classify it.
    pub fn allocate(process: &'a P, size: usize) -> std::io::Result<Self> {
        let address = process.allocate(size)?;

        log::debug!(
            "Allocated {} bytes at {} in process {}",
            size,
            address,
            process.pid()
        );

        Ok(Self {
            process,
            address,
            size,
            released: false,
        })
    }

    /// Get the address of the allocated memory.
    pub fn address(&self) -> RemoteAddress {
        self.address
    }

    /// Get the size of the allocation.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Free the allocation, reporting failure to the caller.
    pub fn release(mut self) -> std::io::Result<()> {
        self.released = true;
        self.process.free(self.address)?;
        log::debug!("Freed remote memory at {}", self.address);
        Ok(())
    }
}

impl<P: RemoteProcess + ?Sized> Drop for RemoteBuffer<'_, P> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        match self.process.free(self.address) {
            Ok(()) => log::debug!("Freed remote memory at {}", self.address),
            Err(e) => log::warn!(
                "Failed to free remote memory at {}: {}",
                self.address,
                e
            ),
        }
    }
}
