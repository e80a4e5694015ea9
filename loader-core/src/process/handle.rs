// Process and thread handle management

use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Threading::{OpenProcess, PROCESS_ACCESS_RIGHTS};

/// A handle to an open process
///
/// Closes the underlying Windows handle when dropped.
pub struct ProcessHandle {
    handle: HANDLE,
    pid: u32,
}

// Process handles can be safely moved between threads
unsafe impl Send for ProcessHandle {}

impl ProcessHandle {
    /// Opens a process with the specified access rights
    ///
    /// # Returns
    /// * `Ok(ProcessHandle)` - Successfully opened process handle
    /// * `Err(std::io::Error)` - The OS refused or the process is not ready
    pub fn open(pid: u32, rights: PROCESS_ACCESS_RIGHTS) -> std::io::Result<Self> {
        unsafe {
            match OpenProcess(rights, false, pid) {
                Ok(handle) if !handle.is_invalid() => Ok(Self { handle, pid }),
                _ => Err(std::io::Error::last_os_error()),
            }
        }
    }

    /// Returns the process ID associated with this handle
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Returns the raw Windows handle
    pub fn as_handle(&self) -> HANDLE {
        self.handle
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

/// Owned handle to a thread, closed on drop.
pub struct ThreadHandle {
    handle: HANDLE,
}

impl ThreadHandle {
    /// Take ownership of a raw thread handle.
    pub fn from_raw(handle: HANDLE) -> Self {
        Self { handle }
    }

    /// Get raw handle.
    pub fn as_handle(&self) -> HANDLE {
        self.handle
    }
}

impl Drop for ThreadHandle {
    fn drop(&mut self) {
        unsafe {
            if !self.handle.is_invalid() {
                let _ = CloseHandle(self.handle);
            }
        }
    }
}
